//-
// Copyright (c) 2020, The Redmap Developers
//
// This file is part of Redmap.
//
// Redmap is free software: you can  redistribute it and/or modify it under the
// terms of  the GNU General Public  License as published by  the Free Software
// Foundation, either version  3 of the License, or (at  your option) any later
// version.
//
// Redmap is distributed  in the hope that  it will be useful,  but WITHOUT ANY
// WARRANTY; without  even the implied  warranty of MERCHANTABILITY  or FITNESS
// FOR  A PARTICULAR  PURPOSE.  See the  GNU General  Public  License for  more
// details.
//
// You should have received a copy of the GNU General Public License along with
// Redmap. If not, see <http://www.gnu.org/licenses/>.

use super::super::defs::*;

#[test]
fn greeting_goodbye() {
    let setup = set_up();
    let mut client = setup.connect("3501fcgg");

    receive_line_like(
        &mut client,
        concat!(
            r"^\* OK \[CAPABILITY IMAP4rev1 LITERAL\+ UIDPLUS CHILDREN ",
            r"APPENDLIMIT=1000000000 AUTH=PLAIN\] ",
            r"Server ready imap\.example\.com$",
        ),
    );

    let lines = client.command("1 LOGOUT");
    assert_lines(&["* BYE Logging out.", "1 OK Logout successful."], &lines);
    client.assert_closed();
}

#[test]
fn request_capabilities() {
    let setup = set_up();
    let mut client = setup.connect("3501fcrc");
    skip_greeting(&mut client);

    let lines = client.command("1 CAPABILITY");
    assert_lines(
        &[
            "* CAPABILITY IMAP4rev1 LITERAL+ UIDPLUS CHILDREN \
             APPENDLIMIT=1000000000 AUTH=PLAIN",
            "1 OK Capabilities listed.",
        ],
        &lines,
    );

    select_before_login(&mut client);
}

fn select_before_login(client: &mut TestClient) {
    let lines = client.command("2 SELECT INBOX");
    assert_lines(&["2 BAD SELECT: Must authenticate first."], &lines);
}

#[test]
fn any_state_commands() {
    let setup = set_up();
    let mut client = setup.connect("3501fcas");
    skip_greeting(&mut client);

    assert_lines(&["1 OK NOOP completed."], &client.command("1 NOOP"));
    assert_lines(
        &["2 NO STARTTLS: Not Implemented"],
        &client.command("2 STARTTLS"),
    );

    quick_log_in_again(&mut client);
    assert_lines(&["4 OK NOOP completed."], &client.command("4 NOOP"));
    quick_select(&mut client, "INBOX");
    assert_lines(&["5 OK NOOP completed."], &client.command("5 NOOP"));

    let lines = client.command("6 LOGOUT");
    assert_lines(&["* BYE Logging out.", "6 OK Logout successful."], &lines);
    client.assert_closed();
}

fn quick_log_in_again(client: &mut TestClient) {
    let lines = client.command(&format!("3 LOGIN {} {}", USER, PASSWORD));
    assert_eq!(1, lines.len());
    assert!(lines[0].starts_with("3 OK [CAPABILITY IMAP4rev1 "));
}

#[test]
fn host_name_and_limits_come_from_config() {
    let setup = set_up_with(|config| {
        config.imap.host_name = "mx.example.org".to_owned();
        config.imap.max_append_len = 1024;
        config.imap.literal_plus = false;
    });
    let mut client = setup.connect("3501fchn");

    receive_line_like(
        &mut client,
        concat!(
            r"^\* OK \[CAPABILITY IMAP4rev1 UIDPLUS CHILDREN ",
            r"APPENDLIMIT=1024 AUTH=PLAIN\] Server ready mx\.example\.org$",
        ),
    );
}
