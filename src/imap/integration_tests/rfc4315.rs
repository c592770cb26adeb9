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

//! Tests for the UIDPLUS extension.

use lazy_static::lazy_static;
use regex::Regex;

use super::defs::*;

lazy_static! {
    static ref RX_STATUS_VALIDITY: Regex =
        Regex::new(r"^\* STATUS \S+ \(UIDVALIDITY ([0-9]+)\)$").unwrap();
}

fn uid_validity(client: &mut TestClient, mailbox: &str) -> String {
    let lines = ok_command!(
        client,
        &format!("v1 STATUS {} (UIDVALIDITY)", mailbox)
    );
    RX_STATUS_VALIDITY
        .captures(&lines[0])
        .expect("no UIDVALIDITY")[1]
        .to_owned()
}

#[test]
fn capability_declared() {
    let setup = set_up();
    let mut client = setup.connect("4315cade");
    skip_greeting(&mut client);

    let lines = ok_command!(client, "c1 CAPABILITY");
    assert!(lines[0].contains(" UIDPLUS "));
}

#[test]
fn uid_expunge() {
    let setup = set_up();
    let mut client = setup.connect("4315uiex");
    quick_log_in(&mut client);
    quick_select(&mut client, "INBOX");

    ok_command!(client, "s1 STORE 1:3 +FLAGS.SILENT (\\Deleted)");
    let lines = client.command("e1 UID EXPUNGE 102:104");
    assert_lines(
        &[
            "* 2 EXPUNGE",
            "* 2 EXPUNGE",
            "e1 OK UID EXPUNGE completed.",
        ],
        &lines,
    );

    let lines = client.command("f1 FETCH 1:* (UID FLAGS)");
    assert_lines(
        &[
            "* 1 FETCH (UID 101 FLAGS (\\Deleted \\Seen))",
            "* 2 FETCH (UID 104 FLAGS (\\Recent))",
            "f1 OK FETCH completed.",
        ],
        &lines,
    );

    let lines = client.command("e2 EXPUNGE");
    assert_lines(
        &["* 1 EXPUNGE", "e2 OK EXPUNGE completed."],
        &lines,
    );

    let lines = client.command("e3 UID EXPUNGE");
    assert_lines(&["e3 BAD UID EXPUNGE: Invalid arguments."], &lines);
}

#[test]
fn append_uid() {
    let setup = set_up();
    let mut client = setup.connect("4315apui");
    quick_log_in(&mut client);
    let validity = uid_validity(&mut client, "Trash");

    for expected_uid in 101..104 {
        client.write_raw(b"a1 APPEND Trash {6+}\r\nHello!\r\n");
        let lines = client.read_until_tagged("a1");
        assert_lines(
            &[format!(
                "a1 OK [APPENDUID {} {}] APPEND completed.",
                validity, expected_uid
            ).as_str()],
            &lines,
        );
    }
}

#[test]
fn copy_uid() {
    let setup = set_up();
    let mut client = setup.connect("4315coui");
    quick_log_in(&mut client);
    let validity = uid_validity(&mut client, "Trash");
    quick_select(&mut client, "INBOX");

    let lines = client.command("c1 UID COPY 102,104 Trash");
    assert_lines(
        &[format!(
            "c1 OK [COPYUID {} 102,104 101:102] UID COPY completed.",
            validity
        ).as_str()],
        &lines,
    );

    let lines = client.command("c2 COPY 1:3 Trash");
    assert_lines(
        &[format!(
            "c2 OK [COPYUID {} 101:103 103:105] COPY completed.",
            validity
        ).as_str()],
        &lines,
    );

    // Nothing copied, nothing to report
    let lines = client.command("c3 UID COPY 200:300 Trash");
    assert_lines(&["c3 OK UID COPY completed."], &lines);
}
