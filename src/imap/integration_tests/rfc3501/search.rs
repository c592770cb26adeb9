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

fn search(client: &mut TestClient, command: &str, expected: &str) {
    let lines = client.command(command);
    let tag = command.split(' ').next().unwrap();
    let name = if command.contains(" UID SEARCH ") {
        "UID SEARCH"
    } else {
        "SEARCH"
    };
    assert_eq!(
        vec![expected.to_owned(), format!("{} OK {} completed.", tag, name)],
        lines,
        "Unexpected result for {:?}",
        command
    );
}

#[test]
fn search_keys() {
    let setup = set_up();
    let mut client = setup.connect("3501sesk");
    quick_log_in(&mut client);
    quick_select(&mut client, "INBOX");

    search(&mut client, "s1 SEARCH ALL", "* SEARCH 1 2 3 4");
    search(&mut client, "s2 SEARCH UNSEEN", "* SEARCH 3 4");
    search(&mut client, "s3 SEARCH FROM bob", "* SEARCH 2");
    search(&mut client, "s4 SEARCH OR ANSWERED RECENT", "* SEARCH 2 4");
    search(&mut client, "s5 SEARCH NEW", "* SEARCH 4");
    search(&mut client, "s6 SEARCH NOT SEEN SUBJECT report", "* SEARCH 3");
    search(&mut client, "s7 SEARCH 2:3", "* SEARCH 2 3");
    search(&mut client, "s8 SEARCH UID 103:*", "* SEARCH 3 4");
    search(&mut client, "s9 SEARCH LARGER 300", "* SEARCH 3");
    search(&mut client, "s10 SEARCH SENTON 4-Feb-2020", "* SEARCH 2");
    search(&mut client, "s11 SEARCH CC alice@example.com", "* SEARCH 2");
    search(&mut client, "s12 SEARCH BODY lunch", "* SEARCH 2");
    search(&mut client, "s13 SEARCH DELETED", "* SEARCH");
    search(&mut client, "s14 SEARCH (SEEN FLAGGED) ALL", "* SEARCH");
    search(
        &mut client,
        "s15 SEARCH HEADER Message-Id report@",
        "* SEARCH 3",
    );
}

#[test]
fn uid_search() {
    let setup = set_up();
    let mut client = setup.connect("3501seus");
    quick_log_in(&mut client);
    quick_select(&mut client, "INBOX");

    search(&mut client, "s1 UID SEARCH ALL", "* SEARCH 101 102 103 104");
    search(&mut client, "s2 UID SEARCH UNSEEN", "* SEARCH 103 104");
    search(&mut client, "s3 UID SEARCH 1:2", "* SEARCH 101 102");
    search(&mut client, "s4 UID SEARCH UID 102", "* SEARCH 102");
}

#[test]
fn search_charsets() {
    let setup = set_up();
    let mut client = setup.connect("3501sech");
    quick_log_in(&mut client);
    quick_select(&mut client, "INBOX");

    search(
        &mut client,
        "s1 SEARCH CHARSET UTF-8 SUBJECT Welcome",
        "* SEARCH 1",
    );
    search(
        &mut client,
        "s2 SEARCH CHARSET us-ascii TEXT tomorrow",
        "* SEARCH 2",
    );

    let lines = client.command("s3 SEARCH CHARSET BOGUS ALL");
    assert_lines(
        &["s3 NO [BADCHARSET] Unsupported charset BOGUS."],
        &lines,
    );
}

#[test]
fn disabled_search_keys() {
    let setup = set_up_with(|config| {
        config.imap.disable_search_keys = vec!["draft".to_owned()];
    });
    let mut client = setup.connect("3501sedk");
    quick_log_in(&mut client);
    quick_select(&mut client, "INBOX");

    let lines = client.command("s1 SEARCH NOT DRAFT");
    assert_lines(&["s1 NO [CANNOT] SEARCH DRAFT not allowed."], &lines);

    let lines = client.command("s2 SEARCH OR SEEN (UNDRAFT DRAFT)");
    assert_lines(&["s2 NO [CANNOT] SEARCH DRAFT not allowed."], &lines);

    // Other keys are unaffected
    search(&mut client, "s3 SEARCH UNDRAFT", "* SEARCH 1 2 3 4");
}
