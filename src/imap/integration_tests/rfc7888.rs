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

//! Tests for the LITERAL+ extension.

use super::defs::*;

#[test]
fn capability_declared() {
    let setup = set_up();
    let mut client = setup.connect("7888cade");
    skip_greeting(&mut client);

    let lines = ok_command!(client, "c1 CAPABILITY");
    assert!(lines[0].contains(" LITERAL+ "));
}

#[test]
fn capability_can_be_disabled() {
    let setup = set_up_with(|config| config.imap.literal_plus = false);
    let mut client = setup.connect("7888cadi");
    receive_line_like(&mut client, r"^\* OK \[CAPABILITY IMAP4rev1 UIDPLUS ");

    let lines = ok_command!(client, "c1 CAPABILITY");
    assert!(!lines[0].contains("LITERAL+"));
}

#[test]
fn non_synchronising_literals() {
    let setup = set_up();
    let mut client = setup.connect("7888nosy");
    skip_greeting(&mut client);

    client.write_raw(b"a1 LOGIN {8+}\r\ntestuser {8+}\r\ntestpass\r\n");
    let lines = client.read_until_tagged("a1");
    assert!(lines[0].starts_with("a1 OK [CAPABILITY "));

    let message = "Subject: no waiting\r\n\r\nBody\r\n";
    client.write_raw(
        format!(
            "a2 APPEND Trash (\\Flagged) {{{}+}}\r\n{}\r\n",
            message.len(),
            message
        )
        .as_bytes(),
    );
    assert_lines_like(
        &[r"^a2 OK \[APPENDUID [0-9]+ 101\] APPEND completed\.$"],
        &client.read_until_tagged("a2"),
    );

    // Synchronising and non-synchronising literals mix freely
    quick_select(&mut client, "Trash");
    client.write_raw(b"s1 SEARCH SUBJECT {7+}\r\nwaiting BODY {4}\r\n");
    assert_eq!("+ Literal string", client.read_line());
    client.write_raw(b"body\r\n");
    assert_lines(
        &["* SEARCH 1", "s1 OK SEARCH completed."],
        &client.read_until_tagged("s1"),
    );
}
