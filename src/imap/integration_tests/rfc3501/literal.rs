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
fn synchronising_literals() {
    let setup = set_up();
    let mut client = setup.connect("3501lisy");
    quick_log_in(&mut client);
    quick_select(&mut client, "INBOX");

    client.write_raw(b"s1 SEARCH CHARSET UTF-8 TEXT {8}\r\n");
    assert_eq!("+ Literal string", client.read_line());
    client.write_raw(b"tomorrow\r\n");
    assert_lines(
        &["* SEARCH 2", "s1 OK SEARCH completed."],
        &client.read_until_tagged("s1"),
    );

    // Each literal in a command gets its own continuation request
    client.write_raw(b"s2 SEARCH FROM {3}\r\n");
    assert_eq!("+ Literal string", client.read_line());
    client.write_raw(b"bob SUBJECT {5}\r\n");
    assert_eq!("+ Literal string", client.read_line());
    client.write_raw(b"Lunch\r\n");
    assert_lines(
        &["* SEARCH 2", "s2 OK SEARCH completed."],
        &client.read_until_tagged("s2"),
    );

    client.write_raw(b"s3 SEARCH CHARSET UTF-8 BODY {6}\r\n");
    assert_eq!("+ Literal string", client.read_line());
    client.write_raw("f\u{fc}\u{fc}\r\n".as_bytes());
    assert_lines(
        &["* SEARCH", "s3 OK SEARCH completed."],
        &client.read_until_tagged("s3"),
    );
}

#[test]
fn literal_contents_are_opaque() {
    let setup = set_up();
    let mut client = setup.connect("3501lico");
    quick_log_in(&mut client);

    // A literal which looks like the end of a command followed by another
    // literal
    let message = "Subject: tricky\r\n\r\nx1 NOOP {3}\r\n";
    client.write_raw(
        format!("a1 APPEND Trash {{{}}}\r\n", message.len()).as_bytes(),
    );
    assert_eq!("+ Literal string", client.read_line());
    client.write_raw(message.as_bytes());
    client.write_raw(b"\r\n");
    let lines = client.read_until_tagged("a1");
    assert_lines_like(
        &[r"^a1 OK \[APPENDUID [0-9]+ 101\] APPEND completed\.$"],
        &lines,
    );

    quick_select(&mut client, "Trash");
    let lines = client.command("f1 FETCH 1 BODY.PEEK[TEXT]");
    assert_lines(
        &[
            "* 1 FETCH (BODY[TEXT] {13}",
            "x1 NOOP {3}",
            ")",
            "f1 OK FETCH completed.",
        ],
        &lines,
    );
}

#[test]
fn oversized_literals() {
    let setup = set_up_with(|config| config.imap.max_append_len = 16);
    let mut client = setup.connect("3501liov");
    skip_greeting(&mut client);

    // Before authentication, only command-sized literals are accepted
    let lines = client.command("a1 LOGIN {70000}");
    assert_lines(
        &["a1 NO [TOOBIG] Literal exceeds the size limit."],
        &lines,
    );

    let lines = client.command("a2 LOGIN testuser testpass");
    assert!(lines[0].starts_with("a2 OK [CAPABILITY "));
    assert!(lines[0].contains(" APPENDLIMIT=16 "));

    let lines = client.command("a3 APPEND INBOX {17}");
    assert_lines(
        &["a3 NO [TOOBIG] Literal exceeds the size limit."],
        &lines,
    );

    // The payload of a refused non-synchronising literal is discarded
    client.write_raw(b"a4 APPEND INBOX {17+}\r\n");
    client.write_raw(b"0123456789abcdef\n\r\n");
    assert_lines(
        &["a4 NO [TOOBIG] Literal exceeds the size limit."],
        &client.read_until_tagged("a4"),
    );

    let lines = client.command("a5 NOOP");
    assert_lines(&["a5 OK NOOP completed."], &lines);
}
