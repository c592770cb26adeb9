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
fn login_success() {
    let setup = set_up();
    let mut client = setup.connect("3501aulo");
    skip_greeting(&mut client);

    let lines = client.command("login1 LOGIN testuser testpass");
    assert_lines_like(
        &[concat!(
            r"^login1 OK \[CAPABILITY IMAP4rev1( [A-Z0-9=+-]+)*\] ",
            r"Authentication successful\.$"
        )],
        &lines,
    );

    let lines = client.command("login2 LOGIN testuser testpass");
    assert_lines(&["login2 BAD LOGIN: Already authenticated."], &lines);
}

#[test]
fn login_quoted_and_literal_credentials() {
    let setup = set_up();
    let mut client = setup.connect("3501aulq");
    skip_greeting(&mut client);

    client.write_raw(b"login1 LOGIN \"testuser\" {8}\r\n");
    assert_eq!("+ Literal string", client.read_line());
    client.write_raw(b"testpass\r\n");
    let lines = client.read_until_tagged("login1");
    assert!(lines[0].starts_with("login1 OK [CAPABILITY "));
}

#[test]
fn login_rejected() {
    let setup = set_up();
    let mut client = setup.connect("3501aulr");
    skip_greeting(&mut client);

    let lines = client.command("a1 LOGIN foo bar");
    assert_lines(&["a1 NO Invalid authentication credentials."], &lines);

    let lines = client.command("a2 LOGIN testuser wrongpass");
    assert_lines(&["a2 NO Invalid authentication credentials."], &lines);

    // Still unauthenticated
    let lines = client.command("a3 SELECT INBOX");
    assert_lines(&["a3 BAD SELECT: Must authenticate first."], &lines);
}

#[test]
fn auth_plain() {
    let setup = set_up();
    let mut client = setup.connect("3501auap");
    skip_greeting(&mut client);

    client.write_raw(b"auth1 AUTHENTICATE PLAIN\r\n");
    assert_eq!("+ ", client.read_line());
    client.write_raw(b"AHRlc3R1c2VyAHRlc3RwYXNz\r\n");
    let lines = client.read_until_tagged("auth1");
    assert_lines_like(
        &[concat!(
            r"^auth1 OK \[CAPABILITY IMAP4rev1( [A-Z0-9=+-]+)*\] ",
            r"Authentication successful\.$"
        )],
        &lines,
    );

    quick_select(&mut client, "INBOX");
}

#[test]
fn auth_plain_failures() {
    let setup = set_up();
    let mut client = setup.connect("3501aupf");
    skip_greeting(&mut client);

    client.write_raw(b"auth1 AUTHENTICATE PLAIN\r\n");
    assert_eq!("+ ", client.read_line());
    client.write_raw(b"AHRlc3R1c2VyAHdyb25n\r\n");
    assert_lines(
        &["auth1 NO Invalid authentication credentials."],
        &client.read_until_tagged("auth1"),
    );

    client.write_raw(b"auth2 AUTHENTICATE PLAIN\r\n");
    assert_eq!("+ ", client.read_line());
    client.write_raw(b"!!! not base64 !!!\r\n");
    assert_lines(
        &["auth2 NO [AUTHENTICATIONFAILED] \
           Invalid authentication credentials."],
        &client.read_until_tagged("auth2"),
    );

    client.write_raw(b"auth3 AUTHENTICATE plain\r\n");
    assert_eq!("+ ", client.read_line());
    client.write_raw(b"*\r\n");
    assert_lines(
        &["auth3 BAD AUTHENTICATE cancelled."],
        &client.read_until_tagged("auth3"),
    );

    let lines = client.command("auth4 AUTHENTICATE XYZZY");
    assert_lines(&["auth4 NO Invalid authentication mechanism."], &lines);

    // None of that logged us in
    let lines = client.command("auth5 EXAMINE INBOX");
    assert_lines(&["auth5 BAD EXAMINE: Must authenticate first."], &lines);
}
