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
fn unknown_and_malformed_commands() {
    let setup = set_up();
    let mut client = setup.connect("3501bcum");
    skip_greeting(&mut client);

    let lines = client.command("a1 XYZZY");
    assert_lines(&["a1 NO XYZZY not implemented."], &lines);

    let lines = client.command("a2 SELECT");
    assert_lines(&["a2 BAD SELECT: Invalid arguments."], &lines);

    let lines = client.command("a3 CAPABILITY extra");
    assert_lines(&["a3 BAD CAPABILITY: Invalid arguments."], &lines);

    let lines = client.command("a4 UID FROB 1");
    assert_lines(&["a4 BAD UID: Invalid arguments."], &lines);

    client.write_raw(b"(((\r\n");
    assert_eq!("* BAD Invalid command.", client.read_line());

    let lines = client.command("a5 STARTTLS");
    assert_lines(&["a5 NO STARTTLS: Not Implemented"], &lines);

    // Still usable
    let lines = client.command("a6 LOGIN testuser testpass");
    assert!(lines[0].starts_with("a6 OK "));
}

#[test]
fn too_many_bad_commands() {
    let setup = set_up_with(|config| config.imap.bad_command_limit = 3);
    let mut client = setup.connect("3501bctm");
    skip_greeting(&mut client);

    let lines = client.command("a1 SELECT");
    assert_lines(&["a1 BAD SELECT: Invalid arguments."], &lines);
    let lines = client.command("a2 FETCH 1 FLAGS");
    assert_lines(&["a2 BAD FETCH: Must authenticate first."], &lines);

    // Any other response starts the count over
    let lines = client.command("a3 NOOP");
    assert_lines(&["a3 OK NOOP completed."], &lines);

    client.command("a4 SELECT");
    client.command("a5 SELECT");
    let lines = client.command("a6 SELECT");
    assert_lines(&["a6 BAD SELECT: Invalid arguments."], &lines);
    assert_eq!("* BYE Too many errors.", client.read_line());
    client.assert_closed();
}

#[test]
fn overlong_command_line() {
    let setup = set_up();
    let mut client = setup.connect("3501bcol");
    skip_greeting(&mut client);

    let mut line = b"a1 LOGIN ".to_vec();
    line.resize(70000, b'x');
    line.extend_from_slice(b"\r\n");
    client.write_raw(&line);

    // The rest of the line is never read, so only the BYE is certain
    assert_eq!("* BYE Command line too long.", client.read_line());
}
