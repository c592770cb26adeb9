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
fn fetch_macros_and_simple_items() {
    let setup = set_up();
    let mut client = setup.connect("3501fesi");
    quick_log_in(&mut client);
    quick_select(&mut client, "INBOX");

    let lines = client.command("f1 FETCH 1 FAST");
    assert_lines(
        &[
            "* 1 FETCH (FLAGS (\\Seen) \
             INTERNALDATE \" 3-Feb-2020 09:15:00 -0500\" RFC822.SIZE 202)",
            "f1 OK FETCH completed.",
        ],
        &lines,
    );

    let lines = client.command("f2 FETCH 1 ENVELOPE");
    assert_lines(
        &[
            "* 1 FETCH (ENVELOPE (\"Mon, 3 Feb 2020 09:15:00 -0500\" \
             \"Welcome\" \
             ((\"Alice Example\" NIL \"alice\" \"example.com\")) \
             ((\"Alice Example\" NIL \"alice\" \"example.com\")) \
             ((\"Alice Example\" NIL \"alice\" \"example.com\")) \
             ((\"Demo User\" NIL \"demouser\" \"example.com\")) \
             NIL NIL NIL \"<welcome@example.com>\"))",
            "f2 OK FETCH completed.",
        ],
        &lines,
    );

    let lines = client.command("f3 FETCH 1:2 (UID RFC822.SIZE)");
    assert_eq!("* 1 FETCH (UID 101 RFC822.SIZE 202)", lines[0]);
    assert!(lines[1].starts_with("* 2 FETCH (UID 102 RFC822.SIZE "));
    assert_eq!("f3 OK FETCH completed.", lines[2]);
}

#[test]
fn fetch_body_structure() {
    let setup = set_up();
    let mut client = setup.connect("3501febs");
    quick_log_in(&mut client);
    quick_select(&mut client, "INBOX");

    let lines = client.command("f1 FETCH 1 (BODY BODYSTRUCTURE)");
    assert_lines(
        &[
            "* 1 FETCH (\
             BODY (\"TEXT\" \"PLAIN\" (\"CHARSET\" \"US-ASCII\") NIL NIL \
             \"7BIT\" 30 1) \
             BODYSTRUCTURE (\"TEXT\" \"PLAIN\" (\"CHARSET\" \"US-ASCII\") \
             NIL NIL \"7BIT\" 30 1 NIL NIL NIL NIL))",
            "f1 OK FETCH completed.",
        ],
        &lines,
    );

    let lines = client.command("f2 FETCH 3 BODY");
    assert_lines(
        &[
            "* 3 FETCH (BODY (\
             (\"TEXT\" \"PLAIN\" (\"CHARSET\" \"utf-8\") NIL NIL \
             \"7BIT\" 23 1)\
             (\"TEXT\" \"CSV\" (\"NAME\" \"report.csv\" \
             \"CHARSET\" \"US-ASCII\") NIL NIL \"7BIT\" 20 2) \
             \"MIXED\"))",
            "f2 OK FETCH completed.",
        ],
        &lines,
    );

    let lines = client.command("f3 FETCH 3 BODYSTRUCTURE");
    assert_lines(
        &[
            "* 3 FETCH (BODYSTRUCTURE (\
             (\"TEXT\" \"PLAIN\" (\"CHARSET\" \"utf-8\") NIL NIL \
             \"7BIT\" 23 1 NIL NIL NIL NIL)\
             (\"TEXT\" \"CSV\" (\"NAME\" \"report.csv\" \
             \"CHARSET\" \"US-ASCII\") NIL NIL \"7BIT\" 20 2 \
             NIL NIL NIL NIL) \
             \"MIXED\" (\"BOUNDARY\" \"b1\") NIL NIL NIL))",
            "f3 OK FETCH completed.",
        ],
        &lines,
    );
}

#[test]
fn fetch_sections() {
    let setup = set_up();
    let mut client = setup.connect("3501fese");
    quick_log_in(&mut client);
    quick_select(&mut client, "INBOX");

    let lines =
        client.command("f1 FETCH 1 BODY.PEEK[HEADER.FIELDS (subject)]");
    assert_lines(
        &[
            "* 1 FETCH (BODY[HEADER.FIELDS (SUBJECT)] {20}",
            "Subject: Welcome",
            "",
            ")",
            "f1 OK FETCH completed.",
        ],
        &lines,
    );

    let lines = client.command("f2 FETCH 1 BODY[TEXT]<0.7>");
    assert_lines(
        &[
            "* 1 FETCH (BODY[TEXT]<0> \"Welcome\")",
            "f2 OK FETCH completed.",
        ],
        &lines,
    );

    let lines = client.command("f3 FETCH 1 BODY[TEXT]<8.1000>");
    assert_lines(
        &[
            "* 1 FETCH (BODY[TEXT]<8> {22}",
            "to your new mailbox.",
            ")",
            "f3 OK FETCH completed.",
        ],
        &lines,
    );

    let lines = client.command("f4 FETCH 3 (BODY.PEEK[1] BODY.PEEK[2.MIME])");
    assert_lines(
        &[
            "* 3 FETCH (BODY[1] \"The report is attached.\" \
             BODY[2.MIME] {45}",
            "Content-Type: text/csv; name=\"report.csv\"",
            "",
            ")",
            "f4 OK FETCH completed.",
        ],
        &lines,
    );

    // Sections which do not exist are empty
    let lines = client.command("f5 FETCH 1 BODY.PEEK[2]");
    assert_lines(
        &["* 1 FETCH (BODY[2] NIL)", "f5 OK FETCH completed."],
        &lines,
    );
}

#[test]
fn fetch_sets_seen() {
    let setup = set_up();
    let mut client = setup.connect("3501fess");
    let mut other = setup.connect("3501fess2");
    quick_log_in(&mut client);
    quick_log_in(&mut other);
    quick_select(&mut client, "INBOX");
    quick_select(&mut other, "INBOX");

    // PEEK leaves the flags alone
    let lines = client.command("f1 FETCH 4 BODY.PEEK[TEXT]");
    assert_lines(
        &[
            "* 4 FETCH (BODY[TEXT] {47}",
            "This message has not been seen by anyone yet.",
            ")",
            "f1 OK FETCH completed.",
        ],
        &lines,
    );

    let lines = client.command("f2 FETCH 4 BODY[TEXT]");
    assert_lines(
        &[
            "* 4 FETCH (BODY[TEXT] {47}",
            "This message has not been seen by anyone yet.",
            " FLAGS (\\Recent \\Seen))",
            "f2 OK FETCH completed.",
        ],
        &lines,
    );

    // Only the first fetch changes anything
    let lines = client.command("f3 UID FETCH 104 RFC822.TEXT");
    assert_lines(
        &[
            "* 4 FETCH (RFC822.TEXT {47}",
            "This message has not been seen by anyone yet.",
            " UID 104)",
            "f3 OK UID FETCH completed.",
        ],
        &lines,
    );

    let lines = other.command("n1 NOOP");
    assert_lines(
        &["* 4 FETCH (FLAGS (\\Seen))", "n1 OK NOOP completed."],
        &lines,
    );
}

#[test]
fn uid_fetch() {
    let setup = set_up();
    let mut client = setup.connect("3501feuf");
    quick_log_in(&mut client);
    quick_select(&mut client, "INBOX");

    let lines = client.command("f1 UID FETCH 102:103 FLAGS");
    assert_lines(
        &[
            "* 2 FETCH (FLAGS (\\Answered \\Seen) UID 102)",
            "* 3 FETCH (FLAGS () UID 103)",
            "f1 OK UID FETCH completed.",
        ],
        &lines,
    );

    let lines = client.command("f2 UID FETCH 200:* (UID FLAGS)");
    assert_lines(
        &[
            "* 4 FETCH (UID 104 FLAGS (\\Recent))",
            "f2 OK UID FETCH completed.",
        ],
        &lines,
    );

    let lines = client.command("f3 UID FETCH 300 FLAGS");
    assert_lines(&["f3 OK UID FETCH completed."], &lines);
}
