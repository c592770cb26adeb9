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

const MESSAGE: &str = "From: eve@example.com\r\n\
                       Subject: Hello\r\n\
                       \r\n\
                       Hello there.\r\n";

fn append(client: &mut TestClient, tag: &str, args: &str) -> Vec<String> {
    client.write_raw(
        format!("{} APPEND {} {{{}}}\r\n", tag, args, MESSAGE.len())
            .as_bytes(),
    );
    assert_eq!("+ Literal string", client.read_line());
    client.write_raw(MESSAGE.as_bytes());
    client.write_raw(b"\r\n");
    client.read_until_tagged(tag)
}

#[test]
fn append_messages() {
    let setup = set_up();
    let mut client = setup.connect("3501meap");
    quick_log_in(&mut client);

    let lines = append(&mut client, "a1", "Trash (\\Seen)");
    assert_lines_like(
        &[r"^a1 OK \[APPENDUID [0-9]+ 101\] APPEND completed\.$"],
        &lines,
    );

    let lines =
        append(&mut client, "a2", "Trash \"14-Jul-2020 02:44:25 -0700\"");
    assert_lines_like(
        &[r"^a2 OK \[APPENDUID [0-9]+ 102\] APPEND completed\.$"],
        &lines,
    );

    let lines =
        client.command("a3 STATUS Trash (MESSAGES RECENT UNSEEN UIDNEXT)");
    assert_lines(
        &[
            "* STATUS Trash (MESSAGES 2 RECENT 2 UNSEEN 1 UIDNEXT 103)",
            "a3 OK STATUS completed.",
        ],
        &lines,
    );

    quick_select(&mut client, "Trash");
    let lines = client.command("f1 FETCH 1:2 (FLAGS INTERNALDATE RFC822.SIZE)");
    assert_eq!(3, lines.len());
    assert!(lines[0]
        .starts_with("* 1 FETCH (FLAGS (\\Recent \\Seen) INTERNALDATE \""));
    assert_eq!(
        format!(
            "* 2 FETCH (FLAGS (\\Recent) \
             INTERNALDATE \"14-Jul-2020 02:44:25 -0700\" RFC822.SIZE {})",
            MESSAGE.len()
        ),
        lines[1]
    );

    let lines = append(&mut client, "a4", "Nowhere");
    assert_lines(&["a4 NO [TRYCREATE] Mailbox does not exist."], &lines);
}

#[test]
fn append_to_selected_mailbox() {
    let setup = set_up();
    let mut client = setup.connect("3501meas");
    quick_log_in(&mut client);
    quick_select(&mut client, "INBOX");

    let lines = append(&mut client, "a1", "INBOX");
    assert_lines_like(
        &[
            r"^\* 5 EXISTS$",
            r"^\* 2 RECENT$",
            r"^a1 OK \[APPENDUID [0-9]+ 105\] APPEND completed\.$",
        ],
        &lines,
    );

    let lines = client.command("f1 FETCH 5 (UID FLAGS)");
    assert_lines(
        &[
            "* 5 FETCH (UID 105 FLAGS (\\Recent))",
            "f1 OK FETCH completed.",
        ],
        &lines,
    );
}

#[test]
fn copy_messages() {
    let setup = set_up();
    let mut client = setup.connect("3501meco");
    quick_log_in(&mut client);
    quick_select(&mut client, "INBOX");

    let lines = client.command("c1 COPY 1:2 Trash");
    assert_lines_like(
        &[r"^c1 OK \[COPYUID [0-9]+ 101:102 101:102\] COPY completed\.$"],
        &lines,
    );

    let lines = client.command("c2 COPY 1 Nowhere");
    assert_lines(&["c2 NO [TRYCREATE] Mailbox does not exist."], &lines);

    let lines = client.command("s1 STATUS Trash (MESSAGES UNSEEN)");
    assert_lines(
        &[
            "* STATUS Trash (MESSAGES 2 UNSEEN 0)",
            "s1 OK STATUS completed.",
        ],
        &lines,
    );

    // Copies keep their flags but are new arrivals at the destination
    quick_select(&mut client, "Trash");
    let lines = client.command("f1 FETCH 1:* FLAGS");
    assert_lines(
        &[
            "* 1 FETCH (FLAGS (\\Recent \\Seen))",
            "* 2 FETCH (FLAGS (\\Answered \\Recent \\Seen))",
            "f1 OK FETCH completed.",
        ],
        &lines,
    );
}

#[test]
fn expunge_reports_each_message() {
    let setup = set_up();
    let mut client = setup.connect("3501meex");
    quick_log_in(&mut client);
    quick_select(&mut client, "INBOX");

    ok_command!(client, "s1 STORE 1:2 +FLAGS.SILENT (\\Deleted)");
    let lines = client.command("e1 EXPUNGE");
    assert_lines(
        &["* 1 EXPUNGE", "* 1 EXPUNGE", "e1 OK EXPUNGE completed."],
        &lines,
    );

    let lines = client.command("f1 FETCH 1:* UID");
    assert_lines(
        &[
            "* 1 FETCH (UID 103)",
            "* 2 FETCH (UID 104)",
            "f1 OK FETCH completed.",
        ],
        &lines,
    );

    // Nothing left to expunge
    let lines = client.command("e2 EXPUNGE");
    assert_lines(&["e2 OK EXPUNGE completed."], &lines);
}

#[test]
fn expunge_includes_concurrent_expunges() {
    let setup = set_up();
    let mut first = setup.connect("3501mecx1");
    let mut second = setup.connect("3501mecx2");
    quick_log_in(&mut first);
    quick_log_in(&mut second);
    quick_select(&mut first, "INBOX");
    quick_select(&mut second, "INBOX");

    ok_command!(second, "s1 STORE 3 +FLAGS.SILENT (\\Deleted)");
    ok_command!(second, "e1 EXPUNGE");

    // The first session still sees four messages; UID 103 is its 3
    ok_command!(first, "s1 STORE 1 +FLAGS.SILENT (\\Deleted)");
    let lines = first.command("e1 EXPUNGE");
    assert_lines(
        &["* 1 EXPUNGE", "* 2 EXPUNGE", "e1 OK EXPUNGE completed."],
        &lines,
    );

    let lines = first.command("f1 FETCH 1:* UID");
    assert_lines(
        &[
            "* 1 FETCH (UID 102)",
            "* 2 FETCH (UID 104)",
            "f1 OK FETCH completed.",
        ],
        &lines,
    );
}

#[test]
fn close_expunges_silently() {
    let setup = set_up();
    let mut client = setup.connect("3501mecl");
    quick_log_in(&mut client);
    quick_select(&mut client, "INBOX");

    ok_command!(client, "s1 STORE 3 +FLAGS.SILENT (\\Deleted)");
    let lines = client.command("c1 CHECK");
    assert_lines(&["c1 OK CHECK completed."], &lines);
    let lines = client.command("c2 CLOSE");
    assert_lines(&["c2 OK CLOSE completed."], &lines);

    let lines = client.command("c3 CLOSE");
    assert_lines(&["c3 BAD CLOSE: Must select a mailbox first."], &lines);

    let lines = client.command("s2 STATUS INBOX (MESSAGES)");
    assert_lines(
        &["* STATUS INBOX (MESSAGES 3)", "s2 OK STATUS completed."],
        &lines,
    );

    // Neither switching mailboxes nor closing a read-only selection
    // removes anything
    quick_select(&mut client, "INBOX");
    ok_command!(client, "s3 STORE 1 +FLAGS.SILENT (\\Deleted)");
    let lines = client.command("e1 EXAMINE INBOX");
    assert!(lines.last().unwrap().starts_with("e1 OK [READ-ONLY]"));
    ok_command!(client, "c4 CLOSE");

    let lines = client.command("s4 STATUS INBOX (MESSAGES)");
    assert_lines(
        &["* STATUS INBOX (MESSAGES 3)", "s4 OK STATUS completed."],
        &lines,
    );
}

#[test]
fn changes_reach_other_sessions() {
    let setup = set_up();
    let mut first = setup.connect("3501mecr1");
    let mut second = setup.connect("3501mecr2");
    quick_log_in(&mut first);
    quick_log_in(&mut second);
    quick_select(&mut first, "INBOX");
    quick_select(&mut second, "INBOX");

    let lines = first.command("s1 STORE 1 +FLAGS (\\Flagged)");
    assert_lines(
        &[
            "* 1 FETCH (FLAGS (\\Flagged \\Seen))",
            "s1 OK STORE completed.",
        ],
        &lines,
    );
    // A session is not told about its own changes again
    let lines = first.command("n1 NOOP");
    assert_lines(&["n1 OK NOOP completed."], &lines);

    let lines = second.command("n1 NOOP");
    assert_lines(
        &["* 1 FETCH (FLAGS (\\Flagged \\Seen))", "n1 OK NOOP completed."],
        &lines,
    );

    ok_command!(first, "s2 STORE 2 +FLAGS.SILENT (\\Deleted)");
    ok_command!(first, "e1 EXPUNGE");

    // Expunges are held back while the client fetches
    let lines = second.command("f1 FETCH 3 UID");
    assert_lines(
        &["* 3 FETCH (UID 103)", "f1 OK FETCH completed."],
        &lines,
    );

    let lines = second.command("n2 NOOP");
    assert_lines(&["* 2 EXPUNGE", "n2 OK NOOP completed."], &lines);

    let lines = append(&mut first, "a1", "INBOX");
    assert_eq!("* 4 EXISTS", lines[0]);

    let lines = second.command("n3 NOOP");
    assert_lines(&["* 4 EXISTS", "n3 OK NOOP completed."], &lines);
}
