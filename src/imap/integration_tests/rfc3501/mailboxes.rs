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
fn create_list_delete() {
    let setup = set_up();
    let mut client = setup.connect("3501mbcl");
    quick_log_in(&mut client);

    let lines = client.command("a1 LIST \"\" \"\"");
    assert_lines(
        &["* LIST (\\Noselect) \".\" \"\"", "a1 OK LIST completed."],
        &lines,
    );

    let lines = client.command("a2 LIST \"\" %");
    assert_lines(
        &[
            "* LIST (\\HasNoChildren) \".\" INBOX",
            "* LIST (\\HasNoChildren) \".\" Sent",
            "* LIST (\\HasNoChildren) \".\" Trash",
            "a2 OK LIST completed.",
        ],
        &lines,
    );

    let lines = client.command("a3 CREATE Projects.Redmap.");
    assert_lines(&["a3 OK Mailbox created successfully."], &lines);

    let lines = client.command("a4 LIST \"\" *");
    assert_lines(
        &[
            "* LIST (\\HasNoChildren) \".\" INBOX",
            "* LIST (\\HasChildren) \".\" Projects",
            "* LIST (\\HasNoChildren) \".\" Projects.Redmap",
            "* LIST (\\HasNoChildren) \".\" Sent",
            "* LIST (\\HasNoChildren) \".\" Trash",
            "a4 OK LIST completed.",
        ],
        &lines,
    );

    let lines = client.command("a5 LIST Projects. %");
    assert_lines(
        &[
            "* LIST (\\HasNoChildren) \".\" Projects.Redmap",
            "a5 OK LIST completed.",
        ],
        &lines,
    );

    let lines = client.command("a6 CREATE Projects");
    assert_lines(
        &["a6 NO [ALREADYEXISTS] Mailbox already exists."],
        &lines,
    );

    let lines = client.command("a7 DELETE Projects");
    assert_lines(
        &["a7 NO Mailbox has inferior hierarchical names."],
        &lines,
    );

    ok_command!(client, "a8 DELETE Projects.Redmap");
    ok_command!(client, "a9 DELETE Projects");

    let lines = client.command("a10 DELETE Projects");
    assert_lines(
        &["a10 NO [NONEXISTENT] Mailbox does not exist."],
        &lines,
    );
}

#[test]
fn inbox_is_special() {
    let setup = set_up();
    let mut client = setup.connect("3501mbin");
    quick_log_in(&mut client);

    let lines = client.command("a1 CREATE inbox");
    assert_lines(&["a1 NO Cannot create INBOX."], &lines);
    let lines = client.command("a2 DELETE INBOX");
    assert_lines(&["a2 NO Cannot delete INBOX."], &lines);
    let lines = client.command("a3 RENAME Trash InBoX");
    assert_lines(&["a3 NO Cannot rename to INBOX."], &lines);

    // Matching INBOX ignores case, but nothing else does
    let lines = client.command("a4 LIST \"\" iNbOx");
    assert_lines(
        &["* LIST (\\HasNoChildren) \".\" INBOX", "a4 OK LIST completed."],
        &lines,
    );
    let lines = client.command("a5 LIST \"\" sent");
    assert_lines(&["a5 OK LIST completed."], &lines);
}

#[test]
fn rename_mailboxes() {
    let setup = set_up();
    let mut client = setup.connect("3501mbrn");
    quick_log_in(&mut client);

    ok_command!(client, "a1 CREATE Work.Reports");
    let lines = client.command("a2 RENAME Work Archive.Work");
    assert_lines(&["a2 OK Mailbox renamed successfully."], &lines);

    let lines = client.command("a3 LIST \"\" Archive*");
    assert_lines(
        &[
            "* LIST (\\HasChildren) \".\" Archive",
            "* LIST (\\HasChildren) \".\" Archive.Work",
            "* LIST (\\HasNoChildren) \".\" Archive.Work.Reports",
            "a3 OK LIST completed.",
        ],
        &lines,
    );

    let lines = client.command("a4 RENAME Work Elsewhere");
    assert_lines(
        &["a4 NO [NONEXISTENT] Mailbox does not exist."],
        &lines,
    );
    let lines = client.command("a5 RENAME Sent Trash");
    assert_lines(
        &["a5 NO [ALREADYEXISTS] Mailbox already exists."],
        &lines,
    );

    // Renaming INBOX moves its messages and leaves it empty
    ok_command!(client, "a6 RENAME INBOX Old");
    let lines = client.command("a7 STATUS INBOX (MESSAGES UIDNEXT)");
    assert_lines(
        &[
            "* STATUS INBOX (MESSAGES 0 UIDNEXT 105)",
            "a7 OK STATUS completed.",
        ],
        &lines,
    );
    let lines = client.command("a8 STATUS Old (MESSAGES UIDNEXT)");
    assert_lines(
        &[
            "* STATUS Old (MESSAGES 4 UIDNEXT 105)",
            "a8 OK STATUS completed.",
        ],
        &lines,
    );
}

#[test]
fn deleting_selected_mailbox_deselects_it() {
    let setup = set_up();
    let mut client = setup.connect("3501mbds");
    quick_log_in(&mut client);

    ok_command!(client, "a1 CREATE Scratch");
    quick_select(&mut client, "Scratch");
    ok_command!(client, "a2 DELETE Scratch");

    let lines = client.command("a3 CHECK");
    assert_lines(&["a3 BAD CHECK: Must select a mailbox first."], &lines);
}

#[test]
fn subscriptions() {
    let setup = set_up();
    let mut client = setup.connect("3501mbsu");
    quick_log_in(&mut client);

    let lines = client.command("a1 LSUB \"\" *");
    assert_lines(
        &[
            "* LSUB (\\HasNoChildren) \".\" INBOX",
            "* LSUB (\\HasNoChildren) \".\" Sent",
            "* LSUB (\\HasNoChildren) \".\" Trash",
            "a1 OK LSUB completed.",
        ],
        &lines,
    );

    let lines = client.command("a2 UNSUBSCRIBE Trash");
    assert_lines(&["a2 OK UNSUBSCRIBE completed."], &lines);
    // Names need not exist to be subscribed
    let lines = client.command("a3 SUBSCRIBE Elsewhere");
    assert_lines(&["a3 OK SUBSCRIBE completed."], &lines);

    let lines = client.command("a4 LSUB \"\" *");
    assert_lines(
        &[
            "* LSUB (\\Noselect) \".\" Elsewhere",
            "* LSUB (\\HasNoChildren) \".\" INBOX",
            "* LSUB (\\HasNoChildren) \".\" Sent",
            "a4 OK LSUB completed.",
        ],
        &lines,
    );

    // Subscriptions outlive the connection
    let mut other = setup.connect("3501mbsu2");
    quick_log_in(&mut other);
    let lines = other.command("b1 LSUB \"\" E%");
    assert_lines(
        &[
            "* LSUB (\\Noselect) \".\" Elsewhere",
            "b1 OK LSUB completed.",
        ],
        &lines,
    );
}
