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

use chrono::prelude::*;
use log::info;

use super::defs::*;
use crate::backend::AppendMessage;
use crate::imap::mailbox_name::MailboxName;
use crate::imap::specials::{Flag, StatusAttribute};

impl ConnectionState {
    pub(super) fn cmd_select(
        &mut self,
        tag: Tag,
        mailbox: MailboxName,
        examine: bool,
    ) -> CmdResult {
        // A failed SELECT still leaves no mailbox selected
        self.selected = None;
        let snapshot = session!(self)?.get_mailbox(&mailbox, examine)?;

        let mut response = if snapshot.readonly {
            let mut response = Response::ok(
                tag,
                "Selected mailbox.",
                Some(ResponseCode::ReadOnly),
            );
            response.add_untagged_ok(
                "Read-only mailbox.",
                Some(ResponseCode::PermanentFlags(vec![])),
            );
            response
        } else {
            let mut response = Response::ok(
                tag,
                "Selected mailbox.",
                Some(ResponseCode::ReadWrite),
            );
            response.add_untagged_ok(
                "Flags permitted.",
                Some(ResponseCode::PermanentFlags(
                    snapshot.permanent_flags.clone(),
                )),
            );
            response
        };

        response.add_untagged(Response::special(Special::Flags(
            snapshot.flags.clone(),
        )));
        response.add_untagged(Response::special(Special::Exists(
            snapshot.exists,
        )));
        response.add_untagged(Response::special(Special::Recent(
            snapshot.recent,
        )));
        response.add_untagged_ok(
            "Predicted next UID.",
            Some(ResponseCode::UidNext(snapshot.uid_next)),
        );
        response.add_untagged_ok(
            "UIDs valid.",
            Some(ResponseCode::UidValidity(snapshot.uid_validity)),
        );
        if let Some(first_unseen) = snapshot.first_unseen {
            response.add_untagged_ok(
                "First unseen message.",
                Some(ResponseCode::Unseen(first_unseen)),
            );
        }

        info!(
            "{} Selected {} ({})",
            self.log_prefix,
            mailbox,
            if snapshot.readonly { "read-only" } else { "read-write" }
        );
        self.selected = Some(snapshot);
        Ok((response, None))
    }

    pub(super) fn cmd_create(
        &mut self,
        tag: Tag,
        mailbox: MailboxName,
    ) -> CmdResult {
        if mailbox.is_inbox() {
            return Ok((Response::no(tag, "Cannot create INBOX.", None), None));
        }

        session!(self)?.create_mailbox(&mailbox)?;
        let after = self.refresh_selected()?;
        Ok((
            Response::ok(tag, "Mailbox created successfully.", None),
            after,
        ))
    }

    pub(super) fn cmd_delete(
        &mut self,
        tag: Tag,
        mailbox: MailboxName,
    ) -> CmdResult {
        if mailbox.is_inbox() {
            return Ok((Response::no(tag, "Cannot delete INBOX.", None), None));
        }

        session!(self)?.delete_mailbox(&mailbox)?;
        let after = self.refresh_selected()?;
        Ok((
            Response::ok(tag, "Mailbox deleted successfully.", None),
            after,
        ))
    }

    pub(super) fn cmd_rename(
        &mut self,
        tag: Tag,
        from: MailboxName,
        to: MailboxName,
    ) -> CmdResult {
        if to.is_inbox() {
            return Ok((
                Response::no(tag, "Cannot rename to INBOX.", None),
                None,
            ));
        }

        session!(self)?.rename_mailbox(&from, &to)?;
        let after = self.refresh_selected()?;
        Ok((
            Response::ok(tag, "Mailbox renamed successfully.", None),
            after,
        ))
    }

    pub(super) fn cmd_status(
        &mut self,
        tag: Tag,
        mailbox: MailboxName,
        attributes: &[StatusAttribute],
    ) -> CmdResult {
        // STATUS must not claim \Recent
        let snapshot = session!(self)?.get_mailbox(&mailbox, true)?;
        let items = attributes
            .iter()
            .map(|&attribute| {
                let value = match attribute {
                    StatusAttribute::Messages => snapshot.exists,
                    StatusAttribute::Recent => snapshot.recent,
                    StatusAttribute::UidNext => snapshot.uid_next,
                    StatusAttribute::UidValidity => snapshot.uid_validity,
                    StatusAttribute::Unseen => snapshot.unseen,
                };
                (attribute, u64::from(value))
            })
            .collect();

        let mut response = Response::ok(tag, "STATUS completed.", None);
        response.add_untagged(Response::special(Special::Status {
            mailbox,
            items,
        }));
        let after = self.refresh_selected()?;
        Ok((response, after))
    }

    pub(super) fn cmd_append(
        &mut self,
        tag: Tag,
        mailbox: MailboxName,
        data: Vec<u8>,
        flags: Vec<Flag>,
        when: Option<DateTime<FixedOffset>>,
    ) -> CmdResult {
        let (uid_validity, uid) = session!(self)?.append_message(
            &mailbox,
            AppendMessage { data, flags, when },
        )?;

        let after = self.refresh_selected()?;
        Ok((
            Response::ok(
                tag,
                "APPEND completed.",
                Some(ResponseCode::AppendUid(uid_validity, uid)),
            ),
            after,
        ))
    }

    pub(super) fn cmd_subscribe(
        &mut self,
        tag: Tag,
        mailbox: MailboxName,
        subscribe: bool,
    ) -> CmdResult {
        let session = session!(self)?;
        let text = if subscribe {
            session.subscribe(&mailbox)?;
            "SUBSCRIBE completed."
        } else {
            session.unsubscribe(&mailbox)?;
            "UNSUBSCRIBE completed."
        };

        let after = self.refresh_selected()?;
        Ok((Response::ok(tag, text, None), after))
    }

    pub(super) fn cmd_list(
        &mut self,
        tag: Tag,
        reference: &str,
        pattern: &str,
        subscribed: bool,
    ) -> CmdResult {
        let entries =
            session!(self)?.list_mailboxes(reference, pattern, subscribed)?;

        let mut response = Response::ok(
            tag,
            if subscribed {
                "LSUB completed."
            } else {
                "LIST completed."
            },
            None,
        );
        for entry in entries {
            response.add_untagged(Response::special(if subscribed {
                Special::Lsub(entry)
            } else {
                Special::List(entry)
            }));
        }

        let after = self.refresh_selected()?;
        Ok((response, after))
    }
}
