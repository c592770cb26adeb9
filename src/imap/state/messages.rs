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

use super::defs::*;
use crate::imap::command::StoreMode;
use crate::imap::mailbox_name::MailboxName;
use crate::imap::search::SearchKey;
use crate::imap::specials::{Flag, SequenceSet};

impl ConnectionState {
    pub(super) fn cmd_check(&mut self, tag: Tag) -> CmdResult {
        let selected = selected!(self)?;
        let after = session!(self)?.check_mailbox(selected, true)?;
        Ok((Response::ok(tag, "CHECK completed.", None), Some(after)))
    }

    pub(super) fn cmd_close(&mut self, tag: Tag) -> CmdResult {
        let selected = selected!(self)?;
        if !selected.readonly {
            // CLOSE sends no EXPUNGE responses
            session!(self)?.expunge_mailbox(selected, None)?;
        }

        self.selected = None;
        Ok((Response::ok(tag, "CLOSE completed.", None), None))
    }

    pub(super) fn cmd_expunge(
        &mut self,
        tag: Tag,
        name: &str,
        uid_set: Option<&SequenceSet>,
    ) -> CmdResult {
        let selected = selected!(self)?;
        let (removed, mut after) =
            session!(self)?.expunge_mailbox(selected, uid_set)?;
        // Reported with any concurrent updates so that numbering stays
        // consistent across both
        for seq in removed {
            after.updates.insert(seq, Update::Expunge);
        }
        Ok((completed(tag, name, None), Some(after)))
    }

    pub(super) fn cmd_copy(
        &mut self,
        tag: Tag,
        name: &str,
        set: &SequenceSet,
        mailbox: &MailboxName,
    ) -> CmdResult {
        let selected = selected!(self)?;
        let (result, after) =
            session!(self)?.copy_messages(selected, set, mailbox)?;

        let code = if result.source.is_empty() {
            None
        } else {
            Some(ResponseCode::CopyUid(
                result.uid_validity,
                result.source,
                result.destination,
            ))
        };
        Ok((completed(tag, name, code), Some(after)))
    }

    pub(super) fn cmd_store(
        &mut self,
        tag: Tag,
        name: &str,
        set: &SequenceSet,
        mode: StoreMode,
        silent: bool,
        flags: &[Flag],
    ) -> CmdResult {
        let flags: Vec<Flag> = flags
            .iter()
            .filter(|&flag| Flag::Recent != *flag)
            .cloned()
            .collect();

        let selected = selected!(self)?;
        let (stored, after) =
            session!(self)?.update_flags(selected, set, &flags, mode)?;

        let mut response = completed(tag, name, None);
        if !silent {
            for message in stored {
                let mut fetch = FetchResponse::new(message.seq);
                fetch.set(
                    FetchAttribute::Flags,
                    FetchValue::Flags(message.flags),
                );
                if set.uid {
                    fetch.set(
                        FetchAttribute::Uid,
                        FetchValue::Uid(message.uid),
                    );
                }
                response.add_untagged(Response::special(Special::Fetch(fetch)));
            }
        }

        Ok((response, Some(after)))
    }

    pub(super) fn cmd_search(
        &mut self,
        tag: Tag,
        name: &str,
        keys: &[SearchKey],
        uid: bool,
    ) -> CmdResult {
        let selected = selected!(self)?;
        let (hits, after) = session!(self)?.search_mailbox(selected, keys)?;

        let mut response = completed(tag, name, None);
        response.add_untagged(Response::special(Special::Search(
            hits.into_iter()
                .map(|(seq, message_uid)| if uid { message_uid } else { seq })
                .collect(),
        )));
        Ok((response, Some(after)))
    }
}

/// The usual `<NAME> completed.` response.
pub(super) fn completed(
    tag: Tag,
    name: &str,
    code: Option<ResponseCode>,
) -> Response {
    Response::ok(tag, format!("{} completed.", name), code)
}
