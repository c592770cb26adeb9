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

use std::mem;
use std::sync::Arc;

use log::{error, info, warn};

pub(super) use crate::backend::{Login, MailboxSnapshot, Session, Update};
pub(super) use crate::imap::command::{Command, Tag};
pub(super) use crate::imap::fetch::FetchAttribute;
pub(super) use crate::imap::parse::Params;
pub(super) use crate::imap::response::{
    FetchResponse, FetchValue, Response, ResponseCode, Special,
};
pub(super) use crate::support::{
    error::Error, log_prefix::LogPrefix, system_config::SystemConfig,
};

/// The result of a command handler: the tagged response, with any data
/// already attached, and the refreshed snapshot of the selected mailbox if
/// the handler obtained one.
pub(super) type CmdResult = Result<(Response, Option<MailboxSnapshot>), Error>;

/// The protocol state of one connection.
pub struct ConnectionState {
    pub(super) log_prefix: LogPrefix,
    pub(super) config: Arc<SystemConfig>,
    pub(super) host_name: String,
    pub(super) login: Arc<dyn Login>,

    pub(super) session: Option<Box<dyn Session>>,
    pub(super) selected: Option<MailboxSnapshot>,
}

impl ConnectionState {
    pub fn new(
        log_prefix: LogPrefix,
        config: Arc<SystemConfig>,
        login: Arc<dyn Login>,
    ) -> Self {
        let host_name = config.imap.effective_host_name();
        ConnectionState {
            log_prefix,
            config,
            host_name,
            login,

            session: None,
            selected: None,
        }
    }

    pub fn capabilities(&self) -> Vec<String> {
        let mut caps = vec!["IMAP4rev1".to_owned()];
        if self.config.imap.literal_plus {
            caps.push("LITERAL+".to_owned());
        }
        caps.push("UIDPLUS".to_owned());
        caps.push("CHILDREN".to_owned());
        caps.push(format!("APPENDLIMIT={}", self.config.imap.max_append_len));
        caps.push("AUTH=PLAIN".to_owned());
        caps
    }

    pub(super) fn capability_code(&self) -> Option<ResponseCode> {
        Some(ResponseCode::Capability(self.capabilities()))
    }

    /// The untagged OK sent when the client connects.
    pub fn greeting(&self) -> Response {
        Response::untagged_ok(
            format!("Server ready {}", self.host_name),
            self.capability_code(),
        )
    }

    /// The parser context for the next command.
    pub fn params(&self) -> Params {
        Params {
            max_append_len: Some(self.config.imap.max_append_len),
            ..Params::default()
        }
    }

    /// Consecutive BAD responses after which the client is disconnected.
    pub fn bad_command_limit(&self) -> u32 {
        self.config.imap.bad_command_limit
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Turn the outcome of a handler into the response for the client.
    ///
    /// Mailbox updates found by the handler are attached to the response and
    /// the new snapshot replaces the current one. Failures are rendered by
    /// the error itself; only failures with no response, which mean the
    /// connection is broken, are returned as errors.
    pub(super) fn respond(
        &mut self,
        tag: &Tag,
        name: &str,
        result: CmdResult,
    ) -> Result<Response, Error> {
        match result {
            Ok((mut response, after)) => {
                if let (Some(mut after), Some(before)) =
                    (after, self.selected.as_mut())
                {
                    for update in get_updates(before, &mut after) {
                        response.add_untagged(update);
                    }
                    self.selected = Some(after);
                }
                Ok(response)
            }

            Err(Error::CloseConnection) => {
                info!("{} Logged out", self.log_prefix);
                self.log_prefix.clear_user();
                self.selected = None;
                self.session = None;
                Error::CloseConnection
                    .to_response(tag)
                    .ok_or(Error::CloseConnection)
            }

            Err(e) => match e.to_response(tag) {
                Some(response) => {
                    info!("{} {} failed: {}", self.log_prefix, name, e);
                    Ok(response)
                }
                None => {
                    error!("{} {} failed: {}", self.log_prefix, name, e);
                    Err(e)
                }
            },
        }
    }

    /// Refresh the selected mailbox, if any, after a command that did not
    /// operate on it directly.
    ///
    /// If the mailbox has gone away in the meantime, it is deselected.
    pub(super) fn refresh_selected(
        &mut self,
    ) -> Result<Option<MailboxSnapshot>, Error> {
        let (session, selected) = match (&mut self.session, &self.selected) {
            (&mut Some(ref mut session), &Some(ref selected)) => {
                (session, selected)
            }
            _ => return Ok(None),
        };

        match session.check_mailbox(selected, false) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(Error::MailboxNotFound { .. }) => {
                warn!(
                    "{} Selected mailbox {} no longer exists",
                    self.log_prefix, selected.name
                );
                self.selected = None;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// Compute the untagged responses which tell the client how the selected
/// mailbox changed from `before` to `after`.
///
/// Count changes come first, then the pending per-message updates of both
/// snapshots in ascending order of the sequence number each message had
/// before the updates. Both snapshots' pending updates are consumed.
///
/// EXISTS never decreases: it counts the messages as they were before the
/// batch's expunges are applied, so new messages are announced first and
/// each EXPUNGE then brings the client down to `after.exists`. Since every
/// EXPUNGE shifts the numbering of later messages down by one, updates
/// following an expunge in the same batch are reported under the shifted
/// number.
fn get_updates(
    before: &mut MailboxSnapshot,
    after: &mut MailboxSnapshot,
) -> Vec<Response> {
    let mut pending = mem::take(&mut before.updates);
    pending.append(&mut after.updates);
    let expunges = pending
        .values()
        .filter(|&update| Update::Expunge == *update)
        .count() as u32;

    let mut responses = Vec::new();
    let exists = after.exists + expunges;
    if before.exists != exists {
        responses.push(Response::special(Special::Exists(exists)));
    }
    if before.recent != after.recent {
        responses.push(Response::special(Special::Recent(after.recent)));
    }

    let mut expunged = 0;
    for (seq, update) in pending {
        let seq = seq - expunged;
        match update {
            Update::Expunge => {
                responses.push(Response::special(Special::Expunge(seq)));
                expunged += 1;
            }
            Update::Fetch(mut flags) => {
                flags.sort();
                let mut fetch = FetchResponse::new(seq);
                fetch.set(FetchAttribute::Flags, FetchValue::Flags(flags));
                responses.push(Response::special(Special::Fetch(fetch)));
            }
        }
    }

    responses
}
