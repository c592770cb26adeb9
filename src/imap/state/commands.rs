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

use log::warn;

use super::defs::*;
use crate::imap::command::{
    AnyCommand, AuthCommand, Category, CommandBody, NonAuthCommand,
    SelectCommand,
};
use crate::imap::sasl;

impl ConnectionState {
    /// Handle one complete command, returning the tagged response with all
    /// untagged data attached.
    ///
    /// An `Err` means the connection can no longer continue. If the response
    /// is terminal, the caller must close the connection after sending it.
    pub fn handle(&mut self, command: Command) -> Result<Response, Error> {
        if let Some(response) = self.precheck(&command) {
            return Ok(response);
        }

        let tag = command.tag.clone();
        let name = command.name.clone();
        let result = self.dispatch(command);
        self.respond(&tag, &name, result)
    }

    /// Whether `command` is an AUTHENTICATE which should proceed to the
    /// challenge, i.e., the caller should send an empty continuation request
    /// and pass the client's reply to `authenticate()`.
    pub fn wants_challenge(&self, command: &Command) -> bool {
        match command.body {
            CommandBody::NonAuth(NonAuthCommand::Authenticate {
                ref mechanism,
            }) => self.session.is_none() && sasl::is_supported(mechanism),
            _ => false,
        }
    }

    /// Check that `command` is allowed in the current state, returning the
    /// BAD response if it is not.
    fn precheck(&self, command: &Command) -> Option<Response> {
        let complaint = match command.category() {
            Category::Any => return None,
            Category::NonAuth if self.session.is_some() => {
                "Already authenticated."
            }
            Category::Auth if self.session.is_none() => {
                "Must authenticate first."
            }
            Category::Select if self.session.is_none() => {
                "Must authenticate first."
            }
            Category::Select if self.selected.is_none() => {
                "Must select a mailbox first."
            }
            _ => return None,
        };

        warn!(
            "{} {} rejected: {}",
            self.log_prefix, command.name, complaint
        );
        Some(Response::bad(
            command.tag.clone(),
            format!("{}: {}", command.name, complaint),
            None,
        ))
    }

    fn dispatch(&mut self, command: Command) -> CmdResult {
        let Command { tag, name, body } = command;
        match body {
            CommandBody::Any(AnyCommand::Capability) => {
                self.cmd_capability(tag)
            }
            CommandBody::Any(AnyCommand::Logout) => Err(Error::CloseConnection),
            CommandBody::Any(AnyCommand::Noop) => self.cmd_noop(tag),

            CommandBody::NonAuth(NonAuthCommand::Login { user, password }) => {
                self.cmd_login(tag, &user, &password)
            }
            CommandBody::NonAuth(NonAuthCommand::Authenticate { .. }) => {
                Ok((
                    Response::no(
                        tag,
                        "Invalid authentication mechanism.",
                        None,
                    ),
                    None,
                ))
            }
            CommandBody::NonAuth(NonAuthCommand::StartTls) => Ok((
                Response::no(tag, format!("{}: Not Implemented", name), None),
                None,
            )),

            CommandBody::Auth(AuthCommand::Append {
                mailbox,
                message,
                flags,
                when,
            }) => self.cmd_append(tag, mailbox, message, flags, when),
            CommandBody::Auth(AuthCommand::Create(mailbox)) => {
                self.cmd_create(tag, mailbox)
            }
            CommandBody::Auth(AuthCommand::Delete(mailbox)) => {
                self.cmd_delete(tag, mailbox)
            }
            CommandBody::Auth(AuthCommand::Examine(mailbox)) => {
                self.cmd_select(tag, mailbox, true)
            }
            CommandBody::Auth(AuthCommand::List { reference, pattern }) => {
                self.cmd_list(tag, &reference, &pattern, false)
            }
            CommandBody::Auth(AuthCommand::Lsub { reference, pattern }) => {
                self.cmd_list(tag, &reference, &pattern, true)
            }
            CommandBody::Auth(AuthCommand::Rename { from, to }) => {
                self.cmd_rename(tag, from, to)
            }
            CommandBody::Auth(AuthCommand::Select(mailbox)) => {
                self.cmd_select(tag, mailbox, false)
            }
            CommandBody::Auth(AuthCommand::Status {
                mailbox,
                attributes,
            }) => self.cmd_status(tag, mailbox, &attributes),
            CommandBody::Auth(AuthCommand::Subscribe(mailbox)) => {
                self.cmd_subscribe(tag, mailbox, true)
            }
            CommandBody::Auth(AuthCommand::Unsubscribe(mailbox)) => {
                self.cmd_subscribe(tag, mailbox, false)
            }

            CommandBody::Select(SelectCommand::Check) => self.cmd_check(tag),
            CommandBody::Select(SelectCommand::Close) => self.cmd_close(tag),
            CommandBody::Select(SelectCommand::Expunge { uid_set }) => {
                self.cmd_expunge(tag, &name, uid_set.as_ref())
            }
            CommandBody::Select(SelectCommand::Copy { set, mailbox }) => {
                self.cmd_copy(tag, &name, &set, &mailbox)
            }
            CommandBody::Select(SelectCommand::Fetch { set, attributes }) => {
                self.cmd_fetch(tag, &name, &set, &attributes)
            }
            CommandBody::Select(SelectCommand::Store {
                set,
                mode,
                silent,
                flags,
            }) => self.cmd_store(tag, &name, &set, mode, silent, &flags),
            CommandBody::Select(SelectCommand::Search { keys, uid, .. }) => {
                self.cmd_search(tag, &name, &keys, uid)
            }
        }
    }
}
