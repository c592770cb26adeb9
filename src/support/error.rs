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

//! Failure kinds raised by command handlers and the storage collaborator.
//!
//! Every kind knows how to render itself as the response the client should
//! see; the connection loop never needs to look inside.

use std::io;

use thiserror::Error;

use crate::imap::command::Tag;
use crate::imap::response::{Response, ResponseCode};

#[derive(Error, Debug)]
pub enum Error {
    /// The client asked to end the session.
    #[error("Connection closed by LOGOUT")]
    CloseConnection,
    #[error("Command not allowed: {}", String::from_utf8_lossy(.message))]
    CommandNotAllowed {
        message: Vec<u8>,
        code: Option<ResponseCode>,
    },
    #[error("Search key not allowed: {0}")]
    SearchNotAllowed(String),
    #[error("Invalid authentication credentials")]
    InvalidAuth,
    #[error("Mailbox does not exist: {name}")]
    MailboxNotFound { name: String, try_create: bool },
    #[error("Mailbox already exists: {0}")]
    MailboxConflict(String),
    #[error("Mailbox has children: {0}")]
    MailboxHasChildren(String),
    #[error("Mailbox is read-only: {0}")]
    MailboxReadOnly(String),
    #[error("Append failed: {0}")]
    AppendFailure(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub fn not_found(name: impl Into<String>) -> Self {
        Error::MailboxNotFound {
            name: name.into(),
            try_create: false,
        }
    }

    pub fn try_create(name: impl Into<String>) -> Self {
        Error::MailboxNotFound {
            name: name.into(),
            try_create: true,
        }
    }

    /// Build the response the client receives for this failure.
    ///
    /// Returns `None` for transport-level failures, after which the
    /// connection cannot continue.
    pub fn to_response(&self, tag: &Tag) -> Option<Response> {
        let tag = tag.clone();
        Some(match *self {
            Error::CloseConnection => {
                let mut response =
                    Response::ok(tag, "Logout successful.", None);
                response.add_untagged(Response::bye("Logging out.", None));
                response
            }
            Error::CommandNotAllowed {
                ref message,
                ref code,
            } => Response::no(tag, message.clone(), code.clone()),
            Error::SearchNotAllowed(ref key) => Response::no(
                tag,
                format!("SEARCH {} not allowed.", key),
                ResponseCode::of(Some(b"CANNOT")),
            ),
            Error::InvalidAuth => Response::no(
                tag,
                "Invalid authentication credentials.",
                ResponseCode::of(Some(b"AUTHENTICATIONFAILED")),
            ),
            Error::MailboxNotFound { try_create, .. } => Response::no(
                tag,
                "Mailbox does not exist.",
                ResponseCode::of(Some(if try_create {
                    &b"TRYCREATE"[..]
                } else {
                    &b"NONEXISTENT"[..]
                })),
            ),
            Error::MailboxConflict(_) => Response::no(
                tag,
                "Mailbox already exists.",
                ResponseCode::of(Some(b"ALREADYEXISTS")),
            ),
            Error::MailboxHasChildren(_) => Response::no(
                tag,
                "Mailbox has inferior hierarchical names.",
                None,
            ),
            Error::MailboxReadOnly(_) => Response::no(
                tag,
                "Mailbox is read-only.",
                Some(ResponseCode::ReadOnly),
            ),
            Error::AppendFailure(ref message) => {
                Response::no(tag, message.clone(), None)
            }
            Error::Config(_) | Error::Io(_) => return None,
        })
    }
}
