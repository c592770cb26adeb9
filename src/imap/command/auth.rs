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

use super::finish;
use crate::imap::mailbox_name::MailboxName;
use crate::imap::parse::*;
use crate::imap::primitives::LiteralString;
use crate::imap::specials::{
    parse_datetime, Flag, ListMailbox, StatusAttribute,
};

/// Commands valid once authenticated, whether or not a mailbox is selected.
#[derive(Clone, Debug, PartialEq)]
pub enum AuthCommand {
    Append {
        mailbox: MailboxName,
        message: Vec<u8>,
        flags: Vec<Flag>,
        when: Option<DateTime<FixedOffset>>,
    },
    Create(MailboxName),
    Delete(MailboxName),
    Examine(MailboxName),
    List {
        reference: String,
        pattern: String,
    },
    Lsub {
        reference: String,
        pattern: String,
    },
    Rename {
        from: MailboxName,
        to: MailboxName,
    },
    Select(MailboxName),
    Status {
        mailbox: MailboxName,
        attributes: Vec<StatusAttribute>,
    },
    Subscribe(MailboxName),
    Unsubscribe(MailboxName),
}

pub fn parse<'a>(
    verb: &str,
    buf: ParseBuffer<'a>,
    params: &Params,
) -> Option<ParseResult<'a, AuthCommand>> {
    Some(match verb {
        "APPEND" => parse_append(buf, params),
        "CREATE" => parse_mailbox(buf, params, AuthCommand::Create),
        "DELETE" => parse_mailbox(buf, params, AuthCommand::Delete),
        "EXAMINE" => parse_mailbox(buf, params, AuthCommand::Examine),
        "LIST" => parse_list_command(buf, params, |reference, pattern| {
            AuthCommand::List { reference, pattern }
        }),
        "LSUB" => parse_list_command(buf, params, |reference, pattern| {
            AuthCommand::Lsub { reference, pattern }
        }),
        "RENAME" => parse_rename(buf, params),
        "SELECT" => parse_mailbox(buf, params, AuthCommand::Select),
        "STATUS" => parse_status(buf, params),
        "SUBSCRIBE" => parse_mailbox(buf, params, AuthCommand::Subscribe),
        "UNSUBSCRIBE" => parse_mailbox(buf, params, AuthCommand::Unsubscribe),
        _ => return None,
    })
}

fn parse_mailbox<'a>(
    buf: ParseBuffer<'a>,
    params: &Params,
    make: impl FnOnce(MailboxName) -> AuthCommand,
) -> ParseResult<'a, AuthCommand> {
    let (mailbox, buf) = complete!(MailboxName::parse(space(buf)?, params));
    finish(make(mailbox), buf)
}

fn parse_list_command<'a>(
    buf: ParseBuffer<'a>,
    params: &Params,
    make: impl FnOnce(String, String) -> AuthCommand,
) -> ParseResult<'a, AuthCommand> {
    let (reference, buf) = complete!(ListMailbox::parse(space(buf)?, params));
    let (pattern, buf) = complete!(ListMailbox::parse(space(buf)?, params));
    finish(make(reference.0, pattern.0), buf)
}

fn parse_rename<'a>(
    buf: ParseBuffer<'a>,
    params: &Params,
) -> ParseResult<'a, AuthCommand> {
    let (from, buf) = complete!(MailboxName::parse(space(buf)?, params));
    let (to, buf) = complete!(MailboxName::parse(space(buf)?, params));
    finish(AuthCommand::Rename { from, to }, buf)
}

fn parse_status<'a>(
    buf: ParseBuffer<'a>,
    params: &Params,
) -> ParseResult<'a, AuthCommand> {
    let (mailbox, buf) = complete!(MailboxName::parse(space(buf)?, params));
    let (attributes, buf) =
        complete!(parse_list(space(buf)?, params, StatusAttribute::parse));
    if attributes.is_empty() {
        return Err(NotParseable::Invalid);
    }

    finish(
        AuthCommand::Status {
            mailbox,
            attributes,
        },
        buf,
    )
}

/// `APPEND mailbox [flag-list] [date-time] literal`
///
/// The message literal is subject to the configured size limit, which is
/// checked before its payload is requested.
fn parse_append<'a>(
    buf: ParseBuffer<'a>,
    params: &Params,
) -> ParseResult<'a, AuthCommand> {
    let (mailbox, buf) = complete!(MailboxName::parse(space(buf)?, params));
    let mut buf = space(buf)?;

    let mut flags = Vec::new();
    if buf.starts_with(b"(") {
        let (parsed, rest) = complete!(Flag::parse_list(buf, params));
        flags = parsed;
        buf = space(rest)?;
    }

    let mut when = None;
    if buf.starts_with(b"\"") {
        let (parsed, rest) = complete!(parse_datetime(buf, params));
        when = Some(parsed);
        buf = space(rest)?;
    }

    let (message, buf) = complete!(LiteralString::parse_limited(
        buf,
        params,
        params.max_append_len
    ));
    finish(
        AuthCommand::Append {
            mailbox,
            message: message.into_value(),
            flags,
            when,
        },
        buf,
    )
}
