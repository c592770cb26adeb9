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

use super::finish;
use crate::imap::parse::*;
use crate::imap::primitives::Atom;
use crate::imap::specials::AString;

/// Commands valid only before authentication.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NonAuthCommand {
    /// Start a SASL exchange with the named (upper-cased) mechanism.
    Authenticate { mechanism: String },
    Login { user: Vec<u8>, password: Vec<u8> },
    /// Recognised, but this server has no TLS layer to start.
    StartTls,
}

pub fn parse<'a>(
    verb: &str,
    buf: ParseBuffer<'a>,
    params: &Params,
) -> Option<ParseResult<'a, NonAuthCommand>> {
    match verb {
        "AUTHENTICATE" => Some(parse_authenticate(buf, params)),
        "LOGIN" => Some(parse_login(buf, params)),
        "STARTTLS" => Some(finish(NonAuthCommand::StartTls, buf)),
        _ => None,
    }
}

fn parse_authenticate<'a>(
    buf: ParseBuffer<'a>,
    params: &Params,
) -> ParseResult<'a, NonAuthCommand> {
    let (mechanism, buf) = complete!(Atom::parse(space(buf)?, params));
    finish(
        NonAuthCommand::Authenticate {
            mechanism: String::from_utf8_lossy(&mechanism.upper()).into_owned(),
        },
        buf,
    )
}

fn parse_login<'a>(
    buf: ParseBuffer<'a>,
    params: &Params,
) -> ParseResult<'a, NonAuthCommand> {
    let (user, buf) = complete!(AString::parse(space(buf)?, params));
    let (password, buf) = complete!(AString::parse(space(buf)?, params));
    finish(
        NonAuthCommand::Login {
            user: user.into_value(),
            password: password.into_value(),
        },
        buf,
    )
}
