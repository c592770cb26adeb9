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

//! Client commands and the top-level command grammar.
//!
//! A command line is a tag, a verb, and arguments whose grammar depends on
//! the verb. Verbs are grouped by the session phase in which they are legal;
//! each group lives in its own submodule and exposes a `parse` function which
//! returns `None` if it does not know the verb at all.

use std::fmt;
use std::io;

use super::lex::{LexWriter, Writeable};
use super::parse::*;

pub mod any;
pub mod auth;
pub mod nonauth;
pub mod select;

pub use self::any::AnyCommand;
pub use self::auth::AuthCommand;
pub use self::nonauth::NonAuthCommand;
pub use self::select::{SelectCommand, StoreMode};

/// The tag correlating a command with its completion response.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Tag(Vec<u8>);

impl Tag {
    pub fn new(tag: Vec<u8>) -> Self {
        Tag(tag)
    }

    /// The `*` of untagged responses.
    pub fn untagged() -> Self {
        Tag(b"*".to_vec())
    }

    /// The `+` of continuation requests.
    pub fn continuation() -> Self {
        Tag(b"+".to_vec())
    }

    /// Parse a client tag.
    ///
    /// Client tags can never be `*` or `+`, since neither character is
    /// permitted in them.
    pub fn parse(
        buf: ParseBuffer<'_>,
    ) -> Result<(Tag, ParseBuffer<'_>), NotParseable> {
        let (tag, rest) = buf.skip_whitespace().take_while1(is_tag_char)?;
        Ok((Tag(tag.to_vec()), rest))
    }

    pub fn value(&self) -> &[u8] {
        &self.0
    }

    pub fn is_untagged(&self) -> bool {
        b"*" == &self.0[..]
    }
}

impl Writeable for Tag {
    fn write_to(&self, w: &mut LexWriter<'_>) -> io::Result<()> {
        w.verbatim_bytes(&self.0)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// The session phase in which a command is legal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    /// Any phase.
    Any,
    /// Only before authentication.
    NonAuth,
    /// Only after authentication.
    Auth,
    /// Only with a mailbox selected.
    Select,
}

#[derive(Clone, Debug, PartialEq)]
pub enum CommandBody {
    Any(AnyCommand),
    NonAuth(NonAuthCommand),
    Auth(AuthCommand),
    Select(SelectCommand),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Command {
    pub tag: Tag,
    /// The upper-cased verb, including the `UID` prefix if present.
    pub name: String,
    pub body: CommandBody,
}

impl Command {
    /// Parse one complete command.
    ///
    /// `buf` holds the command line including its line ending, and the
    /// payloads of any literals read so far. The parse suspends if the line
    /// ends in a literal whose payload has not been read yet.
    pub fn parse<'a>(
        buf: ParseBuffer<'a>,
        params: &Params,
    ) -> ParseResult<'a, Command> {
        let (tag, buf) = Tag::parse(buf)?;
        let buf = space(buf)?;
        let (verb, buf) = buf.take_while1(is_atom_char)?;
        let verb = String::from_utf8_lossy(verb).to_ascii_uppercase();

        let (name, result) = if "UID" == verb {
            let (sub, buf) = space(buf)
                .and_then(|buf| buf.take_while1(is_atom_char))
                .map_err(|_| NotParseable::BadCommand(b"UID".to_vec()))?;
            let sub = String::from_utf8_lossy(sub).to_ascii_uppercase();
            let result = select::parse(&sub, buf, &params.with_uid(true))
                .map(|r| r.map(|p| p.map(CommandBody::Select)))
                .ok_or_else(|| NotParseable::BadCommand(b"UID".to_vec()))?;
            (format!("UID {}", sub), Some(result))
        } else {
            let params = params.with_uid(false);
            let result = any::parse(&verb, buf, &params)
                .map(|r| r.map(|p| p.map(CommandBody::Any)))
                .or_else(|| {
                    auth::parse(&verb, buf, &params)
                        .map(|r| r.map(|p| p.map(CommandBody::Auth)))
                })
                .or_else(|| {
                    nonauth::parse(&verb, buf, &params)
                        .map(|r| r.map(|p| p.map(CommandBody::NonAuth)))
                })
                .or_else(|| {
                    select::parse(&verb, buf, &params)
                        .map(|r| r.map(|p| p.map(CommandBody::Select)))
                });
            (verb, result)
        };

        match result {
            None => Err(NotParseable::CommandNotFound(name.into_bytes())),
            Some(Err(NotParseable::Invalid)) => {
                Err(NotParseable::BadCommand(name.into_bytes()))
            }
            Some(Err(e)) => Err(e),
            Some(Ok(Progress::Suspended(req))) => Ok(Progress::Suspended(req)),
            Some(Ok(Progress::Complete(body, rest))) => Ok(Progress::Complete(
                Command { tag, name, body },
                rest,
            )),
        }
    }

    pub fn category(&self) -> Category {
        match self.body {
            CommandBody::Any(_) => Category::Any,
            CommandBody::NonAuth(_) => Category::NonAuth,
            CommandBody::Auth(_) => Category::Auth,
            CommandBody::Select(_) => Category::Select,
        }
    }
}

/// Finish a command, requiring that nothing but the line ending remains.
pub(super) fn finish<T>(value: T, buf: ParseBuffer<'_>) -> ParseResult<'_, T> {
    let rest = end_line(buf)?;
    if !rest.is_empty() || !rest.continuations().is_empty() {
        return Err(NotParseable::Invalid);
    }

    Ok(Progress::Complete(value, rest))
}
