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
use crate::imap::fetch::FetchAttribute;
use crate::imap::mailbox_name::MailboxName;
use crate::imap::parse::*;
use crate::imap::primitives::Atom;
use crate::imap::search::SearchKey;
use crate::imap::specials::{AString, Flag, SequenceSet};

/// How STORE combines the given flags with those already set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreMode {
    Replace,
    Add,
    Remove,
}

/// Commands valid only with a mailbox selected.
///
/// Those taking a sequence set may be prefixed with `UID`, in which case the
/// set's `uid` flag is set.
#[derive(Clone, Debug, PartialEq)]
pub enum SelectCommand {
    Check,
    Close,
    /// `EXPUNGE`, or `UID EXPUNGE` with the UIDs to restrict it to.
    Expunge { uid_set: Option<SequenceSet> },
    Copy {
        set: SequenceSet,
        mailbox: MailboxName,
    },
    Fetch {
        set: SequenceSet,
        attributes: Vec<FetchAttribute>,
    },
    Store {
        set: SequenceSet,
        mode: StoreMode,
        silent: bool,
        /// The flags to apply; `\Recent` is never included.
        flags: Vec<Flag>,
    },
    Search {
        charset: Option<String>,
        keys: Vec<SearchKey>,
        uid: bool,
    },
}

pub fn parse<'a>(
    verb: &str,
    buf: ParseBuffer<'a>,
    params: &Params,
) -> Option<ParseResult<'a, SelectCommand>> {
    Some(match verb {
        "CHECK" if !params.uid => finish(SelectCommand::Check, buf),
        "CLOSE" if !params.uid => finish(SelectCommand::Close, buf),
        "EXPUNGE" => parse_expunge(buf, params),
        "COPY" => parse_copy(buf, params),
        "FETCH" => parse_fetch(buf, params),
        "STORE" => parse_store(buf, params),
        "SEARCH" => parse_search(buf, params),
        _ => return None,
    })
}

fn parse_expunge<'a>(
    buf: ParseBuffer<'a>,
    params: &Params,
) -> ParseResult<'a, SelectCommand> {
    if !params.uid {
        return finish(SelectCommand::Expunge { uid_set: None }, buf);
    }

    let (set, buf) = complete!(SequenceSet::parse(space(buf)?, params));
    finish(SelectCommand::Expunge { uid_set: Some(set) }, buf)
}

fn parse_copy<'a>(
    buf: ParseBuffer<'a>,
    params: &Params,
) -> ParseResult<'a, SelectCommand> {
    let (set, buf) = complete!(SequenceSet::parse(space(buf)?, params));
    let (mailbox, buf) = complete!(MailboxName::parse(space(buf)?, params));
    finish(SelectCommand::Copy { set, mailbox }, buf)
}

fn parse_fetch<'a>(
    buf: ParseBuffer<'a>,
    params: &Params,
) -> ParseResult<'a, SelectCommand> {
    let (set, buf) = complete!(SequenceSet::parse(space(buf)?, params));
    let (mut attributes, buf) =
        complete!(FetchAttribute::parse_request(space(buf)?, params));
    if params.uid && !attributes.contains(&FetchAttribute::Uid) {
        attributes.push(FetchAttribute::Uid);
    }

    finish(SelectCommand::Fetch { set, attributes }, buf)
}

/// `STORE set [+-]FLAGS[.SILENT] flags`, where the flags may be a list or
/// a bare sequence of flags.
fn parse_store<'a>(
    buf: ParseBuffer<'a>,
    params: &Params,
) -> ParseResult<'a, SelectCommand> {
    let (set, buf) = complete!(SequenceSet::parse(space(buf)?, params));
    let (item, buf) = complete!(Atom::parse(space(buf)?, params));
    let item = item.upper();
    let (mode, item) = match item.first() {
        Some(b'+') => (StoreMode::Add, &item[1..]),
        Some(b'-') => (StoreMode::Remove, &item[1..]),
        _ => (StoreMode::Replace, &item[..]),
    };
    let silent = match item {
        b"FLAGS" => false,
        b"FLAGS.SILENT" => true,
        _ => return Err(NotParseable::Invalid),
    };

    let buf = space(buf)?;
    let (flags, buf) = if buf.starts_with(b"(") {
        complete!(Flag::parse_list(buf, params))
    } else {
        let mut flags = Vec::new();
        let mut buf = buf;
        while let Ok(Progress::Complete(flag, rest)) = Flag::parse(buf, params)
        {
            flags.push(flag);
            buf = rest;
        }
        if flags.is_empty() {
            return Err(NotParseable::Invalid);
        }
        (flags, buf)
    };

    finish(
        SelectCommand::Store {
            set,
            mode,
            silent,
            flags: flags.into_iter().filter(|f| Flag::Recent != *f).collect(),
        },
        buf,
    )
}

/// `SEARCH [CHARSET name] key...`
fn parse_search<'a>(
    buf: ParseBuffer<'a>,
    params: &Params,
) -> ParseResult<'a, SelectCommand> {
    let mut buf = space(buf)?;
    let mut charset = None;
    if let Ok(Progress::Complete(atom, rest)) = Atom::parse(buf, params) {
        if b"CHARSET" == &atom.upper()[..] {
            let (name, rest) = complete!(AString::parse(space(rest)?, params));
            let name = String::from_utf8_lossy(name.value()).into_owned();
            SearchKey::check_charset(&name)?;
            charset = Some(name);
            buf = space(rest)?;
        }
    }

    let key_params = params.with_charset(charset.clone());
    let mut keys = Vec::new();
    loop {
        let (key, rest) = complete!(SearchKey::parse(buf, &key_params));
        keys.push(key);
        if at_end_line(rest) {
            buf = rest;
            break;
        }
        buf = space(rest)?;
    }

    finish(
        SelectCommand::Search {
            charset,
            keys,
            uid: params.uid,
        },
        buf,
    )
}
