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

//! Composite argument types shared between several commands.

use std::fmt;
use std::io;
use std::str;

use chrono::prelude::*;

use super::lex::{LexWriter, Writeable};
use super::parse::*;
use super::primitives::{Atom, ImapString, QuotedString};

/// A string which may also be written as a bare run of astring characters.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AString(Vec<u8>);

impl AString {
    pub fn new(value: impl Into<Vec<u8>>) -> Self {
        AString(value.into())
    }

    pub fn parse<'a>(
        buf: ParseBuffer<'a>,
        params: &Params,
    ) -> ParseResult<'a, AString> {
        try_alternative!(ImapString::parse(buf, params)
            .map(|p| p.map(|s| AString(s.into_value()))));
        let (atom, rest) =
            buf.skip_whitespace().take_while1(is_astring_char)?;
        Ok(Progress::Complete(AString(atom.to_vec()), rest))
    }

    pub fn value(&self) -> &[u8] {
        &self.0
    }

    pub fn into_value(self) -> Vec<u8> {
        self.0
    }
}

impl Writeable for AString {
    fn write_to(&self, w: &mut LexWriter<'_>) -> io::Result<()> {
        w.astring(&self.0)
    }
}

/// The pattern argument of LIST and LSUB, which may contain the `%` and `*`
/// wildcards unquoted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListMailbox(pub String);

impl ListMailbox {
    pub fn parse<'a>(
        buf: ParseBuffer<'a>,
        params: &Params,
    ) -> ParseResult<'a, ListMailbox> {
        try_alternative!(ImapString::parse(buf, params).map(|p| p.map(|s| {
            ListMailbox(super::mailbox_name::decode(&String::from_utf8_lossy(
                s.value(),
            )))
        })));
        let (pattern, rest) =
            buf.skip_whitespace().take_while1(is_list_char)?;
        Ok(Progress::Complete(
            ListMailbox(super::mailbox_name::decode(
                &String::from_utf8_lossy(pattern),
            )),
            rest,
        ))
    }
}

/// One end of a sequence range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeqBound {
    Value(u32),
    /// The largest number in use in the mailbox.
    Star,
}

impl SeqBound {
    fn resolve(self, max: u32) -> u32 {
        match self {
            SeqBound::Value(v) => v,
            SeqBound::Star => max,
        }
    }

    fn parse(s: &[u8]) -> Option<Self> {
        if b"*" == s {
            Some(SeqBound::Star)
        } else {
            parse_decimal(s)
                .filter(|&v: &u32| v > 0)
                .map(SeqBound::Value)
        }
    }
}

impl fmt::Display for SeqBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            SeqBound::Value(v) => write!(f, "{}", v),
            SeqBound::Star => write!(f, "*"),
        }
    }
}

/// A set of sequence numbers or UIDs, such as `1:3,7,10:*`.
///
/// The set is not resolved when parsed; `*` only acquires a value once the
/// mailbox it is applied to is known.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SequenceSet {
    ranges: Vec<(SeqBound, SeqBound)>,
    /// Whether the numbers are UIDs rather than sequence numbers.
    pub uid: bool,
}

impl SequenceSet {
    pub fn single(value: u32, uid: bool) -> Self {
        SequenceSet {
            ranges: vec![(SeqBound::Value(value), SeqBound::Value(value))],
            uid,
        }
    }

    /// The set `1:*`.
    pub fn all(uid: bool) -> Self {
        SequenceSet {
            ranges: vec![(SeqBound::Value(1), SeqBound::Star)],
            uid,
        }
    }

    pub fn parse<'a>(
        buf: ParseBuffer<'a>,
        params: &Params,
    ) -> ParseResult<'a, SequenceSet> {
        let (raw, rest) = buf.skip_whitespace().take_while1(|b| {
            b.is_ascii_digit() || b',' == b || b':' == b || b'*' == b
        })?;

        let mut ranges = Vec::new();
        for part in raw.split(|&b| b',' == b) {
            let mut bounds = part.splitn(2, |&b| b':' == b);
            let low = bounds
                .next()
                .and_then(SeqBound::parse)
                .ok_or(NotParseable::Invalid)?;
            let high = match bounds.next() {
                Some(high) => {
                    SeqBound::parse(high).ok_or(NotParseable::Invalid)?
                }
                None => low,
            };
            ranges.push((low, high));
        }

        Ok(Progress::Complete(
            SequenceSet {
                ranges,
                uid: params.uid,
            },
            rest,
        ))
    }

    /// Whether `value` is in the set, where `max` is the value of `*`.
    ///
    /// Ranges may be given in either order, so `4:2` is the same as `2:4`.
    /// A range involving `*` always includes `max`, even if the other end is
    /// greater than it.
    pub fn contains(&self, value: u32, max: u32) -> bool {
        self.ranges.iter().any(|&(a, b)| {
            let (a, b) = (a.resolve(max), b.resolve(max));
            a.min(b) <= value && value <= a.max(b)
        })
    }
}

impl Writeable for SequenceSet {
    fn write_to(&self, w: &mut LexWriter<'_>) -> io::Result<()> {
        for (ix, &(low, high)) in self.ranges.iter().enumerate() {
            if ix > 0 {
                w.verbatim(",")?;
            }
            if low == high {
                w.verbatim(&low.to_string())?;
            } else {
                w.verbatim(&format!("{}:{}", low, high))?;
            }
        }
        Ok(())
    }
}

/// A message flag.
///
/// The derived ordering puts system flags first, alphabetically, followed by
/// other backslash flags and then keywords; this is the order in which flag
/// lists are sent to clients.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Flag {
    Answered,
    Deleted,
    Draft,
    Flagged,
    Recent,
    Seen,
    /// A backslash flag not defined by IMAP4rev1, stored without the
    /// backslash.
    Extension(String),
    Keyword(String),
}

impl Flag {
    /// The flags a client may set and which persist across sessions.
    pub fn permanent() -> Vec<Flag> {
        vec![
            Flag::Answered,
            Flag::Deleted,
            Flag::Draft,
            Flag::Flagged,
            Flag::Seen,
        ]
    }

    /// The flags listed by the FLAGS response on SELECT.
    pub fn defined() -> Vec<Flag> {
        vec![
            Flag::Answered,
            Flag::Deleted,
            Flag::Draft,
            Flag::Flagged,
            Flag::Recent,
            Flag::Seen,
        ]
    }

    pub fn parse<'a>(
        buf: ParseBuffer<'a>,
        _: &Params,
    ) -> ParseResult<'a, Flag> {
        let buf = buf.skip_whitespace();
        if buf.starts_with(b"\\") {
            let (name, rest) = buf.advance(1).take_while1(is_atom_char)?;
            let name = str::from_utf8(name).map_err(|_| NotParseable::Invalid)?;
            Ok(Progress::Complete(Flag::system(name), rest))
        } else {
            let (name, rest) = buf.take_while1(is_atom_char)?;
            let name = str::from_utf8(name).map_err(|_| NotParseable::Invalid)?;
            Ok(Progress::Complete(Flag::Keyword(name.to_owned()), rest))
        }
    }

    /// Interpret a backslash flag by name, without the backslash.
    pub fn system(name: &str) -> Flag {
        match name.to_ascii_uppercase().as_str() {
            "ANSWERED" => Flag::Answered,
            "DELETED" => Flag::Deleted,
            "DRAFT" => Flag::Draft,
            "FLAGGED" => Flag::Flagged,
            "RECENT" => Flag::Recent,
            "SEEN" => Flag::Seen,
            _ => Flag::Extension(name.to_owned()),
        }
    }

    /// Parse a parenthesised flag list.
    pub fn parse_list<'a>(
        buf: ParseBuffer<'a>,
        params: &Params,
    ) -> ParseResult<'a, Vec<Flag>> {
        parse_list(buf, params, Flag::parse)
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Flag::Answered => write!(f, "\\Answered"),
            Flag::Deleted => write!(f, "\\Deleted"),
            Flag::Draft => write!(f, "\\Draft"),
            Flag::Flagged => write!(f, "\\Flagged"),
            Flag::Recent => write!(f, "\\Recent"),
            Flag::Seen => write!(f, "\\Seen"),
            Flag::Extension(ref name) => write!(f, "\\{}", name),
            Flag::Keyword(ref name) => write!(f, "{}", name),
        }
    }
}

impl Writeable for Flag {
    fn write_to(&self, w: &mut LexWriter<'_>) -> io::Result<()> {
        w.verbatim(&self.to_string())
    }
}

/// Write `flags` as a parenthesised list in canonical order.
pub fn write_flag_list<'f>(
    w: &mut LexWriter<'_>,
    flags: impl IntoIterator<Item = &'f Flag>,
) -> io::Result<()> {
    let mut flags = flags.into_iter().collect::<Vec<_>>();
    flags.sort();
    flags.dedup();

    w.verbatim("(")?;
    for (ix, flag) in flags.into_iter().enumerate() {
        if ix > 0 {
            w.space()?;
        }
        flag.write_to(w)?;
    }
    w.verbatim(")")
}

/// Parse the quoted `date-time` of APPEND, e.g. `" 2-Jan-2020 03:04:05
/// +0100"`.
pub fn parse_datetime<'a>(
    buf: ParseBuffer<'a>,
    params: &Params,
) -> ParseResult<'a, DateTime<FixedOffset>> {
    let (quoted, rest) = complete!(QuotedString::parse(buf, params));
    let text =
        str::from_utf8(quoted.value()).map_err(|_| NotParseable::Invalid)?;
    DateTime::parse_from_str(text.trim_start(), "%d-%b-%Y %H:%M:%S %z")
        .map(|dt| Progress::Complete(dt, rest))
        .map_err(|_| NotParseable::Invalid)
}

/// Parse the `date` of SEARCH, which may or may not be quoted.
pub fn parse_date<'a>(
    buf: ParseBuffer<'a>,
    params: &Params,
) -> ParseResult<'a, NaiveDate> {
    let (text, rest) = match QuotedString::parse(buf, params) {
        Ok(Progress::Complete(quoted, rest)) => (quoted.into_value(), rest),
        _ => {
            let (atom, rest) = complete!(Atom::parse(buf, params));
            (atom.0, rest)
        }
    };
    let text = str::from_utf8(&text).map_err(|_| NotParseable::Invalid)?;
    NaiveDate::parse_from_str(text, "%d-%b-%Y")
        .map(|date| Progress::Complete(date, rest))
        .map_err(|_| NotParseable::Invalid)
}

/// The data items STATUS can report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusAttribute {
    Messages,
    Recent,
    UidNext,
    UidValidity,
    Unseen,
}

impl StatusAttribute {
    pub fn parse<'a>(
        buf: ParseBuffer<'a>,
        params: &Params,
    ) -> ParseResult<'a, StatusAttribute> {
        let (atom, rest) = complete!(Atom::parse(buf, params));
        let attribute = match &atom.upper()[..] {
            b"MESSAGES" => StatusAttribute::Messages,
            b"RECENT" => StatusAttribute::Recent,
            b"UIDNEXT" => StatusAttribute::UidNext,
            b"UIDVALIDITY" => StatusAttribute::UidValidity,
            b"UNSEEN" => StatusAttribute::Unseen,
            _ => return Err(NotParseable::Invalid),
        };
        Ok(Progress::Complete(attribute, rest))
    }

    pub fn name(self) -> &'static str {
        match self {
            StatusAttribute::Messages => "MESSAGES",
            StatusAttribute::Recent => "RECENT",
            StatusAttribute::UidNext => "UIDNEXT",
            StatusAttribute::UidValidity => "UIDVALIDITY",
            StatusAttribute::Unseen => "UNSEEN",
        }
    }
}
