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

//! The shared machinery of the incremental command parser.
//!
//! Parsing works on a `ParseBuffer`, which is the unconsumed part of the
//! current command line plus any literal payloads the transport has already
//! collected for it. Parsers never mutate the buffer; they hand back a new
//! one positioned after whatever they consumed.
//!
//! A parse has two distinct outcomes besides success. When a literal is
//! found whose payload has not been read yet, the parse is *suspended*: it
//! returns `Progress::Suspended` carrying the declared length so the
//! transport can solicit the bytes and try again. Genuine syntax errors are
//! reported through the `Err` channel as `NotParseable`.

use std::str;

use bitflags::bitflags;
use nom::bytes::complete::{tag, take_while, take_while1};
use nom::combinator::opt;
use nom::sequence::tuple;
use thiserror::Error;

pub(crate) type NomResult<'a, T> =
    nom::IResult<&'a [u8], T, (&'a [u8], nom::error::ErrorKind)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseBuffer<'a> {
    data: &'a [u8],
    continuations: &'a [Vec<u8>],
}

impl<'a> ParseBuffer<'a> {
    pub fn new(data: &'a [u8], continuations: &'a [Vec<u8>]) -> Self {
        ParseBuffer {
            data,
            continuations,
        }
    }

    /// A buffer with no queued literal payloads.
    pub fn from_bytes(data: &'a [u8]) -> Self {
        ParseBuffer::new(data, &[])
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn continuations(&self) -> &'a [Vec<u8>] {
        self.continuations
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn starts_with(&self, prefix: &[u8]) -> bool {
        self.data.starts_with(prefix)
    }

    pub fn advance(self, n: usize) -> Self {
        ParseBuffer {
            data: &self.data[n..],
            continuations: self.continuations,
        }
    }

    /// Continue with `rest`, which must be a suffix of the current data.
    pub fn rest(self, rest: &'a [u8]) -> Self {
        ParseBuffer {
            data: rest,
            continuations: self.continuations,
        }
    }

    pub fn whitespace_len(&self) -> usize {
        self.data
            .iter()
            .take_while(|&&b| is_whitespace(b))
            .count()
    }

    pub fn skip_whitespace(self) -> Self {
        let n = self.whitespace_len();
        self.advance(n)
    }

    /// Take the payload of a literal of `length` bytes from the first queued
    /// continuation. Parsing resumes with whatever follows the payload in that
    /// continuation.
    pub fn take_continuation(
        self,
        length: u64,
    ) -> Result<(&'a [u8], ParseBuffer<'a>), NotParseable> {
        let first = self
            .continuations
            .first()
            .ok_or(NotParseable::Invalid)?;
        if (first.len() as u64) < length {
            return Err(NotParseable::Invalid);
        }

        let length = length as usize;
        Ok((
            &first[..length],
            ParseBuffer {
                data: &first[length..],
                continuations: &self.continuations[1..],
            },
        ))
    }

    /// Split off the maximal non-empty run of bytes matching `pred`.
    ///
    /// Leading whitespace is *not* skipped.
    pub fn take_while1(
        self,
        pred: impl Fn(u8) -> bool,
    ) -> Result<(&'a [u8], ParseBuffer<'a>), NotParseable> {
        let r: NomResult<'a, &'a [u8]> = take_while1(pred)(self.data);
        let (rest, taken) = r.map_err(|_| NotParseable::Invalid)?;
        Ok((taken, self.rest(rest)))
    }
}

/// Signals that a literal's payload must be read before parsing can go on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequiresContinuation {
    /// The declared length of the literal.
    pub length: u64,
    /// Whether the client used `{n+}`, in which case it sends the payload
    /// without waiting for a continuation request.
    pub literal_plus: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Progress<'a, T> {
    Complete(T, ParseBuffer<'a>),
    Suspended(RequiresContinuation),
}

impl<'a, T> Progress<'a, T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Progress<'a, U> {
        match self {
            Progress::Complete(value, rest) => {
                Progress::Complete(f(value), rest)
            }
            Progress::Suspended(req) => Progress::Suspended(req),
        }
    }

    #[cfg(test)]
    pub fn unwrap_complete(self) -> (T, ParseBuffer<'a>) {
        match self {
            Progress::Complete(value, rest) => (value, rest),
            Progress::Suspended(req) => {
                panic!("Parse unexpectedly suspended: {:?}", req)
            }
        }
    }
}

pub type ParseResult<'a, T> = Result<Progress<'a, T>, NotParseable>;

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum NotParseable {
    #[error("Unparseable input")]
    Invalid,
    #[error("Unknown command {}", String::from_utf8_lossy(.0))]
    CommandNotFound(Vec<u8>),
    #[error("Invalid arguments to {}", String::from_utf8_lossy(.0))]
    BadCommand(Vec<u8>),
    #[error("Unsupported charset {0}")]
    BadCharset(String),
    #[error("Literal of {length} bytes exceeds the size limit")]
    TooBig { length: u64, literal_plus: bool },
}

/// Unwrap a completed parse, or return the suspension to the caller.
macro_rules! complete {
    ($e:expr) => {
        match $e? {
            $crate::imap::parse::Progress::Complete(value, rest) => {
                (value, rest)
            }
            $crate::imap::parse::Progress::Suspended(req) => {
                return Ok($crate::imap::parse::Progress::Suspended(req));
            }
        }
    };
}

/// Return the result of `$e` unless it is a plain syntax mismatch, in which
/// case evaluation continues with the next alternative.
macro_rules! try_alternative {
    ($e:expr) => {
        match $e {
            Err($crate::imap::parse::NotParseable::Invalid) => (),
            other => return other,
        }
    };
}

bitflags! {
    /// The value kinds a generic primitive parse may produce.
    pub struct Expected: u8 {
        const NIL = 0b0000_0001;
        const NUMBER = 0b0000_0010;
        const ATOM = 0b0000_0100;
        const QUOTED = 0b0000_1000;
        const LITERAL = 0b0001_0000;
        const LIST = 0b0010_0000;
        const STRING = Self::QUOTED.bits | Self::LITERAL.bits;
        const ANY = Self::NIL.bits
            | Self::NUMBER.bits
            | Self::ATOM.bits
            | Self::STRING.bits
            | Self::LIST.bits;
    }
}

/// Context passed down the recursive descent.
#[derive(Clone, Debug)]
pub struct Params {
    /// Kinds accepted by a generic primitive parse.
    pub expected: Expected,
    /// Kinds accepted for the items of a generic list.
    pub list_expected: Expected,
    /// Whether sequence sets refer to UIDs.
    pub uid: bool,
    /// The charset declared by SEARCH.
    pub charset: Option<String>,
    /// The largest APPEND literal to accept.
    pub max_append_len: Option<u64>,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            expected: Expected::ANY,
            list_expected: Expected::ANY,
            uid: false,
            charset: None,
            max_append_len: None,
        }
    }
}

impl Params {
    pub fn with_expected(&self, expected: Expected) -> Self {
        Params {
            expected,
            ..self.clone()
        }
    }

    pub fn with_list_expected(&self, list_expected: Expected) -> Self {
        Params {
            list_expected,
            ..self.clone()
        }
    }

    pub fn with_uid(&self, uid: bool) -> Self {
        Params {
            uid,
            ..self.clone()
        }
    }

    pub fn with_charset(&self, charset: Option<String>) -> Self {
        Params {
            charset,
            ..self.clone()
        }
    }
}

pub fn is_whitespace(b: u8) -> bool {
    b' ' == b || b'\t' == b
}

pub fn is_atom_char(b: u8) -> bool {
    match b {
        0..=b' ' | 127..=255 => false,
        b'(' | b')' | b'{' | b'%' | b'*' | b'"' | b'\\' | b']' => false,
        _ => true,
    }
}

pub fn is_astring_char(b: u8) -> bool {
    b']' == b || is_atom_char(b)
}

pub fn is_list_char(b: u8) -> bool {
    b'%' == b || b'*' == b || is_astring_char(b)
}

pub fn is_tag_char(b: u8) -> bool {
    b'+' != b && is_astring_char(b)
}

/// Require at least one whitespace character.
pub fn space(buf: ParseBuffer<'_>) -> Result<ParseBuffer<'_>, NotParseable> {
    buf.take_while1(is_whitespace).map(|(_, rest)| rest)
}

/// Match optional whitespace followed by the line ending.
pub fn end_line(
    buf: ParseBuffer<'_>,
) -> Result<ParseBuffer<'_>, NotParseable> {
    let r: NomResult<'_, _> =
        tuple((take_while(is_whitespace), opt(tag("\r")), tag("\n")))(
            buf.data(),
        );
    r.map(|(rest, _)| buf.rest(rest))
        .map_err(|_| NotParseable::Invalid)
}

/// Whether only whitespace remains before the end of the line.
pub fn at_end_line(buf: ParseBuffer<'_>) -> bool {
    end_line(buf).is_ok()
}

/// Parse a parenthesised list whose items are parsed by `item`.
///
/// Items are separated by whitespace; spaces before the closing parenthesis
/// are permitted and the empty list is valid.
pub fn parse_list<'a, T>(
    buf: ParseBuffer<'a>,
    params: &Params,
    mut item: impl FnMut(ParseBuffer<'a>, &Params) -> ParseResult<'a, T>,
) -> ParseResult<'a, Vec<T>> {
    let buf = buf.skip_whitespace();
    if !buf.starts_with(b"(") {
        return Err(NotParseable::Invalid);
    }

    let mut buf = buf.advance(1);
    let mut items = Vec::new();
    loop {
        let end = buf.advance(
            buf.data().iter().take_while(|&&b| b' ' == b).count(),
        );
        if end.starts_with(b")") {
            return Ok(Progress::Complete(items, end.advance(1)));
        }

        if !items.is_empty() && 0 == buf.whitespace_len() {
            return Err(NotParseable::Invalid);
        }

        let (value, rest) = complete!(item(buf, params));
        items.push(value);
        buf = rest;
    }
}

/// Parse a run of decimal digits as an unsigned integer.
pub fn parse_decimal<T: str::FromStr>(digits: &[u8]) -> Option<T> {
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }

    str::from_utf8(digits).ok().and_then(|s| s.parse().ok())
}
