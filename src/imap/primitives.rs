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

//! The atomic tokens of IMAP syntax.
//!
//! Every type here parses itself from a `ParseBuffer` (skipping any leading
//! whitespace, which is never part of the token) and writes itself back out
//! through a `LexWriter`.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::io;

use nom::bytes::complete::tag;
use nom::character::complete::digit1;
use nom::combinator::opt;
use nom::sequence::{delimited, pair, tuple};

use super::lex::{prefers_quoted, LexWriter, Writeable};
use super::parse::*;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Nil;

impl Nil {
    pub fn parse<'a>(buf: ParseBuffer<'a>, _: &Params) -> ParseResult<'a, Nil> {
        let (atom, rest) = buf.skip_whitespace().take_while1(is_atom_char)?;
        if atom.eq_ignore_ascii_case(b"NIL") {
            Ok(Progress::Complete(Nil, rest))
        } else {
            Err(NotParseable::Invalid)
        }
    }
}

impl Writeable for Nil {
    fn write_to(&self, w: &mut LexWriter<'_>) -> io::Result<()> {
        w.nil()
    }
}

/// An unsigned number.
///
/// Values up to `u64::MAX` are representable; anything larger fails to
/// parse.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Number(pub u64);

impl Number {
    pub fn parse<'a>(
        buf: ParseBuffer<'a>,
        _: &Params,
    ) -> ParseResult<'a, Number> {
        let (atom, rest) = buf.skip_whitespace().take_while1(is_atom_char)?;
        parse_decimal(atom)
            .map(|n| Progress::Complete(Number(n), rest))
            .ok_or(NotParseable::Invalid)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl PartialEq<u64> for Number {
    fn eq(&self, other: &u64) -> bool {
        self.0 == *other
    }
}

impl PartialOrd<u64> for Number {
    fn partial_cmp(&self, other: &u64) -> Option<Ordering> {
        self.0.partial_cmp(other)
    }
}

impl Writeable for Number {
    fn write_to(&self, w: &mut LexWriter<'_>) -> io::Result<()> {
        w.number(self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Atom(pub Vec<u8>);

impl Atom {
    pub fn parse<'a>(
        buf: ParseBuffer<'a>,
        _: &Params,
    ) -> ParseResult<'a, Atom> {
        let (atom, rest) = buf.skip_whitespace().take_while1(is_atom_char)?;
        Ok(Progress::Complete(Atom(atom.to_vec()), rest))
    }

    pub fn value(&self) -> &[u8] {
        &self.0
    }

    /// The atom upper-cased, as used for keyword matching.
    pub fn upper(&self) -> Vec<u8> {
        self.0.to_ascii_uppercase()
    }
}

impl Writeable for Atom {
    fn write_to(&self, w: &mut LexWriter<'_>) -> io::Result<()> {
        w.verbatim_bytes(&self.0)
    }
}

/// A string delimited by double quotes.
///
/// When parsed, the exact bytes the client sent are retained and written back
/// unchanged. Comparisons only consider the unescaped value.
#[derive(Clone, Debug)]
pub struct QuotedString {
    value: Vec<u8>,
    raw: Option<Vec<u8>>,
}

impl QuotedString {
    pub fn new(value: impl Into<Vec<u8>>) -> Self {
        QuotedString {
            value: value.into(),
            raw: None,
        }
    }

    pub fn parse<'a>(
        buf: ParseBuffer<'a>,
        _: &Params,
    ) -> ParseResult<'a, QuotedString> {
        let buf = buf.skip_whitespace();
        let data = buf.data();
        if !buf.starts_with(b"\"") {
            return Err(NotParseable::Invalid);
        }

        let mut value = Vec::new();
        let mut ix = 1;
        while ix < data.len() {
            match data[ix] {
                b'"' => {
                    return Ok(Progress::Complete(
                        QuotedString {
                            value,
                            raw: Some(data[..=ix].to_vec()),
                        },
                        buf.advance(ix + 1),
                    ));
                }
                b'\\' => match data.get(ix + 1) {
                    Some(&escaped) if b'\\' == escaped || b'"' == escaped => {
                        value.push(escaped);
                        ix += 2;
                    }
                    _ => return Err(NotParseable::Invalid),
                },
                b'\r' | b'\n' => return Err(NotParseable::Invalid),
                b => {
                    value.push(b);
                    ix += 1;
                }
            }
        }

        Err(NotParseable::Invalid)
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn into_value(self) -> Vec<u8> {
        self.value
    }
}

impl PartialEq for QuotedString {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for QuotedString {}

impl Hash for QuotedString {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state)
    }
}

impl Writeable for QuotedString {
    fn write_to(&self, w: &mut LexWriter<'_>) -> io::Result<()> {
        match self.raw {
            Some(ref raw) => w.verbatim_bytes(raw),
            None => w.quoted(&self.value),
        }
    }
}

/// A length-prefixed string.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LiteralString {
    value: Vec<u8>,
}

impl LiteralString {
    pub fn new(value: impl Into<Vec<u8>>) -> Self {
        LiteralString {
            value: value.into(),
        }
    }

    pub fn parse<'a>(
        buf: ParseBuffer<'a>,
        params: &Params,
    ) -> ParseResult<'a, LiteralString> {
        LiteralString::parse_limited(buf, params, None)
    }

    /// Parse a literal, refusing declared lengths above `max_len` before any
    /// continuation is requested.
    ///
    /// The literal header must end the current buffer: the payload is taken
    /// from the first queued continuation. If no continuation is queued, the
    /// parse suspends.
    pub fn parse_limited<'a>(
        buf: ParseBuffer<'a>,
        _: &Params,
        max_len: Option<u64>,
    ) -> ParseResult<'a, LiteralString> {
        let buf = buf.skip_whitespace();
        let header: NomResult<'a, _> = tuple((
            delimited(tag("{"), pair(digit1, opt(tag("+"))), tag("}")),
            opt(tag("\r")),
            tag("\n"),
        ))(buf.data());
        let (after, ((digits, plus), _, _)) =
            header.map_err(|_| NotParseable::Invalid)?;
        if !after.is_empty() {
            return Err(NotParseable::Invalid);
        }

        let length: u64 =
            parse_decimal(digits).ok_or(NotParseable::Invalid)?;
        let literal_plus = plus.is_some();
        if max_len.map_or(false, |max| length > max) {
            return Err(NotParseable::TooBig {
                length,
                literal_plus,
            });
        }

        if buf.continuations().is_empty() {
            return Ok(Progress::Suspended(RequiresContinuation {
                length,
                literal_plus,
            }));
        }

        let (payload, rest) = buf.take_continuation(length)?;
        Ok(Progress::Complete(LiteralString::new(payload), rest))
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn into_value(self) -> Vec<u8> {
        self.value
    }
}

impl Writeable for LiteralString {
    fn write_to(&self, w: &mut LexWriter<'_>) -> io::Result<()> {
        w.literal(&self.value)
    }
}

/// Either form of string.
#[derive(Clone, Debug)]
pub enum ImapString {
    Quoted(QuotedString),
    Literal(LiteralString),
}

impl ImapString {
    pub fn parse<'a>(
        buf: ParseBuffer<'a>,
        params: &Params,
    ) -> ParseResult<'a, ImapString> {
        try_alternative!(QuotedString::parse(buf, params)
            .map(|p| p.map(ImapString::Quoted)));
        LiteralString::parse(buf, params).map(|p| p.map(ImapString::Literal))
    }

    /// Choose the representation of a server-generated value.
    ///
    /// Absent values become `NIL`, empty ones `""`. Short single-line ASCII
    /// text is quoted; anything else, including all non-ASCII text, is sent
    /// as a literal.
    pub fn build(value: Option<&[u8]>) -> Primitive {
        match value {
            None => Primitive::Nil,
            Some(value) if value.is_empty() || prefers_quoted(value) => {
                Primitive::String(ImapString::Quoted(QuotedString::new(value)))
            }
            Some(value) => Primitive::String(ImapString::Literal(
                LiteralString::new(value),
            )),
        }
    }

    pub fn value(&self) -> &[u8] {
        match *self {
            ImapString::Quoted(ref q) => q.value(),
            ImapString::Literal(ref l) => l.value(),
        }
    }

    pub fn into_value(self) -> Vec<u8> {
        match self {
            ImapString::Quoted(q) => q.into_value(),
            ImapString::Literal(l) => l.into_value(),
        }
    }
}

impl PartialEq for ImapString {
    fn eq(&self, other: &Self) -> bool {
        self.value() == other.value()
    }
}

impl Eq for ImapString {}

impl Hash for ImapString {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value().hash(state)
    }
}

impl PartialOrd for ImapString {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ImapString {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value().cmp(other.value())
    }
}

impl Writeable for ImapString {
    fn write_to(&self, w: &mut LexWriter<'_>) -> io::Result<()> {
        match *self {
            ImapString::Quoted(ref q) => q.write_to(w),
            ImapString::Literal(ref l) => l.write_to(w),
        }
    }
}

/// Any single value, as produced by a generic parse.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Primitive {
    Nil,
    Number(Number),
    Atom(Atom),
    String(ImapString),
    List(ListValue),
}

impl Primitive {
    /// Parse whichever of the kinds in `params.expected` matches first.
    ///
    /// Lists and strings are tried before `NIL`, numbers before atoms.
    pub fn parse<'a>(
        buf: ParseBuffer<'a>,
        params: &Params,
    ) -> ParseResult<'a, Primitive> {
        let expected = params.expected;
        if expected.contains(Expected::LIST) {
            try_alternative!(ListValue::parse(buf, params)
                .map(|p| p.map(Primitive::List)));
        }
        if expected.contains(Expected::QUOTED) {
            try_alternative!(QuotedString::parse(buf, params)
                .map(|p| p.map(|q| Primitive::String(ImapString::Quoted(q)))));
        }
        if expected.contains(Expected::LITERAL) {
            try_alternative!(LiteralString::parse(buf, params).map(|p| p
                .map(|l| Primitive::String(ImapString::Literal(l)))));
        }
        if expected.contains(Expected::NIL) {
            try_alternative!(Nil::parse(buf, params)
                .map(|p| p.map(|_| Primitive::Nil)));
        }
        if expected.contains(Expected::NUMBER) {
            try_alternative!(Number::parse(buf, params)
                .map(|p| p.map(Primitive::Number)));
        }
        if expected.contains(Expected::ATOM) {
            try_alternative!(Atom::parse(buf, params)
                .map(|p| p.map(Primitive::Atom)));
        }

        Err(NotParseable::Invalid)
    }
}

impl Writeable for Primitive {
    fn write_to(&self, w: &mut LexWriter<'_>) -> io::Result<()> {
        match *self {
            Primitive::Nil => w.nil(),
            Primitive::Number(ref n) => n.write_to(w),
            Primitive::Atom(ref a) => a.write_to(w),
            Primitive::String(ref s) => s.write_to(w),
            Primitive::List(ref l) => l.write_to(w),
        }
    }
}

/// A parenthesised sequence of values.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListValue {
    items: Vec<Primitive>,
}

impl ListValue {
    pub fn new(items: Vec<Primitive>) -> Self {
        ListValue { items }
    }

    /// A list in canonical (sorted) order.
    pub fn sorted(mut items: Vec<Primitive>) -> Self {
        items.sort();
        ListValue { items }
    }

    /// Parse a list whose items may be any of `params.list_expected`.
    pub fn parse<'a>(
        buf: ParseBuffer<'a>,
        params: &Params,
    ) -> ParseResult<'a, ListValue> {
        let item_params = params.with_expected(params.list_expected);
        parse_list(buf, &item_params, Primitive::parse)
            .map(|p| p.map(ListValue::new))
    }

    pub fn items(&self) -> &[Primitive] {
        &self.items
    }
}

impl Writeable for ListValue {
    fn write_to(&self, w: &mut LexWriter<'_>) -> io::Result<()> {
        w.verbatim("(")?;
        for (ix, item) in self.items.iter().enumerate() {
            if ix > 0 {
                w.space()?;
            }
            item.write_to(w)?;
        }
        w.verbatim(")")
    }
}
