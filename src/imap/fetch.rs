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

//! The data items of FETCH.

use std::io;

use super::lex::{LexWriter, Writeable};
use super::parse::*;
use super::specials::AString;

/// The part of a message named inside `BODY[...]`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Section {
    /// The MIME part path, e.g. `[1, 2]` for `1.2`. Empty for the whole
    /// message.
    pub parts: Vec<u32>,
    pub text: Option<SectionText>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SectionText {
    Header,
    /// `HEADER.FIELDS` (or `HEADER.FIELDS.NOT` if `not`) with the
    /// upper-cased field names.
    HeaderFields { fields: Vec<String>, not: bool },
    Text,
    Mime,
}

impl Section {
    fn parse<'a>(
        buf: ParseBuffer<'a>,
        params: &Params,
    ) -> ParseResult<'a, Section> {
        if !buf.starts_with(b"[") {
            return Err(NotParseable::Invalid);
        }

        let mut buf = buf.advance(1);
        let mut section = Section::default();
        let mut after_dot = false;
        while let Ok((digits, rest)) = buf.take_while1(|b| b.is_ascii_digit())
        {
            let part = parse_decimal::<u32>(digits)
                .filter(|&p| p > 0)
                .ok_or(NotParseable::Invalid)?;
            section.parts.push(part);
            buf = rest;
            after_dot = buf.starts_with(b".");
            if !after_dot {
                break;
            }
            buf = buf.advance(1);
        }

        let (name, rest) = match buf
            .take_while1(|b| b.is_ascii_alphabetic() || b'.' == b)
        {
            Ok((name, rest)) => (name.to_ascii_uppercase(), rest),
            Err(_) if !after_dot => (Vec::new(), buf),
            Err(e) => return Err(e),
        };
        buf = rest;

        section.text = match &name[..] {
            b"" => None,
            b"HEADER" => Some(SectionText::Header),
            b"TEXT" => Some(SectionText::Text),
            b"MIME" if !section.parts.is_empty() => Some(SectionText::Mime),
            b"HEADER.FIELDS" | b"HEADER.FIELDS.NOT" => {
                let not = name.ends_with(b".NOT");
                let (fields, rest) = complete!(parse_list(
                    space(buf)?,
                    params,
                    AString::parse
                ));
                buf = rest;
                Some(SectionText::HeaderFields {
                    fields: fields
                        .into_iter()
                        .map(|f| {
                            String::from_utf8_lossy(f.value())
                                .to_ascii_uppercase()
                        })
                        .collect(),
                    not,
                })
            }
            _ => return Err(NotParseable::Invalid),
        };

        if !buf.starts_with(b"]") {
            return Err(NotParseable::Invalid);
        }

        Ok(Progress::Complete(section, buf.advance(1)))
    }
}

impl Writeable for Section {
    fn write_to(&self, w: &mut LexWriter<'_>) -> io::Result<()> {
        w.verbatim("[")?;
        for (ix, part) in self.parts.iter().enumerate() {
            if ix > 0 {
                w.verbatim(".")?;
            }
            w.number(u64::from(*part))?;
        }
        if let Some(ref text) = self.text {
            if !self.parts.is_empty() {
                w.verbatim(".")?;
            }
            match *text {
                SectionText::Header => w.verbatim("HEADER")?,
                SectionText::Text => w.verbatim("TEXT")?,
                SectionText::Mime => w.verbatim("MIME")?,
                SectionText::HeaderFields { ref fields, not } => {
                    w.verbatim(if not {
                        "HEADER.FIELDS.NOT ("
                    } else {
                        "HEADER.FIELDS ("
                    })?;
                    for (ix, field) in fields.iter().enumerate() {
                        if ix > 0 {
                            w.space()?;
                        }
                        w.astring(field.as_bytes())?;
                    }
                    w.verbatim(")")?;
                }
            }
        }
        w.verbatim("]")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchAttribute {
    Uid,
    Flags,
    InternalDate,
    Envelope,
    /// `BODYSTRUCTURE`, which includes extension data.
    BodyStructure,
    /// `BODY` without a section, the non-extensible body structure.
    Body,
    BodySection {
        /// Whether `\Seen` is left alone.
        peek: bool,
        section: Section,
        /// The `<origin.count>` byte range.
        partial: Option<(u32, u32)>,
    },
    Rfc822,
    Rfc822Header,
    Rfc822Text,
    Rfc822Size,
}

impl FetchAttribute {
    /// Parse the attribute argument of FETCH: a macro name, a single
    /// attribute, or a parenthesised list of attributes.
    pub fn parse_request<'a>(
        buf: ParseBuffer<'a>,
        params: &Params,
    ) -> ParseResult<'a, Vec<FetchAttribute>> {
        let buf = buf.skip_whitespace();
        if buf.starts_with(b"(") {
            return parse_list(buf, params, FetchAttribute::parse);
        }

        if let Ok((name, rest)) = buf.take_while1(is_atom_char) {
            use self::FetchAttribute::*;
            let expanded = match &name.to_ascii_uppercase()[..] {
                b"ALL" => Some(vec![Flags, InternalDate, Rfc822Size, Envelope]),
                b"FAST" => Some(vec![Flags, InternalDate, Rfc822Size]),
                b"FULL" => {
                    Some(vec![Flags, InternalDate, Rfc822Size, Envelope, Body])
                }
                _ => None,
            };
            if let Some(expanded) = expanded {
                return Ok(Progress::Complete(expanded, rest));
            }
        }

        FetchAttribute::parse(buf, params).map(|p| p.map(|a| vec![a]))
    }

    pub fn parse<'a>(
        buf: ParseBuffer<'a>,
        params: &Params,
    ) -> ParseResult<'a, FetchAttribute> {
        let (name, rest) = buf
            .skip_whitespace()
            .take_while1(|b| b.is_ascii_alphanumeric() || b'.' == b)?;
        let name = name.to_ascii_uppercase();

        let peek = match &name[..] {
            b"UID" => return Ok(Progress::Complete(FetchAttribute::Uid, rest)),
            b"FLAGS" => {
                return Ok(Progress::Complete(FetchAttribute::Flags, rest))
            }
            b"INTERNALDATE" => {
                return Ok(Progress::Complete(
                    FetchAttribute::InternalDate,
                    rest,
                ))
            }
            b"ENVELOPE" => {
                return Ok(Progress::Complete(FetchAttribute::Envelope, rest))
            }
            b"BODYSTRUCTURE" => {
                return Ok(Progress::Complete(
                    FetchAttribute::BodyStructure,
                    rest,
                ))
            }
            b"RFC822" => {
                return Ok(Progress::Complete(FetchAttribute::Rfc822, rest))
            }
            b"RFC822.HEADER" => {
                return Ok(Progress::Complete(
                    FetchAttribute::Rfc822Header,
                    rest,
                ))
            }
            b"RFC822.TEXT" => {
                return Ok(Progress::Complete(FetchAttribute::Rfc822Text, rest))
            }
            b"RFC822.SIZE" => {
                return Ok(Progress::Complete(FetchAttribute::Rfc822Size, rest))
            }
            b"BODY" if !rest.starts_with(b"[") => {
                return Ok(Progress::Complete(FetchAttribute::Body, rest))
            }
            b"BODY" => false,
            b"BODY.PEEK" => true,
            _ => return Err(NotParseable::Invalid),
        };

        let (section, rest) = complete!(Section::parse(rest, params));
        let (partial, rest) = parse_partial(rest)?;
        Ok(Progress::Complete(
            FetchAttribute::BodySection {
                peek,
                section,
                partial,
            },
            rest,
        ))
    }

    /// Whether fetching this attribute marks the message `\Seen`.
    pub fn sets_seen(&self) -> bool {
        match *self {
            FetchAttribute::BodySection { peek, .. } => !peek,
            FetchAttribute::Rfc822 | FetchAttribute::Rfc822Text => true,
            _ => false,
        }
    }
}

fn parse_partial(
    buf: ParseBuffer<'_>,
) -> Result<(Option<(u32, u32)>, ParseBuffer<'_>), NotParseable> {
    if !buf.starts_with(b"<") {
        return Ok((None, buf));
    }

    let (origin, rest) = buf.advance(1).take_while1(|b| b.is_ascii_digit())?;
    if !rest.starts_with(b".") {
        return Err(NotParseable::Invalid);
    }
    let (count, rest) = rest.advance(1).take_while1(|b| b.is_ascii_digit())?;
    if !rest.starts_with(b">") {
        return Err(NotParseable::Invalid);
    }

    let origin = parse_decimal(origin).ok_or(NotParseable::Invalid)?;
    let count = parse_decimal(count)
        .filter(|&c: &u32| c > 0)
        .ok_or(NotParseable::Invalid)?;
    Ok((Some((origin, count)), rest.advance(1)))
}

/// Writes the attribute as it appears in a FETCH response, which differs
/// from the request: `BODY.PEEK` is reported as `BODY`, and a partial range
/// only shows its origin.
impl Writeable for FetchAttribute {
    fn write_to(&self, w: &mut LexWriter<'_>) -> io::Result<()> {
        match *self {
            FetchAttribute::Uid => w.verbatim("UID"),
            FetchAttribute::Flags => w.verbatim("FLAGS"),
            FetchAttribute::InternalDate => w.verbatim("INTERNALDATE"),
            FetchAttribute::Envelope => w.verbatim("ENVELOPE"),
            FetchAttribute::BodyStructure => w.verbatim("BODYSTRUCTURE"),
            FetchAttribute::Body => w.verbatim("BODY"),
            FetchAttribute::BodySection {
                ref section,
                partial,
                ..
            } => {
                w.verbatim("BODY")?;
                section.write_to(w)?;
                if let Some((origin, _)) = partial {
                    w.verbatim(&format!("<{}>", origin))?;
                }
                Ok(())
            }
            FetchAttribute::Rfc822 => w.verbatim("RFC822"),
            FetchAttribute::Rfc822Header => w.verbatim("RFC822.HEADER"),
            FetchAttribute::Rfc822Text => w.verbatim("RFC822.TEXT"),
            FetchAttribute::Rfc822Size => w.verbatim("RFC822.SIZE"),
        }
    }
}
