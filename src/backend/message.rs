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

//! A small RFC 5322 / MIME reader for the in-memory backend.
//!
//! Messages are parsed once when stored. Parts are recorded as byte ranges
//! into the original message, so sections can be served without
//! re-serialising anything.

use std::ops::Range;
use std::str;

use chrono::prelude::*;
use nom::{
    branch::alt,
    bytes::complete::{is_a, is_not, tag, take, take_while1},
    character::complete::char,
    combinator::{map, opt},
    multi::{
        fold_many0, many0_count, many1, many1_count, separated_nonempty_list,
    },
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

use super::Message;
use crate::imap::fetch::{Section, SectionText};
use crate::imap::response::structure::{Address, BodyStructure, Envelope};

/// Nesting beyond this depth is treated as opaque content.
const MAX_DEPTH: u32 = 20;

// RFC 5322 3.2 lexical elements, reduced to what address lists need.
// Folding has already been undone, but CR and LF are still accepted as
// plain whitespace.

fn fws(i: &[u8]) -> IResult<&[u8], ()> {
    map(is_a(" \t\r\n"), |_| ())(i)
}

fn quoted_pair(i: &[u8]) -> IResult<&[u8], &[u8]> {
    preceded(char('\\'), take(1usize))(i)
}

// Comments nest.
fn comment(i: &[u8]) -> IResult<&[u8], ()> {
    map(
        delimited(
            char('('),
            many0_count(alt((
                map(is_not("()\\"), |_| ()),
                map(quoted_pair, |_| ()),
                comment,
            ))),
            char(')'),
        ),
        |_| (),
    )(i)
}

fn cfws(i: &[u8]) -> IResult<&[u8], ()> {
    map(many0_count(alt((fws, comment))), |_| ())(i)
}

fn is_atext(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || b"!#$%&'*+-/=?^_`{|}~".contains(&b)
        || b >= 0x80
}

fn atom(i: &[u8]) -> IResult<&[u8], &[u8]> {
    delimited(cfws, take_while1(is_atext), cfws)(i)
}

fn quoted_string(i: &[u8]) -> IResult<&[u8], Vec<u8>> {
    delimited(
        pair(cfws, char('"')),
        fold_many0(
            alt((is_not("\\\""), quoted_pair)),
            Vec::new(),
            |mut acc: Vec<u8>, item: &[u8]| {
                acc.extend(
                    item.iter()
                        .copied()
                        .filter(|&b| b'\r' != b && b'\n' != b),
                );
                acc
            },
        ),
        pair(char('"'), cfws),
    )(i)
}

fn word(i: &[u8]) -> IResult<&[u8], Vec<u8>> {
    alt((map(atom, <[u8]>::to_vec), quoted_string))(i)
}

// Includes the obsolete form with bare dots, as in `John Q. Public`.
fn phrase(i: &[u8]) -> IResult<&[u8], String> {
    map(
        many1(alt((
            word,
            map(terminated(tag("."), cfws), <[u8]>::to_vec),
        ))),
        |words| {
            let mut joined = String::new();
            for word in words {
                let word = String::from_utf8_lossy(&word);
                if !joined.is_empty() && "." != word {
                    joined.push(' ');
                }
                joined.push_str(&word);
            }
            joined
        },
    )(i)
}

fn dot_joined(parts: Vec<Vec<u8>>) -> String {
    parts
        .iter()
        .map(|p| String::from_utf8_lossy(p))
        .collect::<Vec<_>>()
        .join(".")
}

fn local_part(i: &[u8]) -> IResult<&[u8], String> {
    map(separated_nonempty_list(char('.'), word), dot_joined)(i)
}

fn domain(i: &[u8]) -> IResult<&[u8], String> {
    alt((
        map(
            separated_nonempty_list(char('.'), map(atom, <[u8]>::to_vec)),
            dot_joined,
        ),
        map(
            delimited(
                pair(cfws, char('[')),
                is_not("[]\\"),
                pair(char(']'), cfws),
            ),
            |literal: &[u8]| format!("[{}]", String::from_utf8_lossy(literal)),
        ),
    ))(i)
}

fn addr_spec(i: &[u8]) -> IResult<&[u8], (String, String)> {
    pair(local_part, preceded(char('@'), domain))(i)
}

// Obsolete source route, `@a,@b:`
fn route(i: &[u8]) -> IResult<&[u8], String> {
    map(
        terminated(
            separated_nonempty_list(
                char(','),
                preceded(pair(cfws, char('@')), domain),
            ),
            char(':'),
        ),
        |domains| {
            domains
                .iter()
                .map(|d| format!("@{}", d))
                .collect::<Vec<_>>()
                .join(",")
        },
    )(i)
}

fn angle_addr(i: &[u8]) -> IResult<&[u8], (Option<String>, (String, String))> {
    delimited(
        pair(cfws, char('<')),
        pair(opt(route), addr_spec),
        pair(char('>'), cfws),
    )(i)
}

fn mailbox(i: &[u8]) -> IResult<&[u8], Address> {
    alt((
        map(
            pair(opt(phrase), angle_addr),
            |(name, (route, (local, host)))| Address {
                name,
                route,
                mailbox: Some(local),
                host: Some(host),
            },
        ),
        map(addr_spec, |(local, host)| Address {
            name: None,
            route: None,
            mailbox: Some(local),
            host: Some(host),
        }),
    ))(i)
}

fn list_delim(i: &[u8]) -> IResult<&[u8], ()> {
    map(many1_count(tuple((cfws, char(','), cfws))), |_| ())(i)
}

fn mailbox_list(i: &[u8]) -> IResult<&[u8], Vec<Address>> {
    delimited(
        opt(list_delim),
        separated_nonempty_list(list_delim, mailbox),
        opt(list_delim),
    )(i)
}

// A group is represented in an envelope by a start marker carrying the
// group name in the mailbox field, its members, and an all-NIL end marker.
fn group(i: &[u8]) -> IResult<&[u8], Vec<Address>> {
    map(
        tuple((
            terminated(phrase, char(':')),
            opt(mailbox_list),
            tuple((cfws, char(';'), cfws)),
        )),
        |(name, members, _)| {
            let mut addresses = vec![Address {
                mailbox: Some(name),
                ..Address::default()
            }];
            addresses.extend(members.unwrap_or_default());
            addresses.push(Address::default());
            addresses
        },
    )(i)
}

fn address_list(i: &[u8]) -> IResult<&[u8], Vec<Vec<Address>>> {
    delimited(
        opt(list_delim),
        separated_nonempty_list(
            list_delim,
            alt((map(mailbox, |m| vec![m]), group)),
        ),
        opt(list_delim),
    )(i)
}

/// Parse an address header, returning nothing if it is malformed.
pub fn parse_addresses(value: &[u8]) -> Vec<Address> {
    match address_list(value) {
        Ok((_, addresses)) => addresses.into_iter().flatten().collect(),
        Err(_) => Vec::new(),
    }
}

/// Split a structured MIME header such as `Content-Type` into its main value
/// and its `; name=value` parameters.
///
/// Parameter names are upper-cased; values are unquoted.
pub fn parse_parameterised(value: &str) -> (String, Vec<(String, String)>) {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut escaped = false;
    for ch in value.chars() {
        if escaped {
            current.push(ch);
            escaped = false;
        } else if quoted && '\\' == ch {
            escaped = true;
        } else if '"' == ch {
            quoted = !quoted;
        } else if !quoted && ';' == ch {
            segments.push(std::mem::replace(&mut current, String::new()));
        } else {
            current.push(ch);
        }
    }
    segments.push(current);

    let mut segments = segments.into_iter();
    let main = segments.next().unwrap_or_default().trim().to_owned();
    let params = segments
        .filter_map(|segment| {
            let eq = segment.find('=')?;
            let name = segment[..eq].trim();
            if name.is_empty() {
                return None;
            }
            Some((
                name.to_ascii_uppercase(),
                segment[eq + 1..].trim().to_owned(),
            ))
        })
        .collect();
    (main, params)
}

#[derive(Clone, Debug)]
struct Field {
    /// Upper-cased.
    name: String,
    /// The raw lines of the field, including the final line ending.
    raw: Range<usize>,
    /// The unfolded value with surrounding whitespace removed.
    value: Vec<u8>,
}

#[derive(Clone, Debug)]
struct Part {
    /// The header block including the blank line terminating it.
    header: Range<usize>,
    body: Range<usize>,
    fields: Vec<Field>,
    media_type: String,
    subtype: String,
    params: Vec<(String, String)>,
    children: Vec<Part>,
    /// For `MESSAGE/RFC822`, the enclosed message.
    message: Option<Box<Part>>,
}

/// A stored message with its MIME structure resolved.
#[derive(Clone, Debug)]
pub struct ParsedMessage {
    raw: Vec<u8>,
    root: Part,
}

fn next_line(raw: &[u8], pos: usize, end: usize) -> usize {
    memchr::memchr(b'\n', &raw[pos..end]).map_or(end, |ix| pos + ix + 1)
}

fn trim_line_ending(mut line: &[u8]) -> &[u8] {
    if line.ends_with(b"\n") {
        line = &line[..line.len() - 1];
    }
    if line.ends_with(b"\r") {
        line = &line[..line.len() - 1];
    }
    line
}

fn parse_part(
    raw: &[u8],
    range: Range<usize>,
    default_type: (&str, &str),
    depth: u32,
) -> Part {
    let mut fields: Vec<Field> = Vec::new();
    let mut pos = range.start;
    let header_end;
    loop {
        if pos >= range.end {
            header_end = range.end;
            break;
        }

        let line_end = next_line(raw, pos, range.end);
        let line = trim_line_ending(&raw[pos..line_end]);
        if line.is_empty() {
            header_end = line_end;
            break;
        }

        if b' ' == line[0] || b'\t' == line[0] {
            if let Some(last) = fields.last_mut() {
                last.raw.end = line_end;
                last.value.push(b' ');
                last.value.extend_from_slice(trim_bytes(line));
                pos = line_end;
                continue;
            }
        }

        match line.iter().position(|&b| b':' == b) {
            Some(colon) if colon > 0 => {
                fields.push(Field {
                    name: String::from_utf8_lossy(trim_bytes(&line[..colon]))
                        .to_ascii_uppercase(),
                    raw: pos..line_end,
                    value: trim_bytes(&line[colon + 1..]).to_vec(),
                });
            }
            // Not a header line; the body starts here
            _ => {
                header_end = pos;
                break;
            }
        }

        pos = line_end;
    }

    let mut part = Part {
        header: range.start..header_end,
        body: header_end..range.end,
        fields,
        media_type: default_type.0.to_owned(),
        subtype: default_type.1.to_owned(),
        params: Vec::new(),
        children: Vec::new(),
        message: None,
    };

    if let Some(content_type) = part.field("CONTENT-TYPE") {
        let (main, params) = parse_parameterised(&content_type);
        let mut split = main.splitn(2, '/');
        if let (Some(media_type), Some(subtype)) = (split.next(), split.next())
        {
            if !media_type.trim().is_empty() && !subtype.trim().is_empty() {
                part.media_type = media_type.trim().to_ascii_uppercase();
                part.subtype = subtype.trim().to_ascii_uppercase();
                part.params = params;
            }
        }
    }

    if "TEXT" == part.media_type
        && !part.params.iter().any(|(name, _)| "CHARSET" == name)
    {
        part.params.push(("CHARSET".to_owned(), "US-ASCII".to_owned()));
    }

    if depth >= MAX_DEPTH {
        return part;
    }

    if "MULTIPART" == part.media_type {
        let child_type = if "DIGEST" == part.subtype {
            ("MESSAGE", "RFC822")
        } else {
            ("TEXT", "PLAIN")
        };
        let boundary = part
            .params
            .iter()
            .find(|(name, _)| "BOUNDARY" == name)
            .map(|(_, value)| value.clone());
        if let Some(boundary) = boundary {
            part.children = split_multipart(raw, part.body.clone(), &boundary)
                .into_iter()
                .map(|range| parse_part(raw, range, child_type, depth + 1))
                .collect();
        }
    } else if "MESSAGE" == part.media_type && "RFC822" == part.subtype {
        part.message = Some(Box::new(parse_part(
            raw,
            part.body.clone(),
            ("TEXT", "PLAIN"),
            depth + 1,
        )));
    }

    part
}

fn trim_bytes(mut s: &[u8]) -> &[u8] {
    while let Some((&first, rest)) = s.split_first() {
        if !first.is_ascii_whitespace() {
            break;
        }
        s = rest;
    }
    while let Some((&last, rest)) = s.split_last() {
        if !last.is_ascii_whitespace() {
            break;
        }
        s = rest;
    }
    s
}

/// Find the ranges of the parts of a multipart body.
///
/// The line ending before each delimiter line belongs to the delimiter.
fn split_multipart(
    raw: &[u8],
    body: Range<usize>,
    boundary: &str,
) -> Vec<Range<usize>> {
    let delimiter = format!("--{}", boundary);
    let delimiter = delimiter.as_bytes();

    let mut parts = Vec::new();
    let mut start: Option<usize> = None;
    let mut pos = body.start;
    while pos < body.end {
        let line_end = next_line(raw, pos, body.end);
        let line = trim_line_ending(&raw[pos..line_end]);
        if line.starts_with(delimiter) {
            let rest = &line[delimiter.len()..];
            let closing = rest.starts_with(b"--");
            if closing || trim_bytes(rest).is_empty() {
                if let Some(start) = start {
                    let mut end = pos;
                    if end > start && b'\n' == raw[end - 1] {
                        end -= 1;
                        if end > start && b'\r' == raw[end - 1] {
                            end -= 1;
                        }
                    }
                    parts.push(start..end);
                }

                if closing {
                    return parts;
                }
                start = Some(line_end);
            }
        }
        pos = line_end;
    }

    if let Some(start) = start {
        parts.push(start..body.end);
    }
    parts
}

fn count_lines(content: &[u8]) -> u64 {
    let newlines = content.iter().filter(|&&b| b'\n' == b).count() as u64;
    if content.last().map_or(false, |&b| b'\n' != b) {
        newlines + 1
    } else {
        newlines
    }
}

impl Part {
    fn field(&self, name: &str) -> Option<String> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| String::from_utf8_lossy(&f.value).into_owned())
    }

    fn addresses(&self, name: &str) -> Vec<Address> {
        self.fields
            .iter()
            .filter(|f| f.name == name)
            .flat_map(|f| parse_addresses(&f.value))
            .collect()
    }

    fn is_multipart(&self) -> bool {
        "MULTIPART" == self.media_type
    }

    fn envelope(&self) -> Envelope {
        let from = self.addresses("FROM");
        let mut sender = self.addresses("SENDER");
        if sender.is_empty() {
            sender = from.clone();
        }
        let mut reply_to = self.addresses("REPLY-TO");
        if reply_to.is_empty() {
            reply_to = from.clone();
        }

        Envelope {
            date: self.field("DATE"),
            subject: self.field("SUBJECT"),
            from,
            sender,
            reply_to,
            to: self.addresses("TO"),
            cc: self.addresses("CC"),
            bcc: self.addresses("BCC"),
            in_reply_to: self.field("IN-REPLY-TO"),
            message_id: self.field("MESSAGE-ID"),
        }
    }

    fn structure(&self, raw: &[u8]) -> BodyStructure {
        let disposition = self
            .field("CONTENT-DISPOSITION")
            .map(|d| parse_parameterised(&d))
            .filter(|(kind, _)| !kind.is_empty())
            .map(|(kind, params)| (kind.to_ascii_uppercase(), params));
        let common = BodyStructure {
            media_type: self.media_type.clone(),
            subtype: self.subtype.clone(),
            params: self.params.clone(),
            disposition,
            language: self.field("CONTENT-LANGUAGE"),
            location: self.field("CONTENT-LOCATION"),
            ..BodyStructure::default()
        };

        if self.is_multipart() {
            return BodyStructure {
                parts: self.children.iter().map(|c| c.structure(raw)).collect(),
                ..common
            };
        }

        let content = &raw[self.body.clone()];
        let lines = if "TEXT" == self.media_type || self.message.is_some() {
            Some(count_lines(content))
        } else {
            None
        };

        BodyStructure {
            id: self.field("CONTENT-ID"),
            description: self.field("CONTENT-DESCRIPTION"),
            encoding: self
                .field("CONTENT-TRANSFER-ENCODING")
                .map(|e| e.to_ascii_uppercase())
                .unwrap_or_else(|| "7BIT".to_owned()),
            size: content.len() as u64,
            lines,
            message: self.message.as_ref().map(|m| {
                Box::new((m.envelope(), m.structure(raw)))
            }),
            ..common
        }
    }

    /// Navigate to subpart `n` (1-based) as IMAP numbers parts.
    ///
    /// Subparts of an encapsulated message are those of the message itself,
    /// and a non-multipart part has only the part `1`, which is itself.
    fn child(&self, n: u32) -> Option<&Part> {
        if self.is_multipart() {
            self.children.get(n.checked_sub(1)? as usize)
        } else if let Some(ref message) = self.message {
            message.child(n)
        } else if 1 == n {
            Some(self)
        } else {
            None
        }
    }

    fn header_fields(
        &self,
        raw: &[u8],
        names: &[String],
        not: bool,
    ) -> Vec<u8> {
        let mut selected = Vec::new();
        for field in &self.fields {
            if names.contains(&field.name) != not {
                selected.extend_from_slice(&raw[field.raw.clone()]);
            }
        }
        selected.extend_from_slice(b"\r\n");
        selected
    }
}

impl ParsedMessage {
    pub fn new(raw: Vec<u8>) -> Self {
        let root = parse_part(&raw, 0..raw.len(), ("TEXT", "PLAIN"), 0);
        ParsedMessage { raw, root }
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// The unfolded value of the first header field called `name`.
    pub fn header(&self, name: &str) -> Option<String> {
        self.root.field(&name.to_ascii_uppercase())
    }

    pub fn header_block(&self) -> &[u8] {
        &self.raw[self.root.header.clone()]
    }

    pub fn text(&self) -> &[u8] {
        &self.raw[self.root.body.clone()]
    }

    /// The date from the `Date` header, in the sender's time zone.
    pub fn sent_date(&self) -> Option<NaiveDate> {
        self.header("Date")
            .and_then(|d| DateTime::parse_from_rfc2822(d.trim()).ok())
            .map(|d| d.naive_local().date())
    }
}

impl Message for ParsedMessage {
    fn size(&self) -> u64 {
        self.raw.len() as u64
    }

    fn envelope(&self) -> Envelope {
        self.root.envelope()
    }

    fn body_structure(&self) -> BodyStructure {
        self.root.structure(&self.raw)
    }

    fn section(&self, section: &Section) -> Option<Vec<u8>> {
        let mut part = &self.root;
        for &n in &section.parts {
            part = part.child(n)?;
        }

        // HEADER, TEXT and HEADER.FIELDS address a message: the whole thing
        // at the top level, otherwise an encapsulated one.
        let message = if section.parts.is_empty() {
            Some(part)
        } else {
            part.message.as_ref().map(|m| &**m)
        };

        match section.text {
            None => Some(
                if section.parts.is_empty() {
                    &self.raw[..]
                } else {
                    &self.raw[part.body.clone()]
                }
                .to_vec(),
            ),
            Some(SectionText::Mime) => {
                if section.parts.is_empty() {
                    None
                } else {
                    Some(self.raw[part.header.clone()].to_vec())
                }
            }
            Some(SectionText::Header) => {
                message.map(|m| self.raw[m.header.clone()].to_vec())
            }
            Some(SectionText::Text) => {
                message.map(|m| self.raw[m.body.clone()].to_vec())
            }
            Some(SectionText::HeaderFields { ref fields, not }) => {
                message.map(|m| m.header_fields(&self.raw, fields, not))
            }
        }
    }
}
