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

//! The search criteria of SEARCH.

use chrono::NaiveDate;
use encoding_rs::Encoding;

use super::parse::*;
use super::primitives::{Atom, Number};
use super::specials::{parse_date, AString, Flag, SequenceSet};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchKey {
    All,
    Answered,
    Deleted,
    Draft,
    Flagged,
    New,
    Old,
    Recent,
    Seen,
    Unanswered,
    Undeleted,
    Undraft,
    Unflagged,
    Unseen,
    Keyword(Flag),
    Unkeyword(Flag),
    Bcc(String),
    Body(String),
    Cc(String),
    From(String),
    Subject(String),
    Text(String),
    To(String),
    /// A header field name (upper-cased) and the text to look for in it.
    Header(String, String),
    Before(NaiveDate),
    On(NaiveDate),
    Since(NaiveDate),
    SentBefore(NaiveDate),
    SentOn(NaiveDate),
    SentSince(NaiveDate),
    Larger(u64),
    Smaller(u64),
    Uid(SequenceSet),
    SequenceSet(SequenceSet),
    Not(Box<SearchKey>),
    Or(Box<SearchKey>, Box<SearchKey>),
    Group(Vec<SearchKey>),
}

impl SearchKey {
    /// Look up the decoder for a `CHARSET` argument.
    ///
    /// An unknown charset fails with `BadCharset`.
    pub fn check_charset(charset: &str) -> Result<(), NotParseable> {
        Encoding::for_label(charset.as_bytes())
            .map(|_| ())
            .ok_or_else(|| NotParseable::BadCharset(charset.to_owned()))
    }

    pub fn parse<'a>(
        buf: ParseBuffer<'a>,
        params: &Params,
    ) -> ParseResult<'a, SearchKey> {
        let buf = buf.skip_whitespace();
        if buf.starts_with(b"(") {
            return parse_list(buf, params, SearchKey::parse)
                .map(|p| p.map(SearchKey::Group));
        }

        if buf.starts_with(b"*")
            || buf.data().first().map_or(false, u8::is_ascii_digit)
        {
            return SequenceSet::parse(buf, &params.with_uid(false))
                .map(|p| p.map(SearchKey::SequenceSet));
        }

        let (atom, buf) = complete!(Atom::parse(buf, params));
        let key = match &atom.upper()[..] {
            b"ALL" => SearchKey::All,
            b"ANSWERED" => SearchKey::Answered,
            b"DELETED" => SearchKey::Deleted,
            b"DRAFT" => SearchKey::Draft,
            b"FLAGGED" => SearchKey::Flagged,
            b"NEW" => SearchKey::New,
            b"OLD" => SearchKey::Old,
            b"RECENT" => SearchKey::Recent,
            b"SEEN" => SearchKey::Seen,
            b"UNANSWERED" => SearchKey::Unanswered,
            b"UNDELETED" => SearchKey::Undeleted,
            b"UNDRAFT" => SearchKey::Undraft,
            b"UNFLAGGED" => SearchKey::Unflagged,
            b"UNSEEN" => SearchKey::Unseen,
            b"KEYWORD" => {
                let (flag, rest) = complete!(Flag::parse(space(buf)?, params));
                return Ok(Progress::Complete(SearchKey::Keyword(flag), rest));
            }
            b"UNKEYWORD" => {
                let (flag, rest) = complete!(Flag::parse(space(buf)?, params));
                return Ok(Progress::Complete(
                    SearchKey::Unkeyword(flag),
                    rest,
                ));
            }
            b"BCC" => return parse_text(buf, params, SearchKey::Bcc),
            b"BODY" => return parse_text(buf, params, SearchKey::Body),
            b"CC" => return parse_text(buf, params, SearchKey::Cc),
            b"FROM" => return parse_text(buf, params, SearchKey::From),
            b"SUBJECT" => return parse_text(buf, params, SearchKey::Subject),
            b"TEXT" => return parse_text(buf, params, SearchKey::Text),
            b"TO" => return parse_text(buf, params, SearchKey::To),
            b"HEADER" => {
                let (name, rest) =
                    complete!(AString::parse(space(buf)?, params));
                let name =
                    String::from_utf8_lossy(name.value()).to_ascii_uppercase();
                return parse_text(rest, params, |value| {
                    SearchKey::Header(name, value)
                });
            }
            b"BEFORE" => return parse_when(buf, params, SearchKey::Before),
            b"ON" => return parse_when(buf, params, SearchKey::On),
            b"SINCE" => return parse_when(buf, params, SearchKey::Since),
            b"SENTBEFORE" => {
                return parse_when(buf, params, SearchKey::SentBefore)
            }
            b"SENTON" => return parse_when(buf, params, SearchKey::SentOn),
            b"SENTSINCE" => {
                return parse_when(buf, params, SearchKey::SentSince)
            }
            b"LARGER" => {
                let (n, rest) = complete!(Number::parse(space(buf)?, params));
                return Ok(Progress::Complete(SearchKey::Larger(n.0), rest));
            }
            b"SMALLER" => {
                let (n, rest) = complete!(Number::parse(space(buf)?, params));
                return Ok(Progress::Complete(SearchKey::Smaller(n.0), rest));
            }
            b"UID" => {
                let (set, rest) = complete!(SequenceSet::parse(
                    space(buf)?,
                    &params.with_uid(true)
                ));
                return Ok(Progress::Complete(SearchKey::Uid(set), rest));
            }
            b"NOT" => {
                let (key, rest) =
                    complete!(SearchKey::parse(space(buf)?, params));
                return Ok(Progress::Complete(
                    SearchKey::Not(Box::new(key)),
                    rest,
                ));
            }
            b"OR" => {
                let (a, rest) =
                    complete!(SearchKey::parse(space(buf)?, params));
                let (b, rest) =
                    complete!(SearchKey::parse(space(rest)?, params));
                return Ok(Progress::Complete(
                    SearchKey::Or(Box::new(a), Box::new(b)),
                    rest,
                ));
            }
            _ => return Err(NotParseable::Invalid),
        };

        Ok(Progress::Complete(key, buf))
    }

    /// The keyword which introduces this key, as used in configuration to
    /// disable keys.
    pub fn name(&self) -> &'static str {
        match *self {
            SearchKey::All => "ALL",
            SearchKey::Answered => "ANSWERED",
            SearchKey::Deleted => "DELETED",
            SearchKey::Draft => "DRAFT",
            SearchKey::Flagged => "FLAGGED",
            SearchKey::New => "NEW",
            SearchKey::Old => "OLD",
            SearchKey::Recent => "RECENT",
            SearchKey::Seen => "SEEN",
            SearchKey::Unanswered => "UNANSWERED",
            SearchKey::Undeleted => "UNDELETED",
            SearchKey::Undraft => "UNDRAFT",
            SearchKey::Unflagged => "UNFLAGGED",
            SearchKey::Unseen => "UNSEEN",
            SearchKey::Keyword(_) => "KEYWORD",
            SearchKey::Unkeyword(_) => "UNKEYWORD",
            SearchKey::Bcc(_) => "BCC",
            SearchKey::Body(_) => "BODY",
            SearchKey::Cc(_) => "CC",
            SearchKey::From(_) => "FROM",
            SearchKey::Subject(_) => "SUBJECT",
            SearchKey::Text(_) => "TEXT",
            SearchKey::To(_) => "TO",
            SearchKey::Header(..) => "HEADER",
            SearchKey::Before(_) => "BEFORE",
            SearchKey::On(_) => "ON",
            SearchKey::Since(_) => "SINCE",
            SearchKey::SentBefore(_) => "SENTBEFORE",
            SearchKey::SentOn(_) => "SENTON",
            SearchKey::SentSince(_) => "SENTSINCE",
            SearchKey::Larger(_) => "LARGER",
            SearchKey::Smaller(_) => "SMALLER",
            SearchKey::Uid(_) => "UID",
            SearchKey::SequenceSet(_) => "SEQSET",
            SearchKey::Not(_) => "NOT",
            SearchKey::Or(..) => "OR",
            SearchKey::Group(_) => "GROUP",
        }
    }

    /// Call `f` on this key and every key nested within it.
    pub fn visit<'k>(&'k self, f: &mut impl FnMut(&'k SearchKey)) {
        f(self);
        match *self {
            SearchKey::Not(ref key) => key.visit(f),
            SearchKey::Or(ref a, ref b) => {
                a.visit(f);
                b.visit(f);
            }
            SearchKey::Group(ref keys) => {
                for key in keys {
                    key.visit(f);
                }
            }
            _ => (),
        }
    }
}

/// Parse a string argument, decoding it from the declared charset.
fn parse_text<'a>(
    buf: ParseBuffer<'a>,
    params: &Params,
    make: impl FnOnce(String) -> SearchKey,
) -> ParseResult<'a, SearchKey> {
    let (value, rest) = complete!(AString::parse(space(buf)?, params));
    let text = match params
        .charset
        .as_ref()
        .and_then(|charset| Encoding::for_label(charset.as_bytes()))
    {
        Some(encoding) => encoding.decode_without_bom_handling(value.value()).0,
        None => String::from_utf8_lossy(value.value()),
    };
    Ok(Progress::Complete(make(text.into_owned()), rest))
}

fn parse_when<'a>(
    buf: ParseBuffer<'a>,
    params: &Params,
    make: impl FnOnce(NaiveDate) -> SearchKey,
) -> ParseResult<'a, SearchKey> {
    let (date, rest) = complete!(parse_date(space(buf)?, params));
    Ok(Progress::Complete(make(date), rest))
}
