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

//! Evaluation of SEARCH keys against stored messages.

use chrono::prelude::*;

use super::message::ParsedMessage;
use crate::imap::search::SearchKey;
use crate::imap::specials::Flag;
use crate::support::error::Error;

/// One message being tested against a search.
pub struct Candidate<'a> {
    pub seq: u32,
    pub uid: u32,
    /// The session's view of the flags, `\Recent` included.
    pub flags: &'a [Flag],
    pub internal_date: DateTime<FixedOffset>,
    pub message: &'a ParsedMessage,
    /// The values of `*` for sequence sets and UID sets respectively.
    pub max_seq: u32,
    pub max_uid: u32,
}

/// Fail with `SearchNotAllowed` if any key, however deeply nested, is one of
/// `disabled`.
pub fn check_allowed(
    keys: &[SearchKey],
    disabled: &[String],
) -> Result<(), Error> {
    let mut refused = None;
    for key in keys {
        key.visit(&mut |k| {
            if refused.is_none()
                && disabled.iter().any(|d| d.eq_ignore_ascii_case(k.name()))
            {
                refused = Some(k.name());
            }
        });
    }

    match refused {
        Some(name) => Err(Error::SearchNotAllowed(name.to_owned())),
        None => Ok(()),
    }
}

fn contains_ignore_case(haystack: &[u8], needle: &str) -> bool {
    let needle = needle.as_bytes().to_ascii_lowercase();
    if needle.is_empty() {
        return true;
    }

    haystack
        .to_ascii_lowercase()
        .windows(needle.len())
        .any(|w| w == &needle[..])
}

fn header_contains(message: &ParsedMessage, name: &str, text: &str) -> bool {
    message
        .header(name)
        .map_or(false, |value| contains_ignore_case(value.as_bytes(), text))
}

/// Whether `candidate` satisfies `key`.
pub fn matches(key: &SearchKey, c: &Candidate<'_>) -> bool {
    let has = |flag: Flag| c.flags.contains(&flag);
    let internal = c.internal_date.naive_local().date();
    let sent = || c.message.sent_date();

    match *key {
        SearchKey::All => true,
        SearchKey::Answered => has(Flag::Answered),
        SearchKey::Deleted => has(Flag::Deleted),
        SearchKey::Draft => has(Flag::Draft),
        SearchKey::Flagged => has(Flag::Flagged),
        SearchKey::New => has(Flag::Recent) && !has(Flag::Seen),
        SearchKey::Old => !has(Flag::Recent),
        SearchKey::Recent => has(Flag::Recent),
        SearchKey::Seen => has(Flag::Seen),
        SearchKey::Unanswered => !has(Flag::Answered),
        SearchKey::Undeleted => !has(Flag::Deleted),
        SearchKey::Undraft => !has(Flag::Draft),
        SearchKey::Unflagged => !has(Flag::Flagged),
        SearchKey::Unseen => !has(Flag::Seen),
        SearchKey::Keyword(ref flag) => c.flags.contains(flag),
        SearchKey::Unkeyword(ref flag) => !c.flags.contains(flag),
        SearchKey::Bcc(ref text) => header_contains(c.message, "Bcc", text),
        SearchKey::Cc(ref text) => header_contains(c.message, "Cc", text),
        SearchKey::From(ref text) => header_contains(c.message, "From", text),
        SearchKey::Subject(ref text) => {
            header_contains(c.message, "Subject", text)
        }
        SearchKey::To(ref text) => header_contains(c.message, "To", text),
        SearchKey::Header(ref name, ref text) => {
            header_contains(c.message, name, text)
        }
        SearchKey::Body(ref text) => {
            contains_ignore_case(c.message.text(), text)
        }
        SearchKey::Text(ref text) => {
            contains_ignore_case(c.message.raw(), text)
        }
        SearchKey::Before(date) => internal < date,
        SearchKey::On(date) => internal == date,
        SearchKey::Since(date) => internal >= date,
        SearchKey::SentBefore(date) => sent().map_or(false, |d| d < date),
        SearchKey::SentOn(date) => sent().map_or(false, |d| d == date),
        SearchKey::SentSince(date) => sent().map_or(false, |d| d >= date),
        SearchKey::Larger(size) => c.message.raw().len() as u64 > size,
        SearchKey::Smaller(size) => (c.message.raw().len() as u64) < size,
        SearchKey::Uid(ref set) => set.contains(c.uid, c.max_uid),
        SearchKey::SequenceSet(ref set) => set.contains(c.seq, c.max_seq),
        SearchKey::Not(ref key) => !matches(key, c),
        SearchKey::Or(ref a, ref b) => matches(a, c) || matches(b, c),
        SearchKey::Group(ref keys) => keys.iter().all(|k| matches(k, c)),
    }
}
