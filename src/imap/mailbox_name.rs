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

//! Mailbox names and their wire encoding.
//!
//! Names are held as UTF-8. On the wire they use the "modified UTF-7" of RFC
//! 3501 section 5.1.3: printable ASCII stands for itself, `&` is written
//! `&-`, and any other run of characters is written as `&`, the modified
//! base64 of its UTF-16BE form, then `-`.

use std::fmt;
use std::io;

use super::lex::{LexWriter, Writeable};
use super::parse::*;
use super::specials::AString;

/// The hierarchy delimiter used by every mailbox.
pub const DELIMITER: char = '.';

/// The name of a mailbox, decoded to UTF-8.
///
/// `INBOX` is case-insensitive and is always normalised to upper case.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MailboxName(String);

impl MailboxName {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        if name.eq_ignore_ascii_case("INBOX") {
            MailboxName("INBOX".to_owned())
        } else {
            MailboxName(name)
        }
    }

    pub fn parse<'a>(
        buf: ParseBuffer<'a>,
        params: &Params,
    ) -> ParseResult<'a, MailboxName> {
        let (raw, rest) = complete!(AString::parse(buf, params));
        Ok(Progress::Complete(
            MailboxName::new(decode(&String::from_utf8_lossy(raw.value()))),
            rest,
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_inbox(&self) -> bool {
        "INBOX" == self.0
    }

    /// The parent of this name in the hierarchy, if any.
    pub fn parent(&self) -> Option<&str> {
        self.0.rfind(DELIMITER).map(|ix| &self.0[..ix])
    }
}

impl fmt::Display for MailboxName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Writeable for MailboxName {
    fn write_to(&self, w: &mut LexWriter<'_>) -> io::Result<()> {
        w.astring(encode(&self.0).as_bytes())
    }
}

/// Decode a modified UTF-7 string.
///
/// Decoding is lenient: a shift sequence that is not valid base64, or lacks
/// its terminating `-`, is passed through unchanged.
pub fn decode(s: &str) -> String {
    let mut decoded = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(start) = rest.find('&') {
        decoded.push_str(&rest[..start]);
        let shifted = &rest[start + 1..];
        let end = match shifted.find('-') {
            Some(end) => end,
            None => {
                decoded.push_str(&rest[start..]);
                return decoded;
            }
        };

        if 0 == end {
            decoded.push('&');
        } else {
            match decode_utf16(&shifted[..end]) {
                Some(text) => decoded.push_str(&text),
                None => decoded.push_str(&rest[start..=start + 1 + end]),
            }
        }
        rest = &shifted[end + 1..];
    }

    decoded.push_str(rest);
    decoded
}

fn decode_utf16(encoded: &str) -> Option<String> {
    let bytes = base64::decode_config(
        encoded,
        base64::IMAP_MUTF7.decode_allow_trailing_bits(true),
    )
    .ok()?;
    if 0 != bytes.len() % 2 {
        return None;
    }

    let units = bytes
        .chunks(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect::<Vec<_>>();
    String::from_utf16(&units).ok()
}

/// Encode a UTF-8 string as modified UTF-7.
pub fn encode(s: &str) -> String {
    let mut encoded = String::with_capacity(s.len());
    let mut pending = Vec::<u8>::new();

    for ch in s.chars() {
        if (' '..='~').contains(&ch) {
            flush_shifted(&mut encoded, &mut pending);
            if '&' == ch {
                encoded.push_str("&-");
            } else {
                encoded.push(ch);
            }
        } else {
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                pending.extend_from_slice(&unit.to_be_bytes());
            }
        }
    }

    flush_shifted(&mut encoded, &mut pending);
    encoded
}

fn flush_shifted(encoded: &mut String, pending: &mut Vec<u8>) {
    if pending.is_empty() {
        return;
    }

    encoded.push('&');
    encoded.push_str(&base64::encode_config(&pending, base64::IMAP_MUTF7));
    encoded.push('-');
    pending.clear();
}
