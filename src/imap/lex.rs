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

//! Utilities for *writing* values under IMAP's lexical rules.
//!
//! Parsing is not separable from the grammar and lives with the types being
//! parsed; only the encoding decisions are centralised here.
//!
//! # Encoding decisions
//!
//! Server-generated strings are sent as quoted strings when they are short
//! (under 32 bytes), contain no line breaks and are plain ASCII. Everything
//! else becomes a literal. Empty strings are always `""`, and absent values
//! are `NIL`.
//!
//! Values which may be atoms (mailbox names, mostly) are only sent bare if
//! every character is in `a-zA-Z0-9?=+/_.-` and the value is not `NIL`.

use std::io::{self, Write};

use chrono::prelude::*;

pub struct LexWriter<'w> {
    writer: &'w mut dyn Write,
}

impl<'w> LexWriter<'w> {
    pub fn new(writer: &'w mut dyn Write) -> Self {
        LexWriter { writer }
    }

    pub fn verbatim(&mut self, s: &str) -> io::Result<()> {
        self.writer.write_all(s.as_bytes())
    }

    pub fn verbatim_bytes(&mut self, s: &[u8]) -> io::Result<()> {
        self.writer.write_all(s)
    }

    pub fn space(&mut self) -> io::Result<()> {
        self.verbatim(" ")
    }

    pub fn nil(&mut self) -> io::Result<()> {
        self.verbatim("NIL")
    }

    pub fn number(&mut self, value: u64) -> io::Result<()> {
        write!(self.writer, "{}", value)
    }

    /// Write `value` as a quoted string, escaping `\` and `"`.
    pub fn quoted(&mut self, value: &[u8]) -> io::Result<()> {
        self.verbatim("\"")?;
        let mut start = 0;
        for (ix, &b) in value.iter().enumerate() {
            if b'\\' == b || b'"' == b {
                self.writer.write_all(&value[start..ix])?;
                self.writer.write_all(b"\\")?;
                start = ix;
            }
        }
        self.writer.write_all(&value[start..])?;
        self.verbatim("\"")
    }

    pub fn literal(&mut self, value: &[u8]) -> io::Result<()> {
        write!(self.writer, "{{{}}}\r\n", value.len())?;
        self.writer.write_all(value)
    }

    /// Write a string, choosing between quoted and literal form.
    pub fn string(&mut self, value: &[u8]) -> io::Result<()> {
        if prefers_quoted(value) {
            self.quoted(value)
        } else {
            self.literal(value)
        }
    }

    pub fn nstring(&mut self, value: Option<&[u8]>) -> io::Result<()> {
        match value {
            None => self.nil(),
            Some(value) => self.string(value),
        }
    }

    pub fn astring(&mut self, value: &[u8]) -> io::Result<()> {
        if is_conservative_atom(value) {
            self.verbatim_bytes(value)
        } else {
            self.string(value)
        }
    }

    pub fn date(&mut self, date: &NaiveDate) -> io::Result<()> {
        write!(self.writer, "\"{}\"", date.format("%-d-%b-%Y"))
    }

    pub fn datetime(
        &mut self,
        datetime: &DateTime<FixedOffset>,
    ) -> io::Result<()> {
        write!(
            self.writer,
            "\"{}\"",
            datetime.format("%_d-%b-%Y %H:%M:%S %z")
        )
    }
}

/// Whether the quoted form is used for `value`.
pub fn prefers_quoted(value: &[u8]) -> bool {
    value.len() < 32
        && value.is_ascii()
        && !value.iter().any(|&b| b'\n' == b || b'\r' == b || 0 == b)
}

fn is_conservative_atom(s: &[u8]) -> bool {
    !s.eq_ignore_ascii_case(b"nil")
        && !s.is_empty()
        && s.iter().copied().all(|b| {
            matches!(b,
                     b'a'..=b'z'
                     | b'A'..=b'Z'
                     | b'0'..=b'9'
                     | b'='
                     | b'?'
                     | b'/'
                     | b'+'
                     | b'_'
                     | b'.'
                     | b'-')
        })
}

/// Anything which can be written to the wire.
pub trait Writeable {
    fn write_to(&self, w: &mut LexWriter<'_>) -> io::Result<()>;

    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut w = LexWriter::new(&mut buf);
            // Writing to a Vec cannot fail
            let _ = self.write_to(&mut w);
        }
        buf
    }
}
