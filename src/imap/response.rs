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

//! The server's responses.
//!
//! A `Response` is the tagged completion of one command together with the
//! untagged responses sent before it. Untagged data carrying a merge key
//! (counts and per-message FETCH data) replaces earlier data with the same
//! key instead of being repeated, so a handler can add updates freely and
//! the client still sees each message at most once.
//!
//! Serialisation is cached; anything that changes the response discards the
//! cached bytes.

use std::collections::HashMap;
use std::io::{self, Write};

use super::command::Tag;
use super::lex::{LexWriter, Writeable};

pub mod code;
pub mod specials;
pub mod structure;

pub use self::code::ResponseCode;
pub use self::specials::{
    FetchResponse, FetchValue, ListEntry, MergeKey, Special,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Condition {
    Ok,
    No,
    Bad,
    Bye,
    PreAuth,
}

impl Condition {
    fn name(self) -> &'static str {
        match self {
            Condition::Ok => "OK",
            Condition::No => "NO",
            Condition::Bad => "BAD",
            Condition::Bye => "BYE",
            Condition::PreAuth => "PREAUTH",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Kind {
    Condition {
        condition: Condition,
        code: Option<ResponseCode>,
        text: Vec<u8>,
    },
    Data(Special),
    Continuation(Vec<u8>),
}

#[derive(Clone, Debug)]
pub struct Response {
    tag: Tag,
    kind: Kind,
    untagged: Vec<Response>,
    merge_index: HashMap<MergeKey, usize>,
    raw: Option<Vec<u8>>,
}

impl Response {
    fn new(tag: Tag, kind: Kind) -> Self {
        Response {
            tag,
            kind,
            untagged: Vec::new(),
            merge_index: HashMap::new(),
            raw: None,
        }
    }

    fn condition(
        tag: Tag,
        condition: Condition,
        text: impl Into<Vec<u8>>,
        code: Option<ResponseCode>,
    ) -> Self {
        Response::new(
            tag,
            Kind::Condition {
                condition,
                code,
                text: text.into(),
            },
        )
    }

    pub fn ok(
        tag: Tag,
        text: impl Into<Vec<u8>>,
        code: Option<ResponseCode>,
    ) -> Self {
        Response::condition(tag, Condition::Ok, text, code)
    }

    pub fn no(
        tag: Tag,
        text: impl Into<Vec<u8>>,
        code: Option<ResponseCode>,
    ) -> Self {
        Response::condition(tag, Condition::No, text, code)
    }

    pub fn bad(
        tag: Tag,
        text: impl Into<Vec<u8>>,
        code: Option<ResponseCode>,
    ) -> Self {
        Response::condition(tag, Condition::Bad, text, code)
    }

    /// An untagged BYE.
    pub fn bye(text: impl Into<Vec<u8>>, code: Option<ResponseCode>) -> Self {
        Response::condition(Tag::untagged(), Condition::Bye, text, code)
    }

    /// An untagged PREAUTH greeting.
    pub fn preauth(
        text: impl Into<Vec<u8>>,
        code: Option<ResponseCode>,
    ) -> Self {
        Response::condition(Tag::untagged(), Condition::PreAuth, text, code)
    }

    /// An untagged OK.
    pub fn untagged_ok(
        text: impl Into<Vec<u8>>,
        code: Option<ResponseCode>,
    ) -> Self {
        Response::ok(Tag::untagged(), text, code)
    }

    /// An untagged data response.
    pub fn special(data: Special) -> Self {
        Response::new(Tag::untagged(), Kind::Data(data))
    }

    /// A `+` continuation request.
    pub fn continuation(text: impl Into<Vec<u8>>) -> Self {
        Response::new(Tag::continuation(), Kind::Continuation(text.into()))
    }

    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    pub fn code(&self) -> Option<&ResponseCode> {
        match self.kind {
            Kind::Condition { ref code, .. } => code.as_ref(),
            _ => None,
        }
    }

    /// Replace the code of a status response.
    pub fn set_code(&mut self, new_code: Option<ResponseCode>) {
        if let Kind::Condition { ref mut code, .. } = self.kind {
            *code = new_code;
            self.raw = None;
        }
    }

    pub fn data(&self) -> Option<&Special> {
        match self.kind {
            Kind::Data(ref data) => Some(data),
            _ => None,
        }
    }

    /// Add an untagged response to be sent before this one.
    ///
    /// Data with a merge key is folded into any earlier data with the same
    /// key, keeping the earlier position.
    pub fn add_untagged(&mut self, response: Response) {
        self.raw = None;

        let key = response.data().and_then(Special::merge_key);
        if let Some(key) = key {
            if let Some(&ix) = self.merge_index.get(&key) {
                let existing = &mut self.untagged[ix];
                existing.raw = None;
                if let (Kind::Data(ref mut old), Kind::Data(new)) =
                    (&mut existing.kind, response.kind)
                {
                    old.merge(new);
                }
                return;
            }

            self.merge_index.insert(key, self.untagged.len());
        }

        self.untagged.push(response);
    }

    pub fn add_untagged_ok(
        &mut self,
        text: impl Into<Vec<u8>>,
        code: Option<ResponseCode>,
    ) {
        self.add_untagged(Response::untagged_ok(text, code));
    }

    pub fn untagged(&self) -> &[Response] {
        &self.untagged
    }

    /// The line after the tag, e.g. `OK [READ-ONLY] Selected mailbox.`
    pub fn text(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut w = LexWriter::new(&mut buf);
            // Writing to a Vec cannot fail
            let _ = self.write_text(&mut w);
        }
        buf
    }

    fn write_text(&self, w: &mut LexWriter<'_>) -> io::Result<()> {
        match self.kind {
            Kind::Condition {
                condition,
                ref code,
                ref text,
            } => {
                w.verbatim(condition.name())?;
                if let Some(ref code) = *code {
                    w.space()?;
                    code.write_to(w)?;
                }
                if !text.is_empty() {
                    w.space()?;
                    w.verbatim_bytes(text)?;
                }
                Ok(())
            }
            Kind::Data(ref data) => data.write_to(w),
            Kind::Continuation(ref text) => w.verbatim_bytes(text),
        }
    }

    pub fn is_condition(&self, expected: Condition) -> bool {
        match self.kind {
            Kind::Condition { condition, .. } => expected == condition,
            _ => false,
        }
    }

    /// Whether the connection must close once this response is sent.
    pub fn is_terminal(&self) -> bool {
        self.is_condition(Condition::Bye)
            || self.untagged.iter().any(Response::is_terminal)
    }

    pub fn is_bad(&self) -> bool {
        self.is_condition(Condition::Bad)
    }

    fn render(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        for untagged in &self.untagged {
            buf.extend_from_slice(&untagged.render());
        }
        buf.extend_from_slice(self.tag.value());
        buf.push(b' ');
        buf.extend_from_slice(&self.text());
        buf.extend_from_slice(b"\r\n");
        buf
    }

    /// Write the untagged responses and then this one.
    pub fn write_to(&mut self, writer: &mut dyn Write) -> io::Result<()> {
        if self.raw.is_none() {
            self.raw = Some(self.render());
        }

        match self.raw {
            Some(ref raw) => writer.write_all(raw),
            None => Ok(()),
        }
    }

    pub fn to_bytes(&mut self) -> Vec<u8> {
        let mut buf = Vec::new();
        // Writing to a Vec cannot fail
        let _ = self.write_to(&mut buf);
        buf
    }
}
