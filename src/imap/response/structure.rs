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

//! The ENVELOPE and BODYSTRUCTURE data of FETCH responses.

use std::io;

use crate::imap::lex::{LexWriter, Writeable};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Address {
    pub name: Option<String>,
    /// The at-domain-list, which nobody uses.
    pub route: Option<String>,
    pub mailbox: Option<String>,
    pub host: Option<String>,
}

impl Writeable for Address {
    fn write_to(&self, w: &mut LexWriter<'_>) -> io::Result<()> {
        w.verbatim("(")?;
        w.nstring(self.name.as_ref().map(|s| s.as_bytes()))?;
        w.space()?;
        w.nstring(self.route.as_ref().map(|s| s.as_bytes()))?;
        w.space()?;
        w.nstring(self.mailbox.as_ref().map(|s| s.as_bytes()))?;
        w.space()?;
        w.nstring(self.host.as_ref().map(|s| s.as_bytes()))?;
        w.verbatim(")")
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Envelope {
    pub date: Option<String>,
    pub subject: Option<String>,
    pub from: Vec<Address>,
    pub sender: Vec<Address>,
    pub reply_to: Vec<Address>,
    pub to: Vec<Address>,
    pub cc: Vec<Address>,
    pub bcc: Vec<Address>,
    pub in_reply_to: Option<String>,
    pub message_id: Option<String>,
}

fn write_addresses(
    w: &mut LexWriter<'_>,
    addresses: &[Address],
) -> io::Result<()> {
    if addresses.is_empty() {
        return w.nil();
    }

    w.verbatim("(")?;
    for address in addresses {
        address.write_to(w)?;
    }
    w.verbatim(")")
}

impl Writeable for Envelope {
    fn write_to(&self, w: &mut LexWriter<'_>) -> io::Result<()> {
        w.verbatim("(")?;
        w.nstring(self.date.as_ref().map(|s| s.as_bytes()))?;
        w.space()?;
        w.nstring(self.subject.as_ref().map(|s| s.as_bytes()))?;
        for addresses in &[
            &self.from,
            &self.sender,
            &self.reply_to,
            &self.to,
            &self.cc,
            &self.bcc,
        ] {
            w.space()?;
            write_addresses(w, addresses)?;
        }
        w.space()?;
        w.nstring(self.in_reply_to.as_ref().map(|s| s.as_bytes()))?;
        w.space()?;
        w.nstring(self.message_id.as_ref().map(|s| s.as_bytes()))?;
        w.verbatim(")")
    }
}

/// The MIME structure of a message or one of its parts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BodyStructure {
    /// Upper-cased media type, e.g. `TEXT`.
    pub media_type: String,
    /// Upper-cased subtype, e.g. `PLAIN`.
    pub subtype: String,
    pub params: Vec<(String, String)>,
    pub id: Option<String>,
    pub description: Option<String>,
    pub encoding: String,
    /// The size in bytes of the encoded body.
    pub size: u64,
    /// The line count, for `TEXT` and `MESSAGE/RFC822` parts.
    pub lines: Option<u64>,
    /// For `MESSAGE/RFC822`, the structure of the enclosed message.
    pub message: Option<Box<(Envelope, BodyStructure)>>,
    /// For `MULTIPART`, the child parts.
    pub parts: Vec<BodyStructure>,
    pub disposition: Option<(String, Vec<(String, String)>)>,
    pub language: Option<String>,
    pub location: Option<String>,
}

impl BodyStructure {
    pub fn is_multipart(&self) -> bool {
        "MULTIPART" == self.media_type
    }

    /// Write the structure, with extension data if `extended`.
    ///
    /// `BODY` uses the non-extensible form and `BODYSTRUCTURE` the extended
    /// one.
    pub fn write(
        &self,
        w: &mut LexWriter<'_>,
        extended: bool,
    ) -> io::Result<()> {
        w.verbatim("(")?;
        if self.is_multipart() {
            for part in &self.parts {
                part.write(w, extended)?;
            }
            w.space()?;
            w.string(self.subtype.as_bytes())?;
            if extended {
                w.space()?;
                write_params(w, &self.params)?;
                self.write_trailing_extensions(w)?;
            }
        } else {
            w.string(self.media_type.as_bytes())?;
            w.space()?;
            w.string(self.subtype.as_bytes())?;
            w.space()?;
            write_params(w, &self.params)?;
            w.space()?;
            w.nstring(self.id.as_ref().map(|s| s.as_bytes()))?;
            w.space()?;
            w.nstring(self.description.as_ref().map(|s| s.as_bytes()))?;
            w.space()?;
            w.string(self.encoding.as_bytes())?;
            w.space()?;
            w.number(self.size)?;
            if let Some(ref inner) = self.message {
                w.space()?;
                inner.0.write_to(w)?;
                w.space()?;
                inner.1.write(w, extended)?;
            }
            if let Some(lines) = self.lines {
                w.space()?;
                w.number(lines)?;
            }
            if extended {
                // body-fld-md5, never computed
                w.space()?;
                w.nil()?;
                self.write_trailing_extensions(w)?;
            }
        }
        w.verbatim(")")
    }

    fn write_trailing_extensions(
        &self,
        w: &mut LexWriter<'_>,
    ) -> io::Result<()> {
        w.space()?;
        match self.disposition {
            None => w.nil()?,
            Some((ref kind, ref params)) => {
                w.verbatim("(")?;
                w.string(kind.as_bytes())?;
                w.space()?;
                write_params(w, params)?;
                w.verbatim(")")?;
            }
        }
        w.space()?;
        w.nstring(self.language.as_ref().map(|s| s.as_bytes()))?;
        w.space()?;
        w.nstring(self.location.as_ref().map(|s| s.as_bytes()))
    }
}

fn write_params(
    w: &mut LexWriter<'_>,
    params: &[(String, String)],
) -> io::Result<()> {
    if params.is_empty() {
        return w.nil();
    }

    w.verbatim("(")?;
    for (ix, &(ref name, ref value)) in params.iter().enumerate() {
        if ix > 0 {
            w.space()?;
        }
        w.string(name.as_bytes())?;
        w.space()?;
        w.string(value.as_bytes())?;
    }
    w.verbatim(")")
}
