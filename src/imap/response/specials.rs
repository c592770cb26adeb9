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

//! The untagged data responses.

use std::io;

use chrono::prelude::*;

use super::structure::{BodyStructure, Envelope};
use crate::imap::fetch::FetchAttribute;
use crate::imap::lex::{LexWriter, Writeable};
use crate::imap::mailbox_name::{MailboxName, DELIMITER};
use crate::imap::specials::{write_flag_list, Flag, StatusAttribute};

/// Identifies untagged data which supersedes earlier data with the same key
/// within one response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MergeKey {
    Exists,
    Recent,
    Fetch(u32),
}

/// The value of one FETCH data item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchValue {
    Uid(u32),
    Flags(Vec<Flag>),
    InternalDate(DateTime<FixedOffset>),
    Size(u64),
    Envelope(Envelope),
    Structure {
        structure: BodyStructure,
        extended: bool,
    },
    /// Message content, `NIL` if absent.
    Content(Option<Vec<u8>>),
}

impl Writeable for FetchValue {
    fn write_to(&self, w: &mut LexWriter<'_>) -> io::Result<()> {
        match *self {
            FetchValue::Uid(uid) => w.number(u64::from(uid)),
            FetchValue::Flags(ref flags) => write_flag_list(w, flags),
            FetchValue::InternalDate(ref when) => w.datetime(when),
            FetchValue::Size(size) => w.number(size),
            FetchValue::Envelope(ref envelope) => envelope.write_to(w),
            FetchValue::Structure {
                ref structure,
                extended,
            } => structure.write(w, extended),
            FetchValue::Content(ref content) => {
                w.nstring(content.as_ref().map(|c| &c[..]))
            }
        }
    }
}

/// The data of one untagged `FETCH`, in the order the items were requested.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchResponse {
    pub seq: u32,
    pub data: Vec<(FetchAttribute, FetchValue)>,
}

impl FetchResponse {
    pub fn new(seq: u32) -> Self {
        FetchResponse {
            seq,
            data: Vec::new(),
        }
    }

    /// Add or replace the value of `attribute`.
    pub fn set(&mut self, attribute: FetchAttribute, value: FetchValue) {
        match self.data.iter_mut().find(|(a, _)| *a == attribute) {
            Some(existing) => existing.1 = value,
            None => self.data.push((attribute, value)),
        }
    }
}

/// One entry returned by LIST or LSUB.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListEntry {
    pub name: MailboxName,
    /// Name attributes including their backslash, e.g. `\Noselect`.
    pub attributes: Vec<String>,
}

/// Untagged data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Special {
    Capability(Vec<String>),
    Flags(Vec<Flag>),
    Exists(u32),
    Recent(u32),
    Expunge(u32),
    Fetch(FetchResponse),
    List(ListEntry),
    Lsub(ListEntry),
    Search(Vec<u32>),
    Status {
        mailbox: MailboxName,
        items: Vec<(StatusAttribute, u64)>,
    },
}

impl Special {
    pub fn merge_key(&self) -> Option<MergeKey> {
        match *self {
            Special::Exists(_) => Some(MergeKey::Exists),
            Special::Recent(_) => Some(MergeKey::Recent),
            Special::Fetch(ref fetch) => Some(MergeKey::Fetch(fetch.seq)),
            _ => None,
        }
    }

    /// Fold `newer`, which has the same merge key, into this value.
    ///
    /// Counts are simply replaced. FETCH data is combined item by item, with
    /// items present in both taking the newer value.
    pub fn merge(&mut self, newer: Special) {
        match (self, newer) {
            (Special::Fetch(old), Special::Fetch(new)) => {
                for (attribute, value) in new.data {
                    old.set(attribute, value);
                }
            }
            (this, newer) => *this = newer,
        }
    }
}

fn write_list_entry(
    w: &mut LexWriter<'_>,
    verb: &str,
    entry: &ListEntry,
) -> io::Result<()> {
    w.verbatim(verb)?;
    w.verbatim(" (")?;
    w.verbatim(&entry.attributes.join(" "))?;
    w.verbatim(") ")?;
    w.quoted(DELIMITER.to_string().as_bytes())?;
    w.space()?;
    entry.name.write_to(w)
}

impl Writeable for Special {
    fn write_to(&self, w: &mut LexWriter<'_>) -> io::Result<()> {
        match *self {
            Special::Capability(ref caps) => {
                w.verbatim("CAPABILITY")?;
                for cap in caps {
                    w.space()?;
                    w.verbatim(cap)?;
                }
                Ok(())
            }
            Special::Flags(ref flags) => {
                w.verbatim("FLAGS ")?;
                write_flag_list(w, flags)
            }
            Special::Exists(n) => w.verbatim(&format!("{} EXISTS", n)),
            Special::Recent(n) => w.verbatim(&format!("{} RECENT", n)),
            Special::Expunge(seq) => w.verbatim(&format!("{} EXPUNGE", seq)),
            Special::Fetch(ref fetch) => {
                w.verbatim(&format!("{} FETCH (", fetch.seq))?;
                for (ix, &(ref attribute, ref value)) in
                    fetch.data.iter().enumerate()
                {
                    if ix > 0 {
                        w.space()?;
                    }
                    attribute.write_to(w)?;
                    w.space()?;
                    value.write_to(w)?;
                }
                w.verbatim(")")
            }
            Special::List(ref entry) => write_list_entry(w, "LIST", entry),
            Special::Lsub(ref entry) => write_list_entry(w, "LSUB", entry),
            Special::Search(ref seqs) => {
                w.verbatim("SEARCH")?;
                for seq in seqs {
                    w.space()?;
                    w.number(u64::from(*seq))?;
                }
                Ok(())
            }
            Special::Status {
                ref mailbox,
                ref items,
            } => {
                w.verbatim("STATUS ")?;
                mailbox.write_to(w)?;
                w.verbatim(" (")?;
                for (ix, &(attribute, value)) in items.iter().enumerate() {
                    if ix > 0 {
                        w.space()?;
                    }
                    w.verbatim(attribute.name())?;
                    w.space()?;
                    w.number(value)?;
                }
                w.verbatim(")")
            }
        }
    }
}
