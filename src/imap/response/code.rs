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

use std::io;

use crate::imap::lex::{LexWriter, Writeable};
use crate::imap::specials::{write_flag_list, Flag};

/// The bracketed annotation on a status response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResponseCode {
    Alert,
    Capability(Vec<String>),
    PermanentFlags(Vec<Flag>),
    ReadOnly,
    ReadWrite,
    UidNext(u32),
    UidValidity(u32),
    Unseen(u32),
    /// RFC 4315 `APPENDUID validity uid`.
    AppendUid(u32, u32),
    /// RFC 4315 `COPYUID validity source-uids destination-uids`.
    CopyUid(u32, Vec<u32>, Vec<u32>),
    /// Any other code, written verbatim inside the brackets.
    Anonymous(Vec<u8>),
}

impl ResponseCode {
    /// Wrap raw bytes as an anonymous code, or nothing.
    pub fn of(raw: Option<impl AsRef<[u8]>>) -> Option<ResponseCode> {
        raw.map(|raw| ResponseCode::Anonymous(raw.as_ref().to_vec()))
    }
}

impl Writeable for ResponseCode {
    fn write_to(&self, w: &mut LexWriter<'_>) -> io::Result<()> {
        w.verbatim("[")?;
        match *self {
            ResponseCode::Alert => w.verbatim("ALERT")?,
            ResponseCode::Capability(ref caps) => {
                w.verbatim("CAPABILITY")?;
                for cap in caps {
                    w.space()?;
                    w.verbatim(cap)?;
                }
            }
            ResponseCode::PermanentFlags(ref flags) => {
                w.verbatim("PERMANENTFLAGS ")?;
                write_flag_list(w, flags)?;
            }
            ResponseCode::ReadOnly => w.verbatim("READ-ONLY")?,
            ResponseCode::ReadWrite => w.verbatim("READ-WRITE")?,
            ResponseCode::UidNext(uid) => {
                w.verbatim(&format!("UIDNEXT {}", uid))?
            }
            ResponseCode::UidValidity(v) => {
                w.verbatim(&format!("UIDVALIDITY {}", v))?
            }
            ResponseCode::Unseen(seq) => {
                w.verbatim(&format!("UNSEEN {}", seq))?
            }
            ResponseCode::AppendUid(validity, uid) => {
                w.verbatim(&format!("APPENDUID {} {}", validity, uid))?
            }
            ResponseCode::CopyUid(validity, ref from, ref to) => {
                w.verbatim(&format!(
                    "COPYUID {} {} {}",
                    validity,
                    compact_uids(from),
                    compact_uids(to)
                ))?
            }
            ResponseCode::Anonymous(ref raw) => w.verbatim_bytes(raw)?,
        }
        w.verbatim("]")
    }
}

/// Render a list of numbers as a sequence set, collapsing consecutive runs
/// into ranges. Order is preserved, since COPYUID pairs its two sets up by
/// position.
pub fn compact_uids(uids: &[u32]) -> String {
    let mut out = String::new();
    let mut ix = 0;
    while ix < uids.len() {
        let start = uids[ix];
        let mut end = start;
        while ix + 1 < uids.len() && uids[ix + 1] == end + 1 {
            end += 1;
            ix += 1;
        }

        if !out.is_empty() {
            out.push(',');
        }
        if start == end {
            out.push_str(&start.to_string());
        } else {
            out.push_str(&format!("{}:{}", start, end));
        }
        ix += 1;
    }
    out
}
