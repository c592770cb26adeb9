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

//! The storage collaborator of the protocol engine.
//!
//! The connection state machine never touches messages directly. It holds a
//! `Session` obtained from a `Login`, and keeps a `MailboxSnapshot` of the
//! selected mailbox which the session hands back, refreshed, from every
//! operation on it. Differences between consecutive snapshots become the
//! untagged updates the client sees.
//!
//! Operations on the selected mailbox address messages by the sequence
//! numbers of the snapshot they are given, not of the current mailbox
//! contents, so changes made by other sessions in the meantime never shift
//! the client's numbering in the middle of a command.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::prelude::*;

use crate::imap::command::StoreMode;
use crate::imap::fetch::Section;
use crate::imap::mailbox_name::MailboxName;
use crate::imap::response::structure::{BodyStructure, Envelope};
use crate::imap::response::ListEntry;
use crate::imap::sasl::Credentials;
use crate::imap::search::SearchKey;
use crate::imap::specials::{Flag, SequenceSet};
use crate::support::error::Error;

pub mod memory;
pub mod message;
pub mod search;

/// Checks credentials and opens sessions.
pub trait Login: Send + Sync {
    /// Returns `None` if the credentials are rejected.
    fn login(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<Box<dyn Session>>, Error>;
}

/// The content of one message.
pub trait Message: Send + Sync {
    /// The size of the whole message in bytes.
    fn size(&self) -> u64;
    fn envelope(&self) -> Envelope;
    fn body_structure(&self) -> BodyStructure;
    /// The bytes of the given section, or `None` if no such part exists.
    fn section(&self, section: &Section) -> Option<Vec<u8>>;
}

/// A message as returned by FETCH.
#[derive(Clone)]
pub struct FetchedMessage {
    pub seq: u32,
    pub uid: u32,
    /// The flags as this session sees them, `\Recent` included.
    pub flags: Vec<Flag>,
    /// Whether fetching this message just set `\Seen` on it.
    pub flags_changed: bool,
    pub internal_date: DateTime<FixedOffset>,
    pub content: Arc<dyn Message>,
}

/// The new flags of a message after STORE.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredFlags {
    pub seq: u32,
    pub uid: u32,
    pub flags: Vec<Flag>,
}

/// A message to be added by APPEND.
#[derive(Clone, Debug)]
pub struct AppendMessage {
    pub data: Vec<u8>,
    pub flags: Vec<Flag>,
    pub when: Option<DateTime<FixedOffset>>,
}

/// The result of a COPY, reported through `COPYUID`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CopyResult {
    /// The UID validity of the destination.
    pub uid_validity: u32,
    pub source: Vec<u32>,
    pub destination: Vec<u32>,
}

/// Something that happened to a message since the client last heard about
/// it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Update {
    Expunge,
    /// The flags changed; the value holds the current flags.
    Fetch(Vec<Flag>),
}

/// The client's view of a mailbox's messages.
///
/// This is the bookkeeping a backend needs to translate sequence numbers and
/// find out what the client has not yet been told about. It is carried
/// along inside the snapshot and not interpreted by the protocol engine.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SequenceView {
    /// The UID of each message, indexed by sequence number minus one.
    pub uids: Vec<u32>,
    /// The UIDs this session sees as `\Recent`.
    pub recent: BTreeSet<u32>,
    /// The backend's change counter as of this view.
    pub modseq: u64,
    /// Messages already expunged but still present in `uids` because the
    /// client has not been told yet.
    pub deferred_expunges: BTreeSet<u32>,
    /// The first UID not yet part of the view.
    pub uid_next: u32,
}

impl SequenceView {
    pub fn seq_of(&self, uid: u32) -> Option<u32> {
        self.uids
            .binary_search(&uid)
            .ok()
            .map(|ix| ix as u32 + 1)
    }

    /// Resolve `set` into `(seq, uid)` pairs, in ascending order.
    ///
    /// `*` is the highest sequence number, or the highest UID for UID sets.
    pub fn resolve(&self, set: &SequenceSet) -> Vec<(u32, u32)> {
        if set.uid {
            let max = self.uids.last().copied().unwrap_or(0);
            self.uids
                .iter()
                .enumerate()
                .filter(|&(_, &uid)| set.contains(uid, max))
                .map(|(ix, &uid)| (ix as u32 + 1, uid))
                .collect()
        } else {
            let max = self.uids.len() as u32;
            self.uids
                .iter()
                .enumerate()
                .map(|(ix, &uid)| (ix as u32 + 1, uid))
                .filter(|&(seq, _)| set.contains(seq, max))
                .collect()
        }
    }
}

/// The state of a mailbox as last reported to the client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MailboxSnapshot {
    pub name: MailboxName,
    /// Whether the session may not change the mailbox, either because it was
    /// opened with EXAMINE or because the mailbox itself is read-only.
    pub readonly: bool,
    pub exists: u32,
    pub recent: u32,
    pub unseen: u32,
    /// The sequence number of the first message without `\Seen`.
    pub first_unseen: Option<u32>,
    pub uid_next: u32,
    pub uid_validity: u32,
    /// The flags the session may change permanently.
    pub permanent_flags: Vec<Flag>,
    /// The flags defined in the mailbox.
    pub flags: Vec<Flag>,
    /// Updates not yet sent to the client, keyed by the sequence number each
    /// message had in the client's view before the update.
    pub updates: BTreeMap<u32, Update>,
    pub view: SequenceView,
}

/// A user's authenticated access to their mailboxes.
///
/// Methods taking a `selected` snapshot operate on that mailbox and return
/// its refreshed snapshot. Refreshes done for FETCH, STORE and SEARCH never
/// report expunges, which are held back until the next other command since
/// the client must not be told about them while it is processing the
/// results of those commands.
pub trait Session: Send {
    /// The authenticated user name.
    fn user(&self) -> &str;

    /// List the mailboxes matching `reference` and `pattern`, which may
    /// contain the `*` and `%` wildcards.
    fn list_mailboxes(
        &mut self,
        reference: &str,
        pattern: &str,
        subscribed: bool,
    ) -> Result<Vec<ListEntry>, Error>;

    /// Open a mailbox.
    ///
    /// With `examine`, the snapshot is read-only and messages keep their
    /// `\Recent` flag for whichever session selects the mailbox next.
    fn get_mailbox(
        &mut self,
        name: &MailboxName,
        examine: bool,
    ) -> Result<MailboxSnapshot, Error>;

    fn create_mailbox(&mut self, name: &MailboxName) -> Result<(), Error>;
    fn delete_mailbox(&mut self, name: &MailboxName) -> Result<(), Error>;
    fn rename_mailbox(
        &mut self,
        from: &MailboxName,
        to: &MailboxName,
    ) -> Result<(), Error>;

    fn subscribe(&mut self, name: &MailboxName) -> Result<(), Error>;
    fn unsubscribe(&mut self, name: &MailboxName) -> Result<(), Error>;

    /// Add a message to `name`, returning the destination's UID validity and
    /// the new UID.
    fn append_message(
        &mut self,
        name: &MailboxName,
        message: AppendMessage,
    ) -> Result<(u32, u32), Error>;

    /// Refresh the selected mailbox, doing any `housekeeping` first.
    fn check_mailbox(
        &mut self,
        selected: &MailboxSnapshot,
        housekeeping: bool,
    ) -> Result<MailboxSnapshot, Error>;

    /// Remove messages flagged `\Deleted`, restricted to `uids` if given.
    ///
    /// Returns the sequence numbers the removed messages had in `selected`,
    /// in ascending order. These are not repeated in the snapshot's updates,
    /// which only carry changes made elsewhere.
    fn expunge_mailbox(
        &mut self,
        selected: &MailboxSnapshot,
        uids: Option<&SequenceSet>,
    ) -> Result<(Vec<u32>, MailboxSnapshot), Error>;

    fn copy_messages(
        &mut self,
        selected: &MailboxSnapshot,
        set: &SequenceSet,
        destination: &MailboxName,
    ) -> Result<(CopyResult, MailboxSnapshot), Error>;

    /// Fetch the messages in `set`, marking them `\Seen` if `set_seen` and
    /// the mailbox is writable.
    fn fetch_messages(
        &mut self,
        selected: &MailboxSnapshot,
        set: &SequenceSet,
        set_seen: bool,
    ) -> Result<(Vec<FetchedMessage>, MailboxSnapshot), Error>;

    /// Return the `(seq, uid)` of every message matching all `keys`.
    fn search_mailbox(
        &mut self,
        selected: &MailboxSnapshot,
        keys: &[SearchKey],
    ) -> Result<(Vec<(u32, u32)>, MailboxSnapshot), Error>;

    /// Change the flags of the messages in `set`, returning the new flags of
    /// every message addressed.
    fn update_flags(
        &mut self,
        selected: &MailboxSnapshot,
        set: &SequenceSet,
        flags: &[Flag],
        mode: StoreMode,
    ) -> Result<(Vec<StoredFlags>, MailboxSnapshot), Error>;
}
