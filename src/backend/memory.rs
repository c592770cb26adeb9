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

//! A storage backend that keeps everything in process memory.
//!
//! Each account is a set of mailboxes behind one mutex, shared by every
//! session logged in as that user. Mailboxes keep an append-only change log
//! stamped with a modification sequence; a session's view records the last
//! sequence it has seen, so refreshing a view means replaying the log from
//! there.

use std::collections::{BTreeMap, BTreeSet};
use std::mem;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::prelude::*;
use log::{debug, info};
use rand::Rng;
use regex::{Regex, RegexBuilder};

use super::message::ParsedMessage;
use super::search::{self, Candidate};
use super::*;
use crate::imap::mailbox_name::DELIMITER;
use crate::support::system_config::SystemConfig;

/// A message as stored in a mailbox.
struct StoredMessage {
    /// Permanent flags only; `\Recent` is tracked per session.
    flags: BTreeSet<Flag>,
    /// Set until some session claims the message as recent.
    recent: bool,
    internal_date: DateTime<FixedOffset>,
    content: Arc<ParsedMessage>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ChangeKind {
    Expunge,
    Flags,
}

#[derive(Clone, Copy, Debug)]
struct Change {
    modseq: u64,
    /// The session which made the change.
    session: u64,
    uid: u32,
    kind: ChangeKind,
}

struct Mailbox {
    uid_validity: u32,
    next_uid: u32,
    modseq: u64,
    readonly: bool,
    messages: BTreeMap<u32, StoredMessage>,
    changes: Vec<Change>,
}

impl Mailbox {
    fn new() -> Self {
        Mailbox {
            uid_validity: rand::thread_rng().gen_range(1, u32::MAX),
            next_uid: 101,
            modseq: 0,
            readonly: false,
            messages: BTreeMap::new(),
            changes: Vec::new(),
        }
    }

    fn record(&mut self, session: u64, uid: u32, kind: ChangeKind) {
        self.modseq += 1;
        self.changes.push(Change {
            modseq: self.modseq,
            session,
            uid,
            kind,
        });
    }

    fn add(
        &mut self,
        content: Arc<ParsedMessage>,
        flags: impl IntoIterator<Item = Flag>,
        internal_date: DateTime<FixedOffset>,
    ) -> u32 {
        let uid = self.next_uid;
        self.next_uid += 1;
        self.messages.insert(
            uid,
            StoredMessage {
                flags: permanent_only(flags),
                recent: true,
                internal_date,
                content,
            },
        );
        uid
    }

    fn has_message(&self, uid: u32) -> bool {
        self.messages.contains_key(&uid)
    }
}

fn permanent_only(flags: impl IntoIterator<Item = Flag>) -> BTreeSet<Flag> {
    let permanent = Flag::permanent();
    flags
        .into_iter()
        .filter(|flag| permanent.contains(flag))
        .collect()
}

fn session_flags(
    uid: u32,
    message: &StoredMessage,
    recent: &BTreeSet<u32>,
) -> Vec<Flag> {
    let mut flags = message.flags.clone();
    if recent.contains(&uid) {
        flags.insert(Flag::Recent);
    }
    flags.into_iter().collect()
}

struct Account {
    password: String,
    mailboxes: BTreeMap<String, Mailbox>,
    subscriptions: BTreeSet<String>,
}

impl Account {
    fn new(password: String) -> Self {
        let mut mailboxes = BTreeMap::new();
        mailboxes.insert("INBOX".to_owned(), Mailbox::new());
        let mut subscriptions = BTreeSet::new();
        subscriptions.insert("INBOX".to_owned());

        Account {
            password,
            mailboxes,
            subscriptions,
        }
    }

    fn mailbox(&mut self, name: &MailboxName) -> Result<&mut Mailbox, Error> {
        self.mailboxes
            .get_mut(name.as_str())
            .ok_or_else(|| Error::not_found(name.as_str()))
    }

    fn has_children(&self, name: &str) -> bool {
        let prefix = format!("{}{}", name, DELIMITER);
        self.mailboxes
            .range(prefix.clone()..)
            .next()
            .map_or(false, |(k, _)| k.starts_with(&prefix))
    }

    /// Create `name` and any missing parents.
    fn create_with_parents(&mut self, name: &str) {
        for (ix, _) in name.match_indices(DELIMITER) {
            self.mailboxes
                .entry(name[..ix].to_owned())
                .or_insert_with(Mailbox::new);
        }
        self.mailboxes
            .entry(name.to_owned())
            .or_insert_with(Mailbox::new);
    }

    fn populate_demo(&mut self) {
        let date = |day, hour| {
            FixedOffset::west(5 * 3600)
                .ymd(2020, 2, day)
                .and_hms(hour, 15, 0)
        };

        let inbox = self
            .mailboxes
            .entry("INBOX".to_owned())
            .or_insert_with(Mailbox::new);
        for (ix, &(raw, flags)) in DEMO_INBOX.iter().enumerate() {
            let uid = inbox.add(
                Arc::new(ParsedMessage::new(raw.to_vec())),
                flags.iter().cloned(),
                date(ix as u32 + 3, 9),
            );
            if ix + 1 < DEMO_INBOX.len() {
                if let Some(message) = inbox.messages.get_mut(&uid) {
                    message.recent = false;
                }
            }
        }

        let sent = self
            .mailboxes
            .entry("Sent".to_owned())
            .or_insert_with(Mailbox::new);
        let uid = sent.add(
            Arc::new(ParsedMessage::new(DEMO_SENT.to_vec())),
            vec![Flag::Seen],
            date(2, 18),
        );
        if let Some(message) = sent.messages.get_mut(&uid) {
            message.recent = false;
        }

        self.mailboxes
            .entry("Trash".to_owned())
            .or_insert_with(Mailbox::new);
        self.subscriptions.insert("Sent".to_owned());
        self.subscriptions.insert("Trash".to_owned());
    }
}

const DEMO_INBOX: &[(&[u8], &[Flag])] = &[
    (
        b"From: Alice Example <alice@example.com>\r\n\
          To: Demo User <demouser@example.com>\r\n\
          Subject: Welcome\r\n\
          Date: Mon, 3 Feb 2020 09:15:00 -0500\r\n\
          Message-Id: <welcome@example.com>\r\n\
          \r\n\
          Welcome to your new mailbox.\r\n",
        &[Flag::Seen],
    ),
    (
        b"From: Bob Example <bob@example.com>\r\n\
          To: Demo User <demouser@example.com>\r\n\
          Cc: alice@example.com\r\n\
          Subject: Lunch tomorrow?\r\n\
          Date: Tue, 4 Feb 2020 09:15:00 -0500\r\n\
          Message-Id: <lunch@example.com>\r\n\
          \r\n\
          Are you free for lunch tomorrow?\r\n",
        &[Flag::Seen, Flag::Answered],
    ),
    (
        b"From: Carol Example <carol@example.com>\r\n\
          To: Demo User <demouser@example.com>\r\n\
          Subject: Quarterly report\r\n\
          Date: Wed, 5 Feb 2020 09:15:00 -0500\r\n\
          Message-Id: <report@example.com>\r\n\
          MIME-Version: 1.0\r\n\
          Content-Type: multipart/mixed; boundary=\"b1\"\r\n\
          \r\n\
          --b1\r\n\
          Content-Type: text/plain; charset=utf-8\r\n\
          \r\n\
          The report is attached.\r\n\
          --b1\r\n\
          Content-Type: text/csv; name=\"report.csv\"\r\n\
          \r\n\
          quarter,total\r\n\
          Q4,42\r\n\
          --b1--\r\n",
        &[],
    ),
    (
        b"From: Dave Example <dave@example.com>\r\n\
          To: Demo User <demouser@example.com>\r\n\
          Subject: Just arrived\r\n\
          Date: Thu, 6 Feb 2020 09:15:00 -0500\r\n\
          Message-Id: <arrived@example.com>\r\n\
          \r\n\
          This message has not been seen by anyone yet.\r\n",
        &[],
    ),
];

const DEMO_SENT: &[u8] = b"From: Demo User <demouser@example.com>\r\n\
    To: Bob Example <bob@example.com>\r\n\
    Subject: Re: Lunch tomorrow?\r\n\
    Date: Sun, 2 Feb 2020 18:15:00 -0500\r\n\
    In-Reply-To: <lunch@example.com>\r\n\
    \r\n\
    Sounds good.\r\n";

struct CopySource {
    uid: u32,
    flags: BTreeSet<Flag>,
    internal_date: DateTime<FixedOffset>,
    content: Arc<ParsedMessage>,
}

fn lock(account: &Mutex<Account>) -> MutexGuard<'_, Account> {
    account.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Accepts logins for the users added to it.
pub struct MemoryLogin {
    accounts: BTreeMap<String, Arc<Mutex<Account>>>,
    disabled_search_keys: Arc<Vec<String>>,
    next_session: AtomicU64,
}

impl MemoryLogin {
    /// Set up the backend, including the demo account if one is configured.
    pub fn new(config: &SystemConfig) -> Self {
        let mut login = MemoryLogin {
            accounts: BTreeMap::new(),
            disabled_search_keys: Arc::new(
                config.imap.disable_search_keys.clone(),
            ),
            next_session: AtomicU64::new(1),
        };

        if !config.demo.user.is_empty() {
            login.add_user(
                &config.demo.user,
                &config.demo.password,
                config.demo.data,
            );
        }
        login
    }

    pub fn add_user(&mut self, user: &str, password: &str, demo_data: bool) {
        let mut account = Account::new(password.to_owned());
        if demo_data {
            account.populate_demo();
        }
        self.accounts
            .insert(user.to_owned(), Arc::new(Mutex::new(account)));
    }
}

impl Login for MemoryLogin {
    fn login(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<Box<dyn Session>>, Error> {
        if credentials
            .authzid
            .as_ref()
            .map_or(false, |authzid| *authzid != credentials.authcid)
        {
            info!(
                "Rejected attempt by {} to act as another user",
                credentials.authcid
            );
            return Ok(None);
        }

        let account = match self.accounts.get(&credentials.authcid) {
            Some(account) => account,
            None => return Ok(None),
        };
        if lock(account).password != credentials.secret {
            return Ok(None);
        }

        Ok(Some(Box::new(MemorySession {
            id: self.next_session.fetch_add(1, Ordering::Relaxed),
            user: credentials.authcid.clone(),
            account: Arc::clone(account),
            disabled_search_keys: Arc::clone(&self.disabled_search_keys),
        })))
    }
}

/// One authenticated session against a `MemoryLogin` account.
pub struct MemorySession {
    id: u64,
    user: String,
    account: Arc<Mutex<Account>>,
    disabled_search_keys: Arc<Vec<String>>,
}

/// Bring `view` up to date with `mailbox`.
///
/// Flag changes made by `session` itself are not reported, since the
/// commands making them report the new flags directly. If `defer_expunge`,
/// expunged messages stay in the view as placeholders and are reported by
/// a later refresh.
fn refresh(
    mailbox: &mut Mailbox,
    name: &MailboxName,
    readonly: bool,
    mut view: SequenceView,
    session: u64,
    defer_expunge: bool,
) -> MailboxSnapshot {
    let mut expunged = mem::take(&mut view.deferred_expunges);
    let mut flagged = BTreeSet::new();
    for change in mailbox.changes.iter().filter(|c| c.modseq > view.modseq) {
        match change.kind {
            ChangeKind::Expunge => {
                expunged.insert(change.uid);
            }
            ChangeKind::Flags if change.session != session => {
                flagged.insert(change.uid);
            }
            ChangeKind::Flags => (),
        }
    }
    view.modseq = mailbox.modseq;
    expunged.retain(|&uid| view.seq_of(uid).is_some());

    let mut updates = BTreeMap::new();
    for uid in flagged.difference(&expunged) {
        if let (Some(seq), Some(message)) =
            (view.seq_of(*uid), mailbox.messages.get(uid))
        {
            updates.insert(
                seq,
                Update::Fetch(session_flags(*uid, message, &view.recent)),
            );
        }
    }

    if defer_expunge {
        view.deferred_expunges = expunged;
    } else if !expunged.is_empty() {
        for &uid in &expunged {
            if let Some(seq) = view.seq_of(uid) {
                updates.insert(seq, Update::Expunge);
            }
        }
        view.uids.retain(|uid| !expunged.contains(uid));
        view.recent.retain(|uid| !expunged.contains(uid));
    }

    for (&uid, message) in mailbox.messages.range_mut(view.uid_next..) {
        view.uids.push(uid);
        if !readonly && message.recent {
            message.recent = false;
            view.recent.insert(uid);
        }
    }
    view.uid_next = mailbox.next_uid;

    if readonly {
        let messages = &mailbox.messages;
        view.recent = view
            .uids
            .iter()
            .copied()
            .filter(|uid| messages.get(uid).map_or(false, |m| m.recent))
            .collect();
    }

    let mut unseen = 0;
    let mut first_unseen = None;
    for (ix, uid) in view.uids.iter().enumerate() {
        if let Some(message) = mailbox.messages.get(uid) {
            if !message.flags.contains(&Flag::Seen) {
                unseen += 1;
                first_unseen = first_unseen.or(Some(ix as u32 + 1));
            }
        }
    }

    MailboxSnapshot {
        name: name.clone(),
        readonly,
        exists: view.uids.len() as u32,
        recent: view.recent.len() as u32,
        unseen,
        first_unseen,
        uid_next: mailbox.next_uid,
        uid_validity: mailbox.uid_validity,
        permanent_flags: if readonly {
            vec![]
        } else {
            Flag::permanent()
        },
        flags: Flag::defined(),
        updates,
        view,
    }
}

/// Translate a LIST pattern into an anchored regex.
fn pattern_regex(pattern: &str, case_insensitive: bool) -> Option<Regex> {
    let mut rx = "^".to_owned();
    for ch in pattern.chars() {
        match ch {
            '*' => rx.push_str(".*"),
            '%' => rx.push_str(&format!(
                "[^{}]*",
                regex::escape(&DELIMITER.to_string())
            )),
            ch => rx.push_str(&regex::escape(&ch.to_string())),
        }
    }
    rx.push('$');

    RegexBuilder::new(&rx)
        .case_insensitive(case_insensitive)
        .build()
        .ok()
}

impl MemorySession {
    fn lock(&self) -> MutexGuard<'_, Account> {
        lock(&self.account)
    }

    /// Run `f` against the selected mailbox, then refresh the snapshot.
    fn with_selected<R>(
        &self,
        selected: &MailboxSnapshot,
        defer_expunge: bool,
        f: impl FnOnce(&mut Mailbox) -> Result<R, Error>,
    ) -> Result<(R, MailboxSnapshot), Error> {
        let mut account = self.lock();
        let mailbox = account.mailbox(&selected.name)?;
        let result = f(mailbox)?;
        let snapshot = refresh(
            mailbox,
            &selected.name,
            selected.readonly,
            selected.view.clone(),
            self.id,
            defer_expunge,
        );
        Ok((result, snapshot))
    }

    fn require_writable(selected: &MailboxSnapshot) -> Result<(), Error> {
        if selected.readonly {
            Err(Error::MailboxReadOnly(selected.name.to_string()))
        } else {
            Ok(())
        }
    }
}

impl Session for MemorySession {
    fn user(&self) -> &str {
        &self.user
    }

    fn list_mailboxes(
        &mut self,
        reference: &str,
        pattern: &str,
        subscribed: bool,
    ) -> Result<Vec<ListEntry>, Error> {
        if pattern.is_empty() && !subscribed {
            return Ok(vec![ListEntry {
                name: MailboxName::new(""),
                attributes: vec!["\\Noselect".to_owned()],
            }]);
        }

        let full = format!("{}{}", reference, pattern);
        let (rx, inbox_rx) = match (
            pattern_regex(&full, false),
            pattern_regex(&full, true),
        ) {
            (Some(rx), Some(inbox_rx)) => (rx, inbox_rx),
            _ => return Ok(vec![]),
        };

        let account = self.lock();
        let names: Vec<&String> = if subscribed {
            account.subscriptions.iter().collect()
        } else {
            account.mailboxes.keys().collect()
        };

        Ok(names
            .into_iter()
            .filter(|name| {
                if "INBOX" == name.as_str() {
                    inbox_rx.is_match(name)
                } else {
                    rx.is_match(name)
                }
            })
            .map(|name| {
                let attribute = if !account.mailboxes.contains_key(name) {
                    "\\Noselect"
                } else if account.has_children(name) {
                    "\\HasChildren"
                } else {
                    "\\HasNoChildren"
                };
                ListEntry {
                    name: MailboxName::new(name.as_str()),
                    attributes: vec![attribute.to_owned()],
                }
            })
            .collect())
    }

    fn get_mailbox(
        &mut self,
        name: &MailboxName,
        examine: bool,
    ) -> Result<MailboxSnapshot, Error> {
        let mut account = self.lock();
        let mailbox = account.mailbox(name)?;
        let readonly = examine || mailbox.readonly;
        let view = SequenceView {
            modseq: mailbox.modseq,
            ..SequenceView::default()
        };
        Ok(refresh(mailbox, name, readonly, view, self.id, false))
    }

    fn create_mailbox(&mut self, name: &MailboxName) -> Result<(), Error> {
        let name = name.as_str().trim_end_matches(DELIMITER);
        let mut account = self.lock();
        if account.mailboxes.contains_key(name) {
            return Err(Error::MailboxConflict(name.to_owned()));
        }

        account.create_with_parents(name);
        info!("{} created mailbox {}", self.user, name);
        Ok(())
    }

    fn delete_mailbox(&mut self, name: &MailboxName) -> Result<(), Error> {
        let mut account = self.lock();
        if !account.mailboxes.contains_key(name.as_str()) {
            return Err(Error::not_found(name.as_str()));
        }
        if account.has_children(name.as_str()) {
            return Err(Error::MailboxHasChildren(name.to_string()));
        }

        account.mailboxes.remove(name.as_str());
        info!("{} deleted mailbox {}", self.user, name);
        Ok(())
    }

    fn rename_mailbox(
        &mut self,
        from: &MailboxName,
        to: &MailboxName,
    ) -> Result<(), Error> {
        let mut account = self.lock();
        if !account.mailboxes.contains_key(from.as_str()) {
            return Err(Error::not_found(from.as_str()));
        }
        if account.mailboxes.contains_key(to.as_str()) {
            return Err(Error::MailboxConflict(to.to_string()));
        }

        if from.is_inbox() {
            // INBOX itself stays; its messages move to the new mailbox
            let session = self.id;
            let inbox = account.mailbox(from)?;
            let messages = mem::take(&mut inbox.messages);
            for &uid in messages.keys() {
                inbox.record(session, uid, ChangeKind::Expunge);
            }
            let next_uid = inbox.next_uid;

            account.create_with_parents(to.as_str());
            let dest = account.mailbox(to)?;
            dest.messages = messages;
            dest.next_uid = next_uid;
        } else {
            let prefix = format!("{}{}", from, DELIMITER);
            let moved: Vec<String> = account
                .mailboxes
                .keys()
                .filter(|k| {
                    k.as_str() == from.as_str() || k.starts_with(&prefix)
                })
                .cloned()
                .collect();

            account.create_with_parents(to.as_str());
            for old in moved {
                let new = format!("{}{}", to, &old[from.as_str().len()..]);
                if let Some(mailbox) = account.mailboxes.remove(&old) {
                    account.mailboxes.insert(new, mailbox);
                }
            }
        }

        info!("{} renamed mailbox {} to {}", self.user, from, to);
        Ok(())
    }

    fn subscribe(&mut self, name: &MailboxName) -> Result<(), Error> {
        self.lock().subscriptions.insert(name.to_string());
        Ok(())
    }

    fn unsubscribe(&mut self, name: &MailboxName) -> Result<(), Error> {
        self.lock().subscriptions.remove(name.as_str());
        Ok(())
    }

    fn append_message(
        &mut self,
        name: &MailboxName,
        message: AppendMessage,
    ) -> Result<(u32, u32), Error> {
        let mut account = self.lock();
        let mailbox = account
            .mailboxes
            .get_mut(name.as_str())
            .ok_or_else(|| Error::try_create(name.as_str()))?;
        if mailbox.readonly {
            return Err(Error::MailboxReadOnly(name.to_string()));
        }
        if message.data.is_empty() {
            return Err(Error::AppendFailure("Empty message.".to_owned()));
        }

        let when = message.when.unwrap_or_else(|| Utc::now().into());
        let uid = mailbox.add(
            Arc::new(ParsedMessage::new(message.data)),
            message.flags,
            when,
        );
        debug!("{} appended UID {} to {}", self.user, uid, name);
        Ok((mailbox.uid_validity, uid))
    }

    fn check_mailbox(
        &mut self,
        selected: &MailboxSnapshot,
        housekeeping: bool,
    ) -> Result<MailboxSnapshot, Error> {
        let (_, snapshot) = self.with_selected(selected, false, |mailbox| {
            if housekeeping {
                // TODO Drop change log entries older than every live view
                debug!(
                    "Checkpoint of mailbox with {} logged changes",
                    mailbox.changes.len()
                );
            }
            Ok(())
        })?;
        Ok(snapshot)
    }

    fn expunge_mailbox(
        &mut self,
        selected: &MailboxSnapshot,
        uids: Option<&SequenceSet>,
    ) -> Result<(Vec<u32>, MailboxSnapshot), Error> {
        Self::require_writable(selected)?;
        let allowed: Option<BTreeSet<u32>> = uids.map(|set| {
            selected
                .view
                .resolve(set)
                .into_iter()
                .map(|(_, uid)| uid)
                .collect()
        });

        let session = self.id;
        let (doomed, mut snapshot) =
            self.with_selected(selected, false, |mailbox| {
                let doomed: Vec<u32> = mailbox
                    .messages
                    .iter()
                    .filter(|&(uid, message)| {
                        message.flags.contains(&Flag::Deleted)
                            && allowed
                                .as_ref()
                                .map_or(true, |a| a.contains(uid))
                    })
                    .map(|(&uid, _)| uid)
                    .collect();

                for &uid in &doomed {
                    mailbox.messages.remove(&uid);
                    mailbox.record(session, uid, ChangeKind::Expunge);
                }
                Ok(doomed)
            })?;

        let mut removed: Vec<u32> = doomed
            .into_iter()
            .filter_map(|uid| selected.view.seq_of(uid))
            .collect();
        removed.sort_unstable();
        for seq in &removed {
            snapshot.updates.remove(seq);
        }
        Ok((removed, snapshot))
    }

    fn copy_messages(
        &mut self,
        selected: &MailboxSnapshot,
        set: &SequenceSet,
        destination: &MailboxName,
    ) -> Result<(CopyResult, MailboxSnapshot), Error> {
        let mut account = self.lock();
        let sources: Vec<CopySource> = {
            let source = account.mailbox(&selected.name)?;
            selected
                .view
                .resolve(set)
                .into_iter()
                .filter_map(|(_, uid)| {
                    source.messages.get(&uid).map(|m| CopySource {
                        uid,
                        flags: m.flags.clone(),
                        internal_date: m.internal_date,
                        content: Arc::clone(&m.content),
                    })
                })
                .collect()
        };

        let dest = account
            .mailboxes
            .get_mut(destination.as_str())
            .ok_or_else(|| Error::try_create(destination.as_str()))?;
        if dest.readonly {
            return Err(Error::MailboxReadOnly(destination.to_string()));
        }

        let mut result = CopyResult {
            uid_validity: dest.uid_validity,
            ..CopyResult::default()
        };
        for source in sources {
            result.source.push(source.uid);
            result.destination.push(dest.add(
                source.content,
                source.flags,
                source.internal_date,
            ));
        }

        let mailbox = account.mailbox(&selected.name)?;
        let snapshot = refresh(
            mailbox,
            &selected.name,
            selected.readonly,
            selected.view.clone(),
            self.id,
            false,
        );
        Ok((result, snapshot))
    }

    fn fetch_messages(
        &mut self,
        selected: &MailboxSnapshot,
        set: &SequenceSet,
        set_seen: bool,
    ) -> Result<(Vec<FetchedMessage>, MailboxSnapshot), Error> {
        let session = self.id;
        let set_seen = set_seen && !selected.readonly;
        let targets = selected.view.resolve(set);
        let recent = &selected.view.recent;

        self.with_selected(selected, true, |mailbox| {
            let mut fetched = Vec::with_capacity(targets.len());
            for (seq, uid) in targets {
                let flags_changed = match mailbox.messages.get_mut(&uid) {
                    None => continue,
                    Some(message) => {
                        set_seen && message.flags.insert(Flag::Seen)
                    }
                };
                if flags_changed {
                    mailbox.record(session, uid, ChangeKind::Flags);
                }

                if let Some(message) = mailbox.messages.get(&uid) {
                    fetched.push(FetchedMessage {
                        seq,
                        uid,
                        flags: session_flags(uid, message, recent),
                        flags_changed,
                        internal_date: message.internal_date,
                        content: Arc::clone(&message.content)
                            as Arc<dyn Message>,
                    });
                }
            }
            Ok(fetched)
        })
    }

    fn search_mailbox(
        &mut self,
        selected: &MailboxSnapshot,
        keys: &[SearchKey],
    ) -> Result<(Vec<(u32, u32)>, MailboxSnapshot), Error> {
        search::check_allowed(keys, &self.disabled_search_keys)?;
        let view = &selected.view;
        let max_seq = view.uids.len() as u32;
        let max_uid = view.uids.last().copied().unwrap_or(0);

        self.with_selected(selected, true, |mailbox| {
            let mut hits = Vec::new();
            for (ix, &uid) in view.uids.iter().enumerate() {
                let message = match mailbox.messages.get(&uid) {
                    Some(message) => message,
                    None => continue,
                };
                let flags = session_flags(uid, message, &view.recent);
                let candidate = Candidate {
                    seq: ix as u32 + 1,
                    uid,
                    flags: &flags,
                    internal_date: message.internal_date,
                    message: &message.content,
                    max_seq,
                    max_uid,
                };
                if keys.iter().all(|key| search::matches(key, &candidate)) {
                    hits.push((candidate.seq, uid));
                }
            }
            Ok(hits)
        })
    }

    fn update_flags(
        &mut self,
        selected: &MailboxSnapshot,
        set: &SequenceSet,
        flags: &[Flag],
        mode: StoreMode,
    ) -> Result<(Vec<StoredFlags>, MailboxSnapshot), Error> {
        Self::require_writable(selected)?;
        let session = self.id;
        let flags = permanent_only(flags.iter().cloned());
        let targets = selected.view.resolve(set);
        let recent = &selected.view.recent;

        self.with_selected(selected, true, |mailbox| {
            let mut stored = Vec::with_capacity(targets.len());
            for (seq, uid) in targets {
                let message = match mailbox.messages.get_mut(&uid) {
                    Some(message) => message,
                    None => continue,
                };

                let new_flags = match mode {
                    StoreMode::Replace => flags.clone(),
                    StoreMode::Add => {
                        message.flags.union(&flags).cloned().collect()
                    }
                    StoreMode::Remove => {
                        message.flags.difference(&flags).cloned().collect()
                    }
                };
                let changed = new_flags != message.flags;
                message.flags = new_flags;
                let current = session_flags(uid, message, recent);

                if changed {
                    mailbox.record(session, uid, ChangeKind::Flags);
                }
                stored.push(StoredFlags {
                    seq,
                    uid,
                    flags: current,
                });
            }
            Ok(stored)
        })
    }
}
