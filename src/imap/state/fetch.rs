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

use super::defs::*;
use super::messages::completed;
use crate::backend::FetchedMessage;
use crate::imap::fetch::{Section, SectionText};
use crate::imap::specials::SequenceSet;

impl ConnectionState {
    pub(super) fn cmd_fetch(
        &mut self,
        tag: Tag,
        name: &str,
        set: &SequenceSet,
        attributes: &[FetchAttribute],
    ) -> CmdResult {
        let set_seen = attributes.iter().any(FetchAttribute::sets_seen);
        let selected = selected!(self)?;
        let (messages, after) =
            session!(self)?.fetch_messages(selected, set, set_seen)?;

        let mut response = completed(tag, name, None);
        for message in messages {
            let fetch = fetch_response(&message, attributes, set.uid);
            response.add_untagged(Response::special(Special::Fetch(fetch)));
        }
        Ok((response, Some(after)))
    }
}

/// Build the FETCH data for one message, with items in request order.
///
/// UID FETCH always reports the UID, and FLAGS is added if fetching the
/// message changed them.
fn fetch_response(
    message: &FetchedMessage,
    attributes: &[FetchAttribute],
    uid: bool,
) -> FetchResponse {
    let mut fetch = FetchResponse::new(message.seq);
    for attribute in attributes {
        let value = fetch_value(message, attribute);
        fetch.set(attribute.clone(), value);
    }

    if message.flags_changed && !attributes.contains(&FetchAttribute::Flags) {
        fetch.set(
            FetchAttribute::Flags,
            FetchValue::Flags(message.flags.clone()),
        );
    }
    if uid && !attributes.contains(&FetchAttribute::Uid) {
        fetch.set(FetchAttribute::Uid, FetchValue::Uid(message.uid));
    }

    fetch
}

fn fetch_value(
    message: &FetchedMessage,
    attribute: &FetchAttribute,
) -> FetchValue {
    let content = &message.content;
    let whole = |text: Option<SectionText>| {
        FetchValue::Content(content.section(&Section {
            parts: vec![],
            text,
        }))
    };

    match *attribute {
        FetchAttribute::Uid => FetchValue::Uid(message.uid),
        FetchAttribute::Flags => FetchValue::Flags(message.flags.clone()),
        FetchAttribute::InternalDate => {
            FetchValue::InternalDate(message.internal_date)
        }
        FetchAttribute::Envelope => FetchValue::Envelope(content.envelope()),
        FetchAttribute::BodyStructure => FetchValue::Structure {
            structure: content.body_structure(),
            extended: true,
        },
        FetchAttribute::Body => FetchValue::Structure {
            structure: content.body_structure(),
            extended: false,
        },
        FetchAttribute::BodySection {
            ref section,
            partial,
            ..
        } => FetchValue::Content(
            content
                .section(section)
                .map(|data| apply_partial(data, partial)),
        ),
        FetchAttribute::Rfc822 => whole(None),
        FetchAttribute::Rfc822Header => whole(Some(SectionText::Header)),
        FetchAttribute::Rfc822Text => whole(Some(SectionText::Text)),
        FetchAttribute::Rfc822Size => FetchValue::Size(content.size()),
    }
}

/// Cut `data` down to the `<origin.count>` range of a partial fetch.
fn apply_partial(mut data: Vec<u8>, partial: Option<(u32, u32)>) -> Vec<u8> {
    if let Some((origin, count)) = partial {
        let origin = (origin as usize).min(data.len());
        let end = origin.saturating_add(count as usize).min(data.len());
        data.truncate(end);
        data.drain(..origin);
    }
    data
}
