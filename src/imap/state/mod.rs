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

//! The connection state machine.
//!
//! This turns parsed commands into responses, tracking whether the client
//! has authenticated and which mailbox it has selected. It knows nothing of
//! the wire beyond the response model; the transport loop in `server` feeds
//! it commands and writes out what it returns.
//!
//! The implementation is split into several submodules, but is best thought
//! of as one module.

// session! and selected! are macros rather than methods so that the result
// borrows only the one field, leaving the rest of `ConnectionState` usable.
macro_rules! session {
    ($this:expr) => {
        $this
            .session
            .as_mut()
            .ok_or_else(|| Error::CommandNotAllowed {
                message: b"Must authenticate first.".to_vec(),
                code: None,
            })
    };
}

macro_rules! selected {
    ($this:expr) => {
        $this
            .selected
            .as_mut()
            .ok_or_else(|| Error::CommandNotAllowed {
                message: b"Must select a mailbox first.".to_vec(),
                code: None,
            })
    };
}

mod auth;
mod commands;
mod defs;
mod fetch;
mod mailboxes;
mod messages;

pub use self::defs::ConnectionState;
