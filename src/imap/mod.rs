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

//! The IMAP4rev1 protocol engine.
//!
//! `parse` and the modules below it turn command lines into `Command`
//! values; `response` renders what goes back. `state` holds the per-connection
//! state machine and `server` drives it over a byte stream.

#[macro_use]
pub mod parse;

pub mod command;
pub mod fetch;
pub mod lex;
pub mod mailbox_name;
pub mod primitives;
pub mod response;
pub mod sasl;
pub mod search;
pub mod server;
pub mod specials;
pub mod state;

#[cfg(test)]
mod integration_tests;
