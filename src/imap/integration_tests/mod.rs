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

//! The integration tests are "full-stack" tests which run the real server
//! loop, connection state machine and in-memory backend, talking to them only
//! through the wire protocol.
//!
//! Each "connection" spawns a dedicated server thread. The test side talks to
//! it over a UNIX socket pair, which behaves like a network connection
//! without the tests needing to worry about port numbers.
//!
//! Every `Setup` has its own backend holding a fresh copy of the demo data,
//! so tests may modify it freely. Connections made from the same `Setup`
//! share the backend and see each other's changes.

#[macro_use]
mod defs;

mod rfc3501;
mod rfc4315;
mod rfc7888;
