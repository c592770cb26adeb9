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

use super::finish;
use crate::imap::parse::*;

/// Commands valid in every session phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnyCommand {
    Capability,
    Logout,
    Noop,
}

pub fn parse<'a>(
    verb: &str,
    buf: ParseBuffer<'a>,
    _: &Params,
) -> Option<ParseResult<'a, AnyCommand>> {
    let command = match verb {
        "CAPABILITY" => AnyCommand::Capability,
        "LOGOUT" => AnyCommand::Logout,
        "NOOP" => AnyCommand::Noop,
        _ => return None,
    };

    Some(finish(command, buf))
}
