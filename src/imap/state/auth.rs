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

use log::{info, warn};

use super::defs::*;
use crate::imap::sasl::{self, Credentials};

impl ConnectionState {
    pub(super) fn cmd_capability(&mut self, tag: Tag) -> CmdResult {
        let mut response = Response::ok(tag, "Capabilities listed.", None);
        response.add_untagged(Response::special(Special::Capability(
            self.capabilities(),
        )));
        Ok((response, None))
    }

    pub(super) fn cmd_noop(&mut self, tag: Tag) -> CmdResult {
        let after = self.refresh_selected()?;
        Ok((Response::ok(tag, "NOOP completed.", None), after))
    }

    pub(super) fn cmd_login(
        &mut self,
        tag: Tag,
        user: &[u8],
        password: &[u8],
    ) -> CmdResult {
        let credentials = Credentials::from_login(user, password);
        let response = self.log_in(tag, &credentials)?;
        Ok((response, None))
    }

    /// Complete an AUTHENTICATE with the client's reply to the challenge.
    pub fn authenticate(
        &mut self,
        tag: Tag,
        reply: &[u8],
    ) -> Result<Response, Error> {
        let result = if "*" == String::from_utf8_lossy(reply).trim() {
            let response =
                Response::bad(tag.clone(), "AUTHENTICATE cancelled.", None);
            Ok((response, None))
        } else {
            match sasl::decode_plain(reply) {
                Some(credentials) => self
                    .log_in(tag.clone(), &credentials)
                    .map(|response| (response, None)),
                None => Err(Error::InvalidAuth),
            }
        };
        self.respond(&tag, "AUTHENTICATE", result)
    }

    fn log_in(
        &mut self,
        tag: Tag,
        credentials: &Credentials,
    ) -> Result<Response, Error> {
        match self.login.login(credentials)? {
            Some(session) => {
                self.log_prefix.set_user(session.user().to_owned());
                info!("{} Login successful", self.log_prefix);
                self.session = Some(session);
                Ok(Response::ok(
                    tag,
                    "Authentication successful.",
                    self.capability_code(),
                ))
            }
            None => {
                warn!(
                    "{} Rejected login attempt for {:?}",
                    self.log_prefix, credentials.authcid
                );
                Ok(Response::no(
                    tag,
                    "Invalid authentication credentials.",
                    None,
                ))
            }
        }
    }
}
