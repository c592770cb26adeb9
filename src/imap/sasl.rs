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

//! The server side of SASL PLAIN (RFC 4616), the only mechanism offered.

use std::str;

/// A user name and password presented by the client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
    /// The identity whose password is given.
    pub authcid: String,
    pub secret: String,
    /// The identity to act as, if different from `authcid`.
    pub authzid: Option<String>,
}

impl Credentials {
    pub fn new(authcid: impl Into<String>, secret: impl Into<String>) -> Self {
        Credentials {
            authcid: authcid.into(),
            secret: secret.into(),
            authzid: None,
        }
    }

    /// Build credentials from the raw arguments of LOGIN.
    pub fn from_login(user: &[u8], password: &[u8]) -> Self {
        Credentials::new(
            String::from_utf8_lossy(user),
            String::from_utf8_lossy(password),
        )
    }
}

/// Whether `mechanism` (as given to AUTHENTICATE) is supported.
pub fn is_supported(mechanism: &str) -> bool {
    mechanism.eq_ignore_ascii_case("PLAIN")
}

/// Decode the base64 client response of the PLAIN mechanism, which is
/// `authzid NUL authcid NUL password`.
///
/// Returns `None` if the response is malformed.
pub fn decode_plain(response: &[u8]) -> Option<Credentials> {
    let response = str::from_utf8(response).ok()?.trim();
    let decoded = base64::decode(response).ok()?;

    let mut parts = decoded.split(|&b| 0 == b);
    let authzid = str::from_utf8(parts.next()?).ok()?;
    let authcid = str::from_utf8(parts.next()?).ok()?;
    let secret = str::from_utf8(parts.next()?).ok()?;
    if parts.next().is_some() || authcid.is_empty() {
        return None;
    }

    Some(Credentials {
        authcid: authcid.to_owned(),
        secret: secret.to_owned(),
        authzid: Some(authzid.to_owned()).filter(|a| !a.is_empty()),
    })
}
