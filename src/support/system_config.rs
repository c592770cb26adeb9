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

use std::ffi::CStr;

use serde::{Deserialize, Serialize};

/// The configuration for a Redmap server process.
///
/// This is normally stored in a file named `redmap.toml`; every section may
/// be omitted, in which case the defaults described below apply.
#[derive(Clone, Debug, Deserialize, Serialize, Default)]
pub struct SystemConfig {
    /// Protocol-level behaviour of the IMAP engine.
    #[serde(default)]
    pub imap: ImapConfig,

    /// Where to accept connections.
    #[serde(default)]
    pub listen: ListenConfig,

    /// The built-in account served by the in-memory backend.
    #[serde(default)]
    pub demo: DemoConfig,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ImapConfig {
    /// The host name to put in the greeting.
    ///
    /// If empty, the system host name is used.
    pub host_name: String,

    /// The largest message, in bytes, that APPEND will accept.
    ///
    /// This is advertised to clients through the `APPENDLIMIT=` capability.
    /// Larger literals are refused before the client sends them.
    pub max_append_len: u64,

    /// The number of consecutive unparseable commands after which the client
    /// is disconnected. 0 disables the limit.
    pub bad_command_limit: u32,

    /// SEARCH keys which the backend refuses to evaluate, e.g. `"DRAFT"`.
    ///
    /// Searches using them fail with a `[CANNOT]` response.
    pub disable_search_keys: Vec<String>,

    /// Whether to advertise `LITERAL+`.
    pub literal_plus: bool,
}

impl Default for ImapConfig {
    fn default() -> Self {
        ImapConfig {
            host_name: String::new(),
            max_append_len: 1_000_000_000,
            bad_command_limit: 5,
            disable_search_keys: Vec::new(),
            literal_plus: true,
        }
    }
}

impl ImapConfig {
    /// The host name to present to clients.
    pub fn effective_host_name(&self) -> String {
        if !self.host_name.is_empty() {
            return self.host_name.clone();
        }

        let mut buf = [0u8; 256];
        nix::unistd::gethostname(&mut buf)
            .ok()
            .and_then(|name: &CStr| name.to_str().ok())
            .filter(|name| !name.is_empty())
            .unwrap_or("localhost")
            .to_owned()
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenConfig {
    /// The socket address for `serve` to bind.
    pub address: String,
}

impl Default for ListenConfig {
    fn default() -> Self {
        ListenConfig {
            address: "127.0.0.1:1143".to_owned(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct DemoConfig {
    /// The user name accepted by LOGIN and AUTHENTICATE.
    pub user: String,
    /// The password for `user`.
    pub password: String,
    /// If true, INBOX is populated with a handful of sample messages.
    pub data: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        DemoConfig {
            user: "demouser".to_owned(),
            password: "demopass".to_owned(),
            data: true,
        }
    }
}
