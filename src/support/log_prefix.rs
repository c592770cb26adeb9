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

use std::fmt;
use std::sync::{Arc, Mutex};

/// Text included at the start of every log line about one connection.
///
/// Clones share the same underlying data, so the user name set by the
/// connection state shows up in lines logged by the transport loop too.
#[derive(Clone)]
pub struct LogPrefix {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    peer: String,
    user: Option<String>,
}

impl LogPrefix {
    pub fn new(peer: String) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                peer: sanitise(peer),
                user: None,
            })),
        }
    }

    pub fn set_user(&self, user: String) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.user = Some(sanitise(user));
        }
    }

    pub fn clear_user(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.user = None;
        }
    }
}

impl fmt::Display for LogPrefix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let inner = match self.inner.lock() {
            Ok(inner) => inner,
            Err(_) => return write!(f, "<poisoned>"),
        };
        write!(f, "{}", inner.peer)?;
        if let Some(ref user) = inner.user {
            write!(f, "[{}]", user)?;
        }

        Ok(())
    }
}

fn sanitise(mut s: String) -> String {
    s.retain(|c| !c.is_control());
    if let Some((truncate_len, _)) = s.char_indices().nth(64) {
        s.truncate(truncate_len);
    }

    s
}
