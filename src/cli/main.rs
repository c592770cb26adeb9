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

use std::fs;
use std::path::{Path, PathBuf};

use structopt::StructOpt;

use crate::support::sysexits::*;
use crate::support::system_config::SystemConfig;

#[derive(StructOpt)]
#[structopt(max_term_width = 80)]
enum Command {
    /// Accept IMAP connections over plain TCP.
    ///
    /// Every connection is served by its own thread. All connections share
    /// one in-memory mail store holding the configured demo account; nothing
    /// is persisted when the process exits.
    Serve(ConfigOptions),
    /// Load the configuration and print it with all defaults filled in.
    CheckConfig(ConfigOptions),
}

#[derive(StructOpt, Default)]
struct ConfigOptions {
    /// Path to `redmap.toml`. A `logging.toml` in the same directory
    /// configures logging when not running on a terminal.
    /// [default: built-in configuration]
    #[structopt(long, parse(from_os_str))]
    config: Option<PathBuf>,
}

pub fn main() {
    // Clap exits with status 1 instead of EX_USAGE if we use the more concise
    // API
    let cmd = Command::from_clap(&match Command::clap().get_matches_safe() {
        Ok(matches) => matches,
        Err(
            e @ clap::Error {
                kind: clap::ErrorKind::HelpDisplayed,
                ..
            },
        )
        | Err(
            e @ clap::Error {
                kind: clap::ErrorKind::VersionDisplayed,
                ..
            },
        ) => {
            println!("{}", e.message);
            return;
        }
        Err(e) => {
            eprintln!("{}", e.message);
            EX_USAGE.exit()
        }
    });

    match cmd {
        Command::Serve(options) => {
            let config = config_or_exit(options.config.as_deref());
            let config_dir = options
                .config
                .as_deref()
                .and_then(Path::parent)
                .map(Path::to_owned);
            super::serve::serve(config, config_dir);
        }

        Command::CheckConfig(options) => {
            let config = config_or_exit(options.config.as_deref());
            match toml::to_string_pretty(&config) {
                Ok(s) => print!("{}", s),
                Err(e) => {
                    eprintln!("Unable to format configuration: {}", e);
                    EX_SOFTWARE.exit()
                }
            }
        }
    }
}

fn config_or_exit(path: Option<&Path>) -> SystemConfig {
    match path {
        None => SystemConfig::default(),
        Some(path) => load_config(path).unwrap_or_else(|e| {
            eprintln!("{}", e);
            EX_CONFIG.exit()
        }),
    }
}

/// Read and parse the configuration file at `path`, describing any failure
/// in a message for the operator.
fn load_config(path: &Path) -> Result<SystemConfig, String> {
    let toml = fs::read(path)
        .map_err(|e| format!("Error reading '{}': {}", path.display(), e))?;
    toml::from_slice(&toml).map_err(|e| {
        format!("Error in config file at '{}': {}", path.display(), e)
    })
}
