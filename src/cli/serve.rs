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

use std::io;
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{error, info, warn};

use crate::backend::memory::MemoryLogin;
use crate::backend::Login;
use crate::imap::server::Server;
use crate::imap::state::ConnectionState;
use crate::support::log_prefix::LogPrefix;
use crate::support::system_config::SystemConfig;

// Use this and not eprintln! so that errors go to syslog/etc
macro_rules! fatal {
    ($ex:ident, $($stuff:tt)*) => {{
        error!($($stuff)*);
        crate::support::sysexits::$ex.exit()
    }}
}

const IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

pub fn serve(system_config: SystemConfig, config_dir: Option<PathBuf>) {
    init_logging(config_dir);

    let system_config = Arc::new(system_config);
    let login: Arc<dyn Login> = Arc::new(MemoryLogin::new(&system_config));

    let address = &system_config.listen.address;
    let listener = match TcpListener::bind(address) {
        Ok(listener) => listener,
        Err(e) => {
            fatal!(EX_UNAVAILABLE, "Failed to listen on {}: {}", address, e)
        }
    };

    info!("Listening on {}", address);
    if !system_config.demo.user.is_empty() {
        info!("Demo account: '{}'", system_config.demo.user);
    }

    for stream in listener.incoming() {
        let stream = match stream {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Failed to accept connection: {}", e);
                continue;
            }
        };

        let system_config = Arc::clone(&system_config);
        let login = Arc::clone(&login);
        thread::spawn(move || serve_connection(stream, system_config, login));
    }
}

fn serve_connection(
    stream: TcpStream,
    system_config: Arc<SystemConfig>,
    login: Arc<dyn Login>,
) {
    let peer_name = stream
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "unknown-socket".to_owned());
    let log_prefix = LogPrefix::new(peer_name);

    if let Err(e) = stream
        .set_read_timeout(Some(IDLE_TIMEOUT))
        .and_then(|_| stream.set_write_timeout(Some(IDLE_TIMEOUT)))
    {
        warn!("{} Unable to configure timeouts: {}", log_prefix, e);
    }
    let _ = stream.set_nodelay(true);

    let stream_out = match stream.try_clone() {
        Ok(s) => s,
        Err(e) => {
            warn!("{} Failed to duplicate socket handle: {}", log_prefix, e);
            return;
        }
    };

    info!("{} Connection established", log_prefix);

    let state =
        ConnectionState::new(log_prefix.clone(), system_config, login);
    let mut server = Server::new(
        io::BufReader::new(stream),
        io::BufWriter::new(stream_out),
        state,
        log_prefix.clone(),
    );

    match server.run() {
        Ok(_) => info!("{} Normal client disconnect", log_prefix),
        Err(e) => warn!("{} Abnormal client disconnect: {}", log_prefix, e),
    }
}

fn init_logging(config_dir: Option<PathBuf>) {
    if Ok(true) == nix::unistd::isatty(2) {
        // Running interactively; ignore logging configuration and just write
        // to stderr.
        crate::init_simple_log();
        return;
    }

    let log_config_file = config_dir.map(|dir| dir.join("logging.toml"));
    if let Some(log_config_file) = log_config_file.filter(|f| f.is_file()) {
        if let Err(e) = log4rs::init_file(
            &log_config_file,
            log4rs::file::Deserializers::new(),
        ) {
            eprintln!(
                "Failed to load '{}': {}",
                log_config_file.display(),
                e
            );
            crate::support::sysexits::EX_CONFIG.exit();
        }
        return;
    }

    let formatter = syslog::Formatter3164 {
        facility: syslog::Facility::LOG_MAIL,
        hostname: None,
        process: env!("CARGO_PKG_NAME").to_owned(),
        pid: nix::unistd::getpid().as_raw(),
    };

    match syslog::unix(formatter) {
        Ok(logger) => {
            let installed = log::set_boxed_logger(Box::new(
                syslog::BasicLogger::new(logger),
            ))
            .map(|_| log::set_max_level(log::LevelFilter::Info));
            if installed.is_err() {
                eprintln!("Failed to initialise logging");
                crate::support::sysexits::EX_SOFTWARE.exit();
            }
        }
        // No syslog daemon; fall back to stderr
        Err(_) => crate::init_simple_log(),
    }
}
