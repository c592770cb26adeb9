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

use std::io::{self, BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::sync::Arc;
use std::time::Duration;

use regex::Regex;

use crate::backend::memory::MemoryLogin;
use crate::backend::Login;
use crate::imap::server::Server;
use crate::imap::state::ConnectionState;
use crate::support::error::Error;
use crate::support::log_prefix::LogPrefix;
use crate::support::system_config::SystemConfig;

pub const USER: &str = "testuser";
pub const PASSWORD: &str = "testpass";

#[derive(Clone)]
pub struct Setup {
    config: Arc<SystemConfig>,
    login: Arc<dyn Login>,
}

pub fn set_up() -> Setup {
    set_up_with(|_| ())
}

/// Set up a backend with the demo data, after letting `configure` adjust
/// the configuration.
pub fn set_up_with(configure: impl FnOnce(&mut SystemConfig)) -> Setup {
    crate::init_test_log();

    let mut config = SystemConfig::default();
    config.demo.user = USER.to_owned();
    config.demo.password = PASSWORD.to_owned();
    config.imap.host_name = "imap.example.com".to_owned();
    configure(&mut config);

    let login = Arc::new(MemoryLogin::new(&config));
    Setup {
        config: Arc::new(config),
        login,
    }
}

impl Setup {
    pub fn connect(&self, name: &'static str) -> TestClient {
        let (server_io, client_io) = UnixStream::pair().unwrap();
        let server_out = server_io.try_clone().unwrap();
        let config = Arc::clone(&self.config);
        let login = Arc::clone(&self.login);

        std::thread::spawn(move || {
            let log_prefix = LogPrefix::new(name.to_owned());
            let state = ConnectionState::new(log_prefix.clone(), config, login);
            let mut server = Server::new(
                BufReader::new(server_io),
                server_out,
                state,
                log_prefix,
            );

            match server.run() {
                Ok(()) => (),
                Err(Error::Io(e))
                    if io::ErrorKind::UnexpectedEof == e.kind()
                        || io::ErrorKind::BrokenPipe == e.kind() => {}
                Err(e) => panic!("Unexpected server error: {}", e),
            }
        });

        // Fail instead of hanging if the server goes quiet
        client_io
            .set_read_timeout(Some(Duration::from_secs(10)))
            .unwrap();
        TestClient {
            read: BufReader::new(client_io.try_clone().unwrap()),
            write: client_io,
        }
    }
}

pub struct TestClient {
    read: BufReader<UnixStream>,
    write: UnixStream,
}

impl TestClient {
    pub fn write_raw(&mut self, data: &[u8]) {
        self.write.write_all(data).unwrap();
    }

    /// Read one line, without its line ending.
    ///
    /// Returns `None` if the server closed the connection.
    pub fn try_read_line(&mut self) -> Option<String> {
        let mut buf = Vec::new();
        self.read.read_until(b'\n', &mut buf).unwrap();
        if buf.is_empty() {
            return None;
        }

        assert!(
            buf.ends_with(b"\r\n"),
            "Line not terminated by CRLF: {:?}",
            String::from_utf8_lossy(&buf)
        );
        buf.truncate(buf.len() - 2);
        Some(String::from_utf8(buf).unwrap())
    }

    pub fn read_line(&mut self) -> String {
        self.try_read_line().expect("Unexpected EOF")
    }

    /// Send `command`, whose first word is its tag, and return every line
    /// up to and including the tagged response.
    pub fn command(&mut self, command: &str) -> Vec<String> {
        self.write_raw(command.as_bytes());
        self.write_raw(b"\r\n");
        let tag = command.split(' ').next().unwrap();
        self.read_until_tagged(tag)
    }

    pub fn read_until_tagged(&mut self, tag: &str) -> Vec<String> {
        let prefix = format!("{} ", tag);
        let mut lines = Vec::new();
        loop {
            let line = self.read_line();
            let done = line.starts_with(&prefix);
            lines.push(line);
            if done {
                return lines;
            }
        }
    }

    pub fn assert_closed(&mut self) {
        assert_eq!(None, self.try_read_line());
    }
}

pub fn receive_line_like(client: &mut TestClient, pat: &str) {
    let line = client.read_line();
    assert!(
        Regex::new(pat).unwrap().is_match(&line),
        "Expected\n\
         match: {:?}\n\
         Got:   {:?}\n",
        pat,
        line
    );
}

/// Assert that each line matches the regex at the same position.
pub fn assert_lines_like(patterns: &[&str], lines: &[String]) {
    assert_eq!(
        patterns.len(),
        lines.len(),
        "Expected {} lines, got {:#?}",
        patterns.len(),
        lines
    );
    for (pat, line) in patterns.iter().zip(lines) {
        assert!(
            Regex::new(pat).unwrap().is_match(line),
            "Expected\n\
             match: {:?}\n\
             Got:   {:?}\n",
            pat,
            line
        );
    }
}

pub fn assert_lines(expected: &[&str], lines: &[String]) {
    let lines = lines.iter().map(String::as_str).collect::<Vec<_>>();
    assert_eq!(expected, &lines[..]);
}

pub fn skip_greeting(client: &mut TestClient) {
    receive_line_like(client, r"^\* OK \[CAPABILITY IMAP4rev1 .*\] ");
}

pub fn quick_log_in(client: &mut TestClient) {
    skip_greeting(client);
    let lines = client.command(&format!("login1 LOGIN {} {}", USER, PASSWORD));
    assert_eq!(1, lines.len());
    assert!(lines[0].starts_with("login1 OK "));
}

pub fn quick_select(client: &mut TestClient, mailbox: &str) {
    let lines = client.command(&format!("select1 SELECT {}", mailbox));
    assert!(
        lines.last().unwrap().starts_with("select1 OK [READ-WRITE]"),
        "SELECT failed: {:#?}",
        lines
    );
}

/// Run a command and assert that it completes with OK, returning the
/// untagged responses.
macro_rules! ok_command {
    ($client:expr, $command:expr) => {{
        let command: &str = $command;
        let mut lines = $client.command(command);
        let tagged = lines.pop().unwrap();
        let tag = command.split(' ').next().unwrap();
        assert!(
            tagged.starts_with(&format!("{} OK ", tag)),
            "Command {:?} failed: {:?}",
            command,
            tagged
        );
        lines
    }};
}
