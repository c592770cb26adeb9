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

use std::io::{self, BufRead, Read, Write};

use log::{debug, info, warn};

use super::command::{Command, Tag};
use super::parse::{
    NotParseable, ParseBuffer, Progress, RequiresContinuation,
};
use super::response::{Response, ResponseCode};
use super::state::ConnectionState;
use crate::support::error::Error;
use crate::support::log_prefix::LogPrefix;

const MAX_CMDLINE: usize = 65536;

/// The transport loop of one connection.
///
/// Lines are read from `read` and fed to the command parser. Whenever the
/// parser stops at a literal, the payload and the rest of its line are read
/// and the whole command is parsed again with the payload queued.
pub struct Server {
    read: Box<dyn BufRead + Send>,
    write: Box<dyn Write + Send>,
    state: ConnectionState,
    log_prefix: LogPrefix,
    sent_bye: bool,
    bad_commands: u32,
}

impl Server {
    pub fn new<R: BufRead + Send + 'static, W: Write + Send + 'static>(
        read: R,
        write: W,
        state: ConnectionState,
        log_prefix: LogPrefix,
    ) -> Self {
        Server {
            read: Box::new(read),
            write: Box::new(write),
            state,
            log_prefix,
            sent_bye: false,
            bad_commands: 0,
        }
    }

    /// Run the server.
    ///
    /// Blocks until the client disconnects, an error occurs, or a BYE
    /// response has been sent.
    pub fn run(&mut self) -> Result<(), Error> {
        let greeting = self.state.greeting();
        self.send_response(greeting)?;

        while !self.sent_bye {
            let mut line = Vec::new();
            if !self.read_line(&mut line)? {
                if !self.sent_bye {
                    info!("{} Client disconnected", self.log_prefix);
                }
                break;
            }

            self.handle_line(line)?;
        }

        Ok(())
    }

    /// Parse and execute the command starting with `line`, reading any
    /// literals it contains.
    fn handle_line(&mut self, line: Vec<u8>) -> Result<(), Error> {
        let params = self.state.params();
        let mut continuations = Vec::<Vec<u8>>::new();

        loop {
            let parsed = Command::parse(
                ParseBuffer::new(&line, &continuations),
                &params,
            );
            let request = match parsed {
                Ok(Progress::Complete(command, _)) => {
                    return self.handle_command(command)
                }
                Ok(Progress::Suspended(request)) => request,
                Err(e) => return self.reject(&line, e),
            };

            let RequiresContinuation {
                length,
                literal_plus,
            } = request;
            // Only an authenticated client gets to send APPEND-sized data
            let limit = if self.state.is_authenticated() {
                params.max_append_len
            } else {
                Some(MAX_CMDLINE as u64)
            };
            if limit.map_or(false, |max| length > max) {
                return self.reject(
                    &line,
                    NotParseable::TooBig {
                        length,
                        literal_plus,
                    },
                );
            }

            if !literal_plus {
                let mut request = Response::continuation("Literal string");
                self.write_raw(&mut request)?;
            }

            let mut continuation = Vec::new();
            self.read_literal(length, &mut continuation)?;
            if !self.read_line(&mut continuation)? {
                return if self.sent_bye {
                    Ok(())
                } else {
                    Err(unexpected_eof("EOF after literal"))
                };
            }
            continuations.push(continuation);
        }
    }

    fn handle_command(&mut self, command: Command) -> Result<(), Error> {
        debug!("{} {} {}", self.log_prefix, command.tag, command.name);

        if self.state.wants_challenge(&command) {
            self.write_raw(&mut Response::continuation(""))?;

            let mut reply = Vec::new();
            if !self.read_line(&mut reply)? {
                return Err(unexpected_eof("EOF during AUTHENTICATE"));
            }
            strip_line_ending(&mut reply);

            let response = self.state.authenticate(command.tag, &reply)?;
            return self.send_response(response);
        }

        let response = self.state.handle(command)?;
        self.send_response(response)
    }

    /// Respond to a command that could not be parsed.
    fn reject(
        &mut self,
        line: &[u8],
        error: NotParseable,
    ) -> Result<(), Error> {
        debug!("{} Rejected command: {}", self.log_prefix, error);

        let tag = Tag::parse(ParseBuffer::from_bytes(line))
            .ok()
            .map(|(tag, _)| tag);

        let response = match (tag, error) {
            (Some(tag), NotParseable::BadCommand(verb)) => Response::bad(
                tag,
                format!("{}: Invalid arguments.", lossy(&verb)),
                None,
            ),
            (Some(tag), NotParseable::CommandNotFound(verb)) => Response::no(
                tag,
                format!("{} not implemented.", lossy(&verb)),
                None,
            ),
            (Some(tag), NotParseable::BadCharset(charset)) => Response::no(
                tag,
                format!("Unsupported charset {}.", charset),
                ResponseCode::of(Some(b"BADCHARSET")),
            ),
            (
                Some(tag),
                NotParseable::TooBig {
                    length,
                    literal_plus,
                },
            ) => {
                // Without LITERAL+ the client waits for a continuation
                // request, which it never gets.
                if literal_plus {
                    self.skip_literal(length)?;
                }
                Response::no(
                    tag,
                    "Literal exceeds the size limit.",
                    ResponseCode::of(Some(b"TOOBIG")),
                )
            }
            _ => Response::bad(Tag::untagged(), "Invalid command.", None),
        };

        self.send_response(response)
    }

    /// Read up to and including the next LF into `buf`.
    ///
    /// Returns `false` at EOF. A line longer than the command line limit
    /// makes the server send BYE.
    fn read_line(&mut self, buf: &mut Vec<u8>) -> Result<bool, Error> {
        let nread = self
            .read
            .by_ref()
            .take(MAX_CMDLINE as u64)
            .read_until(b'\n', buf)?;

        if 0 == nread {
            return Ok(false);
        }

        if !buf.ends_with(b"\n") {
            if MAX_CMDLINE == nread {
                warn!("{} Command line too long", self.log_prefix);
                self.send_response(Response::bye(
                    "Command line too long.",
                    None,
                ))?;
            }
            return Ok(false);
        }

        Ok(true)
    }

    fn read_literal(
        &mut self,
        length: u64,
        buf: &mut Vec<u8>,
    ) -> Result<(), Error> {
        let nread = self.read.by_ref().take(length).read_to_end(buf)?;
        if nread as u64 != length {
            return Err(unexpected_eof("EOF reading literal"));
        }

        Ok(())
    }

    /// Discard a refused `{n+}` literal and the rest of its line.
    fn skip_literal(&mut self, length: u64) -> Result<(), Error> {
        io::copy(&mut self.read.by_ref().take(length), &mut io::sink())?;
        let mut rest = Vec::new();
        self.read_line(&mut rest)?;
        Ok(())
    }

    /// Send a completion response, tracking consecutive BAD responses.
    fn send_response(&mut self, mut response: Response) -> Result<(), Error> {
        self.write_raw(&mut response)?;
        self.sent_bye |= response.is_terminal();

        if response.is_bad() {
            self.bad_commands += 1;
        } else {
            self.bad_commands = 0;
        }

        let limit = self.state.bad_command_limit();
        if !self.sent_bye && limit > 0 && self.bad_commands >= limit {
            warn!("{} Too many bad commands", self.log_prefix);
            self.write_raw(&mut Response::bye("Too many errors.", None))?;
            self.sent_bye = true;
        }

        Ok(())
    }

    fn write_raw(&mut self, response: &mut Response) -> Result<(), Error> {
        response.write_to(&mut self.write)?;
        self.write.flush()?;
        Ok(())
    }
}

fn strip_line_ending(line: &mut Vec<u8>) {
    if line.ends_with(b"\n") {
        line.pop();
    }
    if line.ends_with(b"\r") {
        line.pop();
    }
}

fn lossy(s: &[u8]) -> String {
    String::from_utf8_lossy(s).into_owned()
}

fn unexpected_eof(message: &'static str) -> Error {
    Error::Io(io::Error::new(io::ErrorKind::UnexpectedEof, message))
}
