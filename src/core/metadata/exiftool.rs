//! Long-lived `exiftool -stay_open` process used for formats the native
//! parser does not understand (videos, RAW files).

use super::MetadataFallback;
use crate::core::exif::parse_exif_datetime;
use chrono::NaiveDateTime;
use serde_json::Value;
use std::collections::HashMap;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::Mutex;

/// Tags consulted in order; the first parseable one wins
const DATE_KEYS: [&str; 3] = ["DateTimeOriginal", "CreateDate", "MediaCreateDate"];

const READY_MARKER: &str = "{ready}";

/// Fallback backed by a single exiftool process.
///
/// The process is started on first use. If it cannot be started the failure
/// is remembered and every later lookup returns `None` immediately.
pub struct ExifTool {
    binary: PathBuf,
    state: Mutex<State>,
}

enum State {
    NotStarted,
    Running(Process),
    Unavailable,
}

struct Process {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl ExifTool {
    pub fn new() -> Self {
        Self::with_binary("exiftool")
    }

    /// Use a specific exiftool executable
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            state: Mutex::new(State::NotStarted),
        }
    }

    /// Whether a previous start attempt failed
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self.state.lock().as_deref(),
            Ok(State::Unavailable) | Err(_)
        )
    }

    fn spawn(&self) -> io::Result<Process> {
        let mut child = Command::new(&self.binary)
            .args(["-stay_open", "True", "-@", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "exiftool stdin unavailable"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "exiftool stdout unavailable"))?;

        Ok(Process {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        })
    }
}

impl Default for ExifTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Process {
    /// Run one `-execute` round-trip and return everything before `{ready}`
    fn request(&mut self, path: &Path) -> io::Result<String> {
        let mut command = String::from("-json\n");
        for key in DATE_KEYS {
            command.push('-');
            command.push_str(key);
            command.push('\n');
        }
        command.push_str(&path.to_string_lossy());
        command.push_str("\n-execute\n");

        self.stdin.write_all(command.as_bytes())?;
        self.stdin.flush()?;

        let mut output = String::new();
        let mut line = String::new();
        loop {
            line.clear();
            if self.stdout.read_line(&mut line)? == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "exiftool exited mid-request",
                ));
            }
            if line.trim_end() == READY_MARKER {
                return Ok(output);
            }
            output.push_str(&line);
        }
    }

    fn shutdown(&mut self) {
        let _ = self.stdin.write_all(b"-stay_open\nFalse\n");
        let _ = self.stdin.flush();
        let _ = self.child.wait();
    }
}

impl MetadataFallback for ExifTool {
    fn fetch(&self, path: &Path) -> Option<NaiveDateTime> {
        let Ok(mut state) = self.state.lock() else {
            return None;
        };

        if matches!(*state, State::NotStarted) {
            *state = match self.spawn() {
                Ok(process) => {
                    tracing::debug!(binary = %self.binary.display(), "Started exiftool");
                    State::Running(process)
                }
                Err(e) => {
                    tracing::debug!(
                        binary = %self.binary.display(),
                        error = %e,
                        "exiftool unavailable, fallback disabled"
                    );
                    State::Unavailable
                }
            };
        }

        let State::Running(process) = &mut *state else {
            return None;
        };

        match process.request(path) {
            Ok(output) => parse_response(&output),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "exiftool request failed");
                process.shutdown();
                *state = State::Unavailable;
                None
            }
        }
    }
}

impl Drop for ExifTool {
    fn drop(&mut self) {
        if let Ok(state) = self.state.get_mut() {
            if let State::Running(process) = state {
                process.shutdown();
            }
        }
    }
}

/// Pick the first parseable date out of exiftool's JSON array output
fn parse_response(output: &str) -> Option<NaiveDateTime> {
    let records: Vec<HashMap<String, Value>> = serde_json::from_str(output).ok()?;

    records.iter().find_map(|record| {
        DATE_KEYS.iter().find_map(|key| {
            record
                .get(*key)
                .and_then(Value::as_str)
                .and_then(|raw| parse_exif_datetime(raw).ok())
        })
    })
}
