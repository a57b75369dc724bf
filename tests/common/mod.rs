// tests/common/mod.rs
// In-memory transport that replays scripted reads and records writes.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use isabot::config::AgentConfig;
use isabot::error::{Error, Result};
use isabot::transport::Transport;

pub type WriteLog = Rc<RefCell<Vec<Vec<u8>>>>;

#[derive(Default)]
pub struct ScriptedTransport {
    reads: VecDeque<Vec<u8>>,
    writes: WriteLog,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one read returning exactly these bytes.
    pub fn push_read(&mut self, bytes: &[u8]) -> &mut Self {
        self.reads.push_back(bytes.to_vec());
        self
    }

    /// Queue `bytes` split into reads of at most `size` bytes.
    pub fn push_split(&mut self, bytes: &[u8], size: usize) -> &mut Self {
        for chunk in bytes.chunks(size.max(1)) {
            self.reads.push_back(chunk.to_vec());
        }
        self
    }

    /// Queue `bytes` cut at the given offsets.
    pub fn push_cut(&mut self, bytes: &[u8], cuts: &[usize]) -> &mut Self {
        let mut start = 0;
        for &cut in cuts {
            let cut = cut.clamp(start, bytes.len());
            if cut > start {
                self.reads.push_back(bytes[start..cut].to_vec());
            }
            start = cut;
        }
        if start < bytes.len() {
            self.reads.push_back(bytes[start..].to_vec());
        }
        self
    }

    pub fn write_log(&self) -> WriteLog {
        Rc::clone(&self.writes)
    }

    pub fn pending_reads(&self) -> usize {
        self.reads.len()
    }

    pub fn requests(&self) -> Vec<String> {
        requests(&self.writes)
    }
}

pub fn requests(log: &WriteLog) -> Vec<String> {
    log.borrow()
        .iter()
        .map(|w| String::from_utf8_lossy(w).into_owned())
        .collect()
}

/// Request line (e.g. `GET /api/users/@me HTTP/1.1`) of every request sent.
pub fn request_lines(log: &WriteLog) -> Vec<String> {
    requests(log)
        .iter()
        .map(|r| r.lines().next().unwrap_or_default().to_string())
        .collect()
}

impl Transport for ScriptedTransport {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.writes.borrow_mut().push(bytes.to_vec());
        Ok(())
    }

    fn read_chunk(&mut self) -> Result<Vec<u8>> {
        self.reads.pop_front().ok_or(Error::EmptyRead)
    }
}

pub fn json_response(status: u16, body: &str) -> Vec<u8> {
    format!(
        "HTTP/1.1 {status} OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    )
    .into_bytes()
}

pub fn chunked_response(status: u16, body: &str, chunk: usize) -> Vec<u8> {
    let mut out = format!(
        "HTTP/1.1 {status} OK\r\nContent-Type: application/json\r\nTransfer-Encoding: chunked\r\n\r\n"
    )
    .into_bytes();
    for piece in body.as_bytes().chunks(chunk.max(1)) {
        out.extend_from_slice(format!("{:x}\r\n", piece.len()).as_bytes());
        out.extend_from_slice(piece);
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b"0\r\n\r\n");
    out
}

pub fn empty_response(status: u16) -> Vec<u8> {
    format!("HTTP/1.1 {status} Whatever\r\nContent-Length: 0\r\n\r\n").into_bytes()
}

/// Config with zero delays so retries do not slow tests down.
pub fn test_config() -> AgentConfig {
    AgentConfig {
        poll_interval_ms: 0,
        backoff_ms: 0,
        ..Default::default()
    }
}
