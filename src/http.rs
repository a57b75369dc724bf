// src/http.rs
//! Minimal HTTP/1.1 codec: two request shapes and a response reader that
//! understands `Content-Length` and chunked framing.

use crate::error::{Error, Result};
use crate::transport::Transport;

/// Upper bound on the header block before the response is rejected.
pub const MAX_HEADER_BYTES: usize = 64 * 1024;

const MAX_CHUNK_SIZE_LINE: usize = 1024;

/// The only two requests the bot ever sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Get { path: String },
    Post { path: String, payload: String },
}

impl Request {
    pub fn get(path: impl Into<String>) -> Self {
        Request::Get { path: path.into() }
    }

    pub fn post(path: impl Into<String>, payload: impl Into<String>) -> Self {
        Request::Post {
            path: path.into(),
            payload: payload.into(),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Request::Get { path } | Request::Post { path, .. } => path,
        }
    }

    pub fn method(&self) -> &'static str {
        match self {
            Request::Get { .. } => "GET",
            Request::Post { .. } => "POST",
        }
    }

    /// Serialize the request. `authorization` is the full header value,
    /// e.g. `Bearer abc`.
    pub fn encode(&self, host: &str, authorization: &str) -> Vec<u8> {
        let mut out = format!(
            "{} {} HTTP/1.1\r\nHost: {host}\r\nAuthorization: {authorization}\r\n",
            self.method(),
            self.path()
        );
        if let Request::Post { payload, .. } = self {
            let body = post_body(payload);
            out.push_str(&format!("Content-Length: {}\r\n", body.len()));
            out.push_str("Content-Type: application/json\r\n\r\n");
            out.push_str(&body);
        } else {
            out.push_str("\r\n");
        }
        out.into_bytes()
    }
}

/// JSON body of a message-create POST, including its trailing blank line.
pub fn post_body(payload: &str) -> String {
    let content = serde_json::Value::String(payload.to_string());
    format!("{{\"content\": {content}}}\r\n\r\n")
}

/// A parsed HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    /// First header with the given name, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Framing {
    Chunked,
    Length(usize),
    Empty,
}

/// Reads responses off a persistent connection. Bytes received past the end
/// of one response are kept and consumed by the next call.
#[derive(Debug, Default)]
pub struct ResponseReader {
    pending: Vec<u8>,
}

impl ResponseReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes already received that belong to a later response.
    pub fn buffered(&self) -> usize {
        self.pending.len()
    }

    pub fn read_response<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Result<Response> {
        let mut raw = std::mem::take(&mut self.pending);

        let header_end = loop {
            if let Some(pos) = find(&raw, b"\r\n\r\n") {
                break pos;
            }
            if raw.len() > MAX_HEADER_BYTES {
                return Err(Error::MalformedResponse(format!(
                    "no end of headers within {MAX_HEADER_BYTES} bytes"
                )));
            }
            raw.extend_from_slice(&transport.read_chunk()?);
        };

        let rest = raw.split_off(header_end + 4);
        raw.truncate(header_end + 2);
        let (status, headers) = parse_head(&raw)?;

        let (body, surplus) = match framing(&headers)? {
            Framing::Chunked => read_chunked(transport, rest)?,
            Framing::Length(len) => read_sized(transport, rest, len)?,
            Framing::Empty => (Vec::new(), rest),
        };
        self.pending = surplus;

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}

/// Parse the status line and `name: value` lines of a header block that ends
/// with a single `\r\n`.
fn parse_head(head: &[u8]) -> Result<(u16, Vec<(String, String)>)> {
    let text = String::from_utf8_lossy(head);
    let mut lines = text.split("\r\n");

    let status_line = lines.next().unwrap_or_default();
    let status = parse_status_line(status_line)?;

    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect();

    Ok((status, headers))
}

fn parse_status_line(line: &str) -> Result<u16> {
    let code = line
        .strip_prefix("HTTP/1.1 ")
        .ok_or_else(|| Error::MalformedResponse(format!("bad status line {line:?}")))?;
    let digits = code.get(..3).unwrap_or_default();
    if digits.len() != 3 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::MalformedResponse(format!(
            "bad status code in {line:?}"
        )));
    }
    digits
        .parse()
        .map_err(|_| Error::MalformedResponse(format!("bad status code in {line:?}")))
}

/// Single pass over the headers; the first framing header wins.
fn framing(headers: &[(String, String)]) -> Result<Framing> {
    for (name, value) in headers {
        if name.eq_ignore_ascii_case("Transfer-Encoding") && value.eq_ignore_ascii_case("chunked") {
            return Ok(Framing::Chunked);
        }
        if name.eq_ignore_ascii_case("Content-Length") {
            let len = value.parse().map_err(|_| {
                Error::MalformedResponse(format!("bad Content-Length {value:?}"))
            })?;
            return Ok(Framing::Length(len));
        }
    }
    Ok(Framing::Empty)
}

fn read_sized<T: Transport + ?Sized>(
    transport: &mut T,
    mut body: Vec<u8>,
    len: usize,
) -> Result<(Vec<u8>, Vec<u8>)> {
    while body.len() < len {
        body.extend_from_slice(&transport.read_chunk()?);
    }
    let surplus = body.split_off(len);
    Ok((body, surplus))
}

fn read_chunked<T: Transport + ?Sized>(
    transport: &mut T,
    mut raw: Vec<u8>,
) -> Result<(Vec<u8>, Vec<u8>)> {
    let mut decoder = ChunkedDecoder::default();
    loop {
        let used = decoder.decode(&raw)?;
        raw.drain(..used);
        if decoder.is_done() {
            return Ok((decoder.body, raw));
        }
        raw.extend_from_slice(&transport.read_chunk()?);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkState {
    Size,
    Data(usize),
    DataEnd,
    Trailer,
    Done,
}

/// Incremental chunked-body decoder. Chunk boundaries need not line up with
/// read boundaries.
#[derive(Debug)]
struct ChunkedDecoder {
    body: Vec<u8>,
    state: ChunkState,
}

impl Default for ChunkedDecoder {
    fn default() -> Self {
        Self {
            body: Vec::new(),
            state: ChunkState::Size,
        }
    }
}

impl ChunkedDecoder {
    fn is_done(&self) -> bool {
        self.state == ChunkState::Done
    }

    /// Consume as much of `buf` as possible, returning how many bytes were used.
    fn decode(&mut self, buf: &[u8]) -> Result<usize> {
        let mut pos = 0;
        loop {
            let avail = &buf[pos..];
            match self.state {
                ChunkState::Size => {
                    let Some(eol) = find(avail, b"\r\n") else {
                        if avail.len() > MAX_CHUNK_SIZE_LINE {
                            return Err(Error::MalformedResponse(
                                "chunk size line too long".to_string(),
                            ));
                        }
                        return Ok(pos);
                    };
                    let size = parse_chunk_size(&avail[..eol])?;
                    pos += eol + 2;
                    self.state = if size == 0 {
                        ChunkState::Trailer
                    } else {
                        ChunkState::Data(size)
                    };
                }
                ChunkState::Data(remaining) => {
                    if avail.is_empty() {
                        return Ok(pos);
                    }
                    let take = remaining.min(avail.len());
                    self.body.extend_from_slice(&avail[..take]);
                    pos += take;
                    self.state = if take == remaining {
                        ChunkState::DataEnd
                    } else {
                        ChunkState::Data(remaining - take)
                    };
                }
                ChunkState::DataEnd => {
                    if avail.len() < 2 {
                        return Ok(pos);
                    }
                    if &avail[..2] != b"\r\n" {
                        return Err(Error::MalformedResponse(
                            "chunk data not followed by CRLF".to_string(),
                        ));
                    }
                    pos += 2;
                    self.state = ChunkState::Size;
                }
                ChunkState::Trailer => {
                    let Some(eol) = find(avail, b"\r\n") else {
                        return Ok(pos);
                    };
                    pos += eol + 2;
                    // An empty line ends the trailer section.
                    if eol == 0 {
                        self.state = ChunkState::Done;
                    }
                }
                ChunkState::Done => return Ok(pos),
            }
        }
    }
}

fn parse_chunk_size(line: &[u8]) -> Result<usize> {
    let text = std::str::from_utf8(line)
        .map_err(|_| Error::MalformedResponse("chunk size is not ASCII".to_string()))?;
    let digits = text.split(';').next().unwrap_or_default().trim();
    usize::from_str_radix(digits, 16)
        .map_err(|_| Error::MalformedResponse(format!("bad chunk size {digits:?}")))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
