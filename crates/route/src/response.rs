use http::{HeaderMap, StatusCode};
use std::io::{self, Write};

/// Writes one response to an [`io::Write`] sink supplied by the host:
/// a status line, name-ordered header lines, and a single body write.
///
/// The write-once guard makes emission idempotent: the first [`send`] wins
/// and every later attempt is a no-op.
///
/// [`send`]: ResponseWriter::send
#[derive(Debug)]
pub struct ResponseWriter<W: Write> {
    sink: W,
    protocol_name: String,
    protocol_version: String,
    sent: bool,
}

impl<W: Write> ResponseWriter<W> {
    pub fn new(sink: W) -> Self {
        Self::with_protocol(sink, "HTTP", "1.1")
    }

    pub fn with_protocol(sink: W, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            sink,
            protocol_name: name.into(),
            protocol_version: version.into(),
            sent: false,
        }
    }

    pub fn is_sent(&self) -> bool {
        self.sent
    }

    /// Emits the response in one buffered write. Returns `Ok(false)` without
    /// touching the sink when a response has already been sent.
    pub fn send(&mut self, status: StatusCode, headers: &HeaderMap, body: &[u8]) -> io::Result<bool> {
        if self.sent {
            return Ok(false);
        }

        let mut message = Vec::with_capacity(128 + body.len());

        write!(
            message,
            "{}/{} {} {}\r\n",
            self.protocol_name,
            self.protocol_version,
            status.as_u16(),
            status.canonical_reason().unwrap_or("")
        )?;

        let mut lines: Vec<_> = headers.iter().collect();
        lines.sort_by_key(|(name, _)| name.as_str());

        for (name, value) in lines {
            write!(message, "{name}: ")?;
            message.extend_from_slice(value.as_bytes());
            message.extend_from_slice(b"\r\n");
        }

        message.extend_from_slice(b"\r\n");
        message.extend_from_slice(body);

        self.sink.write_all(&message)?;
        self.sink.flush()?;
        self.sent = true;

        Ok(true)
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}
