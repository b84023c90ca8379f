use bytes::Buf;
use bytes::Bytes;
use bytes::BytesMut;
use memchr::memchr2;
use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;

use crate::telnet::IacFilter;

pub const DEFAULT_MAX_LINE_LEN: usize = 1024;

/// One step of client input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Line(String),
    /// Telnet negotiation replies to write back to the peer.
    Replies(Bytes),
    Eof,
}

/// Reads text lines from a client stream.
///
/// `\n`, `\r`, `\r\n` and `\r\0` all end a line. Invalid UTF-8 is replaced rather than
/// rejected; the protocol is human text.
#[derive(Debug)]
pub struct LineReader<R> {
    inner: R,
    buf: BytesMut,
    replies: BytesMut,
    telnet: Option<IacFilter>,
    max_line_len: usize,
    // Last line ended on a bare `\r` at the end of the buffer; swallow a following `\n`/`\0`.
    pending_cr: bool,
    eof: bool,
}

impl<R> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(4 * 1024),
            replies: BytesMut::new(),
            telnet: None,
            max_line_len: DEFAULT_MAX_LINE_LEN,
            pending_cr: false,
            eof: false,
        }
    }

    pub fn max_line_len(mut self, max: usize) -> Self {
        self.max_line_len = max.max(1);
        self
    }

    /// Strip telnet negotiation from the stream and queue refusals (see [`Self::take_replies`]).
    pub fn telnet(mut self, on: bool) -> Self {
        self.telnet = on.then(IacFilter::new);
        self
    }

    /// Negotiation replies produced so far, if any. The caller writes them back to the peer.
    pub fn take_replies(&mut self) -> Option<Bytes> {
        if self.replies.is_empty() {
            None
        } else {
            Some(self.replies.split().freeze())
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn pop_line(&mut self) -> std::io::Result<Option<String>> {
        if self.pending_cr && !self.buf.is_empty() {
            if matches!(self.buf[0], b'\n' | 0) {
                self.buf.advance(1);
            }
            self.pending_cr = false;
        }

        let Some(i) = memchr2(b'\n', b'\r', &self.buf) else {
            return Ok(None);
        };
        if i > self.max_line_len {
            return Err(too_long());
        }
        let line = self.buf.split_to(i);
        let eol = self.buf[0];
        self.buf.advance(1);
        if eol == b'\r' {
            match self.buf.first() {
                Some(b'\n' | 0) => self.buf.advance(1),
                Some(_) => {}
                None => self.pending_cr = true,
            }
        }
        Ok(Some(String::from_utf8_lossy(&line).into_owned()))
    }

    /// A line or end of input from what is already buffered, if there is one.
    fn buffered(&mut self) -> std::io::Result<Option<Input>> {
        if let Some(line) = self.pop_line()? {
            return Ok(Some(Input::Line(line)));
        }
        if self.buf.len() > self.max_line_len {
            return Err(too_long());
        }
        if self.eof {
            if self.buf.is_empty() {
                return Ok(Some(Input::Eof));
            }
            let tail = self.buf.split();
            return Ok(Some(Input::Line(String::from_utf8_lossy(&tail).into_owned())));
        }
        Ok(None)
    }
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    /// Read one line without its terminator.
    ///
    /// Returns:
    /// - `Ok(Some(line))` for a line (may be empty),
    /// - `Ok(None)` once the peer has closed and everything buffered was returned.
    ///
    /// An unterminated tail at EOF is returned as a final line. Telnet replies stay queued
    /// for [`LineReader::take_replies`].
    pub async fn read_line(&mut self) -> std::io::Result<Option<String>> {
        loop {
            match self.buffered()? {
                Some(Input::Line(line)) => return Ok(Some(line)),
                Some(Input::Eof) => return Ok(None),
                Some(Input::Replies(_)) | None => self.fill().await?,
            }
        }
    }

    /// Like [`LineReader::read_line`], but hands back telnet replies as soon as the read that
    /// produced them completes, ahead of any line.
    ///
    /// Cancel safe: nothing read from the stream is lost if the future is dropped.
    pub async fn next_input(&mut self) -> std::io::Result<Input> {
        loop {
            if let Some(replies) = self.take_replies() {
                return Ok(Input::Replies(replies));
            }
            match self.buffered()? {
                Some(input) => return Ok(input),
                None => self.fill().await?,
            }
        }
    }

    async fn fill(&mut self) -> std::io::Result<()> {
        let mut chunk = [0u8; 2048];
        let n = self.inner.read(&mut chunk).await?;
        if n == 0 {
            self.eof = true;
            return Ok(());
        }
        match self.telnet.as_mut() {
            Some(f) => f.feed(&chunk[..n], &mut self.buf, &mut self.replies),
            None => self.buf.extend_from_slice(&chunk[..n]),
        }
        Ok(())
    }
}

fn too_long() -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidData, "line too long")
}

/// Encode one outbound message. Embedded newlines are kept; exactly one trailing `\n` is added.
pub fn encode_line(msg: &str) -> Bytes {
    let body = msg.trim_end_matches(['\r', '\n']);
    let mut b = BytesMut::with_capacity(body.len() + 1);
    b.extend_from_slice(body.as_bytes());
    b.extend_from_slice(b"\n");
    b.freeze()
}
