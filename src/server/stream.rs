// Connection stream module
// Patches response heads that hyper writes on its own, without the service

use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{ready, Context, Poll};

use hyper::body::Body;
use hyper::{Method, Response, StatusCode};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

const HEAD_END: &[u8] = b"\r\n\r\n";

/// Body lengths of the responses the service produced, in write order
///
/// A response head with no matching entry was written by hyper itself: the
/// 400/431/414 it sends when a request head cannot be parsed.
#[derive(Debug, Default)]
pub struct ResponseLedger {
    body_lengths: Mutex<VecDeque<u64>>,
}

impl ResponseLedger {
    /// Record a response about to be handed to hyper
    pub fn record<B: Body>(&self, method: &Method, response: &Response<B>) {
        let bodiless = *method == Method::HEAD
            || matches!(
                response.status(),
                StatusCode::NO_CONTENT | StatusCode::NOT_MODIFIED
            );
        let len = if bodiless {
            0
        } else {
            response.body().size_hint().exact().unwrap_or(0)
        };
        self.queue().push_back(len);
    }

    fn next(&self) -> Option<u64> {
        self.queue().pop_front()
    }

    fn queue(&self) -> MutexGuard<'_, VecDeque<u64>> {
        self.body_lengths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Stream wrapper that adds the header lines to every response head not
/// accounted for in the ledger. Reads pass through untouched.
pub struct HeaderGuardStream<S> {
    inner: S,
    ledger: Arc<ResponseLedger>,
    header_lines: Vec<u8>,
    /// Head bytes accepted from hyper, not complete yet
    head: Vec<u8>,
    /// Body bytes of the current response still to pass through
    body_remaining: u64,
    /// Completed head waiting to reach `inner`
    pending: Vec<u8>,
}

impl<S> HeaderGuardStream<S> {
    pub const fn new(inner: S, ledger: Arc<ResponseLedger>, header_lines: Vec<u8>) -> Self {
        Self {
            inner,
            ledger,
            header_lines,
            head: Vec::new(),
            body_remaining: 0,
            pending: Vec::new(),
        }
    }

    /// Take head bytes from `buf`; returns how many were consumed
    fn buffer_head(&mut self, buf: &[u8]) -> usize {
        let already = self.head.len();
        self.head.extend_from_slice(buf);

        // The terminator may straddle two writes
        let search_from = already.saturating_sub(HEAD_END.len() - 1);
        let Some(pos) = find(&self.head[search_from..], HEAD_END) else {
            return buf.len();
        };
        let end = search_from + pos + HEAD_END.len();
        self.head.truncate(end);

        let head = std::mem::take(&mut self.head);
        self.finish_head(head);
        end - already
    }

    fn finish_head(&mut self, mut head: Vec<u8>) {
        if !is_informational(&head) {
            match self.ledger.next() {
                Some(len) => self.body_remaining = len,
                None => {
                    // Before the blank line that ends the head
                    let at = head.len() - 2;
                    head.splice(at..at, self.header_lines.iter().copied());
                }
            }
        }
        self.pending.extend_from_slice(&head);
    }
}

impl<S: AsyncWrite + Unpin> HeaderGuardStream<S> {
    fn poll_drain(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        while !self.pending.is_empty() {
            let n = ready!(Pin::new(&mut self.inner).poll_write(cx, &self.pending))?;
            if n == 0 {
                return Poll::Ready(Err(io::ErrorKind::WriteZero.into()));
            }
            self.pending.drain(..n);
        }
        Poll::Ready(Ok(()))
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for HeaderGuardStream<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_read(cx, buf)
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for HeaderGuardStream<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        ready!(this.poll_drain(cx))?;

        if this.body_remaining > 0 {
            let len = buf
                .len()
                .min(usize::try_from(this.body_remaining).unwrap_or(usize::MAX));
            let written = ready!(Pin::new(&mut this.inner).poll_write(cx, &buf[..len]))?;
            this.body_remaining -= written as u64;
            return Poll::Ready(Ok(written));
        }

        Poll::Ready(Ok(this.buffer_head(buf)))
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        ready!(this.poll_drain(cx))?;
        Pin::new(&mut this.inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        ready!(this.poll_drain(cx))?;
        Pin::new(&mut this.inner).poll_shutdown(cx)
    }
}

/// `100 Continue` and friends precede the real response
fn is_informational(head: &[u8]) -> bool {
    head.starts_with(b"HTTP/") && head.get(9) == Some(&b'1')
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
