//! In-process session pair for tests and local loopback.
//!
//! [`MemorySession::pair`] returns two connected sessions. Each logical stream
//! is a pair of bounded byte pipes, one per direction, so writers block when
//! the peer does not drain its side. Stream identifiers follow the usual
//! convention: the client side opens odd IDs starting at 1 and the server side
//! even IDs starting at 2.

use std::collections::VecDeque;
use std::fmt;
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, select};
use tracing::{debug, trace};

use crate::LOG_TARGET;
use crate::error::SessionError;
use crate::stream::{LogicalStream, StreamId, StreamSession};

/// Per-direction buffer size used by [`MemorySession::pair`].
pub const DEFAULT_PIPE_CAPACITY: usize = 64 * 1024;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct PipeState {
    buf: VecDeque<u8>,
    closed: bool,
}

/// One direction of a logical stream.
struct Pipe {
    state: Mutex<PipeState>,
    readable: Condvar,
    writable: Condvar,
    capacity: usize,
}

impl Pipe {
    fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(PipeState::default()),
            readable: Condvar::new(),
            writable: Condvar::new(),
            capacity: capacity.max(1),
        }
    }

    /// Returns `None` when `timeout` elapses before data or end of stream.
    fn read(&self, buf: &mut [u8], timeout: Option<Duration>) -> Option<usize> {
        let deadline = timeout.and_then(|timeout| Instant::now().checked_add(timeout));
        let mut state = lock(&self.state);
        loop {
            if !state.buf.is_empty() {
                let n = buf.len().min(state.buf.len());
                for (dst, src) in buf.iter_mut().zip(state.buf.drain(..n)) {
                    *dst = src;
                }
                self.writable.notify_all();
                return Some(n);
            }
            if state.closed {
                return Some(0);
            }
            state = match deadline {
                None => self
                    .readable
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return None;
                    }
                    self.readable
                        .wait_timeout(state, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };
        }
    }

    /// Returns `None` once the pipe is closed.
    fn write(&self, buf: &[u8]) -> Option<usize> {
        let mut state = lock(&self.state);
        loop {
            if state.closed {
                return None;
            }
            let free = self.capacity.saturating_sub(state.buf.len());
            if free > 0 {
                let n = free.min(buf.len());
                state.buf.extend(&buf[..n]);
                self.readable.notify_all();
                return Some(n);
            }
            state = self
                .writable
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn close(&self) {
        lock(&self.state).closed = true;
        self.readable.notify_all();
        self.writable.notify_all();
    }

    fn is_closed(&self) -> bool {
        lock(&self.state).closed
    }
}

#[derive(Default)]
struct Counters {
    sent: AtomicU64,
    received: AtomicU64,
}

/// State shared by one end of a logical stream and all of its handles.
struct StreamEnd {
    id: StreamId,
    incoming: Arc<Pipe>,
    outgoing: Arc<Pipe>,
    read_timeout: Mutex<Option<Duration>>,
    local: Arc<Counters>,
    remote: Arc<Counters>,
}

impl StreamEnd {
    fn close(&self) {
        self.incoming.close();
        self.outgoing.close();
    }
}

/// One end of a logical stream of a [`MemorySession`].
///
/// Handles returned by [`LogicalStream::try_clone`] share the pipes, the read
/// timeout and the close state.
pub struct MemoryStream {
    end: Arc<StreamEnd>,
}

impl MemoryStream {
    /// Sets the maximum time a read blocks before failing with
    /// [`io::ErrorKind::TimedOut`]. `None` blocks indefinitely.
    ///
    /// The timeout applies to every handle of this end.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) {
        *lock(&self.end.read_timeout) = timeout;
    }

    /// Returns the current read timeout.
    #[must_use]
    pub fn read_timeout(&self) -> Option<Duration> {
        *lock(&self.end.read_timeout)
    }

    /// Reports whether this stream was closed by either side.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.end.outgoing.is_closed()
    }
}

impl fmt::Debug for MemoryStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStream")
            .field("id", &self.end.id)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl Read for MemoryStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let timeout = self.read_timeout();
        match self.end.incoming.read(buf, timeout) {
            Some(n) => Ok(n),
            None => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("read on stream {} timed out", self.end.id),
            )),
        }
    }
}

impl Write for MemoryStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let n = self
            .end
            .outgoing
            .write(buf)
            .ok_or(SessionError::StreamClosed(self.end.id))?;
        let n_u64 = n as u64;
        self.end.local.sent.fetch_add(n_u64, Ordering::Relaxed);
        self.end.remote.received.fetch_add(n_u64, Ordering::Relaxed);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl LogicalStream for MemoryStream {
    fn id(&self) -> StreamId {
        self.end.id
    }

    fn try_clone(&self) -> io::Result<Self> {
        Ok(Self {
            end: Arc::clone(&self.end),
        })
    }

    fn close(&self) -> io::Result<()> {
        if !self.end.outgoing.is_closed() {
            trace!(target: LOG_TARGET, stream = %self.end.id, "closing memory stream");
        }
        self.end.close();
        Ok(())
    }
}

/// State shared by both sessions of a pair.
struct Connection {
    closed: AtomicBool,
    shutdown_tx: Mutex<Option<Sender<()>>>,
    shutdown_rx: Receiver<()>,
    streams: Mutex<Vec<Weak<StreamEnd>>>,
    capacity: usize,
}

impl Connection {
    fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        lock(&self.shutdown_tx).take();
        let streams = std::mem::take(&mut *lock(&self.streams));
        for end in streams.iter().filter_map(Weak::upgrade) {
            end.close();
        }
        true
    }

    fn track(&self, end: &Arc<StreamEnd>) {
        let mut streams = lock(&self.streams);
        streams.retain(|weak| weak.strong_count() > 0);
        streams.push(Arc::downgrade(end));
    }
}

/// One side of an accept queue plus its counters.
struct Side {
    next_id: AtomicU32,
    accept_tx: Sender<MemoryStream>,
    accept_rx: Receiver<MemoryStream>,
    counters: Arc<Counters>,
}

impl Side {
    fn new(first_id: u32) -> Self {
        let (accept_tx, accept_rx) = crossbeam_channel::unbounded();
        Self {
            next_id: AtomicU32::new(first_id),
            accept_tx,
            accept_rx,
            counters: Arc::default(),
        }
    }
}

/// One side of an in-process multiplexing session.
///
/// Dropping or closing either session of a pair tears down the connection:
/// every stream is closed and further opens and accepts fail with
/// [`io::ErrorKind::ConnectionAborted`].
pub struct MemorySession {
    local: Arc<Side>,
    remote: Arc<Side>,
    connection: Arc<Connection>,
}

impl MemorySession {
    /// Returns a connected `(client, server)` pair with the default pipe
    /// capacity.
    #[must_use]
    pub fn pair() -> (Self, Self) {
        Self::pair_with_capacity(DEFAULT_PIPE_CAPACITY)
    }

    /// Returns a connected `(client, server)` pair whose pipes hold at most
    /// `capacity` unread bytes per direction.
    #[must_use]
    pub fn pair_with_capacity(capacity: usize) -> (Self, Self) {
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(0);
        let connection = Arc::new(Connection {
            closed: AtomicBool::new(false),
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
            shutdown_rx,
            streams: Mutex::new(Vec::new()),
            capacity,
        });
        let client = Arc::new(Side::new(1));
        let server = Arc::new(Side::new(2));
        (
            Self {
                local: Arc::clone(&client),
                remote: Arc::clone(&server),
                connection: Arc::clone(&connection),
            },
            Self {
                local: server,
                remote: client,
                connection,
            },
        )
    }

    /// Returns the bytes delivered into this side's streams by the peer.
    #[must_use]
    pub fn bytes_received(&self) -> u64 {
        self.local.counters.received.load(Ordering::Relaxed)
    }

    /// Returns the bytes this side wrote into its streams.
    #[must_use]
    pub fn bytes_sent(&self) -> u64 {
        self.local.counters.sent.load(Ordering::Relaxed)
    }

    /// Reports whether the connection was torn down.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.connection.closed.load(Ordering::Acquire)
    }

    /// Tears down the connection for both sessions of the pair.
    pub fn close(&self) {
        if self.connection.close() {
            debug!(target: LOG_TARGET, "memory session closed");
        }
    }

    fn ensure_open(&self) -> io::Result<()> {
        if self.is_closed() {
            return Err(SessionError::Closed.into());
        }
        Ok(())
    }
}

impl StreamSession for MemorySession {
    type Stream = MemoryStream;

    fn open_stream(&self) -> io::Result<MemoryStream> {
        self.ensure_open()?;
        let id = StreamId::new(self.local.next_id.fetch_add(2, Ordering::Relaxed));
        let to_remote = Arc::new(Pipe::new(self.connection.capacity));
        let to_local = Arc::new(Pipe::new(self.connection.capacity));

        let local_end = Arc::new(StreamEnd {
            id,
            incoming: Arc::clone(&to_local),
            outgoing: Arc::clone(&to_remote),
            read_timeout: Mutex::new(None),
            local: Arc::clone(&self.local.counters),
            remote: Arc::clone(&self.remote.counters),
        });
        let remote_end = Arc::new(StreamEnd {
            id,
            incoming: to_remote,
            outgoing: to_local,
            read_timeout: Mutex::new(None),
            local: Arc::clone(&self.remote.counters),
            remote: Arc::clone(&self.local.counters),
        });
        self.connection.track(&local_end);
        self.connection.track(&remote_end);

        self.remote
            .accept_tx
            .send(MemoryStream { end: remote_end })
            .map_err(|_| io::Error::from(SessionError::Closed))?;
        // A close racing with the send above may have missed the new ends.
        if self.is_closed() {
            local_end.close();
            return Err(SessionError::Closed.into());
        }

        debug!(target: LOG_TARGET, stream = %id, "opened stream");
        Ok(MemoryStream { end: local_end })
    }

    fn accept_stream(&self) -> io::Result<MemoryStream> {
        self.ensure_open()?;
        let stream = select! {
            recv(self.local.accept_rx) -> stream => stream.ok(),
            recv(self.connection.shutdown_rx) -> _ => None,
        };
        let stream = match stream {
            Some(stream) if !self.is_closed() => stream,
            _ => return Err(SessionError::Closed.into()),
        };
        debug!(target: LOG_TARGET, stream = %stream.end.id, "accepted stream");
        Ok(stream)
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn client_and_server_use_disjoint_ids() {
        let (client, server) = MemorySession::pair();
        let ids: Vec<u32> = (0..3).map(|_| client.open_stream().unwrap().id().get()).collect();
        assert_eq!(ids, [1, 3, 5]);
        assert_eq!(server.open_stream().unwrap().id().get(), 2);
        assert_eq!(server.open_stream().unwrap().id().get(), 4);
    }

    #[test]
    fn accept_returns_streams_in_open_order() {
        let (client, server) = MemorySession::pair();
        let first = client.open_stream().unwrap();
        let second = client.open_stream().unwrap();
        assert_eq!(server.accept_stream().unwrap().id(), first.id());
        assert_eq!(server.accept_stream().unwrap().id(), second.id());
    }

    #[test]
    fn bytes_flow_both_ways() {
        let (client, server) = MemorySession::pair();
        let mut outbound = client.open_stream().unwrap();
        let mut inbound = server.accept_stream().unwrap();

        outbound.write_all(b"ping").unwrap();
        let mut buf = [0u8; 4];
        inbound.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ping");

        inbound.write_all(b"pong").unwrap();
        outbound.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"pong");

        assert_eq!(client.bytes_sent(), 4);
        assert_eq!(client.bytes_received(), 4);
        assert_eq!(server.bytes_received(), 4);
    }

    #[test]
    fn full_pipe_applies_backpressure() {
        let (client, server) = MemorySession::pair_with_capacity(8);
        let mut outbound = client.open_stream().unwrap();
        let mut inbound = server.accept_stream().unwrap();

        assert_eq!(outbound.write(&[1u8; 20]).unwrap(), 8);

        let writer = thread::spawn(move || {
            outbound.write_all(&[2u8; 12]).unwrap();
            outbound
        });
        let mut received = vec![0u8; 20];
        inbound.read_exact(&mut received).unwrap();
        let _outbound = writer.join().unwrap();
        assert_eq!(&received[..8], &[1u8; 8]);
        assert_eq!(&received[8..], &[2u8; 12]);
    }

    #[test]
    fn close_drains_then_reports_eof() {
        let (client, server) = MemorySession::pair();
        let mut outbound = client.open_stream().unwrap();
        let mut inbound = server.accept_stream().unwrap();

        outbound.write_all(b"tail").unwrap();
        outbound.close().unwrap();
        outbound.close().unwrap();

        let mut received = Vec::new();
        inbound.read_to_end(&mut received).unwrap();
        assert_eq!(received, b"tail");
        assert!(inbound.is_closed());
    }

    #[test]
    fn write_after_peer_close_is_broken_pipe() {
        let (client, server) = MemorySession::pair();
        let mut outbound = client.open_stream().unwrap();
        let inbound = server.accept_stream().unwrap();
        inbound.close().unwrap();
        let err = outbound.write(b"x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn read_timeout_reports_timed_out() {
        let (client, _server) = MemorySession::pair();
        let mut stream = client.open_stream().unwrap();
        stream.set_read_timeout(Some(Duration::from_millis(20)));
        let clone = stream.try_clone().unwrap();
        assert_eq!(clone.read_timeout(), Some(Duration::from_millis(20)));
        let err = stream.read(&mut [0u8; 4]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }

    #[test]
    fn session_close_wakes_pending_accept() {
        let (client, server) = MemorySession::pair();
        let server = Arc::new(server);
        let acceptor = {
            let server = Arc::clone(&server);
            thread::spawn(move || server.accept_stream().map(|stream| stream.id()))
        };
        thread::sleep(Duration::from_millis(20));
        client.close();
        let err = acceptor.join().unwrap().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionAborted);
        assert_eq!(
            client.open_stream().unwrap_err().kind(),
            io::ErrorKind::ConnectionAborted
        );
    }

    #[test]
    fn debug_output_names_the_stream() {
        let (client, _server) = MemorySession::pair();
        let stream = client.open_stream().unwrap();
        let rendered = format!("{stream:?}");
        assert!(rendered.contains("MemoryStream"), "{rendered}");
        assert!(rendered.contains("id: StreamId(1)"), "{rendered}");
        assert!(rendered.contains("closed: false"), "{rendered}");
    }

    #[test]
    fn dropping_a_session_closes_open_streams() {
        let (client, server) = MemorySession::pair();
        let mut outbound = client.open_stream().unwrap();
        let mut inbound = server.accept_stream().unwrap();
        drop(server);
        assert!(client.is_closed());
        assert_eq!(inbound.read(&mut [0u8; 4]).unwrap(), 0);
        assert_eq!(
            outbound.write(b"x").unwrap_err().kind(),
            io::ErrorKind::BrokenPipe
        );
    }
}
