//! Open-stream registry and the standard streams.
//!
//! The process keeps one [`StreamTable`] holding stdin, stdout, stderr and
//! every stream opened through it, up to [`FOPEN_MAX`]. `fflush(NULL)`
//! walks this table.

use std::io;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use super::buffer::BufMode;
use super::file::{IoReader, IoWriter, OpenFlags, Stream, StreamBackend, parse_mode};
use super::EOF;
use crate::errno;

/// Maximum number of simultaneously open streams.
pub const FOPEN_MAX: usize = 16;

/// Registry of open streams.
#[derive(Debug)]
pub struct StreamTable {
    streams: Mutex<Vec<Arc<Stream>>>,
    limit: usize,
}

impl StreamTable {
    pub fn new(limit: usize) -> Self {
        Self {
            streams: Mutex::new(Vec::new()),
            limit,
        }
    }

    fn register(&self, stream: Stream) -> Result<Arc<Stream>, i32> {
        let mut streams = self.streams.lock();
        if streams.len() >= self.limit {
            return Err(errno::EMFILE);
        }
        let stream = Arc::new(stream);
        streams.push(Arc::clone(&stream));
        Ok(stream)
    }

    /// Opens a stream over `backend` with an fopen-style `mode`.
    ///
    /// `EINVAL` for a bad mode, `EMFILE` when the table is full.
    pub fn open(&self, backend: Box<dyn StreamBackend>, mode: &[u8]) -> Result<Arc<Stream>, i32> {
        let stream = Stream::open(backend, mode)?;
        self.register(stream)
    }

    /// Registers a stream with explicit flags and buffering.
    pub fn adopt(
        &self,
        backend: Box<dyn StreamBackend>,
        flags: OpenFlags,
        mode: BufMode,
    ) -> Result<Arc<Stream>, i32> {
        self.register(Stream::new(backend, flags, mode))
    }

    /// Flushes and closes `stream`, removing it from the table. The stream
    /// is closed even when the final flush fails; that error is returned.
    pub fn close(&self, stream: &Arc<Stream>) -> Result<(), i32> {
        let removed = {
            let mut streams = self.streams.lock();
            let before = streams.len();
            streams.retain(|s| !Arc::ptr_eq(s, stream));
            streams.len() != before
        };
        if !removed {
            return Err(errno::EBADF);
        }
        stream.lock().close_unlocked()
    }

    /// Flushes every registered stream; reports the last failure.
    pub fn flush_all(&self) -> Result<(), i32> {
        let streams: Vec<Arc<Stream>> = self.streams.lock().clone();
        let mut result = Ok(());
        for stream in &streams {
            let guard = stream.lock();
            if guard.is_open() {
                if let Err(code) = guard.flush_unlocked() {
                    result = Err(code);
                }
            }
        }
        result
    }

    /// Number of open streams.
    pub fn len(&self) -> usize {
        self.streams.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct StdStreams {
    table: StreamTable,
    stdin: Arc<Stream>,
    stdout: Arc<Stream>,
    stderr: Arc<Stream>,
}

fn std_streams() -> &'static StdStreams {
    static STREAMS: OnceLock<StdStreams> = OnceLock::new();
    STREAMS.get_or_init(|| {
        let read = parse_mode(b"r").unwrap_or_default();
        let write = parse_mode(b"w").unwrap_or_default();
        let table = StreamTable::new(FOPEN_MAX);
        let std = |backend: Box<dyn StreamBackend>, flags, mode| {
            Arc::new(Stream::new(backend, flags, mode))
        };
        let stdin = std(Box::new(IoReader(io::stdin())), read, BufMode::Full);
        let stdout = std(Box::new(IoWriter(io::stdout())), write, BufMode::Line);
        let stderr = std(Box::new(IoWriter(io::stderr())), write, BufMode::None);
        table.streams.lock().extend([
            Arc::clone(&stdin),
            Arc::clone(&stdout),
            Arc::clone(&stderr),
        ]);
        StdStreams {
            table,
            stdin,
            stdout,
            stderr,
        }
    })
}

/// The process stream table.
pub fn streams() -> &'static StreamTable {
    &std_streams().table
}

pub fn stdin() -> Arc<Stream> {
    Arc::clone(&std_streams().stdin)
}

pub fn stdout() -> Arc<Stream> {
    Arc::clone(&std_streams().stdout)
}

pub fn stderr() -> Arc<Stream> {
    Arc::clone(&std_streams().stderr)
}

/// `fopen` over an arbitrary backend, registered in the process table.
pub fn fopen(backend: Box<dyn StreamBackend>, mode: &[u8]) -> Result<Arc<Stream>, i32> {
    streams().open(backend, mode)
}

/// `fclose`: 0, or `EOF` with errno set.
pub fn fclose(stream: &Arc<Stream>) -> i32 {
    errno::report(streams().close(stream).map(|()| 0), EOF)
}

/// `fflush`: one stream, or every open stream for `None`.
pub fn fflush(stream: Option<&Stream>) -> i32 {
    let result = match stream {
        Some(stream) => stream.lock().flush_unlocked(),
        None => streams().flush_all(),
    };
    errno::report(result.map(|()| 0), EOF)
}
