//! Fake engine utilities for client tests.
//!
//! Provides a scripted server that accepts a single connection, records the
//! request it receives, and then replays a sequence of writes, pauses, and
//! closes so tests can exercise framing and failure handling without a real
//! engine.

use std::io::{self, Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[cfg(unix)]
use std::os::unix::net::UnixListener;

use anyhow::{Context, Result, anyhow};
use serde_json::Value;

/// One scripted action performed after the request has been read.
#[derive(Debug, Clone)]
pub(crate) enum Step {
    Write(Vec<u8>),
    Pause(Duration),
    /// Reads and records another request before continuing.
    AwaitRequest,
}

impl Step {
    pub(crate) fn write(text: &str) -> Self {
        Self::Write(text.as_bytes().to_vec())
    }
}

/// A scripted engine serving exactly one connection.
pub(crate) struct FakeEngine {
    requests: Arc<Mutex<Vec<Value>>>,
    handle: Option<thread::JoinHandle<Result<()>>>,
}

impl FakeEngine {
    /// Listens on an ephemeral TCP port and returns the engine with its port.
    pub(crate) fn spawn_tcp(steps: Vec<Step>) -> Result<(Self, u16)> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).context("bind fake engine")?;
        let port = listener.local_addr().context("local addr")?.port();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().context("accept tcp connection")?;
            serve(stream, &steps, &recorded)
        });
        Ok((
            Self {
                requests,
                handle: Some(handle),
            },
            port,
        ))
    }

    /// Listens on a Unix socket at `path`.
    #[cfg(unix)]
    pub(crate) fn spawn_unix(path: &std::path::Path, steps: Vec<Step>) -> Result<Self> {
        let listener = UnixListener::bind(path).context("bind fake engine socket")?;
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().context("accept unix connection")?;
            serve(stream, &steps, &recorded)
        });
        Ok(Self {
            requests,
            handle: Some(handle),
        })
    }

    /// Waits for the script to finish and returns the recorded requests.
    pub(crate) fn finish(mut self) -> Result<Vec<Value>> {
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| anyhow!("fake engine thread panicked"))??;
        }
        let requests = self
            .requests
            .lock()
            .map_err(|error| anyhow!("lock requests: {error}"))?;
        Ok(requests.clone())
    }
}

impl Drop for FakeEngine {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn serve<S>(mut stream: S, steps: &[Step], requests: &Mutex<Vec<Value>>) -> Result<()>
where
    S: Read + Write,
{
    record_request(&mut stream, requests)?;
    for step in steps {
        match step {
            Step::Write(bytes) => {
                stream.write_all(bytes).context("write response bytes")?;
                stream.flush().context("flush response bytes")?;
            }
            Step::Pause(duration) => thread::sleep(*duration),
            Step::AwaitRequest => record_request(&mut stream, requests)?,
        }
    }
    // Dropping the stream closes the connection.
    Ok(())
}

fn record_request<S: Read>(stream: &mut S, requests: &Mutex<Vec<Value>>) -> Result<()> {
    let mut documents = serde_json::Deserializer::from_reader(stream).into_iter::<Value>();
    let request = match documents.next() {
        Some(Ok(request)) => request,
        Some(Err(error)) if error.is_eof() => return Ok(()),
        Some(Err(error)) => return Err(error).context("parse request"),
        None => return Ok(()),
    };
    requests
        .lock()
        .map_err(|error| anyhow!("lock requests: {error}"))?
        .push(request);
    Ok(())
}

/// Returns a loopback port with nothing listening on it.
pub(crate) fn unused_port() -> io::Result<u16> {
    let listener = TcpListener::bind(("127.0.0.1", 0))?;
    let port = listener.local_addr()?.port();
    drop(listener);
    Ok(port)
}
