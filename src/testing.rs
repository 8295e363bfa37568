//! Test doubles shared by the unit tests.

use crate::observer::{Event, Observer};
use crate::remotes::remote::{self, Backend, Remote};

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

/// Owned summary of an [`Event`].
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Connecting,
    Connected,
    Uploading { local: PathBuf, remote: String },
    Uploaded { local: PathBuf, remote: String },
    TransferFailed { local: PathBuf, remote: String },
    WalkFailed,
    InvalidInput,
    Closed,
    CloseFailed,
}

#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<Recorded>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<Recorded> {
        self.events.lock().unwrap().clone()
    }

    pub fn failures(&self) -> Vec<Recorded> {
        self.events()
            .into_iter()
            .filter(|e| matches!(e, Recorded::TransferFailed { .. }))
            .collect()
    }
}

impl Observer for RecordingObserver {
    fn notify(&self, event: &Event<'_>) {
        let recorded = match event {
            Event::Connecting { .. } => Recorded::Connecting,
            Event::Connected { .. } => Recorded::Connected,
            Event::Uploading { local, remote } => Recorded::Uploading {
                local: local.to_path_buf(),
                remote: remote.to_string(),
            },
            Event::Uploaded { local, remote } => Recorded::Uploaded {
                local: local.to_path_buf(),
                remote: remote.to_string(),
            },
            Event::TransferFailed { local, remote, .. } => Recorded::TransferFailed {
                local: local.to_path_buf(),
                remote: remote.to_string(),
            },
            Event::WalkFailed { .. } => Recorded::WalkFailed,
            Event::InvalidInput { .. } => Recorded::InvalidInput,
            Event::Closed { .. } => Recorded::Closed,
            Event::CloseFailed { .. } => Recorded::CloseFailed,
        };
        self.events.lock().unwrap().push(recorded);
    }
}

#[derive(Default)]
struct State {
    connects: AtomicUsize,
    closes: AtomicUsize,
    refuse_connections: AtomicBool,
    fail_close: AtomicBool,
    fail_on: Mutex<HashSet<String>>,
    puts: Mutex<Vec<String>>,
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
}

/// In-memory object store; every session shares the same objects.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    state: Arc<State>,
}

impl MemoryBackend {
    pub fn new() -> MemoryBackend {
        MemoryBackend::default()
    }

    pub fn refuse_connections(&self) {
        self.state.refuse_connections.store(true, Ordering::SeqCst);
    }

    pub fn fail_close(&self) {
        self.state.fail_close.store(true, Ordering::SeqCst);
    }

    /// Rejects every write to `remote_path`.
    pub fn fail_on(&self, remote_path: &str) {
        self.state
            .fail_on
            .lock()
            .unwrap()
            .insert(remote_path.to_owned());
    }

    pub fn connects(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.state.closes.load(Ordering::SeqCst)
    }

    /// Every attempted write, in order.
    pub fn puts(&self) -> Vec<String> {
        self.state.puts.lock().unwrap().clone()
    }

    /// Stored object paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.state.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn object(&self, remote_path: &str) -> Option<Vec<u8>> {
        self.state.objects.lock().unwrap().get(remote_path).cloned()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn connect(&self, _token: &str) -> Result<Box<dyn Remote>, remote::Error> {
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        if self.state.refuse_connections.load(Ordering::SeqCst) {
            return Err(remote::Error::Api {
                status: 401,
                body: String::from("invalid_access_token"),
            });
        }
        Ok(Box::new(self.clone()))
    }

    fn name(&self) -> String {
        String::from("memory")
    }
}

#[async_trait]
impl Remote for MemoryBackend {
    async fn put_object(&self, remote_path: &str, content: Vec<u8>) -> Result<(), remote::Error> {
        self.state.puts.lock().unwrap().push(remote_path.to_owned());
        if self.state.fail_on.lock().unwrap().contains(remote_path) {
            return Err(remote::Error::Api {
                status: 500,
                body: String::from("internal_error"),
            });
        }

        self.state
            .objects
            .lock()
            .unwrap()
            .insert(remote_path.to_owned(), content);
        Ok(())
    }

    fn close(&mut self) -> Result<(), remote::Error> {
        self.state.closes.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_close.load(Ordering::SeqCst) {
            return Err(remote::Error::LocalError(std::io::Error::new(
                std::io::ErrorKind::Other,
                "connection reset",
            )));
        }
        Ok(())
    }

    fn name(&self) -> String {
        String::from("memory")
    }
}
