// Copyright 2022 Paolo Galeone <nessuno@nerdz.eu>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::config::ACCESS_TOKEN_VAR;
use crate::observer::{Event, Observer};
use crate::paths;
use crate::remotes::remote::{self, Backend, Remote};

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;

#[derive(Debug)]
pub enum Error {
    InvalidConfiguration(String),
    Connection(remote::Error),
}

impl From<remote::Error> for Error {
    fn from(error: remote::Error) -> Self {
        Error::Connection(error)
    }
}

impl std::error::Error for Error {}
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidConfiguration(msg) => write!(f, "Invalid configuration: {}", msg),
            Error::Connection(error) => write!(f, "Unable to connect: {}", error),
        }
    }
}

/// Failure to transfer a single file. Never fatal for a run.
#[derive(Debug)]
pub enum TransferError {
    Read { path: PathBuf, source: io::Error },
    Write { remote: String, source: remote::Error },
}

impl std::error::Error for TransferError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransferError::Read { source, .. } => Some(source),
            TransferError::Write { source, .. } => Some(source),
        }
    }
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferError::Read { path, .. } => write!(f, "Unable to read {}", path.display()),
            TransferError::Write { remote, .. } => write!(f, "Unable to write {}", remote),
        }
    }
}

/// Owns the session with the remote. The session is closed exactly once:
/// by [`Uploader::close`] or, failing that, when the uploader is dropped.
pub struct Uploader {
    target_dir: Option<String>,
    remote: Box<dyn Remote>,
    observer: Arc<dyn Observer>,
    closed: bool,
}

impl Uploader {
    /// Opens a session on `backend`. A missing or empty `token` fails
    /// before the backend is contacted.
    pub async fn connect(
        backend: &dyn Backend,
        target_dir: Option<&str>,
        token: Option<&str>,
        observer: Arc<dyn Observer>,
    ) -> Result<Uploader, Error> {
        let token = match token {
            Some(token) if !token.is_empty() => token,
            _ => {
                return Err(Error::InvalidConfiguration(format!(
                    "{} is not set, an access token is required",
                    ACCESS_TOKEN_VAR
                )))
            }
        };

        observer.notify(&Event::Connecting {
            backend: &backend.name(),
        });
        let remote = backend.connect(token).await?;
        observer.notify(&Event::Connected {
            remote: &remote.name(),
        });

        Ok(Uploader {
            target_dir: target_dir
                .filter(|dir| !dir.is_empty())
                .map(String::from),
            remote,
            observer,
            closed: false,
        })
    }

    /// Where `remote_file` lands on the remote, prefix included.
    pub fn remote_path(&self, remote_file: &str) -> String {
        match &self.target_dir {
            Some(target_dir) => paths::join(target_dir, remote_file),
            None => remote_file.to_owned(),
        }
    }

    /// Reads `local` in full and stores it at `remote_file`, replacing
    /// whatever is already there.
    pub async fn upload(&self, local: &Path, remote_file: &str) -> Result<(), TransferError> {
        let content = fs::read(local)
            .await
            .map_err(|source| TransferError::Read {
                path: local.to_path_buf(),
                source,
            })?;

        let remote_path = self.remote_path(remote_file);
        let result = self.remote.put_object(&remote_path, content).await;
        result.map_err(move |source| TransferError::Write {
            remote: remote_path,
            source,
        })
    }

    pub fn close(mut self) -> Result<(), remote::Error> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<(), remote::Error> {
        self.closed = true;
        let name = self.remote.name();
        match self.remote.close() {
            Ok(()) => {
                self.observer.notify(&Event::Closed { remote: &name });
                Ok(())
            }
            Err(error) => {
                self.observer.notify(&Event::CloseFailed {
                    remote: &name,
                    error: &error,
                });
                Err(error)
            }
        }
    }
}

impl Drop for Uploader {
    fn drop(&mut self) {
        if !self.closed {
            // Failures have already been reported to the observer
            #[allow(unused_must_use)]
            {
                self.shutdown();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryBackend, Recorded, RecordingObserver};

    async fn connect(
        backend: &MemoryBackend,
        target_dir: Option<&str>,
        observer: &Arc<RecordingObserver>,
    ) -> Uploader {
        Uploader::connect(backend, target_dir, Some("token"), observer.clone())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_missing_token_fails_before_connecting() {
        let backend = MemoryBackend::new();
        let observer = Arc::new(RecordingObserver::default());

        for token in &[None, Some("")] {
            let result = Uploader::connect(&backend, Some("out"), *token, observer.clone()).await;
            assert!(matches!(result, Err(Error::InvalidConfiguration(_))));
        }
        assert_eq!(backend.connects(), 0);
        assert!(observer.events().is_empty());
    }

    #[tokio::test]
    async fn test_connection_failure() {
        let backend = MemoryBackend::new();
        backend.refuse_connections();
        let observer = Arc::new(RecordingObserver::default());

        let result = Uploader::connect(&backend, None, Some("token"), observer.clone()).await;
        assert!(matches!(result, Err(Error::Connection(_))));
        assert_eq!(observer.events(), vec![Recorded::Connecting]);
    }

    #[tokio::test]
    async fn test_upload_joins_target_dir() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let local = tmp_dir.path().join("c.txt");
        std::fs::write(&local, b"content").unwrap();

        let backend = MemoryBackend::new();
        let observer = Arc::new(RecordingObserver::default());
        let uploader = connect(&backend, Some("out"), &observer).await;

        uploader.upload(&local, "root/a/b/c.txt").await.unwrap();
        assert_eq!(
            backend.object("out/root/a/b/c.txt"),
            Some(b"content".to_vec())
        );
    }

    #[tokio::test]
    async fn test_empty_or_missing_target_dir_adds_no_prefix() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let local = tmp_dir.path().join("c.txt");
        std::fs::write(&local, b"content").unwrap();
        let observer = Arc::new(RecordingObserver::default());

        for target_dir in &[None, Some("")] {
            let backend = MemoryBackend::new();
            let uploader = connect(&backend, *target_dir, &observer).await;
            assert_eq!(uploader.remote_path("root/c.txt"), "root/c.txt");

            uploader.upload(&local, "root/c.txt").await.unwrap();
            assert_eq!(backend.paths(), vec![String::from("root/c.txt")]);
        }
    }

    #[tokio::test]
    async fn test_read_failure_is_returned() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let backend = MemoryBackend::new();
        let observer = Arc::new(RecordingObserver::default());
        let uploader = connect(&backend, Some("out"), &observer).await;

        let missing = tmp_dir.path().join("missing.txt");
        let result = uploader.upload(&missing, "root/missing.txt").await;

        match result {
            Err(TransferError::Read { path, source }) => {
                assert_eq!(path, missing);
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("expected a read error, got {:?}", other),
        }
        assert!(backend.puts().is_empty());
    }

    #[tokio::test]
    async fn test_write_failure_is_returned() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let local = tmp_dir.path().join("c.txt");
        std::fs::write(&local, b"content").unwrap();

        let backend = MemoryBackend::new();
        backend.fail_on("out/root/c.txt");
        let observer = Arc::new(RecordingObserver::default());
        let uploader = connect(&backend, Some("out"), &observer).await;

        let result = uploader.upload(&local, "root/c.txt").await;
        match result {
            Err(TransferError::Write { remote, .. }) => assert_eq!(remote, "out/root/c.txt"),
            other => panic!("expected a write error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_reupload_overwrites() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let local = tmp_dir.path().join("c.txt");
        let backend = MemoryBackend::new();
        let observer = Arc::new(RecordingObserver::default());
        let uploader = connect(&backend, Some("out"), &observer).await;

        std::fs::write(&local, b"first").unwrap();
        uploader.upload(&local, "root/c.txt").await.unwrap();
        std::fs::write(&local, b"second").unwrap();
        uploader.upload(&local, "root/c.txt").await.unwrap();

        assert_eq!(backend.paths(), vec![String::from("out/root/c.txt")]);
        assert_eq!(backend.object("out/root/c.txt"), Some(b"second".to_vec()));
    }

    #[tokio::test]
    async fn test_drop_closes_once() {
        let backend = MemoryBackend::new();
        let observer = Arc::new(RecordingObserver::default());
        {
            let _uploader = connect(&backend, None, &observer).await;
        }
        assert_eq!(backend.closes(), 1);
        assert_eq!(
            observer.events(),
            vec![Recorded::Connecting, Recorded::Connected, Recorded::Closed]
        );
    }

    #[tokio::test]
    async fn test_explicit_close_is_not_repeated_on_drop() {
        let backend = MemoryBackend::new();
        let observer = Arc::new(RecordingObserver::default());
        let uploader = connect(&backend, None, &observer).await;

        uploader.close().unwrap();
        assert_eq!(backend.closes(), 1);
    }

    #[tokio::test]
    async fn test_close_failure_is_reported() {
        let backend = MemoryBackend::new();
        backend.fail_close();
        let observer = Arc::new(RecordingObserver::default());
        let uploader = connect(&backend, None, &observer).await;

        assert!(uploader.close().is_err());
        assert_eq!(backend.closes(), 1);
        assert_eq!(observer.events().last(), Some(&Recorded::CloseFailed));
    }
}
