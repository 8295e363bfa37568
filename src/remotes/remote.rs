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

use async_trait::async_trait;

use std::fmt;
use std::string::String;

#[derive(Debug)]
pub enum Error {
    LocalError(std::io::Error),
    Http(reqwest::Error),
    Api { status: u16, body: String },
    InvalidPath(String),
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::LocalError(error)
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        Error::Http(error)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::LocalError(error) => Some(error),
            Error::Http(error) => Some(error),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::LocalError(error) => write!(f, "Local (IO) error: {}", error),
            Error::Http(error) => write!(f, "HTTP error: {}", error),
            Error::Api { status, body } => write!(f, "Remote API error ({}): {}", status, body),
            Error::InvalidPath(path) => write!(f, "Invalid remote path: {}", path),
        }
    }
}

/// An open session with a storage backend.
#[async_trait]
pub trait Remote: Send + Sync {
    /// Stores `content` at `remote_path`, a `/`-separated path relative to
    /// the root of the remote, replacing any object already there.
    async fn put_object(&self, remote_path: &str, content: Vec<u8>) -> Result<(), Error>;

    /// Releases the session. Called exactly once by the owner.
    fn close(&mut self) -> Result<(), Error>;

    fn name(&self) -> String;
}

/// Something that turns an access token into a [`Remote`] session.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn connect(&self, token: &str) -> Result<Box<dyn Remote>, Error>;

    fn name(&self) -> String;
}
