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

use crate::config::Config;
use crate::observer::{Event, Observer};
use crate::remotes::dropbox::Dropbox;
use crate::remotes::localhost::{self, Localhost};
use crate::remotes::remote::Backend;
use crate::uploader::{self, Uploader};
use crate::walker::{self, InputError};

use std::fmt;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug)]
pub enum Error {
    Input(InputError),
    Connect(uploader::Error),
    Walk(walker::Error),
}

impl From<InputError> for Error {
    fn from(error: InputError) -> Self {
        Error::Input(error)
    }
}

impl From<uploader::Error> for Error {
    fn from(error: uploader::Error) -> Self {
        Error::Connect(error)
    }
}

impl From<walker::Error> for Error {
    fn from(error: walker::Error) -> Self {
        Error::Walk(error)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Input(error) => Some(error),
            Error::Connect(error) => Some(error),
            Error::Walk(error) => Some(error),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Input(error) => write!(f, "{}", error),
            Error::Connect(error) => write!(f, "{}", error),
            Error::Walk(error) => write!(f, "{}", error),
        }
    }
}

/// The remote uploads go to: a local folder when `[localhost]` is
/// configured, Dropbox otherwise.
pub fn backend(config: &Config) -> Result<Box<dyn Backend>, localhost::Error> {
    match &config.localhost {
        Some(localhost) => Ok(Box::new(Localhost::new(localhost)?)),
        None => Ok(Box::new(Dropbox::new(&config.dropbox))),
    }
}

/// Uploads the directory `root` to `backend`.
///
/// Nothing is contacted unless `root` is an existing directory and an access
/// token is configured. An invalid `root` is reported to `observer` before
/// returning. Per-file failures are reported too, but do not make the run
/// fail, and neither does a failure closing the session.
pub async fn run(
    root: Option<&Path>,
    config: &Config,
    backend: &dyn Backend,
    observer: Arc<dyn Observer>,
) -> Result<(), Error> {
    let root = match walker::validate_root(root) {
        Ok(root) => root,
        Err(error) => {
            observer.notify(&Event::InvalidInput { error: &error });
            return Err(Error::from(error));
        }
    };

    let uploader = Uploader::connect(
        backend,
        config.target_dir.as_deref(),
        config.access_token.as_deref(),
        observer.clone(),
    )
    .await?;

    let result = walker::upload_dir(&uploader, &root, observer.as_ref()).await;

    // Teardown failures are reported by the observer
    #[allow(unused_must_use)]
    {
        uploader.close();
    }

    result.map_err(Error::from)
}
