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

use crate::config::LocalhostConfig;
use crate::remotes::remote::{self, Backend, Remote};

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use tokio::fs;

use std::fmt;

#[derive(Debug, PartialEq)]
pub enum Error {
    IsNotAbsolute(PathBuf),
    DoesNotExist(PathBuf),
    IsNotAFolder(PathBuf),
}

impl std::error::Error for Error {}
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::IsNotAbsolute(path) => write!(f, "Path {} is not absolute", path.display()),
            Error::DoesNotExist(path) => write!(f, "Path {} does not exist", path.display()),
            Error::IsNotAFolder(path) => write!(f, "Path {} is not a folder", path.display()),
        }
    }
}

/// Mirrors uploads into a folder of the local filesystem.
#[derive(Clone)]
pub struct Localhost {
    path: PathBuf,
}

impl Localhost {
    pub fn new(config: &LocalhostConfig) -> Result<Localhost, Error> {
        let path = PathBuf::from(shellexpand::tilde(&config.path).to_string());

        if path.is_relative() {
            return Err(Error::IsNotAbsolute(path));
        }
        if !path.exists() {
            return Err(Error::DoesNotExist(path));
        }
        if !path.is_dir() {
            return Err(Error::IsNotAFolder(path));
        }

        Ok(Localhost { path })
    }

    fn destination(&self, remote_path: &str) -> Result<PathBuf, remote::Error> {
        let relative = Path::new(remote_path.trim_start_matches('/'));
        // Anything but plain names could escape the root folder
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || relative.file_name().is_none() {
            return Err(remote::Error::InvalidPath(remote_path.to_owned()));
        }
        Ok(self.path.join(relative))
    }
}

#[async_trait]
impl Backend for Localhost {
    async fn connect(&self, _token: &str) -> Result<Box<dyn Remote>, remote::Error> {
        Ok(Box::new(self.clone()))
    }

    fn name(&self) -> String {
        format!("localhost:{}", self.path.display())
    }
}

#[async_trait]
impl Remote for Localhost {
    async fn put_object(&self, remote_path: &str, content: Vec<u8>) -> Result<(), remote::Error> {
        let dest = self.destination(remote_path)?;
        if let Some(parent) = dest.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }
        fs::write(&dest, &content).await?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), remote::Error> {
        Ok(())
    }

    fn name(&self) -> String {
        Backend::name(self)
    }
}
