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

use crate::observer::{Event, Observer};
use crate::paths;
use crate::uploader::Uploader;

use std::fmt;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

#[derive(Debug)]
pub enum Error {
    Walk(walkdir::Error),
    NonUnicodePath(PathBuf),
}

impl From<walkdir::Error> for Error {
    fn from(error: walkdir::Error) -> Self {
        Error::Walk(error)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Walk(error) => Some(error),
            Error::NonUnicodePath(_) => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Walk(error) => write!(f, "Unable to walk the directory: {}", error),
            Error::NonUnicodePath(path) => {
                write!(f, "Path {} is not valid unicode", path.display())
            }
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum InputError {
    NoInput,
    NotADirectory(PathBuf),
}

impl std::error::Error for InputError {}
impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::NoInput => write!(f, "No input"),
            InputError::NotADirectory(path) => {
                write!(f, "Directory '{}' does not exists.", path.display())
            }
        }
    }
}

/// Checks the command line argument before anything is uploaded. A leading
/// `~` is expanded to the home directory.
pub fn validate_root(root: Option<&Path>) -> Result<PathBuf, InputError> {
    let root = match root {
        Some(root) => match root.to_str() {
            Some(root) => PathBuf::from(shellexpand::tilde(root).to_string()),
            None => root.to_path_buf(),
        },
        None => return Err(InputError::NoInput),
    };
    if !root.is_dir() {
        return Err(InputError::NotADirectory(root));
    }
    Ok(root)
}

/// A local file and where it goes on the remote.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Transfer {
    pub local: PathBuf,
    pub remote: String,
}

/// Maps the files below a source root to remote paths prefixed by the
/// root's own name: `<root>/a/b/c.txt` becomes `root/a/b/c.txt`.
pub struct Walk {
    source_root: String,
    base: String,
}

impl Walk {
    pub fn new(root: &str) -> Walk {
        let source_root = paths::normpath(root);
        let base = paths::basename(&source_root).to_owned();
        Walk { source_root, base }
    }

    pub fn source_root(&self) -> &str {
        &self.source_root
    }

    /// Computes the transfer for `file` found in directory `subdir`.
    ///
    /// The relative directory is obtained by removing every occurrence of
    /// the source root from `subdir`, not only the leading one: a root whose
    /// text reappears deeper in the tree yields a shortened remote path.
    pub fn transfer(&self, subdir: &str, file: &str) -> Transfer {
        let dir_path = subdir.replace(&self.source_root, "");
        let remote_dir = format!("{}//{}", self.base, dir_path);

        Transfer {
            local: PathBuf::from(paths::normpath(&paths::join(subdir, file))),
            remote: paths::normpath(&paths::join(&remote_dir, file)),
        }
    }

    /// Every non-directory entry below the root as `(subdir, file name)`.
    /// Symlinks are not followed; one pointing to a directory is skipped.
    pub fn files(&self) -> impl Iterator<Item = Result<(String, String), Error>> {
        WalkDir::new(&self.source_root)
            .into_iter()
            .filter_map(|entry| {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(error) => return Some(Err(Error::from(error))),
                };
                if entry.file_type().is_dir() || (entry.path_is_symlink() && entry.path().is_dir())
                {
                    return None;
                }

                let path = entry.path();
                let subdir = path.parent().and_then(Path::to_str);
                let file = entry.file_name().to_str();
                match (subdir, file) {
                    (Some(subdir), Some(file)) => Some(Ok((subdir.to_owned(), file.to_owned()))),
                    _ => Some(Err(Error::NonUnicodePath(path.to_path_buf()))),
                }
            })
    }
}

/// Uploads every file below `root`, one at a time. Per-file failures are
/// reported to `observer` and the walk goes on.
pub async fn upload_dir(
    uploader: &Uploader,
    root: &Path,
    observer: &dyn Observer,
) -> Result<(), Error> {
    let root = root
        .to_str()
        .ok_or_else(|| Error::NonUnicodePath(root.to_path_buf()))?;
    let walk = Walk::new(root);

    for item in walk.files() {
        let (subdir, file) = match item {
            Ok(item) => item,
            Err(error) => {
                observer.notify(&Event::WalkFailed { error: &error });
                continue;
            }
        };

        let transfer = walk.transfer(&subdir, &file);
        observer.notify(&Event::Uploading {
            local: &transfer.local,
            remote: &transfer.remote,
        });

        match uploader.upload(&transfer.local, &transfer.remote).await {
            Ok(()) => observer.notify(&Event::Uploaded {
                local: &transfer.local,
                remote: &transfer.remote,
            }),
            Err(error) => observer.notify(&Event::TransferFailed {
                local: &transfer.local,
                remote: &transfer.remote,
                error: &error,
            }),
        }
    }
    Ok(())
}
