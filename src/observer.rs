use crate::remotes::remote;
use crate::uploader::TransferError;
use crate::walker::{self, InputError};

use std::path::Path;

use log::{debug, error, info, warn};

/// Everything the uploader and the walker report while running.
#[derive(Debug)]
pub enum Event<'a> {
    Connecting {
        backend: &'a str,
    },
    Connected {
        remote: &'a str,
    },
    Uploading {
        local: &'a Path,
        remote: &'a str,
    },
    Uploaded {
        local: &'a Path,
        remote: &'a str,
    },
    TransferFailed {
        local: &'a Path,
        remote: &'a str,
        error: &'a TransferError,
    },
    WalkFailed {
        error: &'a walker::Error,
    },
    InvalidInput {
        error: &'a InputError,
    },
    Closed {
        remote: &'a str,
    },
    CloseFailed {
        remote: &'a str,
        error: &'a remote::Error,
    },
}

pub trait Observer: Send + Sync {
    fn notify(&self, event: &Event<'_>);
}

/// Forwards every event to the `log` facade.
#[derive(Clone, Copy, Default)]
pub struct LogObserver;

fn causes(error: &dyn std::error::Error) -> String {
    let mut out = String::new();
    let mut source = error.source();
    while let Some(cause) = source {
        out.push_str(&format!("\n    caused by: {}", cause));
        source = cause.source();
    }
    out
}

impl Observer for LogObserver {
    fn notify(&self, event: &Event<'_>) {
        match event {
            Event::Connecting { backend } => debug!("Connecting to {}...", backend),
            Event::Connected { remote } => debug!("Connected to {}.", remote),
            Event::Uploading { remote, .. } => info!("{}", remote),
            Event::Uploaded { local, remote } => {
                debug!("Uploaded {} to {}", local.display(), remote)
            }
            Event::TransferFailed {
                local,
                remote,
                error,
            } => {
                error!(
                    "Upload of {} to {} failed: {}{}",
                    local.display(),
                    remote,
                    error,
                    causes(*error)
                );
                debug!("{:?}", error);
            }
            Event::WalkFailed { error } => warn!("Skipping entry: {}{}", error, causes(*error)),
            Event::InvalidInput { error } => error!("{}", error),
            Event::Closed { remote } => debug!("Connection to {} closed.", remote),
            Event::CloseFailed { remote, error } => {
                error!("Unable to close the connection to {}: {}", remote, error)
            }
        }
    }
}
