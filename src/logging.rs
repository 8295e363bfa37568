use std::cmp;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

use log::{LevelFilter, SetLoggerError};
use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelPadding, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};

#[derive(Debug)]
pub enum Error {
    Open(io::Error),
    Init(SetLoggerError),
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Error::Open(error)
    }
}

impl From<SetLoggerError> for Error {
    fn from(error: SetLoggerError) -> Self {
        Error::Init(error)
    }
}

impl std::error::Error for Error {}
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Open(error) => write!(f, "Could not open the log file: {}", error),
            Error::Init(error) => write!(f, "Could not install the logger: {}", error),
        }
    }
}

/// Console verbosity from the command line flags. Quiet keeps errors.
pub fn console_level(quiet: bool, verbose: usize) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn open_log_file(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Installs the process-wide logger: coloured console output at `console`
/// level and every message at debug level (or finer) appended to `log_file`.
pub fn init(log_file: &Path, console: LevelFilter) -> Result<(), Error> {
    let file = open_log_file(log_file)?;
    let config = ConfigBuilder::new()
        .set_thread_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .set_level_padding(LevelPadding::Right)
        .add_filter_ignore_str("hyper")
        .add_filter_ignore_str("reqwest")
        .add_filter_ignore_str("rustls")
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::with_capacity(2);
    loggers.push(WriteLogger::new(
        cmp::max(LevelFilter::Debug, console),
        config.clone(),
        file,
    ));
    loggers.push(TermLogger::new(
        console,
        config,
        TerminalMode::Mixed,
        ColorChoice::Auto,
    ));

    CombinedLogger::init(loggers)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_console_level() {
        assert_eq!(console_level(false, 0), LevelFilter::Debug);
        assert_eq!(console_level(false, 1), LevelFilter::Trace);
        assert_eq!(console_level(false, 3), LevelFilter::Trace);
        assert_eq!(console_level(true, 0), LevelFilter::Error);
        assert_eq!(console_level(true, 2), LevelFilter::Error);
    }

    #[test]
    fn test_log_file_is_appended() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let path = tmp_dir.path().join("log_file.log");

        open_log_file(&path).unwrap().write_all(b"first run\n").unwrap();
        open_log_file(&path).unwrap().write_all(b"second run\n").unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "first run\nsecond run\n"
        );
    }
}
