pub mod config;
pub mod logging;
pub mod observer;
pub mod paths;
pub mod remotes;
pub mod run;
pub mod uploader;
pub mod walker;

#[cfg(test)]
mod testing;
