pub mod dropbox;
pub mod localhost;
pub mod remote;
