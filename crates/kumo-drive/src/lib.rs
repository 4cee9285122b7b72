#[macro_use]
extern crate log;

pub mod archive;
pub mod client;
pub mod comicinfo;
pub mod error;
pub mod oauth;
pub mod query;
pub mod source;
pub mod store;
pub mod url;

pub use error::Error;
pub use source::{DriveSource, SourceConfig};
