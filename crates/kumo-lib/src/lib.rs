pub mod extensions;
pub mod models;
pub mod prelude;

/// This is used to ensure both application and source use the same version
pub static LIB_VERSION: &str = env!("CARGO_PKG_VERSION");
