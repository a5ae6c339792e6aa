//! Logger installation.
//!
//! Library code only uses the `log` macros. Binaries and tests call
//! [`init_logging`] to route them through `env_logger`.

mod init;

pub use init::{LoggingConfig, init_logging};
