pub mod config;
pub mod handler;
pub mod logging;
pub mod protocol;
pub mod wire;

pub use config::{ConfigError, LoggingConfig, PlayOneConfig, ServiceConfig};
pub use handler::{Endpoint, Handler, HandlerError};
pub use protocol::{ErrorCode, Response};
