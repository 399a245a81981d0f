#[macro_export]
macro_rules! profile {
  ($name:expr) => {
    let _span = tracing::span!(tracing::Level::DEBUG, $name);
    let _enter = _span.enter();
  };
}

pub mod acme;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod location;
pub mod navigate;
pub mod ninep;
pub mod pipeline;
pub mod plumb;
pub mod resolve;

// Re-exports
pub use error::{Error, Result};
pub use location::{parse_locations, Location};
pub use navigate::{Dispatch, Navigator};
pub use pipeline::{run, Invocation};
