//! Error types for each stage of a NextDiff run.
//!
//! Every stage has its own enum so the fatal message names the step that
//! failed; [`Error`] aggregates them for the binary.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

use crate::location::{Location, ParseError};
use crate::ninep;

#[derive(Error, Debug)]
pub enum StartupError {
  #[error("$winid is not set")]
  MissingWinId,

  #[error("$winid is not a window id: {0:?}")]
  InvalidWinId(String),

  #[error("failed to get current working directory")]
  CurrentDir(#[source] std::io::Error),

  #[error("failed to locate namespace")]
  Namespace(#[source] ninep::Error),

  #[error("failed to connect to acme")]
  Connect(#[source] ninep::Error),

  #[error("failed to open acme window {id}")]
  OpenControl {
    id:     u32,
    #[source]
    source: ninep::Error
  }
}

/// The three steps of moving a window's selection to an address.
#[derive(Error, Debug)]
pub enum ShowError {
  #[error("failed to set address {addr}")]
  AddressSet {
    addr:   String,
    #[source]
    source: ninep::Error
  },

  #[error("failed to promote address to selection")]
  SelectionPromote(#[source] ninep::Error),

  #[error("failed to reveal selection")]
  Reveal(#[source] ninep::Error)
}

#[derive(Error, Debug)]
pub enum BootstrapError {
  #[error("failed to read window address")]
  ReadAddr(#[source] ninep::Error),

  #[error("failed to set address to dot")]
  AddrToDot(#[source] ninep::Error),

  #[error("failed searching window")]
  Search(#[source] ShowError),

  #[error("failed to read selected line")]
  ReadSelection(#[source] ninep::Error)
}

#[derive(Error, Debug)]
pub enum NavigateError {
  #[error("failed to list acme windows")]
  Enumeration(#[source] ninep::Error),

  #[error("failed to open window {id} for {path}")]
  OpenView {
    id:     u32,
    path:   String,
    #[source]
    source: ninep::Error
  },

  #[error("failed to show address in {path}")]
  Retarget {
    path:   String,
    #[source]
    source: ShowError
  },

  #[error("plumber is unavailable")]
  ChannelUnavailable(#[source] ninep::Error),

  #[error("failed to plumb {path}")]
  SendFailed {
    path:   String,
    #[source]
    source: ninep::Error
  }
}

/// Every location that could not be shown, in line order.
#[derive(Debug, Default)]
pub struct Failures(pub Vec<(Location, NavigateError)>);

impl fmt::Display for Failures {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, (loc, err)) in self.0.iter().enumerate() {
      if i > 0 {
        write!(f, "; ")?;
      }
      write!(f, "{}: {}", loc, err)?;
      let mut source = StdError::source(err);
      while let Some(cause) = source {
        write!(f, ": {}", cause)?;
        source = cause.source();
      }
    }
    Ok(())
  }
}

#[derive(Error, Debug)]
pub enum Error {
  #[error(transparent)]
  Startup(#[from] StartupError),

  #[error(transparent)]
  Bootstrap(#[from] BootstrapError),

  #[error("error parsing locations")]
  Parse(#[from] ParseError),

  #[error("error navigating to {0}")]
  Navigation(Failures)
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
