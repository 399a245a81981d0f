//! A small synchronous 9P2000 client, enough to talk to the plan9port file
//! servers (acme, plumber) posted in the user's namespace directory.

pub mod client;
pub mod fcall;

use std::env;
use std::path::PathBuf;

use thiserror::Error;

pub use client::{Conn, Fid, Fsys};

#[derive(Error, Debug)]
pub enum Error {
  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("9P protocol error: {0}")]
  Protocol(String),

  /// Rerror returned by the file server.
  #[error("{0}")]
  Remote(String),

  #[error("cannot determine namespace: {0}")]
  Namespace(String)
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Resolves the namespace directory from the process environment.
pub fn namespace() -> Result<PathBuf> {
  namespace_from(|key| env::var(key).ok())
}

/// `$NAMESPACE` wins; otherwise `/tmp/ns.$USER.$DISPLAY`, with a trailing
/// screen number `.0` dropped and slashes in the display flattened to `_`.
pub fn namespace_from<F>(var: F) -> Result<PathBuf>
where
  F: Fn(&str) -> Option<String>
{
  if let Some(ns) = var("NAMESPACE").filter(|ns| !ns.is_empty()) {
    return Ok(PathBuf::from(ns));
  }

  let user = var("USER")
    .filter(|user| !user.is_empty())
    .ok_or_else(|| Error::Namespace("$USER is not set".to_string()))?;

  let mut display = var("DISPLAY")
    .filter(|display| !display.is_empty())
    .unwrap_or_else(|| ":0".to_string());
  if display.contains(':') && display.ends_with(".0") {
    display.truncate(display.len() - 2);
  }
  let display = display.replace('/', "_");

  Ok(PathBuf::from(format!("/tmp/ns.{}.{}", user, display)))
}

/// The user name presented in Tattach.
pub(crate) fn uname() -> String {
  env::var("USER").unwrap_or_else(|_| "none".to_string())
}
