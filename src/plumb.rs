//! Plumb messages and the channel that delivers them to the plumber.

use std::path::PathBuf;

use thiserror::Error;

use crate::ninep::fcall::OWRITE;
use crate::ninep::{self, Fsys};
use crate::profile;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
  pub name:  String,
  pub value: String
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
  pub src:   String,
  pub dst:   String,
  pub wdir:  String,
  pub kind:  String,
  pub attrs: Vec<Attribute>,
  pub data:  Vec<u8>
}

impl Message {
  /// Looks up an attribute value by name.
  pub fn attr(&self, name: &str) -> Option<&str> {
    self
      .attrs
      .iter()
      .find(|attr| attr.name == name)
      .map(|attr| attr.value.as_str())
  }

  /// Packs the message in the plumber's text format:
  /// `src\ndst\nwdir\ntype\nattrs\nndata\ndata`.
  pub fn pack(&self) -> Vec<u8> {
    let attrs = self
      .attrs
      .iter()
      .map(|attr| format!("{}={}", attr.name, quote(&attr.value)))
      .collect::<Vec<_>>()
      .join(" ");

    let mut buf = format!(
      "{}\n{}\n{}\n{}\n{}\n{}\n",
      self.src,
      self.dst,
      self.wdir,
      self.kind,
      attrs,
      self.data.len()
    )
    .into_bytes();
    buf.extend_from_slice(&self.data);
    buf
  }
}

/// Attribute values containing blanks, quotes or `=` are wrapped in single
/// quotes, with embedded quotes doubled.
fn quote(value: &str) -> String {
  if !value.contains([' ', '\t', '\'', '=']) {
    return value.to_string();
  }
  format!("'{}'", value.replace('\'', "''"))
}

#[derive(Error, Debug)]
pub enum PlumbError {
  #[error("cannot open plumber send port")]
  Unavailable(#[source] ninep::Error),

  #[error("cannot write plumb message")]
  Send(#[source] ninep::Error)
}

/// Where open requests go when no window shows the file yet.
pub trait OpenChannel {
  fn send(&self, msg: &Message) -> Result<(), PlumbError>;
}

/// The plumber's `send` port. Each message uses a fresh connection.
#[derive(Debug, Clone)]
pub struct Plumber {
  namespace: PathBuf
}

impl Plumber {
  pub fn new(namespace: PathBuf) -> Self {
    Self { namespace }
  }
}

impl OpenChannel for Plumber {
  fn send(&self, msg: &Message) -> Result<(), PlumbError> {
    profile!("Plumb message");
    let port = Fsys::mount(&self.namespace, "plumb")
      .and_then(|fsys| fsys.open("send", OWRITE))
      .map_err(PlumbError::Unavailable)?;
    port.write(&msg.pack()).map_err(PlumbError::Send)?;
    log::debug!("Plumbed {} to {}", String::from_utf8_lossy(&msg.data), msg.dst);
    Ok(())
  }
}
