//! Parsing of the `path:addr c path:addr` lines printed by side-by-side diff.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

use crate::profile;

/// A file and an acme address within it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
  /// Absolute, lexically cleaned path.
  pub path: String,
  /// Address in acme syntax, kept verbatim.
  pub addr: String
}

impl fmt::Display for Location {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.path, self.addr)
  }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
  #[error("malformed line: {0}")]
  MalformedLine(String),

  #[error("malformed location: {0}")]
  MalformedLocation(String)
}

/// Parses `a.txt:1,2`. Relative paths are resolved against `base_dir`.
pub fn parse_location(token: &str, base_dir: &Path) -> Result<Location, ParseError> {
  let parts: Vec<&str> = token.split(':').collect();
  let [raw_path, addr] = parts[..] else {
    return Err(ParseError::MalformedLocation(token.to_string()));
  };

  Ok(Location {
    path: absolute(raw_path, base_dir).to_string_lossy().into_owned(),
    addr: addr.to_string()
  })
}

/// Parses `a.txt:1,2 c b.txt:1` into its two locations; the middle token is
/// the change marker and is ignored.
pub fn parse_locations(line: &str, base_dir: &Path) -> Result<(Location, Location), ParseError> {
  profile!("Parse locations");
  let chunks: Vec<&str> = line.trim().split(' ').collect();
  let [first, _, second] = chunks[..] else {
    return Err(ParseError::MalformedLine(line.to_string()));
  };

  Ok((parse_location(first, base_dir)?, parse_location(second, base_dir)?))
}

/// Joins `raw` onto `base` and removes `.` and `..` without touching the disk.
fn absolute(raw: &str, base: &Path) -> PathBuf {
  let mut out = PathBuf::new();
  for component in base.join(raw).components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => {
        if out.parent().is_some() {
          out.pop();
        }
      }
      other => out.push(other.as_os_str())
    }
  }
  out
}
