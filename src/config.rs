use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, FileFormat, Map};
use serde::Deserialize;

use crate::ninep;

// Constants
pub const DEFAULT_SOURCE: &str = "NextDiff";
pub const DEFAULT_DESTINATION: &str = "edit";
/// Matches the next line that is not a `-`, `<` or `>` change line.
pub const DEFAULT_SEARCH_PATTERN: &str = r"/^[^\-<>].*\n/";
const ENV_PREFIX: &str = "NEXTDIFF";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Settings {
  /// `src` of plumb messages.
  pub source:         String,
  /// `dst` port of plumb messages.
  pub destination:    String,
  /// Address searched from dot to find the diff line.
  pub search_pattern: String,
  /// Overrides the namespace directory derived from the environment.
  pub namespace:      Option<String>
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      source:         DEFAULT_SOURCE.to_string(),
      destination:    DEFAULT_DESTINATION.to_string(),
      search_pattern: DEFAULT_SEARCH_PATTERN.to_string(),
      namespace:      None
    }
  }
}

impl Settings {
  /// `~/.config/nextdiff/config.ini`, if a home directory is known.
  pub fn default_path() -> Option<PathBuf> {
    home::home_dir().map(|home| home.join(".config/nextdiff/config.ini"))
  }

  pub fn load() -> Result<Self> {
    Self::load_from(Self::default_path().as_deref())
  }

  /// Defaults, then the INI file (if it exists), then `NEXTDIFF_*` variables.
  pub fn load_from(file: Option<&Path>) -> Result<Self> {
    Self::load_with(file, None)
  }

  /// Like [`Settings::load_from`], but reads `NEXTDIFF_*` variables from `env`
  /// instead of the process environment when given.
  pub fn load_with(file: Option<&Path>, env: Option<Map<String, String>>) -> Result<Self> {
    let mut builder = Config::builder()
      .set_default("source", DEFAULT_SOURCE)?
      .set_default("destination", DEFAULT_DESTINATION)?
      .set_default("search_pattern", DEFAULT_SEARCH_PATTERN)?;

    if let Some(file) = file {
      log::debug!("Reading config from {}", file.display());
      builder = builder.add_source(config::File::new(file.to_string_lossy().as_ref(), FileFormat::Ini).required(false));
    }

    builder
      .add_source(config::Environment::with_prefix(ENV_PREFIX).source(env))
      .build()?
      .try_deserialize()
      .context("Failed to deserialize NextDiff config")
  }

  /// The namespace directory holding the acme and plumb sockets.
  pub fn namespace_dir(&self) -> ninep::Result<PathBuf> {
    match self.namespace.as_deref().filter(|ns| !ns.is_empty()) {
      Some(ns) => Ok(PathBuf::from(ns)),
      None => ninep::namespace()
    }
  }
}
