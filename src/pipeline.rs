//! One NextDiff run: read the diff line, parse it, show both sides.

use std::env;
use std::path::PathBuf;

use crate::acme::WindowService;
use crate::bootstrap::current_diff_line;
use crate::config::Settings;
use crate::error::{Result, StartupError};
use crate::location::parse_locations;
use crate::navigate::{Dispatch, Navigator};
use crate::plumb::OpenChannel;
use crate::profile;

/// Environment variable acme sets to the id of the window a command runs in.
pub const WINID_VAR: &str = "winid";

/// Everything a run takes from its environment, captured once up front.
#[derive(Debug, Clone)]
pub struct Invocation {
  /// Raw `$winid`, validated by [`window_id`].
  pub winid:    Option<String>,
  /// Relative diff paths and plumb messages are anchored here.
  pub base_dir: PathBuf,
  pub settings: Settings
}

impl Invocation {
  pub fn capture(settings: Settings) -> Result<Self, StartupError> {
    let base_dir = env::current_dir().map_err(StartupError::CurrentDir)?;
    Ok(Self { winid: env::var(WINID_VAR).ok(), base_dir, settings })
  }
}

pub fn window_id(raw: Option<&str>) -> Result<u32, StartupError> {
  let raw = raw.ok_or(StartupError::MissingWinId)?;
  raw.trim().parse().map_err(|_| StartupError::InvalidWinId(raw.to_string()))
}

/// Runs bootstrap, parse and navigation against the given services.
///
/// The control window is closed before navigation starts and on every
/// early return.
pub fn run<S, C>(invocation: &Invocation, service: &S, channel: &C) -> Result<Vec<Dispatch>>
where
  S: WindowService + ?Sized,
  C: OpenChannel + ?Sized
{
  profile!("NextDiff run");
  let id = window_id(invocation.winid.as_deref())?;

  let line = {
    let mut control = service.open(id).map_err(|source| StartupError::OpenControl { id, source })?;
    current_diff_line(&mut control, &invocation.settings.search_pattern)?
  };

  let (first, second) = parse_locations(&line, &invocation.base_dir)?;
  log::debug!("Parsed {} and {}", first, second);

  let navigator = Navigator::new(service, channel, &invocation.settings, &invocation.base_dir);
  navigator.navigate(&[first, second])
}
