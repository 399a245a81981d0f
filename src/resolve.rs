use crate::acme::{WinInfo, WindowService};
use crate::error::NavigateError;

/// Finds the first open window whose name is exactly `path`.
///
/// Names are compared as-is: a window acme names differently (relative, or
/// through a symlink) is treated as not open.
pub fn find_open_view<S>(service: &S, path: &str) -> Result<Option<WinInfo>, NavigateError>
where
  S: WindowService + ?Sized
{
  let wins = service.windows().map_err(NavigateError::Enumeration)?;
  Ok(wins.into_iter().find(|win| win.name == path))
}
