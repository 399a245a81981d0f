//! Reading the current diff line from the window NextDiff was run in.

use crate::acme::EditorWindow;
use crate::error::BootstrapError;
use crate::profile;

/// Moves the control window's selection from dot to the next line matching
/// `pattern`, shows it, and returns its text.
///
/// The first read of `addr` opens the file and returns a stale value, so it
/// is read once and discarded before `addr=dot` takes effect.
pub fn current_diff_line<W>(win: &mut W, pattern: &str) -> Result<String, BootstrapError>
where
  W: EditorWindow + ?Sized
{
  profile!("Read current diff line");

  win.read_addr().map_err(BootstrapError::ReadAddr)?;
  win.ctl("addr=dot").map_err(BootstrapError::AddrToDot)?;
  win.show(pattern).map_err(BootstrapError::Search)?;
  let line = win.read_xdata().map_err(BootstrapError::ReadSelection)?;

  log::debug!("Current diff line: {:?}", line);
  Ok(line)
}
