use crate::error::ShowError;
use crate::ninep::Result;

/// An open acme window as listed in `acme/index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinInfo {
  pub id:   u32,
  /// First word of the tag, normally the absolute file name.
  pub name: String
}

/// The editor's window listing and lookup service.
pub trait WindowService {
  type Window: EditorWindow;

  fn windows(&self) -> Result<Vec<WinInfo>>;
  fn open(&self, id: u32) -> Result<Self::Window>;
}

/// One editor window's control files. Released on drop.
pub trait EditorWindow {
  /// Reads the current `addr` as a pair of rune offsets.
  fn read_addr(&mut self) -> Result<(usize, usize)>;
  fn write_addr(&mut self, addr: &str) -> Result<()>;
  fn ctl(&mut self, cmd: &str) -> Result<()>;
  /// Reads the text addressed by `addr` through `xdata`.
  fn read_xdata(&mut self) -> Result<String>;

  /// Selects `addr` and scrolls the window so the selection is visible.
  fn show(&mut self, addr: &str) -> Result<(), ShowError> {
    self
      .write_addr(addr)
      .map_err(|source| ShowError::AddressSet { addr: addr.to_string(), source })?;
    self.ctl("dot=addr").map_err(ShowError::SelectionPromote)?;
    self.ctl("show").map_err(ShowError::Reveal)
  }
}
