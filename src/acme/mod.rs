//! Access to a running acme through its 9P file server.

pub mod traits;

use std::path::Path;
use std::rc::Rc;

use crate::ninep::fcall::{OREAD, ORDWR};
use crate::ninep::{Error, Fid, Fsys, Result};
use crate::profile;
pub use traits::{EditorWindow, WinInfo, WindowService};

/// Width of each numeric column in `acme/index`.
const INDEX_FIELD_WIDTH: usize = 12;
const INDEX_FIELDS: usize = 5;

/// A mounted acme file server.
#[derive(Debug, Clone)]
pub struct Acme {
  fsys: Rc<Fsys>
}

impl Acme {
  pub fn mount(namespace: &Path) -> Result<Self> {
    Fsys::mount(namespace, "acme").map(Self::new)
  }

  pub fn new(fsys: Fsys) -> Self {
    Self { fsys: Rc::new(fsys) }
  }
}

impl WindowService for Acme {
  type Window = Win;

  fn windows(&self) -> Result<Vec<WinInfo>> {
    profile!("List acme windows");
    let index = self.fsys.open("index", OREAD)?.read_all()?;
    let wins = parse_index(&String::from_utf8_lossy(&index));
    log::debug!("acme has {} open windows", wins.len());
    Ok(wins)
  }

  fn open(&self, id: u32) -> Result<Win> {
    Win::open(Rc::clone(&self.fsys), id)
  }
}

/// Parses `acme/index`: five fixed-width numeric columns (id, tag length,
/// body length, is-directory, is-dirty) followed by the tag text. Windows
/// with an empty tag have no name and are left out.
pub fn parse_index(text: &str) -> Vec<WinInfo> {
  text
    .lines()
    .filter_map(|line| {
      let fixed = INDEX_FIELD_WIDTH * INDEX_FIELDS;
      let id = line.get(..INDEX_FIELD_WIDTH)?.trim().parse().ok()?;
      let name = line.get(fixed..)?.split_whitespace().next()?;
      Some(WinInfo { id, name: name.to_string() })
    })
    .collect()
}

/// An open acme window. Files other than `ctl` are opened on first use and
/// stay open for the life of the window, so the address persists between
/// operations. All fids are clunked when the window is dropped.
#[derive(Debug)]
pub struct Win {
  fsys:  Rc<Fsys>,
  id:    u32,
  ctl:   Fid,
  addr:  Option<Fid>,
  xdata: Option<Fid>
}

impl Win {
  fn open(fsys: Rc<Fsys>, id: u32) -> Result<Self> {
    let ctl = fsys.open(&format!("{}/ctl", id), ORDWR)?;
    log::debug!("Opened acme window {}", id);
    Ok(Self { fsys, id, ctl, addr: None, xdata: None })
  }

  fn file<'a>(fsys: &Fsys, id: u32, slot: &'a mut Option<Fid>, name: &str, mode: u8) -> Result<&'a Fid> {
    if slot.is_none() {
      *slot = Some(fsys.open(&format!("{}/{}", id, name), mode)?);
    }
    slot.as_ref().ok_or_else(|| Error::Protocol(format!("{} not open", name)))
  }
}

impl EditorWindow for Win {
  fn read_addr(&mut self) -> Result<(usize, usize)> {
    let addr = Self::file(&self.fsys, self.id, &mut self.addr, "addr", ORDWR)?;
    let raw = addr.read_at(0)?;
    parse_addr(&String::from_utf8_lossy(&raw))
  }

  fn write_addr(&mut self, addr: &str) -> Result<()> {
    let file = Self::file(&self.fsys, self.id, &mut self.addr, "addr", ORDWR)?;
    file.write(addr.as_bytes()).map(|_| ())
  }

  fn ctl(&mut self, cmd: &str) -> Result<()> {
    let mut line = cmd.to_string();
    if !line.ends_with('\n') {
      line.push('\n');
    }
    self.ctl.write(line.as_bytes()).map(|_| ())
  }

  fn read_xdata(&mut self) -> Result<String> {
    let xdata = Self::file(&self.fsys, self.id, &mut self.xdata, "xdata", OREAD)?;
    let bytes = xdata.read_all()?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
  }
}

/// Parses the `addr` file: two space-padded rune offsets.
fn parse_addr(text: &str) -> Result<(usize, usize)> {
  let mut fields = text.split_whitespace().map(str::parse::<usize>);
  match (fields.next(), fields.next()) {
    (Some(Ok(q0)), Some(Ok(q1))) => Ok((q0, q1)),
    _ => Err(Error::Protocol(format!("malformed addr {:?}", text)))
  }
}
