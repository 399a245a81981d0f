use std::cell::{Cell, RefCell};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::rc::Rc;

use super::fcall::{read_msg, write_msg, Fcall, Msg, IOHDRSZ, NOFID, NOTAG, VERSION};
use super::{uname, Error, Result};
use crate::profile;

const DEFAULT_MSIZE: u32 = 8192 + IOHDRSZ;

/// One 9P session over a Unix socket. Requests are issued one at a time.
#[derive(Debug)]
pub struct Conn {
  stream:   RefCell<UnixStream>,
  msize:    u32,
  next_tag: Cell<u16>,
  next_fid: Cell<u32>
}

impl Conn {
  /// Connects to `path` and negotiates the protocol version.
  pub fn dial(path: &Path) -> Result<Rc<Self>> {
    profile!("9P dial");
    log::debug!("Dialing {}", path.display());
    let stream = UnixStream::connect(path)?;
    Self::handshake(stream)
  }

  pub fn handshake(stream: UnixStream) -> Result<Rc<Self>> {
    let mut conn = Self {
      stream:   RefCell::new(stream),
      msize:    DEFAULT_MSIZE,
      next_tag: Cell::new(0),
      next_fid: Cell::new(0)
    };

    let request = Fcall::Tversion { msize: DEFAULT_MSIZE, version: VERSION.to_string() };
    match conn.exchange(NOTAG, request)? {
      Fcall::Rversion { msize, version } if version.starts_with(VERSION) => {
        conn.msize = msize.min(DEFAULT_MSIZE);
        if conn.msize <= IOHDRSZ {
          return Err(Error::Protocol(format!("server msize {} too small", msize)));
        }
      }
      Fcall::Rversion { version, .. } => {
        return Err(Error::Protocol(format!("unsupported version {}", version)));
      }
      other => return Err(unexpected("Rversion", &other))
    }

    Ok(Rc::new(conn))
  }

  /// Attaches to the root of the server's tree.
  pub fn attach(self: &Rc<Self>, aname: &str) -> Result<Fsys> {
    let fid = self.new_fid();
    let request = Fcall::Tattach { fid, afid: NOFID, uname: uname(), aname: aname.to_string() };
    match self.rpc(request)? {
      Fcall::Rattach { .. } => Ok(Fsys { root: Fid::new(Rc::clone(self), fid, 0) }),
      other => Err(unexpected("Rattach", &other))
    }
  }

  fn new_fid(&self) -> u32 {
    let fid = self.next_fid.get();
    self.next_fid.set(fid.wrapping_add(1));
    fid
  }

  fn new_tag(&self) -> u16 {
    let tag = self.next_tag.get();
    self.next_tag.set(if tag + 1 == NOTAG { 0 } else { tag + 1 });
    tag
  }

  fn rpc(&self, fcall: Fcall) -> Result<Fcall> {
    self.exchange(self.new_tag(), fcall)
  }

  fn exchange(&self, tag: u16, fcall: Fcall) -> Result<Fcall> {
    let mut stream = self.stream.borrow_mut();
    write_msg(&mut *stream, &Msg::new(tag, fcall))?;
    let reply = read_msg(&mut *stream, self.msize)?;

    if reply.tag != tag {
      return Err(Error::Protocol(format!("reply tag {} for request tag {}", reply.tag, tag)));
    }

    match reply.fcall {
      Fcall::Rerror { ename } => Err(Error::Remote(ename)),
      fcall => Ok(fcall)
    }
  }
}

/// An attached file tree.
#[derive(Debug)]
pub struct Fsys {
  root: Fid
}

impl Fsys {
  /// Connects to the service `name` posted in the namespace directory.
  pub fn mount(namespace: &Path, name: &str) -> Result<Self> {
    Conn::dial(&namespace.join(name))?.attach("")
  }

  /// Walks to the slash-separated `path` and opens it with `mode`.
  pub fn open(&self, path: &str, mode: u8) -> Result<Fid> {
    profile!("9P open");
    let conn = &self.root.conn;
    let wnames: Vec<String> = path.split('/').filter(|part| !part.is_empty()).map(String::from).collect();
    let newfid = conn.new_fid();

    match conn.rpc(Fcall::Twalk { fid: self.root.fid, newfid, wnames: wnames.clone() })? {
      Fcall::Rwalk { qids } if qids.len() == wnames.len() => {}
      Fcall::Rwalk { .. } => return Err(Error::Remote(format!("{}: file does not exist", path))),
      other => return Err(unexpected("Rwalk", &other))
    }

    // From here the walked fid exists on the server and is clunked on drop.
    let mut fid = Fid::new(Rc::clone(conn), newfid, 0);
    match conn.rpc(Fcall::Topen { fid: newfid, mode })? {
      Fcall::Ropen { iounit, .. } => {
        fid.iounit = iounit;
        Ok(fid)
      }
      other => Err(unexpected("Ropen", &other))
    }
  }
}

/// An open file on the server. Dropping it clunks the fid.
#[derive(Debug)]
pub struct Fid {
  conn:   Rc<Conn>,
  fid:    u32,
  iounit: u32,
  offset: Cell<u64>
}

impl Fid {
  fn new(conn: Rc<Conn>, fid: u32, iounit: u32) -> Self {
    Self { conn, fid, iounit, offset: Cell::new(0) }
  }

  fn max_io(&self) -> u32 {
    let limit = self.conn.msize - IOHDRSZ;
    if self.iounit == 0 {
      limit
    } else {
      self.iounit.min(limit)
    }
  }

  /// Reads at most one iounit from `offset` without moving the file offset.
  pub fn read_at(&self, offset: u64) -> Result<Vec<u8>> {
    match self.conn.rpc(Fcall::Tread { fid: self.fid, offset, count: self.max_io() })? {
      Fcall::Rread { data } => Ok(data),
      other => Err(unexpected("Rread", &other))
    }
  }

  /// Reads the next chunk; an empty result means end of file.
  pub fn read(&self) -> Result<Vec<u8>> {
    let data = self.read_at(self.offset.get())?;
    self.offset.set(self.offset.get() + data.len() as u64);
    Ok(data)
  }

  pub fn read_all(&self) -> Result<Vec<u8>> {
    let mut acc = Vec::new();
    loop {
      let chunk = self.read()?;
      if chunk.is_empty() {
        return Ok(acc);
      }
      acc.extend_from_slice(&chunk);
    }
  }

  /// Writes all of `data`, split into iounit-sized requests.
  pub fn write(&self, data: &[u8]) -> Result<usize> {
    let max = self.max_io() as usize;
    let mut written = 0;

    for chunk in data.chunks(max.max(1)) {
      let request = Fcall::Twrite { fid: self.fid, offset: self.offset.get(), data: chunk.to_vec() };
      let count = match self.conn.rpc(request)? {
        Fcall::Rwrite { count } => count as usize,
        other => return Err(unexpected("Rwrite", &other))
      };
      self.offset.set(self.offset.get() + count as u64);
      written += count;
      if count < chunk.len() {
        return Err(Error::Protocol(format!("short write: {} of {} bytes", count, chunk.len())));
      }
    }

    Ok(written)
  }
}

impl Drop for Fid {
  fn drop(&mut self) {
    if let Err(err) = self.conn.rpc(Fcall::Tclunk { fid: self.fid }) {
      log::debug!("Failed to clunk fid {}: {}", self.fid, err);
    }
  }
}

fn unexpected(wanted: &str, got: &Fcall) -> Error {
  Error::Protocol(format!("expected {}, got {:?}", wanted, got))
}
