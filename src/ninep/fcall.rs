//! 9P2000 message framing.
//!
//! Every message is `size[4] type[1] tag[2] body`, little-endian, where `size`
//! counts the whole message including itself. Strings are `len[2]` followed by
//! UTF-8 bytes.

use std::io::{Read, Write};

use super::{Error, Result};

pub const VERSION: &str = "9P2000";
pub const NOTAG: u16 = 0xFFFF;
pub const NOFID: u32 = 0xFFFF_FFFF;

/// Bytes of header overhead in a Tread/Rwrite, subtracted from msize for the
/// largest payload a single request may carry.
pub const IOHDRSZ: u32 = 24;

pub const OREAD: u8 = 0;
pub const OWRITE: u8 = 1;
pub const ORDWR: u8 = 2;

const TVERSION: u8 = 100;
const RVERSION: u8 = 101;
const TATTACH: u8 = 104;
const RATTACH: u8 = 105;
const RERROR: u8 = 107;
const TWALK: u8 = 110;
const RWALK: u8 = 111;
const TOPEN: u8 = 112;
const ROPEN: u8 = 113;
const TREAD: u8 = 116;
const RREAD: u8 = 117;
const TWRITE: u8 = 118;
const RWRITE: u8 = 119;
const TCLUNK: u8 = 120;
const RCLUNK: u8 = 121;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Qid {
  pub kind:    u8,
  pub version: u32,
  pub path:    u64
}

/// The subset of 9P2000 the acme and plumber clients speak.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fcall {
  Tversion { msize: u32, version: String },
  Rversion { msize: u32, version: String },
  Tattach { fid: u32, afid: u32, uname: String, aname: String },
  Rattach { qid: Qid },
  Rerror { ename: String },
  Twalk { fid: u32, newfid: u32, wnames: Vec<String> },
  Rwalk { qids: Vec<Qid> },
  Topen { fid: u32, mode: u8 },
  Ropen { qid: Qid, iounit: u32 },
  Tread { fid: u32, offset: u64, count: u32 },
  Rread { data: Vec<u8> },
  Twrite { fid: u32, offset: u64, data: Vec<u8> },
  Rwrite { count: u32 },
  Tclunk { fid: u32 },
  Rclunk
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Msg {
  pub tag:   u16,
  pub fcall: Fcall
}

impl Msg {
  pub fn new(tag: u16, fcall: Fcall) -> Self {
    Self { tag, fcall }
  }

  /// Encodes the message. Strings and name lists longer than a 16-bit
  /// length field can describe are refused rather than truncated.
  pub fn encode(&self) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; 4];
    buf.push(self.fcall.kind());
    put_u16(&mut buf, self.tag);

    match &self.fcall {
      Fcall::Tversion { msize, version } | Fcall::Rversion { msize, version } => {
        put_u32(&mut buf, *msize);
        put_str(&mut buf, version)?;
      }
      Fcall::Tattach { fid, afid, uname, aname } => {
        put_u32(&mut buf, *fid);
        put_u32(&mut buf, *afid);
        put_str(&mut buf, uname)?;
        put_str(&mut buf, aname)?;
      }
      Fcall::Rattach { qid } => put_qid(&mut buf, qid),
      Fcall::Rerror { ename } => put_str(&mut buf, ename)?,
      Fcall::Twalk { fid, newfid, wnames } => {
        put_u32(&mut buf, *fid);
        put_u32(&mut buf, *newfid);
        put_u16(&mut buf, len16(wnames.len(), "walk names")?);
        for name in wnames {
          put_str(&mut buf, name)?;
        }
      }
      Fcall::Rwalk { qids } => {
        put_u16(&mut buf, len16(qids.len(), "walk qids")?);
        qids.iter().for_each(|qid| put_qid(&mut buf, qid));
      }
      Fcall::Topen { fid, mode } => {
        put_u32(&mut buf, *fid);
        buf.push(*mode);
      }
      Fcall::Ropen { qid, iounit } => {
        put_qid(&mut buf, qid);
        put_u32(&mut buf, *iounit);
      }
      Fcall::Tread { fid, offset, count } => {
        put_u32(&mut buf, *fid);
        put_u64(&mut buf, *offset);
        put_u32(&mut buf, *count);
      }
      Fcall::Rread { data } => {
        put_u32(&mut buf, data.len() as u32);
        buf.extend_from_slice(data);
      }
      Fcall::Twrite { fid, offset, data } => {
        put_u32(&mut buf, *fid);
        put_u64(&mut buf, *offset);
        put_u32(&mut buf, data.len() as u32);
        buf.extend_from_slice(data);
      }
      Fcall::Rwrite { count } => put_u32(&mut buf, *count),
      Fcall::Tclunk { fid } => put_u32(&mut buf, *fid),
      Fcall::Rclunk => {}
    }

    let size = buf.len() as u32;
    buf[..4].copy_from_slice(&size.to_le_bytes());
    Ok(buf)
  }

  /// Decodes a complete message, size prefix included.
  pub fn decode(bytes: &[u8]) -> Result<Self> {
    let mut cur = Cursor::new(bytes);
    let size = cur.u32()? as usize;
    if size != bytes.len() {
      return Err(Error::Protocol(format!("size field {} does not match message length {}", size, bytes.len())));
    }

    let kind = cur.u8()?;
    let tag = cur.u16()?;
    let fcall = match kind {
      TVERSION => Fcall::Tversion { msize: cur.u32()?, version: cur.string()? },
      RVERSION => Fcall::Rversion { msize: cur.u32()?, version: cur.string()? },
      TATTACH => Fcall::Tattach {
        fid:   cur.u32()?,
        afid:  cur.u32()?,
        uname: cur.string()?,
        aname: cur.string()?
      },
      RATTACH => Fcall::Rattach { qid: cur.qid()? },
      RERROR => Fcall::Rerror { ename: cur.string()? },
      TWALK => {
        let fid = cur.u32()?;
        let newfid = cur.u32()?;
        let n = cur.u16()?;
        let wnames = (0..n).map(|_| cur.string()).collect::<Result<Vec<_>>>()?;
        Fcall::Twalk { fid, newfid, wnames }
      }
      RWALK => {
        let n = cur.u16()?;
        let qids = (0..n).map(|_| cur.qid()).collect::<Result<Vec<_>>>()?;
        Fcall::Rwalk { qids }
      }
      TOPEN => Fcall::Topen { fid: cur.u32()?, mode: cur.u8()? },
      ROPEN => Fcall::Ropen { qid: cur.qid()?, iounit: cur.u32()? },
      TREAD => Fcall::Tread { fid: cur.u32()?, offset: cur.u64()?, count: cur.u32()? },
      RREAD => {
        let count = cur.u32()? as usize;
        Fcall::Rread { data: cur.bytes(count)?.to_vec() }
      }
      TWRITE => {
        let fid = cur.u32()?;
        let offset = cur.u64()?;
        let count = cur.u32()? as usize;
        Fcall::Twrite { fid, offset, data: cur.bytes(count)?.to_vec() }
      }
      RWRITE => Fcall::Rwrite { count: cur.u32()? },
      TCLUNK => Fcall::Tclunk { fid: cur.u32()? },
      RCLUNK => Fcall::Rclunk,
      other => return Err(Error::Protocol(format!("unsupported message type {}", other)))
    };

    if !cur.is_empty() {
      return Err(Error::Protocol(format!("{} trailing bytes after type {} message", cur.remaining(), kind)));
    }

    Ok(Self { tag, fcall })
  }
}

impl Fcall {
  fn kind(&self) -> u8 {
    match self {
      Fcall::Tversion { .. } => TVERSION,
      Fcall::Rversion { .. } => RVERSION,
      Fcall::Tattach { .. } => TATTACH,
      Fcall::Rattach { .. } => RATTACH,
      Fcall::Rerror { .. } => RERROR,
      Fcall::Twalk { .. } => TWALK,
      Fcall::Rwalk { .. } => RWALK,
      Fcall::Topen { .. } => TOPEN,
      Fcall::Ropen { .. } => ROPEN,
      Fcall::Tread { .. } => TREAD,
      Fcall::Rread { .. } => RREAD,
      Fcall::Twrite { .. } => TWRITE,
      Fcall::Rwrite { .. } => RWRITE,
      Fcall::Tclunk { .. } => TCLUNK,
      Fcall::Rclunk => RCLUNK
    }
  }
}

/// Reads one whole message from `r`, refusing anything larger than `msize`.
pub fn read_msg<R: Read>(r: &mut R, msize: u32) -> Result<Msg> {
  let mut size = [0u8; 4];
  r.read_exact(&mut size)?;
  let len = u32::from_le_bytes(size);
  if len < 7 || len > msize {
    return Err(Error::Protocol(format!("bad message size {}", len)));
  }

  let mut bytes = vec![0u8; len as usize];
  bytes[..4].copy_from_slice(&size);
  r.read_exact(&mut bytes[4..])?;
  Msg::decode(&bytes)
}

pub fn write_msg<W: Write>(w: &mut W, msg: &Msg) -> Result<()> {
  w.write_all(&msg.encode()?)?;
  w.flush()?;
  Ok(())
}

fn put_u16(buf: &mut Vec<u8>, v: u16) {
  buf.extend_from_slice(&v.to_le_bytes());
}

fn put_u32(buf: &mut Vec<u8>, v: u32) {
  buf.extend_from_slice(&v.to_le_bytes());
}

fn put_u64(buf: &mut Vec<u8>, v: u64) {
  buf.extend_from_slice(&v.to_le_bytes());
}

fn len16(len: usize, what: &str) -> Result<u16> {
  u16::try_from(len).map_err(|_| Error::Protocol(format!("{} too long: {}", what, len)))
}

fn put_str(buf: &mut Vec<u8>, s: &str) -> Result<()> {
  put_u16(buf, len16(s.len(), "string")?);
  buf.extend_from_slice(s.as_bytes());
  Ok(())
}

fn put_qid(buf: &mut Vec<u8>, qid: &Qid) {
  buf.push(qid.kind);
  put_u32(buf, qid.version);
  put_u64(buf, qid.path);
}

struct Cursor<'a> {
  data: &'a [u8],
  pos:  usize
}

impl<'a> Cursor<'a> {
  fn new(data: &'a [u8]) -> Self {
    Self { data, pos: 0 }
  }

  fn remaining(&self) -> usize {
    self.data.len() - self.pos
  }

  fn is_empty(&self) -> bool {
    self.remaining() == 0
  }

  fn bytes(&mut self, n: usize) -> Result<&'a [u8]> {
    if self.remaining() < n {
      return Err(Error::Protocol(format!("short message: wanted {} bytes, {} left", n, self.remaining())));
    }
    let out = &self.data[self.pos..self.pos + n];
    self.pos += n;
    Ok(out)
  }

  fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
    let mut out = [0u8; N];
    out.copy_from_slice(self.bytes(N)?);
    Ok(out)
  }

  fn u8(&mut self) -> Result<u8> {
    Ok(self.bytes(1)?[0])
  }

  fn u16(&mut self) -> Result<u16> {
    self.array().map(u16::from_le_bytes)
  }

  fn u32(&mut self) -> Result<u32> {
    self.array().map(u32::from_le_bytes)
  }

  fn u64(&mut self) -> Result<u64> {
    self.array().map(u64::from_le_bytes)
  }

  fn string(&mut self) -> Result<String> {
    let len = self.u16()? as usize;
    let raw = self.bytes(len)?;
    String::from_utf8(raw.to_vec()).map_err(|_| Error::Protocol("string is not valid UTF-8".to_string()))
  }

  fn qid(&mut self) -> Result<Qid> {
    Ok(Qid { kind: self.u8()?, version: self.u32()?, path: self.u64()? })
  }
}
