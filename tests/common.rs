#![allow(dead_code)]
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use nextdiff::acme::{EditorWindow, WinInfo, WindowService};
use nextdiff::config::Settings;
use nextdiff::ninep::{Error, Result};
use nextdiff::plumb::{Message, OpenChannel, PlumbError};
use nextdiff::Invocation;

pub const CONTROL_WINID: u32 = 1;

/// Every request made of the fakes, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
  Windows,
  Open(u32),
  ReadAddr(u32),
  WriteAddr(u32, String),
  Ctl(u32, String),
  ReadXdata(u32),
  Close(u32),
  Plumb { path: String, addr: String }
}

pub type CallLog = Rc<RefCell<Vec<Call>>>;

fn record(log: &CallLog, fail_on: &Option<Call>, call: Call) -> Result<()> {
  log.borrow_mut().push(call.clone());
  if fail_on.as_ref() == Some(&call) {
    return Err(Error::Remote(format!("fake failure on {:?}", call)));
  }
  Ok(())
}

pub struct FakeAcme {
  pub log:       CallLog,
  pub windows:   Vec<WinInfo>,
  pub diff_line: String,
  pub fail_on:   Option<Call>
}

impl FakeAcme {
  pub fn new(diff_line: &str) -> Self {
    Self {
      log:       Rc::new(RefCell::new(Vec::new())),
      windows:   Vec::new(),
      diff_line: diff_line.to_string(),
      fail_on:   None
    }
  }

  pub fn with_window(mut self, id: u32, name: &str) -> Self {
    self.windows.push(WinInfo { id, name: name.to_string() });
    self
  }

  pub fn failing_on(mut self, call: Call) -> Self {
    self.fail_on = Some(call);
    self
  }

  pub fn calls(&self) -> Vec<Call> {
    self.log.borrow().clone()
  }
}

impl WindowService for FakeAcme {
  type Window = FakeWin;

  fn windows(&self) -> Result<Vec<WinInfo>> {
    record(&self.log, &self.fail_on, Call::Windows)?;
    Ok(self.windows.clone())
  }

  fn open(&self, id: u32) -> Result<FakeWin> {
    record(&self.log, &self.fail_on, Call::Open(id))?;
    Ok(FakeWin {
      id,
      log: Rc::clone(&self.log),
      fail_on: self.fail_on.clone(),
      diff_line: self.diff_line.clone()
    })
  }
}

pub struct FakeWin {
  id:        u32,
  log:       CallLog,
  fail_on:   Option<Call>,
  diff_line: String
}

impl EditorWindow for FakeWin {
  fn read_addr(&mut self) -> Result<(usize, usize)> {
    record(&self.log, &self.fail_on, Call::ReadAddr(self.id))?;
    Ok((0, 0))
  }

  fn write_addr(&mut self, addr: &str) -> Result<()> {
    record(&self.log, &self.fail_on, Call::WriteAddr(self.id, addr.to_string()))
  }

  fn ctl(&mut self, cmd: &str) -> Result<()> {
    record(&self.log, &self.fail_on, Call::Ctl(self.id, cmd.to_string()))
  }

  fn read_xdata(&mut self) -> Result<String> {
    record(&self.log, &self.fail_on, Call::ReadXdata(self.id))?;
    Ok(self.diff_line.clone())
  }
}

impl Drop for FakeWin {
  fn drop(&mut self) {
    self.log.borrow_mut().push(Call::Close(self.id));
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlumbFailure {
  Unavailable,
  Send
}

pub struct FakePlumber {
  pub log:      CallLog,
  pub messages: RefCell<Vec<Message>>,
  pub failure:  Option<PlumbFailure>
}

impl FakePlumber {
  /// Shares the acme fake's log so calls to both are ordered.
  pub fn new(acme: &FakeAcme) -> Self {
    Self { log: Rc::clone(&acme.log), messages: RefCell::new(Vec::new()), failure: None }
  }

  pub fn failing(mut self, failure: PlumbFailure) -> Self {
    self.failure = Some(failure);
    self
  }

  pub fn sent(&self) -> Vec<Message> {
    self.messages.borrow().clone()
  }
}

impl OpenChannel for FakePlumber {
  fn send(&self, msg: &Message) -> std::result::Result<(), PlumbError> {
    let path = String::from_utf8_lossy(&msg.data).into_owned();
    let addr = msg.attr("addr").unwrap_or_default().to_string();
    self.log.borrow_mut().push(Call::Plumb { path, addr });

    match self.failure {
      Some(PlumbFailure::Unavailable) => Err(PlumbError::Unavailable(Error::Remote("no plumber".to_string()))),
      Some(PlumbFailure::Send) => Err(PlumbError::Send(Error::Remote("write refused".to_string()))),
      None => {
        self.messages.borrow_mut().push(msg.clone());
        Ok(())
      }
    }
  }
}

pub fn invocation(base_dir: &str) -> Invocation {
  Invocation {
    winid:    Some(CONTROL_WINID.to_string()),
    base_dir: PathBuf::from(base_dir),
    settings: Settings::default()
  }
}

pub fn plumbed(path: &str, addr: &str) -> Call {
  Call::Plumb { path: path.to_string(), addr: addr.to_string() }
}
