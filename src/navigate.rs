//! Showing a location: retarget an open window, or plumb the file.

use std::path::Path;

use crate::acme::{EditorWindow, WinInfo, WindowService};
use crate::config::Settings;
use crate::error::{Error, Failures, NavigateError};
use crate::location::Location;
use crate::plumb::{Attribute, Message, OpenChannel, PlumbError};
use crate::profile;
use crate::resolve::find_open_view;

/// What was done for one location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
  /// The address was shown in an already open window.
  Retarget(WinInfo),
  /// The file was sent to the plumber.
  Open
}

pub struct Navigator<'a, S: ?Sized, C: ?Sized> {
  service:  &'a S,
  channel:  &'a C,
  settings: &'a Settings,
  base_dir: &'a Path
}

impl<'a, S, C> Navigator<'a, S, C>
where
  S: WindowService + ?Sized,
  C: OpenChannel + ?Sized
{
  pub fn new(service: &'a S, channel: &'a C, settings: &'a Settings, base_dir: &'a Path) -> Self {
    Self { service, channel, settings, base_dir }
  }

  /// Selects and shows `addr` in an already open window.
  pub fn retarget(&self, view: &WinInfo, addr: &str) -> Result<(), NavigateError> {
    profile!("Retarget window");
    let mut win = self.service.open(view.id).map_err(|source| NavigateError::OpenView {
      id: view.id,
      path: view.name.clone(),
      source
    })?;

    win
      .show(addr)
      .map_err(|source| NavigateError::Retarget { path: view.name.clone(), source })
  }

  /// Asks the plumber's edit port to open `path` at `addr`.
  pub fn request_open(&self, path: &str, addr: &str) -> Result<(), NavigateError> {
    let msg = Message {
      src:   self.settings.source.clone(),
      dst:   self.settings.destination.clone(),
      wdir:  self.base_dir.to_string_lossy().into_owned(),
      kind:  "text".to_string(),
      attrs: vec![Attribute { name: "addr".to_string(), value: addr.to_string() }],
      data:  path.as_bytes().to_vec()
    };

    self.channel.send(&msg).map_err(|err| match err {
      PlumbError::Unavailable(source) => NavigateError::ChannelUnavailable(source),
      PlumbError::Send(source) => NavigateError::SendFailed { path: path.to_string(), source }
    })
  }

  /// Retargets the window already showing the file, or plumbs it if none is.
  pub fn show_or_open(&self, loc: &Location) -> Result<Dispatch, NavigateError> {
    match find_open_view(self.service, &loc.path)? {
      Some(view) => {
        log::debug!("Showing {} in window {}", loc, view.id);
        self.retarget(&view, &loc.addr)?;
        Ok(Dispatch::Retarget(view))
      }
      None => {
        log::debug!("No window for {}, plumbing", loc.path);
        self.request_open(&loc.path, &loc.addr)?;
        Ok(Dispatch::Open)
      }
    }
  }

  /// Shows every location even if an earlier one fails; fails if any did.
  pub fn navigate(&self, locs: &[Location]) -> Result<Vec<Dispatch>, Error> {
    let mut dispatched = Vec::with_capacity(locs.len());
    let mut failures = Failures::default();

    for loc in locs {
      match self.show_or_open(loc) {
        Ok(dispatch) => dispatched.push(dispatch),
        Err(err) => {
          log::debug!("Failed to show {}: {}", loc, err);
          failures.0.push((loc.clone(), err));
        }
      }
    }

    if failures.0.is_empty() {
      Ok(dispatched)
    } else {
      Err(Error::Navigation(failures))
    }
  }
}
