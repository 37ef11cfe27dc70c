// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./capture_test.rs"]
mod capture_test;

use crate::{hook_location, payload_message};
use std::cell::{Cell, RefCell};
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

//
// PanicReport
//

/// What the panic hook saw for a panic raised inside [`catch`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PanicReport {
  pub message: String,
  pub location: Option<String>,
}

impl Display for PanicReport {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match &self.location {
      Some(location) => write!(f, "{} (at {location})", self.message),
      None => write!(f, "{}", self.message),
    }
  }
}

thread_local! {
  static CATCHING: Cell<bool> = const { Cell::new(false) };
  static LAST_PANIC: RefCell<Option<PanicReport>> = const { RefCell::new(None) };
}

static INSTALL: Once = Once::new();

/// Installs the capturing hook on top of whatever hook is currently set. Panics on threads that
/// are not inside [`catch`] are forwarded to the previous hook unchanged. Only the first call has
/// an effect.
pub fn install() {
  INSTALL.call_once(chain);
}

/// Puts the capturing hook back on top after the hook was replaced, if [`install`] ran before.
pub(crate) fn reinstall() {
  if INSTALL.is_completed() {
    chain();
  }
}

fn chain() {
  let previous = panic::take_hook();
  panic::set_hook(Box::new(move |info| {
    if is_catching() {
      let report = PanicReport {
        message: payload_message(info.payload()).to_string(),
        location: hook_location(info),
      };
      log::warn!("captured panic: {report}");
      LAST_PANIC.with(|last| *last.borrow_mut() = Some(report));
    } else {
      previous(info);
    }
  }));
  log::debug!("Registered capturing panic hook");
}

/// Whether the current thread is inside [`catch`].
#[must_use]
pub fn is_catching() -> bool {
  CATCHING.with(Cell::get)
}

/// Runs `f`, converting an unwinding panic into a [`PanicReport`]. State that `f` mutated before
/// panicking stays as it was left; callers must be prepared to observe it.
pub fn catch<T>(f: impl FnOnce() -> T) -> Result<T, PanicReport> {
  install();

  let was_catching = CATCHING.with(|catching| catching.replace(true));
  LAST_PANIC.with(|last| last.borrow_mut().take());

  let result = panic::catch_unwind(AssertUnwindSafe(f));

  CATCHING.with(|catching| catching.set(was_catching));

  result.map_err(|payload| {
    // The hook may have been replaced after install(), in which case only the payload is left.
    LAST_PANIC
      .with(|last| last.borrow_mut().take())
      .unwrap_or_else(|| PanicReport {
        message: payload_message(&*payload).to_string(),
        location: None,
      })
  })
}
