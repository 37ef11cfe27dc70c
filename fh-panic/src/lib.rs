// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

//! Standard Panic Handler Configuration
//! ====================================
//!
//! The harness treats a panic inside a test case as an unexpected termination of that case
//! only. To report it, the runner needs the panic message and location, which are only
//! available to the panic hook. [`capture`] installs a hook that stashes them for the thread
//! that is catching, and otherwise defers to whatever hook was installed before.
//!
//! Only unwinding panics can be observed. A build with `panic = "abort"` or a hardware fault in
//! the function under test still takes the whole process down.

pub mod capture;

use std::any::Any;
use std::panic::PanicHookInfo;

/// Extracts the message of a panic payload, which is a `&str` or a `String` for every panic
/// raised through the `panic!` family of macros.
#[must_use]
pub fn payload_message(payload: &(dyn Any + Send)) -> &str {
  payload.downcast_ref::<&str>().map_or_else(
    || payload.downcast_ref::<String>().map_or("<none>", |s| s),
    |s| s,
  )
}

fn hook_location(info: &PanicHookInfo<'_>) -> Option<String> {
  info
    .location()
    .map(|location| format!("{}:{}", location.file(), location.line()))
}

fn platform_default() {
  // Interactive runs get the colored backtrace. Scripted runs want each panic on a single log
  // line.
  if std::env::var("LOG_PANIC").is_ok() {
    std::panic::set_hook(Box::new(move |info| {
      let location = hook_location(info).unwrap_or_else(|| "<none>".to_string());
      log::error!(
        "panic: message=\"{}\" location={}",
        payload_message(info.payload()),
        location
      );
    }));
  } else {
    let trace_printer =
      color_backtrace::BacktracePrinter::default().message("Panic triggered backtrace");
    trace_printer.install(color_backtrace::default_output_stream());
  }
}

/// Type of panic to perform.
#[derive(Clone, Copy)]
pub enum PanicType {
  /// Print a backtrace and continue with default handling, so a surrounding `catch_unwind` can
  /// still recover.
  BacktraceOnly,
  /// Print a backtrace as in [`PanicType::BacktraceOnly`] and then force exit the process.
  /// Panics raised while [`capture::catch`] is active on the thread do not exit, whichever of
  /// this and [`capture::install`] ran first.
  ForceAbort,
}

/// Configure the default panic handler based on the specified panic type.
pub fn default(panic_type: PanicType) {
  platform_default();

  if matches!(panic_type, PanicType::ForceAbort) {
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
      default_panic(info);
      log::error!("Forcing process exit after panic");
      #[allow(clippy::exit)]
      std::process::exit(1);
    }));
  }

  // Replacing the hook above drops a capturing hook installed earlier.
  capture::reinstall();
  log::debug!("Registered default panic handler");
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn defaults_dont_panic() {
    default(PanicType::BacktraceOnly);
  }

  #[test]
  fn payload_message_handles_both_string_types() {
    let borrowed: Box<dyn Any + Send> = Box::new("static message");
    let owned: Box<dyn Any + Send> = Box::new(format!("owned {}", 7));
    let other: Box<dyn Any + Send> = Box::new(17_u32);

    assert_eq!("static message", payload_message(&*borrowed));
    assert_eq!("owned 7", payload_message(&*owned));
    assert_eq!("<none>", payload_message(&*other));
  }
}
