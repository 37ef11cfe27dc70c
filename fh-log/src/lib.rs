// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./lib_test.rs"]
mod tests;

use anyhow::anyhow;
use parking_lot::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::reload::Handle as ReloadHandle;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

// Report output goes to stdout, so logging stays quiet unless asked for.
const DEFAULT_FILTER_RULES: &str = "warn";

//
// HarnessLogger
//

// Process logger for the harness. Logs go to stderr and the filter can be swapped at runtime.
pub struct HarnessLogger {
  handle: Mutex<Option<ReloadHandle<EnvFilter, Registry>>>,
}

impl HarnessLogger {
  // Get the static instance of the logger.
  fn get() -> &'static Self {
    static LOGGER: HarnessLogger = HarnessLogger {
      handle: parking_lot::const_mutex(None),
    };

    &LOGGER
  }

  // Initialize the logger from RUST_LOG. Should be called as early as possible in the program.
  // Later calls are ignored, which lets every test binary call this from its own init.
  pub fn initialize() {
    let stderr = tracing_subscriber::fmt::layer()
      .with_writer(std::io::stderr)
      .with_ansi(std::env::var("FH_LOG_ANSI").is_ok())
      .with_line_number(true)
      .compact();

    let filter = EnvFilter::new(
      std::env::var("RUST_LOG")
        .as_deref()
        .unwrap_or(DEFAULT_FILTER_RULES),
    );

    let (filter, reload_handle) = tracing_subscriber::reload::Layer::new(filter);
    if Registry::default()
      .with(filter)
      .with(stderr)
      .try_init()
      .is_err()
    {
      log::debug!("logger already initialized");
      return;
    }

    *Self::get().handle.lock() = Some(reload_handle);
    Self::sync_max_level();
  }

  // Swap in a new filter using RUST_LOG syntax.
  pub fn swap(new_rust_log: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(new_rust_log)?;
    Self::get()
      .handle
      .lock()
      .as_ref()
      .ok_or_else(|| anyhow!("logger has not been initialized"))?
      .reload(filter)?;

    Self::sync_max_level();
    Ok(())
  }

  // tracing_subscriber does not update the `log` max level on reload, so do it by hand.
  fn sync_max_level() {
    log::set_max_level(tracing_log::AsLog::as_log(
      &tracing_subscriber::filter::LevelFilter::current(),
    ));
  }
}
