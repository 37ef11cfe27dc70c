// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./context_test.rs"]
mod context_test;

use fh_assert::{AssertionRecorder, Expect};
use fh_error::ConfigurationError;
use fh_fixture::{Fixture, FixtureBuilder, Shape};
use fh_spy::{CallRecorder, FaultInjector};

//
// CaseContext
//

/// Everything a case body can reach while it runs.
pub struct CaseContext<'a> {
  name: &'a str,
  calls: &'a CallRecorder,
  assertions: &'a mut AssertionRecorder,
  fixtures: FixtureBuilder,
  // Errors queued by the call recorder that are already recorded. A body that also passes one of
  // them to `require` claims it here instead of recording it twice.
  unclaimed: Vec<ConfigurationError>,
}

impl<'a> CaseContext<'a> {
  pub(crate) fn new(
    name: &'a str,
    calls: &'a CallRecorder,
    assertions: &'a mut AssertionRecorder,
  ) -> Self {
    Self {
      name,
      calls,
      assertions,
      fixtures: FixtureBuilder::new(),
      unclaimed: Vec::new(),
    }
  }

  #[must_use]
  pub const fn name(&self) -> &str {
    self.name
  }

  /// The spies for this case. Pass this to the function under test.
  #[must_use]
  pub const fn calls(&self) -> &'a CallRecorder {
    self.calls
  }

  #[must_use]
  pub fn faults(&self) -> &'a FaultInjector {
    self.calls.faults()
  }

  /// Builds this case's fixture. A case gets one; asking again records a setup error and
  /// returns `None`.
  pub fn fixture(&mut self, shape: Shape) -> Option<Fixture> {
    let result = self.fixtures.build(shape);
    self.require(result)
  }

  pub fn setup_error(&mut self, error: &ConfigurationError) {
    self.flush_queued();
    if let Some(position) = self.unclaimed.iter().position(|queued| queued == error) {
      self.unclaimed.remove(position);
      return;
    }
    self.assertions.record_setup_error(error);
  }

  /// Unwraps a harness result, recording a setup error when it is an error.
  pub fn require<T>(&mut self, result: fh_error::Result<T>) -> Option<T> {
    match result {
      Ok(value) => Some(value),
      Err(e) => {
        self.setup_error(&e);
        None
      },
    }
  }

  /// Records the setup errors the call recorder queued since the last flush, so they land in the
  /// report where they happened.
  pub(crate) fn flush_queued(&mut self) {
    for error in self.calls.take_setup_errors() {
      self.assertions.record_setup_error(&error);
      self.unclaimed.push(error);
    }
  }
}

impl Expect for CaseContext<'_> {
  fn check(
    &mut self,
    name: &str,
    condition: bool,
    message: Option<String>,
    location: &'static str,
  ) -> bool {
    self.flush_queued();
    self.assertions.record_at(name, condition, message, location)
  }
}
