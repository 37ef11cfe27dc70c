// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

//! Non-terminating assertions. A failed expectation is recorded and execution continues, so a
//! single case can still reach the branches that come after the first mismatch.

#[cfg(test)]
#[path = "./lib_test.rs"]
mod tests;

#[cfg(test)]
#[ctor::ctor]
fn test_global_init() {
  fh_test_helpers::test_global_init();
}

pub mod macros;
pub mod report;

use fh_error::ConfigurationError;
pub use report::write_report;
use std::io;
use termcolor::WriteColor;

//
// ExpectationKind
//

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectationKind {
  /// A mismatch between expected and actual behavior of the function under test.
  Assertion,
  /// The case itself was set up wrong.
  SetupError,
  /// The case terminated abruptly.
  Crash,
}

impl ExpectationKind {
  /// Report line prefix, without brackets.
  #[must_use]
  pub const fn tag(self) -> &'static str {
    match self {
      Self::Assertion => "FAIL",
      Self::SetupError => "SETUP-ERROR",
      Self::Crash => "CRASH",
    }
  }
}

//
// Expectation
//

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Expectation {
  pub case: String,
  pub name: String,
  pub passed: bool,
  pub message: Option<String>,
  pub kind: ExpectationKind,
  /// `file:line` of the assertion that recorded this, when it came from an `expect*!` macro.
  pub location: Option<String>,
}

impl Expectation {
  /// The text shown for this expectation in a report: the message if there is one, otherwise the
  /// name.
  #[must_use]
  pub fn detail(&self) -> &str {
    self.message.as_deref().unwrap_or(&self.name)
  }
}

//
// Counts
//

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct Counts {
  pub total: usize,
  pub passed: usize,
  /// Every expectation that did not pass, whatever its kind.
  pub failed: usize,
  pub setup_errors: usize,
  pub crashed: usize,
}

impl Counts {
  #[must_use]
  pub fn of(expectations: &[Expectation]) -> Self {
    let mut counts = Self {
      total: expectations.len(),
      ..Self::default()
    };

    for expectation in expectations {
      if expectation.passed {
        counts.passed += 1;
        continue;
      }

      counts.failed += 1;
      match expectation.kind {
        ExpectationKind::Assertion => {},
        ExpectationKind::SetupError => counts.setup_errors += 1,
        ExpectationKind::Crash => counts.crashed += 1,
      }
    }

    counts
  }
}

//
// Expect
//

/// Anything that can record a named outcome. The `expect*!` macros are written against this
/// trait so they work on a bare recorder as well as on a runner's case context.
pub trait Expect {
  /// Records the outcome and returns `condition`, so callers can branch on it. `location` is the
  /// `file:line` of the assertion.
  fn check(
    &mut self,
    name: &str,
    condition: bool,
    message: Option<String>,
    location: &'static str,
  ) -> bool;
}

//
// AssertionRecorder
//

/// Ordered list of every expectation recorded during a run.
#[derive(Debug, Default)]
pub struct AssertionRecorder {
  case: String,
  expectations: Vec<Expectation>,
}

impl AssertionRecorder {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Sets the case name attached to every expectation recorded from now on.
  pub fn begin_case(&mut self, case: impl Into<String>) {
    self.case = case.into();
  }

  #[must_use]
  pub fn current_case(&self) -> &str {
    &self.case
  }

  pub fn record(
    &mut self,
    name: impl Into<String>,
    condition: bool,
    message: Option<String>,
  ) -> bool {
    self.push(name.into(), condition, message, ExpectationKind::Assertion, None);
    condition
  }

  /// Like [`Self::record`], tagging the expectation with the `file:line` it was written at.
  pub fn record_at(
    &mut self,
    name: impl Into<String>,
    condition: bool,
    message: Option<String>,
    location: &str,
  ) -> bool {
    self.push(
      name.into(),
      condition,
      message,
      ExpectationKind::Assertion,
      Some(location.to_string()),
    );
    condition
  }

  pub fn record_setup_error(&mut self, error: &ConfigurationError) {
    log::warn!("setup error in case {:?}: {error}", self.case);
    self.push(
      error.label().to_string(),
      false,
      Some(error.to_string()),
      ExpectationKind::SetupError,
      None,
    );
  }

  pub fn record_crash(&mut self, name: impl Into<String>, message: impl Into<String>) {
    let message = message.into();
    log::warn!("case {:?} crashed: {message}", self.case);
    self.push(name.into(), false, Some(message), ExpectationKind::Crash, None);
  }

  fn push(
    &mut self,
    name: String,
    passed: bool,
    message: Option<String>,
    kind: ExpectationKind,
    location: Option<String>,
  ) {
    self.expectations.push(Expectation {
      case: self.case.clone(),
      name,
      passed,
      message,
      kind,
      location,
    });
  }

  #[must_use]
  pub fn all_passed(&self) -> bool {
    self.expectations.iter().all(|expectation| expectation.passed)
  }

  #[must_use]
  pub fn expectations(&self) -> &[Expectation] {
    &self.expectations
  }

  /// Expectations recorded at or after `mark`, where `mark` is a previous value of `len()`.
  #[must_use]
  pub fn since(&self, mark: usize) -> &[Expectation] {
    self.expectations.get(mark ..).unwrap_or_default()
  }

  pub fn failures(&self) -> impl Iterator<Item = &Expectation> {
    self
      .expectations
      .iter()
      .filter(|expectation| !expectation.passed)
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.expectations.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.expectations.is_empty()
  }

  #[must_use]
  pub fn counts(&self) -> Counts {
    Counts::of(&self.expectations)
  }

  /// Removes every expectation and returns them in recording order.
  pub fn take(&mut self) -> Vec<Expectation> {
    self.case.clear();
    std::mem::take(&mut self.expectations)
  }

  pub fn report<W: WriteColor + ?Sized>(&self, sink: &mut W) -> io::Result<()> {
    write_report(sink, &self.expectations)
  }
}

impl Expect for AssertionRecorder {
  fn check(
    &mut self,
    name: &str,
    condition: bool,
    message: Option<String>,
    location: &'static str,
  ) -> bool {
    self.record_at(name, condition, message, location)
  }
}
