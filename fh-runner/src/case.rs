// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./case_test.rs"]
mod case_test;

use crate::context::CaseContext;
use std::fmt::Debug;
use std::sync::Arc;

pub type CaseBody = dyn Fn(&mut CaseContext<'_>) + Send + Sync;

//
// Case
//

/// A named test body. Bodies are `Fn` so the same case list can be run more than once.
#[derive(Clone)]
pub struct Case {
  name: String,
  body: Arc<CaseBody>,
}

impl Case {
  pub fn new(
    name: impl Into<String>,
    body: impl Fn(&mut CaseContext<'_>) + Send + Sync + 'static,
  ) -> Self {
    Self {
      name: name.into(),
      body: Arc::new(body),
    }
  }

  #[must_use]
  pub fn name(&self) -> &str {
    &self.name
  }

  pub(crate) fn run(&self, context: &mut CaseContext<'_>) {
    (self.body)(context);
  }
}

impl Debug for Case {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Case").field("name", &self.name).finish()
  }
}

/// The cases whose name contains `pattern`, in their original order. An empty pattern keeps
/// every case.
#[must_use]
pub fn filter(cases: &[Case], pattern: &str) -> Vec<Case> {
  cases
    .iter()
    .filter(|case| case.name.contains(pattern))
    .cloned()
    .collect()
}

//
// CaseStatus
//

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
  #[default]
  NotRun,
  Running,
  Passed,
  /// At least one assertion failed or a setup error was recorded.
  Failed,
  /// The body terminated abruptly. Never downgraded to `Failed`.
  Crashed,
}

impl CaseStatus {
  #[must_use]
  pub const fn is_terminal(self) -> bool {
    matches!(self, Self::Passed | Self::Failed | Self::Crashed)
  }

  /// Whether `self -> next` is a legal transition: `NotRun -> Running -> {Passed, Failed,
  /// Crashed}`.
  #[must_use]
  pub const fn can_become(self, next: Self) -> bool {
    matches!(
      (self, next),
      (Self::NotRun, Self::Running) | (Self::Running, Self::Passed | Self::Failed | Self::Crashed)
    )
  }

  pub(crate) fn advance(&mut self, next: Self) {
    debug_assert!(self.can_become(next), "{self:?} -> {next:?}");
    *self = next;
  }
}

//
// CaseResult
//

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct CaseResult {
  pub name: String,
  pub status: CaseStatus,
}
