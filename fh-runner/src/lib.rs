// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

//! Runs cases against one call recorder and one assertion recorder, isolating every case from
//! the next: spies, fault rules and fixtures never outlive the case that created them, and a
//! panicking case is reported as a crash instead of taking the run down.

#[cfg(test)]
#[ctor::ctor]
fn test_global_init() {
  fh_test_helpers::test_global_init();
}

pub mod case;
pub mod context;
pub mod runner;

pub use case::{Case, CaseResult, CaseStatus, filter};
pub use context::CaseContext;
pub use runner::{CaseCounts, RepeatReport, RunSummary, Runner};
