// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./runner_test.rs"]
mod runner_test;

use crate::case::{Case, CaseResult, CaseStatus};
use crate::context::CaseContext;
use fh_assert::{AssertionRecorder, Counts, Expectation, write_report};
use fh_spy::CallRecorder;
use std::io;
use termcolor::WriteColor;

//
// CaseCounts
//

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct CaseCounts {
  pub passed: usize,
  pub failed: usize,
  pub crashed: usize,
}

//
// RunSummary
//

/// The outcome of one pass over a case list. Counts are over expectations; `cases` holds the
/// per-case status in run order.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct RunSummary {
  pub total: usize,
  pub passed: usize,
  pub failed: usize,
  pub expectations: Vec<Expectation>,
  pub cases: Vec<CaseResult>,
}

impl RunSummary {
  fn new(expectations: Vec<Expectation>, cases: Vec<CaseResult>) -> Self {
    let counts = Counts::of(&expectations);
    Self {
      total: counts.total,
      passed: counts.passed,
      failed: counts.failed,
      expectations,
      cases,
    }
  }

  #[must_use]
  pub fn case_counts(&self) -> CaseCounts {
    let mut counts = CaseCounts::default();
    for case in &self.cases {
      match case.status {
        CaseStatus::Passed => counts.passed += 1,
        CaseStatus::Crashed => counts.crashed += 1,
        CaseStatus::NotRun | CaseStatus::Running | CaseStatus::Failed => counts.failed += 1,
      }
    }
    counts
  }

  #[must_use]
  pub fn all_passed(&self) -> bool {
    self
      .cases
      .iter()
      .all(|case| case.status == CaseStatus::Passed)
  }

  /// 0 when every case passed, otherwise the number of cases that did not, clamped to
  /// `1 ..= 255` so it survives as a process exit status.
  #[must_use]
  pub fn exit_code(&self) -> i32 {
    let counts = self.case_counts();
    let not_passed = counts.failed + counts.crashed;
    if not_passed == 0 {
      return 0;
    }

    i32::try_from(not_passed.min(255)).unwrap_or(255)
  }

  pub fn write_report<W: WriteColor + ?Sized>(&self, sink: &mut W) -> io::Result<()> {
    write_report(sink, &self.expectations)?;
    let counts = self.case_counts();
    writeln!(
      sink,
      "Cases: {} passed, {} failed, {} crashed",
      counts.passed, counts.failed, counts.crashed
    )
  }
}

//
// RepeatReport
//

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepeatReport {
  /// The summary of the first run.
  pub summary: RunSummary,
  pub runs: usize,
  /// The first run (0-based) whose summary differed from the first one.
  pub divergent_run: Option<usize>,
}

impl RepeatReport {
  #[must_use]
  pub const fn is_deterministic(&self) -> bool {
    self.divergent_run.is_none()
  }
}

//
// Runner
//

/// Owns the call recorder and assertion recorder for a run. Cases run one at a time, in the
/// order given.
#[derive(Default)]
pub struct Runner {
  calls: CallRecorder,
  assertions: AssertionRecorder,
}

impl Runner {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Runs one case. Its expectations are appended to the ones already recorded by this runner.
  pub fn run_case(&mut self, case: &Case) -> CaseStatus {
    let mut status = CaseStatus::NotRun;
    let mark = self.assertions.len();

    self.calls.clear();
    self.assertions.begin_case(case.name());
    status.advance(CaseStatus::Running);
    log::debug!("running case {:?}", case.name());

    let outcome = {
      let mut context = CaseContext::new(case.name(), &self.calls, &mut self.assertions);
      let outcome = fh_panic::capture::catch(|| case.run(&mut context));
      context.flush_queued();
      outcome
    };

    if let Err(report) = &outcome {
      self.assertions.record_crash(
        format!("{}: unexpected termination", case.name()),
        format!("unexpected termination: {report}"),
      );
    }
    self.calls.clear();

    status.advance(if outcome.is_err() {
      CaseStatus::Crashed
    } else if self
      .assertions
      .since(mark)
      .iter()
      .all(|expectation| expectation.passed)
    {
      CaseStatus::Passed
    } else {
      CaseStatus::Failed
    });
    log::debug!("case {:?} finished: {status:?}", case.name());
    status
  }

  /// Runs every case in order and returns the summary. The runner starts the next run empty.
  pub fn run_all(&mut self, cases: &[Case]) -> RunSummary {
    self.assertions.take();

    let results = cases
      .iter()
      .map(|case| CaseResult {
        name: case.name().to_string(),
        status: self.run_case(case),
      })
      .collect();

    RunSummary::new(self.assertions.take(), results)
  }

  /// Runs the list `times` times (at least once) and compares each summary to the first.
  pub fn run_repeated(&mut self, cases: &[Case], times: usize) -> RepeatReport {
    let summary = self.run_all(cases);
    let runs = times.max(1);

    let divergent_run = (1 .. runs).find(|_| self.run_all(cases) != summary);
    if let Some(run) = divergent_run {
      log::warn!("run {run} produced a different summary than run 0");
    }

    RepeatReport {
      summary,
      runs,
      divergent_run,
    }
  }

  /// Expectations recorded since the last `run_all`.
  #[must_use]
  pub fn expectations(&self) -> &[Expectation] {
    self.assertions.expectations()
  }
}
