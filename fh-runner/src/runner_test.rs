// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

use super::{CaseCounts, RunSummary, Runner};
use crate::case::{Case, CaseResult, CaseStatus};
use assert_matches::assert_matches;
use fh_assert::{ExpectationKind, expect, expect_eq};
use fh_error::ConfigurationError;
use fh_fixture::{Shape, TeardownReport};
use fh_spy::{Fault, Value};
use fh_test_helpers::render_plain;
use pretty_assertions::assert_eq;
use std::sync::{Arc, OnceLock};
use std::sync::atomic::{AtomicUsize, Ordering};

fn passing(name: &str) -> Case {
  Case::new(name, |ctx| {
    expect!(ctx, 1 + 1 == 2);
  })
}

const FAILING_LINE: u32 = line!() + 3;
fn failing(name: &str) -> Case {
  Case::new(name, |ctx| {
    expect_eq!(ctx, 2 + 2, 5);
  })
}

fn crashing(name: &str) -> Case {
  Case::new(name, |ctx| {
    expect!(ctx, true);
    panic!("boom");
  })
}

#[test]
fn statuses() {
  let mut runner = Runner::new();

  assert_eq!(CaseStatus::Passed, runner.run_case(&passing("pass")));
  assert_eq!(CaseStatus::Failed, runner.run_case(&failing("fail")));
  assert_eq!(CaseStatus::Crashed, runner.run_case(&crashing("crash")));
  assert_eq!(CaseStatus::Passed, runner.run_case(&Case::new("empty", |_| {})));
}

#[test]
fn crash_is_one_expectation_with_the_payload() {
  let mut runner = Runner::new();
  runner.run_case(&crashing("crash"));

  let expectations = runner.expectations();
  assert_eq!(2, expectations.len());
  assert!(expectations[0].passed);

  let crash = &expectations[1];
  assert_eq!(ExpectationKind::Crash, crash.kind);
  assert_eq!("crash: unexpected termination", crash.name);
  assert_eq!("crash", crash.case);
  assert_matches!(
    &crash.message,
    Some(message) if message.starts_with("unexpected termination: boom (at ") && message.contains("runner_test.rs")
  );
}

#[test]
fn swallowed_setup_errors_are_still_reported() {
  let mut runner = Runner::new();
  let status = runner.run_case(&Case::new("unregistered", |ctx| {
    // The function under test ignores the error; the runner must not.
    let _ = ctx.calls().invoke("malloc", &[Value::UInt(8)]);
    expect!(ctx, true);
  }));

  assert_eq!(CaseStatus::Failed, status);
  let setup_error = &runner.expectations()[0];
  assert_eq!(ExpectationKind::SetupError, setup_error.kind);
  assert_eq!(
    Some("no spy installed for dependency `malloc`"),
    setup_error.message.as_deref()
  );
}

#[test]
fn required_invoke_error_is_recorded_once() {
  let mut runner = Runner::new();
  let status = runner.run_case(&Case::new("required", |ctx| {
    let result = ctx.calls().invoke("missing", &[]);
    assert_eq!(None, ctx.require(result));
  }));

  assert_eq!(CaseStatus::Failed, status);
  assert_eq!(1, runner.expectations().len());
  assert_eq!("unregistered_dependency", runner.expectations()[0].name);
}

#[test]
fn required_invoke_error_is_recorded_once_after_a_later_assertion() {
  let mut runner = Runner::new();
  runner.run_case(&Case::new("required_late", |ctx| {
    let first = ctx.calls().invoke("missing", &[]);
    let second = ctx.calls().invoke("missing", &[]);
    expect!(ctx, true);
    ctx.require(first);
    ctx.require(second);
  }));

  let kinds: Vec<_> = runner
    .expectations()
    .iter()
    .map(|expectation| expectation.kind)
    .collect();
  assert_eq!(
    vec![
      ExpectationKind::SetupError,
      ExpectationKind::SetupError,
      ExpectationKind::Assertion,
    ],
    kinds
  );
}

#[test]
fn explicit_setup_errors_are_not_swallowed_by_queued_ones() {
  let mut runner = Runner::new();
  runner.run_case(&Case::new("explicit", |ctx| {
    let _ = ctx.calls().invoke("missing", &[]);
    ctx.setup_error(&ConfigurationError::FixtureAlreadyBuilt);
  }));

  let names: Vec<_> = runner
    .expectations()
    .iter()
    .map(|expectation| expectation.name.as_str())
    .collect();
  assert_eq!(vec!["unregistered_dependency", "fixture_already_built"], names);
}

#[test]
fn setup_errors_keep_their_place_in_recording_order() {
  let mut runner = Runner::new();
  runner.run_case(&Case::new("ordered", |ctx| {
    let _ = ctx.calls().invoke("missing", &[]);
    expect!(ctx, false);
    let _ = ctx.calls().invoke("also_missing", &[]);
  }));

  let recorded: Vec<_> = runner
    .expectations()
    .iter()
    .map(|expectation| (expectation.kind, expectation.name.as_str()))
    .collect();
  assert_eq!(
    vec![
      (ExpectationKind::SetupError, "unregistered_dependency"),
      (ExpectationKind::Assertion, "false"),
      (ExpectationKind::SetupError, "unregistered_dependency"),
    ],
    recorded
  );
}

#[test]
fn cases_are_isolated() {
  let cases = vec![
    Case::new("installs", |ctx| {
      ctx.calls().install_returning("alloc", Value::Ptr(0x10));
      ctx.faults().set_failure_always("alloc", Fault::Null);
      let result = ctx.calls().invoke("alloc", &[]).unwrap_or_default();
      expect!(ctx, result.is_null());
    }),
    Case::new("observes", |ctx| {
      expect!(ctx, !ctx.calls().is_installed("alloc"));
      expect_eq!(ctx, ctx.calls().call_count("alloc"), 0);
      expect!(ctx, ctx.faults().is_empty());
    }),
    // Panics while holding spy state must not leak into the next case either.
    Case::new("crashes_mid_case", |ctx| {
      ctx.calls().install_returning("write", true);
      let _ = ctx.calls().invoke("write", &[]);
      panic!("mid-case");
    }),
    Case::new("after_crash", |ctx| {
      expect!(ctx, ctx.calls().call_log().is_empty());
    }),
  ];

  let summary = Runner::new().run_all(&cases);
  assert_eq!(
    vec![
      CaseStatus::Passed,
      CaseStatus::Passed,
      CaseStatus::Crashed,
      CaseStatus::Passed,
    ],
    summary
      .cases
      .iter()
      .map(|case| case.status)
      .collect::<Vec<_>>()
  );
}

#[test]
fn fixtures_are_torn_down_after_a_crash() {
  let watch = Arc::new(OnceLock::new());
  let watch_clone = watch.clone();
  let mut runner = Runner::new();

  let status = runner.run_case(&Case::new("fixture_crash", move |ctx| {
    let Some(mut fixture) = ctx.fixture(Shape::linked_list([1, 2, 3])) else {
      return;
    };
    fixture.release(fixture.head().unwrap()).unwrap();
    watch_clone.set(fixture.watch()).unwrap();
    assert!(!fixture.is_torn_down());
    panic!("after building");
  }));

  assert_eq!(CaseStatus::Crashed, status);
  assert_eq!(1, runner.expectations().len());
  assert_eq!(
    Some(TeardownReport {
      freed: 2,
      skipped: 1,
    }),
    watch.get().unwrap().report()
  );
}

#[test]
fn run_all_summary_and_report() {
  let cases = vec![
    passing("one"),
    failing("two"),
    crashing("three"),
  ];
  let summary = Runner::new().run_all(&cases);

  assert_eq!(4, summary.total);
  assert_eq!(2, summary.passed);
  assert_eq!(2, summary.failed);
  assert_eq!(
    CaseCounts {
      passed: 1,
      failed: 1,
      crashed: 1,
    },
    summary.case_counts()
  );
  assert!(!summary.all_passed());
  assert_eq!(2, summary.exit_code());

  let report = render_plain(|sink| summary.write_report(sink));
  let lines: Vec<_> = report.lines().collect();
  assert_eq!(4, lines.len());
  assert!(
    lines[0].starts_with("[FAIL] two: expected `2 + 2` == `5` (left: 4, right: 5) (at "),
    "{}",
    lines[0]
  );
  assert!(lines[0].ends_with(&format!("runner_test.rs:{})", FAILING_LINE)));
  assert!(lines[1].starts_with("[CRASH] three: unexpected termination: boom"));
  assert_eq!("Summary: 2/4 passed", lines[2]);
  assert_eq!("Cases: 1 passed, 1 failed, 1 crashed", lines[3]);
}

#[test]
fn exit_code_bounds() {
  let all_pass = RunSummary {
    cases: vec![CaseResult {
      name: "a".to_string(),
      status: CaseStatus::Passed,
    }],
    ..RunSummary::default()
  };
  assert_eq!(0, all_pass.exit_code());
  assert!(all_pass.all_passed());
  assert_eq!(0, RunSummary::default().exit_code());

  let many_failures = RunSummary {
    cases: (0 .. 300)
      .map(|i| CaseResult {
        name: format!("case_{i}"),
        status: CaseStatus::Failed,
      })
      .collect(),
    ..RunSummary::default()
  };
  assert_eq!(255, many_failures.exit_code());
}

#[test]
fn runs_are_deterministic() {
  let cases = vec![
    passing("one"),
    failing("two"),
    crashing("three"),
    Case::new("spies", |ctx| {
      ctx.calls().install_returning("tell", 7_u64);
      let _ = ctx.calls().invoke("tell", &[]);
      expect_eq!(ctx, ctx.calls().call_count("tell"), 1);
    }),
  ];

  let report = Runner::new().run_repeated(&cases, 3);
  assert!(report.is_deterministic());
  assert_eq!(3, report.runs);
  assert_eq!(4, report.summary.cases.len());
}

#[test]
fn divergent_runs_are_detected() {
  let counter = Arc::new(AtomicUsize::new(0));
  let cases = vec![Case::new("flaky", move |ctx| {
    let run = counter.fetch_add(1, Ordering::SeqCst);
    expect!(ctx, run == 0);
  })];

  let report = Runner::new().run_repeated(&cases, 3);
  assert_eq!(Some(1), report.divergent_run);
  assert!(!report.is_deterministic());
}

#[test]
fn repeat_zero_runs_once() {
  let report = Runner::new().run_repeated(&[passing("one")], 0);
  assert_eq!(1, report.runs);
  assert!(report.is_deterministic());
}

#[test]
fn summary_serializes_to_json() {
  let summary = Runner::new().run_all(&[failing("two")]);
  let json = serde_json::to_value(&summary).unwrap();

  assert_eq!(serde_json::json!(1), json["total"]);
  assert_eq!(serde_json::json!("failed"), json["cases"][0]["status"]);
  assert_eq!(serde_json::json!("assertion"), json["expectations"][0]["kind"]);
}
