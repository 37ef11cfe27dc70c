// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

use crate::AssertionRecorder;
use fh_error::ConfigurationError;
use pretty_assertions::assert_eq;
use termcolor::NoColor;

fn render(recorder: &AssertionRecorder) -> String {
  let mut sink = NoColor::new(Vec::new());
  recorder.report(&mut sink).unwrap();
  String::from_utf8(sink.into_inner()).unwrap()
}

#[test]
fn empty_report() {
  assert_eq!("Summary: 0/0 passed\n", render(&AssertionRecorder::new()));
}

#[test]
fn lists_failures_in_order_then_summary() {
  let mut recorder = AssertionRecorder::new();
  recorder.begin_case("write_position_table");
  recorder.record("writes", true, None);
  recorder.record("directory", false, Some("expected 2 slot writes".to_string()));
  recorder.begin_case("parse_header");
  recorder.record_setup_error(&ConfigurationError::UnregisteredDependency(
    "crc32".to_string(),
  ));
  recorder.record_crash("parse_header: unexpected termination", "boom (at x.rs:1)");
  recorder.record("no message", false, None);

  assert_eq!(
    "[FAIL] write_position_table: expected 2 slot writes\n[SETUP-ERROR] parse_header: no spy \
     installed for dependency `crc32`\n[CRASH] parse_header: boom (at x.rs:1)\n[FAIL] \
     parse_header: no message\nSummary: 1/5 passed\n",
    render(&recorder)
  );
}

#[test]
fn top_level_failures_have_no_case_prefix() {
  let mut recorder = AssertionRecorder::new();
  recorder.record("global", false, None);
  assert_eq!("[FAIL] global\nSummary: 0/1 passed\n", render(&recorder));
}

#[test]
fn report_is_deterministic() {
  let mut recorder = AssertionRecorder::new();
  recorder.begin_case("case");
  recorder.record("a", false, None);
  recorder.record("b", true, None);
  assert_eq!(render(&recorder), render(&recorder));
}

#[test]
fn failure_lines_end_with_the_assertion_location() {
  let mut recorder = AssertionRecorder::new();
  recorder.begin_case("parse_header");
  recorder.record_at("crc", false, Some("crc mismatch".to_string()), "src/cases.rs:42");
  recorder.record_at("len", true, None, "src/cases.rs:43");

  assert_eq!(
    "[FAIL] parse_header: crc mismatch (at src/cases.rs:42)\nSummary: 1/2 passed\n",
    render(&recorder)
  );
}
