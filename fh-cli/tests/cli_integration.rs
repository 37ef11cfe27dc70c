// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;
  use std::process::{Command, Output};

  fn harness(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_focal-harness"))
      .args(args)
      .env_remove("FOCAL_HARNESS_FILTER")
      .env("RUST_LOG", "off")
      .output()
      .unwrap()
  }

  fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
  }

  #[test]
  fn every_registered_case_passes() {
    let output = harness(&[]);
    let stdout = stdout(&output);

    assert_eq!(Some(0), output.status.code(), "{stdout}");
    let lines: Vec<_> = stdout.lines().collect();
    assert_eq!(2, lines.len(), "{stdout}");
    assert!(lines[0].starts_with("Summary: "));
    assert_eq!("Cases: 9 passed, 0 failed, 0 crashed", lines[1]);

    let counts = lines[0]
      .trim_start_matches("Summary: ")
      .trim_end_matches(" passed");
    let (passed, total) = counts.split_once('/').unwrap();
    assert_eq!(passed, total);
  }

  #[test]
  fn list_prints_names_only() {
    let output = harness(&["--list", "--filter", "parse_header"]);

    assert!(output.status.success());
    assert_eq!(
      "parse_header_empty_buffer_is_invalid_input\nparse_header_detects_corrupted_crc\n",
      stdout(&output)
    );
  }

  #[test]
  fn filter_with_no_match_runs_nothing() {
    let output = harness(&["--filter", "no_such_case"]);

    assert!(output.status.success());
    assert_eq!(
      "Summary: 0/0 passed\nCases: 0 passed, 0 failed, 0 crashed\n",
      stdout(&output)
    );
  }

  #[test]
  fn json_report() {
    let output = harness(&["--format", "json", "--filter", "dup_list", "--repeat", "3"]);
    assert!(output.status.success());

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["total"], summary["passed"]);
    assert_eq!(serde_json::json!(0), summary["failed"]);
    assert_eq!(
      vec![
        "dup_list_copies_every_node",
        "dup_list_alloc_failure_leaves_no_partial_copy",
      ],
      summary["cases"]
        .as_array()
        .unwrap()
        .iter()
        .map(|case| case["name"].as_str().unwrap())
        .collect::<Vec<_>>()
    );
  }

  #[test]
  fn failures_set_the_exit_code_and_report_lines() {
    let output = harness(&["--include-selftest-failures", "--filter", "selftest_"]);
    let stdout = stdout(&output);

    assert_eq!(Some(3), output.status.code(), "{stdout}");
    let lines: Vec<_> = stdout.lines().collect();
    assert_eq!(5, lines.len(), "{stdout}");
    assert!(
      lines[0].starts_with("[FAIL] selftest_assertion_failure: expected `2 + 2` == `5`"),
      "{stdout}"
    );
    assert!(lines[0].contains("(at "), "{stdout}");
    assert!(lines[0].contains("cases.rs:"), "{stdout}");
    assert_eq!(
      "[SETUP-ERROR] selftest_setup_error: no spy installed for dependency `unregistered`",
      lines[1]
    );
    assert!(
      lines[2].starts_with("[CRASH] selftest_crash: unexpected termination: selftest crash (at "),
      "{stdout}"
    );
    assert_eq!("Summary: 1/4 passed", lines[3]);
    assert_eq!("Cases: 1 passed, 2 failed, 1 crashed", lines[4]);
  }

  #[test]
  fn selftest_cases_are_not_registered_by_default() {
    let output = harness(&["--list", "--filter", "selftest_"]);
    assert!(output.status.success());
    assert_eq!("", stdout(&output));
  }

  #[test]
  fn divergent_repeat_fails_even_when_the_first_run_passed() {
    let output = harness(&[
      "--include-selftest-failures",
      "--filter",
      "selftest_nondeterministic",
      "--repeat",
      "2",
    ]);
    let stdout = stdout(&output);
    let stderr = String::from_utf8(output.stderr.clone()).unwrap();

    assert_eq!(Some(1), output.status.code(), "{stdout}{stderr}");
    assert_eq!(
      "Summary: 1/1 passed\nCases: 1 passed, 0 failed, 0 crashed\n",
      stdout
    );
    assert!(
      stderr.contains("run 1 of 2 produced a different summary than the first run"),
      "{stderr}"
    );
  }

  #[test]
  fn repeat_must_be_positive() {
    let output = harness(&["--repeat", "0"]);
    assert_eq!(Some(2), output.status.code());
  }
}
