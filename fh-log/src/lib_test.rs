// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

use super::HarnessLogger;

#[test]
fn initialize_is_idempotent_and_filters_swap() {
  HarnessLogger::initialize();
  HarnessLogger::initialize();

  HarnessLogger::swap("debug").unwrap();
  assert_eq!(log::LevelFilter::Debug, log::max_level());

  HarnessLogger::swap("fh_spy=trace,warn").unwrap();
  assert_eq!(log::LevelFilter::Trace, log::max_level());

  assert!(HarnessLogger::swap("warn,fh_spy=loud").is_err());
}
