// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

use fh_panic::PanicType;
use std::io;
use termcolor::NoColor;

pub fn test_global_init() {
  // Harness tests deliberately panic inside caught cases, so panics must unwind rather than
  // abort. The capturing hook installed later by the runner sits on top of this one.
  fh_panic::default(PanicType::BacktraceOnly);

  fh_log::HarnessLogger::initialize();
}

/// Runs a report writer against an uncolored in-memory sink and returns what it wrote.
pub fn render_plain(write: impl FnOnce(&mut NoColor<Vec<u8>>) -> io::Result<()>) -> String {
  let mut sink = NoColor::new(Vec::new());
  write(&mut sink).unwrap();
  String::from_utf8(sink.into_inner()).unwrap()
}
