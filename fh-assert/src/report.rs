// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./report_test.rs"]
mod report_test;

use crate::{Counts, Expectation, ExpectationKind};
use std::io;
use termcolor::{Color, ColorSpec, WriteColor};

const fn tag_color(kind: ExpectationKind) -> Color {
  match kind {
    ExpectationKind::Assertion => Color::Red,
    ExpectationKind::SetupError => Color::Yellow,
    ExpectationKind::Crash => Color::Magenta,
  }
}

/// Writes one line per expectation that did not pass, in recording order, followed by the
/// summary line. Passing the sink through `termcolor::NoColor` yields the plain text format.
pub fn write_report<W: WriteColor + ?Sized>(
  sink: &mut W,
  expectations: &[Expectation],
) -> io::Result<()> {
  for expectation in expectations.iter().filter(|expectation| !expectation.passed) {
    write_failure(sink, expectation)?;
  }

  let counts = Counts::of(expectations);
  writeln!(sink, "Summary: {}/{} passed", counts.passed, counts.total)
}

fn write_failure<W: WriteColor + ?Sized>(sink: &mut W, expectation: &Expectation) -> io::Result<()> {
  sink.set_color(
    ColorSpec::new()
      .set_fg(Some(tag_color(expectation.kind)))
      .set_bold(true),
  )?;
  write!(sink, "[{}]", expectation.kind.tag())?;
  sink.reset()?;

  if expectation.case.is_empty() {
    write!(sink, " {}", expectation.detail())?;
  } else {
    write!(sink, " {}: {}", expectation.case, expectation.detail())?;
  }

  match &expectation.location {
    Some(location) => writeln!(sink, " (at {location})"),
    None => writeln!(sink),
  }
}
