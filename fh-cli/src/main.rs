// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

use crate::cli::{Format, Options};
use clap::Parser;
use fh_panic::PanicType;
use fh_runner::{Runner, filter};
use std::io::{IsTerminal, Write};
use termcolor::{ColorChoice, StandardStream};

mod cli;

fn main() -> anyhow::Result<()> {
  // Logs go to stderr; stdout carries only the report.
  fh_log::HarnessLogger::initialize();
  // Cases are allowed to panic, so unwinding must stay enabled.
  fh_panic::default(PanicType::BacktraceOnly);
  let args = Options::parse();

  let mut registry = fh_cli::cases::all();
  if args.include_selftest_failures {
    registry.extend(fh_cli::cases::selftest());
  }
  let cases = filter(&registry, args.filter.as_deref().unwrap_or_default());

  if args.list {
    let mut stdout = std::io::stdout().lock();
    for case in &cases {
      writeln!(stdout, "{}", case.name())?;
    }
    return Ok(());
  }

  log::debug!("running {} cases {} times", cases.len(), args.repeat);
  let report = Runner::new().run_repeated(&cases, args.repeat as usize);

  match args.format {
    Format::Text => {
      let choice = if std::io::stdout().is_terminal() {
        ColorChoice::Auto
      } else {
        ColorChoice::Never
      };
      let mut stdout = StandardStream::stdout(choice);
      report.summary.write_report(&mut stdout)?;
      stdout.flush()?;
    },
    Format::Json => {
      let mut stdout = std::io::stdout().lock();
      serde_json::to_writer_pretty(&mut stdout, &report.summary)?;
      writeln!(stdout)?;
    },
  }

  let mut exit_code = report.summary.exit_code();
  if let Some(run) = report.divergent_run {
    eprintln!(
      "run {run} of {} produced a different summary than the first run",
      report.runs
    );
    exit_code = exit_code.max(1);
  }

  if exit_code != 0 {
    #[allow(clippy::exit)]
    std::process::exit(exit_code);
  }

  Ok(())
}
