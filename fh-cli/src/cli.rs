// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

use clap::Parser;

#[derive(clap::ValueEnum, Copy, Debug, Clone, Default, PartialEq, Eq)]
pub enum Format {
  #[default]
  Text,
  Json,
}

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Options {
  /// Only run cases whose name contains this substring
  #[clap(env = "FOCAL_HARNESS_FILTER", long)]
  pub filter: Option<String>,

  /// Run the case list this many times and fail if any run differs from the first
  #[clap(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1 ..))]
  pub repeat: u32,

  /// Report format
  #[clap(long, value_enum, default_value_t = Format::Text)]
  pub format: Format,

  /// Print the registered case names and exit
  #[clap(long)]
  pub list: bool,

  /// Also register cases that fail on purpose, to check the harness's own failure reporting
  #[clap(long, hide = true)]
  pub include_selftest_failures: bool,
}
