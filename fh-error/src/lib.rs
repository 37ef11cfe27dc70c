// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./lib_test.rs"]
mod tests;

//
// ConfigurationError
//

/// A mistake in how a test case was set up, as opposed to a behavioral failure of the function
/// under test. These are reported with their own prefix and never counted as assertion failures.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub enum ConfigurationError {
  #[error("no spy installed for dependency `{0}`")]
  UnregisteredDependency(String),
  #[error("dependency `{0}` was invoked re-entrantly from its own behavior")]
  ReentrantInvocation(String),
  #[error("dependency `{name}` has {count} recorded calls, no call at index {index}")]
  NoSuchCall {
    name: String,
    index: usize,
    count: usize,
  },
  #[error("a fixture was already built for this case")]
  FixtureAlreadyBuilt,
  #[error("fixture node {0} does not exist")]
  UnknownNode(usize),
  #[error("fixture node {0} is no longer owned by the fixture")]
  NodeNotOwned(usize),
}

impl ConfigurationError {
  /// Short stable label used in logs and JSON output.
  #[must_use]
  pub const fn label(&self) -> &'static str {
    match self {
      Self::UnregisteredDependency(_) => "unregistered_dependency",
      Self::ReentrantInvocation(_) => "reentrant_invocation",
      Self::NoSuchCall { .. } => "no_such_call",
      Self::FixtureAlreadyBuilt => "fixture_already_built",
      Self::UnknownNode(_) => "unknown_node",
      Self::NodeNotOwned(_) => "node_not_owned",
    }
  }
}

pub type Result<T> = std::result::Result<T, ConfigurationError>;
