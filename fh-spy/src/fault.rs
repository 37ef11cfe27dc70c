// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./fault_test.rs"]
mod fault_test;

use crate::value::Value;
use parking_lot::Mutex;
use std::collections::BTreeMap;

//
// Fault
//

/// The forced outcome of a faulted dependency call.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub enum Fault {
  /// Return a null pointer, e.g. a failed allocation.
  Null,
  /// Return an error status code.
  Status(i64),
  /// Return this exact value.
  Return(Value),
  /// Run the normal behavior, then cut its result down to at most this length (short read).
  Truncate(usize),
  /// Run the normal behavior, then flip a bit of its result (checksum mismatch).
  Corrupt,
}

impl Fault {
  /// Produces the faulted result. `behavior` runs only for faults that transform the normal
  /// result.
  pub fn apply(&self, behavior: impl FnOnce() -> Value) -> Value {
    match self {
      Self::Null => Value::Null,
      Self::Status(status) => Value::Int(*status),
      Self::Return(value) => value.clone(),
      Self::Truncate(len) => behavior().truncated(*len),
      Self::Corrupt => behavior().corrupted(),
    }
  }
}

//
// FaultTrigger
//

/// Which invocations of a dependency a rule applies to. Indices are 0-based and count calls to
/// that dependency only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub enum FaultTrigger {
  At(usize),
  From(usize),
  Always,
}

impl FaultTrigger {
  #[must_use]
  pub const fn matches(self, index: usize) -> bool {
    match self {
      Self::At(at) => index == at,
      Self::From(start) => index >= start,
      Self::Always => true,
    }
  }

  // Higher wins. Among `From` rules the latest start is the most specific.
  const fn precedence(self) -> (u8, usize) {
    match self {
      Self::At(_) => (2, 0),
      Self::From(start) => (1, start),
      Self::Always => (0, 0),
    }
  }
}

//
// FaultRule
//

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct FaultRule {
  pub dependency: String,
  pub trigger: FaultTrigger,
  pub fault: Fault,
}

//
// FaultInjector
//

#[derive(Default)]
struct FaultState {
  rules: BTreeMap<(String, FaultTrigger), Fault>,
  triggered: usize,
}

/// Per-dependency, per-invocation failure switches. At most one rule applies to a call: an exact
/// index beats a `From` range, which beats `Always`. Registering a rule for a dependency and
/// trigger that already has one replaces it.
#[derive(Default)]
pub struct FaultInjector {
  state: Mutex<FaultState>,
}

impl FaultInjector {
  pub fn set_failure_at(&self, dependency: impl Into<String>, index: usize, fault: Fault) {
    self.insert(dependency.into(), FaultTrigger::At(index), fault);
  }

  /// Fails every call at or after `index`, e.g. an allocator that runs dry after N successes.
  pub fn set_failure_from(&self, dependency: impl Into<String>, index: usize, fault: Fault) {
    self.insert(dependency.into(), FaultTrigger::From(index), fault);
  }

  pub fn set_failure_always(&self, dependency: impl Into<String>, fault: Fault) {
    self.insert(dependency.into(), FaultTrigger::Always, fault);
  }

  fn insert(&self, dependency: String, trigger: FaultTrigger, fault: Fault) {
    log::debug!("fault rule {dependency}/{trigger:?} -> {fault:?}");
    self.state.lock().rules.insert((dependency, trigger), fault);
  }

  /// Removes every rule and resets the trigger counter.
  pub fn clear(&self) {
    let mut state = self.state.lock();
    state.rules.clear();
    state.triggered = 0;
  }

  /// Returns the fault that applies to the `index`-th call of `dependency`, if any, and counts it
  /// as triggered.
  pub fn fault_for(&self, dependency: &str, index: usize) -> Option<Fault> {
    let mut state = self.state.lock();
    let fault = state
      .rules
      .iter()
      .filter(|((name, trigger), _)| name == dependency && trigger.matches(index))
      .max_by_key(|((_, trigger), _)| trigger.precedence())
      .map(|(_, fault)| fault.clone());

    if fault.is_some() {
      state.triggered += 1;
    }
    fault
  }

  /// Snapshot of the registered rules, ordered by dependency name then trigger.
  #[must_use]
  pub fn rules(&self) -> Vec<FaultRule> {
    self
      .state
      .lock()
      .rules
      .iter()
      .map(|((dependency, trigger), fault)| FaultRule {
        dependency: dependency.clone(),
        trigger: *trigger,
        fault: fault.clone(),
      })
      .collect()
  }

  /// Number of calls a rule has applied to since the last `clear()`.
  #[must_use]
  pub fn triggered(&self) -> usize {
    self.state.lock().triggered
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.state.lock().rules.is_empty()
  }
}
