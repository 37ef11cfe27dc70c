// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./recorder_test.rs"]
mod recorder_test;

use crate::fault::FaultInjector;
use crate::value::Value;
use fh_error::ConfigurationError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// The stand-in for a dependency: receives the argument snapshots, returns the result.
pub type Behavior = Box<dyn FnMut(&[Value]) -> Value + Send>;

//
// CallRecord
//

/// One intercepted invocation. Records are appended when the call is intercepted, before the
/// behavior runs, and are never mutated afterward.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct CallRecord {
  pub name: String,
  pub args: Vec<Value>,
  /// 0-based position among calls to this dependency.
  pub index: usize,
  /// 0-based position among all calls recorded since the last `clear()`.
  pub sequence: usize,
  /// Whether a fault rule decided the result of this call.
  pub faulted: bool,
}

//
// CallRecorder
//

#[derive(Default)]
struct RecorderState {
  behaviors: HashMap<String, Arc<Mutex<Behavior>>>,
  counts: HashMap<String, usize>,
  log: Vec<CallRecord>,
  setup_errors: Vec<ConfigurationError>,
}

impl RecorderState {
  fn setup_error(&mut self, error: ConfigurationError) -> ConfigurationError {
    log::warn!("{error}");
    self.setup_errors.push(error.clone());
    error
  }
}

/// Registry of spied dependencies and the ordered record of every call made to them.
#[derive(Default)]
pub struct CallRecorder {
  state: Mutex<RecorderState>,
  faults: FaultInjector,
}

impl CallRecorder {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Routes future calls to `name` to `behavior`. Installing over an existing spy replaces the
  /// behavior and keeps the calls recorded so far.
  pub fn install(
    &self,
    name: impl Into<String>,
    behavior: impl FnMut(&[Value]) -> Value + Send + 'static,
  ) {
    let name = name.into();
    log::debug!("installing spy for {name}");
    let behavior: Behavior = Box::new(behavior);
    self
      .state
      .lock()
      .behaviors
      .insert(name, Arc::new(Mutex::new(behavior)));
  }

  /// Installs a spy that always returns `value`.
  pub fn install_returning(&self, name: impl Into<String>, value: impl Into<Value>) {
    let value = value.into();
    self.install(name, move |_| value.clone());
  }

  #[must_use]
  pub fn is_installed(&self, name: &str) -> bool {
    self.state.lock().behaviors.contains_key(name)
  }

  /// Intercepts a call to `name`. The call is recorded first, then the fault injector is asked
  /// for an override at this call's index; without one the installed behavior produces the
  /// result.
  ///
  /// Calling a name with no installed spy, or calling a spy from inside its own behavior, is a
  /// setup mistake. The error is returned and also queued so the runner reports it even if the
  /// caller discards it. Neither produces a call record.
  pub fn invoke(&self, name: &str, args: &[Value]) -> Result<Value, ConfigurationError> {
    let behavior = {
      let mut state = self.state.lock();
      let Some(behavior) = state.behaviors.get(name).cloned() else {
        return Err(state.setup_error(ConfigurationError::UnregisteredDependency(
          name.to_string(),
        )));
      };
      behavior
    };

    // The registry lock is released so behaviors can call other spies. A behavior calling its
    // own dependency would deadlock on its own lock, so that is reported instead.
    let Some(mut guard) = behavior.try_lock() else {
      return Err(
        self
          .state
          .lock()
          .setup_error(ConfigurationError::ReentrantInvocation(name.to_string())),
      );
    };

    let fault = {
      let mut state = self.state.lock();
      let index = state.counts.get(name).copied().unwrap_or_default();
      let fault = self.faults.fault_for(name, index);
      let sequence = state.log.len();
      state.log.push(CallRecord {
        name: name.to_string(),
        args: args.to_vec(),
        index,
        sequence,
        faulted: fault.is_some(),
      });
      *state.counts.entry(name.to_string()).or_default() += 1;

      log::debug!("call {name}#{index} {args:?} fault={fault:?}");
      fault
    };

    let behavior: &mut Behavior = &mut guard;
    Ok(match fault {
      Some(fault) => fault.apply(|| behavior(args)),
      None => behavior(args),
    })
  }

  #[must_use]
  pub fn call_count(&self, name: &str) -> usize {
    self
      .state
      .lock()
      .counts
      .get(name)
      .copied()
      .unwrap_or_default()
  }

  pub fn call_at(&self, name: &str, index: usize) -> Result<CallRecord, ConfigurationError> {
    let state = self.state.lock();
    state
      .log
      .iter()
      .find(|record| record.name == name && record.index == index)
      .cloned()
      .ok_or_else(|| ConfigurationError::NoSuchCall {
        name: name.to_string(),
        index,
        count: state.counts.get(name).copied().unwrap_or_default(),
      })
  }

  /// Every recorded call to `name`, in invocation order.
  #[must_use]
  pub fn calls(&self, name: &str) -> Vec<CallRecord> {
    self
      .state
      .lock()
      .log
      .iter()
      .filter(|record| record.name == name)
      .cloned()
      .collect()
  }

  /// Every recorded call, in global invocation order.
  #[must_use]
  pub fn call_log(&self) -> Vec<CallRecord> {
    self.state.lock().log.clone()
  }

  /// The dependency names in the order they were called, e.g. `["alloc", "write", "write"]`.
  #[must_use]
  pub fn call_sequence(&self) -> Vec<String> {
    self
      .state
      .lock()
      .log
      .iter()
      .map(|record| record.name.clone())
      .collect()
  }

  #[must_use]
  pub fn faults(&self) -> &FaultInjector {
    &self.faults
  }

  /// Drains the setup errors queued by `invoke`.
  pub fn take_setup_errors(&self) -> Vec<ConfigurationError> {
    std::mem::take(&mut self.state.lock().setup_errors)
  }

  /// Drops every behavior, record, queued setup error and fault rule.
  pub fn clear(&self) {
    // Behaviors may own state whose drop is not trivial, so drop them outside the lock.
    let previous = std::mem::take(&mut *self.state.lock());
    drop(previous);
    self.faults.clear();
  }
}
