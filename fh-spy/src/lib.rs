// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

//! Stand-ins for the dependencies of a function under test.
//!
//! The function under test receives a [`CallRecorder`] and routes every call that crosses its
//! dependency boundary through [`CallRecorder::invoke`]. Each invocation is recorded, then either
//! forced to a scripted outcome by the [`FaultInjector`] or handed to the installed behavior.
//! Helpers that are private to the unit under test are never routed here.

#[cfg(test)]
#[ctor::ctor]
fn test_global_init() {
  fh_test_helpers::test_global_init();
}

pub mod fault;
pub mod recorder;
pub mod value;

pub use fault::{Fault, FaultInjector, FaultRule, FaultTrigger};
pub use recorder::{Behavior, CallRecord, CallRecorder};
pub use value::Value;
