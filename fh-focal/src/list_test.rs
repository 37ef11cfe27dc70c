// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

use super::{DupError, dup_list, pop_front};
use assert_matches::assert_matches;
use fh_error::ConfigurationError;
use fh_fixture::spies::{ALLOC, FREE, install_heap};
use fh_fixture::{Shape, Shared, TrackingHeap, arena, shared};
use fh_spy::{CallRecorder, Fault, Value};
use pretty_assertions::assert_eq;

fn setup() -> (CallRecorder, Shared<TrackingHeap>) {
  let deps = CallRecorder::new();
  let heap = shared(TrackingHeap::new());
  install_heap(&deps, &heap);
  (deps, heap)
}

#[test]
fn copies_every_node() {
  let (deps, heap) = setup();
  let source = arena::build(Shape::linked_list([7, 8, 9]));

  let copy = dup_list(&deps, &source).unwrap();

  assert_eq!(vec![7, 8, 9], copy.values);
  assert_eq!(3, deps.call_count(ALLOC));
  assert_eq!(3, heap.lock().live_count());
  assert_eq!(Some(&8_i64.to_le_bytes()[..]), heap.lock().get(copy.blocks[1]));
  // The source is only read.
  assert_eq!(vec![7, 8, 9], source.values());

  copy.free(&deps).unwrap();
  assert_eq!(0, heap.lock().live_count());
}

#[test]
fn allocation_failure_leaves_nothing_behind() {
  let (deps, heap) = setup();
  deps.faults().set_failure_at(ALLOC, 1, Fault::Null);
  let source = arena::build(Shape::linked_list([1, 2, 3]));

  assert_eq!(Err(DupError::AllocationFailed(1)), dup_list(&deps, &source));

  assert_eq!(2, deps.call_count(ALLOC));
  assert_eq!(1, deps.call_count(FREE));
  assert_eq!(
    vec![Value::Ptr(0x1000)],
    deps.call_at(FREE, 0).unwrap().args
  );
  assert_eq!(0, heap.lock().live_count());
  assert!(heap.lock().errors().is_empty());
}

#[test]
fn failure_on_first_allocation_frees_nothing() {
  let (deps, heap) = setup();
  deps.faults().set_failure_always(ALLOC, Fault::Null);
  let source = arena::build(Shape::linked_list([1, 2]));

  assert_eq!(Err(DupError::AllocationFailed(0)), dup_list(&deps, &source));
  assert_eq!(0, deps.call_count(FREE));
  assert_eq!(0, heap.lock().allocations());
}

#[test]
fn allocation_failing_from_the_third_call() {
  let (deps, heap) = setup();
  deps.faults().set_failure_from(ALLOC, 2, Fault::Null);
  let source = arena::build(Shape::linked_list([1, 2, 3, 4]));

  assert_eq!(Err(DupError::AllocationFailed(2)), dup_list(&deps, &source));
  assert_eq!(2, deps.call_count(FREE));
  assert_eq!(0, heap.lock().live_count());
}

#[test]
fn empty_list_copies_to_empty() {
  let (deps, _heap) = setup();
  let source = arena::build(Shape::linked_list(Vec::new()));

  let copy = dup_list(&deps, &source).unwrap();
  assert!(copy.values.is_empty());
  assert!(deps.call_log().is_empty());
}

#[test]
fn missing_allocator_is_a_dependency_error() {
  let deps = CallRecorder::new();
  let source = arena::build(Shape::linked_list([1]));

  assert_matches!(
    dup_list(&deps, &source),
    Err(DupError::Dependency(ConfigurationError::UnregisteredDependency(name))) if name == ALLOC
  );
}

#[test]
fn pop_front_hands_the_node_over() {
  let deps = CallRecorder::new();
  deps.install_returning(FREE, true);
  let mut list = arena::build(Shape::linked_list([5, 6]));
  let head = list.head().unwrap();

  assert_eq!(Some(5), pop_front(&deps, &mut list).unwrap());
  assert_eq!(vec![Value::Ptr(head.ptr())], deps.call_at(FREE, 0).unwrap().args);
  assert_eq!(vec![6], list.values());

  let report = list.teardown();
  assert_eq!(1, report.freed);
  assert_eq!(1, report.skipped);

  let mut empty = arena::build(Shape::linked_list(Vec::new()));
  assert_eq!(None, pop_front(&deps, &mut empty).unwrap());
}
