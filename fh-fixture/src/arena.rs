// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./arena_test.rs"]
mod arena_test;

use fh_error::ConfigurationError;
use parking_lot::Mutex;
use std::sync::Arc;

// Pointer identities handed out for nodes start here so that no node ever looks like NULL.
const NODE_PTR_BASE: usize = 0x0010_0000;
const NODE_PTR_STRIDE: usize = 0x20;

//
// NodeId
//

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
  #[must_use]
  pub const fn index(self) -> usize {
    self.0
  }

  /// Stable, non-null pointer identity for passing the node across a spied dependency.
  #[must_use]
  pub const fn ptr(self) -> usize {
    NODE_PTR_BASE + self.0 * NODE_PTR_STRIDE
  }

  #[must_use]
  pub const fn from_ptr(ptr: usize) -> Option<Self> {
    if ptr < NODE_PTR_BASE || (ptr - NODE_PTR_BASE) % NODE_PTR_STRIDE != 0 {
      return None;
    }
    Some(Self((ptr - NODE_PTR_BASE) / NODE_PTR_STRIDE))
  }
}

//
// Ownership
//

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ownership {
  /// The fixture frees this node on teardown.
  Fixture,
  /// The function under test took this node over; teardown leaves it alone.
  Released,
}

//
// NodeData
//

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeData {
  ListNode { value: i64, next: Option<NodeId> },
  Header(Vec<u8>),
  Payload(Vec<u8>),
  Bytes(Vec<u8>),
}

impl NodeData {
  fn bytes(&self) -> Option<&[u8]> {
    match self {
      Self::ListNode { .. } => None,
      Self::Header(bytes) | Self::Payload(bytes) | Self::Bytes(bytes) => Some(bytes),
    }
  }
}

#[derive(Debug)]
struct Node {
  // None once the node has been freed.
  data: Option<NodeData>,
  ownership: Ownership,
}

//
// Shape
//

/// Declarative description of the data a function under test consumes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Shape {
  /// A singly linked list, one node per value, in order.
  LinkedList { values: Vec<i64> },
  /// A header followed by a payload, e.g. a file chunk.
  Buffer { header: Vec<u8>, payload: Vec<u8> },
  /// A single buffer of `len` bytes, all set to `fill`.
  Bytes { len: usize, fill: u8 },
}

impl Shape {
  #[must_use]
  pub fn linked_list(values: impl IntoIterator<Item = i64>) -> Self {
    Self::LinkedList {
      values: values.into_iter().collect(),
    }
  }

  #[must_use]
  pub fn buffer(header: impl Into<Vec<u8>>, payload: impl Into<Vec<u8>>) -> Self {
    Self::Buffer {
      header: header.into(),
      payload: payload.into(),
    }
  }

  #[must_use]
  pub const fn bytes(len: usize, fill: u8) -> Self {
    Self::Bytes { len, fill }
  }

  const fn kind(&self) -> &'static str {
    match self {
      Self::LinkedList { .. } => "linked_list",
      Self::Buffer { .. } => "buffer",
      Self::Bytes { .. } => "bytes",
    }
  }
}

//
// TeardownReport
//

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TeardownReport {
  /// Nodes freed by this call.
  pub freed: usize,
  /// Nodes skipped because the function under test owns them.
  pub skipped: usize,
}

//
// TeardownWatch
//

/// Observes a fixture's teardown from outside, including after the fixture itself was dropped
/// during unwinding.
#[derive(Clone, Debug, Default)]
pub struct TeardownWatch(Arc<Mutex<Option<TeardownReport>>>);

impl TeardownWatch {
  /// The report of the first teardown, or `None` while the fixture is still up.
  #[must_use]
  pub fn report(&self) -> Option<TeardownReport> {
    *self.0.lock()
  }

  #[must_use]
  pub fn is_torn_down(&self) -> bool {
    self.0.lock().is_some()
  }
}

//
// Fixture
//

/// Owning handle over the nodes built for one case. Every node carries an explicit ownership
/// flag; teardown frees exactly the nodes the fixture still owns, and dropping a fixture that was
/// never torn down tears it down.
#[derive(Debug)]
pub struct Fixture {
  kind: &'static str,
  nodes: Vec<Node>,
  head: Option<NodeId>,
  torn_down: bool,
  watch: TeardownWatch,
}

impl Fixture {
  fn new(shape: Shape) -> Self {
    let kind = shape.kind();
    let data: Vec<NodeData> = match shape {
      Shape::LinkedList { values } => {
        let len = values.len();
        values
          .into_iter()
          .enumerate()
          .map(|(i, value)| NodeData::ListNode {
            value,
            next: (i + 1 < len).then_some(NodeId(i + 1)),
          })
          .collect()
      },
      Shape::Buffer { header, payload } => vec![NodeData::Header(header), NodeData::Payload(payload)],
      Shape::Bytes { len, fill } => vec![NodeData::Bytes(vec![fill; len])],
    };

    let fixture = Self {
      kind,
      head: (!data.is_empty()).then_some(NodeId(0)),
      nodes: data
        .into_iter()
        .map(|data| Node {
          data: Some(data),
          ownership: Ownership::Fixture,
        })
        .collect(),
      torn_down: false,
      watch: TeardownWatch::default(),
    };
    log::debug!("built {} fixture with {} nodes", fixture.kind, fixture.nodes.len());
    fixture
  }

  #[must_use]
  pub const fn kind(&self) -> &'static str {
    self.kind
  }

  #[must_use]
  pub const fn head(&self) -> Option<NodeId> {
    self.head
  }

  /// Number of nodes the fixture was built with, freed or not.
  #[must_use]
  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  pub fn ids(&self) -> impl Iterator<Item = NodeId> + use<> {
    (0 .. self.nodes.len()).map(NodeId)
  }

  /// Reads a node. Reading a node that has been freed is a setup mistake.
  pub fn node(&self, id: NodeId) -> fh_error::Result<&NodeData> {
    self
      .nodes
      .get(id.0)
      .ok_or(ConfigurationError::UnknownNode(id.0))?
      .data
      .as_ref()
      .ok_or(ConfigurationError::NodeNotOwned(id.0))
  }

  #[must_use]
  pub fn ownership(&self, id: NodeId) -> Option<Ownership> {
    self.nodes.get(id.0).map(|node| node.ownership)
  }

  #[must_use]
  pub fn is_freed(&self, id: NodeId) -> bool {
    self
      .nodes
      .get(id.0)
      .is_some_and(|node| node.data.is_none())
  }

  /// Hands a node over to the function under test. Teardown will no longer free it.
  pub fn release(&mut self, id: NodeId) -> fh_error::Result<()> {
    let node = self
      .nodes
      .get_mut(id.0)
      .ok_or(ConfigurationError::UnknownNode(id.0))?;
    if node.ownership != Ownership::Fixture || node.data.is_none() {
      return Err(ConfigurationError::NodeNotOwned(id.0));
    }

    node.ownership = Ownership::Released;
    Ok(())
  }

  /// Detaches the head node of a linked list and releases it, returning its id and value. The
  /// next node becomes the new head.
  pub fn unlink_head(&mut self) -> fh_error::Result<Option<(NodeId, i64)>> {
    let Some(head) = self.head else {
      return Ok(None);
    };

    let (value, next) = match self.node(head)? {
      NodeData::ListNode { value, next } => (*value, *next),
      _ => return Ok(None),
    };
    self.release(head)?;
    self.head = next;
    Ok(Some((head, value)))
  }

  /// Values of the linked list, following `next` from the head until the end or a freed node.
  #[must_use]
  pub fn values(&self) -> Vec<i64> {
    let mut values = Vec::new();
    let mut cursor = self.head;
    while let Some(id) = cursor {
      match self.node(id) {
        Ok(NodeData::ListNode { value, next }) => {
          values.push(*value);
          cursor = *next;
        },
        _ => break,
      }
    }
    values
  }

  /// Concatenated contents of the live byte nodes, in build order.
  #[must_use]
  pub fn bytes(&self) -> Vec<u8> {
    self
      .nodes
      .iter()
      .filter_map(|node| node.data.as_ref().and_then(NodeData::bytes))
      .flatten()
      .copied()
      .collect()
  }

  /// Nodes that have not been freed, whoever owns them.
  #[must_use]
  pub fn live_nodes(&self) -> usize {
    self.nodes.iter().filter(|node| node.data.is_some()).count()
  }

  /// Nodes the fixture is still responsible for freeing.
  #[must_use]
  pub fn owned_nodes(&self) -> usize {
    self
      .nodes
      .iter()
      .filter(|node| node.data.is_some() && node.ownership == Ownership::Fixture)
      .count()
  }

  #[must_use]
  pub const fn is_torn_down(&self) -> bool {
    self.torn_down
  }

  #[must_use]
  pub fn watch(&self) -> TeardownWatch {
    self.watch.clone()
  }

  /// Frees every node the fixture still owns. Nodes released to the function under test are
  /// skipped. Calling this again frees nothing.
  pub fn teardown(&mut self) -> TeardownReport {
    let mut report = TeardownReport::default();
    for node in &mut self.nodes {
      match (node.ownership, node.data.is_some()) {
        (Ownership::Fixture, true) => {
          node.data = None;
          report.freed += 1;
        },
        (Ownership::Released, true) => report.skipped += 1,
        (_, false) => {},
      }
    }

    if !self.torn_down {
      log::debug!(
        "tore down {} fixture: freed={} skipped={}",
        self.kind,
        report.freed,
        report.skipped
      );
      *self.watch.0.lock() = Some(report);
    }
    self.torn_down = true;
    report
  }
}

impl Drop for Fixture {
  fn drop(&mut self) {
    if !self.torn_down {
      self.teardown();
    }
  }
}

//
// FixtureBuilder
//

/// Builds the single fixture a case is allowed to have.
#[derive(Debug, Default)]
pub struct FixtureBuilder {
  built: bool,
}

impl FixtureBuilder {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  pub fn build(&mut self, shape: Shape) -> fh_error::Result<Fixture> {
    if self.built {
      return Err(ConfigurationError::FixtureAlreadyBuilt);
    }

    self.built = true;
    Ok(Fixture::new(shape))
  }

  #[must_use]
  pub const fn has_built(&self) -> bool {
    self.built
  }
}

/// Builds a standalone fixture outside of any case.
#[must_use]
pub fn build(shape: Shape) -> Fixture {
  Fixture::new(shape)
}
