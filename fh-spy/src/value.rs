// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./value_test.rs"]
mod value_test;

//
// Value
//

/// Snapshot of an argument passed to, or a result returned from, a spied dependency. Pointers
/// are captured by identity only.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, serde::Serialize)]
pub enum Value {
  #[default]
  Unit,
  Null,
  Bool(bool),
  Int(i64),
  UInt(u64),
  Ptr(usize),
  Bytes(Vec<u8>),
  Str(String),
}

impl Value {
  #[must_use]
  pub const fn is_null(&self) -> bool {
    matches!(self, Self::Null | Self::Ptr(0))
  }

  /// A non-null pointer identity.
  #[must_use]
  pub const fn as_ptr(&self) -> Option<usize> {
    match self {
      Self::Ptr(ptr) if *ptr != 0 => Some(*ptr),
      _ => None,
    }
  }

  /// Truthiness the way a C status return is read: `Bool` directly, integers by non-zero.
  #[must_use]
  pub const fn as_bool(&self) -> Option<bool> {
    match self {
      Self::Bool(value) => Some(*value),
      Self::Int(value) => Some(*value != 0),
      Self::UInt(value) => Some(*value != 0),
      _ => None,
    }
  }

  #[must_use]
  pub fn as_i64(&self) -> Option<i64> {
    match self {
      Self::Int(value) => Some(*value),
      Self::UInt(value) => i64::try_from(*value).ok(),
      Self::Bool(value) => Some(i64::from(*value)),
      _ => None,
    }
  }

  #[must_use]
  pub fn as_u64(&self) -> Option<u64> {
    match self {
      Self::UInt(value) => Some(*value),
      Self::Int(value) => u64::try_from(*value).ok(),
      Self::Ptr(value) => u64::try_from(*value).ok(),
      _ => None,
    }
  }

  #[must_use]
  pub fn as_bytes(&self) -> Option<&[u8]> {
    match self {
      Self::Bytes(bytes) => Some(bytes),
      Self::Str(s) => Some(s.as_bytes()),
      _ => None,
    }
  }

  #[must_use]
  pub fn as_str(&self) -> Option<&str> {
    match self {
      Self::Str(s) => Some(s),
      _ => None,
    }
  }

  /// Cuts the value down to at most `len`: bytes and strings are shortened, counts are clamped.
  /// Used to simulate short reads and short writes.
  #[must_use]
  pub fn truncated(self, len: usize) -> Self {
    match self {
      Self::Bytes(mut bytes) => {
        bytes.truncate(len);
        Self::Bytes(bytes)
      },
      Self::Str(mut s) => {
        let mut end = len.min(s.len());
        while !s.is_char_boundary(end) {
          end -= 1;
        }
        s.truncate(end);
        Self::Str(s)
      },
      Self::UInt(value) => Self::UInt(value.min(len as u64)),
      Self::Int(value) => Self::Int(value.min(i64::try_from(len).unwrap_or(i64::MAX))),
      other => other,
    }
  }

  /// Flips the lowest bit of the value, which is enough to break any checksum comparison.
  /// Values with no bits to flip (unit, null, empty bytes) come back unchanged.
  #[must_use]
  pub fn corrupted(self) -> Self {
    match self {
      Self::Bool(value) => Self::Bool(!value),
      Self::Int(value) => Self::Int(value ^ 1),
      Self::UInt(value) => Self::UInt(value ^ 1),
      Self::Ptr(value) => Self::Ptr(value ^ 1),
      Self::Bytes(mut bytes) => {
        if let Some(first) = bytes.first_mut() {
          *first ^= 1;
        }
        Self::Bytes(bytes)
      },
      Self::Str(s) => {
        let mut bytes = s.into_bytes();
        if let Some(first) = bytes.first_mut() {
          *first ^= 1;
        }
        // Flipping the low bit of an ASCII byte stays ASCII; anything else falls back to bytes.
        match String::from_utf8(bytes) {
          Ok(s) => Self::Str(s),
          Err(e) => Self::Bytes(e.into_bytes()),
        }
      },
      other => other,
    }
  }
}

impl From<()> for Value {
  fn from((): ()) -> Self {
    Self::Unit
  }
}

impl From<bool> for Value {
  fn from(value: bool) -> Self {
    Self::Bool(value)
  }
}

impl From<i32> for Value {
  fn from(value: i32) -> Self {
    Self::Int(value.into())
  }
}

impl From<i64> for Value {
  fn from(value: i64) -> Self {
    Self::Int(value)
  }
}

impl From<u32> for Value {
  fn from(value: u32) -> Self {
    Self::UInt(value.into())
  }
}

impl From<u64> for Value {
  fn from(value: u64) -> Self {
    Self::UInt(value)
  }
}

impl From<usize> for Value {
  fn from(value: usize) -> Self {
    Self::UInt(value as u64)
  }
}

impl From<&str> for Value {
  fn from(value: &str) -> Self {
    Self::Str(value.to_string())
  }
}

impl From<String> for Value {
  fn from(value: String) -> Self {
    Self::Str(value)
  }
}

impl From<&[u8]> for Value {
  fn from(value: &[u8]) -> Self {
    Self::Bytes(value.to_vec())
  }
}

impl From<Vec<u8>> for Value {
  fn from(value: Vec<u8>) -> Self {
    Self::Bytes(value)
  }
}
