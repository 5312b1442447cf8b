//! Bounded access history for diagnostics

use std::collections::VecDeque;
use std::fmt;

/// Default number of remembered accesses
pub const DEFAULT_HISTORY_SIZE: usize = 10;

/// Kind of clipboard access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessKind {
    Get,
    Set,
}

impl AccessKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "Get",
            Self::Set => "Set",
        }
    }
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One remembered access
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRecord {
    pub timestamp: String,
    pub app_name: String,
    pub kind: AccessKind,
}

impl fmt::Display for AccessRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}  {}    {}", self.timestamp, self.app_name, self.kind)
    }
}

/// Ring of the most recent accesses; the oldest entry is evicted when full
#[derive(Debug, Clone)]
pub struct AccessHistory {
    capacity: usize,
    entries: VecDeque<AccessRecord>,
}

impl AccessHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, record: AccessRecord) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(record);
    }

    pub fn newest_first(&self) -> impl Iterator<Item = &AccessRecord> {
        self.entries.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for AccessHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}
