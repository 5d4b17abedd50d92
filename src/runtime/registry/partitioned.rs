//! Sign-partitioned fixed-bucket hash map
//!
//! Keys are raw `i64` ids. Negative ids are reserved for the library and
//! non-negative ids belong to client code; each range lives in its own
//! table, so an entry registered in one partition is never visible from the
//! other even when the bucket indices collide.
//!
//! Each table has `usize::BITS` buckets and never rehashes. Collisions are
//! chained. Inserting an existing key appends a second entry behind the
//! first, and lookups return the first match, so the earliest registration
//! wins.

use smallvec::SmallVec;
use std::fmt;

use crate::util::hash::mix64;

/// Number of buckets per partition (native word bit-width)
pub const BUCKET_COUNT: usize = usize::BITS as usize;

/// Key namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    /// Negative ids, reserved for the library
    Library,
    /// Non-negative ids, defined by client code
    Client,
}

impl Partition {
    /// Partition owning `key`
    #[inline]
    pub fn of(key: i64) -> Self {
        if key < 0 {
            Partition::Library
        } else {
            Partition::Client
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Partition::Library => write!(f, "library"),
            Partition::Client => write!(f, "client"),
        }
    }
}

/// Bucket index for `key`
#[inline]
pub fn bucket_of(key: i64) -> usize {
    (mix64(key as u64) % BUCKET_COUNT as u64) as usize
}

struct Entry<P> {
    key: i64,
    payload: P,
}

type Chain<P> = SmallVec<[Entry<P>; 2]>;

/// One partition: a fixed array of chained buckets
struct Table<P> {
    buckets: Vec<Chain<P>>,
    len: usize,
}

impl<P> Table<P> {
    fn new() -> Self {
        Self {
            buckets: (0..BUCKET_COUNT).map(|_| SmallVec::new()).collect(),
            len: 0,
        }
    }

    fn push(
        &mut self,
        key: i64,
        payload: P,
    ) {
        self.buckets[bucket_of(key)].push(Entry { key, payload });
        self.len += 1;
    }

    fn find(
        &self,
        key: i64,
    ) -> Option<&P> {
        self.buckets[bucket_of(key)]
            .iter()
            .find(|e| e.key == key)
            .map(|e| &e.payload)
    }

    fn count(
        &self,
        key: i64,
    ) -> usize {
        self.buckets[bucket_of(key)]
            .iter()
            .filter(|e| e.key == key)
            .count()
    }
}

/// Two-partition registry mapping `i64` keys to payloads
pub struct PartitionedRegistry<P> {
    library: Table<P>,
    client: Table<P>,
}

impl<P> PartitionedRegistry<P> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            library: Table::new(),
            client: Table::new(),
        }
    }

    fn table(
        &self,
        key: i64,
    ) -> &Table<P> {
        match Partition::of(key) {
            Partition::Library => &self.library,
            Partition::Client => &self.client,
        }
    }

    fn table_mut(
        &mut self,
        key: i64,
    ) -> &mut Table<P> {
        match Partition::of(key) {
            Partition::Library => &mut self.library,
            Partition::Client => &mut self.client,
        }
    }

    /// Append an entry for `key`
    ///
    /// Returns `true` when this is the first entry for `key`. A later entry
    /// is stored but shadowed by the first one.
    pub fn insert(
        &mut self,
        key: i64,
        payload: P,
    ) -> bool {
        let first = !self.contains(key);
        self.table_mut(key).push(key, payload);
        first
    }

    /// First payload registered for `key`
    pub fn get(
        &self,
        key: i64,
    ) -> Option<&P> {
        self.table(key).find(key)
    }

    /// Whether any entry exists for `key`
    pub fn contains(
        &self,
        key: i64,
    ) -> bool {
        self.get(key).is_some()
    }

    /// Number of entries stored for `key`, shadowed ones included
    pub fn entry_count(
        &self,
        key: i64,
    ) -> usize {
        self.table(key).count(key)
    }

    /// Total number of stored entries
    pub fn len(&self) -> usize {
        self.library.len + self.client.len
    }

    /// Number of stored entries in one partition
    pub fn partition_len(
        &self,
        partition: Partition,
    ) -> usize {
        match partition {
            Partition::Library => self.library.len,
            Partition::Client => self.client.len,
        }
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Buckets per partition
    pub fn bucket_count(&self) -> usize {
        BUCKET_COUNT
    }
}

impl<P> Default for PartitionedRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> fmt::Debug for PartitionedRegistry<P> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("PartitionedRegistry")
            .field("library", &self.library.len)
            .field("client", &self.client.len)
            .field("buckets", &BUCKET_COUNT)
            .finish()
    }
}
