//! Key extraction from opaque host nodes and edges.
//!
//! The engine never inspects host objects directly. An adapter turns a node
//! into its identity key and an edge into the keys of its two endpoints.

use std::fmt::Debug;
use std::hash::Hash;

use thiserror::Error;

/// Identity of a node within one layout run.
///
/// Implemented for every `Clone + Eq + Hash + Debug` type.
pub trait NodeKey: Clone + Eq + Hash + Debug {}

impl<T: Clone + Eq + Hash + Debug> NodeKey for T {}

/// Failure raised by a key-extraction function.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AdapterError {
    message: String,
}

impl AdapterError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Extracts identity keys from host nodes and edges.
///
/// A missing endpoint (`Ok(None)`) means the edge references something
/// outside the current graph and is dropped. An `Err` aborts the run.
pub trait GraphAdapter<N, E> {
    type Key: NodeKey;

    fn key_of(&self, node: &N) -> Result<Self::Key, AdapterError>;

    fn source_key_of(&self, edge: &E) -> Result<Option<Self::Key>, AdapterError>;

    fn destination_key_of(&self, edge: &E) -> Result<Option<Self::Key>, AdapterError>;
}

/// Adapter built from three infallible closures.
#[derive(Clone)]
pub struct FnAdapter<FK, FS, FD> {
    key_of: FK,
    source_key_of: FS,
    destination_key_of: FD,
}

impl<FK, FS, FD> FnAdapter<FK, FS, FD> {
    pub fn new<N, E, K>(key_of: FK, source_key_of: FS, destination_key_of: FD) -> Self
    where
        FK: Fn(&N) -> K,
        FS: Fn(&E) -> Option<K>,
        FD: Fn(&E) -> Option<K>,
    {
        Self {
            key_of,
            source_key_of,
            destination_key_of,
        }
    }
}

impl<N, E, K, FK, FS, FD> GraphAdapter<N, E> for FnAdapter<FK, FS, FD>
where
    K: NodeKey,
    FK: Fn(&N) -> K,
    FS: Fn(&E) -> Option<K>,
    FD: Fn(&E) -> Option<K>,
{
    type Key = K;

    fn key_of(&self, node: &N) -> Result<K, AdapterError> {
        Ok((self.key_of)(node))
    }

    fn source_key_of(&self, edge: &E) -> Result<Option<K>, AdapterError> {
        Ok((self.source_key_of)(edge))
    }

    fn destination_key_of(&self, edge: &E) -> Result<Option<K>, AdapterError> {
        Ok((self.destination_key_of)(edge))
    }
}

impl<FK, FS, FD> std::fmt::Debug for FnAdapter<FK, FS, FD> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnAdapter").finish_non_exhaustive()
    }
}
