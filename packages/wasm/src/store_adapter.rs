//! Store views handed across the engine boundary.
//!
//! A module only ever sees its own client's key space: the host builds the
//! adapter from a store that is already scoped to `clients/{id}/`, so the
//! module addresses keys like `clientState` directly and cannot name another
//! client's state. The query path gets a view whose write methods fail.

use lightclient_core::store::HostStore;

/// A write attempted through a view that does not allow it.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("store is read-only: {0}")]
pub struct WriteRejected(
    /// The rejected operation.
    pub &'static str,
);

/// The key-value interface a module runs against.
pub trait ContractStore {
    /// Reads a value.
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    /// Writes a value.
    ///
    /// # Errors
    /// Returns [`WriteRejected`] on a read-only view.
    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), WriteRejected>;

    /// Removes a value.
    ///
    /// # Errors
    /// Returns [`WriteRejected`] on a read-only view.
    fn remove(&mut self, key: &[u8]) -> Result<(), WriteRejected>;
}

/// Full read-write view over a client-scoped host store.
pub struct ScopedStoreAdapter<'a> {
    inner: &'a mut dyn HostStore,
}

impl<'a> ScopedStoreAdapter<'a> {
    /// Wraps an already client-scoped store.
    #[must_use]
    pub fn new(inner: &'a mut dyn HostStore) -> Self {
        Self { inner }
    }
}

impl ContractStore for ScopedStoreAdapter<'_> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), WriteRejected> {
        self.inner.set(key, value);
        Ok(())
    }

    fn remove(&mut self, key: &[u8]) -> Result<(), WriteRejected> {
        self.inner.delete(key);
        Ok(())
    }
}

/// Read-only view over a client-scoped host store, for the query path.
pub struct ReadonlyStoreAdapter<'a> {
    inner: &'a dyn HostStore,
}

impl<'a> ReadonlyStoreAdapter<'a> {
    /// Wraps an already client-scoped store.
    #[must_use]
    pub fn new(inner: &'a dyn HostStore) -> Self {
        Self { inner }
    }
}

impl ContractStore for ReadonlyStoreAdapter<'_> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.inner.get(key)
    }

    fn set(&mut self, _key: &[u8], _value: &[u8]) -> Result<(), WriteRejected> {
        Err(WriteRejected("set"))
    }

    fn remove(&mut self, _key: &[u8]) -> Result<(), WriteRejected> {
        Err(WriteRejected("remove"))
    }
}

#[cfg(test)]
mod tests {
    use lightclient_core::testing::MemStore;

    use super::{ContractStore, ReadonlyStoreAdapter, ScopedStoreAdapter};

    #[test]
    fn test_scoped_adapter_reads_and_writes() {
        let mut store = MemStore::default();
        let mut adapter = ScopedStoreAdapter::new(&mut store);
        adapter.set(b"k", b"v").unwrap();
        assert_eq!(Some(b"v".to_vec()), adapter.get(b"k"));
        adapter.remove(b"k").unwrap();
        assert_eq!(None, adapter.get(b"k"));
    }

    #[test]
    fn test_readonly_adapter_rejects_writes() {
        let mut store = MemStore::default();
        let mut adapter = ScopedStoreAdapter::new(&mut store);
        adapter.set(b"k", b"v").unwrap();

        let mut readonly = ReadonlyStoreAdapter::new(&store);
        assert_eq!(Some(b"v".to_vec()), readonly.get(b"k"));
        readonly.set(b"k", b"other").unwrap_err();
        readonly.remove(b"k").unwrap_err();
        assert_eq!(Some(b"v".to_vec()), readonly.get(b"k"));
    }
}
