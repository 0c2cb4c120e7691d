//! Store capabilities: the host key-value interface, the per-client prefixed
//! view, and the key layout shared by all client types.

use crate::context::HostEnv;
use crate::error::ClientError;
use crate::height::Height;
use crate::identifiers::ClientId;

/// The byte-oriented key-value capability consumed from the host.
///
/// Mutations must be atomic with respect to the transaction the surrounding
/// operation runs inside; that commit discipline is the host's concern.
pub trait HostStore {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    /// Stores `value` under `key`, overwriting any previous value.
    fn set(&mut self, key: &[u8], value: &[u8]);

    /// Removes `key` if present.
    fn delete(&mut self, key: &[u8]);

    /// Whether `key` is present.
    fn has(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }
}

/// The key under which a client's state record is stored, relative to the
/// client's namespace.
pub const CLIENT_STATE_KEY: &str = "clientState";

/// The key prefix of consensus state records, relative to the client's
/// namespace.
pub const CONSENSUS_STATES_KEY: &str = "consensusStates";

/// The host-store key of the counter allocating client identifier sequences.
pub const NEXT_CLIENT_SEQUENCE_KEY: &str = "nextClientSequence";

/// The namespace prefix isolating one client's keys.
#[must_use]
pub fn client_prefix(client_id: &ClientId) -> Vec<u8> {
    format!("clients/{client_id}/").into_bytes()
}

/// The key of the consensus state at `height`, relative to the client's
/// namespace.
#[must_use]
pub fn consensus_state_key(height: Height) -> Vec<u8> {
    format!("{CONSENSUS_STATES_KEY}/{height}").into_bytes()
}

/// The key recording the host time at which `height` was committed.
#[must_use]
pub fn processed_time_key(height: Height) -> Vec<u8> {
    format!("{CONSENSUS_STATES_KEY}/{height}/processedTime").into_bytes()
}

/// The key recording the host height at which `height` was committed.
#[must_use]
pub fn processed_height_key(height: Height) -> Vec<u8> {
    format!("{CONSENSUS_STATES_KEY}/{height}/processedHeight").into_bytes()
}

/// An isolated, prefixed view of the host store. All keys a client type (or
/// a sandboxed module) addresses pass through this view; nothing outside the
/// prefix is reachable.
pub struct PrefixedStore<'a> {
    inner: &'a mut dyn HostStore,
    prefix: Vec<u8>,
}

impl<'a> PrefixedStore<'a> {
    /// Creates a view over `inner` under an arbitrary prefix.
    #[must_use]
    pub fn new(inner: &'a mut dyn HostStore, prefix: Vec<u8>) -> Self {
        Self { inner, prefix }
    }

    /// Creates the canonical `clients/{client_id}/` view for a client.
    #[must_use]
    pub fn for_client(inner: &'a mut dyn HostStore, client_id: &ClientId) -> Self {
        let prefix = client_prefix(client_id);
        Self::new(inner, prefix)
    }

    fn prefixed(&self, key: &[u8]) -> Vec<u8> {
        let mut prefixed = Vec::with_capacity(self.prefix.len() + key.len());
        prefixed.extend_from_slice(&self.prefix);
        prefixed.extend_from_slice(key);
        prefixed
    }
}

impl HostStore for PrefixedStore<'_> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.inner.get(&self.prefixed(key))
    }

    fn set(&mut self, key: &[u8], value: &[u8]) {
        self.inner.set(&self.prefixed(key), value);
    }

    fn delete(&mut self, key: &[u8]) {
        self.inner.delete(&self.prefixed(key));
    }

    fn has(&self, key: &[u8]) -> bool {
        self.inner.has(&self.prefixed(key))
    }
}

/// Records when `height` was committed, for later delay checks.
pub fn set_processed_metadata(store: &mut dyn HostStore, height: Height, env: &HostEnv) {
    store.set(
        &processed_time_key(height),
        &env.block_time_ns.to_be_bytes(),
    );
    store.set(
        &processed_height_key(height),
        &env.block_height.to_be_bytes(),
    );
}

fn get_u64(store: &dyn HostStore, key: &[u8]) -> Option<u64> {
    let bz = store.get(key)?;
    let bz: [u8; 8] = bz.try_into().ok()?;
    Some(u64::from_be_bytes(bz))
}

/// Checks that both the minimum elapsed time and the minimum elapsed block
/// count since `height` was committed have passed.
///
/// # Errors
/// Returns [`ClientError::ConsensusStateNotFound`] if no commit metadata
/// exists for `height`, and [`ClientError::DelayPeriodNotElapsed`] if either
/// requirement is unmet. Both must be satisfied, not just one.
pub fn verify_delay_period(
    store: &dyn HostStore,
    env: &HostEnv,
    client_id: &ClientId,
    height: Height,
    delay_time_ns: u64,
    delay_blocks: u64,
) -> Result<(), ClientError> {
    let not_found = || ClientError::ConsensusStateNotFound {
        client_id: client_id.to_string(),
        height,
    };
    let processed_time = get_u64(store, &processed_time_key(height)).ok_or_else(not_found)?;
    let processed_height = get_u64(store, &processed_height_key(height)).ok_or_else(not_found)?;

    let valid_time = processed_time.saturating_add(delay_time_ns);
    if env.block_time_ns < valid_time {
        return Err(ClientError::DelayPeriodNotElapsed(format!(
            "current time {} is before valid time {valid_time}",
            env.block_time_ns
        )));
    }

    let valid_height = processed_height.saturating_add(delay_blocks);
    if env.block_height < valid_height {
        return Err(ClientError::DelayPeriodNotElapsed(format!(
            "current height {} is below valid height {valid_height}",
            env.block_height
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{
        set_processed_metadata, verify_delay_period, HostStore, PrefixedStore, CLIENT_STATE_KEY,
    };
    use crate::context::HostEnv;
    use crate::error::ClientError;
    use crate::height::Height;
    use crate::identifiers::{ClientId, ClientType};

    use std::collections::BTreeMap;

    #[derive(Default)]
    struct MapStore(BTreeMap<Vec<u8>, Vec<u8>>);

    impl HostStore for MapStore {
        fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
            self.0.get(key).cloned()
        }

        fn set(&mut self, key: &[u8], value: &[u8]) {
            self.0.insert(key.to_vec(), value.to_vec());
        }

        fn delete(&mut self, key: &[u8]) {
            self.0.remove(key);
        }
    }

    fn client_id() -> ClientId {
        ClientId::new(ClientType::new("solomachine").unwrap(), 0)
    }

    #[test]
    fn test_prefixed_store_isolates_clients() {
        let mut host = MapStore::default();
        let first = ClientId::new(ClientType::new("solomachine").unwrap(), 0);
        let second = ClientId::new(ClientType::new("solomachine").unwrap(), 1);

        PrefixedStore::for_client(&mut host, &first).set(CLIENT_STATE_KEY.as_bytes(), b"one");
        let second_view = PrefixedStore::for_client(&mut host, &second);
        assert!(second_view.get(CLIENT_STATE_KEY.as_bytes()).is_none());

        let first_view = PrefixedStore::for_client(&mut host, &first);
        assert_eq!(
            Some(b"one".to_vec()),
            first_view.get(CLIENT_STATE_KEY.as_bytes())
        );
        assert_eq!(
            Some(b"one".to_vec()),
            host.get(b"clients/solomachine-0/clientState")
        );
    }

    #[test]
    fn test_delay_period_requires_both_time_and_blocks() {
        let mut store = MapStore::default();
        let height = Height::new(0, 5);
        let committed_at = HostEnv::new("testchain-1", 100, 1_000);
        set_processed_metadata(&mut store, height, &committed_at);

        let id = client_id();

        // time elapsed but not blocks
        let env = HostEnv::new("testchain-1", 101, 2_000);
        verify_delay_period(&store, &env, &id, height, 500, 5).unwrap_err();

        // blocks elapsed but not time
        let env = HostEnv::new("testchain-1", 110, 1_200);
        verify_delay_period(&store, &env, &id, height, 500, 5).unwrap_err();

        // both elapsed
        let env = HostEnv::new("testchain-1", 110, 2_000);
        verify_delay_period(&store, &env, &id, height, 500, 5).unwrap();
    }

    #[test]
    fn test_delay_check_on_uncommitted_height_is_not_found() {
        let store = MapStore::default();
        let env = HostEnv::new("testchain-1", 1, 1);
        let err =
            verify_delay_period(&store, &env, &client_id(), Height::new(0, 9), 0, 0).unwrap_err();
        assert!(matches!(err, ClientError::ConsensusStateNotFound { .. }));
    }
}
