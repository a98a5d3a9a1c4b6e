//! Raw key-value store trait and implementations.
//!
//! The [`KvStore`] trait provides byte-level operations with namespaced
//! keys. Implementations:
//!
//! - **In-memory** (always available): For tests and ephemeral data
//! - **`SurrealKV`** (behind `kv` feature): Persistent, versioned, ACID-compliant
//!
//! # Namespacing
//!
//! All operations are scoped to a namespace. The domain stores use
//! namespaces such as `rules`, `approvals:pending` and `audit:history`.
//!
//! # Ergonomic Access
//!
//! Use [`ScopedKvStore`] to pre-bind a namespace. It also provides typed
//! JSON helpers ([`get_json`](ScopedKvStore::get_json),
//! [`set_json`](ScopedKvStore::set_json), [`take_json`](ScopedKvStore::take_json),
//! [`set_json_if_absent`](ScopedKvStore::set_json_if_absent)).

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::error::{StorageError, StorageResult};

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate that a namespace is safe for use as a key prefix.
///
/// Namespaces must be non-empty and must not contain the null byte
/// (used internally as the namespace/key separator).
fn validate_namespace(namespace: &str) -> StorageResult<()> {
    if namespace.is_empty() {
        return Err(StorageError::InvalidKey(
            "namespace must not be empty".into(),
        ));
    }
    if namespace.contains('\0') {
        return Err(StorageError::InvalidKey(
            "namespace must not contain null bytes".into(),
        ));
    }
    Ok(())
}

/// Validate that a key is safe for storage.
///
/// Keys must be non-empty and must not contain the null byte.
fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("key must not be empty".into()));
    }
    if key.contains('\0') {
        return Err(StorageError::InvalidKey(
            "key must not contain null bytes".into(),
        ));
    }
    Ok(())
}

/// Build the composite key `"{namespace}\0{key}"` as bytes.
#[cfg(feature = "kv")]
fn composite_key(namespace: &str, key: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(namespace.len().saturating_add(key.len()).saturating_add(1));
    buf.extend_from_slice(namespace.as_bytes());
    buf.push(0);
    buf.extend_from_slice(key.as_bytes());
    buf
}

/// Build the start of the namespace range (inclusive): `"{namespace}\0"`.
#[cfg(feature = "kv")]
fn namespace_range_start(namespace: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(namespace.len().saturating_add(1));
    buf.extend_from_slice(namespace.as_bytes());
    buf.push(0);
    buf
}

/// Build the end of the namespace range (exclusive): `"{namespace}\x01"`.
///
/// Since `\0` is the separator, the range `["{namespace}\0", "{namespace}\x01")`
/// captures exactly all keys in the namespace.
#[cfg(feature = "kv")]
fn namespace_range_end(namespace: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(namespace.len().saturating_add(1));
    buf.extend_from_slice(namespace.as_bytes());
    buf.push(1);
    buf
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Raw key-value store trait.
///
/// Provides namespaced byte-level storage. Implementations must be safe for
/// concurrent use; the conditional operations ([`take`](Self::take),
/// [`set_if_absent`](Self::set_if_absent),
/// [`compare_and_swap`](Self::compare_and_swap)) must be atomic with respect
/// to every other operation on the same key.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Get a value by namespace and key.
    ///
    /// Returns `None` if the key does not exist.
    async fn get(&self, namespace: &str, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Set a value for a namespace and key.
    ///
    /// Overwrites any existing value.
    async fn set(&self, namespace: &str, key: &str, value: Vec<u8>) -> StorageResult<()>;

    /// Delete a key from a namespace.
    ///
    /// Returns `true` if the key existed and was deleted.
    async fn delete(&self, namespace: &str, key: &str) -> StorageResult<bool>;

    /// Atomically remove a key and return the value it held.
    ///
    /// Returns `None` if the key was absent. When several callers race on
    /// the same key, at most one of them receives the value.
    async fn take(&self, namespace: &str, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Store a value only if the key does not exist yet.
    ///
    /// Returns `true` if the value was written.
    async fn set_if_absent(&self, namespace: &str, key: &str, value: Vec<u8>)
    -> StorageResult<bool>;

    /// Replace the value only if it still equals `expected`.
    ///
    /// Returns `false` if the key is absent or holds a different value.
    async fn compare_and_swap(
        &self,
        namespace: &str,
        key: &str,
        expected: &[u8],
        new_value: Vec<u8>,
    ) -> StorageResult<bool>;

    /// Check if a key exists in a namespace.
    async fn exists(&self, namespace: &str, key: &str) -> StorageResult<bool>;

    /// List all keys in a namespace.
    async fn list_keys(&self, namespace: &str) -> StorageResult<Vec<String>>;

    /// Delete all keys in a namespace.
    async fn clear_namespace(&self, namespace: &str) -> StorageResult<u64>;

    /// Flush pending writes and release the backend.
    ///
    /// The default implementation does nothing.
    async fn close(&self) -> StorageResult<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory implementation (always available)
// ---------------------------------------------------------------------------

/// In-memory key-value store for tests and ephemeral data.
///
/// Keys are stored as `"{namespace}\0{key}"` in a `HashMap`. Every
/// conditional operation runs under the write lock, which makes it atomic.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    data: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryKvStore {
    /// Create a new empty in-memory KV store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn full_key(namespace: &str, key: &str) -> String {
        format!("{namespace}\0{key}")
    }

    fn read(&self) -> StorageResult<std::sync::RwLockReadGuard<'_, HashMap<String, Vec<u8>>>> {
        self.data
            .read()
            .map_err(|e| StorageError::Internal(e.to_string()))
    }

    fn write(&self) -> StorageResult<std::sync::RwLockWriteGuard<'_, HashMap<String, Vec<u8>>>> {
        self.data
            .write()
            .map_err(|e| StorageError::Internal(e.to_string()))
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, namespace: &str, key: &str) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.read()?.get(&Self::full_key(namespace, key)).cloned())
    }

    async fn set(&self, namespace: &str, key: &str, value: Vec<u8>) -> StorageResult<()> {
        self.write()?.insert(Self::full_key(namespace, key), value);
        Ok(())
    }

    async fn delete(&self, namespace: &str, key: &str) -> StorageResult<bool> {
        Ok(self
            .write()?
            .remove(&Self::full_key(namespace, key))
            .is_some())
    }

    async fn take(&self, namespace: &str, key: &str) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.write()?.remove(&Self::full_key(namespace, key)))
    }

    async fn set_if_absent(
        &self,
        namespace: &str,
        key: &str,
        value: Vec<u8>,
    ) -> StorageResult<bool> {
        let mut data = self.write()?;
        let full = Self::full_key(namespace, key);
        if data.contains_key(&full) {
            return Ok(false);
        }
        data.insert(full, value);
        Ok(true)
    }

    async fn compare_and_swap(
        &self,
        namespace: &str,
        key: &str,
        expected: &[u8],
        new_value: Vec<u8>,
    ) -> StorageResult<bool> {
        let mut data = self.write()?;
        match data.get_mut(&Self::full_key(namespace, key)) {
            Some(current) if current.as_slice() == expected => {
                *current = new_value;
                Ok(true)
            },
            _ => Ok(false),
        }
    }

    async fn exists(&self, namespace: &str, key: &str) -> StorageResult<bool> {
        Ok(self.read()?.contains_key(&Self::full_key(namespace, key)))
    }

    async fn list_keys(&self, namespace: &str) -> StorageResult<Vec<String>> {
        let prefix = format!("{namespace}\0");
        Ok(self
            .read()?
            .keys()
            .filter_map(|k| k.strip_prefix(&prefix).map(String::from))
            .collect())
    }

    async fn clear_namespace(&self, namespace: &str) -> StorageResult<u64> {
        let mut data = self.write()?;
        let prefix = format!("{namespace}\0");
        let before = data.len();
        data.retain(|k, _| !k.starts_with(&prefix));
        Ok(before.saturating_sub(data.len()) as u64)
    }
}

// ---------------------------------------------------------------------------
// SurrealKV implementation (behind `kv` feature)
// ---------------------------------------------------------------------------

/// Persistent key-value store backed by `SurrealKV`.
///
/// ACID-compliant, versioned, embedded LSM-tree storage. Conditional
/// operations read and write inside one transaction; a transaction that loses
/// a race fails at commit and is reported as [`StorageError::Conflict`].
///
/// # Example
///
/// ```rust,ignore
/// use vigil_storage::SurrealKvStore;
///
/// let store = SurrealKvStore::open("./data/kv")?;
/// store.set("rules", "rule-1", b"{}".to_vec()).await?;
/// store.close().await?;
/// ```
#[cfg(feature = "kv")]
pub struct SurrealKvStore {
    tree: surrealkv::Tree,
}

#[cfg(feature = "kv")]
impl std::fmt::Debug for SurrealKvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurrealKvStore").finish_non_exhaustive()
    }
}

#[cfg(feature = "kv")]
impl SurrealKvStore {
    /// Open a persistent KV store at the given directory path.
    ///
    /// Creates the directory if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Connection`] if the store cannot be opened.
    pub fn open(path: impl AsRef<std::path::Path>) -> StorageResult<Self> {
        let tree = surrealkv::TreeBuilder::new()
            .with_path(path.as_ref().to_path_buf())
            .build()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        tracing::debug!(path = %path.as_ref().display(), "opened SurrealKV store");
        Ok(Self { tree })
    }
}

#[cfg(feature = "kv")]
fn map_kv_err(e: &surrealkv::Error) -> StorageError {
    StorageError::Internal(e.to_string())
}

/// Map a commit failure, distinguishing lost races from real failures.
#[cfg(feature = "kv")]
fn map_commit_err(e: &surrealkv::Error) -> StorageError {
    let msg = e.to_string();
    if msg.to_ascii_lowercase().contains("conflict") {
        StorageError::Conflict(msg)
    } else {
        StorageError::Internal(msg)
    }
}

#[cfg(feature = "kv")]
#[async_trait]
impl KvStore for SurrealKvStore {
    async fn get(&self, namespace: &str, key: &str) -> StorageResult<Option<Vec<u8>>> {
        validate_namespace(namespace)?;
        validate_key(key)?;
        let ck = composite_key(namespace, key);
        let tx = self
            .tree
            .begin_with_mode(surrealkv::Mode::ReadOnly)
            .map_err(|ref e| map_kv_err(e))?;
        tx.get(&ck).map_err(|ref e| map_kv_err(e))
    }

    async fn set(&self, namespace: &str, key: &str, value: Vec<u8>) -> StorageResult<()> {
        validate_namespace(namespace)?;
        validate_key(key)?;
        let ck = composite_key(namespace, key);
        let mut tx = self.tree.begin().map_err(|ref e| map_kv_err(e))?;
        tx.set(&ck, &value).map_err(|ref e| map_kv_err(e))?;
        tx.commit().await.map_err(|ref e| map_commit_err(e))
    }

    async fn delete(&self, namespace: &str, key: &str) -> StorageResult<bool> {
        Ok(self.take(namespace, key).await?.is_some())
    }

    async fn take(&self, namespace: &str, key: &str) -> StorageResult<Option<Vec<u8>>> {
        validate_namespace(namespace)?;
        validate_key(key)?;
        let ck = composite_key(namespace, key);
        let mut tx = self.tree.begin().map_err(|ref e| map_kv_err(e))?;
        let Some(value) = tx.get(&ck).map_err(|ref e| map_kv_err(e))? else {
            return Ok(None);
        };
        tx.delete(&ck).map_err(|ref e| map_kv_err(e))?;
        tx.commit().await.map_err(|ref e| map_commit_err(e))?;
        Ok(Some(value))
    }

    async fn set_if_absent(
        &self,
        namespace: &str,
        key: &str,
        value: Vec<u8>,
    ) -> StorageResult<bool> {
        validate_namespace(namespace)?;
        validate_key(key)?;
        let ck = composite_key(namespace, key);
        let mut tx = self.tree.begin().map_err(|ref e| map_kv_err(e))?;
        if tx.get(&ck).map_err(|ref e| map_kv_err(e))?.is_some() {
            return Ok(false);
        }
        tx.set(&ck, &value).map_err(|ref e| map_kv_err(e))?;
        tx.commit().await.map_err(|ref e| map_commit_err(e))?;
        Ok(true)
    }

    async fn compare_and_swap(
        &self,
        namespace: &str,
        key: &str,
        expected: &[u8],
        new_value: Vec<u8>,
    ) -> StorageResult<bool> {
        validate_namespace(namespace)?;
        validate_key(key)?;
        let ck = composite_key(namespace, key);
        let mut tx = self.tree.begin().map_err(|ref e| map_kv_err(e))?;
        match tx.get(&ck).map_err(|ref e| map_kv_err(e))? {
            Some(current) if current.as_slice() == expected => {},
            _ => return Ok(false),
        }
        tx.set(&ck, &new_value).map_err(|ref e| map_kv_err(e))?;
        tx.commit().await.map_err(|ref e| map_commit_err(e))?;
        Ok(true)
    }

    async fn exists(&self, namespace: &str, key: &str) -> StorageResult<bool> {
        Ok(self.get(namespace, key).await?.is_some())
    }

    async fn list_keys(&self, namespace: &str) -> StorageResult<Vec<String>> {
        validate_namespace(namespace)?;
        let start = namespace_range_start(namespace);
        let end = namespace_range_end(namespace);
        let prefix_len = namespace.len().saturating_add(1);

        let tx = self
            .tree
            .begin_with_mode(surrealkv::Mode::ReadOnly)
            .map_err(|ref e| map_kv_err(e))?;
        let mut iter = tx.range(&start, &end).map_err(|ref e| map_kv_err(e))?;
        iter.seek_first().map_err(|ref e| map_kv_err(e))?;

        let mut keys = Vec::new();
        while iter.valid() {
            let raw_key = iter.key();
            if raw_key.len() > prefix_len
                && let Some(rest) = raw_key.get(prefix_len..)
                && let Ok(key_str) = std::str::from_utf8(rest)
            {
                keys.push(key_str.to_string());
            }
            iter.next().map_err(|ref e| map_kv_err(e))?;
        }
        Ok(keys)
    }

    async fn clear_namespace(&self, namespace: &str) -> StorageResult<u64> {
        validate_namespace(namespace)?;
        let start = namespace_range_start(namespace);
        let end = namespace_range_end(namespace);

        let mut tx = self.tree.begin().map_err(|ref e| map_kv_err(e))?;

        // Collect keys first, then delete (iterator borrows tx immutably).
        let keys_to_delete = {
            let mut iter = tx.range(&start, &end).map_err(|ref e| map_kv_err(e))?;
            iter.seek_first().map_err(|ref e| map_kv_err(e))?;
            let mut keys = Vec::new();
            while iter.valid() {
                keys.push(iter.key());
                iter.next().map_err(|ref e| map_kv_err(e))?;
            }
            keys
        };

        let count = keys_to_delete.len() as u64;
        for key in &keys_to_delete {
            tx.delete(key).map_err(|ref e| map_kv_err(e))?;
        }
        if count > 0 {
            tx.commit().await.map_err(|ref e| map_commit_err(e))?;
        }
        Ok(count)
    }

    async fn close(&self) -> StorageResult<()> {
        self.tree
            .close()
            .await
            .map_err(|e| StorageError::Internal(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Scoped store (namespace pre-bound)
// ---------------------------------------------------------------------------

/// A namespace-scoped view into a [`KvStore`].
///
/// Each domain store holds one or more scoped views and never handles raw
/// namespaces. Typed JSON helpers cover the common serialize/deserialize path.
///
/// # Example
///
/// ```rust,ignore
/// use vigil_storage::{ScopedKvStore, MemoryKvStore};
/// use std::sync::Arc;
///
/// let store = Arc::new(MemoryKvStore::new());
/// let scoped = ScopedKvStore::new(store, "rules")?;
///
/// scoped.set("r1", b"{}".to_vec()).await?;
/// let val = scoped.get("r1").await?;
/// ```
#[derive(Clone)]
pub struct ScopedKvStore {
    inner: Arc<dyn KvStore>,
    namespace: String,
}

impl std::fmt::Debug for ScopedKvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedKvStore")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl ScopedKvStore {
    /// Create a scoped view into the given store for `namespace`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidKey`] if the namespace is empty
    /// or contains null bytes.
    pub fn new(store: Arc<dyn KvStore>, namespace: impl Into<String>) -> StorageResult<Self> {
        let namespace = namespace.into();
        validate_namespace(&namespace)?;
        Ok(Self {
            inner: store,
            namespace,
        })
    }

    /// The namespace this store is scoped to.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Get a raw byte value by key.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidKey`] if the key is empty or invalid.
    pub async fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        validate_key(key)?;
        self.inner.get(&self.namespace, key).await
    }

    /// Set a raw byte value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidKey`] if the key is empty or invalid.
    pub async fn set(&self, key: &str, value: Vec<u8>) -> StorageResult<()> {
        validate_key(key)?;
        self.inner.set(&self.namespace, key, value).await
    }

    /// Delete a key.
    ///
    /// Returns `true` if the key existed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidKey`] if the key is empty or invalid.
    pub async fn delete(&self, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        self.inner.delete(&self.namespace, key).await
    }

    /// Atomically remove a key and return its raw value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidKey`] if the key is empty or invalid.
    pub async fn take(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        validate_key(key)?;
        self.inner.take(&self.namespace, key).await
    }

    /// Check if a key exists.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidKey`] if the key is empty or invalid.
    pub async fn exists(&self, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        self.inner.exists(&self.namespace, key).await
    }

    /// List all keys in this namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store operation fails.
    pub async fn list_keys(&self) -> StorageResult<Vec<String>> {
        self.inner.list_keys(&self.namespace).await
    }

    /// Delete all keys in this namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store operation fails.
    pub async fn clear(&self) -> StorageResult<u64> {
        self.inner.clear_namespace(&self.namespace).await
    }

    // -- Typed convenience (JSON) --

    /// Deserialize a JSON value from the store.
    ///
    /// Returns `None` if the key does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Serialization`] if deserialization fails.
    pub async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        key: &str,
    ) -> StorageResult<Option<T>> {
        self.get(key).await?.as_deref().map(decode).transpose()
    }

    /// Serialize a value as JSON and store it.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Serialization`] if serialization fails.
    pub async fn set_json<T: serde::Serialize>(&self, key: &str, value: &T) -> StorageResult<()> {
        self.set(key, encode(value)?).await
    }

    /// Serialize a value and store it only if the key is free.
    ///
    /// Returns `true` if the value was written.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Serialization`] if serialization fails.
    pub async fn set_json_if_absent<T: serde::Serialize>(
        &self,
        key: &str,
        value: &T,
    ) -> StorageResult<bool> {
        validate_key(key)?;
        self.inner
            .set_if_absent(&self.namespace, key, encode(value)?)
            .await
    }

    /// Atomically remove a key and deserialize the value it held.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Serialization`] if the removed value cannot be
    /// deserialized. The key is gone either way.
    pub async fn take_json<T: serde::de::DeserializeOwned>(
        &self,
        key: &str,
    ) -> StorageResult<Option<T>> {
        self.take(key).await?.as_deref().map(decode).transpose()
    }

    /// Read-modify-write a JSON value with optimistic concurrency.
    ///
    /// `f` is applied to the current value and the result is written back
    /// with [`KvStore::compare_and_swap`]; on a lost race the read is retried
    /// up to `max_attempts` times. Returns the written value, or `None` if the
    /// key is absent (including when it disappears between attempts).
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Conflict`] if every attempt lost a race, or a
    /// serialization error if the stored value is malformed.
    pub async fn update_json<T, F>(
        &self,
        key: &str,
        max_attempts: usize,
        mut f: F,
    ) -> StorageResult<Option<T>>
    where
        T: serde::Serialize + serde::de::DeserializeOwned + Send,
        F: FnMut(&mut T) + Send,
    {
        for _ in 0..max_attempts {
            let Some(current) = self.get(key).await? else {
                return Ok(None);
            };
            let mut value: T = decode(&current)?;
            f(&mut value);
            let next = encode(&value)?;
            if self
                .inner
                .compare_and_swap(&self.namespace, key, &current, next)
                .await?
            {
                return Ok(Some(value));
            }
            tracing::debug!(namespace = %self.namespace, key, "update lost a race, retrying");
        }
        Err(StorageError::Conflict(format!(
            "{}/{key}: gave up after {max_attempts} attempts",
            self.namespace
        )))
    }

    /// Load and deserialize every value in the namespace.
    ///
    /// Keys removed between listing and reading are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if listing, reading, or deserialization fails.
    pub async fn values_json<T: serde::de::DeserializeOwned>(&self) -> StorageResult<Vec<T>> {
        let keys = self.list_keys().await?;
        let mut values = Vec::with_capacity(keys.len());
        for key in &keys {
            if let Some(value) = self.get_json(key).await? {
                values.push(value);
            }
        }
        Ok(values)
    }
}

fn encode<T: serde::Serialize>(value: &T) -> StorageResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| StorageError::Serialization(e.to_string()))
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> StorageResult<T> {
    serde_json::from_slice(bytes).map_err(|e| StorageError::Serialization(e.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- MemoryKvStore tests --

    #[tokio::test]
    async fn test_memory_get_set() {
        let store = MemoryKvStore::new();
        store.set("ns1", "key1", b"hello".to_vec()).await.unwrap();
        let val = store.get("ns1", "key1").await.unwrap();
        assert_eq!(val, Some(b"hello".to_vec()));
    }

    #[tokio::test]
    async fn test_memory_delete() {
        let store = MemoryKvStore::new();
        store.set("ns1", "k", b"v".to_vec()).await.unwrap();
        assert!(store.delete("ns1", "k").await.unwrap());
        assert!(!store.delete("ns1", "k").await.unwrap());
        assert!(store.get("ns1", "k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_take_returns_value_once() {
        let store = MemoryKvStore::new();
        store.set("ns1", "k", b"v".to_vec()).await.unwrap();
        assert_eq!(store.take("ns1", "k").await.unwrap(), Some(b"v".to_vec()));
        assert_eq!(store.take("ns1", "k").await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_memory_take_races_have_one_winner() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryKvStore::new());
        store.set("ns", "k", b"v".to_vec()).await.unwrap();

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.take("ns", "k").await.unwrap() })
            })
            .collect();
        let results = futures::future::join_all(tasks).await;
        let winners = results
            .into_iter()
            .filter(|r| r.as_ref().unwrap().is_some())
            .count();
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_memory_set_if_absent() {
        let store = MemoryKvStore::new();
        assert!(store.set_if_absent("ns", "k", b"1".to_vec()).await.unwrap());
        assert!(!store.set_if_absent("ns", "k", b"2".to_vec()).await.unwrap());
        assert_eq!(store.get("ns", "k").await.unwrap(), Some(b"1".to_vec()));
    }

    #[tokio::test]
    async fn test_memory_compare_and_swap() {
        let store = MemoryKvStore::new();
        assert!(!store.compare_and_swap("ns", "k", b"x", b"y".to_vec()).await.unwrap());

        store.set("ns", "k", b"1".to_vec()).await.unwrap();
        assert!(!store.compare_and_swap("ns", "k", b"0", b"2".to_vec()).await.unwrap());
        assert!(store.compare_and_swap("ns", "k", b"1", b"2".to_vec()).await.unwrap());
        assert_eq!(store.get("ns", "k").await.unwrap(), Some(b"2".to_vec()));
    }

    #[tokio::test]
    async fn test_memory_namespace_isolation() {
        let store = MemoryKvStore::new();
        store.set("ns1", "k", b"v1".to_vec()).await.unwrap();
        store.set("ns2", "k", b"v2".to_vec()).await.unwrap();
        assert_eq!(store.get("ns1", "k").await.unwrap(), Some(b"v1".to_vec()));
        assert_eq!(store.get("ns2", "k").await.unwrap(), Some(b"v2".to_vec()));
    }

    #[tokio::test]
    async fn test_memory_list_and_clear() {
        let store = MemoryKvStore::new();
        store.set("ns1", "a", b"1".to_vec()).await.unwrap();
        store.set("ns1", "b", b"2".to_vec()).await.unwrap();
        store.set("ns2", "c", b"3".to_vec()).await.unwrap();
        let mut keys = store.list_keys("ns1").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["a", "b"]);

        assert_eq!(store.clear_namespace("ns1").await.unwrap(), 2);
        assert!(store.list_keys("ns1").await.unwrap().is_empty());
        assert_eq!(store.list_keys("ns2").await.unwrap().len(), 1);
    }

    // -- Validation tests --

    #[test]
    fn test_validate_namespace() {
        assert!(validate_namespace("").is_err());
        assert!(validate_namespace("ns\0bad").is_err());
        assert!(validate_namespace("rules").is_ok());
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("").is_err());
        assert!(validate_key("k\0bad").is_err());
    }

    // -- ScopedKvStore tests --

    #[derive(serde::Serialize, serde::Deserialize, Debug, PartialEq)]
    struct Counter {
        name: String,
        hits: u32,
    }

    fn scoped(ns: &str) -> ScopedKvStore {
        ScopedKvStore::new(Arc::new(MemoryKvStore::new()), ns).unwrap()
    }

    #[tokio::test]
    async fn test_scoped_isolation() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryKvStore::new());
        let a = ScopedKvStore::new(Arc::clone(&store), "a").unwrap();
        let b = ScopedKvStore::new(Arc::clone(&store), "b").unwrap();

        a.set("key", b"a-value".to_vec()).await.unwrap();
        b.set("key", b"b-value".to_vec()).await.unwrap();

        assert_eq!(a.get("key").await.unwrap(), Some(b"a-value".to_vec()));
        assert_eq!(b.get("key").await.unwrap(), Some(b"b-value".to_vec()));
    }

    #[tokio::test]
    async fn test_scoped_json_take() {
        let s = scoped("ns");
        let c = Counter {
            name: "x".into(),
            hits: 1,
        };
        s.set_json("c", &c).await.unwrap();

        let taken: Option<Counter> = s.take_json("c").await.unwrap();
        assert_eq!(taken, Some(c));
        let again: Option<Counter> = s.take_json("c").await.unwrap();
        assert!(again.is_none());
    }

    #[tokio::test]
    async fn test_scoped_json_if_absent() {
        let s = scoped("ns");
        let c = Counter {
            name: "x".into(),
            hits: 1,
        };
        assert!(s.set_json_if_absent("c", &c).await.unwrap());
        assert!(!s.set_json_if_absent("c", &c).await.unwrap());
    }

    #[tokio::test]
    async fn test_scoped_update_json() {
        let s = scoped("ns");
        s.set_json(
            "c",
            &Counter {
                name: "x".into(),
                hits: 1,
            },
        )
        .await
        .unwrap();

        let updated: Option<Counter> = s
            .update_json("c", 3, |c: &mut Counter| c.hits = c.hits.saturating_add(1))
            .await
            .unwrap();
        assert_eq!(updated.unwrap().hits, 2);

        let missing: Option<Counter> = s
            .update_json("nope", 3, |c: &mut Counter| c.hits = 0)
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_scoped_values_json() {
        let s = scoped("ns");
        for i in 0..3u32 {
            s.set_json(
                &format!("k{i}"),
                &Counter {
                    name: format!("c{i}"),
                    hits: i,
                },
            )
            .await
            .unwrap();
        }
        let mut all: Vec<Counter> = s.values_json().await.unwrap();
        all.sort_by_key(|c| c.hits);
        assert_eq!(all.len(), 3);
        assert_eq!(all[2].name, "c2");
    }

    #[tokio::test]
    async fn test_scoped_rejects_empty_key() {
        let s = scoped("ns");
        assert!(s.get("").await.is_err());
        assert!(s.take("").await.is_err());
    }

    #[test]
    fn test_scoped_rejects_empty_namespace() {
        let store = Arc::new(MemoryKvStore::new());
        assert!(ScopedKvStore::new(store, "").is_err());
    }

    // -- SurrealKvStore tests (behind feature gate) --

    #[cfg(feature = "kv")]
    mod surreal_kv_tests {
        use super::*;

        fn make_store() -> (SurrealKvStore, tempfile::TempDir) {
            let dir = tempfile::tempdir().unwrap();
            let store = SurrealKvStore::open(dir.path()).unwrap();
            (store, dir)
        }

        #[tokio::test]
        async fn test_surreal_get_set() {
            let (store, _dir) = make_store();
            store.set("ns1", "key1", b"hello".to_vec()).await.unwrap();
            let val = store.get("ns1", "key1").await.unwrap();
            assert_eq!(val, Some(b"hello".to_vec()));
        }

        #[tokio::test]
        async fn test_surreal_take() {
            let (store, _dir) = make_store();
            store.set("ns1", "k", b"v".to_vec()).await.unwrap();
            assert_eq!(store.take("ns1", "k").await.unwrap(), Some(b"v".to_vec()));
            assert!(store.take("ns1", "k").await.unwrap().is_none());
        }

        #[tokio::test]
        async fn test_surreal_set_if_absent() {
            let (store, _dir) = make_store();
            assert!(store.set_if_absent("ns", "k", b"1".to_vec()).await.unwrap());
            assert!(!store.set_if_absent("ns", "k", b"2".to_vec()).await.unwrap());
        }

        #[tokio::test]
        async fn test_surreal_list_keys() {
            let (store, _dir) = make_store();
            store.set("ns1", "a", b"1".to_vec()).await.unwrap();
            store.set("ns1", "b", b"2".to_vec()).await.unwrap();
            store.set("ns2", "c", b"3".to_vec()).await.unwrap();
            let mut keys = store.list_keys("ns1").await.unwrap();
            keys.sort();
            assert_eq!(keys, vec!["a", "b"]);
        }
    }
}
