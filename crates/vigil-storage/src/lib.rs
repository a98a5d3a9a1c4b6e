//! Vigil Storage: namespaced key-value persistence.
//!
//! The decision engine's stores (rules, pending approvals, action history)
//! are all built on the [`KvStore`] trait defined here. Two backends exist:
//!
//! - **In-memory** ([`MemoryKvStore`], always available): tests and
//!   single-process deployments that do not need durability
//! - **`SurrealKV`** (`SurrealKvStore`, behind the **`kv`** feature):
//!   embedded, versioned, ACID-compliant LSM-tree storage
//!
//! # Atomic primitives
//!
//! Besides plain `get`/`set`/`delete`, every backend provides:
//!
//! - [`take`](KvStore::take): remove-if-present, returning the removed value.
//!   Two racing callers can never both receive the same value.
//! - [`set_if_absent`](KvStore::set_if_absent): insert only when the key is free.
//! - [`compare_and_swap`](KvStore::compare_and_swap): replace only if the
//!   current value is byte-for-byte what the caller read.
//!
//! # Lifecycle
//!
//! Stores are explicit values owned by the composition root. Persistent
//! backends are opened with a path and must be [`close`](KvStore::close)d
//! to flush pending writes.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod error;
pub mod kv;

pub use error::{StorageError, StorageResult};
pub use kv::{KvStore, MemoryKvStore, ScopedKvStore};

#[cfg(feature = "kv")]
pub use kv::SurrealKvStore;
