//! `tuklas-memory` – the Discovery Journal.
//!
//! Persists the learner's discoveries and profile scalars in a small
//! string-valued key-value store backed by local SQLite.
//!
//! # Modules
//!
//! - [`kv`] – [`KeyValueStore`][kv::KeyValueStore]: the key-value substrate,
//!   with a SQLite implementation ([`SqliteKvStore`][kv::SqliteKvStore]) and
//!   an in-process one ([`MemoryKvStore`][kv::MemoryKvStore]).
//! - [`journal`] – [`DiscoveryStore`][journal::DiscoveryStore]: the
//!   newest-first, duplicate-free discovery list plus the `points` and
//!   `level` profile settings, each stored as one whole JSON/text document
//!   under its own key.

pub mod journal;
pub mod kv;

pub use journal::{DiscoveryStore, SaveOutcome, DISCOVERIES_KEY, LEVEL_KEY, POINTS_KEY};
pub use kv::{KeyValueStore, MemoryKvStore, SqliteKvStore, StoreError};
