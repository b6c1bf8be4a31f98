//! # docqa-db
//!
//! Infrastructure layer for docqa - vector storage for document passages.
//!
//! This crate keeps the storage concern out of `docqa-core`. The core only
//! depends on the [`vector::VectorIndexBackend`] trait, so backends can be
//! swapped (or faked in tests) without touching the answer pipeline.
//!
//! ## Architecture
//!
//! ```text
//! docqa-cli → docqa-core → (traits)
//!                ↑
//!             docqa-db (vector storage backends)
//!             docqa-model (embeddings + generation)
//! ```
//!
//! ## Features
//!
//! - `jsonl` (default): file-based backend, one JSON record per line
//!
//! The in-memory backend is always available.
//!
//! ## Usage
//!
//! ```ignore
//! use docqa_db::vector::{VectorIndexConfig, open_vector_index};
//!
//! let config = VectorIndexConfig::new(384, "/path/to/index");
//! let index = open_vector_index(&config)?;
//!
//! index.upsert(&inserts)?;
//! let results = index.query(&embedding, 4, None)?;
//! ```

pub mod error;
pub mod vector;

pub use error::{DbError, DbResult};
