//! # Inkwell
//!
//! A terminal reader for WordPress blogs with offline favorites and bookmarks.
//!
//! ## Overview
//!
//! Inkwell fetches posts, categories and comments from a blog's REST API and
//! lets you keep two personal collections, favorites and bookmarks. Both
//! collections cache the full post so they can be read without a connection.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        CLI / UI                             │
//! │        list posts, search, show, toggle, open               │
//! └─────────────────────────────────────────────────────────────┘
//!          │                   │                   │
//!          ▼                   ▼                   ▼
//! ┌─────────────────┐ ┌─────────────────┐ ┌─────────────────┐
//! │       API       │ │     Library     │ │     Catalog     │
//! │                 │ │                 │ │                 │
//! │ • Posts (paged) │ │ • Favorites     │ │ • Search        │
//! │ • Categories    │ │ • Bookmarks     │ │ • Categories    │
//! │ • Comments      │ │ • Post flags    │ │ • Related       │
//! └─────────────────┘ └─────────────────┘ └─────────────────┘
//!                              │
//!                              ▼
//!                     ┌─────────────────┐
//!                     │     Storage     │
//!                     │                 │
//!                     │ • SQLite        │
//!                     │ • In-memory     │
//!                     └─────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`adapter`]: Per-post flags and toggle callbacks
//! - [`api`]: WordPress REST client
//! - [`catalog`]: Search, category and related-post filters
//! - [`collection`]: Collection state, reconciliation and write-back
//! - [`config`]: Configuration management
//! - [`models`]: Data models (Post, Term, Comment)
//! - [`provider`]: Shared library state and its lifecycle
//! - [`storage`]: Durable key-value storage
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use inkwell::{Library, Post, SqliteStore};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let library = Library::mount(Arc::new(SqliteStore::open()?));
//! library.hydrate().await;
//!
//! let post = Post::new(42).with_title("Hello");
//! library.on_toggle_favorite(&post);
//! assert!(library.is_favorite(&post));
//!
//! library.flush().await;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::should_implement_trait)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::trivially_copy_pass_by_ref)]

pub mod adapter;
pub mod api;
pub mod catalog;
pub mod collection;
pub mod config;
pub mod models;
pub mod paths;
pub mod provider;
pub mod storage;

// Re-export main types for convenience
pub use adapter::PostFlags;
pub use collection::{CollectionKind, CollectionState, CollectionStore, Toggled};
pub use config::Config;
pub use models::{Category, Comment, Post, PostId, Tag};
pub use provider::{Library, Phase};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore, StorageError};

/// ASCII logo for the application
pub const LOGO: &str = r"
  _       _                  _ _
 (_)_ __ | | ____      _____| | |
 | | '_ \| |/ /\ \ /\ / / _ \ | |
 | | | | |   <  \ V  V /  __/ | |
 |_|_| |_|_|\_\  \_/\_/ \___|_|_|
";

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
