//! # notekeeper
//!
//! A personal note keeper over plain-text files.
//!
//! Notes are ordinary files under a single notes root. The `notes` binary
//! edits them locally, and `notes serve` exposes the same operations as a
//! small JSON HTTP API guarded by a shared secret.
//!
//! ```text
//!  ┌──────────┐      ┌───────────┐      ┌─────────────┐
//!  │   CLI    │─────▶│ NoteStore │─────▶│ notes root  │
//!  │ (notes)  │      │           │      │ *.txt files │
//!  └──────────┘      └───────────┘      └─────────────┘
//!                          ▲
//!  ┌──────────┐            │
//!  │   HTTP   │────────────┘
//!  │ (serve)  │
//!  └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | JSON configuration, created with defaults on first use |
//! | [`notes`] | Note file lifecycle |
//! | [`models`] | Wire types (`Note`, `Directory`) |
//! | [`server`] | HTTP API |
//! | [`registrar`] | Startup service registration |
//! | [`editor`] | Launching `$EDITOR` |
//! | [`logging`] | Tracing subscriber setup |
//! | [`error`] | Error type for the store and config |

pub mod config;
pub mod editor;
pub mod error;
pub mod logging;
pub mod models;
pub mod notes;
pub mod registrar;
pub mod server;
