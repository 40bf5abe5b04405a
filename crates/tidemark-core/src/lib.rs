//! tidemark-core library.
//!
//! Two subsystems share this crate:
//!
//! - a quota-bounded cache over an injected [`store::KeyValueStore`]:
//!   [`usage`] accounting, static-priority [`evict`]ion, the guarded
//!   [`writer`], and cache [`purge`], bundled by [`cache::LocalCache`];
//! - reconciliation of the event and search streams: [`record`] shapes,
//!   [`window`] filtering, [`categorize`], and [`reconcile`], fed from the
//!   [`archive`].
//!
//! # Conventions
//!
//! - **Errors**: library seams return typed `thiserror` enums; application
//!   glue uses `anyhow::Result` with context.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod archive;
pub mod cache;
pub mod categorize;
pub mod config;
pub mod error;
pub mod evict;
pub mod keys;
pub mod purge;
pub mod quota;
pub mod reconcile;
pub mod record;
pub mod store;
pub mod usage;
pub mod window;
pub mod writer;
