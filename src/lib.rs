//! Order drafting and list-cache synchronization for a sales client.
//!
//! A [`session::SalesSession`] owns the list cache and hands out
//! [`draft::DraftStore`]s; a successful create or delete updates the cached
//! lists in place through the [`sync::MutationSynchronizer`].

pub mod backend;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod draft;
pub mod error;
pub mod notify;
pub mod session;
pub mod submission;
pub mod sync;
pub mod transport;
pub mod utils;
pub mod validation;
