//! Sync layer: the remote sheet's JSON envelope and the HTTP row store client.

#[cfg(feature = "http")]
pub mod http;
#[cfg(feature = "http")]
mod wire;

#[cfg(feature = "http")]
pub use http::{RowStoreClient, SyncError};
