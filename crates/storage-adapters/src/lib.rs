//! # storage-adapters
//!
//! `TokenStore` implementations. The access token is the only state that
//! outlives a process; everything else is refetched from the API.

#[cfg(feature = "file-store")]
pub mod file;
pub mod memory;

#[cfg(feature = "file-store")]
pub use file::FileTokenStore;
pub use memory::MemoryTokenStore;
