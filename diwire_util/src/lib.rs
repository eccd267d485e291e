//! Collaborators of the `diwire` container: metadata stores and configuration loading.
#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::must_use_candidate)]

pub mod config;
#[cfg(feature = "disk")]
pub mod disk;
pub mod memory;

#[cfg(feature = "disk")]
pub use disk::DirStore;
pub use memory::MemoryStore;
