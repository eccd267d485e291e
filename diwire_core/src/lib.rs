//! Core types and contracts for the `diwire` container.
#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::must_use_candidate)]

pub mod arguments;
pub mod cache;
pub mod config;
pub mod error;
pub mod instance;
pub mod value;

pub use arguments::{Arguments, Component, FromValue};
pub use cache::{CacheStore, StoreError};
pub use error::{ArgumentError, Error, Result};
pub use instance::Instance;
pub use value::{Literal, Token, Value};
