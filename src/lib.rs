//! Runtime dependency injection container.
//!
//! A [`Container`] builds instances from registered [`Definition`]s. A key with no definition
//! falls back to the [`Injectable`] class declared under the same identity, whose constructor
//! parameters are wired automatically and remembered in an optional [`MetadataCache`].
#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::must_use_candidate)]

pub use diwire_core::config;
pub use diwire_core::{
    ArgumentError, Arguments, CacheStore, Component, Error, FromValue, Instance, Literal, Result,
    StoreError, Token, Value,
};

pub use catalog::{Catalog, Class, Injectable, Methods, Parameter, ParameterKind};
pub use container::{Container, ContainerBuilder};
pub use definition::{Definition, DefinitionBuilder, MethodCall, Target};
pub use inspector::Inspector;
pub use metadata::MetadataCache;

#[macro_use]
pub(crate) mod macros;

mod chain;
mod resolver;

pub mod catalog;
pub mod container;
pub mod definition;
pub mod inspector;
pub mod metadata;
