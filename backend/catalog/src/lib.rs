//! # Catalog
//!
//! Domain types and the storage seams of the spider catalog.
//!
//! ## Records
//!
//! - One document per catalogued spider, keyed by `spider_uuid` (`SPIDER_<uuid>`)
//! - Taxonomy: family, genus, species (genus/species may be empty while a record is partially classified)
//! - Zero or more addresses, each with zero or more named positions
//! - Ordered list of stored image file names
//!
//! ## Derived Views
//!
//! - [`geography::aggregate`]: province -> locality -> unique position names, for map display
//! - [`images`]: image list reconciliation and bounded best-effort file removal
//! - [`statistics`]: per-family genus/species tree, grown on registration
//!
//! ## Seams
//!
//! Everything that touches a database or the filesystem lives behind the traits in
//! [`repository`]. The server crate provides the Redis and filesystem versions,
//! [`memory`] provides in-process versions for tests.
pub mod error;
pub mod geography;
pub mod images;
pub mod memory;
pub mod models;
pub mod query;
pub mod repository;
pub mod statistics;

pub use error::StorageError;
