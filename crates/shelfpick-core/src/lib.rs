//! # ShelfPick Core
//!
//! Core types and utilities for ShelfPick.
//! Provides the article catalog and resolver, the motion state model,
//! the session log, and the error taxonomy shared by all crates.

pub mod data;
pub mod error;

pub use data::{
    catalog::{
        normalize_key, standard_catalog, Catalog, CatalogBuilder, Location, ShelfId,
        STANDARD_ALIASES, STANDARD_ARTICLES, STANDARD_SHELVES,
    },
    log::{LogDirection, LogEvent, SessionLog},
    MotionState,
};

pub use error::{ConnectionError, Error, LinkFault, ResolveError, Result};
