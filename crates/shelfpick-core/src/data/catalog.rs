//! Article catalog and location resolver
//!
//! Maps what the operator types to an X position on the axis:
//! alias → canonical article → shelf → coordinate.
//! The catalog is assembled once through [`CatalogBuilder`] and has no
//! mutators afterwards.

use crate::error::ResolveError;
use std::collections::{BTreeMap, HashMap};

/// Shelf identifier (small positive integer)
pub type ShelfId = u32;

/// Resolved pick target
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    /// Canonical article name
    pub article: String,
    /// Shelf holding the article
    pub shelf: ShelfId,
    /// X coordinate of the shelf in millimeters
    pub x_mm: f64,
}

/// Normalize a name for comparison: trim, collapse inner whitespace, fold case.
pub fn normalize_key(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Immutable article/shelf catalog
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// normalized name -> (canonical name, shelf)
    articles: HashMap<String, (String, ShelfId)>,
    /// normalized alias -> canonical name
    aliases: HashMap<String, String>,
    shelves: BTreeMap<ShelfId, f64>,
}

impl Catalog {
    /// Start building a catalog
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// Resolve operator input to a pick location
    ///
    /// Aliases are consulted first, then canonical names. Both comparisons
    /// ignore case and surrounding whitespace.
    pub fn resolve(&self, input: &str) -> Result<Location, ResolveError> {
        let key = normalize_key(input);
        if key.is_empty() {
            return Err(ResolveError::EmptyInput);
        }

        let not_found = || ResolveError::NotFound {
            article: input.trim().to_string(),
        };

        let alias_target = self.aliases.get(&key);
        let canonical_key = match alias_target {
            Some(canonical) => normalize_key(canonical),
            None => key,
        };

        let Some((article, shelf)) = self.articles.get(&canonical_key) else {
            if let Some(target) = alias_target {
                tracing::warn!(
                    "Alias '{}' points at '{}', which has no shelf mapping",
                    input.trim(),
                    target
                );
            }
            return Err(not_found());
        };

        match self.shelves.get(shelf) {
            Some(&x_mm) => Ok(Location {
                article: article.clone(),
                shelf: *shelf,
                x_mm,
            }),
            None => Err(ResolveError::ConfigMissingPosition {
                article: article.clone(),
                shelf: *shelf,
            }),
        }
    }

    /// Canonical article names, sorted case-insensitively
    pub fn article_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.articles.values().map(|(n, _)| n.as_str()).collect();
        names.sort_by_key(|n| n.to_lowercase());
        names
    }

    /// Number of canonical articles
    pub fn len(&self) -> usize {
        self.articles.len()
    }

    /// Check if the catalog holds no articles
    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

/// Builder for [`Catalog`]
#[derive(Debug, Clone, Default)]
pub struct CatalogBuilder {
    catalog: Catalog,
}

impl CatalogBuilder {
    /// Define the X position of a shelf
    pub fn shelf(mut self, id: ShelfId, x_mm: f64) -> Self {
        self.catalog.shelves.insert(id, x_mm);
        self
    }

    /// Place an article on a shelf
    pub fn article(mut self, name: impl Into<String>, shelf: ShelfId) -> Self {
        let name = name.into();
        let key = normalize_key(&name);
        if let Some((previous, _)) = self.catalog.articles.get(&key) {
            tracing::warn!("Article '{}' replaces '{}'", name, previous);
        }
        self.catalog.articles.insert(key, (name, shelf));
        self
    }

    /// Add an alias for a canonical article name
    pub fn alias(mut self, alias: &str, article: impl Into<String>) -> Self {
        self.catalog
            .aliases
            .insert(normalize_key(alias), article.into());
        self
    }

    /// Finish building
    pub fn build(self) -> Catalog {
        self.catalog
    }
}

/// Shelf positions of the standard catalog: seven shelves along a 2 m axis.
pub const STANDARD_SHELVES: &[(ShelfId, f64)] = &[
    (1, 10.0),
    (2, 60.0),
    (3, 120.0),
    (4, 180.0),
    (5, 240.0),
    (6, 500.0),
    (7, 2000.0),
];

/// Articles of the standard catalog and their shelves.
pub const STANDARD_ARTICLES: &[(&str, ShelfId)] = &[
    ("M6x30", 3),
    ("M8x20", 2),
    ("M4x10", 4),
    ("M4x20", 6),
    ("M4x50", 7),
    ("Schraube M4x20", 1),
    ("M10 Mutter", 5),
];

/// Alternate spellings in the standard catalog, mapped to canonical names.
pub const STANDARD_ALIASES: &[(&str, &str)] = &[
    ("M4 20", "Schraube M4x20"),
    ("SCHRAUBE M4X20", "Schraube M4x20"),
    ("M10MUTTER", "M10 Mutter"),
];

/// Catalog shipped with the picker.
pub fn standard_catalog() -> Catalog {
    let mut builder = Catalog::builder();
    for &(id, x_mm) in STANDARD_SHELVES {
        builder = builder.shelf(id, x_mm);
    }
    for &(name, shelf) in STANDARD_ARTICLES {
        builder = builder.article(name, shelf);
    }
    for &(alias, article) in STANDARD_ALIASES {
        builder = builder.alias(alias, article);
    }
    builder.build()
}
