//! Resolver behaviour over the standard and custom catalogs

use shelfpick_core::{standard_catalog, Catalog, ResolveError, STANDARD_ARTICLES};

#[test]
fn test_every_standard_article_resolves() {
    let catalog = standard_catalog();
    for &(name, shelf) in STANDARD_ARTICLES {
        let location = catalog.resolve(name).unwrap();
        assert_eq!(location.article, name);
        assert_eq!(location.shelf, shelf);
    }
}

#[test]
fn test_documented_coordinates() {
    let catalog = standard_catalog();
    let expect = [
        ("M6x30", 120.0),
        ("m8x20", 60.0),
        ("M4X10", 180.0),
        ("M4x20", 500.0),
        ("M4x50", 2000.0),
        ("schraube m4x20", 10.0),
        ("M10 MUTTER", 240.0),
    ];
    for (input, x_mm) in expect {
        assert_eq!(catalog.resolve(input).unwrap().x_mm, x_mm, "{input}");
    }
}

#[test]
fn test_aliases_resolve_to_canonical_names() {
    let catalog = standard_catalog();
    let location = catalog.resolve("m4 20").unwrap();
    assert_eq!(location.article, "Schraube M4x20");
    assert_eq!(location.x_mm, 10.0);

    assert_eq!(catalog.resolve("m10mutter").unwrap().article, "M10 Mutter");
}

#[test]
fn test_alias_to_missing_article_is_not_found() {
    let catalog = Catalog::builder()
        .shelf(1, 10.0)
        .alias("ghost", "Nothing Here")
        .build();
    assert_eq!(
        catalog.resolve("ghost"),
        Err(ResolveError::NotFound {
            article: "ghost".to_string()
        })
    );
}

#[test]
fn test_missing_position() {
    let catalog = Catalog::builder().shelf(1, 10.0).article("Bolt", 2).build();
    assert_eq!(
        catalog.resolve("bolt"),
        Err(ResolveError::ConfigMissingPosition {
            article: "Bolt".to_string(),
            shelf: 2
        })
    );
}

#[test]
fn test_blank_input() {
    assert_eq!(standard_catalog().resolve(" \t "), Err(ResolveError::EmptyInput));
}
