//! Offline seed catalog wired through the facade builder.

mod common;

use stacktrack::models::NewCardItem;
use stacktrack::{SeedCatalog, StackTrack, StackTrackError};
use std::io::Write;

const SEED: &str = r#"[
    {"id": "sv1-1", "name": "Sprigatito", "setName": "Scarlet & Violet", "imageSmall": "https://img/sv1-1.png", "rarity": "Common", "number": "1"},
    {"id": "sv2-1", "name": "Pineco", "setName": "Paldea Evolved", "rarity": "Common", "number": "1"},
    {"id": "base1-58", "name": "Pikachu", "setName": "Base", "rarity": "Common", "number": "58"}
]"#;

fn seed_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SEED.as_bytes()).unwrap();
    file
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

#[test]
fn builder_loads_seed_file() {
    let file = seed_file();
    let st = StackTrack::builder()
        .catalog(common::offline_catalog())
        .seed_catalog(file.path())
        .build()
        .unwrap();

    let seed = st.seed_catalog().unwrap();
    assert_eq!(seed.len(), 3);

    let ids: Vec<String> = seed.search("pi", None).into_iter().map(|c| c.id).collect();
    assert_eq!(ids, vec!["sv2-1", "base1-58"]);
}

#[test]
fn no_seed_configured_means_none() {
    let st = common::memory_stack();
    assert!(st.seed_catalog().is_none());
}

#[test]
fn unreadable_seed_file_fails_the_build() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"not json").unwrap();

    let err = StackTrack::builder()
        .catalog(common::offline_catalog())
        .seed_catalog(file.path())
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, StackTrackError::Json(_)));
}

// ---------------------------------------------------------------------------
// Seed results into collections
// ---------------------------------------------------------------------------

#[test]
fn seed_result_can_be_added_to_a_collection() {
    let st = common::memory_stack().with_seed_catalog(SeedCatalog::from_json_str(SEED).unwrap());
    let c = st.collections().create("u1", "Offline").unwrap();

    let hit = st.seed_catalog().unwrap().search("sprigatito", 1).remove(0);
    let item = st.items().add("u1", &c.id, &NewCardItem::from(hit)).unwrap();

    assert_eq!(item.card_id, "sv1-1");
    assert_eq!(item.image_url.as_deref(), Some("https://img/sv1-1.png"));
    assert_eq!(item.price_usd, None);
}
