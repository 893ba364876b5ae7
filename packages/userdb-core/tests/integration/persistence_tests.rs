//! Snapshot save, load and corruption detection.

use std::fs;

use ntest::timeout;
use tempfile::tempdir;

use userdb_core::config::DbConfig;
use userdb_core::database::Database;
use userdb_core::error::DbError;
use userdb_core::models::ProjectViewer;
use userdb_core::persistence::io_utils::write_atomically;
use userdb_core::persistence::{Manifest, PersistenceManager, MANIFEST_VERSION};

use super::helpers::{add_product, add_project, add_user};

fn populated_db() -> Database {
    let db = Database::new(DbConfig::default());
    let owner = add_user(&db, "owner");
    let partner = add_user(&db, "partner");
    let product = add_product(&db, "product", &owner.id);
    db.add_product_users(&product.id, &[(partner.id, 2)]).unwrap();
    let project = add_project(&db, "project", &owner.id, &product.id);
    db.add_project_viewer(&ProjectViewer {
        viewer_id: uuid::Uuid::new_v4(),
        user_id: partner.id,
        project_id: project.id,
        is_owner: false,
    })
    .unwrap();
    db
}

/// ps_1: a saved snapshot loads back with every table intact.
#[timeout(2000)]
#[test]
fn test_save_and_load_round_trip() {
    let dir = tempdir().unwrap();
    let config = DbConfig {
        data_dir: Some(dir.path().to_path_buf()),
        ..Default::default()
    };
    let persistence = PersistenceManager::new(dir.path(), &config);

    let db = populated_db();
    persistence.save(&db.snapshot()).unwrap();

    assert!(dir.path().join("manifest.json").exists());
    assert!(persistence.generation_dir(1).join("users.json").exists());

    let loaded = Database::with_tables(config, persistence.load().unwrap());
    let before = db.snapshot();
    let after = loaded.snapshot();

    let users: Vec<_> = before.users.iter().map(|u| u.id).collect();
    assert_eq!(users, after.users.iter().map(|u| u.id).collect::<Vec<_>>());
    assert_eq!(before.assets.len(), after.assets.len());
    assert_eq!(before.product_users, after.product_users);
    assert_eq!(before.project_users, after.project_users);
    assert_eq!(before.project_viewers, after.project_viewers);
    assert_eq!(before.privileges, after.privileges);

    for user in before.users.iter() {
        assert_eq!(loaded.user(&user.id).unwrap(), db.user(&user.id).unwrap());
    }
    let product = before.products.iter().next().unwrap();
    assert_eq!(
        loaded.product(&product.id).unwrap(),
        db.product(&product.id).unwrap()
    );
    assert_eq!(
        loaded.product_projects(&product.id).unwrap(),
        db.product_projects(&product.id).unwrap()
    );
}

/// ps_2: an empty directory loads as an empty database.
#[timeout(1000)]
#[test]
fn test_load_without_snapshot() {
    let dir = tempdir().unwrap();
    let persistence = PersistenceManager::new(dir.path(), &DbConfig::default());

    let tables = persistence.load().unwrap();
    assert!(tables.users.is_empty());
    assert!(tables.privileges.is_owner(1));
}

/// ps_3: a tampered data file is rejected.
#[timeout(1000)]
#[test]
fn test_corrupted_table_rejected() {
    let dir = tempdir().unwrap();
    let persistence = PersistenceManager::new(dir.path(), &DbConfig::default());
    persistence.save(&populated_db().snapshot()).unwrap();

    let path = persistence.generation_dir(1).join("products.json");
    let mut data = fs::read(&path).unwrap();
    data.extend_from_slice(b"\n");
    fs::write(&path, data).unwrap();

    match persistence.load() {
        Err(DbError::DataCorruption(msg)) => assert!(msg.contains("products")),
        other => panic!("expected corruption error, got {:?}", other.map(|_| ())),
    }
}

/// ps_4: manifests from another format version are refused.
#[timeout(1000)]
#[test]
fn test_unsupported_manifest_version() {
    let dir = tempdir().unwrap();
    let persistence = PersistenceManager::new(dir.path(), &DbConfig::default());
    persistence.save(&populated_db().snapshot()).unwrap();

    let path = dir.path().join("manifest.json");
    let mut manifest: Manifest = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    assert_eq!(manifest.version, MANIFEST_VERSION);
    assert_eq!(manifest.tables["users"].rows, 2);
    manifest.version = MANIFEST_VERSION + 1;
    fs::write(&path, serde_json::to_vec(&manifest).unwrap()).unwrap();

    assert!(matches!(
        persistence.load(),
        Err(DbError::SerializationError(_))
    ));
}

/// ps_5: flushes happen only when the database changed.
#[timeout(1000)]
#[test]
fn test_flush_if_changed() {
    let dir = tempdir().unwrap();
    let persistence = PersistenceManager::new(dir.path(), &DbConfig::default());
    let db = Database::new(DbConfig::default());

    assert!(!persistence.flush_if_changed(&db).unwrap());
    assert!(!dir.path().join("manifest.json").exists());

    add_user(&db, "first");
    assert!(persistence.flush_if_changed(&db).unwrap());
    assert!(!persistence.flush_if_changed(&db).unwrap());

    add_user(&db, "second");
    assert!(persistence.flush_if_changed(&db).unwrap());
    assert_eq!(persistence.load().unwrap().users.len(), 2);
}

fn read_manifest(dir: &std::path::Path) -> anyhow::Result<Manifest> {
    Ok(serde_json::from_slice(&fs::read(dir.join("manifest.json"))?)?)
}

/// ps_6: a save cut off before its manifest is written leaves the previous
/// snapshot loadable, and the next save commits over the partial one.
#[test]
fn test_interrupted_save_keeps_previous_snapshot() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let persistence = PersistenceManager::new(dir.path(), &DbConfig::default());
    let db = populated_db();
    persistence.save(&db.snapshot())?;
    assert_eq!(read_manifest(dir.path())?.generation, 1);

    // Next generation gets a data file, but the manifest is never replaced
    add_user(&db, "late");
    let next = persistence.generation_dir(2);
    fs::create_dir_all(&next)?;
    write_atomically(
        &next.join("users.json"),
        &serde_json::to_vec_pretty(&db.snapshot().users)?,
    )?;

    let tables = persistence.load()?;
    assert_eq!(tables.users.len(), 2);
    assert!(tables.users.iter().all(|u| u.name != "late"));

    persistence.save(&db.snapshot())?;
    assert_eq!(read_manifest(dir.path())?.generation, 2);
    assert_eq!(persistence.load()?.users.len(), 3);
    assert!(!persistence.generation_dir(1).exists());
    Ok(())
}

/// ps_7: each save commits a new generation and drops the old one.
#[test]
fn test_saves_rotate_generations() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let persistence = PersistenceManager::new(dir.path(), &DbConfig::default());
    let db = Database::new(DbConfig::default());

    for generation in 1..=3 {
        add_user(&db, &format!("user{}", generation));
        assert!(persistence.flush_if_changed(&db)?);
        assert_eq!(read_manifest(dir.path())?.generation, generation);
        assert!(persistence.generation_dir(generation).is_dir());
        assert!(!persistence.generation_dir(generation - 1).exists());
    }
    assert_eq!(persistence.load()?.users.len(), 3);
    Ok(())
}
