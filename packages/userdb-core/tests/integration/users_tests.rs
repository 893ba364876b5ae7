//! User lifecycle, authentication and product membership.

use std::collections::HashMap;

use ntest::timeout;
use serde_json::json;
use tempfile::tempdir;
use uuid::Uuid;

use userdb_core::config::DbConfig;
use userdb_core::database::Database;
use userdb_core::error::DbError;
use userdb_core::models::{Asset, BASE_ASSET_PATH};

use super::helpers::{add_product, add_project, add_user, memory_db};

/// us_1: a created user reads back identically by id, email and batch.
#[timeout(1000)]
#[test]
fn test_create_and_read_user() {
    let db = memory_db();
    let created = db
        .create_user("testUser", "testEmail", b"testPassword")
        .unwrap();

    assert!(!created.id.is_nil());
    assert!(!created.settings.id.is_nil());
    assert!(!created.assets.id.is_nil());
    assert!(created.settings.datamap.is_empty());

    assert_eq!(db.user(&created.id).unwrap(), created);
    assert_eq!(db.user_by_email("testEmail").unwrap(), created);
    assert_eq!(db.users(&[created.id]).unwrap(), vec![created]);
}

/// us_2: email is checked before name.
#[timeout(1000)]
#[test]
fn test_duplicate_user() {
    let db = memory_db();
    db.create_user("testUser", "testEmail", b"pw").unwrap();

    assert_eq!(
        db.create_user("testUser", "testEmail", b"pw").unwrap_err(),
        DbError::DuplicateEmail
    );
    assert_eq!(
        db.create_user("testUser", "otherEmail", b"pw").unwrap_err(),
        DbError::DuplicateName
    );
    assert_eq!(db.snapshot().users.len(), 1);
}

/// us_3: batch lookups skip unknown ids and keep request order.
#[timeout(1000)]
#[test]
fn test_users_batch() {
    let db = memory_db();
    let first = add_user(&db, "first");
    let second = add_user(&db, "second");

    let found = db
        .users(&[second.id, Uuid::new_v4(), first.id])
        .unwrap();
    assert_eq!(found, vec![second, first]);

    assert_eq!(
        db.users(&[Uuid::new_v4()]).unwrap_err(),
        DbError::UserNotFound
    );
    assert_eq!(
        db.user_by_email("nobody").unwrap_err(),
        DbError::UserNotFound
    );
}

/// us_4: email is checked before the password.
#[timeout(1000)]
#[test]
fn test_authenticate() {
    let db = memory_db();
    let user = add_user(&db, "auth");

    db.authenticate(&user.id, &user.email, b"testPassword").unwrap();
    assert_eq!(
        db.authenticate(&user.id, "wrong", b"wrong").unwrap_err(),
        DbError::InvalidEmailOrPassword
    );
    assert_eq!(
        db.authenticate(&user.id, &user.email, b"wrong").unwrap_err(),
        DbError::InvalidPassword
    );
    assert_eq!(
        db.authenticate(&Uuid::new_v4(), &user.email, b"testPassword")
            .unwrap_err(),
        DbError::UserNotFound
    );
}

/// us_5: settings and assets updates replace the whole map.
#[timeout(1000)]
#[test]
fn test_update_user_settings_and_assets() {
    let db = memory_db();
    let user = add_user(&db, "settings");

    let mut settings = user.settings.clone();
    settings.datamap.insert("two_steps_verif".to_string(), json!(true));
    db.update_user_settings(&user.id, &settings).unwrap();

    let mut assets = user.assets.clone();
    assets.set_url("homepage", "https://example.com");
    db.update_user_assets(&user.id, &assets).unwrap();

    let stored = db.user(&user.id).unwrap();
    assert_eq!(stored.settings, settings);
    assert_eq!(stored.assets, assets);

    // Replacing with an empty map clears everything
    settings.datamap.clear();
    db.update_user_settings(&user.id, &settings).unwrap();
    assert!(db.user(&user.id).unwrap().settings.datamap.is_empty());
}

/// us_6: an asset with a foreign id is reported as missing.
#[timeout(1000)]
#[test]
fn test_update_user_with_wrong_asset() {
    let db = memory_db();
    let user = add_user(&db, "wrongAsset");

    let foreign = Asset::new(Default::default());
    assert_eq!(
        db.update_user_settings(&user.id, &foreign).unwrap_err(),
        DbError::AssetMissing("user settings")
    );
    assert_eq!(
        db.update_user_assets(&user.id, &user.settings).unwrap_err(),
        DbError::AssetMissing("user assets")
    );
    assert_eq!(
        db.update_user_assets(&Uuid::new_v4(), &user.assets)
            .unwrap_err(),
        DbError::UserNotFound
    );
}

/// us_7: nominated products change owner, the rest are deleted.
#[timeout(1000)]
#[test]
fn test_delete_user_with_nominees() {
    let db = memory_db();
    let owner = add_user(&db, "owner");
    let nominee = add_user(&db, "nominee");
    let kept = add_product(&db, "kept", &owner.id);
    let dropped = add_product(&db, "dropped", &owner.id);
    let project = add_project(&db, "droppedProject", &owner.id, &dropped.id);

    let nominees = HashMap::from([(kept.id, nominee.id)]);
    db.delete_user(&owner.id, &nominees).unwrap();

    let tables = db.snapshot();
    assert!(!tables.users.contains(&owner.id));
    assert!(!tables.assets.contains(&owner.settings.id));
    assert!(!tables.assets.contains(&owner.assets.id));

    assert!(tables.products.contains(&kept.id));
    assert!(tables
        .product_users
        .iter()
        .any(|pu| pu.product_id == kept.id && pu.user_id == nominee.id && pu.privilege == 1));
    assert!(tables.product_users.iter().all(|pu| pu.user_id != owner.id));

    assert!(!tables.products.contains(&dropped.id));
    assert!(!tables.projects.contains(&project.id));
    assert!(!tables.assets.contains(&project.details.id));
}

/// us_8: an unknown nominee aborts the whole deletion.
#[timeout(1000)]
#[test]
fn test_delete_user_unknown_nominee() {
    let db = memory_db();
    let owner = add_user(&db, "owner");
    let first = add_product(&db, "first", &owner.id);
    let second = add_product(&db, "second", &owner.id);
    let version = db.version();

    let nominees = HashMap::from([(second.id, Uuid::new_v4())]);
    assert_eq!(
        db.delete_user(&owner.id, &nominees).unwrap_err(),
        DbError::UserNotFound
    );

    // Nothing was removed, including the product processed first
    let tables = db.snapshot();
    assert!(tables.users.contains(&owner.id));
    assert!(tables.products.contains(&first.id));
    assert!(tables.products.contains(&second.id));
    assert_eq!(db.version(), version);
}

/// us_9: product membership rules.
#[timeout(1000)]
#[test]
fn test_add_and_delete_product_users() {
    let db = memory_db();
    let owner = add_user(&db, "owner");
    let partner = add_user(&db, "partner");
    let product = add_product(&db, "shared", &owner.id);

    assert_eq!(
        db.add_product_users(&product.id, &[]).unwrap_err(),
        DbError::EmptyUsersList
    );
    assert_eq!(
        db.add_product_users(&Uuid::new_v4(), &[(partner.id, 2)])
            .unwrap_err(),
        DbError::ProductNotFound
    );
    assert_eq!(
        db.add_product_users(&product.id, &[(partner.id, 7)])
            .unwrap_err(),
        DbError::UnknownPrivilege {
            privilege: 7,
            user: partner.id
        }
    );
    assert_eq!(
        db.add_product_users(&product.id, &[(partner.id, 1)])
            .unwrap_err(),
        DbError::InvalidOwnerCount
    );
    assert_eq!(
        db.add_product_users(&product.id, &[(Uuid::new_v4(), 2)])
            .unwrap_err(),
        DbError::UserNotFound
    );

    db.add_product_users(&product.id, &[(partner.id, 2)]).unwrap();
    // Existing memberships are updated in place
    db.add_product_users(&product.id, &[(partner.id, 3)]).unwrap();
    let members: Vec<_> = db
        .snapshot()
        .product_users
        .iter()
        .filter(|pu| pu.product_id == product.id)
        .map(|pu| (pu.user_id, pu.privilege))
        .collect();
    assert_eq!(members, vec![(owner.id, 1), (partner.id, 3)]);

    db.delete_product_user(&product.id, &partner.id).unwrap();
    assert_eq!(
        db.delete_product_user(&product.id, &partner.id).unwrap_err(),
        DbError::ProductUserNotAssociated
    );
}

/// us_10: asset directories are created only with an asset root.
#[timeout(1000)]
#[test]
fn test_asset_root_creates_directories() {
    let root = tempdir().unwrap();
    let db = Database::new(DbConfig {
        asset_root: Some(root.path().to_path_buf()),
        ..Default::default()
    });

    let user = add_user(&db, "withAssets");
    let base = user.assets.datamap[BASE_ASSET_PATH].as_str().unwrap();
    assert!(std::path::Path::new(base).is_dir());

    // A rejected user leaves no directory behind
    let before = std::fs::read_dir(root.path()).unwrap().count();
    db.create_user("withAssets", "other@example.com", b"pw")
        .unwrap_err();
    assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), before);
}
