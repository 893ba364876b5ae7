//! Product lifecycle.

use ntest::timeout;
use serde_json::json;
use uuid::Uuid;

use userdb_core::error::DbError;

use super::helpers::{add_product, add_project, add_user, memory_db};

/// pr_1: the owner becomes the single Owner member.
#[timeout(1000)]
#[test]
fn test_create_product() {
    let db = memory_db();
    let owner = add_user(&db, "owner");

    let product = db.create_product("testProduct", true, &owner.id).unwrap();
    assert!(product.public);
    assert!(product.details.datamap.is_empty());
    assert_eq!(db.product(&product.id).unwrap(), product);

    let tables = db.snapshot();
    let members: Vec<_> = tables
        .product_users
        .iter()
        .filter(|pu| pu.product_id == product.id)
        .collect();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].user_id, owner.id);
    assert!(tables.privileges.is_owner(members[0].privilege));
}

/// pr_2: the name is checked before the owner.
#[timeout(1000)]
#[test]
fn test_create_product_errors() {
    let db = memory_db();
    let owner = add_user(&db, "owner");
    add_product(&db, "taken", &owner.id);

    assert_eq!(
        db.create_product("taken", false, &Uuid::new_v4()).unwrap_err(),
        DbError::ProductExists("taken".to_string())
    );
    assert_eq!(
        db.create_product("fresh", false, &Uuid::new_v4()).unwrap_err(),
        DbError::UserNotFound
    );
    assert_eq!(
        DbError::ProductExists("taken".to_string()).to_string(),
        "Product with name taken already exists"
    );
}

/// pr_3: batch lookups skip unknown ids.
#[timeout(1000)]
#[test]
fn test_products_batch() {
    let db = memory_db();
    let owner = add_user(&db, "owner");
    let first = add_product(&db, "first", &owner.id);
    let second = add_product(&db, "second", &owner.id);

    assert_eq!(
        db.products(&[first.id, Uuid::new_v4(), second.id]).unwrap(),
        vec![first, second]
    );
    assert_eq!(
        db.products(&[Uuid::new_v4()]).unwrap_err(),
        DbError::ProductNotFound
    );
}

/// pr_4: details and assets updates are checked against the stored ids.
#[timeout(1000)]
#[test]
fn test_update_product_details_and_assets() {
    let db = memory_db();
    let owner = add_user(&db, "owner");
    let mut product = add_product(&db, "updated", &owner.id);

    product
        .details
        .datamap
        .insert("support_clients".to_string(), json!(true));
    product.assets.set_url("homepage", "https://example.com");
    db.update_product_details(&product).unwrap();
    db.update_product_assets(&product).unwrap();
    assert_eq!(db.product(&product.id).unwrap(), product);

    let mut swapped = product.clone();
    std::mem::swap(&mut swapped.details, &mut swapped.assets);
    assert_eq!(
        db.update_product_details(&swapped).unwrap_err(),
        DbError::AssetMissing("product details")
    );

    let mut unknown = product.clone();
    unknown.id = Uuid::new_v4();
    assert_eq!(
        db.update_product_assets(&unknown).unwrap_err(),
        DbError::ProductNotFound
    );
}

/// pr_5: deleting a product cascades to its projects.
#[timeout(1000)]
#[test]
fn test_delete_product_cascades() {
    let db = memory_db();
    let owner = add_user(&db, "owner");
    let product = add_product(&db, "doomed", &owner.id);
    let project = add_project(&db, "doomedProject", &owner.id, &product.id);

    db.delete_product(&product.id).unwrap();

    let tables = db.snapshot();
    assert!(!tables.products.contains(&product.id));
    assert!(!tables.projects.contains(&project.id));
    assert!(!tables.assets.contains(&product.details.id));
    assert!(!tables.assets.contains(&project.assets.id));
    assert!(tables.product_users.is_empty());
    assert!(tables.project_users.is_empty());
    // Only the owner's own settings and assets remain
    assert_eq!(tables.assets.len(), 2);

    assert_eq!(
        db.delete_product(&product.id).unwrap_err(),
        DbError::ProductNotFound
    );
}
