//! Projects and project viewers.

use ntest::timeout;
use uuid::Uuid;

use userdb_core::error::DbError;
use userdb_core::models::{ProjectViewer, Visibility};

use super::helpers::{add_product, add_project, add_user, memory_db};

/// pj_1: details hold the name and visibility.
#[timeout(1000)]
#[test]
fn test_create_project() {
    let db = memory_db();
    let owner = add_user(&db, "owner");
    let product = add_product(&db, "product", &owner.id);

    let project = db
        .create_project("testProject", Visibility::Private, &owner.id, &product.id)
        .unwrap();
    assert_eq!(project.product_id, product.id);
    assert_eq!(project.name(), Some("testProject"));
    assert_eq!(project.visibility(), Some(Visibility::Private));
    assert!(project.assets.datamap.is_empty());
    assert_eq!(db.project(&project.id).unwrap(), project);

    let tables = db.snapshot();
    assert!(tables
        .project_users
        .iter()
        .any(|pu| pu.project_id == project.id && pu.user_id == owner.id && pu.privilege == 1));
}

/// pj_2: product first, then owner, then the name within the product.
#[timeout(1000)]
#[test]
fn test_create_project_errors() {
    let db = memory_db();
    let owner = add_user(&db, "owner");
    let product = add_product(&db, "product", &owner.id);
    let other = add_product(&db, "other", &owner.id);
    add_project(&db, "taken", &owner.id, &product.id);

    assert_eq!(
        db.create_project("x", Visibility::Public, &Uuid::new_v4(), &Uuid::new_v4())
            .unwrap_err(),
        DbError::ProductNotFound
    );
    assert_eq!(
        db.create_project("x", Visibility::Public, &Uuid::new_v4(), &product.id)
            .unwrap_err(),
        DbError::UserNotFound
    );
    assert_eq!(
        db.create_project("taken", Visibility::Public, &owner.id, &product.id)
            .unwrap_err(),
        DbError::ProjectExists("taken".to_string())
    );

    // Same name under another product is fine
    add_project(&db, "taken", &owner.id, &other.id);
}

/// pj_3: product projects come back in creation order.
#[timeout(1000)]
#[test]
fn test_product_projects_and_batch() {
    let db = memory_db();
    let owner = add_user(&db, "owner");
    let product = add_product(&db, "product", &owner.id);
    let empty = add_product(&db, "empty", &owner.id);

    let names = ["gamma", "alpha", "beta"];
    let created: Vec<_> = names
        .iter()
        .map(|name| add_project(&db, name, &owner.id, &product.id))
        .collect();

    let listed = db.product_projects(&product.id).unwrap();
    assert_eq!(listed, created);
    assert_eq!(
        db.product_projects(&empty.id).unwrap_err(),
        DbError::NoProjectsForProduct
    );

    let batch = db
        .projects(&[created[2].id, Uuid::new_v4(), created[0].id])
        .unwrap();
    assert_eq!(batch, vec![created[2].clone(), created[0].clone()]);
    assert_eq!(
        db.projects(&[Uuid::new_v4()]).unwrap_err(),
        DbError::ProjectNotFound
    );
}

/// pj_4: project updates replace maps; deletion removes viewers too.
#[timeout(1000)]
#[test]
fn test_update_and_delete_project() {
    let db = memory_db();
    let owner = add_user(&db, "owner");
    let product = add_product(&db, "product", &owner.id);
    let mut project = add_project(&db, "project", &owner.id, &product.id);

    project.assets.set_url("repository", "https://example.com/repo");
    db.update_project_assets(&project).unwrap();
    project.details.datamap.remove("visibility");
    db.update_project_details(&project).unwrap();
    assert_eq!(db.project(&project.id).unwrap(), project);

    db.add_project_viewer(&ProjectViewer {
        viewer_id: Uuid::new_v4(),
        user_id: owner.id,
        project_id: project.id,
        is_owner: true,
    })
    .unwrap();

    db.delete_project(&project.id).unwrap();
    assert_eq!(
        db.project(&project.id).unwrap_err(),
        DbError::ProjectNotFound
    );
    assert_eq!(
        db.project_viewers_by_user(&owner.id).unwrap_err(),
        DbError::UserNotConnectedToViewer
    );
    assert_eq!(
        db.delete_project(&project.id).unwrap_err(),
        DbError::ProjectNotFound
    );
}

/// pv_1: viewer rows, owner uniqueness and lookups.
#[timeout(1000)]
#[test]
fn test_project_viewers() {
    let db = memory_db();
    let owner = add_user(&db, "owner");
    let guest = add_user(&db, "guest");
    let product = add_product(&db, "product", &owner.id);
    let project = add_project(&db, "project", &owner.id, &product.id);
    let viewer_id = Uuid::new_v4();

    let owner_row = ProjectViewer {
        viewer_id,
        user_id: owner.id,
        project_id: project.id,
        is_owner: true,
    };
    let guest_row = ProjectViewer {
        user_id: guest.id,
        is_owner: false,
        ..owner_row.clone()
    };

    db.add_project_viewer(&owner_row).unwrap();
    db.add_project_viewer(&guest_row).unwrap();

    assert_eq!(
        db.add_project_viewer(&owner_row).unwrap_err(),
        DbError::ViewerAlreadyExists
    );
    assert_eq!(
        db.add_project_viewer(&ProjectViewer {
            user_id: guest.id,
            ..owner_row.clone()
        })
        .unwrap_err(),
        DbError::ViewerAlreadyExists
    );
    assert_eq!(
        db.add_project_viewer(&ProjectViewer {
            project_id: Uuid::new_v4(),
            ..guest_row.clone()
        })
        .unwrap_err(),
        DbError::ProjectNotFound
    );

    assert_eq!(
        db.project_viewers_by_viewer(&viewer_id).unwrap(),
        vec![owner_row.clone(), guest_row.clone()]
    );
    assert_eq!(
        db.project_viewers_by_user(&guest.id).unwrap(),
        vec![guest_row]
    );
    assert_eq!(
        db.project_viewers_by_viewer(&Uuid::new_v4()).unwrap_err(),
        DbError::ProjectViewerNotFound
    );

    db.delete_project_viewer_by_user(&guest.id).unwrap();
    assert_eq!(
        db.delete_project_viewer_by_user(&guest.id).unwrap_err(),
        DbError::NoProjectViewerDeleted
    );
    db.delete_project_viewer_by_viewer(&viewer_id).unwrap();
    assert_eq!(
        db.delete_project_viewer_by_viewer(&viewer_id).unwrap_err(),
        DbError::NoProjectViewerDeleted
    );
}
