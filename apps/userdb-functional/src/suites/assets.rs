//! Replacing details, assets and settings maps.
//!
//! Each case creates its entity, adds `details_entry` to one of its maps,
//! posts the whole entity back and reads it again to see the entry stored.

use reqwest::StatusCode;
use serde_json::{json, Value};

use super::{ensure_eq, ensure_status, Case, PASSWORD_B64};
use crate::connector::{get_response, setup_response, Expected, HttpConnector};
use crate::error::HarnessError;
use crate::fixtures::{add_product, add_user, id_of};
use crate::report::SuiteReport;

pub async fn run(conn: &HttpConnector) -> SuiteReport {
    let mut report = SuiteReport::new("assets");
    run_cases!(report, conn, update_product_details, product_case("Valid product detail", "UpdateDetails"));
    run_cases!(report, conn, update_product_assets, product_case("Valid product asset", "UpdateAssets"));
    run_cases!(report, conn, update_project_details, project_case("Valid project detail", "Details"));
    run_cases!(report, conn, update_project_assets, project_case("Valid project asset", "Assets"));
    run_cases!(report, conn, update_user_settings, user_case("Valid user settings", "UpdateSettings"));
    run_cases!(report, conn, update_user_assets, user_case("Valid user assets", "UpdateUserAssets"));
    report
}

fn user(suffix: &str) -> Value {
    json!({
        "username": format!("testUser{}", suffix),
        "email": format!("testEmail{}", suffix),
        "password": PASSWORD_B64,
    })
}

fn entry() -> Value {
    json!({"test_entry": "test_data"})
}

fn product_case(name: &'static str, suffix: &str) -> Vec<Case> {
    vec![Case::new(
        name,
        json!({
            "product": {"name": format!("testProduct{}", suffix)},
            "user": user(&format!("Owner{}", suffix)),
            "details_entry": entry(),
        }),
        Expected::ok(),
    )]
}

fn project_case(name: &'static str, suffix: &str) -> Vec<Case> {
    vec![Case::new(
        name,
        json!({
            "product": {"name": format!("testProjectUpdate{}", suffix)},
            "user": user(&format!("ProjectUpdate{}", suffix)),
            "project": {
                "name": format!("testProjectUpdateProject{}", suffix),
                "visibility": "Public",
            },
            "details_entry": entry(),
        }),
        Expected::ok(),
    )]
}

fn user_case(name: &'static str, suffix: &str) -> Vec<Case> {
    vec![Case::new(
        name,
        json!({"user": user(suffix), "details_entry": entry()}),
        Expected::ok(),
    )]
}

/// Adds every `details_entry` pair to `entity[map].datamap`.
fn add_entries(entity: &mut Value, map: &str, entries: &Value) -> Result<(), HarnessError> {
    let datamap = entity
        .get_mut(map)
        .and_then(|m| m.get_mut("datamap"))
        .and_then(Value::as_object_mut)
        .ok_or_else(|| HarnessError::Decode(format!("Missing '{}' datamap", map)))?;
    if let Some(entries) = entries.as_object() {
        datamap.extend(entries.clone());
    }
    Ok(())
}

/// Checks that `entity[map].datamap` holds every `details_entry` pair.
fn ensure_entries(entity: &Value, map: &str, entries: &Value) -> Result<(), HarnessError> {
    let datamap = &entity[map]["datamap"];
    let stored = entries
        .as_object()
        .into_iter()
        .flatten()
        .all(|(key, value)| &datamap[key] == value);
    if stored {
        Ok(())
    } else {
        Err(HarnessError::mismatch(datamap, entries))
    }
}

/// Posts `body` to `path` and checks the acknowledgement.
async fn post_update(
    conn: &HttpConnector,
    case: &Case,
    path: &str,
    body: &Value,
) -> Result<bool, HarnessError> {
    let response = conn.post(path, body).await?;
    let Some(result) = get_response(&response.text, &case.expected)? else {
        return Ok(false);
    };
    ensure_eq(&result, case.expected.expect_data(&result)?)?;
    Ok(true)
}

async fn update_product_map(
    conn: &HttpConnector,
    case: &Case,
    map: &str,
    path: &str,
) -> Result<(), HarnessError> {
    let user_id = add_user(conn, &case.data).await?;

    let body = json!({"product": case.data["product"], "user": user_id});
    let response = conn.post("/add-product", &body).await?;
    ensure_status(&response, StatusCode::CREATED)?;
    let mut product = setup_response(&response.text)?;

    let entries = &case.data["details_entry"];
    add_entries(&mut product, map, entries)?;
    if !post_update(conn, case, path, &json!({"product": product})).await? {
        return Ok(());
    }

    let response = conn
        .get("/get-product-by-id", &[("id", id_of(&product)?)])
        .await?;
    let found = setup_response(&response.text)?;
    ensure_entries(&found, map, entries)
}

async fn update_project_map(
    conn: &HttpConnector,
    case: &Case,
    map: &str,
    path: &str,
) -> Result<(), HarnessError> {
    let user_id = add_user(conn, &case.data).await?;
    let product_id = add_product(conn, &case.data, &user_id).await?;

    let body = json!({
        "project": case.data["project"],
        "product_id": product_id,
        "owner_id": user_id,
    });
    let response = conn.post("/add-project", &body).await?;
    ensure_status(&response, StatusCode::CREATED)?;
    let mut project = setup_response(&response.text)?;

    let entries = &case.data["details_entry"];
    add_entries(&mut project, map, entries)?;
    if !post_update(conn, case, path, &json!({"project": project})).await? {
        return Ok(());
    }

    let response = conn.get("/get-project", &[("id", id_of(&project)?)]).await?;
    let found = setup_response(&response.text)?;
    ensure_entries(&found, map, entries)
}

async fn update_user_map(
    conn: &HttpConnector,
    case: &Case,
    map: &str,
    path: &str,
) -> Result<(), HarnessError> {
    let response = conn.post("/add-user", &case.data["user"]).await?;
    ensure_status(&response, StatusCode::CREATED)?;
    let mut user = setup_response(&response.text)?;

    let entries = &case.data["details_entry"];
    add_entries(&mut user, map, entries)?;
    let body = json!({"user-id": user["id"], "user-data": user[map]});
    if !post_update(conn, case, path, &body).await? {
        return Ok(());
    }

    let response = conn.get("/get-user-by-id", &[("id", id_of(&user)?)]).await?;
    let found = setup_response(&response.text)?;
    ensure_entries(&found, map, entries)
}

async fn update_product_details(conn: &HttpConnector, case: &Case) -> Result<(), HarnessError> {
    update_product_map(conn, case, "details", "/update-product-details").await
}

async fn update_product_assets(conn: &HttpConnector, case: &Case) -> Result<(), HarnessError> {
    update_product_map(conn, case, "assets", "/update-product-assets").await
}

async fn update_project_details(conn: &HttpConnector, case: &Case) -> Result<(), HarnessError> {
    update_project_map(conn, case, "details", "/update-project-details").await
}

async fn update_project_assets(conn: &HttpConnector, case: &Case) -> Result<(), HarnessError> {
    update_project_map(conn, case, "assets", "/update-project-assets").await
}

async fn update_user_settings(conn: &HttpConnector, case: &Case) -> Result<(), HarnessError> {
    update_user_map(conn, case, "settings", "/update-user-settings").await
}

async fn update_user_assets(conn: &HttpConnector, case: &Case) -> Result<(), HarnessError> {
    update_user_map(conn, case, "assets", "/update-user-assets").await
}
