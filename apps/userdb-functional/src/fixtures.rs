//! Create-or-reuse builders for case data.
//!
//! Each builder creates its entity when the case carries the inline
//! creation block, and otherwise returns the identifier the case supplies
//! unchanged. Setup requests have no expected outcome: any error the
//! server returns fails the case.

use reqwest::StatusCode;
use serde_json::{json, Value};

use crate::connector::{setup_response, HttpConnector, HttpResponse};
use crate::error::HarnessError;

/// Reads the `id` of a created entity.
pub fn id_of(value: &Value) -> Result<String, HarnessError> {
    value
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| HarnessError::Decode(format!("Missing 'id' in {}", value)))
}

fn supplied_id(data: &Value, key: &'static str) -> Result<String, HarnessError> {
    data.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(HarnessError::MissingTestData(key))
}

/// Creates `data.user`, or returns `data.user_id`.
pub async fn add_user(conn: &HttpConnector, data: &Value) -> Result<String, HarnessError> {
    let Some(user) = data.get("user") else {
        return supplied_id(data, "user_id");
    };

    let response = conn.post("/add-user", user).await?;
    id_of(&setup_response(&response.text)?)
}

/// Creates `data.product` owned by `user_id`, or returns `data.product_id`.
pub async fn add_product(
    conn: &HttpConnector,
    data: &Value,
    user_id: &str,
) -> Result<String, HarnessError> {
    let Some(product) = data.get("product") else {
        return supplied_id(data, "product_id");
    };

    let body = json!({"product": product, "user": user_id});
    let response = conn.post("/add-product", &body).await?;
    id_of(&setup_response(&response.text)?)
}

/// Creates `data.project` under a product, or returns `data.id`.
pub async fn add_project(
    conn: &HttpConnector,
    data: &Value,
    user_id: &str,
    product_id: &str,
) -> Result<String, HarnessError> {
    let Some(project) = data.get("project") else {
        return supplied_id(data, "id");
    };

    let response = post_project(conn, project, user_id, product_id).await?;
    let created = setup_response(&response.text)?;
    if response.status != StatusCode::CREATED {
        return Err(HarnessError::Mismatch(format!(
            "Failed to add project. Status: {} Details: {}",
            response.status, created
        )));
    }
    id_of(&created)
}

/// Creates every entry of `data.project` that has a `name`; entries
/// without one contribute their `id` as is.
pub async fn add_projects(
    conn: &HttpConnector,
    data: &Value,
    user_id: &str,
    product_id: &str,
) -> Result<Vec<String>, HarnessError> {
    let entries = data
        .get("project")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut ids = Vec::with_capacity(entries.len());
    for entry in entries {
        if entry.get("name").is_some() {
            let response = post_project(conn, entry, user_id, product_id).await?;
            ids.push(id_of(&setup_response(&response.text)?)?);
        } else {
            ids.push(supplied_id(entry, "id")?);
        }
    }
    Ok(ids)
}

/// Sets up user, product and project, then registers `data.viewer_id`
/// on the project.
///
/// Returns the raw response of `/add-project-viewer`, or `None` when the
/// data carries no viewer id.
pub async fn add_project_viewer(
    conn: &HttpConnector,
    data: &Value,
) -> Result<Option<HttpResponse>, HarnessError> {
    let Some(viewer_id) = data.get("viewer_id") else {
        return Ok(None);
    };

    let user_id = add_user(conn, data).await?;
    let product_id = add_product(conn, data, &user_id).await?;
    let project_id = add_project(conn, data, &user_id, &product_id).await?;

    let body = json!({
        "project_id": project_id,
        "viewer_id": viewer_id,
        "user_id": user_id,
        "is_owner": data.get("is_owner").and_then(Value::as_bool).unwrap_or(false),
    });
    conn.post("/add-project-viewer", &body).await.map(Some)
}

async fn post_project(
    conn: &HttpConnector,
    project: &Value,
    user_id: &str,
    product_id: &str,
) -> Result<HttpResponse, HarnessError> {
    let body = json!({
        "project": project,
        "owner_id": user_id,
        "product_id": product_id,
    });
    conn.post("/add-project", &body).await
}
