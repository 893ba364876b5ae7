//! Endpoints replacing the key-value assets of users, products and projects.

use hyper::body::Bytes;
use hyper::{Request, Response, StatusCode};
use serde::Deserialize;
use uuid::Uuid;

use super::request_utils::{parse_json_object, typed_element, JsonObject};
use super::response::ok_response;
use crate::router::{AppState, RouterError};
use userdb_core::models::{Asset, ProductData, ProjectData};

/// Reads the `user-id` and `user-data` elements of a user asset update.
fn user_asset_request(body: &JsonObject) -> Result<(Uuid, Asset), RouterError> {
    let bad = |msg: &str| RouterError::BadRequest(msg.to_string());

    let user_id = body.get("user-id").ok_or_else(|| bad("Missing 'user-id'"))?;
    let user_id = user_id
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| bad("Invalid 'user-id'"))?;

    let asset = body
        .get("user-data")
        .ok_or_else(|| bad("Missing 'user-data'"))?;
    let asset = Asset::deserialize(asset).map_err(|_| bad("Invalid 'user-data'"))?;
    Ok((user_id, asset))
}

/// `POST /update-user-settings` with `{"user-id": "<uuid>", "user-data": <asset>}`
///
/// The asset id must be the user's settings id; its datamap replaces the
/// stored one.
pub fn update_user_settings(
    req: &Request<Bytes>,
    state: &AppState,
) -> Result<Response<Bytes>, RouterError> {
    let (user_id, settings) = user_asset_request(&parse_json_object(req)?)?;
    state.db.update_user_settings(&user_id, &settings)?;
    ok_response(StatusCode::OK)
}

/// `POST /update-user-assets` with `{"user-id": "<uuid>", "user-data": <asset>}`
pub fn update_user_assets(
    req: &Request<Bytes>,
    state: &AppState,
) -> Result<Response<Bytes>, RouterError> {
    let (user_id, assets) = user_asset_request(&parse_json_object(req)?)?;
    state.db.update_user_assets(&user_id, &assets)?;
    ok_response(StatusCode::OK)
}

/// `POST /update-product-details` with `{"product": <product data>}`
pub fn update_product_details(
    req: &Request<Bytes>,
    state: &AppState,
) -> Result<Response<Bytes>, RouterError> {
    let product: ProductData = typed_element(&parse_json_object(req)?, "product")?;
    state.db.update_product_details(&product)?;
    ok_response(StatusCode::OK)
}

/// `POST /update-product-assets` with `{"product": <product data>}`
pub fn update_product_assets(
    req: &Request<Bytes>,
    state: &AppState,
) -> Result<Response<Bytes>, RouterError> {
    let product: ProductData = typed_element(&parse_json_object(req)?, "product")?;
    state.db.update_product_assets(&product)?;
    ok_response(StatusCode::OK)
}

/// `POST /update-project-details` with `{"project": <project data>}`
pub fn update_project_details(
    req: &Request<Bytes>,
    state: &AppState,
) -> Result<Response<Bytes>, RouterError> {
    let project: ProjectData = typed_element(&parse_json_object(req)?, "project")?;
    state.db.update_project_details(&project)?;
    ok_response(StatusCode::OK)
}

/// `POST /update-project-assets` with `{"project": <project data>}`
pub fn update_project_assets(
    req: &Request<Bytes>,
    state: &AppState,
) -> Result<Response<Bytes>, RouterError> {
    let project: ProjectData = typed_element(&parse_json_object(req)?, "project")?;
    state.db.update_project_assets(&project)?;
    ok_response(StatusCode::OK)
}
