//! Product endpoints.

use hyper::body::Bytes;
use hyper::{Request, Response, StatusCode};
use serde_json::Value;

use super::request_utils::{
    element, invalid, parse_json_object, str_element, uuid_element, QueryParams,
};
use super::response::{data_response, ok_response};
use crate::router::{AppState, RouterError};

/// Creates a product owned by `user`.
///
/// # Endpoint
/// `POST /add-product`
///
/// # Request Body
/// ```json
/// {"product": {"name": "name", "public": true}, "user": "<owner uuid>"}
/// ```
///
/// # Response
/// - **201 Created**: the new product with its details and assets
/// - **202 Accepted**: name taken or owner unknown
pub fn add_product(req: &Request<Bytes>, state: &AppState) -> Result<Response<Bytes>, RouterError> {
    let body = parse_json_object(req)?;
    let product = element(&body, "product")?
        .as_object()
        .ok_or_else(|| invalid("product"))?;
    let name = str_element(product, "name")?;
    let public = product
        .get("public")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let owner = uuid_element(&body, "user")?;

    let product = state.db.create_product(name, public, &owner)?;
    tracing::info!("Added product {} ({})", product.name, product.id);
    data_response(StatusCode::CREATED, product)
}

/// `GET /get-product-by-id?id=<uuid>`
pub fn get_product_by_id(
    req: &Request<Bytes>,
    state: &AppState,
) -> Result<Response<Bytes>, RouterError> {
    let id = QueryParams::from_request(req).require_uuid("id")?;
    data_response(StatusCode::OK, state.db.product(&id)?)
}

/// `GET /get-products?ids=<uuid>&ids=<uuid>...`
pub fn get_products(
    req: &Request<Bytes>,
    state: &AppState,
) -> Result<Response<Bytes>, RouterError> {
    let ids = QueryParams::from_request(req).id_list()?;
    data_response(StatusCode::OK, state.db.products(&ids)?)
}

/// `POST /delete-product` with `{"product_id": "<uuid>"}`
///
/// Projects of the product are deleted with it.
pub fn delete_product(
    req: &Request<Bytes>,
    state: &AppState,
) -> Result<Response<Bytes>, RouterError> {
    let body = parse_json_object(req)?;
    let id = uuid_element(&body, "product_id")?;

    state.db.delete_product(&id)?;
    tracing::info!("Deleted product {}", id);
    ok_response(StatusCode::OK)
}
