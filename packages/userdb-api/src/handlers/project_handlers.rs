//! Project endpoints.

use hyper::body::Bytes;
use hyper::{Request, Response, StatusCode};

use super::request_utils::{
    element, invalid, parse_json_object, str_element, uuid_element, QueryParams,
};
use super::response::{data_response, ok_response};
use crate::router::{AppState, RouterError};
use userdb_core::models::Visibility;

/// Creates a project under a product.
///
/// # Endpoint
/// `POST /add-project`
///
/// # Request Body
/// ```json
/// {
///   "project": {"name": "name", "visibility": "Public"},
///   "owner_id": "<user uuid>",
///   "product_id": "<product uuid>"
/// }
/// ```
///
/// # Response
/// - **201 Created**: the new project with its details and assets
/// - **202 Accepted**: unknown product or owner, or name taken in the product
pub fn add_project(req: &Request<Bytes>, state: &AppState) -> Result<Response<Bytes>, RouterError> {
    let body = parse_json_object(req)?;
    let project = element(&body, "project")?
        .as_object()
        .ok_or_else(|| invalid("project"))?;
    let name = str_element(project, "name")?;
    let visibility: Visibility = str_element(project, "visibility")?
        .parse()
        .map_err(|_| invalid("visibility"))?;
    let owner_id = uuid_element(&body, "owner_id")?;
    let product_id = uuid_element(&body, "product_id")?;

    let project = state
        .db
        .create_project(name, visibility, &owner_id, &product_id)?;
    tracing::info!("Added project {} to product {}", project.id, product_id);
    data_response(StatusCode::CREATED, project)
}

/// `GET /get-project?id=<uuid>`
pub fn get_project(req: &Request<Bytes>, state: &AppState) -> Result<Response<Bytes>, RouterError> {
    let id = QueryParams::from_request(req).require_uuid("id")?;
    data_response(StatusCode::OK, state.db.project(&id)?)
}

/// `GET /get-projects?ids=<uuid>&ids=<uuid>...`
pub fn get_projects(
    req: &Request<Bytes>,
    state: &AppState,
) -> Result<Response<Bytes>, RouterError> {
    let ids = QueryParams::from_request(req).id_list()?;
    data_response(StatusCode::OK, state.db.projects(&ids)?)
}

/// `GET /get-product-projects?product_id=<uuid>`
///
/// Projects are listed in creation order.
pub fn get_product_projects(
    req: &Request<Bytes>,
    state: &AppState,
) -> Result<Response<Bytes>, RouterError> {
    let product_id = QueryParams::from_request(req).require_uuid("product_id")?;
    data_response(StatusCode::OK, state.db.product_projects(&product_id)?)
}

/// `POST /delete-project` with `{"id": "<uuid>"}`
pub fn delete_project(
    req: &Request<Bytes>,
    state: &AppState,
) -> Result<Response<Bytes>, RouterError> {
    let body = parse_json_object(req)?;
    let id = uuid_element(&body, "id")?;

    state.db.delete_project(&id)?;
    tracing::info!("Deleted project {}", id);
    ok_response(StatusCode::OK)
}
