//! Project viewer endpoints.

use hyper::body::Bytes;
use hyper::{Request, Response, StatusCode};

use super::request_utils::{parse_json_object, uuid_element, QueryParams};
use super::response::{data_response, ok_response};
use crate::router::{AppState, RouterError};
use userdb_core::models::ProjectViewer;

/// Grants a user access to a project.
///
/// # Endpoint
/// `POST /add-project-viewer`
///
/// # Request Body
/// ```json
/// {"viewer_id": "<uuid>", "user_id": "<uuid>", "project_id": "<uuid>", "is_owner": true}
/// ```
pub fn add_project_viewer(
    req: &Request<Bytes>,
    state: &AppState,
) -> Result<Response<Bytes>, RouterError> {
    let viewer: ProjectViewer = serde_json::from_slice(req.body())
        .map_err(|e| RouterError::BadRequest(format!("Failed to decode request json: {}", e)))?;

    state.db.add_project_viewer(&viewer)?;
    ok_response(StatusCode::CREATED)
}

/// `GET /get-project-viewer-by-viewer?viewer_id=<uuid>`
pub fn get_by_viewer(
    req: &Request<Bytes>,
    state: &AppState,
) -> Result<Response<Bytes>, RouterError> {
    let viewer_id = QueryParams::from_request(req).require_uuid("viewer_id")?;
    data_response(StatusCode::OK, state.db.project_viewers_by_viewer(&viewer_id)?)
}

/// `GET /get-project-viewer-by-user?user_id=<uuid>`
pub fn get_by_user(req: &Request<Bytes>, state: &AppState) -> Result<Response<Bytes>, RouterError> {
    let user_id = QueryParams::from_request(req).require_uuid("user_id")?;
    data_response(StatusCode::OK, state.db.project_viewers_by_user(&user_id)?)
}

/// `POST /delete-project-viewer-by-viewer` with `{"viewer_id": "<uuid>"}`
pub fn delete_by_viewer(
    req: &Request<Bytes>,
    state: &AppState,
) -> Result<Response<Bytes>, RouterError> {
    let body = parse_json_object(req)?;
    let viewer_id = uuid_element(&body, "viewer_id")?;

    state.db.delete_project_viewer_by_viewer(&viewer_id)?;
    ok_response(StatusCode::OK)
}

/// `POST /delete-project-viewer-by-user` with `{"user_id": "<uuid>"}`
pub fn delete_by_user(
    req: &Request<Bytes>,
    state: &AppState,
) -> Result<Response<Bytes>, RouterError> {
    let body = parse_json_object(req)?;
    let user_id = uuid_element(&body, "user_id")?;

    state.db.delete_project_viewer_by_user(&user_id)?;
    ok_response(StatusCode::OK)
}
