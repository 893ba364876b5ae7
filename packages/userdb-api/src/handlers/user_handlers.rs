//! User and product membership endpoints.

use std::collections::HashMap;

use hyper::body::Bytes;
use hyper::{Request, Response, StatusCode};
use serde_json::Value;
use uuid::Uuid;

use super::request_utils::{
    element, invalid, parse_json_object, str_element, uuid_element, QueryParams,
};
use super::response::{data_response, ok_response};
use crate::router::{AppState, RouterError};

/// Registers a new user.
///
/// # Endpoint
/// `POST /add-user`
///
/// # Request Body
/// ```json
/// {"username": "name", "email": "address", "password": "secret"}
/// ```
///
/// # Response
/// - **201 Created**: the new user with its settings and assets
/// - **202 Accepted**: email or name already taken
pub fn add_user(req: &Request<Bytes>, state: &AppState) -> Result<Response<Bytes>, RouterError> {
    let body = parse_json_object(req)?;
    let username = str_element(&body, "username")?;
    let email = str_element(&body, "email")?;
    let password = str_element(&body, "password")?;

    let user = state
        .db
        .create_user(username, email, password.as_bytes())?;
    tracing::info!("Added user {}", user.id);
    data_response(StatusCode::CREATED, user)
}

/// `GET /get-user-by-id?id=<uuid>`
pub fn get_user_by_id(
    req: &Request<Bytes>,
    state: &AppState,
) -> Result<Response<Bytes>, RouterError> {
    let id = QueryParams::from_request(req).require_uuid("id")?;
    data_response(StatusCode::OK, state.db.user(&id)?)
}

/// `GET /get-user-by-email?email=<address>`
pub fn get_user_by_email(
    req: &Request<Bytes>,
    state: &AppState,
) -> Result<Response<Bytes>, RouterError> {
    let params = QueryParams::from_request(req);
    let email = params.require("email")?;
    data_response(StatusCode::OK, state.db.user_by_email(email)?)
}

/// `GET /get-users?ids=<uuid>&ids=<uuid>...`
///
/// Unknown ids are skipped; 202 only if none of them exist.
pub fn get_users(req: &Request<Bytes>, state: &AppState) -> Result<Response<Bytes>, RouterError> {
    let ids = QueryParams::from_request(req).id_list()?;
    data_response(StatusCode::OK, state.db.users(&ids)?)
}

/// Deletes a user.
///
/// # Endpoint
/// `POST /delete-user`
///
/// # Request Body
/// ```json
/// {"id": "<user uuid>", "nominees": {"<product uuid>": "<new owner uuid>"}}
/// ```
///
/// Owned products without a nominee are deleted with the user.
pub fn delete_user(req: &Request<Bytes>, state: &AppState) -> Result<Response<Bytes>, RouterError> {
    let body = parse_json_object(req)?;
    let id = uuid_element(&body, "id")?;
    let nominees = parse_nominees(element(&body, "nominees")?)?;

    state.db.delete_user(&id, &nominees)?;
    tracing::info!("Deleted user {} ({} nominee(s))", id, nominees.len());
    ok_response(StatusCode::OK)
}

fn parse_nominees(value: &Value) -> Result<HashMap<Uuid, Uuid>, RouterError> {
    let map = match value {
        Value::Null => return Ok(HashMap::new()),
        Value::Object(map) => map,
        _ => return Err(invalid("nominees")),
    };

    map.iter()
        .map(|(product, nominee)| {
            let product = Uuid::parse_str(product).map_err(|_| invalid("nominees"))?;
            let nominee = nominee
                .as_str()
                .and_then(|n| Uuid::parse_str(n).ok())
                .ok_or_else(|| invalid("nominees"))?;
            Ok((product, nominee))
        })
        .collect()
}

/// `GET /authenticate?email=<address>&password=<secret>&id=<uuid>`
pub fn authenticate(
    req: &Request<Bytes>,
    state: &AppState,
) -> Result<Response<Bytes>, RouterError> {
    let params = QueryParams::from_request(req);
    let email = params
        .get("email")
        .ok_or_else(|| RouterError::BadRequest("Missing 'email'".to_string()))?;
    let password = params
        .get("password")
        .ok_or_else(|| RouterError::BadRequest("Missing 'password' element".to_string()))?;
    let id = params
        .get("id")
        .ok_or_else(|| RouterError::BadRequest("Missing 'id' element".to_string()))?;
    let id = Uuid::parse_str(id).map_err(|_| invalid("id"))?;

    state.db.authenticate(&id, email, password.as_bytes())?;
    ok_response(StatusCode::OK)
}

/// Adds or updates product members.
///
/// # Endpoint
/// `POST /add-product-user`
///
/// # Request Body
/// ```json
/// {"product_id": "<uuid>", "users": [{"id": "<uuid>", "privilege": 2}]}
/// ```
pub fn add_product_user(
    req: &Request<Bytes>,
    state: &AppState,
) -> Result<Response<Bytes>, RouterError> {
    let body = parse_json_object(req)?;
    let product_id = uuid_element(&body, "product_id")?;
    let users = element(&body, "users")?
        .as_array()
        .ok_or_else(|| invalid("users"))?
        .iter()
        .map(|entry| {
            let entry = entry.as_object().ok_or_else(|| invalid("users"))?;
            let id = uuid_element(entry, "id")?;
            let privilege = element(entry, "privilege")?
                .as_i64()
                .ok_or_else(|| invalid("privilege"))?;
            Ok((id, privilege))
        })
        .collect::<Result<Vec<_>, RouterError>>()?;

    state.db.add_product_users(&product_id, &users)?;
    ok_response(StatusCode::CREATED)
}

/// `POST /delete-product-user` with `{"product_id": "<uuid>", "user_id": "<uuid>"}`
pub fn delete_product_user(
    req: &Request<Bytes>,
    state: &AppState,
) -> Result<Response<Bytes>, RouterError> {
    let body = parse_json_object(req)?;
    let product_id = uuid_element(&body, "product_id")?;
    let user_id = uuid_element(&body, "user_id")?;

    state.db.delete_product_user(&product_id, &user_id)?;
    ok_response(StatusCode::OK)
}
