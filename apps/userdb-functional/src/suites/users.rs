//! User registration, lookup, authentication, membership and deletion.

use reqwest::StatusCode;
use serde_json::{json, Value};

use super::{ensure_eq, ensure_status, is_valid_id, strip_ids, Case, PASSWORD_B64, UNKNOWN_ID};
use crate::connector::{get_response, setup_response, Expected, HttpConnector};
use crate::error::HarnessError;
use crate::fixtures::{add_product, add_user, id_of};
use crate::report::SuiteReport;

pub async fn run(conn: &HttpConnector) -> SuiteReport {
    let mut report = SuiteReport::new("users");
    run_cases!(report, conn, create_user, create_user_cases());
    run_cases!(report, conn, get_user, get_user_cases());
    run_cases!(report, conn, get_user_by_email, get_user_by_email_cases());
    run_cases!(report, conn, get_users, get_users_cases());
    run_cases!(report, conn, authenticate, authenticate_cases());
    run_cases!(report, conn, add_product_users, add_product_users_cases());
    run_cases!(report, conn, delete_product_user, delete_product_user_cases());
    run_cases!(report, conn, delete_user, delete_user_cases());
    report
}

fn user(name: &str, email: &str) -> Value {
    json!({"username": name, "email": email, "password": "testPassword"})
}

fn full_user(name: &str, email: &str) -> Value {
    json!({
        "username": name,
        "email": email,
        "password": PASSWORD_B64,
        "settings": {"datamap": {}},
        "assets": {"datamap": {}},
    })
}

fn create_user_cases() -> Vec<Case> {
    vec![
        Case::new(
            "No existing email",
            user("testUser", "testEmail"),
            Expected::data(json!({"username": "testUser", "email": "testEmail", "password": PASSWORD_B64})),
        ),
        Case::new(
            "Existing email",
            user("testUserEmailExists", "testEmail"),
            Expected::error("User with this email already exists"),
        ),
        Case::new(
            "Existing name",
            user("testUser", "testEmailUserExists"),
            Expected::error("User with this name already exists"),
        ),
    ]
}

async fn create_user(conn: &HttpConnector, case: &Case) -> Result<(), HarnessError> {
    let response = conn.post("/add-user", &case.data).await?;
    let Some(created) = get_response(&response.text, &case.expected)? else {
        return Ok(());
    };
    let expected = case.expected.expect_data(&created)?;

    ensure_status(&response, StatusCode::CREATED)?;
    for key in ["username", "email", "password"] {
        if created[key] != expected[key] {
            return Err(HarnessError::mismatch(&created, expected));
        }
    }
    Ok(())
}

fn get_user_cases() -> Vec<Case> {
    vec![
        Case::new(
            "Existing user",
            user("testUserGet", "testEmailGet"),
            Expected::data(json!({"username": "testUserGet", "email": "testEmailGet"})),
        ),
        Case::new(
            "No existing user",
            json!({"id": UNKNOWN_ID}),
            Expected::error("The selected user not found"),
        ),
    ]
}

async fn get_user(conn: &HttpConnector, case: &Case) -> Result<(), HarnessError> {
    let id = if case.data.get("username").is_some() {
        let response = conn.post("/add-user", &case.data).await?;
        ensure_status(&response, StatusCode::CREATED)?;
        id_of(&setup_response(&response.text)?)?
    } else {
        case.data["id"].as_str().unwrap_or_default().to_string()
    };

    let response = conn.get("/get-user-by-id", &[("id", id)]).await?;
    let Some(found) = get_response(&response.text, &case.expected)? else {
        return Ok(());
    };
    let expected = case.expected.expect_data(&found)?;

    if found["username"] != expected["username"]
        || found["email"] != expected["email"]
        || !is_valid_id(found["settings"].get("id"))
        || !is_valid_id(found["assets"].get("id"))
    {
        return Err(HarnessError::mismatch(&found, expected));
    }
    Ok(())
}

fn get_user_by_email_cases() -> Vec<Case> {
    vec![
        Case::new(
            "Existing user",
            user("testUserGetByEmail", "testEmailGetByEmail"),
            Expected::data(full_user("testUserGetByEmail", "testEmailGetByEmail")),
        ),
        Case::new(
            "No existing user",
            json!({"email": "testEmailGetWrong"}),
            Expected::error("The selected user not found"),
        ),
    ]
}

async fn get_user_by_email(conn: &HttpConnector, case: &Case) -> Result<(), HarnessError> {
    let email = if case.data.get("username").is_some() {
        let response = conn.post("/add-user", &case.data).await?;
        let created = setup_response(&response.text)?;
        ensure_status(&response, StatusCode::CREATED)?;
        created["email"].as_str().unwrap_or_default().to_string()
    } else {
        case.data["email"].as_str().unwrap_or_default().to_string()
    };

    let response = conn.get("/get-user-by-email", &[("email", email)]).await?;
    let Some(mut found) = get_response(&response.text, &case.expected)? else {
        return Ok(());
    };
    let expected = case.expected.expect_data(&found)?;

    strip_ids(&mut found, &["settings", "assets"])?;
    ensure_eq(&found, expected)
}

fn get_users_cases() -> Vec<Case> {
    vec![
        Case::new(
            "Existing users",
            json!([
                user("testUserGetMultiple1", "testEmailGetMultiple1"),
                user("testUserGetMultiple2", "testEmailGetMultiple2"),
            ]),
            Expected::data(json!([
                full_user("testUserGetMultiple1", "testEmailGetMultiple1"),
                full_user("testUserGetMultiple2", "testEmailGetMultiple2"),
            ])),
        ),
        Case::new(
            "Missing a user",
            json!([
                user("testUserGetMultipleFail", "testEmailGetMultipleFail"),
                {"id": UNKNOWN_ID},
            ]),
            Expected::data(json!([full_user(
                "testUserGetMultipleFail",
                "testEmailGetMultipleFail"
            )])),
        ),
        Case::new(
            "No user",
            json!([{"id": UNKNOWN_ID}]),
            Expected::error("The selected user not found"),
        ),
    ]
}

async fn get_users(conn: &HttpConnector, case: &Case) -> Result<(), HarnessError> {
    let mut ids = Vec::new();
    for entry in case.data.as_array().map(Vec::as_slice).unwrap_or_default() {
        if entry.get("username").is_some() {
            let response = conn.post("/add-user", entry).await?;
            let created = setup_response(&response.text)?;
            ensure_status(&response, StatusCode::CREATED)?;
            ids.push(("ids", id_of(&created)?));
        } else {
            ids.push(("ids", entry["id"].as_str().unwrap_or_default().to_string()));
        }
    }

    let response = conn.get("/get-users", &ids).await?;
    let Some(found) = get_response(&response.text, &case.expected)? else {
        return Ok(());
    };
    let expected = case.expected.expect_data(&found)?;

    let mut users = match found {
        Value::Array(users) => users,
        other => return Err(HarnessError::mismatch(other, expected)),
    };
    for user in &mut users {
        strip_ids(user, &["settings", "assets"])?;
    }
    ensure_eq(&Value::Array(users), expected)
}

fn authenticate_cases() -> Vec<Case> {
    vec![
        Case::new(
            "Valid password",
            json!({
                "user": user("testUserGetPassword", "testEmailGetPassword"),
                "login": {"email": "testEmailGetPassword", "password": "testPassword"},
            }),
            Expected::ok(),
        ),
        Case::new(
            "Invalid Password",
            json!({
                "user": user("testUserGetPasswordInvalid", "testEmailGetPasswordInvalid"),
                "login": {"email": "testEmailGetPasswordInvalid", "password": "testPasswordWrong"},
            }),
            Expected::error("Invalid password"),
        ),
        Case::new(
            "No user found",
            json!({"id": UNKNOWN_ID}),
            Expected::error("The selected user not found"),
        ),
    ]
}

async fn authenticate(conn: &HttpConnector, case: &Case) -> Result<(), HarnessError> {
    let (id, email, password) = match case.data.get("user") {
        Some(user) => {
            let response = conn.post("/add-user", user).await?;
            let created = setup_response(&response.text)?;
            ensure_status(&response, StatusCode::CREATED)?;
            let login = &case.data["login"];
            (
                id_of(&created)?,
                login["email"].as_str().unwrap_or_default().to_string(),
                login["password"].as_str().unwrap_or_default().to_string(),
            )
        }
        None => (
            case.data["id"].as_str().unwrap_or_default().to_string(),
            "empty".to_string(),
            "empty".to_string(),
        ),
    };

    let params = [("id", id), ("email", email), ("password", password)];
    let response = conn.get("/authenticate", &params).await?;
    let Some(result) = get_response(&response.text, &case.expected)? else {
        return Ok(());
    };
    ensure_eq(&result, case.expected.expect_data(&result)?)
}

fn add_product_users_cases() -> Vec<Case> {
    vec![Case::new(
        "Add product users",
        json!({
            "product": {"name": "testProductUsers", "public": true},
            "user": user("testProductUser", "testEmailProductUser"),
            "partner_user": [{
                "user": user("testUserPartner", "testEmailPartner"),
                "privilege": 3,
            }],
        }),
        Expected::ok(),
    )]
}

async fn add_product_users(conn: &HttpConnector, case: &Case) -> Result<(), HarnessError> {
    let user_id = add_user(conn, &case.data).await?;
    let product_id = add_product(conn, &case.data, &user_id).await?;

    let mut partners = Vec::new();
    for partner in case.data["partner_user"].as_array().map(Vec::as_slice).unwrap_or_default() {
        let response = conn.post("/add-user", &partner["user"]).await?;
        let created = setup_response(&response.text)?;
        ensure_status(&response, StatusCode::CREATED)?;
        partners.push(json!({"id": id_of(&created)?, "privilege": partner["privilege"]}));
    }

    let body = json!({"product_id": product_id, "users": partners});
    let response = conn.post("/add-product-user", &body).await?;
    let Some(result) = get_response(&response.text, &case.expected)? else {
        return Ok(());
    };
    ensure_eq(&result, case.expected.expect_data(&result)?)
}

fn delete_product_user_cases() -> Vec<Case> {
    vec![Case::new(
        "Delete product users",
        json!({
            "product": {"name": "testProductUserDelete"},
            "user": user("testProductUserDelete", "testEmailProductUserDelete"),
        }),
        Expected::ok(),
    )]
}

async fn delete_product_user(conn: &HttpConnector, case: &Case) -> Result<(), HarnessError> {
    let user_id = add_user(conn, &case.data).await?;
    let product_id = add_product(conn, &case.data, &user_id).await?;

    let body = json!({"product_id": product_id, "user_id": user_id});
    let response = conn.post("/delete-product-user", &body).await?;
    let Some(result) = get_response(&response.text, &case.expected)? else {
        return Ok(());
    };
    ensure_eq(&result, case.expected.expect_data(&result)?)
}

fn delete_user_cases() -> Vec<Case> {
    vec![
        Case::new(
            "Existing user",
            json!({
                "user": user("testUserDelete", "testEmailDelete"),
                "products_to_delete": [{"name": "testProductDelete"}],
                "nominated_users": [user("testUserNominated1", "testEmailNominated1")],
            }),
            Expected::ok(),
        ),
        Case::new(
            "Non existing user",
            json!({"user_id": UNKNOWN_ID}),
            Expected::error("The selected user not found"),
        ),
        Case::new(
            "No nominees",
            json!({
                "user": user("testUserDeleteNoNominee", "testEmailDeleteNoNominee"),
                "products_to_delete": [{"name": "testProductDeleteNoNominee"}],
            }),
            Expected::ok(),
        ),
    ]
}

async fn delete_user(conn: &HttpConnector, case: &Case) -> Result<(), HarnessError> {
    let user_id = add_user(conn, &case.data).await?;

    let mut products = Vec::new();
    for product in case.data["products_to_delete"].as_array().map(Vec::as_slice).unwrap_or_default() {
        let body = json!({"product": product, "user": user_id});
        let response = conn.post("/add-product", &body).await?;
        let created = setup_response(&response.text)?;
        ensure_status(&response, StatusCode::CREATED)?;
        products.push(id_of(&created)?);
    }

    let nominated = case.data["nominated_users"].as_array().map(Vec::as_slice).unwrap_or_default();
    if nominated.len() > products.len() {
        return Err(HarnessError::Mismatch("Too many nominated users".to_string()));
    }

    let mut nominees = serde_json::Map::new();
    for (product_id, nominee) in products.iter().zip(nominated) {
        let response = conn.post("/add-user", nominee).await?;
        let created = setup_response(&response.text)?;
        ensure_status(&response, StatusCode::CREATED)?;
        let nominee_id = id_of(&created)?;

        let body = json!({"product_id": product_id, "users": [{"id": nominee_id, "privilege": 2}]});
        let response = conn.post("/add-product-user", &body).await?;
        setup_response(&response.text)?;
        ensure_status(&response, StatusCode::CREATED)?;
        nominees.insert(product_id.clone(), Value::String(nominee_id));
    }

    let body = json!({"id": user_id, "nominees": nominees});
    let response = conn.post("/delete-user", &body).await?;
    let Some(result) = get_response(&response.text, &case.expected)? else {
        return Ok(());
    };
    ensure_eq(&result, case.expected.expect_data(&result)?)?;

    // Nominated products survive, the others are gone
    for product_id in &products {
        let response = conn
            .get("/get-product-by-id", &[("id", product_id.clone())])
            .await?;
        let status = if nominees.contains_key(product_id) {
            StatusCode::OK
        } else {
            StatusCode::ACCEPTED
        };
        ensure_status(&response, status)?;
    }
    Ok(())
}
