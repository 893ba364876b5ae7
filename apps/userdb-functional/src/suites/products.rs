//! Product creation, lookup and deletion.

use reqwest::StatusCode;
use serde_json::{json, Value};

use super::{ensure_eq, ensure_status, strip_ids, Case, UNKNOWN_ID};
use crate::connector::{get_response, setup_response, Expected, HttpConnector};
use crate::error::HarnessError;
use crate::fixtures::{add_product, add_user, id_of};
use crate::report::SuiteReport;

pub async fn run(conn: &HttpConnector) -> SuiteReport {
    let mut report = SuiteReport::new("products");
    run_cases!(report, conn, create_product, create_product_cases());
    run_cases!(report, conn, get_product, get_product_cases());
    run_cases!(report, conn, get_products, get_products_cases());
    run_cases!(report, conn, delete_product, delete_product_cases());
    report
}

fn owner(suffix: &str) -> Value {
    json!({
        "username": format!("testUserOwner{}", suffix),
        "email": format!("testEmailOwner{}", suffix),
        "password": "testPassword",
    })
}

/// Expected product with its ids stripped.
fn bare_product(name: &str) -> Value {
    json!({"name": name, "assets": {"datamap": {}}, "details": {"datamap": {}}})
}

fn create_product_cases() -> Vec<Case> {
    vec![
        Case::new(
            "No existing product",
            json!({"product": {"name": "testProduct"}, "user": owner("")}),
            Expected::data(json!({"name": "testProduct"})),
        ),
        Case::new(
            "Existing product",
            json!({"product": {"name": "testProduct"}, "user": owner("2")}),
            Expected::error("Product with name testProduct already exists"),
        ),
        Case::new(
            "Missing user",
            json!({"product": {"name": "testProductMissingUser"}, "user_id": UNKNOWN_ID}),
            Expected::error("The selected user not found"),
        ),
    ]
}

async fn create_product(conn: &HttpConnector, case: &Case) -> Result<(), HarnessError> {
    let user_id = add_user(conn, &case.data).await?;

    let body = json!({"product": case.data["product"], "user": user_id});
    let response = conn.post("/add-product", &body).await?;
    let Some(created) = get_response(&response.text, &case.expected)? else {
        return Ok(());
    };
    let expected = case.expected.expect_data(&created)?;

    ensure_status(&response, StatusCode::CREATED)?;
    if created["name"] != expected["name"] {
        return Err(HarnessError::mismatch(&created, expected));
    }
    Ok(())
}

fn get_product_cases() -> Vec<Case> {
    vec![
        Case::new(
            "Existing product",
            json!({"product": {"name": "testProductGet"}, "user": owner("Get")}),
            Expected::data(bare_product("testProductGet")),
        ),
        Case::new(
            "No existing product",
            json!({"user": owner("Get1"), "product_id": UNKNOWN_ID}),
            Expected::error("The selected product not found"),
        ),
    ]
}

async fn get_product(conn: &HttpConnector, case: &Case) -> Result<(), HarnessError> {
    let user_id = add_user(conn, &case.data).await?;
    let product_id = add_product(conn, &case.data, &user_id).await?;

    let response = conn.get("/get-product-by-id", &[("id", product_id)]).await?;
    let Some(mut found) = get_response(&response.text, &case.expected)? else {
        return Ok(());
    };
    let expected = case.expected.expect_data(&found)?;

    strip_ids(&mut found, &["assets", "details"])?;
    ensure_eq(&found, expected)
}

fn get_products_cases() -> Vec<Case> {
    vec![
        Case::new(
            "Existing products",
            json!({
                "product": [{"name": "testProductGetMultiple1"}, {"name": "testProductGetMultiple2"}],
                "user": owner("GetMultiple"),
            }),
            Expected::data(json!([
                bare_product("testProductGetMultiple1"),
                bare_product("testProductGetMultiple2"),
            ])),
        ),
        Case::new(
            "Missing a product",
            json!({
                "product": [{"name": "testProductGetMultipleFail"}, {"product_id": UNKNOWN_ID}],
                "user": owner("GetMultipleFail"),
            }),
            Expected::data(json!([bare_product("testProductGetMultipleFail")])),
        ),
        Case::new(
            "No product",
            json!({
                "product": [{"product_id": UNKNOWN_ID}],
                "user": owner("GetMultipleNoProduct"),
            }),
            Expected::error("The selected product not found"),
        ),
    ]
}

async fn get_products(conn: &HttpConnector, case: &Case) -> Result<(), HarnessError> {
    let user_id = add_user(conn, &case.data).await?;

    let mut ids = Vec::new();
    for entry in case.data["product"].as_array().map(Vec::as_slice).unwrap_or_default() {
        if entry.get("name").is_some() {
            let body = json!({"product": entry, "user": user_id});
            let response = conn.post("/add-product", &body).await?;
            ensure_status(&response, StatusCode::CREATED)?;
            let created = setup_response(&response.text)?;
            ids.push(("ids", id_of(&created)?));
        } else {
            let id = entry["product_id"].as_str().unwrap_or_default();
            ids.push(("ids", id.to_string()));
        }
    }

    let response = conn.get("/get-products", &ids).await?;
    let Some(found) = get_response(&response.text, &case.expected)? else {
        return Ok(());
    };
    let expected = case.expected.expect_data(&found)?;

    let mut products = match found {
        Value::Array(products) => products,
        other => return Err(HarnessError::mismatch(other, expected)),
    };
    for product in &mut products {
        strip_ids(product, &["assets", "details"])?;
    }
    ensure_eq(&Value::Array(products), expected)
}

fn delete_product_cases() -> Vec<Case> {
    vec![
        Case::new(
            "Existing product",
            json!({"product": {"name": "testProductDeleteProduct"}, "user": owner("DeleteProduct")}),
            Expected::ok(),
        ),
        Case::new(
            "No existing product",
            json!({"user": owner("DeleteProduct1"), "product_id": UNKNOWN_ID}),
            Expected::error("The selected product not found"),
        ),
    ]
}

async fn delete_product(conn: &HttpConnector, case: &Case) -> Result<(), HarnessError> {
    let user_id = add_user(conn, &case.data).await?;
    let product_id = add_product(conn, &case.data, &user_id).await?;

    let response = conn
        .post("/delete-product", &json!({"product_id": product_id}))
        .await?;
    let Some(result) = get_response(&response.text, &case.expected)? else {
        return Ok(());
    };
    ensure_eq(&result, case.expected.expect_data(&result)?)?;

    let response = conn.get("/get-product-by-id", &[("id", product_id)]).await?;
    ensure_status(&response, StatusCode::ACCEPTED)
}
