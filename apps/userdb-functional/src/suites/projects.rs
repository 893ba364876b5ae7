//! Project creation, lookup and deletion, and project viewers.

use reqwest::StatusCode;
use serde_json::{json, Value};

use super::{ensure_eq, ensure_project_details, ensure_status, Case, UNKNOWN_ID};
use crate::connector::{get_response, setup_response, Expected, HttpConnector};
use crate::error::HarnessError;
use crate::fixtures::{
    add_product, add_project, add_project_viewer, add_projects, add_user, id_of,
};
use crate::report::SuiteReport;

pub async fn run(conn: &HttpConnector) -> SuiteReport {
    let mut report = SuiteReport::new("projects");
    run_cases!(report, conn, create_project, create_project_cases());
    run_cases!(report, conn, get_project, get_project_cases());
    run_cases!(report, conn, get_projects, get_projects_cases());
    run_cases!(report, conn, get_product_projects, get_product_projects_cases());
    run_cases!(report, conn, delete_project, delete_project_cases());
    run_cases!(report, conn, create_project_viewer, create_project_viewer_cases());
    run_cases!(report, conn, get_viewers_by_viewer, get_viewers_by_viewer_cases());
    run_cases!(report, conn, get_viewers_by_user, get_viewers_by_user_cases());
    run_cases!(report, conn, delete_viewers_by_viewer, delete_viewers_by_viewer_cases());
    run_cases!(report, conn, delete_viewers_by_user, delete_viewers_by_user_cases());
    report
}

fn owner(name: &str) -> Value {
    json!({
        "username": format!("testUser{}", name),
        "email": format!("testEmail{}", name),
        "password": "testPassword",
    })
}

fn project(name: &str, visibility: &str) -> Value {
    json!({"name": name, "visibility": visibility})
}

/// User, product and project blocks for a case named `suffix`.
fn setup(suffix: &str) -> Value {
    json!({
        "user": owner(&format!("Owner{}", suffix)),
        "product": {"name": format!("testProduct{}", suffix)},
        "project": project(&format!("testProject{}", suffix), "Public"),
    })
}

fn with(mut base: Value, extra: Value) -> Value {
    if let (Some(base), Value::Object(extra)) = (base.as_object_mut(), extra) {
        base.extend(extra);
    }
    base
}

fn without(mut base: Value, key: &str) -> Value {
    if let Some(base) = base.as_object_mut() {
        base.remove(key);
    }
    base
}

fn create_project_cases() -> Vec<Case> {
    vec![
        Case::new(
            "No existing project",
            setup("AddProject"),
            Expected::data(project("testProjectAddProject", "Public")),
        ),
        Case::new(
            "Missing product",
            json!({
                "project": project("testProjectMissingUser", "Public"),
                "user_id": UNKNOWN_ID,
                "product_id": UNKNOWN_ID,
            }),
            Expected::error("The selected product not found"),
        ),
    ]
}

async fn create_project(conn: &HttpConnector, case: &Case) -> Result<(), HarnessError> {
    let user_id = add_user(conn, &case.data).await?;
    let product_id = add_product(conn, &case.data, &user_id).await?;

    let body = json!({
        "project": case.data["project"],
        "product_id": product_id,
        "owner_id": user_id,
    });
    let response = conn.post("/add-project", &body).await?;
    let Some(created) = get_response(&response.text, &case.expected)? else {
        return Ok(());
    };
    let expected = case.expected.expect_data(&created)?;

    ensure_status(&response, StatusCode::CREATED)?;
    ensure_project_details(&created, expected)
}

fn get_project_cases() -> Vec<Case> {
    vec![
        Case::new(
            "Existing project",
            setup("GetProject"),
            Expected::data(project("testProjectGetProject", "Public")),
        ),
        Case::new(
            "Missing project",
            with(
                without(setup("GetProjectMissing"), "project"),
                json!({"id": UNKNOWN_ID}),
            ),
            Expected::error("The selected project not found"),
        ),
    ]
}

async fn get_project(conn: &HttpConnector, case: &Case) -> Result<(), HarnessError> {
    let user_id = add_user(conn, &case.data).await?;
    let product_id = add_product(conn, &case.data, &user_id).await?;
    let project_id = add_project(conn, &case.data, &user_id, &product_id).await?;

    let response = conn.get("/get-project", &[("id", project_id)]).await?;
    let Some(found) = get_response(&response.text, &case.expected)? else {
        return Ok(());
    };
    ensure_project_details(&found, case.expected.expect_data(&found)?)
}

/// Checks a project list against expected name/visibility pairs.
fn ensure_project_list(found: &Value, expected: &Value) -> Result<(), HarnessError> {
    let (Some(found_list), Some(expected_list)) = (found.as_array(), expected.as_array()) else {
        return Err(HarnessError::mismatch(found, expected));
    };
    if found_list.len() != expected_list.len() {
        return Err(HarnessError::mismatch(found, expected));
    }
    found_list
        .iter()
        .zip(expected_list)
        .try_for_each(|(project, expected)| ensure_project_details(project, expected))
}

fn get_projects_cases() -> Vec<Case> {
    vec![
        Case::new(
            "Existing projects",
            with(
                setup("GetProjectMultiple"),
                json!({"project": [
                    project("testProjectGetProjectMultiple1", "Public"),
                    project("testProjectGetProjectMultiple2", "Protected"),
                ]}),
            ),
            Expected::data(json!([
                project("testProjectGetProjectMultiple1", "Public"),
                project("testProjectGetProjectMultiple2", "Protected"),
            ])),
        ),
        Case::new(
            "Missing a project",
            with(
                setup("GetProjectMultiple2"),
                json!({"project": [
                    project("testProjectGetProjectMultiple2", "Public"),
                    {"id": UNKNOWN_ID},
                ]}),
            ),
            Expected::data(json!([project("testProjectGetProjectMultiple2", "Public")])),
        ),
        Case::new(
            "No project",
            with(
                setup("GetProjectMultiple3"),
                json!({"project": [{"id": UNKNOWN_ID}]}),
            ),
            Expected::error("The selected project not found"),
        ),
    ]
}

async fn get_projects(conn: &HttpConnector, case: &Case) -> Result<(), HarnessError> {
    let user_id = add_user(conn, &case.data).await?;
    let product_id = add_product(conn, &case.data, &user_id).await?;
    let ids = add_projects(conn, &case.data, &user_id, &product_id).await?;

    let params: Vec<_> = ids.into_iter().map(|id| ("ids", id)).collect();
    let response = conn.get("/get-projects", &params).await?;
    let Some(found) = get_response(&response.text, &case.expected)? else {
        return Ok(());
    };
    ensure_project_list(&found, case.expected.expect_data(&found)?)
}

fn get_product_projects_cases() -> Vec<Case> {
    vec![
        Case::new(
            "Existing projects",
            with(
                setup("GetProductProjects"),
                json!({"project": [
                    project("testProjectGetProductProjects1", "Public"),
                    project("testProjectGetProductProjects2", "Protected"),
                ]}),
            ),
            Expected::data(json!([
                project("testProjectGetProductProjects1", "Public"),
                project("testProjectGetProductProjects2", "Protected"),
            ])),
        ),
        Case::new(
            "Missing a project",
            with(
                setup("GetProductProjects2"),
                json!({"project": [
                    project("testProjectGetProductProjects2", "Public"),
                    {"id": UNKNOWN_ID},
                ]}),
            ),
            Expected::data(json!([project("testProjectGetProductProjects2", "Public")])),
        ),
        Case::new(
            "No project",
            without(setup("GetProductProjects3"), "project"),
            Expected::error("No projects for this product"),
        ),
    ]
}

async fn get_product_projects(conn: &HttpConnector, case: &Case) -> Result<(), HarnessError> {
    let user_id = add_user(conn, &case.data).await?;
    let product_id = add_product(conn, &case.data, &user_id).await?;
    add_projects(conn, &case.data, &user_id, &product_id).await?;

    let response = conn
        .get("/get-product-projects", &[("product_id", product_id)])
        .await?;
    let Some(found) = get_response(&response.text, &case.expected)? else {
        return Ok(());
    };
    ensure_project_list(&found, case.expected.expect_data(&found)?)
}

fn delete_project_cases() -> Vec<Case> {
    vec![
        Case::new("Existing project", setup("DeleteProject"), Expected::ok()),
        Case::new(
            "Missing project",
            with(
                without(setup("DeleteProjectMissing"), "project"),
                json!({"id": UNKNOWN_ID}),
            ),
            Expected::error("The selected project not found"),
        ),
    ]
}

async fn delete_project(conn: &HttpConnector, case: &Case) -> Result<(), HarnessError> {
    let user_id = add_user(conn, &case.data).await?;
    let product_id = add_product(conn, &case.data, &user_id).await?;
    let project_id = add_project(conn, &case.data, &user_id, &product_id).await?;

    let response = conn
        .post("/delete-project", &json!({"id": project_id}))
        .await?;
    let Some(result) = get_response(&response.text, &case.expected)? else {
        return Ok(());
    };
    ensure_eq(&result, case.expected.expect_data(&result)?)?;

    let response = conn.get("/get-project", &[("id", project_id)]).await?;
    ensure_status(&response, StatusCode::ACCEPTED)
}

/// Case data registering `viewer_id` as owner of a fresh project.
fn viewer_setup(viewer_id: &str, suffix: &str) -> Value {
    with(setup(suffix), json!({"viewer_id": viewer_id, "is_owner": true}))
}

fn create_project_viewer_cases() -> Vec<Case> {
    vec![
        Case::new(
            "Success",
            viewer_setup("d66aa5f8-2b83-49b5-bb0c-28b8336f7f34", "AddProjectViewer1"),
            Expected::ok(),
        ),
        Case::new(
            "Failure",
            with(
                without(
                    viewer_setup("e514d186-0594-4ee0-badd-56ff712be040", "AddProjectViewer2"),
                    "project",
                ),
                json!({"id": UNKNOWN_ID}),
            ),
            Expected::error("The selected project not found"),
        ),
        Case::new(
            "Duplicate owner",
            viewer_setup("d66aa5f8-2b83-49b5-bb0c-28b8336f7f34", "AddProjectViewer3"),
            Expected::error("Viewer already exists"),
        ),
    ]
}

async fn create_project_viewer(conn: &HttpConnector, case: &Case) -> Result<(), HarnessError> {
    let Some(response) = add_project_viewer(conn, &case.data).await? else {
        return Err(HarnessError::MissingTestData("viewer_id"));
    };
    let Some(result) = get_response(&response.text, &case.expected)? else {
        return Ok(());
    };
    ensure_status(&response, StatusCode::CREATED)?;
    ensure_eq(&result, case.expected.expect_data(&result)?)
}

/// Checks that the first viewer row carries the expected viewer id.
fn ensure_first_viewer(found: &Value, expected: &Value) -> Result<(), HarnessError> {
    if found[0]["viewer_id"] != expected[0]["viewer_id"] {
        return Err(HarnessError::mismatch(found, expected));
    }
    Ok(())
}

fn get_viewers_by_viewer_cases() -> Vec<Case> {
    let viewer_id = "eda3e9b4-d011-48c7-af8c-07446b628def";
    vec![
        Case::new(
            "Success",
            viewer_setup(viewer_id, "GetProjectViewer1"),
            Expected::data(json!([{"viewer_id": viewer_id, "is_owner": true}])),
        ),
        Case::new(
            "Not found",
            json!({"viewer_id": "ea1724ef-e426-43a4-8030-25c3468ef3a2"}),
            Expected::error("The selected project viewer not found"),
        ),
    ]
}

async fn get_viewers_by_viewer(conn: &HttpConnector, case: &Case) -> Result<(), HarnessError> {
    if case.data.get("user").is_some() {
        register_viewer(conn, &case.data).await?;
    }

    let viewer_id = case.data["viewer_id"].as_str().unwrap_or_default().to_string();
    let response = conn
        .get("/get-project-viewer-by-viewer", &[("viewer_id", viewer_id)])
        .await?;
    let Some(found) = get_response(&response.text, &case.expected)? else {
        return Ok(());
    };
    ensure_first_viewer(&found, case.expected.expect_data(&found)?)
}

/// Registers the viewer of a case as a setup step.
async fn register_viewer(conn: &HttpConnector, data: &Value) -> Result<(), HarnessError> {
    let Some(response) = add_project_viewer(conn, data).await? else {
        return Err(HarnessError::MissingTestData("viewer_id"));
    };
    setup_response(&response.text).map(|_| ())
}

/// Creates the viewer (or only the user) of a case and returns the user id.
async fn viewer_user_id(conn: &HttpConnector, case: &Case) -> Result<String, HarnessError> {
    let Some(user) = case.data.get("user") else {
        return Err(HarnessError::MissingTestData("user"));
    };

    if case.data.get("project").is_some() {
        register_viewer(conn, &case.data).await?;
    } else {
        add_user(conn, &case.data).await?;
    }

    let email = user["email"].as_str().unwrap_or_default().to_string();
    let response = conn.get("/get-user-by-email", &[("email", email)]).await?;
    id_of(&setup_response(&response.text)?)
}

fn get_viewers_by_user_cases() -> Vec<Case> {
    let viewer_id = "9d5f9412-dd75-4907-82cf-3041de584a30";
    vec![
        Case::new(
            "Success",
            viewer_setup(viewer_id, "GetProjectViewer2"),
            Expected::data(json!([{"viewer_id": viewer_id, "is_owner": true}])),
        ),
        Case::new(
            "Not found",
            json!({"user": owner("OwnerGetProjectViewer3")}),
            Expected::error("User is not connected to any viewer"),
        ),
    ]
}

async fn get_viewers_by_user(conn: &HttpConnector, case: &Case) -> Result<(), HarnessError> {
    let user_id = viewer_user_id(conn, case).await?;

    let response = conn
        .get("/get-project-viewer-by-user", &[("user_id", user_id)])
        .await?;
    let Some(found) = get_response(&response.text, &case.expected)? else {
        return Ok(());
    };
    ensure_first_viewer(&found, case.expected.expect_data(&found)?)
}

fn delete_viewers_by_viewer_cases() -> Vec<Case> {
    vec![
        Case::new(
            "Success",
            viewer_setup("56439ce5-b2bb-4278-ba97-247ac6a90d9e", "DeleteProjectViewer1"),
            Expected::ok(),
        ),
        Case::new(
            "Not found",
            json!({"viewer_id": "c5ec82f4-d6df-4057-8dc1-763709c7810e"}),
            Expected::error("No project viewer was deleted"),
        ),
    ]
}

async fn delete_viewers_by_viewer(conn: &HttpConnector, case: &Case) -> Result<(), HarnessError> {
    if case.data.get("user").is_some() {
        register_viewer(conn, &case.data).await?;
    }

    let body = json!({"viewer_id": case.data["viewer_id"]});
    let response = conn.post("/delete-project-viewer-by-viewer", &body).await?;
    let Some(result) = get_response(&response.text, &case.expected)? else {
        return Ok(());
    };
    ensure_eq(&result, case.expected.expect_data(&result)?)
}

fn delete_viewers_by_user_cases() -> Vec<Case> {
    vec![
        Case::new(
            "Success",
            with(
                viewer_setup("f1049c19-dae6-46dd-926f-791f149b14c8", "DeleteProjectViewer2"),
                json!({"user": {
                    "username": "testUserDeleteProjectViewer2",
                    "email": "testEmailDeleteProjectViewer2",
                    "password": "testPassword",
                }}),
            ),
            Expected::ok(),
        ),
        Case::new(
            "Not found",
            json!({"user": owner("DeleteProjectViewer3")}),
            Expected::error("No project viewer was deleted"),
        ),
    ]
}

async fn delete_viewers_by_user(conn: &HttpConnector, case: &Case) -> Result<(), HarnessError> {
    let user_id = viewer_user_id(conn, case).await?;

    let response = conn
        .post("/delete-project-viewer-by-user", &json!({"user_id": user_id}))
        .await?;
    let Some(result) = get_response(&response.text, &case.expected)? else {
        return Ok(());
    };
    ensure_eq(&result, case.expected.expect_data(&result)?)
}
