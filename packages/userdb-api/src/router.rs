//! Matchit routing configuration.

use std::fmt;
use std::sync::Arc;

use hyper::body::{Body, Bytes};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Method, Request, Response, StatusCode};
use matchit::Router as MatchitRouter;

use crate::handlers::{
    self, asset_handlers, product_handlers, project_handlers, request_utils, user_handlers,
    viewer_handlers,
};
use userdb_core::{config::DbConfig, database::Database, error::DbError};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database instance
    pub db: Arc<Database>,
    /// Database configuration
    pub config: Arc<DbConfig>,
}

/// HTTP request router.
pub struct Router {
    inner: MatchitRouter<(Method, RouteHandler)>,
    state: AppState,
}

impl Router {
    /// Creates a router serving every endpoint of the API.
    pub fn new(db: Arc<Database>, config: Arc<DbConfig>) -> Self {
        let mut router = MatchitRouter::new();

        for (path, method, handler) in routes() {
            if let Err(err) = router.insert(path, (method, handler)) {
                // Static table; a conflict is a programming error caught by tests
                tracing::error!("Failed to insert route {}: {}", path, err);
            }
        }

        Self {
            inner: router,
            state: AppState { db, config },
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Routes a request, turning every failure into an error envelope.
    pub async fn handle<B>(&self, req: Request<B>) -> Response<Bytes>
    where
        B: Body,
        B::Error: fmt::Display,
    {
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        match self.route(req).await {
            Ok(response) => {
                tracing::debug!("{} {} -> {}", method, path, response.status());
                response
            }
            Err(err) => {
                let status = err.status();
                if status.is_server_error() {
                    tracing::error!("{} {} -> {}: {}", method, path, status, err);
                } else {
                    tracing::debug!("{} {} -> {}: {}", method, path, status, err);
                }
                err.into()
            }
        }
    }

    /// Routes an incoming request to the appropriate handler.
    pub async fn route<B>(&self, req: Request<B>) -> Result<Response<Bytes>, RouterError>
    where
        B: Body,
        B::Error: fmt::Display,
    {
        let path = req.uri().path().to_string();
        let matched = self
            .inner
            .at(&path)
            .map_err(|_| RouterError::NotFound(format!("No route found for {}", path)))?;

        let (method, handler) = matched.value;
        if req.method() != method {
            return Err(RouterError::InvalidMethod(req.method().clone()));
        }

        let (parts, body) = req.into_parts();
        let body =
            request_utils::read_request_body_with_timeout(body, self.state.config.request_timeout_ms)
                .await?;

        // Handlers block on the writer mutex and on asset directory creation
        let req = Request::from_parts(parts, body);
        let state = self.state.clone();
        let handler = *handler;
        tokio::task::spawn_blocking(move || handler.handle(&req, &state))
            .await
            .map_err(|err| RouterError::InternalError(format!("Handler task failed: {}", err)))?
    }
}

/// Every endpoint with the method it accepts.
fn routes() -> Vec<(&'static str, Method, RouteHandler)> {
    vec![
        ("/", Method::GET, RouteHandler::Hello),
        // Users
        ("/add-user", Method::POST, RouteHandler::AddUser),
        ("/get-user-by-id", Method::GET, RouteHandler::GetUserById),
        ("/get-user-by-email", Method::GET, RouteHandler::GetUserByEmail),
        ("/get-users", Method::GET, RouteHandler::GetUsers),
        // Legacy alias of /get-user-by-id
        ("/get-user", Method::GET, RouteHandler::GetUserById),
        ("/update-user-settings", Method::POST, RouteHandler::UpdateUserSettings),
        ("/update-user-assets", Method::POST, RouteHandler::UpdateUserAssets),
        ("/delete-user", Method::POST, RouteHandler::DeleteUser),
        ("/authenticate", Method::GET, RouteHandler::Authenticate),
        ("/add-product-user", Method::POST, RouteHandler::AddProductUser),
        ("/delete-product-user", Method::POST, RouteHandler::DeleteProductUser),
        // Products
        ("/add-product", Method::POST, RouteHandler::AddProduct),
        ("/get-product-by-id", Method::GET, RouteHandler::GetProductById),
        ("/get-products", Method::GET, RouteHandler::GetProducts),
        // Legacy alias of /get-product-by-id
        ("/get-product", Method::GET, RouteHandler::GetProductById),
        ("/update-product-details", Method::POST, RouteHandler::UpdateProductDetails),
        ("/update-product-assets", Method::POST, RouteHandler::UpdateProductAssets),
        ("/delete-product", Method::POST, RouteHandler::DeleteProduct),
        // Projects
        ("/add-project", Method::POST, RouteHandler::AddProject),
        ("/get-project", Method::GET, RouteHandler::GetProject),
        ("/get-projects", Method::GET, RouteHandler::GetProjects),
        ("/get-product-projects", Method::GET, RouteHandler::GetProductProjects),
        ("/update-project-details", Method::POST, RouteHandler::UpdateProjectDetails),
        ("/update-project-assets", Method::POST, RouteHandler::UpdateProjectAssets),
        ("/delete-project", Method::POST, RouteHandler::DeleteProject),
        // Project viewers
        ("/add-project-viewer", Method::POST, RouteHandler::AddProjectViewer),
        ("/get-project-viewer-by-viewer", Method::GET, RouteHandler::GetViewersByViewer),
        ("/get-project-viewer-by-user", Method::GET, RouteHandler::GetViewersByUser),
        ("/delete-project-viewer-by-viewer", Method::POST, RouteHandler::DeleteViewersByViewer),
        ("/delete-project-viewer-by-user", Method::POST, RouteHandler::DeleteViewersByUser),
    ]
}

/// Route handler function.
#[derive(Debug, Clone, Copy)]
enum RouteHandler {
    Hello,
    AddUser,
    GetUserById,
    GetUserByEmail,
    GetUsers,
    UpdateUserSettings,
    UpdateUserAssets,
    DeleteUser,
    Authenticate,
    AddProductUser,
    DeleteProductUser,
    AddProduct,
    GetProductById,
    GetProducts,
    UpdateProductDetails,
    UpdateProductAssets,
    DeleteProduct,
    AddProject,
    GetProject,
    GetProjects,
    GetProductProjects,
    UpdateProjectDetails,
    UpdateProjectAssets,
    DeleteProject,
    AddProjectViewer,
    GetViewersByViewer,
    GetViewersByUser,
    DeleteViewersByViewer,
    DeleteViewersByUser,
}

impl RouteHandler {
    fn handle(&self, req: &Request<Bytes>, state: &AppState) -> Result<Response<Bytes>, RouterError> {
        match self {
            RouteHandler::Hello => handlers::hello(),
            RouteHandler::AddUser => user_handlers::add_user(req, state),
            RouteHandler::GetUserById => user_handlers::get_user_by_id(req, state),
            RouteHandler::GetUserByEmail => user_handlers::get_user_by_email(req, state),
            RouteHandler::GetUsers => user_handlers::get_users(req, state),
            RouteHandler::UpdateUserSettings => asset_handlers::update_user_settings(req, state),
            RouteHandler::UpdateUserAssets => asset_handlers::update_user_assets(req, state),
            RouteHandler::DeleteUser => user_handlers::delete_user(req, state),
            RouteHandler::Authenticate => user_handlers::authenticate(req, state),
            RouteHandler::AddProductUser => user_handlers::add_product_user(req, state),
            RouteHandler::DeleteProductUser => user_handlers::delete_product_user(req, state),
            RouteHandler::AddProduct => product_handlers::add_product(req, state),
            RouteHandler::GetProductById => product_handlers::get_product_by_id(req, state),
            RouteHandler::GetProducts => product_handlers::get_products(req, state),
            RouteHandler::UpdateProductDetails => asset_handlers::update_product_details(req, state),
            RouteHandler::UpdateProductAssets => asset_handlers::update_product_assets(req, state),
            RouteHandler::DeleteProduct => product_handlers::delete_product(req, state),
            RouteHandler::AddProject => project_handlers::add_project(req, state),
            RouteHandler::GetProject => project_handlers::get_project(req, state),
            RouteHandler::GetProjects => project_handlers::get_projects(req, state),
            RouteHandler::GetProductProjects => project_handlers::get_product_projects(req, state),
            RouteHandler::UpdateProjectDetails => asset_handlers::update_project_details(req, state),
            RouteHandler::UpdateProjectAssets => asset_handlers::update_project_assets(req, state),
            RouteHandler::DeleteProject => project_handlers::delete_project(req, state),
            RouteHandler::AddProjectViewer => viewer_handlers::add_project_viewer(req, state),
            RouteHandler::GetViewersByViewer => viewer_handlers::get_by_viewer(req, state),
            RouteHandler::GetViewersByUser => viewer_handlers::get_by_user(req, state),
            RouteHandler::DeleteViewersByViewer => viewer_handlers::delete_by_viewer(req, state),
            RouteHandler::DeleteViewersByUser => viewer_handlers::delete_by_user(req, state),
        }
    }
}

/// Router error type.
#[derive(Debug)]
pub enum RouterError {
    /// Route exists but expects another method
    InvalidMethod(Method),
    /// Malformed body or missing/invalid parameter
    BadRequest(String),
    /// Body was not received within the request timeout
    Timeout,
    /// No route for the path
    NotFound(String),
    /// Operation failed in the database
    Db(DbError),
    InternalError(String),
}

impl RouterError {
    /// HTTP status reported for this error.
    ///
    /// Domain failures are reported as 202 Accepted with the message in
    /// the envelope; clients match on the message text.
    pub fn status(&self) -> StatusCode {
        match self {
            RouterError::InvalidMethod(_) | RouterError::BadRequest(_) => StatusCode::BAD_REQUEST,
            RouterError::Timeout => StatusCode::REQUEST_TIMEOUT,
            RouterError::NotFound(_) => StatusCode::NOT_FOUND,
            RouterError::Db(e) if e.is_domain() => StatusCode::ACCEPTED,
            RouterError::Db(_) | RouterError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl fmt::Display for RouterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouterError::InvalidMethod(method) => write!(f, "Invalid request type {}", method),
            RouterError::BadRequest(msg) => write!(f, "{}", msg),
            RouterError::Timeout => write!(f, "Request Timeout"),
            RouterError::NotFound(msg) => write!(f, "{}", msg),
            RouterError::Db(e) => write!(f, "{}", e),
            RouterError::InternalError(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for RouterError {}

impl From<DbError> for RouterError {
    fn from(err: DbError) -> Self {
        RouterError::Db(err)
    }
}

impl From<RouterError> for Response<Bytes> {
    fn from(err: RouterError) -> Self {
        let envelope = handlers::response::Envelope::failure(err.to_string());
        let body = serde_json::to_vec(&envelope).unwrap_or_else(|_| b"{}".to_vec());

        let mut response = Response::new(Bytes::from(body));
        *response.status_mut() = err.status();
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response
    }
}
