use axum::{routing::get, Router};

pub mod groups;
pub mod model;
pub mod system;
pub mod users;

pub const API_ROOT: &str = "/";
pub const HEALTH: &str = "/health";
pub const TRAIN_MODEL: &str = "/train_model/";
pub const PREDICT: &str = "/predict/";
pub const USER_LIST: &str = "/users/";
pub const USER_DETAIL: &str = "/users/:id/";
pub const GROUP_LIST: &str = "/groups/";
pub const GROUP_DETAIL: &str = "/groups/:id/";

/// Symbolic route names for the fixed (parameterless) paths.
const NAMED_ROUTES: &[(&str, &str)] = &[
    ("api-root", API_ROOT),
    ("health", HEALTH),
    ("train-model", TRAIN_MODEL),
    ("predict", PREDICT),
    ("user-list", USER_LIST),
    ("group-list", GROUP_LIST),
];

/// Resolve a route name to its path.
pub fn reverse(name: &str) -> Option<&'static str> {
    NAMED_ROUTES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, path)| *path)
}

/// Router for endpoints that anyone may call.
pub fn public_router() -> Router {
    Router::new()
        .route(API_ROOT, get(system::api_root))
        .route(HEALTH, get(system::health))
        .route(TRAIN_MODEL, get(model::train_model))
        .route(PREDICT, get(model::predict))
}

/// Router for endpoints that require an authenticated caller.
pub fn protected_router() -> Router {
    Router::new().merge(users::router()).merge(groups::router())
}
