pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::cache::InMemoryCacheStore;
use crate::lifecycle::{ControlBus, Lifecycle};
use crate::search::AssetResolver;

/// State shared by admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub lifecycle: Arc<Lifecycle>,
    pub store: Arc<InMemoryCacheStore>,
    pub control: ControlBus,
    /// `None` when search is disabled.
    pub resolver: Option<Arc<dyn AssetResolver>>,
    pub api_key: Arc<str>,
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/cache", get(get_cache))
        .route("/admin/message", post(post_message))
        .route("/admin/search", post(post_search))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth_middleware,
        ))
        .with_state(state)
}
