pub mod handlers;
pub mod middleware;
pub mod response;

use std::{sync::Arc, time::Duration};

use axum::{
	routing::{get, post},
	Router,
};
use tower::ServiceBuilder;
use tower_http::{
	cors::CorsLayer,
	timeout::TimeoutLayer,
	trace::TraceLayer,
};

use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
	Router::new()
		.route("/officials/:postal_code", get(handlers::get_officials_by_postal_code))
		.route("/officials", get(handlers::browse_officials))
		.route("/official/:id", get(handlers::get_official_by_id))
		.route("/officials/search", post(handlers::search_officials))
		.route("/healthz", get(handlers::healthz))
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(TimeoutLayer::new(Duration::from_secs(30)))
				.layer(CorsLayer::permissive())
				.layer(axum::middleware::from_fn(middleware::server_timing_layer)),
		)
		.with_state(state)
}
