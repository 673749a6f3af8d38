//! `Server-Timing` instrumentation (spec.md §4.7: "MUST be emitted with
//! numeric milliseconds for at least `dbread`, `wait`, and `total` when the
//! path exercises them"). The keyed lookup handler builds its own header
//! with `dbread`/`wait`/`total`; this layer is the fallback for every other
//! route, stamping at least `total` so the header is never entirely absent.

use std::time::Instant;

use axum::{body::Body, extract::Request, http::HeaderValue, middleware::Next, response::Response};

pub async fn server_timing_layer(request: Request<Body>, next: Next) -> Response {
	let start = Instant::now();
	let mut response = next.run(request).await;
	if !response.headers().contains_key("Server-Timing") {
		let total_ms = start.elapsed().as_secs_f64() * 1000.0;
		let value = HeaderValue::from_str(&format!("total;dur={total_ms:.1}"))
			.unwrap_or_else(|_| HeaderValue::from_static("total;dur=0"));
		response.headers_mut().insert("Server-Timing", value);
	}
	response
}
