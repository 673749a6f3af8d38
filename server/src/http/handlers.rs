//! Route handlers for the four operations in spec.md §4.7.

use std::{sync::Arc, time::Instant};

use axum::{
	extract::{Path, Query, State},
	http::{HeaderMap, HeaderValue, StatusCode},
	response::{IntoResponse, Response},
	Json,
};
use chrono::Duration as ChronoDuration;
use civic_archive::{database::queries, freshness, geofence, ArchiveError};
use civic_archive_common::PostalCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{http::response::OfficialResponse, state::AppState};

#[derive(Debug, Deserialize)]
pub struct BrowseParams {
	pub q: Option<String>,
	pub state: Option<String>,
	pub limit: Option<String>,
	pub offset: Option<i64>,
}

/// `limit=all` disables paging; otherwise default 100, hard cap 5000 (spec.md §6).
const BROWSE_DEFAULT_LIMIT: i64 = 100;
const BROWSE_MAX_LIMIT: i64 = 5000;

fn parse_browse_limit(raw: Option<&str>) -> Option<i64> {
	match raw {
		Some("all") => None,
		Some(s) => Some(s.parse::<i64>().unwrap_or(BROWSE_DEFAULT_LIMIT).clamp(1, BROWSE_MAX_LIMIT)),
		None => Some(BROWSE_DEFAULT_LIMIT),
	}
}

#[derive(Debug, Deserialize)]
pub struct SearchBody {
	pub lat: f64,
	pub lng: f64,
}

#[derive(Debug, Serialize)]
pub struct WarmingBody {
	pub status: &'static str,
}

const BLOCK_POLL_BUDGET_MS: u64 = 2000;
const BLOCK_POLL_TICK_MS: u64 = 200;

/// `GET /officials/{postal-code}` — the keyed, classified, cache-coordinating path.
pub async fn get_officials_by_postal_code(
	State(state): State<Arc<AppState>>,
	Path(postal_code): Path<String>,
) -> Response {
	let postal_code = match PostalCode::parse(&postal_code) {
		Ok(pc) => pc,
		Err(_) => return (StatusCode::BAD_REQUEST, "postal code must match ^\\d{5}$").into_response(),
	};

	let request_start = Instant::now();
	let db_start = Instant::now();
	let cache_row = match queries::key_cache_get(state.db.pool(), postal_code.as_str()).await {
		Ok(row) => row,
		Err(e) => return internal_error(e),
	};
	let row_count = match queries::denormalized_row_count(state.db.pool(), postal_code.as_str()).await {
		Ok(count) => count,
		Err(e) => return internal_error(e),
	};
	let dbread = db_start.elapsed();

	let max_age = ChronoDuration::days(state.config.max_age_days);
	let classification = freshness::classify(
		cache_row.map(|r| r.last_fetched),
		row_count,
		max_age,
		chrono::Utc::now(),
	);

	match classification {
		freshness::Freshness::Fresh => {
			let rows = match queries::denormalized_by_postal_code(state.db.pool(), postal_code.as_str()).await {
				Ok(rows) => rows,
				Err(e) => return internal_error(e),
			};
			respond_rows(rows, "fresh", cache_control_fresh(), dbread, request_start.elapsed())
		}
		freshness::Freshness::StaleButPresent => {
			state.warmer_pool.kick(postal_code.clone());
			let rows = match queries::denormalized_by_postal_code(state.db.pool(), postal_code.as_str()).await {
				Ok(rows) => rows,
				Err(e) => return internal_error(e),
			};
			respond_rows(rows, "stale", cache_control_stale(), dbread, request_start.elapsed())
		}
		freshness::Freshness::Cold => {
			state.warmer_pool.kick(postal_code.clone());
			block_poll_for_cold_key(&state, &postal_code, dbread, request_start).await
		}
	}
}

async fn block_poll_for_cold_key(
	state: &Arc<AppState>,
	postal_code: &PostalCode,
	dbread_first: std::time::Duration,
	request_start: Instant,
) -> Response {
	let poll_start = Instant::now();
	let budget = std::time::Duration::from_millis(BLOCK_POLL_BUDGET_MS);
	let tick = std::time::Duration::from_millis(BLOCK_POLL_TICK_MS);

	loop {
		let rows = match queries::denormalized_by_postal_code(state.db.pool(), postal_code.as_str()).await {
			Ok(rows) => rows,
			Err(e) => return internal_error(e),
		};
		if !rows.is_empty() {
			return respond_rows_with_wait(
				rows,
				"warmed",
				cache_control_fresh(),
				dbread_first,
				Some(poll_start.elapsed()),
				request_start.elapsed(),
			);
		}
		if poll_start.elapsed() >= budget {
			let mut headers = HeaderMap::new();
			headers.insert("X-Data-Status", HeaderValue::from_static("warming"));
			headers.insert("Cache-Control", HeaderValue::from_static("no-store"));
			headers.insert("Retry-After", HeaderValue::from_static("3"));
			return (StatusCode::ACCEPTED, headers, Json(WarmingBody { status: "warming" })).into_response();
		}
		tokio::time::sleep(tick).await;
	}
}

fn respond_rows(
	rows: Vec<civic_archive::database::models::DenormalizedOfficialRow>,
	status: &'static str,
	cache_control: &'static str,
	dbread: std::time::Duration,
	total: std::time::Duration,
) -> Response {
	respond_rows_with_wait(rows, status, cache_control, dbread, None, total)
}

fn respond_rows_with_wait(
	rows: Vec<civic_archive::database::models::DenormalizedOfficialRow>,
	status: &'static str,
	cache_control: &'static str,
	dbread: std::time::Duration,
	wait: Option<std::time::Duration>,
	total: std::time::Duration,
) -> Response {
	let body: Vec<OfficialResponse> = rows.into_iter().map(OfficialResponse::from).collect();
	let mut headers = HeaderMap::new();
	headers.insert("X-Data-Status", HeaderValue::from_static(status));
	headers.insert("Cache-Control", HeaderValue::from_static(cache_control));
	let mut server_timing = format!("dbread;dur={:.1}", dbread.as_secs_f64() * 1000.0);
	if let Some(wait) = wait {
		server_timing.push_str(&format!(", wait;dur={:.1}", wait.as_secs_f64() * 1000.0));
	}
	server_timing.push_str(&format!(", total;dur={:.1}", total.as_secs_f64() * 1000.0));
	headers.insert(
		"Server-Timing",
		HeaderValue::from_str(&server_timing).unwrap_or_else(|_| HeaderValue::from_static("total;dur=0")),
	);
	(StatusCode::OK, headers, Json(body)).into_response()
}

fn cache_control_fresh() -> &'static str {
	"public, max-age=3600, stale-while-revalidate=86400"
}

fn cache_control_stale() -> &'static str {
	"public, max-age=60, stale-while-revalidate=86400"
}

/// `GET /officials?q=&state=&limit=&offset=` — no cache interaction.
pub async fn browse_officials(
	State(state): State<Arc<AppState>>,
	Query(params): Query<BrowseParams>,
) -> Response {
	let filter = queries::BrowseFilter {
		query: params.q.as_deref(),
		state: params.state.as_deref(),
		limit: parse_browse_limit(params.limit.as_deref()),
		offset: params.offset.unwrap_or(0).max(0),
	};
	match queries::browse(state.db.pool(), &filter).await {
		Ok(rows) => {
			let body: Vec<OfficialResponse> = rows.into_iter().map(OfficialResponse::from).collect();
			Json(body).into_response()
		}
		Err(e) => internal_error(e),
	}
}

/// `GET /official/{id}` — 404 on unknown (spec.md §6).
pub async fn get_official_by_id(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Response {
	match queries::denormalized_by_official_id(state.db.pool(), id).await {
		Ok(Some(row)) => Json(OfficialResponse::from(row)).into_response(),
		Ok(None) => StatusCode::NOT_FOUND.into_response(),
		Err(e) => internal_error(e),
	}
}

/// `POST /officials/search {query}` — the geofence path (spec.md §4.8). The
/// geocoding step that turns free text into `(lat, lng)` is external to
/// this service; callers already hold coordinates by the time they reach
/// this endpoint.
pub async fn search_officials(State(state): State<Arc<AppState>>, Json(body): Json<SearchBody>) -> Response {
	match geofence::officials_at_point(state.db.pool(), body.lat, body.lng).await {
		Ok(rows) => {
			let body: Vec<OfficialResponse> = rows.into_iter().map(OfficialResponse::from).collect();
			let mut headers = HeaderMap::new();
			headers.insert("X-Data-Status", HeaderValue::from_static("fresh-local"));
			(StatusCode::OK, headers, Json(body)).into_response()
		}
		Err(e) => internal_error(e),
	}
}

pub async fn healthz(State(state): State<Arc<AppState>>) -> Response {
	match sqlx::query("SELECT 1").execute(state.db.pool()).await {
		Ok(_) => (StatusCode::OK, "ok").into_response(),
		Err(_) => (StatusCode::SERVICE_UNAVAILABLE, "db unreachable").into_response(),
	}
}

#[derive(Debug, Serialize)]
struct ProblemBody {
	error: &'static str,
	message: String,
}

/// Maps a synchronous `ArchiveError` to an HTTP status + JSON problem body
/// (spec.md §7: "the request path surfaces only its own synchronous
/// errors"). Everything that reaches here is by construction a `fatal`
/// error kind — the front-end never awaits a warmer's result, only its
/// progress, so warmer-side error kinds (rate-limited, transform, etc.)
/// never surface through this path.
fn internal_error(e: ArchiveError) -> Response {
	tracing::error!(error = %e, "request failed");
	let body = ProblemBody { error: "internal_error", message: e.to_string() };
	(StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}
