//! `POST /officials/search` geofence path (spec.md §4.8): point-in-polygon
//! lookup, then the MTFCC-disambiguated disjunctive politician query.

use sqlx::PgPool;

use crate::{database::models::DenormalizedOfficialRow, database::queries, error::Result};

pub async fn officials_at_point(pool: &PgPool, lat: f64, lng: f64) -> Result<Vec<DenormalizedOfficialRow>> {
	let hits = queries::geofence_hits(pool, lat, lng).await?;
	if hits.is_empty() {
		return Ok(Vec::new());
	}
	queries::officials_for_geofence_hits(pool, &hits).await
}
