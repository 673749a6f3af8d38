//! Read-side queries and the coordination-table accessors (spec.md §3,
//! §4.4, §4.6, §4.7, §4.8). Nothing here participates in the upsert
//! transaction; these run against the pool directly.

use chrono::{DateTime, Utc};
use civic_archive_common::DistrictType;
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::{
	database::models::{DenormalizedOfficialRow, GeofenceHit, KeyCacheRow},
	error::Result,
};

/// The denormalized-join fragment shared by every read path that returns a
/// full official row (spec.md §6 response body).
const DENORMALIZED_SELECT: &str = r#"
SELECT
    o.id AS official_id,
    o.external_id,
    o.first_name,
    o.middle_name,
    o.last_name,
    o.full_name,
    o.party,
    o.photo_url,
    off.title AS office_title,
    off.representing_state,
    off.representing_city,
    d.district_type AS district_type,
    d.label AS district_label,
    d.mtfcc AS district_mtfcc,
    d.geo_id AS district_geo_id,
    ch.name AS chamber_name,
    ch.external_id AS chamber_external_id,
    g.name AS government_name,
    COALESCE(
        (SELECT json_agg(e.email) FROM (
            SELECT o.email AS email WHERE o.email IS NOT NULL
            UNION
            SELECT c.value AS email FROM contacts c WHERE c.official_id = o.id AND c.contact_type = 'email'
        ) e),
        '[]'
    ) AS emails,
    COALESCE(
        (SELECT json_agg(json_build_object('type', i.identifier_type, 'value', i.value))
         FROM identifiers i WHERE i.official_id = o.id),
        '[]'
    ) AS identifiers,
    COALESCE(
        (SELECT json_agg(json_build_object('name', cm.name, 'position', oc.position))
         FROM official_committees oc JOIN committees cm ON cm.id = oc.committee_id
         WHERE oc.official_id = o.id),
        '[]'
    ) AS committees,
    COALESCE(
        (SELECT json_agg(json_build_object('url', im.url, 'kind', im.kind))
         FROM images im WHERE im.official_id = o.id),
        '[]'
    ) AS images
FROM officials o
JOIN offices off ON off.official_id = o.id
JOIN chambers ch ON ch.id = off.chamber_id
JOIN governments g ON g.id = ch.government_id
LEFT JOIN districts d ON d.id = off.district_id
"#;

pub async fn denormalized_by_postal_code(
	pool: &PgPool,
	postal_code: &str,
) -> Result<Vec<DenormalizedOfficialRow>> {
	let sql = format!(
		"{DENORMALIZED_SELECT} JOIN key_association ka ON ka.official_id = o.id WHERE ka.postal_code = $1 ORDER BY o.last_name, o.first_name"
	);
	Ok(sqlx::query_as::<_, DenormalizedOfficialRow>(&sql).bind(postal_code).fetch_all(pool).await?)
}

pub async fn denormalized_by_official_id(
	pool: &PgPool,
	official_id: Uuid,
) -> Result<Option<DenormalizedOfficialRow>> {
	let sql = format!("{DENORMALIZED_SELECT} WHERE o.id = $1");
	Ok(sqlx::query_as::<_, DenormalizedOfficialRow>(&sql).bind(official_id).fetch_optional(pool).await?)
}

pub async fn denormalized_by_official_ids(
	pool: &PgPool,
	official_ids: &[Uuid],
) -> Result<Vec<DenormalizedOfficialRow>> {
	if official_ids.is_empty() {
		return Ok(Vec::new());
	}
	let sql = format!("{DENORMALIZED_SELECT} WHERE o.id = ANY($1) ORDER BY o.last_name, o.first_name");
	Ok(sqlx::query_as::<_, DenormalizedOfficialRow>(&sql).bind(official_ids).fetch_all(pool).await?)
}

pub struct BrowseFilter<'a> {
	pub query: Option<&'a str>,
	pub state: Option<&'a str>,
	/// `None` means `limit=all` (spec.md §6): no `LIMIT` clause at all.
	pub limit: Option<i64>,
	pub offset: i64,
}

/// `GET /officials?q=&state=&limit=&offset=` (spec.md §4.7) — no cache
/// interaction, a plain filtered scan over the entity graph.
pub async fn browse(pool: &PgPool, filter: &BrowseFilter<'_>) -> Result<Vec<DenormalizedOfficialRow>> {
	let mut qb: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(DENORMALIZED_SELECT);
	let mut has_where = false;
	if let Some(q) = filter.query {
		qb.push(" WHERE o.full_name ILIKE ");
		qb.push_bind(format!("%{q}%"));
		has_where = true;
	}
	if let Some(state) = filter.state {
		qb.push(if has_where { " AND " } else { " WHERE " });
		qb.push("off.representing_state = ");
		qb.push_bind(state);
	}
	qb.push(" ORDER BY o.last_name, o.first_name");
	if let Some(limit) = filter.limit {
		qb.push(" LIMIT ");
		qb.push_bind(limit);
	}
	qb.push(" OFFSET ");
	qb.push_bind(filter.offset);
	Ok(qb.build_query_as::<DenormalizedOfficialRow>().fetch_all(pool).await?)
}

pub async fn key_cache_get(pool: &PgPool, postal_code: &str) -> Result<Option<KeyCacheRow>> {
	Ok(
		sqlx::query_as::<_, KeyCacheRow>("SELECT postal_code, last_fetched FROM key_cache WHERE postal_code = $1")
			.bind(postal_code)
			.fetch_optional(pool)
			.await?,
	)
}

pub async fn denormalized_row_count(pool: &PgPool, postal_code: &str) -> Result<i64> {
	let count: i64 =
		sqlx::query_scalar("SELECT count(*) FROM key_association WHERE postal_code = $1")
			.bind(postal_code)
			.fetch_one(pool)
			.await?;
	Ok(count)
}

/// Upserts `KeyAssociation(postal_code, official_id)` with `last_seen`. Called
/// once per official, immediately after its upsert commits (spec.md §4.4).
pub async fn key_association_upsert(
	pool: &PgPool,
	postal_code: &str,
	official_id: Uuid,
	last_seen: DateTime<Utc>,
) -> Result<()> {
	sqlx::query(
		"INSERT INTO key_association (postal_code, official_id, last_seen) VALUES ($1, $2, $3)
		 ON CONFLICT (postal_code, official_id) DO UPDATE SET last_seen = EXCLUDED.last_seen",
	)
	.bind(postal_code)
	.bind(official_id)
	.bind(last_seen)
	.execute(pool)
	.await?;
	Ok(())
}

/// The warm's closing transaction (spec.md §4.4): stamp `KeyCache` and sweep
/// every association not refreshed by this warm.
pub async fn finish_warm(
	pool: &PgPool,
	postal_code: &str,
	warm_start_time: DateTime<Utc>,
) -> Result<u64> {
	let mut tx = pool.begin().await?;
	sqlx::query(
		"INSERT INTO key_cache (postal_code, last_fetched) VALUES ($1, $2)
		 ON CONFLICT (postal_code) DO UPDATE SET last_fetched = EXCLUDED.last_fetched",
	)
	.bind(postal_code)
	.bind(warm_start_time)
	.execute(&mut *tx)
	.await?;
	let swept = sqlx::query(
		"DELETE FROM key_association WHERE postal_code = $1 AND last_seen < $2",
	)
	.bind(postal_code)
	.bind(warm_start_time)
	.execute(&mut *tx)
	.await?
	.rows_affected();
	tx.commit().await?;
	Ok(swept)
}

/// §4.8 — point-in-polygon hits for `(lat, lng)`, returning the geofence's
/// `geo_id`/`mtfcc` pairs. `ST_Contains` uses the GIST index on `polygon`.
pub async fn geofence_hits(pool: &PgPool, lat: f64, lng: f64) -> Result<Vec<GeofenceHit>> {
	Ok(sqlx::query_as::<_, GeofenceHit>(
		"SELECT geo_id, mtfcc FROM geofences
		 WHERE ST_Contains(polygon, ST_SetSRID(ST_MakePoint($1, $2), 4326))",
	)
	.bind(lng)
	.bind(lat)
	.fetch_all(pool)
	.await?)
}

/// Builds and runs the disjunctive politician query for a set of geofence
/// hits (spec.md §4.8): one branch per hit, MTFCC-restricted where the
/// MTFCC is in the closed mapping table, unrestricted otherwise, plus the
/// extra county→state-FIPS JUDICIAL branch.
pub async fn officials_for_geofence_hits(
	pool: &PgPool,
	hits: &[GeofenceHit],
) -> Result<Vec<DenormalizedOfficialRow>> {
	if hits.is_empty() {
		return Ok(Vec::new());
	}

	let mut qb: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(DENORMALIZED_SELECT);
	qb.push(" WHERE ");
	let mut first = true;
	for hit in hits {
		if !first {
			qb.push(" OR ");
		}
		first = false;
		qb.push("(");
		qb.push("d.geo_id = ");
		qb.push_bind(&hit.geo_id);
		if let Some(allowed) = civic_archive_common::Mtfcc::from_code(&hit.mtfcc).allowed_district_types() {
			qb.push(" AND d.district_type = ANY(");
			qb.push_bind(allowed.to_vec());
			qb.push(")");
		}
		qb.push(")");

		if hit.mtfcc == "G4020" {
			if let Some(state_fips) = hit.geo_id.get(0..2) {
				if !first {
					qb.push(" OR ");
				}
				qb.push("(d.geo_id LIKE ");
				qb.push_bind(format!("{state_fips}%"));
				qb.push(" AND d.district_type = ");
				qb.push_bind(DistrictType::Judicial);
				qb.push(")");
			}
		}
	}

	Ok(qb.build_query_as::<DenormalizedOfficialRow>().fetch_all(pool).await?)
}
