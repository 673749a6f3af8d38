//! Direct database-row representations (spec.md §3). These mirror the
//! tables in `migrations/0001_init.sql`; `queries.rs` and `upsert.rs` are
//! the only modules that should construct or consume them directly.

use chrono::{DateTime, Utc};
use civic_archive_common::DistrictType;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GovernmentRow {
	pub id: Uuid,
	pub name: String,
	pub government_type: String,
	pub state: Option<String>,
	pub city: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChamberRow {
	pub id: Uuid,
	pub external_id: String,
	pub government_id: Uuid,
	pub name: String,
	pub term_length_years: Option<i32>,
	pub election_frequency_years: Option<i32>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DistrictRow {
	pub id: Uuid,
	pub external_id: String,
	pub ocd_id: Option<String>,
	pub label: String,
	pub district_type: DistrictType,
	pub geo_id: Option<String>,
	pub mtfcc: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OfficialRow {
	pub id: Uuid,
	pub external_id: String,
	pub first_name: String,
	pub middle_name: Option<String>,
	pub last_name: String,
	pub full_name: String,
	pub party: Option<String>,
	pub email: Option<String>,
	pub photo_url: Option<String>,
	pub last_synced: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct KeyCacheRow {
	pub postal_code: String,
	pub last_fetched: DateTime<Utc>,
}

/// One row of a geofence point-in-polygon hit (spec.md §4.8): the shared
/// `geo_id` that joins to a district, and the polygon's MTFCC code.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GeofenceHit {
	pub geo_id: String,
	pub mtfcc: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifierJson {
	#[serde(rename = "type")]
	pub identifier_type: String,
	pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitteeMembershipJson {
	pub name: String,
	pub position: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageJson {
	pub url: String,
	pub kind: Option<String>,
}

/// One fully denormalized row as returned to clients (spec.md §6 "Response
/// body"). Derived exclusively from the entity graph at read time via a
/// single joined query with `json_agg` for the child collections.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DenormalizedOfficialRow {
	pub official_id: Uuid,
	pub external_id: String,
	pub first_name: String,
	pub middle_name: Option<String>,
	pub last_name: String,
	pub full_name: String,
	pub party: Option<String>,
	pub photo_url: Option<String>,
	pub office_title: String,
	pub representing_state: Option<String>,
	pub representing_city: Option<String>,
	pub district_type: Option<DistrictType>,
	pub district_label: Option<String>,
	pub district_mtfcc: Option<String>,
	pub district_geo_id: Option<String>,
	pub chamber_name: String,
	pub chamber_external_id: String,
	pub government_name: String,
	pub emails: Json<Vec<String>>,
	pub identifiers: Json<Vec<IdentifierJson>>,
	pub committees: Json<Vec<CommitteeMembershipJson>>,
	pub images: Json<Vec<ImageJson>>,
}
