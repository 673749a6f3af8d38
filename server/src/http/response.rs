//! JSON wire shapes returned over HTTP (spec.md §4.7, §6). Thin DTOs over
//! the denormalized DB row; never leaks surrogate IDs other than the
//! official's own (needed for `GET /official/{id}`).

use civic_archive::database::models::DenormalizedOfficialRow;
use civic_archive_common::DistrictType;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct OfficialResponse {
	pub id: Uuid,
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
	pub government_name: String,
	pub emails: Vec<String>,
	pub identifiers: Vec<IdentifierResponse>,
	pub committees: Vec<CommitteeResponse>,
	pub images: Vec<ImageResponse>,
}

#[derive(Debug, Serialize)]
pub struct IdentifierResponse {
	#[serde(rename = "type")]
	pub identifier_type: String,
	pub value: String,
}

#[derive(Debug, Serialize)]
pub struct CommitteeResponse {
	pub name: String,
	pub position: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ImageResponse {
	pub url: String,
	pub kind: Option<String>,
}

impl From<DenormalizedOfficialRow> for OfficialResponse {
	fn from(row: DenormalizedOfficialRow) -> Self {
		Self {
			id: row.official_id,
			external_id: row.external_id,
			first_name: row.first_name,
			middle_name: row.middle_name,
			last_name: row.last_name,
			full_name: row.full_name,
			party: row.party,
			photo_url: row.photo_url,
			office_title: row.office_title,
			representing_state: row.representing_state,
			representing_city: row.representing_city,
			district_type: row.district_type,
			district_label: row.district_label,
			district_mtfcc: row.district_mtfcc,
			district_geo_id: row.district_geo_id,
			chamber_name: row.chamber_name,
			government_name: row.government_name,
			emails: row.emails.0,
			identifiers: row
				.identifiers
				.0
				.into_iter()
				.map(|i| IdentifierResponse { identifier_type: i.identifier_type, value: i.value })
				.collect(),
			committees: row
				.committees
				.0
				.into_iter()
				.map(|c| CommitteeResponse { name: c.name, position: c.position })
				.collect(),
			images: row.images.0.into_iter().map(|i| ImageResponse { url: i.url, kind: i.kind }).collect(),
		}
	}
}
