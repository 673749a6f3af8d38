//! GraphQL paginator adapter (spec.md §4.1). Relay-style cursor pagination:
//! a page without `hasNextPage` ends the sequence, otherwise the next round
//! passes `endCursor` as `after`.

use async_trait::async_trait;
use civic_archive_common::DistrictType;
use serde::Deserialize;
use serde_json::json;

use crate::{
	error::{map_transport_err, ProviderError, Result},
	normalized::*,
	provider::Provider,
};

const PAGE_SIZE: u32 = 50;
const BASE_URL: &str = "https://ballotready.example.com/graphql";

const OFFICIALS_QUERY: &str = r#"
query Officials($zip: String!, $after: String) {
  officialsByZip(zip: $zip, first: 50, after: $after) {
    pageInfo { hasNextPage endCursor }
    nodes {
      id firstName middleName lastName party email photoUrl
      office {
        title representingState representingCity
        chamber {
          id name termLengthYears electionFrequencyYears
          government { name type state city }
        }
        district { id ocdId label districtType geoId mtfcc }
      }
      addresses { addressType line1 line2 city state postalCode phone fax }
      identifiers { identifierType value }
      committees { name position }
      images { url kind }
      degrees { institution field graduationYear }
      experiences { organization title startYear endYear }
      contacts { contactType value }
    }
  }
}
"#;

pub struct BallotReadyProvider {
	client: reqwest::Client,
	api_key: String,
	base_url: String,
}

impl BallotReadyProvider {
	pub fn new(api_key: String) -> Self {
		Self::with_base_url(api_key, BASE_URL.to_string())
	}

	pub fn with_base_url(api_key: String, base_url: String) -> Self {
		Self { client: reqwest::Client::new(), api_key, base_url }
	}

	async fn fetch_page(&self, zip: &str, after: Option<&str>) -> Result<OfficialsConnection> {
		let resp = self
			.client
			.post(&self.base_url)
			.bearer_auth(&self.api_key)
			.json(&json!({ "query": OFFICIALS_QUERY, "variables": { "zip": zip, "after": after } }))
			.send()
			.await
			.map_err(map_transport_err)?;

		if resp.status().as_u16() == 429 {
			return Err(ProviderError::RateLimited);
		}
		if resp.status().as_u16() == 401 || resp.status().as_u16() == 403 {
			return Err(ProviderError::Auth);
		}
		if !resp.status().is_success() {
			return Err(ProviderError::UpstreamUnavailable(format!("ballotready returned {}", resp.status())));
		}

		let envelope: GraphQlEnvelope = resp.json().await.map_err(map_transport_err)?;
		if let Some(errors) = envelope.errors {
			if !errors.is_empty() {
				return Err(ProviderError::UpstreamUnavailable(errors[0].message.clone()));
			}
		}
		envelope
			.data
			.map(|d| d.officials_by_zip)
			.ok_or_else(|| ProviderError::Transform("missing data in GraphQL response".into()))
	}

	async fn fetch_all(&self, zip: &str) -> Result<Vec<NormalizedOfficial>> {
		let mut cursor: Option<String> = None;
		let mut out = Vec::new();
		loop {
			let page = self.fetch_page(zip, cursor.as_deref()).await?;
			for raw in page.nodes {
				match raw.try_into_normalized() {
					Ok(official) => out.push(official),
					Err(e) => tracing::warn!(error = %e, "skipping malformed ballotready record"),
				}
			}
			if !page.page_info.has_next_page {
				break;
			}
			cursor = page.page_info.end_cursor;
			if cursor.is_none() {
				break;
			}
		}
		Ok(out)
	}
}

#[async_trait]
impl Provider for BallotReadyProvider {
	async fn fetch_by_key(
		&self,
		postal_code: &str,
		district_type_filter: Option<&[DistrictType]>,
	) -> Result<Vec<NormalizedOfficial>> {
		let mut officials = self.fetch_all(postal_code).await?;
		if let Some(allowed) = district_type_filter {
			officials.retain(|o| {
				o.office.district.as_ref().map(|d| allowed.contains(&d.district_type)).unwrap_or(true)
			});
		}
		Ok(officials)
	}

	async fn fetch_federal(&self) -> Result<Vec<NormalizedOfficial>> {
		let mut officials = self.fetch_all("00000").await?;
		officials.retain(|o| {
			matches!(
				o.office.district.as_ref().map(|d| d.district_type),
				Some(DistrictType::NationalExec) | Some(DistrictType::NationalUpper) | Some(DistrictType::NationalLower)
			)
		});
		Ok(officials)
	}

	async fn fetch_by_state(&self, _state: &str, sample_postal_code: &str) -> Result<Vec<NormalizedOfficial>> {
		self.fetch_all(sample_postal_code).await
	}

	async fn health_check(&self) -> Result<()> {
		self.fetch_page("00000", None).await.map(|_| ())
	}
}

#[derive(Debug, Deserialize)]
struct GraphQlEnvelope {
	data: Option<GraphQlData>,
	errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
	message: String,
}

#[derive(Debug, Deserialize)]
struct GraphQlData {
	#[serde(rename = "officialsByZip")]
	officials_by_zip: OfficialsConnection,
}

#[derive(Debug, Deserialize)]
struct OfficialsConnection {
	#[serde(rename = "pageInfo")]
	page_info: PageInfo,
	nodes: Vec<BallotReadyOfficial>,
}

#[derive(Debug, Deserialize)]
struct PageInfo {
	#[serde(rename = "hasNextPage")]
	has_next_page: bool,
	#[serde(rename = "endCursor")]
	end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BallotReadyOfficial {
	id: String,
	#[serde(rename = "firstName")]
	first_name: String,
	#[serde(rename = "middleName")]
	middle_name: Option<String>,
	#[serde(rename = "lastName")]
	last_name: String,
	party: Option<String>,
	email: Option<String>,
	#[serde(rename = "photoUrl")]
	photo_url: Option<String>,
	office: BrOffice,
	addresses: Vec<BrAddress>,
	identifiers: Vec<BrIdentifier>,
	committees: Vec<BrCommittee>,
	images: Vec<BrImage>,
	degrees: Vec<BrDegree>,
	experiences: Vec<BrExperience>,
	contacts: Vec<BrContact>,
}

#[derive(Debug, Deserialize)]
struct BrOffice {
	title: String,
	#[serde(rename = "representingState")]
	representing_state: Option<String>,
	#[serde(rename = "representingCity")]
	representing_city: Option<String>,
	chamber: BrChamber,
	district: Option<BrDistrict>,
}

#[derive(Debug, Deserialize)]
struct BrChamber {
	id: String,
	name: String,
	#[serde(rename = "termLengthYears")]
	term_length_years: Option<i32>,
	#[serde(rename = "electionFrequencyYears")]
	election_frequency_years: Option<i32>,
	government: BrGovernment,
}

#[derive(Debug, Deserialize)]
struct BrGovernment {
	name: String,
	#[serde(rename = "type")]
	government_type: String,
	state: Option<String>,
	city: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BrDistrict {
	id: String,
	#[serde(rename = "ocdId")]
	ocd_id: Option<String>,
	label: String,
	#[serde(rename = "districtType")]
	district_type: String,
	#[serde(rename = "geoId")]
	geo_id: Option<String>,
	mtfcc: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BrAddress {
	#[serde(rename = "addressType")]
	address_type: String,
	line1: String,
	line2: Option<String>,
	city: Option<String>,
	state: Option<String>,
	#[serde(rename = "postalCode")]
	postal_code: Option<String>,
	phone: Option<String>,
	fax: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BrIdentifier {
	#[serde(rename = "identifierType")]
	identifier_type: String,
	value: String,
}

#[derive(Debug, Deserialize)]
struct BrCommittee {
	name: String,
	position: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BrImage {
	url: String,
	kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BrDegree {
	institution: String,
	field: Option<String>,
	#[serde(rename = "graduationYear")]
	graduation_year: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct BrExperience {
	organization: String,
	title: Option<String>,
	#[serde(rename = "startYear")]
	start_year: Option<i32>,
	#[serde(rename = "endYear")]
	end_year: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct BrContact {
	#[serde(rename = "contactType")]
	contact_type: String,
	value: String,
}

impl BallotReadyOfficial {
	fn try_into_normalized(self) -> std::result::Result<NormalizedOfficial, String> {
		let district_type = ballotready_district_type(&self.office.district)?;
		Ok(NormalizedOfficial {
			external_id: self.id,
			first_name: self.first_name,
			middle_name: self.middle_name,
			last_name: self.last_name,
			party: self.party,
			email: self.email,
			photo_url: self.photo_url,
			office: NormalizedOffice {
				title: self.office.title,
				representing_state: self.office.representing_state,
				representing_city: self.office.representing_city,
				chamber: NormalizedChamber {
					external_id: self.office.chamber.id,
					name: self.office.chamber.name,
					term_length_years: self.office.chamber.term_length_years,
					election_frequency_years: self.office.chamber.election_frequency_years,
					government: NormalizedGovernment {
						name: self.office.chamber.government.name,
						government_type: self.office.chamber.government.government_type,
						state: self.office.chamber.government.state,
						city: self.office.chamber.government.city,
					},
				},
				district: self.office.district.map(|d| NormalizedDistrict {
					external_id: d.id,
					ocd_id: d.ocd_id,
					label: d.label,
					district_type,
					geo_id: d.geo_id,
					mtfcc: d.mtfcc,
				}),
			},
			addresses: self
				.addresses
				.into_iter()
				.map(|a| NormalizedAddress {
					address_type: a.address_type,
					line1: a.line1,
					line2: a.line2,
					city: a.city,
					state: a.state,
					postal_code: a.postal_code,
					phone: a.phone,
					fax: a.fax,
				})
				.collect(),
			identifiers: self
				.identifiers
				.into_iter()
				.map(|i| NormalizedIdentifier { identifier_type: i.identifier_type, value: i.value })
				.collect(),
			committees: self
				.committees
				.into_iter()
				.map(|c| NormalizedCommitteeMembership { committee_name: c.name, position: c.position })
				.collect(),
			images: self.images.into_iter().map(|i| NormalizedImage { url: i.url, kind: i.kind }).collect(),
			degrees: self
				.degrees
				.into_iter()
				.map(|d| NormalizedDegree {
					institution: d.institution,
					field: d.field,
					graduation_year: d.graduation_year,
				})
				.collect(),
			experiences: self
				.experiences
				.into_iter()
				.map(|e| NormalizedExperience {
					organization: e.organization,
					title: e.title,
					start_year: e.start_year,
					end_year: e.end_year,
				})
				.collect(),
			contacts: self
				.contacts
				.into_iter()
				.map(|c| NormalizedContact { contact_type: c.contact_type, value: c.value })
				.collect(),
		})
	}
}

fn ballotready_district_type(district: &Option<BrDistrict>) -> std::result::Result<DistrictType, String> {
	let Some(district) = district else {
		return Ok(DistrictType::NationalExec);
	};
	match district.district_type.as_str() {
		"NATIONAL_EXEC" => Ok(DistrictType::NationalExec),
		"NATIONAL_UPPER" => Ok(DistrictType::NationalUpper),
		"NATIONAL_LOWER" => Ok(DistrictType::NationalLower),
		"STATE_EXEC" => Ok(DistrictType::StateExec),
		"STATE_UPPER" => Ok(DistrictType::StateUpper),
		"STATE_LOWER" => Ok(DistrictType::StateLower),
		"LOCAL_EXEC" => Ok(DistrictType::LocalExec),
		"LOCAL" => Ok(DistrictType::Local),
		"COUNTY" => Ok(DistrictType::County),
		"SCHOOL" => Ok(DistrictType::School),
		"JUDICIAL" => Ok(DistrictType::Judicial),
		other => Err(format!("unknown ballotready districtType {other:?}")),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use wiremock::{
		matchers::{body_string_contains, method},
		Mock, MockServer, ResponseTemplate,
	};

	fn node(id: &str) -> serde_json::Value {
		json!({
			"id": id, "firstName": "Pat", "middleName": null, "lastName": "Example",
			"party": "Independent", "email": null, "photoUrl": null,
			"office": {
				"title": "US Representative", "representingState": "IN", "representingCity": null,
				"chamber": {
					"id": "c1", "name": "US House", "termLengthYears": 2, "electionFrequencyYears": 2,
					"government": { "name": "United States", "type": "national", "state": null, "city": null }
				},
				"district": null
			},
			"addresses": [], "identifiers": [], "committees": [], "images": [], "degrees": [],
			"experiences": [], "contacts": []
		})
	}

	#[tokio::test]
	async fn follows_relay_cursor_until_has_next_page_is_false() {
		let server = MockServer::start().await;

		Mock::given(method("POST"))
			.and(body_string_contains("\"after\":null"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"data": { "officialsByZip": {
					"pageInfo": { "hasNextPage": true, "endCursor": "cursor-1" },
					"nodes": [node("1")]
				}}
			})))
			.mount(&server)
			.await;

		Mock::given(method("POST"))
			.and(body_string_contains("cursor-1"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"data": { "officialsByZip": {
					"pageInfo": { "hasNextPage": false, "endCursor": null },
					"nodes": [node("2")]
				}}
			})))
			.mount(&server)
			.await;

		let provider = BallotReadyProvider::with_base_url("key".into(), server.uri());
		let result = provider.fetch_by_key("47401", None).await.unwrap();
		assert_eq!(result.len(), 2);
	}

	#[tokio::test]
	async fn graphql_errors_surface_as_upstream_unavailable() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"errors": [{ "message": "zip not found" }]
			})))
			.mount(&server)
			.await;

		let provider = BallotReadyProvider::with_base_url("key".into(), server.uri());
		let err = provider.fetch_by_key("00000", None).await.unwrap_err();
		assert!(matches!(err, ProviderError::UpstreamUnavailable(_)));
	}
}
