//! REST paginator adapter (spec.md §4.1). Offset/`max` pagination: a page
//! shorter than the requested page size ends the sequence, a full page
//! forces another round-trip.

use async_trait::async_trait;
use civic_archive_common::DistrictType;
use serde::Deserialize;

use crate::{
	error::{map_transport_err, ProviderError, Result},
	normalized::*,
	provider::Provider,
};

const PAGE_SIZE: u32 = 50;
const BASE_URL: &str = "https://cicero.example.com/v3.1";

pub struct CiceroProvider {
	client: reqwest::Client,
	api_key: String,
	base_url: String,
}

impl CiceroProvider {
	pub fn new(api_key: String) -> Self {
		Self::with_base_url(api_key, BASE_URL.to_string())
	}

	pub fn with_base_url(api_key: String, base_url: String) -> Self {
		Self { client: reqwest::Client::new(), api_key, base_url }
	}

	async fn fetch_page(&self, search_loc: &str, offset: u32) -> Result<CiceroEnvelope> {
		let resp = self
			.client
			.get(format!("{}/official", self.base_url))
			.query(&[
				("key", self.api_key.as_str()),
				("search_loc", search_loc),
				("format", "json"),
				("max", &PAGE_SIZE.to_string()),
				("offset", &offset.to_string()),
			])
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
			return Err(ProviderError::UpstreamUnavailable(format!("cicero returned {}", resp.status())));
		}

		resp.json::<CiceroEnvelope>().await.map_err(map_transport_err)
	}

	async fn fetch_all(&self, search_loc: &str) -> Result<Vec<NormalizedOfficial>> {
		let mut offset = 0;
		let mut out = Vec::new();
		loop {
			let page = self.fetch_page(search_loc, offset).await?;
			let n = page.response.results.officials.len() as u32;
			for raw in page.response.results.officials {
				match raw.try_into_normalized() {
					Ok(official) => out.push(official),
					Err(e) => tracing::warn!(error = %e, "skipping malformed cicero record"),
				}
			}
			if n < PAGE_SIZE {
				break;
			}
			offset += PAGE_SIZE;
		}
		Ok(out)
	}
}

#[async_trait]
impl Provider for CiceroProvider {
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
		self.client
			.get(format!("{}/official", self.base_url))
			.query(&[("key", self.api_key.as_str()), ("max", "1")])
			.send()
			.await
			.map_err(map_transport_err)?;
		Ok(())
	}
}

#[derive(Debug, Deserialize)]
struct CiceroEnvelope {
	response: CiceroResponseBody,
}

#[derive(Debug, Deserialize)]
struct CiceroResponseBody {
	results: CiceroResults,
}

#[derive(Debug, Deserialize)]
struct CiceroResults {
	officials: Vec<CiceroOfficial>,
}

#[derive(Debug, Deserialize)]
struct CiceroOfficial {
	id: i64,
	first_name: String,
	middle_initial: Option<String>,
	last_name: String,
	party: Option<String>,
	email: Option<String>,
	photo_origin_url: Option<String>,
	office: CiceroOffice,
	addresses: Vec<CiceroAddress>,
	identifiers: Vec<CiceroIdentifier>,
	committees: Vec<CiceroCommittee>,
}

#[derive(Debug, Deserialize)]
struct CiceroOffice {
	title: String,
	representing_state: Option<String>,
	representing_city: Option<String>,
	chamber: CiceroChamber,
	district: Option<CiceroDistrict>,
}

#[derive(Debug, Deserialize)]
struct CiceroChamber {
	id: i64,
	name: String,
	term_length: Option<i32>,
	election_frequency: Option<i32>,
	government: CiceroGovernment,
}

#[derive(Debug, Deserialize)]
struct CiceroGovernment {
	name: String,
	#[serde(rename = "type")]
	government_type: String,
	state: Option<String>,
	city: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CiceroDistrict {
	id: i64,
	ocd_id: Option<String>,
	label: String,
	district_type: String,
	geo_id: Option<String>,
	mtfcc: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CiceroAddress {
	address_type: String,
	address_1: String,
	address_2: Option<String>,
	city: Option<String>,
	state: Option<String>,
	postal_code: Option<String>,
	phone_1: Option<String>,
	fax_1: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CiceroIdentifier {
	identifier_type: String,
	identifier_value: String,
}

#[derive(Debug, Deserialize)]
struct CiceroCommittee {
	name: String,
	position: Option<String>,
}

impl CiceroOfficial {
	fn try_into_normalized(self) -> std::result::Result<NormalizedOfficial, String> {
		let district_type = cicero_district_type(&self.office.district)?;
		Ok(NormalizedOfficial {
			external_id: self.id.to_string(),
			first_name: self.first_name,
			middle_name: self.middle_initial,
			last_name: self.last_name,
			party: self.party,
			email: self.email,
			photo_url: self.photo_origin_url,
			office: NormalizedOffice {
				title: self.office.title,
				representing_state: self.office.representing_state,
				representing_city: self.office.representing_city,
				chamber: NormalizedChamber {
					external_id: self.office.chamber.id.to_string(),
					name: self.office.chamber.name,
					term_length_years: self.office.chamber.term_length,
					election_frequency_years: self.office.chamber.election_frequency,
					government: NormalizedGovernment {
						name: self.office.chamber.government.name,
						government_type: self.office.chamber.government.government_type,
						state: self.office.chamber.government.state,
						city: self.office.chamber.government.city,
					},
				},
				district: self.office.district.map(|d| NormalizedDistrict {
					external_id: d.id.to_string(),
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
					line1: a.address_1,
					line2: a.address_2,
					city: a.city,
					state: a.state,
					postal_code: a.postal_code,
					phone: a.phone_1,
					fax: a.fax_1,
				})
				.collect(),
			identifiers: self
				.identifiers
				.into_iter()
				.map(|i| NormalizedIdentifier { identifier_type: i.identifier_type, value: i.identifier_value })
				.collect(),
			committees: self
				.committees
				.into_iter()
				.map(|c| NormalizedCommitteeMembership { committee_name: c.name, position: c.position })
				.collect(),
			images: Vec::new(),
			degrees: Vec::new(),
			experiences: Vec::new(),
			contacts: Vec::new(),
		})
	}
}

fn cicero_district_type(district: &Option<CiceroDistrict>) -> std::result::Result<DistrictType, String> {
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
		other => Err(format!("unknown cicero district_type {other:?}")),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use wiremock::{
		matchers::{method, path},
		Mock, MockServer, ResponseTemplate,
	};

	fn sample_official(id: i64) -> serde_json::Value {
		serde_json::json!({
			"id": id,
			"first_name": "Pat",
			"middle_initial": "Q",
			"last_name": "Example",
			"party": "Independent",
			"email": null,
			"photo_origin_url": null,
			"office": {
				"title": "State Senator",
				"representing_state": "IN",
				"representing_city": null,
				"chamber": {
					"id": 1,
					"name": "Indiana Senate",
					"term_length": 4,
					"election_frequency": 4,
					"government": { "name": "Indiana", "type": "state", "state": "IN", "city": null }
				},
				"district": {
					"id": 100,
					"ocd_id": "ocd-division/country:us/state:in/sldu:40",
					"label": "District 40",
					"district_type": "STATE_UPPER",
					"geo_id": "18046",
					"mtfcc": "G5210"
				}
			},
			"addresses": [],
			"identifiers": [],
			"committees": []
		})
	}

	#[tokio::test]
	async fn exhausts_pagination_across_full_and_short_pages() {
		let server = MockServer::start().await;
		let full_page: Vec<_> = (0..PAGE_SIZE).map(|i| sample_official(i as i64)).collect();
		let short_page = vec![sample_official(1000)];

		Mock::given(method("GET"))
			.and(path("/official"))
			.and(wiremock::matchers::query_param("offset", "0"))
			.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
				"response": { "results": { "officials": full_page } }
			})))
			.mount(&server)
			.await;

		Mock::given(method("GET"))
			.and(path("/official"))
			.and(wiremock::matchers::query_param("offset", PAGE_SIZE.to_string()))
			.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
				"response": { "results": { "officials": short_page } }
			})))
			.mount(&server)
			.await;

		let provider = CiceroProvider::with_base_url("key".into(), server.uri());
		let result = provider.fetch_by_key("47401", None).await.unwrap();
		assert_eq!(result.len(), PAGE_SIZE as usize + 1);
	}

	#[tokio::test]
	async fn rate_limit_surfaces_as_typed_error_not_empty_slice() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/official"))
			.respond_with(ResponseTemplate::new(429))
			.mount(&server)
			.await;

		let provider = CiceroProvider::with_base_url("key".into(), server.uri());
		let err = provider.fetch_by_key("47401", None).await.unwrap_err();
		assert!(matches!(err, ProviderError::RateLimited));
	}
}
