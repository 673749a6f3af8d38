//! Maps one [`NormalizedOfficial`] into the DB-shaped bundle the upsert
//! engine applies (spec.md §4.2). Pure and deterministic: no DB access, no
//! wall-clock reads. The "omit if unchanged" optimization needs the
//! *existing* rows, so the caller (the upsert engine, which already holds
//! them from its point lookups) passes them in via [`Existing`].

use civic_archive_common::DistrictType;
use civic_archive_providers::{
	ExternalId, NormalizedAddress, NormalizedCommitteeMembership, NormalizedContact,
	NormalizedDegree, NormalizedExperience, NormalizedIdentifier, NormalizedImage, NormalizedOfficial,
};

use crate::database::models::{ChamberRow, DistrictRow, GovernmentRow, OfficialRow};

#[derive(Clone, Debug, PartialEq)]
pub struct DistrictUpsert {
	pub external_id: ExternalId,
	pub ocd_id: Option<String>,
	pub label: String,
	pub district_type: DistrictType,
	pub geo_id: Option<String>,
	pub mtfcc: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GovernmentUpsert {
	pub name: String,
	pub government_type: String,
	pub state: Option<String>,
	pub city: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChamberUpsert {
	pub external_id: ExternalId,
	pub name: String,
	pub term_length_years: Option<i32>,
	pub election_frequency_years: Option<i32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OfficialUpsert {
	pub external_id: ExternalId,
	pub first_name: String,
	pub middle_name: Option<String>,
	pub last_name: String,
	pub full_name: String,
	pub party: Option<String>,
	pub email: Option<String>,
	pub photo_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OfficeUpsert {
	pub title: String,
	pub representing_state: Option<String>,
	pub representing_city: Option<String>,
}

#[derive(Clone, Debug)]
pub struct CommitteeUpsert {
	/// Lowercased-trimmed canonical name; also the identity used for dedup.
	pub canonical_name: String,
	/// Original-cased name, used only when the committee row is first created.
	pub display_name: String,
}

#[derive(Clone, Debug)]
pub struct OfficialCommitteeJoin {
	pub canonical_committee_name: String,
	pub position: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct AddressRow {
	pub address_type: String,
	pub line1: String,
	pub line2: Option<String>,
	pub city: Option<String>,
	pub state: Option<String>,
	pub postal_code: Option<String>,
	pub phone: Option<String>,
	pub fax: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct IdentifierRow {
	pub identifier_type: String,
	pub value: String,
}

#[derive(Clone, Debug, Default)]
pub struct ImageRow {
	pub url: String,
	pub kind: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct DegreeRow {
	pub institution: String,
	pub field: Option<String>,
	pub graduation_year: Option<i32>,
}

#[derive(Clone, Debug, Default)]
pub struct ExperienceRow {
	pub organization: String,
	pub title: Option<String>,
	pub start_year: Option<i32>,
	pub end_year: Option<i32>,
}

#[derive(Clone, Debug, Default)]
pub struct ContactRow {
	pub contact_type: String,
	pub value: String,
}

/// The parent rows currently in the DB for this official's graph, if any.
/// Looked up by the upsert engine before calling [`transform`] so the
/// "omit if unchanged" comparison has something to compare against.
#[derive(Clone, Debug, Default)]
pub struct Existing {
	pub district: Option<DistrictRow>,
	pub government: Option<GovernmentRow>,
	pub chamber: Option<ChamberRow>,
	pub official: Option<OfficialRow>,
}

pub struct TransformResult {
	pub official_external_id: ExternalId,
	pub official: Option<OfficialUpsert>,
	pub office: OfficeUpsert,
	pub chamber_external_id: ExternalId,
	pub chamber: Option<ChamberUpsert>,
	pub government: Option<GovernmentUpsert>,
	pub district_external_id: Option<ExternalId>,
	pub district: Option<DistrictUpsert>,
	pub committees: Vec<CommitteeUpsert>,
	pub joins: Vec<OfficialCommitteeJoin>,
	pub addresses: Vec<AddressRow>,
	pub identifiers: Vec<IdentifierRow>,
	pub images: Vec<ImageRow>,
	pub degrees: Vec<DegreeRow>,
	pub experiences: Vec<ExperienceRow>,
	pub contacts: Vec<ContactRow>,
}

pub fn transform(normalized: &NormalizedOfficial, existing: &Existing) -> TransformResult {
	let district = normalized.office.district.as_ref().map(|d| DistrictUpsert {
		external_id: d.external_id.clone(),
		ocd_id: d.ocd_id.clone(),
		label: d.label.clone(),
		district_type: d.district_type,
		geo_id: d.geo_id.clone(),
		mtfcc: d.mtfcc.clone(),
	});
	let district = match (district, &existing.district) {
		(Some(next), Some(curr)) if district_unchanged(&next, curr) => None,
		(next, _) => next,
	};

	let government_src = &normalized.office.chamber.government;
	let government = GovernmentUpsert {
		name: government_src.name.clone(),
		government_type: government_src.government_type.clone(),
		state: government_src.state.clone(),
		city: government_src.city.clone(),
	};
	let government = match &existing.government {
		Some(curr) if government_unchanged(&government, curr) => None,
		_ => Some(government),
	};

	let chamber_src = &normalized.office.chamber;
	let chamber = ChamberUpsert {
		external_id: chamber_src.external_id.clone(),
		name: chamber_src.name.clone(),
		term_length_years: chamber_src.term_length_years,
		election_frequency_years: chamber_src.election_frequency_years,
	};
	let chamber = match &existing.chamber {
		Some(curr) if chamber_unchanged(&chamber, curr) => None,
		_ => Some(chamber),
	};

	let full_name = compute_full_name(
		&normalized.first_name,
		normalized.middle_name.as_deref(),
		&normalized.last_name,
	);
	let official = OfficialUpsert {
		external_id: normalized.external_id.clone(),
		first_name: normalized.first_name.clone(),
		middle_name: normalized.middle_name.clone(),
		last_name: normalized.last_name.clone(),
		full_name,
		party: normalized.party.clone(),
		email: normalized.email.clone(),
		photo_url: normalized.photo_url.clone(),
	};
	let official = match &existing.official {
		Some(curr) if official_unchanged(&official, curr) => None,
		_ => Some(official),
	};

	let office = OfficeUpsert {
		title: normalized.office.title.clone(),
		representing_state: normalized.office.representing_state.clone(),
		representing_city: normalized.office.representing_city.clone(),
	};

	let (committees, joins) = canonicalize_committees(&normalized.committees);

	TransformResult {
		official_external_id: normalized.external_id.clone(),
		official,
		office,
		chamber_external_id: normalized.office.chamber.external_id.clone(),
		chamber,
		government,
		district_external_id: normalized.office.district.as_ref().map(|d| d.external_id.clone()),
		district,
		committees,
		joins,
		addresses: normalized.addresses.iter().map(convert_address).collect(),
		identifiers: dedup_identifiers(&normalized.identifiers),
		images: normalized.images.iter().map(convert_image).collect(),
		degrees: normalized.degrees.iter().map(convert_degree).collect(),
		experiences: normalized.experiences.iter().map(convert_experience).collect(),
		contacts: normalized.contacts.iter().map(convert_contact).collect(),
	}
}

/// `(first + middle-initial + last)` with whitespace runs collapsed (spec.md §4.2).
fn compute_full_name(first: &str, middle: Option<&str>, last: &str) -> String {
	let middle_initial = middle
		.and_then(|m| m.trim().chars().next())
		.map(|c| format!("{}.", c.to_ascii_uppercase()));
	let parts: Vec<&str> = [Some(first), middle_initial.as_deref(), Some(last)]
		.into_iter()
		.flatten()
		.collect();
	parts.join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

fn dedup_identifiers(identifiers: &[NormalizedIdentifier]) -> Vec<IdentifierRow> {
	let mut seen = std::collections::HashSet::new();
	let mut out = Vec::new();
	for id in identifiers {
		let identifier_type = id.identifier_type.trim();
		let value = id.value.trim();
		if identifier_type.is_empty() || value.is_empty() {
			continue;
		}
		let key = (identifier_type.to_lowercase(), value.to_lowercase());
		if seen.insert(key) {
			out.push(IdentifierRow {
				identifier_type: identifier_type.to_string(),
				value: value.to_string(),
			});
		}
	}
	out
}

fn canonicalize_committees(
	memberships: &[NormalizedCommitteeMembership],
) -> (Vec<CommitteeUpsert>, Vec<OfficialCommitteeJoin>) {
	let mut order = Vec::new();
	let mut by_name: std::collections::HashMap<String, (String, Option<String>)> =
		std::collections::HashMap::new();

	for m in memberships {
		let canonical = m.committee_name.trim().to_lowercase();
		if canonical.is_empty() {
			continue;
		}
		let entry = by_name
			.entry(canonical.clone())
			.or_insert_with(|| {
				order.push(canonical.clone());
				(m.committee_name.trim().to_string(), None)
			});
		if entry.1.is_none() {
			if let Some(pos) = m.position.as_ref().map(|p| p.trim()).filter(|p| !p.is_empty()) {
				entry.1 = Some(pos.to_string());
			}
		}
	}

	let committees = order
		.iter()
		.map(|canonical| CommitteeUpsert {
			canonical_name: canonical.clone(),
			display_name: by_name[canonical].0.clone(),
		})
		.collect();
	let joins = order
		.iter()
		.map(|canonical| OfficialCommitteeJoin {
			canonical_committee_name: canonical.clone(),
			position: by_name[canonical].1.clone(),
		})
		.collect();
	(committees, joins)
}

fn convert_address(a: &NormalizedAddress) -> AddressRow {
	AddressRow {
		address_type: a.address_type.clone(),
		line1: a.line1.clone(),
		line2: a.line2.clone(),
		city: a.city.clone(),
		state: a.state.clone(),
		postal_code: a.postal_code.clone(),
		phone: a.phone.clone(),
		fax: a.fax.clone(),
	}
}

fn convert_image(i: &NormalizedImage) -> ImageRow {
	ImageRow { url: i.url.clone(), kind: i.kind.clone() }
}

fn convert_degree(d: &NormalizedDegree) -> DegreeRow {
	DegreeRow {
		institution: d.institution.clone(),
		field: d.field.clone(),
		graduation_year: d.graduation_year,
	}
}

fn convert_experience(e: &NormalizedExperience) -> ExperienceRow {
	ExperienceRow {
		organization: e.organization.clone(),
		title: e.title.clone(),
		start_year: e.start_year,
		end_year: e.end_year,
	}
}

fn convert_contact(c: &NormalizedContact) -> ContactRow {
	ContactRow { contact_type: c.contact_type.clone(), value: c.value.clone() }
}

fn district_unchanged(next: &DistrictUpsert, curr: &DistrictRow) -> bool {
	next.external_id == curr.external_id
		&& next.ocd_id == curr.ocd_id
		&& next.label == curr.label
		&& next.district_type == curr.district_type
		&& next.geo_id == curr.geo_id
		&& next.mtfcc == curr.mtfcc
}

fn government_unchanged(next: &GovernmentUpsert, curr: &GovernmentRow) -> bool {
	next.name == curr.name
		&& next.government_type == curr.government_type
		&& next.state == curr.state
		&& next.city == curr.city
}

fn chamber_unchanged(next: &ChamberUpsert, curr: &ChamberRow) -> bool {
	next.external_id == curr.external_id
		&& next.name == curr.name
		&& next.term_length_years == curr.term_length_years
		&& next.election_frequency_years == curr.election_frequency_years
}

fn official_unchanged(next: &OfficialUpsert, curr: &OfficialRow) -> bool {
	next.external_id == curr.external_id
		&& next.first_name == curr.first_name
		&& next.middle_name == curr.middle_name
		&& next.last_name == curr.last_name
		&& next.full_name == curr.full_name
		&& next.party == curr.party
		&& next.email == curr.email
		&& next.photo_url == curr.photo_url
}

#[cfg(test)]
mod tests {
	use super::*;
	use civic_archive_providers::{
		NormalizedAddress, NormalizedChamber, NormalizedDistrict, NormalizedGovernment,
		NormalizedIdentifier, NormalizedOffice,
	};

	fn sample() -> NormalizedOfficial {
		NormalizedOfficial {
			external_id: "off-1".into(),
			first_name: "Jane".into(),
			middle_name: Some("Quincy".into()),
			last_name: "Doe".into(),
			party: Some("Independent".into()),
			email: None,
			photo_url: None,
			office: NormalizedOffice {
				title: "Senator".into(),
				representing_state: Some("IN".into()),
				representing_city: None,
				chamber: NormalizedChamber {
					external_id: "ch-1".into(),
					name: "State Senate".into(),
					term_length_years: Some(4),
					election_frequency_years: Some(4),
					government: NormalizedGovernment {
						name: "Indiana".into(),
						government_type: "state".into(),
						state: Some("IN".into()),
						city: None,
					},
				},
				district: Some(NormalizedDistrict {
					external_id: "dist-1".into(),
					ocd_id: Some("ocd-division/country:us/state:in/sldu:1".into()),
					label: "District 1".into(),
					district_type: DistrictType::StateUpper,
					geo_id: Some("1801".into()),
					mtfcc: Some("G5210".into()),
				}),
			},
			addresses: vec![NormalizedAddress {
				address_type: "capitol".into(),
				line1: "200 W Washington St".into(),
				line2: None,
				city: Some("Indianapolis".into()),
				state: Some("IN".into()),
				postal_code: Some("46204".into()),
				phone: None,
				fax: None,
			}],
			identifiers: vec![
				NormalizedIdentifier { identifier_type: "Twitter".into(), value: "@janedoe".into() },
				NormalizedIdentifier { identifier_type: "twitter".into(), value: "@JaneDoe".into() },
				NormalizedIdentifier { identifier_type: "".into(), value: "nope".into() },
			],
			committees: vec![
				NormalizedCommitteeMembership {
					committee_name: " Appropriations ".into(),
					position: None,
				},
				NormalizedCommitteeMembership {
					committee_name: "appropriations".into(),
					position: Some("Chair".into()),
				},
			],
			images: vec![],
			degrees: vec![],
			experiences: vec![],
			contacts: vec![],
		}
	}

	#[test]
	fn full_name_collapses_whitespace_and_uses_middle_initial() {
		let name = compute_full_name("Jane", Some("  quincy"), "Doe");
		assert_eq!(name, "Jane Q. Doe");
	}

	#[test]
	fn full_name_omits_middle_when_absent() {
		assert_eq!(compute_full_name("Jane", None, "Doe"), "Jane Doe");
	}

	#[test]
	fn identifiers_dedup_case_insensitively_and_drop_empty_type() {
		let result = transform(&sample(), &Existing::default());
		assert_eq!(result.identifiers.len(), 1);
		assert_eq!(result.identifiers[0].identifier_type, "Twitter");
		assert_eq!(result.identifiers[0].value, "@janedoe");
	}

	#[test]
	fn committees_canonicalize_and_keep_first_nonempty_position() {
		let result = transform(&sample(), &Existing::default());
		assert_eq!(result.committees.len(), 1);
		assert_eq!(result.committees[0].canonical_name, "appropriations");
		assert_eq!(result.committees[0].display_name, "Appropriations");
		assert_eq!(result.joins.len(), 1);
		assert_eq!(result.joins[0].position.as_deref(), Some("Chair"));
	}

	#[test]
	fn unchanged_official_is_omitted_from_the_bundle() {
		let normalized = sample();
		let existing_official = OfficialRow {
			id: uuid::Uuid::nil(),
			external_id: normalized.external_id.clone(),
			first_name: normalized.first_name.clone(),
			middle_name: normalized.middle_name.clone(),
			last_name: normalized.last_name.clone(),
			full_name: compute_full_name("Jane", Some("Quincy"), "Doe"),
			party: normalized.party.clone(),
			email: normalized.email.clone(),
			photo_url: normalized.photo_url.clone(),
			last_synced: chrono::Utc::now(),
		};
		let existing = Existing { official: Some(existing_official), ..Default::default() };
		let result = transform(&normalized, &existing);
		assert!(result.official.is_none());
	}

	#[test]
	fn changed_official_is_included() {
		let normalized = sample();
		let mut existing_official_row = OfficialRow {
			id: uuid::Uuid::nil(),
			external_id: normalized.external_id.clone(),
			first_name: normalized.first_name.clone(),
			middle_name: normalized.middle_name.clone(),
			last_name: normalized.last_name.clone(),
			full_name: compute_full_name("Jane", Some("Quincy"), "Doe"),
			party: normalized.party.clone(),
			email: normalized.email.clone(),
			photo_url: normalized.photo_url.clone(),
			last_synced: chrono::Utc::now(),
		};
		existing_official_row.party = Some("Democratic".into());
		let existing = Existing { official: Some(existing_official_row), ..Default::default() };
		let result = transform(&normalized, &existing);
		assert!(result.official.is_some());
	}
}
