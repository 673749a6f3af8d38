//! The provider-agnostic tree produced by an adapter and consumed by the
//! transformer (spec.md §4.1, §4.2, GLOSSARY). Every field here is
//! upstream-sourced; nothing here may depend on the wall clock or on
//! ordering-sensitive values, so that a stable upstream input produces a
//! byte-identical `NormalizedOfficial` run to run (spec.md §8 property 7).

use civic_archive_common::DistrictType;
use serde::{Deserialize, Serialize};

/// An external identifier from the upstream provider. Kept as a string
/// regardless of the provider's native representation (Cicero uses
/// integers, BallotReady uses opaque strings) so both adapters can share
/// one downstream type.
pub type ExternalId = String;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedOfficial {
	pub external_id: ExternalId,
	pub first_name: String,
	pub middle_name: Option<String>,
	pub last_name: String,
	pub party: Option<String>,
	pub email: Option<String>,
	pub photo_url: Option<String>,
	pub office: NormalizedOffice,
	pub addresses: Vec<NormalizedAddress>,
	pub identifiers: Vec<NormalizedIdentifier>,
	pub committees: Vec<NormalizedCommitteeMembership>,
	pub images: Vec<NormalizedImage>,
	pub degrees: Vec<NormalizedDegree>,
	pub experiences: Vec<NormalizedExperience>,
	pub contacts: Vec<NormalizedContact>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedOffice {
	pub title: String,
	pub representing_state: Option<String>,
	pub representing_city: Option<String>,
	pub chamber: NormalizedChamber,
	pub district: Option<NormalizedDistrict>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedChamber {
	pub external_id: ExternalId,
	pub name: String,
	pub term_length_years: Option<i32>,
	pub election_frequency_years: Option<i32>,
	pub government: NormalizedGovernment,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedGovernment {
	pub name: String,
	pub government_type: String,
	pub state: Option<String>,
	pub city: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedDistrict {
	pub external_id: ExternalId,
	pub ocd_id: Option<String>,
	pub label: String,
	pub district_type: DistrictType,
	pub geo_id: Option<String>,
	pub mtfcc: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedAddress {
	pub address_type: String,
	pub line1: String,
	pub line2: Option<String>,
	pub city: Option<String>,
	pub state: Option<String>,
	pub postal_code: Option<String>,
	pub phone: Option<String>,
	pub fax: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedIdentifier {
	pub identifier_type: String,
	pub value: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedCommitteeMembership {
	pub committee_name: String,
	pub position: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedImage {
	pub url: String,
	pub kind: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedDegree {
	pub institution: String,
	pub field: Option<String>,
	pub graduation_year: Option<i32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedExperience {
	pub organization: String,
	pub title: Option<String>,
	pub start_year: Option<i32>,
	pub end_year: Option<i32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedContact {
	pub contact_type: String,
	pub value: String,
}
