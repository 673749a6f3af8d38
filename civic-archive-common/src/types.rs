//! Shared domain types used across the fetch/transform/upsert pipeline and the
//! HTTP front-end: the postal-code lookup key, the closed district-type enum,
//! and the MTFCC feature-class codes used to disambiguate geofence hits.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A US ZIP code lookup key. Validated to be exactly five ASCII digits at
/// construction; everything downstream may assume that invariant holds.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PostalCode(String);

#[derive(Debug, thiserror::Error)]
#[error("postal code must be exactly five digits, got {0:?}")]
pub struct InvalidPostalCode(pub String);

impl PostalCode {
	pub fn parse(raw: &str) -> Result<Self, InvalidPostalCode> {
		if raw.len() == 5 && raw.bytes().all(|b| b.is_ascii_digit()) {
			Ok(Self(raw.to_string()))
		} else {
			Err(InvalidPostalCode(raw.to_string()))
		}
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Stable 32-bit hash used as the single-flight advisory lock key.
	/// CRC32 rather than `DefaultHasher` because the latter's algorithm
	/// (and therefore its output) is not guaranteed stable across Rust
	/// versions or process restarts, which would silently fragment the
	/// cluster-wide lock space.
	pub fn lock_key(&self) -> i32 {
		crc32fast::hash(self.0.as_bytes()) as i32
	}
}

impl fmt::Display for PostalCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl TryFrom<String> for PostalCode {
	type Error = InvalidPostalCode;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::parse(&value)
	}
}

impl From<PostalCode> for String {
	fn from(value: PostalCode) -> Self {
		value.0
	}
}

/// Closed enum of district types. Ordering here is load-bearing nowhere;
/// only the variant identity and its `sql` round-trip matter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "district_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DistrictType {
	NationalExec,
	NationalUpper,
	NationalLower,
	StateExec,
	StateUpper,
	StateLower,
	LocalExec,
	Local,
	County,
	School,
	Judicial,
}

/// Census MTFCC feature-class codes that this system recognizes on geofence
/// polygons. `Other` covers every code not in the recognized table; it still
/// joins to districts, just without type restriction (spec.md §4.8).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mtfcc {
	/// State upper-house district (G5210).
	StateUpper,
	/// State lower-house district (G5220).
	StateLower,
	/// National (congressional) lower-house district (G5200).
	NationalLower,
	/// County (G4020).
	County,
	/// Incorporated place (G4040).
	IncorporatedPlace,
	/// Consolidated city (G4110).
	ConsolidatedCity,
	/// Unified/elementary/secondary school district (G5420).
	SchoolDistrict,
	/// Anything this system does not special-case.
	Other,
}

impl Mtfcc {
	pub const fn code(self) -> &'static str {
		match self {
			Self::StateUpper => "G5210",
			Self::StateLower => "G5220",
			Self::NationalLower => "G5200",
			Self::County => "G4020",
			Self::IncorporatedPlace => "G4040",
			Self::ConsolidatedCity => "G4110",
			Self::SchoolDistrict => "G5420",
			Self::Other => "",
		}
	}

	pub fn from_code(code: &str) -> Self {
		match code {
			"G5210" => Self::StateUpper,
			"G5220" => Self::StateLower,
			"G5200" => Self::NationalLower,
			"G4020" => Self::County,
			"G4040" => Self::IncorporatedPlace,
			"G4110" => Self::ConsolidatedCity,
			"G5420" => Self::SchoolDistrict,
			_ => Self::Other,
		}
	}

	/// District types this MTFCC is legally allowed to join to (spec.md
	/// §4.8 table). `None` means "unrecognized: any district type".
	pub fn allowed_district_types(self) -> Option<&'static [DistrictType]> {
		use DistrictType::*;
		match self {
			Self::StateUpper => Some(&[StateUpper]),
			Self::StateLower => Some(&[StateLower]),
			Self::NationalLower => Some(&[NationalLower]),
			Self::County => Some(&[County, Judicial]),
			Self::IncorporatedPlace | Self::ConsolidatedCity => Some(&[Local, LocalExec]),
			Self::SchoolDistrict => Some(&[School]),
			Self::Other => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn postal_code_accepts_five_digits() {
		assert!(PostalCode::parse("47401").is_ok());
	}

	#[test]
	fn postal_code_rejects_non_digits_and_bad_length() {
		assert!(PostalCode::parse("4740").is_err());
		assert!(PostalCode::parse("474011").is_err());
		assert!(PostalCode::parse("4740a").is_err());
	}

	#[test]
	fn lock_key_is_stable_across_instances() {
		let a = PostalCode::parse("90001").unwrap();
		let b = PostalCode::parse("90001").unwrap();
		assert_eq!(a.lock_key(), b.lock_key());
	}

	#[test]
	fn mtfcc_round_trips_known_codes() {
		for code in ["G5210", "G5220", "G5200", "G4020", "G4040", "G4110", "G5420"] {
			assert_eq!(Mtfcc::from_code(code).code(), code);
		}
		assert_eq!(Mtfcc::from_code("Z9999"), Mtfcc::Other);
	}

	#[test]
	fn county_mtfcc_allows_judicial_alongside_county() {
		let allowed = Mtfcc::County.allowed_district_types().unwrap();
		assert!(allowed.contains(&DistrictType::County));
		assert!(allowed.contains(&DistrictType::Judicial));
	}
}
