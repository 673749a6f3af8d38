//! Shared types and process-wide configuration for the civic-archive
//! workspace: the lookup key and district/MTFCC enums (§3, §4.8), the
//! environment-driven `Config` (§6), and `tracing` initialization.

pub mod config;
pub mod logging;
pub mod types;

pub use config::{Config, ConfigError, Provider};
pub use types::{DistrictType, InvalidPostalCode, Mtfcc, PostalCode};
