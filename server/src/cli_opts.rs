//! CLI overrides layered on top of [`civic_archive_common::Config`]'s
//! environment-driven defaults (spec.md §6 "Config loading order").

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "civic-archive-server", about = "ZIP-to-officials lookup service")]
pub struct CliOpts {
	/// Overrides PORT.
	#[arg(long)]
	pub port: Option<u16>,

	/// Overrides the freshness window, in days (default 90).
	#[arg(long = "max-age-days")]
	pub max_age_days: Option<i64>,
}

impl CliOpts {
	pub fn parse_args() -> Self {
		Self::parse()
	}
}
