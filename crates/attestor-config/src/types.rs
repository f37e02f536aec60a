//! Configuration types for the attestor.
//!
//! All endpoints, keys, and retry settings are explicit configuration
//! passed into client construction; nothing reads process environment at
//! call sites.

use attestor_types::{LayoutField, TargetLayout};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level attestor configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AttestorConfig {
	pub verifier: VerifierConfig,
	pub submission: SubmissionConfig,
	pub da_layer: DaLayerConfig,
	#[serde(default)]
	pub retry: RetryConfig,
	/// Overall deadline for one lifecycle run, in seconds. Absent means
	/// no deadline beyond the retry budget.
	#[serde(default)]
	pub deadline_secs: Option<u64>,
	#[serde(default)]
	pub feeds: FeedsConfig,
}

/// Verifier service endpoint and credentials.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VerifierConfig {
	pub url: String,
	pub api_key: String,
}

/// Consensus network submission endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SubmissionConfig {
	pub url: String,
}

/// Data-availability layer endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DaLayerConfig {
	pub url: String,
}

/// Bounded retry settings for round-proof polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
	/// Maximum number of data-availability queries per retrieval.
	pub max_attempts: u32,
	/// Delay between attempts, in milliseconds.
	pub delay_ms: u64,
	/// Optional exponential backoff factor applied per attempt; absent
	/// means a fixed delay.
	#[serde(default)]
	pub backoff_multiplier: Option<f64>,
}

impl RetryConfig {
	pub fn delay(&self) -> Duration {
		Duration::from_millis(self.delay_ms)
	}
}

impl Default for RetryConfig {
	fn default() -> Self {
		// Voting rounds finalize on a cadence of tens of seconds.
		Self {
			max_attempts: 10,
			delay_ms: 20_000,
			backoff_multiplier: None,
		}
	}
}

/// Request presets for the shipped feeds.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FeedsConfig {
	#[serde(default)]
	pub price: PriceFeedConfig,
	#[serde(default)]
	pub inventory: InventoryFeedConfig,
}

/// Spot price feed preset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceFeedConfig {
	pub url: String,
	pub post_process_jq: String,
}

impl Default for PriceFeedConfig {
	fn default() -> Self {
		Self {
			url: "https://api.coingecko.com/api/v3/simple/price?ids=flare&vs_currencies=usd"
				.to_string(),
			post_process_jq: "{price: .flare.usd}".to_string(),
		}
	}
}

impl PriceFeedConfig {
	pub fn layout(&self) -> TargetLayout {
		TargetLayout::new(vec![LayoutField::uint256("price")])
	}
}

/// Supplier inventory feed preset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryFeedConfig {
	pub url: String,
	pub post_process_jq: String,
}

impl Default for InventoryFeedConfig {
	fn default() -> Self {
		Self {
			url: "https://example.com/supplier/inventory".to_string(),
			post_process_jq: "{quantity: .stock, origin: .location}".to_string(),
		}
	}
}

impl InventoryFeedConfig {
	pub fn layout(&self) -> TargetLayout {
		TargetLayout::new(vec![
			LayoutField::uint256("quantity"),
			LayoutField::string("origin"),
		])
	}
}
