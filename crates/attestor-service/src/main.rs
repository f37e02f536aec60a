use anyhow::{Context, Result};
use attestor_client::{AttestationClient, AttestationOutcome, RequestSpec};
use attestor_config::{AttestorConfig, ConfigLoader};
use attestor_retrieval::CancelHandle;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "fdc-attestor")]
#[command(about = "Web2Json attestation oracle client", long_about = None)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	#[arg(short, long, value_name = "FILE", default_value = "config/attestor.toml")]
	config: PathBuf,

	#[arg(long, env = "ATTESTOR_LOG_LEVEL", default_value = "info")]
	log_level: String,
}

#[derive(Subcommand)]
enum Commands {
	/// Attest the configured supplier inventory feed
	AttestInventory {
		/// Inventory identifier forwarded with the outcome
		#[arg(long, default_value_t = 1)]
		inventory_id: u64,
	},
	/// Attest the configured spot price feed
	UpdatePrice,
	/// Validate the configuration file
	Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	setup_tracing(&cli.log_level)?;

	let config = ConfigLoader::new()
		.with_file(&cli.config)
		.load()
		.await
		.context("Failed to load configuration")?;

	match cli.command {
		Commands::UpdatePrice => {
			let spec = RequestSpec::get(
				config.feeds.price.url.clone(),
				config.feeds.price.post_process_jq.clone(),
				config.feeds.price.layout(),
			);
			run_lifecycle(&config, spec, None).await
		}
		Commands::AttestInventory { inventory_id } => {
			let spec = RequestSpec::get(
				config.feeds.inventory.url.clone(),
				config.feeds.inventory.post_process_jq.clone(),
				config.feeds.inventory.layout(),
			);
			run_lifecycle(&config, spec, Some(inventory_id)).await
		}
		Commands::Validate => validate_config(&config),
	}
}

async fn run_lifecycle(
	config: &AttestorConfig,
	spec: RequestSpec,
	inventory_id: Option<u64>,
) -> Result<()> {
	info!(source = %spec.url, "starting attestation lifecycle");

	let client = AttestationClient::from_config(config);

	let handle = CancelHandle::new();
	if let Some(secs) = config.deadline_secs {
		handle.arm_deadline(Duration::from_secs(secs));
	}
	let cancel = handle.token();

	let outcome = client
		.run_lifecycle(spec, &cancel)
		.await
		.context("Attestation lifecycle failed")?;

	info!(round = %outcome.round, "attestation complete");
	print_outcome(&outcome, inventory_id)?;

	Ok(())
}

/// Emits the (merkle proof, decoded data) pair for the on-chain
/// forwarder.
fn print_outcome(outcome: &AttestationOutcome, inventory_id: Option<u64>) -> Result<()> {
	let mut payload = serde_json::json!({
		"roundId": outcome.round,
		"merkleProof": outcome.merkle_path,
		"data": outcome.decoded,
	});
	if let Some(id) = inventory_id {
		payload["inventoryId"] = id.into();
	}

	println!("{}", serde_json::to_string_pretty(&payload)?);
	Ok(())
}

fn validate_config(config: &AttestorConfig) -> Result<()> {
	info!("Configuration is valid");
	info!("Verifier endpoint: {}", config.verifier.url);
	info!("Submission endpoint: {}", config.submission.url);
	info!("Data-availability endpoint: {}", config.da_layer.url);
	info!(
		"Retry policy: {} attempts every {:?}{}",
		config.retry.max_attempts,
		config.retry.delay(),
		match config.retry.backoff_multiplier {
			Some(multiplier) => format!(" (backoff x{})", multiplier),
			None => String::new(),
		}
	);
	match config.deadline_secs {
		Some(secs) => info!("Overall deadline: {}s", secs),
		None => info!("No overall deadline configured"),
	}
	info!("Price feed: {}", config.feeds.price.url);
	info!("Inventory feed: {}", config.feeds.inventory.url);
	Ok(())
}

fn setup_tracing(log_level: &str) -> Result<()> {
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

	tracing_subscriber::registry()
		.with(env_filter)
		.with(tracing_subscriber::fmt::layer())
		.init();

	Ok(())
}
