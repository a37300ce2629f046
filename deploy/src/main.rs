// ============ Catalyst Deployment Tool ============
// Turns a pool test config into a deployment plan for the vault factory,
// and inspects cross-chain traffic from the command line.
//
// Usage:
//   cargo run -p catalyst-deploy -- plan --config deploy/pools.sample.json --pool-type amplified
//   cargo run -p catalyst-deploy -- decode 0x01...
//   cargo run -p catalyst-deploy -- quote --amount "10 * 10**18" \
//       --balance-in "1000 * 10**18" --balance-out "1000 * 10**18"
//
// The plan lists, per pool, the factory template, evaluated initial balances
// and the amplification to pass to `deploy_swappool`. Submitting it is left
// to the chain tooling.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use catalyst_sdk::catalyst_math::swap_math;
use catalyst_sdk::config::{load_test_config, PoolConfig, PoolType};
use catalyst_sdk::{expr, CurveKind, Payload, U256};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

// ============ CLI ============

#[derive(Parser, Debug)]
#[command(name = "catalyst-deploy", about = "Catalyst vault deployment planning")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a pool config and write a deployment plan.
    Plan {
        #[arg(long)]
        config: PathBuf,
        #[arg(long, value_enum, default_value_t = PoolKind::Volatile)]
        pool_type: PoolKind,
        /// Overrides the config file's amplification (e.g. "10**18 / 2").
        #[arg(long, env = "CATALYST_AMPLIFICATION")]
        amplification: Option<String>,
        #[arg(long, default_value = "deploy.json")]
        output: PathBuf,
        #[arg(long, default_value = "devnet")]
        network: String,
    },
    /// Decode a hex payload and print it as JSON.
    Decode { hex: String },
    /// Expected output of a single swap.
    Quote {
        #[arg(long)]
        amount: String,
        #[arg(long)]
        balance_in: String,
        #[arg(long)]
        balance_out: String,
        #[arg(long, default_value = "1")]
        weight_in: String,
        #[arg(long, default_value = "1")]
        weight_out: String,
        /// X64 amplification; omit for a volatile pool.
        #[arg(long)]
        amplification_x64: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PoolKind {
    Volatile,
    Amplified,
}

impl From<PoolKind> for PoolType {
    fn from(kind: PoolKind) -> Self {
        match kind {
            PoolKind::Volatile => PoolType::Volatile,
            PoolKind::Amplified => PoolType::Amplified,
        }
    }
}

// ============ Deployment Plan ============

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct DeploymentPlan {
    network: String,
    pool_type: PoolType,
    pools: Vec<PoolDeployment>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PoolDeployment {
    template_index: u8,
    tokens: Vec<usize>,
    /// Decimal strings, balances routinely exceed JSON's safe integer range.
    init_balances: Vec<String>,
    weights: Vec<u64>,
    amplification: String,
    name: String,
    symbol: String,
}

impl From<&PoolConfig> for PoolDeployment {
    fn from(pool: &PoolConfig) -> Self {
        Self {
            template_index: pool.template_index(),
            tokens: pool.tokens.clone(),
            init_balances: pool.init_balances.iter().map(U256::to_string).collect(),
            weights: pool.weights.clone(),
            amplification: pool.deploy_amplification().to_string(),
            name: pool.name.clone(),
            symbol: pool.symbol.clone(),
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Quote {
    units: String,
    units_x64: String,
    amount_out: String,
}

// ============ Main ============

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    if let Err(err) = run(Cli::parse()) {
        tracing::error!("{:?}", err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Plan {
            config,
            pool_type,
            amplification,
            output,
            network,
        } => plan(config, pool_type.into(), amplification.as_deref(), output, network),
        Command::Decode { hex } => decode(&hex),
        Command::Quote {
            amount,
            balance_in,
            balance_out,
            weight_in,
            weight_out,
            amplification_x64,
        } => quote(
            &amount,
            &balance_in,
            &balance_out,
            &weight_in,
            &weight_out,
            amplification_x64.as_deref(),
        ),
    }
}

fn plan(
    config_path: PathBuf,
    pool_type: PoolType,
    amplification: Option<&str>,
    output: PathBuf,
    network: String,
) -> Result<()> {
    let config = load_test_config(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let pools = config
        .resolve(pool_type, amplification)
        .context("resolving pool config")?;

    for pool in &pools {
        // Catches balances or weights the vault math would reject.
        pool.math_context()
            .with_context(|| format!("pool {} is not deployable", pool.name))?;
        info!(
            name = %pool.name,
            symbol = %pool.symbol,
            template = pool.template_index(),
            tokens = ?pool.tokens,
            "planned pool"
        );
    }

    let plan = DeploymentPlan {
        network,
        pool_type,
        pools: pools.iter().map(PoolDeployment::from).collect(),
    };
    let json = serde_json::to_string_pretty(&plan).context("serializing plan")?;
    fs::write(&output, json).with_context(|| format!("writing {}", output.display()))?;

    info!(pools = plan.pools.len(), output = %output.display(), "deployment plan written");
    Ok(())
}

fn decode(hex: &str) -> Result<()> {
    let payload = Payload::from_hex(hex).context("decoding payload")?;
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

fn quote(
    amount: &str,
    balance_in: &str,
    balance_out: &str,
    weight_in: &str,
    weight_out: &str,
    amplification_x64: Option<&str>,
) -> Result<()> {
    let value = |name: &str, input: &str| {
        expr::evaluate(input).with_context(|| format!("evaluating --{} {:?}", name, input))
    };

    let curve = match amplification_x64 {
        Some(input) => CurveKind::from_x64(value("amplification-x64", input)?)?,
        None => CurveKind::ConstantProduct,
    };
    let estimate = swap_math::expected_swap(
        value("amount", amount)?,
        value("balance-in", balance_in)?,
        value("balance-out", balance_out)?,
        value("weight-in", weight_in)?,
        value("weight-out", weight_out)?,
        &curve,
    )?;

    let quote = Quote {
        units: estimate.units.to_string(),
        units_x64: estimate.units.to_x64()?.to_string(),
        amount_out: estimate.amount_out.to_string(),
    };
    println!("{}", serde_json::to_string_pretty(&quote)?);
    Ok(())
}
