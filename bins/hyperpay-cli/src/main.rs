//! hyperpay-cli — Command-line front end for the Hyperpay routing engine.
//!
//! Loads a specification file (JSON), builds an in-memory engine with the
//! reference category handlers, and simulates the payment lifecycle:
//! validate the routing graph, derive deposit addresses, and run payments
//! printing the resulting category and share balances.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

use hyperpay_categories::deposit::calculated_address;
use hyperpay_categories::{CategoryHandler, ClaimsRegistry, DepositClaim, LedgerFanOut};
use hyperpay_core::payload::{ClaimPayload, DepositPayload, SharesPayload};
use hyperpay_core::token::TokenBank;
use hyperpay_core::types::{Address, ProjectId};
use hyperpay_engine::{Flow, HyperpayEngine, Spline};

/// One 18-decimal token, the display unit for amounts.
const UNIT: u128 = 1_000_000_000_000_000_000;

/// Account address the simulated engine operates.
const ENGINE_ADDRESS: Address = Address([0xE9; 32]);

// ----------------------------------------------------------------------
// Specification file format
// ----------------------------------------------------------------------

#[derive(Deserialize)]
struct SpecFile {
    url: String,
    categories: Vec<CategoryEntry>,
    resources: Vec<ResourceEntry>,
    splines: Vec<SplineEntry>,
    flows: Vec<FlowEntry>,
    #[serde(default)]
    projects: Vec<ProjectEntry>,
}

#[derive(Deserialize)]
struct CategoryEntry {
    name: String,
    /// Hex-encoded 32-byte account address.
    address: String,
    /// Handler kind: "deposit", "claims", or "fanout".
    kind: String,
}

#[derive(Deserialize)]
struct ResourceEntry {
    name: String,
    /// Hex-encoded 32-byte token address.
    token: String,
}

#[derive(Deserialize)]
struct SplineEntry {
    before: u64,
    after: u64,
    category: String,
}

#[derive(Deserialize)]
struct FlowEntry {
    from: String,
    to: String,
    /// Fixed-point percentage units (1% == 10000).
    percentage: u64,
}

#[derive(Deserialize)]
struct ProjectEntry {
    users: Vec<UserEntry>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UserEntry {
    Claim {
        category: String,
        purl: String,
        username: String,
        auth_provider: String,
        /// Hex-encoded payout address; omit for none.
        #[serde(default)]
        withdrawer: Option<String>,
    },
    Shares {
        category: String,
        shares: Vec<String>,
    },
}

// ----------------------------------------------------------------------
// Command line
// ----------------------------------------------------------------------

/// Hyperpay routing engine front end.
#[derive(Parser)]
#[command(name = "hyperpay-cli")]
#[command(version, about = "Route payments through a hyperpayment specification.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a specification file and validate its routing graph.
    Validate(SpecArgs),
    /// Print the counterfactual deposit address for a payment.
    Address(PayArgs),
    /// Simulate a payment and print the resulting balances.
    Pay(PayArgs),
}

#[derive(Args)]
struct SpecArgs {
    /// Path to the specification JSON file.
    #[arg(short, long)]
    spec: PathBuf,
}

#[derive(Args)]
struct PayArgs {
    /// Path to the specification JSON file.
    #[arg(short, long)]
    spec: PathBuf,

    /// Project id (1-based, in file order).
    #[arg(short, long, default_value = "1")]
    project: ProjectId,

    /// Deposit counter; each value is claimable once per project.
    #[arg(short, long, default_value = "1")]
    counter: u64,

    /// Amount in whole tokens, e.g. "100" or "0.5".
    #[arg(short, long)]
    amount: String,

    /// Resource the deposit enters the flow as.
    #[arg(short, long, default_value = "customer")]
    resource: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate(args) => validate(args),
        Commands::Address(args) => deposit_address(args),
        Commands::Pay(args) => pay(args),
    }
}

/// Build the engine, load the specification, and register its projects.
fn load_engine(path: &PathBuf) -> Result<(HyperpayEngine, SpecFile, u64)> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file: SpecFile = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    let mut engine = HyperpayEngine::new(ENGINE_ADDRESS);
    for category in &file.categories {
        let address = parse_address(&category.address)
            .with_context(|| format!("Bad address for category {}", category.name))?;
        let handler = match category.kind.as_str() {
            "deposit" => CategoryHandler::DepositClaim(DepositClaim::new(address)),
            "claims" => CategoryHandler::ClaimsRegistry(ClaimsRegistry::new(address)),
            "fanout" => CategoryHandler::LedgerFanOut(LedgerFanOut::new(address)),
            other => bail!("Unknown category kind {other:?} for {}", category.name),
        };
        engine.register_handler(handler);
    }

    let categories = file
        .categories
        .iter()
        .map(|c| Ok((c.name.clone(), parse_address(&c.address)?)))
        .collect::<Result<Vec<_>>>()?;
    let resources = file
        .resources
        .iter()
        .map(|r| Ok((r.name.clone(), parse_address(&r.token)?)))
        .collect::<Result<Vec<_>>>()?;
    let spec_id = engine.create_specification(
        file.url.clone(),
        categories,
        resources,
        file.splines.len() as u64,
    );
    engine.add_splines(
        spec_id,
        file.splines
            .iter()
            .map(|s| Spline {
                before_junction: s.before,
                after_junction: s.after,
                category: s.category.clone(),
            })
            .collect(),
    )?;
    engine.add_flows(
        spec_id,
        file.flows
            .iter()
            .map(|f| Flow { from: f.from.clone(), to: f.to.clone(), percentage: f.percentage })
            .collect(),
    )?;

    for project in &file.projects {
        let users = project
            .users
            .iter()
            .map(|user| match user {
                UserEntry::Claim { category, purl, username, auth_provider, withdrawer } => {
                    let withdrawer = match withdrawer {
                        Some(hex) => parse_address(hex)?,
                        None => Address::ZERO,
                    };
                    let payload = ClaimPayload {
                        purl: purl.clone(),
                        username: username.clone(),
                        auth_provider: auth_provider.clone(),
                        withdrawer,
                    };
                    Ok((category.clone(), payload.encode()))
                }
                UserEntry::Shares { category, shares } => {
                    let payload = SharesPayload { names: shares.clone() };
                    Ok((category.clone(), payload.encode()))
                }
            })
            .collect::<Result<Vec<_>>>()?;
        engine.create_project(spec_id, users).context("Failed to register project")?;
    }

    Ok((engine, file, spec_id))
}

fn validate(args: SpecArgs) -> Result<()> {
    let (engine, file, spec_id) = load_engine(&args.spec)?;
    println!("Specification {spec_id}: {}", file.url);
    println!("  categories: {}", file.categories.len());
    println!("  resources:  {}", file.resources.len());
    println!("  splines:    {}", file.splines.len());
    println!("  projects:   {}", engine.project_counter(spec_id));
    println!("Routing graph is valid and active.");
    Ok(())
}

fn deposit_payload(args: &PayArgs, file: &SpecFile) -> Result<DepositPayload> {
    let resource_token = file
        .resources
        .iter()
        .find(|r| r.name == args.resource)
        .with_context(|| format!("Unknown resource {:?}", args.resource))?;
    Ok(DepositPayload {
        counter: args.counter,
        amount: parse_amount(&args.amount)?,
        resource_token: parse_address(&resource_token.token)?,
        resource_name: args.resource.clone(),
    })
}

fn deposit_address(args: PayArgs) -> Result<()> {
    let (_, file, spec_id) = load_engine(&args.spec)?;
    let payload = deposit_payload(&args, &file)?;
    let slot = calculated_address(spec_id, args.project, &payload.encode());
    println!("{slot}");
    Ok(())
}

fn pay(args: PayArgs) -> Result<()> {
    let (mut engine, file, spec_id) = load_engine(&args.spec)?;
    let payload = deposit_payload(&args, &file)?;
    let bytes = payload.encode();

    // Simulate the payer funding the counterfactual slot.
    let slot = calculated_address(spec_id, args.project, &bytes);
    engine
        .bank_mut()
        .mint(&payload.resource_token, &slot, payload.amount)
        .context("Deposit amount overflows")?;

    engine
        .hyperpay(spec_id, args.project, &bytes)
        .context("Payment failed; no state was changed")?;

    println!("Routed {} from deposit {}", format_amount(payload.amount), slot);
    println!("\nCategory balances:");
    for category in &file.categories {
        let address = parse_address(&category.address)?;
        let balance = engine.bank().balance_of(&payload.resource_token, &address);
        println!("  {:<16} {}", category.name, format_amount(balance));
    }

    let shares: BTreeSet<String> = file
        .projects
        .iter()
        .flat_map(|p| &p.users)
        .filter_map(|user| match user {
            UserEntry::Shares { shares, .. } => Some(shares.clone()),
            UserEntry::Claim { .. } => None,
        })
        .flatten()
        .collect();
    if !shares.is_empty() {
        println!("\nShare balances:");
        for share in shares {
            let balance = engine.cascade().balance_of(&share, &payload.resource_token);
            println!("  {:<40} {}", share, format_amount(balance));
        }
    }
    Ok(())
}

// ----------------------------------------------------------------------
// Parsing helpers
// ----------------------------------------------------------------------

/// Decode a hex-encoded 32-byte address.
fn parse_address(input: &str) -> Result<Address> {
    let bytes = hex::decode(input.trim_start_matches("0x"))
        .with_context(|| format!("Invalid hex address: {input}"))?;
    let bytes: [u8; 32] = bytes
        .try_into()
        .map_err(|_| anyhow::anyhow!("Address must be 32 bytes: {input}"))?;
    Ok(Address(bytes))
}

/// Parse a decimal token amount ("100", "0.5") into base units.
fn parse_amount(input: &str) -> Result<u128> {
    let (whole, frac) = match input.split_once('.') {
        Some((w, f)) => (w, f),
        None => (input, ""),
    };
    if frac.len() > 18 {
        bail!("At most 18 fractional digits: {input}");
    }
    let whole: u128 = whole.parse().with_context(|| format!("Bad amount: {input}"))?;
    let mut frac_units: u128 = 0;
    if !frac.is_empty() {
        let parsed: u128 = frac.parse().with_context(|| format!("Bad amount: {input}"))?;
        frac_units = parsed * 10u128.pow(18 - frac.len() as u32);
    }
    whole
        .checked_mul(UNIT)
        .and_then(|w| w.checked_add(frac_units))
        .context("Amount overflows")
}

/// Render base units as a decimal token amount.
fn format_amount(amount: u128) -> String {
    let whole = amount / UNIT;
    let frac = amount % UNIT;
    if frac == 0 {
        format!("{whole}")
    } else {
        let digits = format!("{frac:018}");
        format!("{whole}.{}", digits.trim_end_matches('0'))
    }
}
