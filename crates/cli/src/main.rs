use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use blog_seed::blog_plan;
use seedkit_db::MongoProvisioner;
use seedkit_kernel::{settings::Settings, MemoryProvisioner, SeedPlan, Variant};

/// Provision the blog service MongoDB databases and users
#[derive(Debug, Parser)]
#[command(name = "seedkit", version, about)]
struct Cli {
    /// Directory holding base.toml and <env>.toml (defaults to ./config)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the users (and optionally the fixture collection)
    Seed {
        #[arg(long, value_enum, default_value_t = VariantArg::WithFixture)]
        variant: VariantArg,

        /// Run against an in-memory database and print the resulting state
        #[arg(long)]
        dry_run: bool,
    },
    /// Check that a previous seed left the expected users and fixtures
    Verify {
        #[arg(long, value_enum, default_value_t = VariantArg::WithFixture)]
        variant: VariantArg,
    },
    /// Print the seed plan as JSON with passwords masked
    Plan {
        #[arg(long, value_enum, default_value_t = VariantArg::WithFixture)]
        variant: VariantArg,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum VariantArg {
    UsersOnly,
    WithFixture,
}

impl From<VariantArg> for Variant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::UsersOnly => Variant::UsersOnly,
            VariantArg::WithFixture => Variant::WithFixture,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load_from(cli.config_dir.as_deref())
        .with_context(|| "failed to load seedkit settings")?;
    seedkit_telemetry::init(&settings.telemetry)?;

    tracing::info!(env = ?settings.environment, "seedkit starting");

    match cli.command {
        Command::Seed { variant, dry_run } => seed(&settings, variant.into(), dry_run).await,
        Command::Verify { variant } => verify(&settings, variant.into()).await,
        Command::Plan { variant } => print_json(&blog_plan(variant.into()).redacted()),
    }
}

async fn seed(settings: &Settings, variant: Variant, dry_run: bool) -> anyhow::Result<()> {
    let plan = blog_plan(variant);

    if dry_run {
        let provisioner = MemoryProvisioner::new();
        plan.run(&provisioner).await?;
        return print_json(&provisioner.snapshot().await);
    }

    let provisioner = MongoProvisioner::connect(&settings.database).await?;
    let report = plan.run(&provisioner).await?;
    print_json(&report)
}

async fn verify(settings: &Settings, variant: Variant) -> anyhow::Result<()> {
    let plan = blog_plan(variant);
    let provisioner = MongoProvisioner::connect(&settings.database).await?;
    plan.verify(&provisioner).await?;
    print_json(&VerifySummary::from_plan(&plan))
}

/// Printed after a successful `verify`
#[derive(Debug, Serialize)]
struct VerifySummary {
    variant: Variant,
    verified: Vec<VerifiedUser>,
}

#[derive(Debug, Serialize)]
struct VerifiedUser {
    database: String,
    username: String,
}

impl VerifySummary {
    fn from_plan(plan: &SeedPlan) -> Self {
        Self {
            variant: plan.variant,
            verified: plan
                .requests
                .iter()
                .map(|r| VerifiedUser {
                    database: r.database.clone(),
                    username: r.username.clone(),
                })
                .collect(),
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render output")?;
    println!("{rendered}");
    Ok(())
}
