//! songplay-dwh CLI
//!
//! Provisions the Redshift cluster, manages the schema, runs the ETL and
//! tears everything down again.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use songplay_common::Settings;
use songplay_common::defaults::DEFAULT_CONFIG_PATH;
use songplay_dwh::aws::{AwsContext, IamClient, RedshiftClient};
use songplay_dwh::provision;
use songplay_dwh::warehouse::{self, CopySource, RedshiftConnection};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "songplay-dwh")]
#[command(about = "Redshift data warehouse for the songplay star schema")]
#[command(version)]
struct Args {
    /// Settings file
    #[arg(short, long, env = "DWH_CONFIG", default_value = DEFAULT_CONFIG_PATH, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the IAM role and the cluster, and wait until it is available
    Provision,

    /// Drop and recreate the staging and star-schema tables
    CreateTables,

    /// Load the staging tables from S3, then fill the star schema
    Etl,

    /// Delete the IAM role, then delete the cluster and wait until it is gone
    Teardown,

    /// Show the cluster properties
    Status,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();

    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }

    if let Some(hint) = e
        .downcast_ref::<songplay_dwh::aws::AwsError>()
        .and_then(|aws| aws.suggestion())
    {
        let _ = writeln!(stderr, "\n\x1b[36mHint:\x1b[0m {hint}");
    }

    if std::env::var("RUST_BACKTRACE").is_err() {
        let _ = writeln!(
            stderr,
            "\n\x1b[2mSet RUST_BACKTRACE=1 for a detailed backtrace\x1b[0m"
        );
    } else {
        let backtrace = e.backtrace();
        if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            let _ = writeln!(stderr, "\n\x1b[2mBacktrace:\x1b[0m\n{backtrace}");
        }
    }
}

fn init_tracing() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into())
        // Reduce noise from the AWS SDK
        .add_directive("aws_config=warn".parse()?)
        .add_directive("aws_sdk_iam=warn".parse()?)
        .add_directive("aws_sdk_redshift=warn".parse()?)
        .add_directive("aws_smithy_runtime=warn".parse()?)
        .add_directive("sqlx=warn".parse()?);

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

async fn run() -> Result<()> {
    // sqlx connects over rustls; install the provider before any TLS use
    let _ = rustls::crypto::ring::default_provider().install_default();

    let args = Args::parse();
    init_tracing()?;

    let settings = load_settings(&args.config)?;
    let aws = AwsContext::from_settings(&settings.aws).await;

    match args.command {
        Command::Provision => handle_provision(&aws, &settings).await,
        Command::CreateTables => handle_create_tables(&aws, &settings).await,
        Command::Etl => handle_etl(&aws, &settings).await,
        Command::Teardown => {
            let iam = IamClient::from_context(&aws);
            let redshift = RedshiftClient::from_context(&aws);
            provision::teardown(&iam, &redshift, &settings).await
        }
        Command::Status => {
            let redshift = RedshiftClient::from_context(&aws);
            let props = provision::describe_cluster_props(&redshift, &settings).await?;
            println!("{}", props.to_table());
            Ok(())
        }
    }
}

fn load_settings(path: &Path) -> Result<Settings> {
    let settings = Settings::load(path)
        .with_context(|| format!("Failed to load settings from {}", path.display()))?;
    info!(
        path = %path.display(),
        region = %settings.aws.region,
        cluster_id = %settings.cluster.identifier,
        "Loaded settings"
    );
    Ok(settings)
}

async fn handle_provision(aws: &AwsContext, settings: &Settings) -> Result<()> {
    let iam = IamClient::from_context(aws);
    let redshift = RedshiftClient::from_context(aws);

    let (role, props) = provision::provision(&iam, &redshift, settings).await?;

    println!("{}", props.to_table());
    println!();
    println!("Role ARN: {}", role.arn);
    if let Some(endpoint) = &props.endpoint {
        println!("Endpoint: {}", endpoint.address);
    }
    if settings.iam.role_arn.is_none() || settings.cluster.host.is_none() {
        println!();
        println!("Add these to the settings file to skip the lookups on later runs:");
        println!("  [iam]     role_arn = \"{}\"", role.arn);
        if let Some(endpoint) = &props.endpoint {
            println!("  [cluster] host = \"{}\"", endpoint.address);
        }
    }

    Ok(())
}

async fn connect(aws: &AwsContext, settings: &Settings) -> Result<RedshiftConnection> {
    let redshift = RedshiftClient::from_context(aws);
    let host = provision::resolve_host(&redshift, settings).await?;
    RedshiftConnection::connect(&warehouse::connect_options(settings, &host)).await
}

async fn handle_create_tables(aws: &AwsContext, settings: &Settings) -> Result<()> {
    let mut conn = connect(aws, settings).await?;

    warehouse::drop_tables(&mut conn).await?;
    warehouse::create_tables(&mut conn).await?;

    conn.close().await
}

async fn handle_etl(aws: &AwsContext, settings: &Settings) -> Result<()> {
    let iam = IamClient::from_context(aws);
    let role_arn = provision::resolve_role_arn(&iam, settings).await?;
    let source = CopySource::from_settings(settings, &role_arn);

    let mut conn = connect(aws, settings).await?;

    warehouse::load_staging_tables(&mut conn, &source).await?;
    warehouse::insert_tables(&mut conn).await?;

    conn.close().await
}
