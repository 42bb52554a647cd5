//! athena-query — run a single Athena query or delete a result object.
//!
//! Configuration comes from the environment (and an optional `.env` file);
//! see `AthenaConfig::from_env` for the recognised variables.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use dbtools_athena::{
    delete_s3_path, AthenaClient, AthenaConfig, OutputLocation, QueryOptions, S3ObjectStore,
};

// ── CLI ─────────────────────────────────────────────────────────────

/// Run Athena queries and manage their result objects.
#[derive(Parser, Debug)]
#[command(name = "athena-query", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a query and print the result location and column metadata.
    Query {
        /// SQL to execute.
        sql: String,

        /// S3 prefix for the results.
        #[arg(long, conflicts_with = "from_role")]
        out_path: Option<String>,

        /// Write results under the caller's IAM role id (requires USER).
        #[arg(long)]
        from_role: bool,

        /// Keep Athena's type names instead of normalizing them.
        #[arg(long)]
        raw_types: bool,

        /// Give up after this many seconds of polling (default: ATHENA_TIMEOUT_SECONDS).
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Delete an object, e.g. a query result CSV.
    Delete {
        /// Object URI, `s3://bucket/key`.
        path: String,
    },
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AthenaConfig::from_env();

    match cli.command {
        Command::Query {
            sql,
            out_path,
            from_role,
            raw_types,
            timeout,
        } => {
            let output_location = match (out_path, from_role) {
                (Some(path), _) => OutputLocation::Explicit(path),
                (None, true) => OutputLocation::FromRole,
                (None, false) => OutputLocation::Default,
            };
            let options = QueryOptions {
                return_raw_types: raw_types,
                timeout_seconds: timeout,
            };

            let client = AthenaClient::new(config)
                .await
                .context("failed to create Athena client")?;
            let response = client
                .run_query(&sql, &output_location, &options)
                .await
                .context("query did not complete")?;

            println!("{}", serde_json::to_string_pretty(&response)?);
        }

        Command::Delete { path } => {
            let store = S3ObjectStore::from_instance_metadata(&config.region);
            delete_s3_path(&store, &path)
                .await
                .with_context(|| format!("failed to delete {path}"))?;
            info!(path = %path, "delete complete");
        }
    }

    Ok(())
}
