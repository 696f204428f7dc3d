use std::process::ExitCode;

use clap::{Parser, Subcommand};
use srk_schemas::{Dialect, ResourceIdentity, ResourceKind};

mod commands;

use commands::resource::{self, Op};
use commands::Outcome;

#[derive(Parser)]
#[command(name = "srk")]
#[command(about = "Search-cluster resource reconciler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> env -> site...)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Connect and print the dialect the cluster speaks
    Probe {
        /// Layered config paths in merge order
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,
    },

    /// Read one object
    Read {
        #[command(flatten)]
        target: Target,
    },

    /// Delete one object
    Delete {
        #[command(flatten)]
        target: Target,
    },

    /// Adopt an existing object by identity
    Import {
        #[command(flatten)]
        target: Target,
    },

    /// Plan, then create or update one object as needed
    Apply {
        /// Layered config paths in merge order
        #[arg(long = "config", required = true)]
        config_paths: Vec<String>,

        #[arg(long, value_parser = parse_kind)]
        kind: ResourceKind,

        /// Name for caller-named kinds; previous id for server-assigned ones
        #[arg(long, value_parser = parse_identity)]
        id: Option<ResourceIdentity>,

        /// Desired body (JSON file)
        #[arg(long)]
        body: String,
    },

    /// Offline: compare a desired body with a remote body under the kind's rules
    Diff {
        #[arg(long, value_parser = parse_kind)]
        kind: ResourceKind,

        #[arg(long, value_parser = parse_dialect)]
        dialect: Dialect,

        /// Desired body (JSON file)
        #[arg(long)]
        desired: String,

        /// Remote body as read from the cluster (JSON file)
        #[arg(long)]
        remote: String,
    },
}

#[derive(clap::Args)]
struct Target {
    /// Layered config paths in merge order
    #[arg(long = "config", required = true)]
    config_paths: Vec<String>,

    #[arg(long, value_parser = parse_kind)]
    kind: ResourceKind,

    /// `id`, `index/id` or `index/type/id`
    #[arg(long, value_parser = parse_identity)]
    id: ResourceIdentity,
}

impl Target {
    fn run(&self, op: Op) -> anyhow::Result<Outcome> {
        resource::single(op, &self.config_paths, self.kind, &self.id)
    }
}

fn parse_kind(s: &str) -> Result<ResourceKind, String> {
    ResourceKind::parse(s).map_err(|e| e.to_string())
}

fn parse_dialect(s: &str) -> Result<Dialect, String> {
    Dialect::parse(s).map_err(|e| e.to_string())
}

fn parse_identity(s: &str) -> Result<ResourceIdentity, String> {
    ResourceIdentity::parse(s).map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    // Load .env.local if present (dev convenience). Production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();
    let result = match cli.cmd {
        Commands::ConfigHash { paths } => commands::config_hash(&paths),
        Commands::Probe { config_paths } => commands::probe(&config_paths),
        Commands::Read { target } => target.run(Op::Read),
        Commands::Delete { target } => target.run(Op::Delete),
        Commands::Import { target } => target.run(Op::Import),
        Commands::Apply {
            config_paths,
            kind,
            id,
            body,
        } => resource::apply(&config_paths, kind, id, &body),
        Commands::Diff {
            kind,
            dialect,
            desired,
            remote,
        } => commands::diff::offline(kind, dialect, &desired, &remote),
    };

    match result {
        Ok(outcome) => outcome.emit(),
        Err(e) => {
            // Config, file and connection problems before any reconciler call.
            eprintln!("error: {e:#}");
            Outcome::FATAL_EXIT.into()
        }
    }
}

/// Logs go to stderr; stdout carries only the JSON result.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}
