//! CLI argument definitions using clap
//!
//! Commands:
//! - aerograph describe --cluster <path> --node <id> [--predicate <name>]... [--field <name>]...
//! - aerograph check --cluster <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// aerograph - schema resolution across a sharded graph store
#[derive(Parser, Debug)]
#[command(name = "aerograph")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve schema entries from one node of an in-process cluster
    Describe {
        /// Path to the cluster description
        #[arg(long)]
        cluster: PathBuf,

        /// Node the request is issued from
        #[arg(long, default_value_t = 1)]
        node: u64,

        /// Predicate to describe; repeat for several, omit for all
        #[arg(long = "predicate")]
        predicates: Vec<String>,

        /// Schema field to report; repeat for several, omit for the default set
        #[arg(long = "field")]
        fields: Vec<String>,

        /// Request timeout in milliseconds, overriding the configuration
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Path to a coordinator configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate a cluster description and print its group layout
    Check {
        /// Path to the cluster description
        #[arg(long)]
        cluster: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
