use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "compreg",
    about = "compreg: component registry for pipeline stacks",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Config file (defaults to ./compreg.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding one sub-directory per store
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Mapping file (.toml or .json)
    #[arg(long, global = true)]
    pub mapping: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the store root and an empty mapping file
    Init(InitArgs),
    /// Register a new component in a store
    Register(RegisterArgs),
    /// Remove a component from a store
    Deregister(DeregisterArgs),
    /// List registered components
    List(ListArgs),
    /// Show a component's record and persisted artifact
    Show(ShowArgs),
    /// Find the key registered for an identity
    Whois(WhoisArgs),
    /// Instantiate every registered and persisted component of a store
    Enumerate(StoreArgs),
    /// Compare a store's mapping with its directory
    Check(StoreArgs),
    /// List available implementations
    Sources,
}

#[derive(Args)]
pub struct InitArgs {
    /// Stores to create alongside the mapping file
    #[arg(long = "store")]
    pub stores: Vec<String>,
}

#[derive(Args)]
pub struct RegisterArgs {
    pub store: String,
    pub key: String,
    /// Implementation reference, e.g. compreg.orchestrators.LocalOrchestrator
    pub source: String,
    /// Component property as NAME=VALUE; VALUE is parsed as JSON when possible
    #[arg(long = "set", value_name = "NAME=VALUE")]
    pub properties: Vec<String>,
}

#[derive(Args)]
pub struct DeregisterArgs {
    pub store: String,
    pub key: String,
}

#[derive(Args)]
pub struct ListArgs {
    /// Only list this store
    pub store: Option<String>,
}

#[derive(Args)]
pub struct ShowArgs {
    pub store: String,
    pub key: String,
}

#[derive(Args)]
pub struct WhoisArgs {
    pub store: String,
    pub id: String,
}

#[derive(Args)]
pub struct StoreArgs {
    pub store: String,
}
