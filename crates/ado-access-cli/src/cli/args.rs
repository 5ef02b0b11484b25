use clap::{Parser, Subcommand};

use super::commands::identity::IdentityCmd;
use super::commands::namespace::NamespaceCmd;
use super::commands::permission::PermissionCmd;
use super::commands::subject::SubjectCmd;

#[derive(Parser)]
#[command(
    name = "ado-access",
    version,
    about = "Resolve Azure DevOps identities and inspect security namespace permissions"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Resolve tokens to directory identities
    Identity(IdentityArgs),
    /// Resolve tokens to graph subjects
    Subject(SubjectArgs),
    /// Encode, decode and inspect permission bits
    Permission(PermissionArgs),
    /// Inspect security namespaces
    Namespace(NamespaceArgs),
    Version,
}

#[derive(clap::Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Organization URL, e.g. https://dev.azure.com/contoso
    #[arg(long, env = "ADO_ORG_URL", global = true)]
    pub org: Option<String>,

    /// Personal access token
    #[arg(long, env = "ADO_PAT", global = true, hide_env_values = true)]
    pub pat: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    pub output: OutputFormat,

    /// Keep searching later filters when one filter matches several identities
    #[arg(long, global = true)]
    pub try_all_filters: bool,

    /// Debug logging on stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(clap::Args, Debug)]
pub struct IdentityArgs {
    #[command(subcommand)]
    pub cmd: IdentityCmd,
}

#[derive(clap::Args, Debug)]
pub struct SubjectArgs {
    #[command(subcommand)]
    pub cmd: SubjectCmd,
}

#[derive(clap::Args, Debug)]
pub struct PermissionArgs {
    #[command(subcommand)]
    pub cmd: PermissionCmd,
}

#[derive(clap::Args, Debug)]
pub struct NamespaceArgs {
    #[command(subcommand)]
    pub cmd: NamespaceCmd,
}
