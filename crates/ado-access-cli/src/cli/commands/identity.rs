//! `ado-access identity` - Resolve a token to a directory identity.

use clap::{Args, Subcommand};

use ado_access::{AccessService, DirectoryIdentity};

use crate::cli::args::{GlobalArgs, OutputFormat};
use crate::cli::helpers::{client, policy, print_json, render_fields};
use crate::exit_codes::{EXIT_SUCCESS, USER_ERROR};

#[derive(Subcommand, Debug)]
pub enum IdentityCmd {
    /// Resolve a mail address, alias, group name, SID or descriptor
    Resolve(ResolveArgs),
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Token identifying the identity
    pub token: String,
}

pub async fn run(cmd: IdentityCmd, global: &GlobalArgs) -> anyhow::Result<i32> {
    match cmd {
        IdentityCmd::Resolve(args) => resolve(args, global).await,
    }
}

async fn resolve(args: ResolveArgs, global: &GlobalArgs) -> anyhow::Result<i32> {
    let client = client(global)?;
    let service = AccessService::new(&client).with_policy(policy(global));

    let identity = service.resolve_identity(&args.token).await?;
    match (identity, global.output) {
        (Some(identity), OutputFormat::Json) => print_json(&identity)?,
        (Some(identity), OutputFormat::Table) => print!("{}", render_identity(&identity)),
        (None, OutputFormat::Json) => {
            print_json(&serde_json::Value::Null)?;
            return Ok(USER_ERROR);
        }
        (None, OutputFormat::Table) => {
            eprintln!("No identity found for '{}'", args.token.trim());
            return Ok(USER_ERROR);
        }
    }
    Ok(EXIT_SUCCESS)
}

fn render_identity(identity: &DirectoryIdentity) -> String {
    render_fields(&[
        ("Display name", identity.display_name().to_string()),
        ("Id", identity.storage_key().unwrap_or_default().to_string()),
        (
            "Descriptor",
            identity.descriptor.clone().unwrap_or_default(),
        ),
        (
            "Subject descriptor",
            identity.subject_descriptor().unwrap_or_default().to_string(),
        ),
        (
            "Kind",
            if identity.is_container { "Group" } else { "User" }.to_string(),
        ),
        (
            "Mail",
            identity.property_str("Mail").unwrap_or_default().to_string(),
        ),
        (
            "Account",
            identity
                .property_str("Account")
                .unwrap_or_default()
                .to_string(),
        ),
    ])
}
