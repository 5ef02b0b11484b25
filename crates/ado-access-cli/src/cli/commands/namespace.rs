//! `ado-access namespace` - Inspect security namespaces.

use clap::{Args, Subcommand};

use ado_access::{hex_literal, AccessService, SecurityNamespace};

use crate::cli::args::{GlobalArgs, OutputFormat};
use crate::cli::helpers::{client, print_json, render_table};
use crate::exit_codes::EXIT_SUCCESS;

#[derive(Subcommand, Debug)]
pub enum NamespaceCmd {
    /// List the actions (permission bits) a namespace defines
    ListActions(ListActionsArgs),
}

#[derive(Args, Debug)]
pub struct ListActionsArgs {
    /// Security namespace id or name
    pub namespace: String,
}

pub async fn run(cmd: NamespaceCmd, global: &GlobalArgs) -> anyhow::Result<i32> {
    match cmd {
        NamespaceCmd::ListActions(args) => list_actions(args, global).await,
    }
}

async fn list_actions(args: ListActionsArgs, global: &GlobalArgs) -> anyhow::Result<i32> {
    let client = client(global)?;
    let namespace = AccessService::new(&client)
        .namespace(&args.namespace)
        .await?;

    match global.output {
        OutputFormat::Json => print_json(&namespace.actions)?,
        OutputFormat::Table => print!("{}", render_actions(&namespace)),
    }
    Ok(EXIT_SUCCESS)
}

fn render_actions(namespace: &SecurityNamespace) -> String {
    let mut actions: Vec<_> = namespace.actions.iter().collect();
    actions.sort_by_key(|a| a.bit as u32);

    let rows: Vec<Vec<String>> = actions
        .iter()
        .map(|a| {
            vec![
                hex_literal(a.bit),
                a.bit.to_string(),
                a.name.clone(),
                a.display_name.clone(),
            ]
        })
        .collect();
    render_table(&["Hex", "Bit", "Name", "Display name"], &rows)
}
