//! `ado-access subject` - Resolve a token to a graph subject.

use clap::{Args, Subcommand};

use ado_access::{AccessService, Subject};

use crate::cli::args::{GlobalArgs, OutputFormat};
use crate::cli::helpers::{client, policy, print_json, render_fields};
use crate::exit_codes::EXIT_SUCCESS;

#[derive(Subcommand, Debug)]
pub enum SubjectCmd {
    /// Resolve a mail address, alias, group name, SID or graph descriptor
    Resolve(ResolveArgs),
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Token identifying the subject
    pub token: String,
}

pub async fn run(cmd: SubjectCmd, global: &GlobalArgs) -> anyhow::Result<i32> {
    match cmd {
        SubjectCmd::Resolve(args) => resolve(args, global).await,
    }
}

async fn resolve(args: ResolveArgs, global: &GlobalArgs) -> anyhow::Result<i32> {
    let client = client(global)?;
    let service = AccessService::new(&client).with_policy(policy(global));

    let subject = service.resolve_subject(&args.token).await?;
    match global.output {
        OutputFormat::Json => print_json(&subject)?,
        OutputFormat::Table => print!("{}", render_subject(&subject)),
    }
    Ok(EXIT_SUCCESS)
}

fn render_subject(subject: &Subject) -> String {
    let text = |v: &Option<String>| v.clone().unwrap_or_default();
    render_fields(&[
        ("Display name", subject.display_name.clone()),
        ("Descriptor", subject.descriptor.clone()),
        ("Kind", subject.subject_kind.to_string()),
        ("Origin", text(&subject.origin)),
        ("Origin id", text(&subject.origin_id)),
        ("Principal name", text(&subject.principal_name)),
        ("Mail", text(&subject.mail_address)),
    ])
}
