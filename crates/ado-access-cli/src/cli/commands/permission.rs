//! `ado-access permission` - Encode, decode and show permission bits.

use clap::{Args, Subcommand};
use serde::Serialize;

use ado_access::{hex_literal, AccessService, PermissionBits, PermissionReport};

use crate::cli::args::{GlobalArgs, OutputFormat};
use crate::cli::helpers::{client, policy, print_json, render_fields, render_table};
use crate::exit_codes::EXIT_SUCCESS;

#[derive(Subcommand, Debug)]
pub enum PermissionCmd {
    /// Turn permission names or values into a bitmask
    Encode(EncodeArgs),

    /// Turn a bitmask into permission names
    Decode(DecodeArgs),

    /// Show a subject's permissions on a security token
    Show(ShowArgs),
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Security namespace id or name
    #[arg(long)]
    pub namespace: String,

    /// Comma-separated names, display names, `Bit <n>`, decimal or 0x-hex values
    pub permissions: String,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Security namespace id or name
    #[arg(long)]
    pub namespace: String,

    /// Bitmask, decimal or 0x-hex
    #[arg(value_parser = parse_mask, allow_hyphen_values = true)]
    pub mask: PermissionBits,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Security namespace id or name
    #[arg(long)]
    pub namespace: String,

    /// Security token, e.g. repoV2/<projectId>/<repositoryId>
    #[arg(long)]
    pub token: String,

    /// Subject: mail address, alias, group name, SID or descriptor
    #[arg(long)]
    pub subject: String,

    /// Only report these permissions (comma-separated)
    #[arg(long)]
    pub permissions: Option<String>,
}

/// Encoded or decoded mask, as printed with `--output json`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MaskOutput<'a> {
    namespace_id: &'a str,
    bits: PermissionBits,
    hex: String,
    permissions: String,
}

pub async fn run(cmd: PermissionCmd, global: &GlobalArgs) -> anyhow::Result<i32> {
    match cmd {
        PermissionCmd::Encode(args) => encode(args, global).await,
        PermissionCmd::Decode(args) => decode(args, global).await,
        PermissionCmd::Show(args) => show(args, global).await,
    }
}

async fn encode(args: EncodeArgs, global: &GlobalArgs) -> anyhow::Result<i32> {
    let client = client(global)?;
    let service = AccessService::new(&client);

    let namespace = service.namespace(&args.namespace).await?;
    let bits = service.encode_permissions(&namespace, &args.permissions)?;
    print_mask(
        global.output,
        MaskOutput {
            namespace_id: &namespace.namespace_id,
            bits,
            hex: hex_literal(bits),
            permissions: service.decode_permissions(&namespace, bits),
        },
    )?;
    Ok(EXIT_SUCCESS)
}

async fn decode(args: DecodeArgs, global: &GlobalArgs) -> anyhow::Result<i32> {
    let client = client(global)?;
    let service = AccessService::new(&client);

    let namespace = service.namespace(&args.namespace).await?;
    print_mask(
        global.output,
        MaskOutput {
            namespace_id: &namespace.namespace_id,
            bits: args.mask,
            hex: hex_literal(args.mask),
            permissions: service.decode_permissions(&namespace, args.mask),
        },
    )?;
    Ok(EXIT_SUCCESS)
}

async fn show(args: ShowArgs, global: &GlobalArgs) -> anyhow::Result<i32> {
    let client = client(global)?;
    let service = AccessService::new(&client).with_policy(policy(global));

    let namespace = service.namespace(&args.namespace).await?;
    let report = service
        .show_permissions(
            &namespace,
            &args.token,
            &args.subject,
            args.permissions.as_deref(),
        )
        .await?;

    match global.output {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => print!("{}", render_report(&report)),
    }
    Ok(EXIT_SUCCESS)
}

fn print_mask(output: OutputFormat, mask: MaskOutput<'_>) -> anyhow::Result<()> {
    match output {
        OutputFormat::Json => print_json(&mask)?,
        OutputFormat::Table => print!(
            "{}",
            render_fields(&[
                ("Bits", mask.bits.to_string()),
                ("Hex", mask.hex),
                ("Permissions", mask.permissions),
            ])
        ),
    }
    Ok(())
}

fn render_report(report: &PermissionReport) -> String {
    let mut out = render_fields(&[
        ("Subject", report.display_name.clone()),
        ("Descriptor", report.descriptor.clone()),
        ("Token", report.token.clone()),
        ("Allow", report.allow.clone()),
        ("Deny", report.deny.clone()),
        ("Effective allow", report.effective_allow.clone()),
        ("Effective deny", report.effective_deny.clone()),
    ]);
    out.push('\n');

    let rows: Vec<Vec<String>> = report
        .permissions
        .iter()
        .map(|b| vec![hex_literal(b.bit), b.name.clone(), b.state.to_string()])
        .collect();
    out.push_str(&render_table(&["Bit", "Permission", "State"], &rows));
    out
}

/// Decimal or `0x` hex; values above `i32::MAX` wrap so the top bit can be written in hex.
fn parse_mask(raw: &str) -> Result<PermissionBits, String> {
    let raw = raw.trim();
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16),
        None => raw.parse::<i64>(),
    }
    .map_err(|e| format!("invalid bitmask '{}': {}", raw, e))?;

    PermissionBits::try_from(parsed)
        .or_else(|_| u32::try_from(parsed).map(|v| v as PermissionBits))
        .map_err(|_| format!("bitmask '{}' does not fit in 32 bits", raw))
}
