use anyhow::Context;
use serde::Serialize;

use ado_access::{AdoClient, AdoConfig, AmbiguityPolicy};

use super::args::GlobalArgs;

/// Build a client from env, with `--org` / `--pat` taking precedence.
pub fn client(global: &GlobalArgs) -> anyhow::Result<AdoClient> {
    let mut config = AdoConfig::from_env();
    if let Some(org) = &global.org {
        config = config.with_organization_url(org.as_str());
    }
    if let Some(pat) = &global.pat {
        config = config.with_pat(pat.as_str());
    }
    AdoClient::new(config).context("failed to configure Azure DevOps client")
}

pub fn policy(global: &GlobalArgs) -> AmbiguityPolicy {
    if global.try_all_filters {
        AmbiguityPolicy::TryAllFilters
    } else {
        AmbiguityPolicy::FailFast
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// `label: value` lines with aligned values. Empty values are skipped.
pub fn render_fields(fields: &[(&str, String)]) -> String {
    let width = fields.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    fields
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| format!("{:<width$}  {}\n", format!("{k}:"), v, width = width + 1))
        .collect()
}

/// Left-aligned columns separated by two spaces.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.len());
            }
        }
    }

    let line = |cells: Vec<&str>| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:<w$}", cell, w = *w))
            .collect();
        format!("{}\n", padded.join("  ").trim_end())
    };

    let mut out = line(headers.to_vec());
    for row in rows {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
    }
    out
}
