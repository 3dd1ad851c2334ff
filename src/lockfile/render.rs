//! Canonical lock-file rendering

use std::fmt::Write;

use super::{Locks, ProviderLock};
use crate::domain::{Namespace, ProviderAddress};

const HEADER: &str = "# This file is maintained automatically by \"terraform init\".\n\
                      # Manual edits may be lost in future updates.\n";

impl Locks {
    /// Render the locks as lock-file text
    ///
    /// Blocks are ordered by address, so equal locks always render the same
    /// bytes. The output loads back to an equal set of providers.
    pub fn render(&self) -> String {
        let mut blocks: Vec<(&ProviderAddress, String)> = self
            .providers
            .values()
            .map(|lock| (&lock.addr, render_provider(lock)))
            .chain(
                self.overridden_providers
                    .iter()
                    .map(|addr| (addr, render_overridden(addr))),
            )
            .collect();
        blocks.sort_by(|a, b| a.0.cmp(b.0));

        let mut out = String::from(HEADER);
        for (_, block) in blocks {
            out.push('\n');
            out.push_str(&block);
        }
        out
    }
}

/// Source label that parses back to the same address
fn source_label(addr: &ProviderAddress) -> String {
    match addr.namespace {
        Namespace::Unknown if addr.is_default_registry() => addr.provider_type.clone(),
        _ => addr.to_string(),
    }
}

fn render_provider(lock: &ProviderLock) -> String {
    let mut out = format!("provider {} {{\n", quote(&source_label(&lock.addr)));
    match &lock.version_constraints {
        Some(constraints) => {
            let _ = writeln!(out, "  version     = {}", quote(&lock.version.to_string()));
            let _ = writeln!(out, "  constraints = {}", quote(&constraints.to_string()));
        }
        None => {
            let _ = writeln!(out, "  version = {}", quote(&lock.version.to_string()));
        }
    }
    if !lock.hashes.is_empty() {
        out.push_str("  hashes = [\n");
        for hash in &lock.hashes {
            let _ = writeln!(out, "    {},", quote(hash));
        }
        out.push_str("  ]\n");
    }
    out.push_str("}\n");
    out
}

fn render_overridden(addr: &ProviderAddress) -> String {
    format!(
        "provider {} {{\n  overridden = true\n}}\n",
        quote(&source_label(addr))
    )
}

/// Quote a string so the lexer decodes it back unchanged
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '$' | '%' if chars.peek() == Some(&'{') => {
                out.push(c);
                out.push(c);
            }
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
