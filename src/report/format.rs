//! Formatted terminal output for `run`, `plan` and `verify`.
//!
//! Formatting lives here so the pipeline code stays free of presentation and
//! output changes stay localized.

use crate::app::pipeline::{PlanOutput, RunOutput};
use crate::verify::{CheckKind, CheckStatus, VerifyReport};

/// Human-readable byte count (`812 B`, `14.2 KiB`, `1.3 MiB`).
pub fn format_bytes(n: u64) -> String {
    const KIB: f64 = 1024.0;
    let f = n as f64;
    if f < KIB {
        format!("{n} B")
    } else if f < KIB * KIB {
        format!("{:.1} KiB", f / KIB)
    } else {
        format!("{:.1} MiB", f / (KIB * KIB))
    }
}

/// Summary printed after every derivation pass.
pub fn format_run_summary(run: &RunOutput) -> String {
    let mut out = String::new();

    out.push_str("=== respimg - run summary ===\n");
    out.push_str(&format!("Assets: {}\n", run.asset_dir.display()));
    out.push_str(&format!("Catalog: {}\n", run.catalog));

    let total: u64 = run.ledger.artifacts.iter().map(|a| a.bytes_written).sum();
    out.push_str(&format!(
        "Sources: {} processed | {} missing\n",
        run.sources.len(),
        run.missing.len()
    ));
    out.push_str(&format!(
        "Artifacts: {} written ({}) | {} failed\n",
        run.ledger.artifacts.len(),
        format_bytes(total),
        run.ledger.failures.len()
    ));

    if !run.missing.is_empty() {
        out.push_str("\nMissing sources:\n");
        for m in &run.missing {
            out.push_str(&format!("  - {}\n", m.name));
        }
    }

    if !run.ledger.failures.is_empty() {
        out.push_str("\nFailures:\n");
        for f in &run.ledger.failures {
            out.push_str(&format!(
                "  - {} [{}] {}: {}\n",
                f.source,
                f.stage,
                f.target.as_deref().unwrap_or("(source)"),
                f.message
            ));
        }
    }

    out
}

/// Listing of what a run would write.
pub fn format_plan(plan: &PlanOutput) -> String {
    let mut out = String::new();

    out.push_str("=== respimg - plan ===\n");
    out.push_str(&format!("Assets: {}\n", plan.asset_dir.display()));
    out.push_str(&format!("Catalog: {}\n", plan.catalog));

    for (source, sp) in &plan.plans {
        out.push_str(&format!(
            "\n{}.{} ({}x{})\n",
            source.basename, source.extension, source.natural_width, source.natural_height
        ));
        match &sp.full {
            Some(full) => out.push_str(&format!("  full  -> {}\n", full.file_name(&sp.basename))),
            None => out.push_str("  full  -> skipped (would overwrite source)\n"),
        }
        for tier in &sp.tiers {
            let names: Vec<String> = tier.variants.iter().map(|v| v.file_name(&sp.basename)).collect();
            out.push_str(&format!("  {:<6}-> {}\n", tier.breakpoint.tier, names.join(", ")));
        }
    }

    for m in &plan.missing {
        out.push_str(&format!("\n{} (missing, skipped)\n", m.name));
    }
    for f in &plan.probe_failures {
        out.push_str(&format!("\n{} (unreadable: {})\n", f.name, f.message));
    }

    let count: usize = plan.plans.iter().map(|(_, p)| p.file_names().len()).sum();
    out.push_str(&format!("\nTotal: {count} artifacts\n"));
    out
}

fn kind_label(kind: CheckKind) -> &'static str {
    match kind {
        CheckKind::Source => "source",
        CheckKind::Output => "output",
        CheckKind::Stylesheet => "stylesheet",
        CheckKind::Required => "required",
    }
}

fn status_label(status: &CheckStatus) -> String {
    match status {
        CheckStatus::Present(n) => format!("ok ({})", format_bytes(*n)),
        CheckStatus::Referenced(n) => format!("ok ({n} references)"),
        CheckStatus::Missing => "MISSING".to_string(),
        CheckStatus::Empty => "EMPTY".to_string(),
        CheckStatus::Skipped => "skipped".to_string(),
        CheckStatus::Failed(msg) => format!("FAILED: {msg}"),
    }
}

pub fn format_verify_report(report: &VerifyReport) -> String {
    let mut out = String::new();
    out.push_str("=== respimg - verify ===\n");
    for c in &report.checks {
        let mark = if c.status.is_failure() { "✗" } else { "✓" };
        out.push_str(&format!(
            "{mark} {:<10} {:<32} {}\n",
            kind_label(c.kind),
            c.target,
            status_label(&c.status)
        ));
    }
    let failed = report.failures().count();
    out.push_str(&format!("\n{} checks, {} failed\n", report.checks.len(), failed));
    out
}
