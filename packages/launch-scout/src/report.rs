//! Console rendering of run results.

use crate::types::record::ExtractionRecord;
use crate::types::summary::RunSummary;

const RULE_WIDTH: usize = 60;

/// Numbered record listing followed by the total.
pub fn render_records(records: &[ExtractionRecord]) -> String {
    let mut out = String::from("=== AI Tool Discovery Results ===\n");

    for (index, record) in records.iter().enumerate() {
        out.push_str(&format!("\n{}. {}\n", index + 1, record.title));
        if record.website != record.source_url {
            out.push_str(&format!("   Website: {}\n", record.website));
        }
        out.push_str(&format!("   Source: {}\n", record.source_url));
        out.push_str(&format!("   Summary: {}\n", record.summary));
        if !record.features.is_empty() {
            let shown: Vec<&str> = record.features.iter().take(3).map(String::as_str).collect();
            out.push_str(&format!("   Features: {}\n", shown.join(", ")));
        }
        if let Some(pricing) = &record.pricing {
            out.push_str(&format!("   Pricing: {}\n", pricing));
        }
        out.push_str(&"-".repeat(RULE_WIDTH));
        out.push('\n');
    }

    out.push_str(&format!("\nTotal AI Tools Discovered: {}\n", records.len()));
    out
}

/// Counts, the itemized error list, and the persistent blacklist.
pub fn render_summary(summary: &RunSummary) -> String {
    let mut out = format!(
        "\n=== Run Summary ({}) ===\n\
         URLs processed: {}\n\
         Fetched: {}\n\
         Failed: {}\n\
         Skipped: {}\n\
         Extraction failures: {}\n",
        summary.run_id,
        summary.processed,
        summary.fetched,
        summary.failed,
        summary.skipped,
        summary.extraction_failures,
    );

    if !summary.errors.is_empty() {
        out.push_str("\nErrors:\n");
        for failure in &summary.errors {
            out.push_str(&format!(
                "  - {} [{}] {}\n",
                failure.url, failure.kind, failure.detail
            ));
        }
    }

    if summary.blacklisted.is_empty() {
        out.push_str("\nBlacklisted domains: none\n");
    } else {
        out.push_str(&format!(
            "\nBlacklisted domains ({}): {}\n",
            summary.blacklisted.len(),
            summary.blacklisted.join(", ")
        ));
    }

    out
}
