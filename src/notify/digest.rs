// notify/digest.rs

use crate::report::AggregatedGroup;
use std::fmt::Write;

const ADDRESS_MAX_CHARS: usize = 30;

/// Optional trailing lines of a digest.
#[derive(Debug, Clone, Default)]
pub struct DigestOptions {
    /// Where the full report lives, e.g. "http://localhost:8080".
    pub report_url: Option<String>,
    pub signature: Option<String>,
}

/// Plain-text digest. Sections are alphabetical by point name so the
/// message reads the same run to run; empty groups are left out.
pub fn format_digest(groups: &[AggregatedGroup], total_listings: usize, opts: &DigestOptions) -> String {
    let mut msg = format!("🏠 Found {total_listings} homes!\n");

    let mut sections: Vec<&AggregatedGroup> = groups.iter().filter(|g| !g.is_empty()).collect();
    sections.sort_by(|a, b| a.name.cmp(&b.name));

    for group in sections {
        let _ = write!(msg, "\n📌 *{}* ({})\n", group.name, group.len());
        for entry in &group.entries {
            let record = &entry.listing.record;
            let _ = write!(
                msg,
                "📍 {:.2}mi | {} | {}\n{}\n",
                entry.distance_miles,
                record.price,
                truncate_address(&record.address),
                record.link
            );
        }
    }

    if let Some(url) = opts.report_url.as_deref().filter(|u| !u.is_empty()) {
        let _ = write!(msg, "\nOpen {url} for full details.");
    }
    if let Some(sig) = opts.signature.as_deref().filter(|s| !s.is_empty()) {
        let _ = write!(msg, "\n{sig}");
    }

    msg
}

/// At most 30 characters, with "..." when cut.
pub fn truncate_address(address: &str) -> String {
    if address.chars().count() > ADDRESS_MAX_CHARS {
        let head: String = address.chars().take(ADDRESS_MAX_CHARS).collect();
        format!("{head}...")
    } else {
        address.to_string()
    }
}
