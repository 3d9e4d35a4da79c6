mod aggregate;

pub use aggregate::{group_by_point_of_interest, AggregatedGroup, GroupEntry};

use crate::domain::Listing;
use crate::places::Registry;
use crate::templates::pages::report_page;
use chrono::Local;
use maud::Markup;
use std::path::Path;

/// The report for a set of listings against the registry.
pub fn render_report(listings: &[Listing], registry: &Registry) -> Markup {
    let groups = group_by_point_of_interest(listings, registry.points());
    report_page(&groups, listings.len(), registry.len(), Local::now())
}

/// Renders the report and writes it to `path`.
pub fn write_report(
    path: impl AsRef<Path>,
    listings: &[Listing],
    registry: &Registry,
) -> std::io::Result<()> {
    let html = render_report(listings, registry).into_string();
    std::fs::write(path, html)
}
