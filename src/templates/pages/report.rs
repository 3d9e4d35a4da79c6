// templates/pages/report.rs

use crate::report::AggregatedGroup;
use crate::templates::{desktop_layout, listing_card};
use chrono::{DateTime, Local};
use maud::{html, Markup};

/// Listings grouped by point of interest. Groups without listings are left out;
/// if every group is empty a "no matches" notice is shown instead.
pub fn report_page(
    groups: &[AggregatedGroup],
    total_listings: usize,
    point_count: usize,
    generated_at: DateTime<Local>,
) -> Markup {
    let has_listings = groups.iter().any(|g| !g.is_empty());

    desktop_layout(
        "House Finder",
        html! {
            h1 { "Compatible Homes Near Points of Interest" }
            div class="status-bar" {
                "Tracking " (total_listings) " listings across " (point_count) " points of interest"
                " · updated " (generated_at.format("%Y-%m-%d %H:%M"))
            }

            @for group in groups.iter().filter(|g| !g.is_empty()) {
                div class="poi-section" {
                    div class="poi-title" { (group.name) " · " (group.len()) " found" }
                    div class="container" {
                        @for entry in &group.entries {
                            (listing_card(entry, &group.name))
                        }
                    }
                }
            }

            @if !has_listings {
                div class="empty" {
                    "No matching houses found in this run. Try scanning again, or check whether a source is blocking requests."
                }
            }
        },
    )
}
