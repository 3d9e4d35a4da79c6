use crate::report::GroupEntry;
use maud::{html, Markup};

const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/300x200?text=No+Image";

/// One listing inside a point-of-interest section.
pub fn listing_card(entry: &GroupEntry, point_name: &str) -> Markup {
    let record = &entry.listing.record;
    let image = record
        .image
        .as_deref()
        .filter(|src| src.contains("http"))
        .unwrap_or(PLACEHOLDER_IMAGE);

    html! {
        div class="card" {
            img src=(image) alt="Home";
            div class="card-content" {
                div class="source-badge" { (record.source) }
                div class="price" { (record.price) }
                div class="address" { (record.address) }
                div class="dist-badge" { "📍 " (format!("{:.2}", entry.distance_miles)) " miles away" }
                @if let Some(closest) = entry.listing.closest().filter(|m| m.name != point_name) {
                    div class="closest" {
                        "Closest: " (closest.name) " (" (format!("{:.2}", closest.distance_miles)) " mi)"
                    }
                }
                div class="actions" {
                    a href=(record.link) target="_blank" class="btn btn-view" { "View details" }
                    a href=(share_link(entry, point_name)) target="_blank" class="btn btn-wa" { "WhatsApp" }
                }
            }
        }
    }
}

/// wa.me link with a prefilled message about the listing.
pub fn share_link(entry: &GroupEntry, point_name: &str) -> String {
    let record = &entry.listing.record;
    let text = format!(
        "Check this house near {point_name} ({:.2} mi): {} - {} - {}",
        entry.distance_miles, record.address, record.price, record.link
    );
    let encoded: String = url::form_urlencoded::byte_serialize(text.as_bytes()).collect();
    format!("https://wa.me/?text={encoded}")
}
