// scraper/sources.rs
use crate::domain::RawRecord;
use crate::scraper::models::{format_price, Property};
use crate::scraper::ScraperError;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Turns one fetched search page into raw records.
pub trait SourceExtractor: Send + Sync {
    /// Label stored on every record, e.g. "Homes.com".
    fn name(&self) -> &'static str;

    /// Search page for 2+ bed, 2+ bath single-story homes in `region`.
    fn search_url(&self, region: &str, state: &str) -> String;

    /// Cards that can't be read are skipped; only a page that can't be
    /// understood at all is an error.
    fn extract(&self, html: &str, region: &str) -> Result<Vec<RawRecord>, ScraperError>;
}

/// Looks up a source by its config key.
pub fn source_by_key(key: &str) -> Option<Box<dyn SourceExtractor>> {
    match key.trim().to_ascii_lowercase().as_str() {
        "fsbo" | "forsalebyowner" => Some(Box::new(ForSaleByOwner)),
        "homes" | "homes.com" => Some(Box::new(HomesCom)),
        "realtor" | "realtor.com" => Some(Box::new(Realtor)),
        _ => None,
    }
}

fn sel(css: &str) -> Result<Selector, ScraperError> {
    Selector::parse(css).map_err(|e| ScraperError::HtmlParse(format!("{css}: {e}")))
}

/// Visible text with whitespace collapsed.
fn text_of(el: ElementRef<'_>) -> String {
    el.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}

fn absolute(base: &str, href: &str) -> String {
    if href.starts_with("http") {
        href.to_string()
    } else {
        format!("{base}{href}")
    }
}

fn first_img_src(card: ElementRef<'_>, img: &Selector) -> Option<String> {
    card.select(img)
        .next()
        .and_then(|i| i.value().attr("src"))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Drops repeated links within one page (nested card markup).
fn dedup_links(records: Vec<RawRecord>) -> Vec<RawRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(r.link.clone()))
        .collect()
}

pub struct ForSaleByOwner;

impl ForSaleByOwner {
    const BASE: &'static str = "https://www.forsalebyowner.com";
}

impl SourceExtractor for ForSaleByOwner {
    fn name(&self) -> &'static str {
        "ForSaleByOwner"
    }

    fn search_url(&self, region: &str, state: &str) -> String {
        format!(
            "{}/search/list/{}-{}/2-beds/2-baths/single-story",
            Self::BASE,
            region.replace(' ', "-"),
            state
        )
    }

    fn extract(&self, html: &str, region: &str) -> Result<Vec<RawRecord>, ScraperError> {
        let document = Html::parse_document(html);
        let card_sel = sel(r#"div[class*="card-"]"#)?;
        let fallback_sel = sel("div.shadow.rounded-lg.relative.flex")?;
        let link_sel = sel(r#"a[href^="/listing/"]"#)?;
        let price_sel = sel("span.text-xl")?;
        let img_sel = sel("img")?;

        let mut cards: Vec<ElementRef> = document.select(&card_sel).collect();
        if cards.is_empty() {
            cards = document.select(&fallback_sel).collect();
        }
        debug!("Found {} cards on FSBO in {region}", cards.len());

        let mut out = Vec::new();
        for card in cards {
            let Some(link_el) = card.select(&link_sel).next() else {
                continue;
            };
            let Some(href) = link_el.value().attr("href") else {
                continue;
            };

            // The anchor's own text is the street; city/state sit in a child span.
            let address = link_el
                .children()
                .find_map(|n| n.value().as_text().map(|t| t.trim().to_string()))
                .filter(|a| !a.is_empty());
            let Some(address) = address else {
                continue;
            };

            let price = card
                .select(&price_sel)
                .map(text_of)
                .find(|t| t.contains('$'))
                .unwrap_or_else(|| "N/A".to_string());

            out.push(RawRecord {
                address,
                price,
                link: absolute(Self::BASE, href),
                image: first_img_src(card, &img_sel),
                source: self.name().to_string(),
                region: region.to_string(),
            });
        }

        Ok(dedup_links(out))
    }
}

pub struct HomesCom;

impl HomesCom {
    const BASE: &'static str = "https://www.homes.com";
}

impl SourceExtractor for HomesCom {
    fn name(&self) -> &'static str {
        "Homes.com"
    }

    fn search_url(&self, region: &str, state: &str) -> String {
        format!(
            "{}/{}-{}/homes-for-sale/2-bedroom/?property_type=1&bathrooms=2g",
            Self::BASE,
            region.to_lowercase().replace(' ', "-"),
            state.to_lowercase()
        )
    }

    fn extract(&self, html: &str, region: &str) -> Result<Vec<RawRecord>, ScraperError> {
        let document = Html::parse_document(html);
        let card_sel = sel(r#"article[data-testid="listing-card"]"#)?;
        let fallback_sel = sel(".placards-list ul li article")?;
        let price_sel = sel(".price-container")?;
        let address_sel = sel(".property-name")?;
        let link_sel = sel("a[href]")?;
        let img_sel = sel("img")?;

        let mut cards: Vec<ElementRef> = document.select(&card_sel).collect();
        if cards.is_empty() {
            cards = document.select(&fallback_sel).collect();
        }
        debug!("Found {} cards on Homes.com in {region}", cards.len());

        let mut out = Vec::new();
        for card in cards {
            let price = card.select(&price_sel).next().map(text_of);
            let address = card.select(&address_sel).next().map(text_of);
            let href = card
                .select(&link_sel)
                .next()
                .and_then(|a| a.value().attr("href"));

            let (Some(price), Some(address), Some(href)) = (price, address, href) else {
                continue;
            };
            if address.is_empty() {
                continue;
            }

            out.push(RawRecord {
                address,
                price,
                link: absolute(Self::BASE, href),
                image: first_img_src(card, &img_sel),
                source: self.name().to_string(),
                region: region.to_string(),
            });
        }

        Ok(dedup_links(out))
    }
}

/// Realtor.com ships its results as JSON in a `__NEXT_DATA__` script tag.
pub struct Realtor;

impl Realtor {
    const BASE: &'static str = "https://www.realtor.com";

    fn extract_next_data(html: &str) -> Result<Value, ScraperError> {
        let document = Html::parse_document(html);
        let selector = sel(r#"script[id="__NEXT_DATA__"]"#)?;

        let element = document
            .select(&selector)
            .next()
            .ok_or(ScraperError::MissingNextData)?;

        let json_text: String = element.text().collect();
        if json_text.trim().is_empty() {
            return Err(ScraperError::MissingNextData);
        }
        serde_json::from_str(&json_text).map_err(|e| ScraperError::JsonParse(e.to_string()))
    }

    fn extract_properties(data: &Value) -> Result<Vec<Property>, ScraperError> {
        let arr = data["props"]["pageProps"]["properties"]
            .as_array()
            .ok_or_else(|| ScraperError::UnexpectedShape("properties missing".to_string()))?;

        Ok(arr
            .iter()
            .filter_map(|v| match serde_json::from_value(v.clone()) {
                Ok(p) => Some(p),
                Err(e) => {
                    warn!("⚠️ Skipping unreadable Realtor property: {e}");
                    None
                }
            })
            .collect())
    }
}

impl SourceExtractor for Realtor {
    fn name(&self) -> &'static str {
        "Realtor.com"
    }

    fn search_url(&self, region: &str, state: &str) -> String {
        format!(
            "{}/realestateandhomes-search/{}_{}/beds-2/baths-2/type-single-story-home",
            Self::BASE,
            region.replace(' ', "-"),
            state
        )
    }

    fn extract(&self, html: &str, region: &str) -> Result<Vec<RawRecord>, ScraperError> {
        let data = Self::extract_next_data(html)?;
        let properties = Self::extract_properties(&data)?;

        let out = properties
            .into_iter()
            .filter_map(|prop| {
                let permalink = prop.permalink.filter(|p| !p.is_empty())?;
                let address = prop.location?.address?.full()?;

                Some(RawRecord {
                    address,
                    price: prop
                        .list_price
                        .map(format_price)
                        .unwrap_or_else(|| "N/A".to_string()),
                    link: format!("{}/realestateandhomes-detail/{permalink}", Self::BASE),
                    image: prop.primary_photo.and_then(|p| p.href),
                    source: self.name().to_string(),
                    region: region.to_string(),
                })
            })
            .collect();

        Ok(dedup_links(out))
    }
}
