use serde::Deserialize;

// Realtor.com search results, as embedded in __NEXT_DATA__:
//
// props.pageProps.properties[]
//  ├── permalink
//  ├── list_price
//  ├── location
//  │    └── address
//  │         ├── line
//  │         ├── city
//  │         ├── state_code
//  │         └── postal_code
//  └── primary_photo
//       └── href

#[derive(Debug, Deserialize)]
pub struct Property {
    pub permalink: Option<String>,
    pub list_price: Option<i64>,
    pub location: Option<Location>,
    pub primary_photo: Option<Photo>,
}

#[derive(Debug, Deserialize)]
pub struct Location {
    pub address: Option<Address>,
}

#[derive(Debug, Deserialize)]
pub struct Address {
    pub line: Option<String>,
    pub city: Option<String>,
    #[serde(rename = "state_code")]
    pub state_code: Option<String>,
    #[serde(rename = "postal_code")]
    pub postal_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Photo {
    pub href: Option<String>,
}

impl Address {
    /// "line, city, ST 12345", skipping missing parts.
    pub fn full(&self) -> Option<String> {
        let line = self.line.as_deref().filter(|s| !s.trim().is_empty())?;

        let mut parts = vec![line.trim().to_string()];
        if let Some(city) = self.city.as_deref().filter(|s| !s.is_empty()) {
            parts.push(city.to_string());
        }

        let tail = [self.state_code.as_deref(), self.postal_code.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !tail.is_empty() {
            parts.push(tail);
        }

        Some(parts.join(", "))
    }
}

/// "$425,000" from 425000.
pub fn format_price(price: i64) -> String {
    let digits = price.abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 2);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if price < 0 {
        format!("-${out}")
    } else {
        format!("${out}")
    }
}
