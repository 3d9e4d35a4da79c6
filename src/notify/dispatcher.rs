// notify/dispatcher.rs

use crate::notify::channel::NotificationChannel;
use crate::notify::digest::{format_digest, DigestOptions};
use crate::report::AggregatedGroup;
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchResult {
    /// Nothing matched, so nothing was sent.
    Skipped,
    Delivered { channel: &'static str },
    Failed { channel: &'static str, reason: String },
}

impl DispatchResult {
    pub fn is_success(&self) -> bool {
        !matches!(self, DispatchResult::Failed { .. })
    }
}

/// Sends one digest per run through a single channel. Failures are logged
/// and reported, never retried.
pub struct Dispatcher {
    channel: Box<dyn NotificationChannel>,
    options: DigestOptions,
}

impl Dispatcher {
    pub fn new(channel: Box<dyn NotificationChannel>, options: DigestOptions) -> Self {
        Self { channel, options }
    }

    pub fn dispatch(&self, groups: &[AggregatedGroup], total_listings: usize) -> DispatchResult {
        let channel = self.channel.name();

        if total_listings == 0 {
            info!("📭 No listings found, skipping {channel} notification");
            return DispatchResult::Skipped;
        }

        let message = format_digest(groups, total_listings, &self.options);
        info!(channel, chars = message.chars().count(), "📤 Sending digest");

        match self.channel.send(&message) {
            Ok(()) => DispatchResult::Delivered { channel },
            Err(e) => {
                error!(channel, "❌ Notification failed: {e}");
                DispatchResult::Failed {
                    channel,
                    reason: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Listing, NearbyMatch, RawRecord};
    use crate::geo::Coordinate;
    use crate::notify::channel::SendFailure;
    use crate::report::GroupEntry;
    use std::sync::{Arc, Mutex};

    struct Recording {
        sent: Arc<Mutex<Vec<String>>>,
        fail_with: Option<SendFailure>,
    }

    impl NotificationChannel for Recording {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn send(&self, message: &str) -> Result<(), SendFailure> {
            self.sent.lock().unwrap().push(message.to_string());
            match &self.fail_with {
                Some(e) => Err(e.clone()),
                None => Ok(()),
            }
        }
    }

    fn dispatcher(fail_with: Option<SendFailure>) -> (Dispatcher, Arc<Mutex<Vec<String>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let channel = Recording {
            sent: sent.clone(),
            fail_with,
        };
        (Dispatcher::new(Box::new(channel), DigestOptions::default()), sent)
    }

    fn one_group() -> Vec<AggregatedGroup> {
        let listing = Listing {
            record: RawRecord {
                address: "1 Main St, Phoenix, AZ".into(),
                price: "$350,000".into(),
                link: "https://example.com/1".into(),
                image: None,
                source: "ForSaleByOwner".into(),
                region: "Phoenix".into(),
            },
            coordinate: Coordinate::new(33.45, -112.07),
            nearby: vec![NearbyMatch {
                name: "Masjid A".into(),
                distance_miles: 0.9,
            }],
        };
        vec![AggregatedGroup {
            name: "Masjid A".into(),
            entries: vec![GroupEntry {
                listing,
                distance_miles: 0.9,
            }],
        }]
    }

    #[test]
    fn zero_listings_never_touch_the_channel() {
        let (d, sent) = dispatcher(None);

        let result = d.dispatch(&[], 0);

        assert_eq!(result, DispatchResult::Skipped);
        assert!(result.is_success());
        assert!(sent.lock().unwrap().is_empty());
    }

    #[test]
    fn sends_exactly_one_digest() {
        let (d, sent) = dispatcher(None);

        let result = d.dispatch(&one_group(), 1);

        assert_eq!(result, DispatchResult::Delivered { channel: "recording" });
        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].starts_with("🏠 Found 1 homes!"));
        assert!(sent[0].contains("*Masjid A* (1)"));
    }

    #[test]
    fn failure_is_reported_without_retry() {
        let (d, sent) = dispatcher(Some(SendFailure::ApiError("invalid key".into())));

        let result = d.dispatch(&one_group(), 1);

        assert_eq!(
            result,
            DispatchResult::Failed {
                channel: "recording",
                reason: "API error: invalid key".into()
            }
        );
        assert!(!result.is_success());
        assert_eq!(sent.lock().unwrap().len(), 1);
    }
}
