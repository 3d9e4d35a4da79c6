// src/report/aggregate.rs

use crate::domain::Listing;
use crate::places::PointOfInterest;
use std::collections::HashMap;

/// A listing as seen from one point of interest.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupEntry {
    pub listing: Listing,
    /// Distance to this group's point, not necessarily the listing's closest.
    pub distance_miles: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedGroup {
    pub name: String,
    /// Closest first.
    pub entries: Vec<GroupEntry>,
}

impl AggregatedGroup {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One group per point of interest, in registry order, empty ones included.
/// A listing lands in every group it matched, each time with that group's distance.
pub fn group_by_point_of_interest(
    listings: &[Listing],
    points: &[PointOfInterest],
) -> Vec<AggregatedGroup> {
    let mut groups: Vec<AggregatedGroup> = Vec::with_capacity(points.len());
    let mut index: HashMap<String, usize> = HashMap::new();

    for point in points {
        if index.contains_key(&point.name) {
            continue;
        }
        index.insert(point.name.clone(), groups.len());
        groups.push(AggregatedGroup::new(&point.name));
    }

    for listing in listings {
        for m in &listing.nearby {
            // Snapshots written against an older registry may name unknown points.
            let slot = *index.entry(m.name.clone()).or_insert_with(|| {
                groups.push(AggregatedGroup::new(&m.name));
                groups.len() - 1
            });

            groups[slot].entries.push(GroupEntry {
                listing: listing.clone(),
                distance_miles: m.distance_miles,
            });
        }
    }

    for group in &mut groups {
        group
            .entries
            .sort_by(|a, b| a.distance_miles.total_cmp(&b.distance_miles));
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NearbyMatch, RawRecord};
    use crate::geo::Coordinate;

    fn listing(link: &str, matches: &[(&str, f64)]) -> Listing {
        Listing {
            record: RawRecord {
                address: format!("{link} address"),
                price: "$1".into(),
                link: link.into(),
                image: None,
                source: "Homes.com".into(),
                region: "Phoenix".into(),
            },
            coordinate: Coordinate::new(33.46, -112.06),
            nearby: matches
                .iter()
                .map(|(n, d)| NearbyMatch {
                    name: n.to_string(),
                    distance_miles: *d,
                })
                .collect(),
        }
    }

    fn points(names: &[&str]) -> Vec<PointOfInterest> {
        names
            .iter()
            .map(|n| PointOfInterest::new(*n, Coordinate::new(33.45, -112.07)))
            .collect()
    }

    #[test]
    fn every_match_appears_once_with_its_own_distance() {
        let listings = vec![
            listing("a", &[("North", 1.0), ("South", 4.0)]),
            listing("b", &[("South", 0.5)]),
            listing("c", &[("South", 2.0), ("North", 3.0), ("East", 4.5)]),
        ];
        let groups = group_by_point_of_interest(&listings, &points(&["North", "South", "East"]));

        for l in &listings {
            let appearances: Vec<(&str, f64)> = groups
                .iter()
                .flat_map(|g| {
                    g.entries
                        .iter()
                        .filter(|e| e.listing.link() == l.link())
                        .map(move |e| (g.name.as_str(), e.distance_miles))
                })
                .collect();

            assert_eq!(appearances.len(), l.nearby.len());
            for m in &l.nearby {
                assert!(appearances.contains(&(m.name.as_str(), m.distance_miles)));
            }
        }
    }

    #[test]
    fn groups_follow_registry_order_and_sort_by_group_distance() {
        let listings = vec![
            listing("far", &[("South", 4.0)]),
            listing("near", &[("South", 0.5)]),
            listing("mid", &[("South", 2.0)]),
        ];
        let groups = group_by_point_of_interest(&listings, &points(&["North", "South"]));

        let names: Vec<_> = groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, ["North", "South"]);
        assert!(groups[0].is_empty());

        let order: Vec<_> = groups[1].entries.iter().map(|e| e.listing.link()).collect();
        assert_eq!(order, ["near", "mid", "far"]);
    }

    #[test]
    fn unknown_points_get_trailing_groups() {
        let listings = vec![listing("a", &[("Retired", 1.0)])];
        let groups = group_by_point_of_interest(&listings, &points(&["North"]));

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1].name, "Retired");
        assert_eq!(groups[1].len(), 1);
    }

    #[test]
    fn no_listings_still_yields_every_group() {
        let groups = group_by_point_of_interest(&[], &points(&["North", "South"]));
        assert_eq!(groups.len(), 2);
        assert!(groups.iter().all(AggregatedGroup::is_empty));
    }
}
