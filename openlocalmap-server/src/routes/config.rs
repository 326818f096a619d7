//! Search configuration for route discovery.

use std::time::Duration;

use crate::domain::NamePreferences;

/// Configuration parameters for route search and on-demand lookups.
///
/// Query budgets are in seconds. Tag-only queries get less time than
/// geometry and member-walk queries.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Budget for the three per-mode tag queries.
    pub tag_query_secs: u64,

    /// Budget for the broader queries run over the expanded area.
    pub expanded_query_secs: u64,

    /// Budget for the relation member walk behind stop sequencing.
    pub stops_query_secs: u64,

    /// Budget for fetching a relation's member-way geometry.
    pub relation_geometry_secs: u64,

    /// Budget for the stop-chain alternative when a relation has no ways.
    pub stop_chain_secs: u64,

    /// Budget for the nearby-way search around a route's stops.
    pub nearby_query_secs: u64,

    /// Budget for a single way's geometry.
    pub way_geometry_secs: u64,

    /// Budget for the area re-query behind a synthetic route.
    pub synthetic_geometry_secs: u64,

    /// How far the area grows on each side for the expanded retry, as a
    /// fraction of its height and width.
    pub expansion_factor: f64,

    /// Routes shown per mode in the route list.
    pub list_limit: usize,

    /// Search for highway/railway ways near a relation's stops when it has
    /// neither member ways nor an ordered stop chain.
    pub nearby_fallback: bool,

    /// Radius of the nearby-way search (metres).
    pub nearby_radius_m: f64,

    /// Locale preferences for display names.
    pub names: NamePreferences,
}

impl SearchConfig {
    pub fn with_names(mut self, names: NamePreferences) -> Self {
        self.names = names;
        self
    }

    pub fn with_nearby_fallback(mut self, enabled: bool) -> Self {
        self.nearby_fallback = enabled;
        self
    }

    pub fn with_expansion_factor(mut self, factor: f64) -> Self {
        self.expansion_factor = factor;
        self
    }

    pub fn with_list_limit(mut self, limit: usize) -> Self {
        self.list_limit = limit;
        self
    }

    pub fn tag_query(&self) -> Duration {
        Duration::from_secs(self.tag_query_secs)
    }

    pub fn expanded_query(&self) -> Duration {
        Duration::from_secs(self.expanded_query_secs)
    }

    pub fn stops_query(&self) -> Duration {
        Duration::from_secs(self.stops_query_secs)
    }

    pub fn relation_geometry(&self) -> Duration {
        Duration::from_secs(self.relation_geometry_secs)
    }

    pub fn stop_chain(&self) -> Duration {
        Duration::from_secs(self.stop_chain_secs)
    }

    pub fn nearby_query(&self) -> Duration {
        Duration::from_secs(self.nearby_query_secs)
    }

    pub fn way_geometry(&self) -> Duration {
        Duration::from_secs(self.way_geometry_secs)
    }

    pub fn synthetic_geometry(&self) -> Duration {
        Duration::from_secs(self.synthetic_geometry_secs)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            tag_query_secs: 30,
            expanded_query_secs: 40,
            stops_query_secs: 20,
            relation_geometry_secs: 30,
            stop_chain_secs: 25,
            nearby_query_secs: 25,
            way_geometry_secs: 15,
            synthetic_geometry_secs: 20,
            expansion_factor: 0.5,
            list_limit: 10,
            nearby_fallback: false,
            nearby_radius_m: 500.0,
            names: NamePreferences::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = SearchConfig::default();

        assert_eq!(config.tag_query_secs, 30);
        assert_eq!(config.expanded_query_secs, 40);
        assert_eq!(config.way_geometry_secs, 15);
        assert_eq!(config.expansion_factor, 0.5);
        assert_eq!(config.list_limit, 10);
        assert!(!config.nearby_fallback);
        assert_eq!(config.nearby_radius_m, 500.0);
        assert_eq!(config.names.locales(), &["ca", "es", "en"]);
    }

    #[test]
    fn duration_methods() {
        let config = SearchConfig::default();

        assert_eq!(config.tag_query(), Duration::from_secs(30));
        assert_eq!(config.stops_query(), Duration::from_secs(20));
        assert_eq!(config.relation_geometry(), Duration::from_secs(30));
        assert_eq!(config.stop_chain(), Duration::from_secs(25));
        assert_eq!(config.synthetic_geometry(), Duration::from_secs(20));
    }

    #[test]
    fn builder_overrides() {
        let config = SearchConfig::default()
            .with_names(NamePreferences::new(["en"]))
            .with_nearby_fallback(true)
            .with_expansion_factor(1.0)
            .with_list_limit(3);

        assert_eq!(config.names.locales(), &["en"]);
        assert!(config.nearby_fallback);
        assert_eq!(config.expansion_factor, 1.0);
        assert_eq!(config.list_limit, 3);
    }
}
