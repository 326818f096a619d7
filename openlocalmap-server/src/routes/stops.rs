//! Ordered stop extraction from public-transport relations.
//!
//! Stops are read from the relation's member list in member order. Only node
//! members with a stop or platform role count, and only those consume an
//! order number. Relations without role metadata fall back to every stop-like
//! node in the response, unordered.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::domain::{FALLBACK_STOP_NAME, NamePreferences, Stop, Tags};
use crate::overpass::{
    CancelToken, MemberType, Node, OverpassElement, OverpassError, QueryExecutor,
};

use super::config::SearchConfig;
use super::queries::relation_walk_query;

/// Member roles that mark a stop or platform.
pub const STOP_ROLES: [&str; 6] = [
    "stop",
    "stop_entry_only",
    "stop_exit_only",
    "platform",
    "platform_entry_only",
    "platform_exit_only",
];

/// Tags that mark a standalone node as a stop in the fallback scan.
pub const STOP_NODE_TAGS: [(&str, &str); 3] = [
    ("public_transport", "stop_position"),
    ("highway", "bus_stop"),
    ("railway", "tram_stop"),
];

/// Fetches the stops of public-transport relations.
pub struct StopSequencer<'a, E> {
    executor: &'a E,
    config: &'a SearchConfig,
}

impl<'a, E: QueryExecutor> StopSequencer<'a, E> {
    pub fn new(executor: &'a E, config: &'a SearchConfig) -> Self {
        Self { executor, config }
    }

    /// Stops of relation `relation_id`, ordered when the relation has stop
    /// roles, otherwise every stop-like node found alongside it.
    pub async fn fetch_ordered_stops(
        &self,
        relation_id: i64,
        cancel: &CancelToken,
    ) -> Result<Vec<Stop>, OverpassError> {
        let query = relation_walk_query(relation_id, self.config.stops_query());
        let elements = self.executor.execute(&query, cancel).await?;

        let ordered = ordered_stops(relation_id, &elements, &self.config.names);
        if !ordered.is_empty() {
            debug!(relation_id, stops = ordered.len(), "ordered stops");
            return Ok(ordered);
        }

        let fallback = fallback_stops(&elements, &self.config.names);
        info!(
            relation_id,
            stops = fallback.len(),
            "relation has no stop roles, using unordered stop scan"
        );
        Ok(fallback)
    }
}

/// Node id → node, for every node in `elements`.
pub(crate) fn node_index(elements: &[OverpassElement]) -> HashMap<i64, &Node> {
    elements
        .iter()
        .filter_map(OverpassElement::as_node)
        .map(|node| (node.id, node))
        .collect()
}

/// Stops from walking the members of relation `relation_id` in order.
///
/// Empty when the relation is missing from `elements` or none of its node
/// members has a stop role and known coordinates.
pub fn ordered_stops(
    relation_id: i64,
    elements: &[OverpassElement],
    names: &NamePreferences,
) -> Vec<Stop> {
    let Some(relation) = elements
        .iter()
        .filter_map(OverpassElement::as_relation)
        .find(|r| r.id == relation_id)
    else {
        return Vec::new();
    };

    let nodes = node_index(elements);
    let mut stops = Vec::new();

    for member in &relation.members {
        if member.member_type != MemberType::Node || !STOP_ROLES.contains(&member.role.as_str()) {
            continue;
        }
        let Some(node) = nodes.get(&member.ref_id) else {
            continue;
        };
        let Some(position) = node.position() else {
            continue;
        };

        let order = stops.len() as u32 + 1;
        stops.push(Stop {
            osm_id: node.id,
            name: stop_name(names, &node.tags).unwrap_or_else(|| Stop::placeholder_name(order)),
            position,
            order: Some(order),
            role: Some(member.role.clone()),
            tags: node.tags.clone(),
        });
    }

    stops
}

/// Every node in `elements` tagged as a stop, in response order and without
/// an `order`.
pub fn fallback_stops(elements: &[OverpassElement], names: &NamePreferences) -> Vec<Stop> {
    elements
        .iter()
        .filter_map(OverpassElement::as_node)
        .filter(|node| is_stop_node(&node.tags))
        .filter_map(|node| {
            Some(Stop {
                osm_id: node.id,
                name: stop_name(names, &node.tags)
                    .unwrap_or_else(|| FALLBACK_STOP_NAME.to_string()),
                position: node.position()?,
                order: None,
                role: None,
                tags: node.tags.clone(),
            })
        })
        .collect()
}

fn is_stop_node(tags: &Tags) -> bool {
    STOP_NODE_TAGS
        .iter()
        .any(|(key, value)| tags.get(*key).is_some_and(|v| v == value))
}

/// Localized name, then `ref`.
fn stop_name(names: &NamePreferences, tags: &Tags) -> Option<String> {
    names
        .resolve(tags)
        .or_else(|| tags.get("ref").map(|r| r.trim()).filter(|r| !r.is_empty()))
        .map(str::to_string)
}
