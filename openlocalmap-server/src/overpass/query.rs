//! Typed Overpass QL query builder.
//!
//! Queries are composed from selectors and output statements rather than
//! string concatenation. Tag keys and values are quoted and escaped whenever
//! they are not plain identifiers, so arbitrary tag text cannot break out of
//! a filter.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use openlocalmap_server::domain::BoundingArea;
//! use openlocalmap_server::overpass::{ElementKind, OutMode, OverpassQuery, Selector};
//!
//! let query = OverpassQuery::builder(Duration::from_secs(30))
//!     .union([
//!         Selector::new(ElementKind::Way)
//!             .in_bbox(BoundingArea::VILANOVA)
//!             .tag("highway", "path"),
//!     ])
//!     .out(OutMode::Tags)
//!     .build();
//!
//! assert_eq!(
//!     query.text(),
//!     "[out:json][timeout:30];(way(41.2,1.7,41.25,1.75)[highway=path];);out tags;"
//! );
//! ```

use std::fmt::{self, Write};
use std::time::Duration;

use crate::domain::{BoundingArea, LatLon};

/// A complete Overpass QL query together with its time budget.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OverpassQuery {
    text: String,
    timeout: Duration,
}

impl OverpassQuery {
    /// Start building a query with the given time budget.
    pub fn builder(timeout: Duration) -> QueryBuilder {
        QueryBuilder {
            timeout,
            statements: Vec::new(),
        }
    }

    /// A query from verbatim Overpass QL.
    ///
    /// The text is sent as-is. Overpass QL has no sandbox, so a raw query can
    /// request arbitrarily large or slow result sets; callers passing
    /// user-supplied text are responsible for whatever it asks for. The web
    /// layer never forwards user text here.
    pub fn raw(text: impl Into<String>, timeout: Duration) -> Self {
        Self {
            text: text.into(),
            timeout,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Budget enforced around the whole HTTP exchange.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl fmt::Display for OverpassQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// OSM element type to select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Node,
    Way,
    Relation,
}

impl ElementKind {
    fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Node => "node",
            ElementKind::Way => "way",
            ElementKind::Relation => "relation",
        }
    }
}

/// Where a selector looks for elements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scope {
    /// Inside a bounding box.
    Bbox(BoundingArea),
    /// A single element by id.
    Id(i64),
    /// Within `radius_m` metres of a point.
    Around { radius_m: f64, center: LatLon },
    /// Members of the relations in the input set (`(r)`).
    RelationMembers,
    /// Nodes of the ways in the input set (`(w)`).
    WayNodes,
}

/// A tag filter: `[key]` or `[key=value]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFilter {
    key: String,
    value: Option<String>,
}

impl TagFilter {
    /// Matches elements carrying `key` with exactly `value`.
    pub fn eq(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }

    /// Matches elements carrying `key` with any value.
    pub fn exists(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
        }
    }
}

impl fmt::Display for TagFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('[')?;
        write_token(f, &self.key)?;
        if let Some(value) = &self.value {
            f.write_char('=')?;
            write_token(f, value)?;
        }
        f.write_char(']')
    }
}

/// One element selection, e.g. `way(41.2,1.7,41.25,1.75)[highway=path]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    kind: ElementKind,
    scope: Option<Scope>,
    filters: Vec<TagFilter>,
}

impl Selector {
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            scope: None,
            filters: Vec::new(),
        }
    }

    pub fn in_bbox(mut self, area: BoundingArea) -> Self {
        self.scope = Some(Scope::Bbox(area));
        self
    }

    pub fn id(mut self, id: i64) -> Self {
        self.scope = Some(Scope::Id(id));
        self
    }

    pub fn around(mut self, radius_m: f64, center: LatLon) -> Self {
        self.scope = Some(Scope::Around { radius_m, center });
        self
    }

    pub fn relation_members(mut self) -> Self {
        self.scope = Some(Scope::RelationMembers);
        self
    }

    pub fn way_nodes(mut self) -> Self {
        self.scope = Some(Scope::WayNodes);
        self
    }

    /// Require `key=value`.
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(TagFilter::eq(key, value));
        self
    }

    /// Require `key` to be present.
    pub fn has(mut self, key: impl Into<String>) -> Self {
        self.filters.push(TagFilter::exists(key));
        self
    }

    pub fn filter(mut self, filter: TagFilter) -> Self {
        self.filters.push(filter);
        self
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.as_str())?;
        match self.scope {
            Some(Scope::Bbox(area)) => write!(f, "({})", area.to_overpass_bbox())?,
            Some(Scope::Id(id)) => write!(f, "({id})")?,
            Some(Scope::Around { radius_m, center }) => {
                write!(f, "(around:{},{},{})", radius_m, center.lat, center.lon)?
            }
            Some(Scope::RelationMembers) => f.write_str("(r)")?,
            Some(Scope::WayNodes) => f.write_str("(w)")?,
            None => {}
        }
        for filter in &self.filters {
            write!(f, "{filter}")?;
        }
        Ok(())
    }
}

/// Output verbosity for an `out` statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutMode {
    /// Ids, tags, coordinates and member lists.
    Body,
    /// Ids and tags only.
    Tags,
    /// Body plus inline way geometry.
    Geom,
    /// Body plus a centre point per way or relation.
    Center,
    /// Ids and coordinates only.
    Skel,
    /// Like `Skel`, sorted by quadtile.
    SkelQt,
}

impl OutMode {
    fn as_str(&self) -> &'static str {
        match self {
            OutMode::Body => "out body;",
            OutMode::Tags => "out tags;",
            OutMode::Geom => "out geom;",
            OutMode::Center => "out center;",
            OutMode::Skel => "out skel;",
            OutMode::SkelQt => "out skel qt;",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Statement {
    Select(Selector),
    Union(Vec<Selector>),
    RecurseDown,
    Out(OutMode),
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Select(selector) => write!(f, "{selector};"),
            Statement::Union(selectors) => {
                f.write_char('(')?;
                for selector in selectors {
                    write!(f, "{selector};")?;
                }
                f.write_str(");")
            }
            Statement::RecurseDown => f.write_str(">;"),
            Statement::Out(mode) => f.write_str(mode.as_str()),
        }
    }
}

/// Builder for [`OverpassQuery`].
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    timeout: Duration,
    statements: Vec<Statement>,
}

impl QueryBuilder {
    /// Append a single selection.
    pub fn select(mut self, selector: Selector) -> Self {
        self.statements.push(Statement::Select(selector));
        self
    }

    /// Append a union of selections.
    pub fn union(mut self, selectors: impl IntoIterator<Item = Selector>) -> Self {
        self.statements
            .push(Statement::Union(selectors.into_iter().collect()));
        self
    }

    /// Append `>;`, adding members and way nodes of the current set.
    pub fn recurse_down(mut self) -> Self {
        self.statements.push(Statement::RecurseDown);
        self
    }

    pub fn out(mut self, mode: OutMode) -> Self {
        self.statements.push(Statement::Out(mode));
        self
    }

    pub fn build(self) -> OverpassQuery {
        let mut text = format!("[out:json][timeout:{}];", timeout_header_secs(self.timeout));
        for statement in &self.statements {
            // Writing to a String cannot fail.
            let _ = write!(text, "{statement}");
        }
        OverpassQuery {
            text,
            timeout: self.timeout,
        }
    }
}

/// Seconds written into the `[timeout:N]` header: rounded up, at least 1.
fn timeout_header_secs(timeout: Duration) -> u64 {
    let secs = timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0);
    secs.max(1)
}

fn is_plain_token(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Write a tag key or value, quoting and escaping it unless it is a plain
/// identifier.
fn write_token(f: &mut impl Write, s: &str) -> fmt::Result {
    if is_plain_token(s) {
        return f.write_str(s);
    }
    f.write_char('"')?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('"')
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// A quoted value never leaves the filter's brackets
        #[test]
        fn escaped_values_stay_quoted(value in ".*") {
            let rendered = TagFilter::eq("name", value.clone()).to_string();
            prop_assert!(rendered.starts_with("[name="));
            prop_assert!(rendered.ends_with(']'));
            if !is_plain_token(&value) {
                let inner = &rendered["[name=\"".len()..rendered.len() - 2];
                // Every quote inside the literal is escaped
                let mut chars = inner.chars();
                while let Some(c) = chars.next() {
                    if c == '\\' {
                        prop_assert!(chars.next().is_some());
                    } else {
                        prop_assert_ne!(c, '"');
                    }
                }
            }
        }
    }
}
