//! Display-name resolution from OSM tags.

use super::route::Tags;

/// Locale preferences used to pick a display name from OSM tags.
///
/// Resolution takes the first non-empty value of `name`, then
/// `name:<locale>` for each preferred locale in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamePreferences {
    locales: Vec<String>,
}

impl NamePreferences {
    /// Preferences with the given locales, most preferred first.
    pub fn new<I, S>(locales: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            locales: locales
                .into_iter()
                .map(Into::into)
                .filter(|l: &String| !l.trim().is_empty())
                .collect(),
        }
    }

    pub fn locales(&self) -> &[String] {
        &self.locales
    }

    /// The localized name in `tags`, if any.
    pub fn resolve<'t>(&self, tags: &'t Tags) -> Option<&'t str> {
        non_empty(tags, "name").or_else(|| {
            self.locales
                .iter()
                .find_map(|locale| non_empty(tags, &format!("name:{locale}")))
        })
    }

    /// Localized name, then `ref`, then `fallback`.
    pub fn display_name(&self, tags: &Tags, fallback: &str) -> String {
        self.resolve(tags)
            .or_else(|| non_empty(tags, "ref"))
            .unwrap_or(fallback)
            .to_string()
    }
}

impl Default for NamePreferences {
    fn default() -> Self {
        Self::new(["ca", "es", "en"])
    }
}

/// Tag value with surrounding whitespace removed, if anything remains.
pub(crate) fn non_empty<'t>(tags: &'t Tags, key: &str) -> Option<&'t str> {
    tags.get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}
