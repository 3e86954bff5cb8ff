//! Browse-filter state and its mapping to shareable URL parameters.
//!
//! The filtered view must be fully reconstructable from the URL alone, so the
//! mapping is a pure function in both directions: `from_params` normalizes the
//! raw query parameters into a [`FilterState`], and `to_query_string` produces
//! the canonical parameter set for a state. No filter state is cached
//! anywhere; clients re-derive it on every navigation.

use std::collections::BTreeSet;

/// Quiet period the client waits after the last keystroke before pushing the
/// search text into the URL. Published via the filter-options endpoint.
pub const SEARCH_DEBOUNCE_MS: u64 = 400;

/// Legacy sentinel meaning "no filter" for the position and neighborhood
/// parameters.
pub const ALL_SENTINEL: &str = "all";

/// Canonical position tags offered by the browse UI. Free-text titles still
/// match by substring, so postings like "Line Cook - Full Time" are covered.
pub const POSITION_OPTIONS: &[&str] = &[
    "Server",
    "Line Cook",
    "Cook",
    "Bartender",
    "Host",
    "Chef",
    "Manager",
    "Dishwasher",
    "Busser",
    "Barista",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub search: Option<String>,
    pub positions: BTreeSet<String>,
    pub neighborhood: Option<String>,
    pub restaurant: Option<String>,
}

impl FilterState {
    /// Builds the normalized state from raw URL parameters. Whitespace-only
    /// values and the `all` sentinel collapse to "absent".
    pub fn from_params(
        search: Option<&str>,
        position: Option<&str>,
        neighborhood: Option<&str>,
        restaurant: Option<&str>,
    ) -> Self {
        Self {
            search: normalize(search),
            positions: parse_positions(position),
            neighborhood: normalize(neighborhood).filter(|v| v != ALL_SENTINEL),
            restaurant: normalize(restaurant),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.search.is_none()
            && self.positions.is_empty()
            && self.neighborhood.is_none()
            && self.restaurant.is_none()
    }

    /// Serializes back to the canonical query string. Absent filters are
    /// omitted entirely rather than written as empty parameters.
    pub fn to_query_string(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        if let Some(search) = &self.search {
            serializer.append_pair("search", search);
        }
        if let Some(positions) = serialize_positions(&self.positions) {
            serializer.append_pair("position", &positions);
        }
        if let Some(neighborhood) = &self.neighborhood {
            serializer.append_pair("neighborhood", neighborhood);
        }
        if let Some(restaurant) = &self.restaurant {
            serializer.append_pair("restaurant", restaurant);
        }
        serializer.finish()
    }

    /// State with one position removed; the remaining set re-serializes, or
    /// the parameter disappears when the set empties.
    pub fn without_position(&self, position: &str) -> Self {
        let mut next = self.clone();
        next.positions.remove(position);
        next
    }

    /// The query string the client should navigate to, or `None` when this
    /// state already matches what the URL reflects (avoids redundant
    /// navigations when state is re-derived from the URL on every render).
    pub fn navigation_target(&self, current: &FilterState) -> Option<String> {
        if self == current {
            None
        } else {
            Some(self.to_query_string())
        }
    }
}

fn normalize(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// Parses the comma-joined position parameter, trimming and dropping empty
/// entries. `all` means no position filter.
pub fn parse_positions(param: Option<&str>) -> BTreeSet<String> {
    match param {
        None => BTreeSet::new(),
        Some(raw) if raw.trim() == ALL_SENTINEL => BTreeSet::new(),
        Some(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_owned)
            .collect(),
    }
}

pub fn serialize_positions(positions: &BTreeSet<String>) -> Option<String> {
    if positions.is_empty() {
        None
    } else {
        Some(positions.iter().cloned().collect::<Vec<_>>().join(","))
    }
}

/// Escapes the store's pattern metacharacters so user input interpolated into
/// a LIKE pattern matches literally.
pub fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Free-text match across the posting and its restaurant: title OR
/// description OR restaurant name, case-insensitive substring.
pub fn matches_free_text(
    needle: &str,
    title: &str,
    description: Option<&str>,
    restaurant_name: &str,
) -> bool {
    let needle = needle.to_lowercase();
    title.to_lowercase().contains(&needle)
        || description
            .map(|d| d.to_lowercase().contains(&needle))
            .unwrap_or(false)
        || restaurant_name.to_lowercase().contains(&needle)
}

/// OR across the position set: the title need only contain one of them.
pub fn title_matches_any_position(title: &str, positions: &BTreeSet<String>) -> bool {
    let title = title.to_lowercase();
    positions.iter().any(|p| title.contains(&p.to_lowercase()))
}
