//! Keyword decision tables.
//!
//! Each table is an ordered list of `(predicate, outcome)` pairs evaluated
//! top to bottom against the lowercased query; the first match wins and
//! the table's default applies when nothing matches.

/// Predicate over a lowercased query.
pub type QueryPredicate = fn(&str) -> bool;

/// Ordered decision table with a fallback outcome.
#[derive(Debug, Clone, Copy)]
pub struct DecisionTable<T: 'static> {
    rules: &'static [(QueryPredicate, T)],
    default: T,
}

impl<T: Copy + 'static> DecisionTable<T> {
    pub const fn new(rules: &'static [(QueryPredicate, T)], default: T) -> Self {
        Self { rules, default }
    }

    /// Outcome of the first rule matching `query`.
    pub fn select(&self, query: &str) -> T {
        let query = query.to_lowercase();
        self.rules
            .iter()
            .find(|(matches, _)| matches(&query))
            .map_or(self.default, |(_, outcome)| *outcome)
    }
}

fn mentions_salinity(q: &str) -> bool {
    q.contains("salinity")
}

fn mentions_temperature(q: &str) -> bool {
    q.contains("temperature")
}

fn mentions_oxygen(q: &str) -> bool {
    q.contains("oxygen") || q.contains("doxy")
}

fn mentions_position(q: &str) -> bool {
    q.contains("near") && q.contains("latitude")
}

/// Query template for the relational store.
pub const SQL_TEMPLATES: DecisionTable<&str> = DecisionTable::<&str>::new(
    &[
        (
            mentions_position,
            "SELECT * FROM argo_profiles WHERE latitude BETWEEN ? AND ? AND longitude BETWEEN ? AND ?",
        ),
        (
            mentions_salinity,
            "SELECT * FROM argo_profiles WHERE measurements ? 'PSAL'",
        ),
        (
            mentions_temperature,
            "SELECT * FROM argo_profiles WHERE measurements ? 'TEMP'",
        ),
        (
            mentions_oxygen,
            "SELECT * FROM argo_profiles WHERE measurements ? 'DOXY'",
        ),
    ],
    "SELECT * FROM argo_profiles ORDER BY date DESC LIMIT 100",
);

/// First line of a template answer.
pub const OPENING_SENTENCES: DecisionTable<&str> = DecisionTable::<&str>::new(
    &[
        (
            mentions_salinity,
            "Based on the ARGO float data, here's what I found about salinity:",
        ),
        (
            mentions_temperature,
            "Based on the ARGO float data, here's what I found about temperature:",
        ),
        (
            mentions_oxygen,
            "Based on the ARGO float data, here's what I found about dissolved oxygen:",
        ),
    ],
    "Based on the available ARGO float data:",
);

/// Follow-up suggestion lists; only the first [`MAX_SUGGESTIONS`] are shown.
pub const SUGGESTION_LISTS: DecisionTable<&[&str]> = DecisionTable::<&[&str]>::new(
    &[
        (
            mentions_salinity,
            &[
                "Show temperature vs salinity plot",
                "Compare salinity with other regions",
                "View salinity trends over time",
            ],
        ),
        (
            mentions_temperature,
            &[
                "Plot temperature depth profiles",
                "Compare with historical data",
                "Show temperature anomalies",
            ],
        ),
        (
            mentions_oxygen,
            &[
                "Oxygen minimum zones",
                "Oxygen saturation levels",
                "Biogeochemical relationships",
            ],
        ),
    ],
    &[
        "Show all parameters for this float",
        "View geographic distribution",
        "Compare with nearby floats",
        "Download data as NetCDF",
    ],
);

pub const MAX_SUGGESTIONS: usize = 3;

/// Structured query derived from the question.
pub fn structured_query(query: &str) -> &'static str {
    SQL_TEMPLATES.select(query)
}

/// Topic sentence opening a template answer.
pub fn opening_sentence(query: &str) -> &'static str {
    OPENING_SENTENCES.select(query)
}

/// Follow-up suggestions for the question.
pub fn suggestions(query: &str) -> Vec<String> {
    SUGGESTION_LISTS
        .select(query)
        .iter()
        .take(MAX_SUGGESTIONS)
        .map(|s| s.to_string())
        .collect()
}
