//! Intent Resolution
//!
//! Maps a free-text question to one of a closed set of query intents.
//! The resolution order is a first-class table consulted by both the
//! lexical and the semantic strategy, so precedence is testable rather
//! than an artifact of branch ordering.
//!
//! Resolution is total: any input string, including the empty string,
//! resolves to some intent. Unmatched questions fall back to Unknown,
//! which downstream synthesizes as a small listing.

use crate::config::ChatConfig;
use crate::schema::SchemaDescription;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// The closed set of query shapes a question can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntentKind {
    Count,
    ListAll,
    Average,
}

/// Priority order for resolution and tie-breaking.
pub const RESOLUTION_ORDER: [IntentKind; 3] =
    [IntentKind::Count, IntentKind::ListAll, IntentKind::Average];

/// Column-name substrings that mark a column as numeric-looking.
pub const NUMERIC_HINTS: [&str; 9] = [
    "age", "salary", "price", "value", "edad", "salario", "precio", "monto", "valor",
];

const COUNT_PHRASES: [&str; 8] = [
    "how many",
    "count",
    "number of",
    "cuántos",
    "cuantos",
    "cantidad",
    "número de",
    "numero de",
];

const LIST_PHRASES: [&str; 6] = ["list", "show", "view all", "listar", "mostrar", "ver todos"];

const AVERAGE_PHRASES: [&str; 4] = ["average", "mean of", "promedio", "media de"];

impl IntentKind {
    /// Trigger phrases for the lexical strategy; the semantic strategy
    /// uses the same phrases as similarity exemplars.
    pub fn trigger_phrases(self) -> &'static [&'static str] {
        match self {
            IntentKind::Count => &COUNT_PHRASES,
            IntentKind::ListAll => &LIST_PHRASES,
            IntentKind::Average => &AVERAGE_PHRASES,
        }
    }
}

/// A resolved intent with its schema bindings. Constructed once per
/// question and discarded after SQL synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    Count { table: String },
    ListAll { table: String, limit: usize },
    Average { table: String, column: String },
    Unknown { table: String, limit: usize },
}

/// An intent plus the match strength that produced it. The confidence
/// is only used to decide fallback; it is never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub intent: Intent,
    pub confidence: f32,
}

/// Lowercase, strip punctuation and collapse whitespace before phrase
/// matching, so "¿Cuántos   empleados hay?" matches "cuántos".
pub fn normalize_question(question: &str) -> String {
    let lowered: String = question
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    Regex::new(r"\s+")
        .unwrap()
        .replace_all(&lowered, " ")
        .trim()
        .to_string()
}

/// First column of `table` whose name contains a numeric hint.
pub fn numeric_candidate<'a>(schema: &'a SchemaDescription, table: &str) -> Option<&'a str> {
    schema.columns(table)?.iter().map(|c| c.as_str()).find(|c| {
        let lowered = c.to_lowercase();
        NUMERIC_HINTS.iter().any(|hint| lowered.contains(hint))
    })
}

/// Bind the aggregation column for an Average intent: the first
/// numeric-looking column, else the first column overall.
pub fn average_column<'a>(schema: &'a SchemaDescription, table: &str) -> Option<&'a str> {
    numeric_candidate(schema, table)
        .or_else(|| schema.columns(table)?.first().map(|c| c.as_str()))
}

fn bind(kind: IntentKind, schema: &SchemaDescription, table: &str, config: &ChatConfig) -> Option<Intent> {
    match kind {
        IntentKind::Count => Some(Intent::Count {
            table: table.to_string(),
        }),
        IntentKind::ListAll => Some(Intent::ListAll {
            table: table.to_string(),
            limit: config.list_limit,
        }),
        IntentKind::Average => Some(Intent::Average {
            table: table.to_string(),
            column: average_column(schema, table)?.to_string(),
        }),
    }
}

/// Resolve a question by keyword matching against the trigger phrases,
/// walking [`RESOLUTION_ORDER`]. The first intent with a phrase hit
/// wins; Average additionally requires a numeric-looking column on the
/// bound table. No hit resolves to Unknown with confidence 0.
pub fn resolve_lexical(
    question: &str,
    schema: &SchemaDescription,
    table: &str,
    config: &ChatConfig,
) -> Resolution {
    let normalized = normalize_question(question);

    for kind in RESOLUTION_ORDER {
        let hit = kind
            .trigger_phrases()
            .iter()
            .any(|phrase| normalized.contains(phrase));
        if !hit {
            continue;
        }
        if kind == IntentKind::Average && numeric_candidate(schema, table).is_none() {
            continue;
        }
        if let Some(intent) = bind(kind, schema, table, config) {
            return Resolution {
                intent,
                confidence: 1.0,
            };
        }
    }

    Resolution {
        intent: Intent::Unknown {
            table: table.to_string(),
            limit: config.fallback_limit,
        },
        confidence: 0.0,
    }
}
