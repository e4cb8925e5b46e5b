//! SQL Safety Gate
//!
//! Coarse statement-type allow-list checked before any candidate is
//! executed, regardless of whether it came from a template or a model.
//! This is a syntactic gate, not a parser: it inspects only the leading
//! keyword, so a statement separator or comment after an allowed
//! keyword is not detected. Rejected candidates are never executed.

use crate::synthesize::CandidateSql;
use tracing::warn;

/// Statement types cleared for execution.
pub const ALLOWED_STATEMENTS: [&str; 3] = ["select", "insert", "update"];

/// Check a candidate's leading keyword against the allow-list.
pub fn validate(candidate: &CandidateSql) -> bool {
    let lowered = candidate.sql.trim().to_lowercase();
    let allowed = ALLOWED_STATEMENTS
        .iter()
        .any(|keyword| lowered.starts_with(keyword));
    if !allowed {
        warn!("Blocked candidate statement: {}", candidate.sql);
    }
    allowed
}
