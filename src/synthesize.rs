//! SQL Synthesis
//!
//! Renders a resolved intent into a concrete SQL string. The template
//! path is deterministic: the same intent always yields byte-identical
//! SQL. The model-driven path wraps the question and schema into a
//! prompt and accepts whatever the generation collaborator returns —
//! tagged with its provenance so the safety gate is never skipped for
//! generated statements.

use crate::error::Result;
use crate::intent::Intent;
use crate::schema::SchemaDescription;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Where a candidate statement came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provenance {
    Template,
    Model,
    Unknown,
}

/// An SQL string not yet cleared for execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSql {
    pub sql: String,
    pub provenance: Provenance,
}

/// Render an intent through the fixed templates.
pub fn synthesize(intent: &Intent) -> CandidateSql {
    let sql = match intent {
        Intent::Count { table } => format!("SELECT COUNT(*) AS total FROM {}", table),
        Intent::ListAll { table, limit } => format!("SELECT * FROM {} LIMIT {}", table, limit),
        Intent::Average { table, column } => {
            format!("SELECT AVG({}) AS promedio FROM {}", column, table)
        }
        Intent::Unknown { table, limit } => format!("SELECT * FROM {} LIMIT {}", table, limit),
    };
    CandidateSql {
        sql,
        provenance: Provenance::Template,
    }
}

/// Generation collaborator: pure, stateless, potentially slow.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str, max_new_tokens: u32) -> Result<String>;
}

/// Prompt-driven synthesizer for model variants.
pub struct PromptSynthesizer {
    generator: Arc<dyn Generator>,
}

impl PromptSynthesizer {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }

    /// Build the full prompt: instruction + schema + question.
    pub fn build_prompt(&self, question: &str, schema: &SchemaDescription) -> String {
        format!(
            r#"You are a SQL expert. Convert the question into a single SQLite statement.
Return ONLY the SQL statement, no explanation, no markdown.

{}

Question: {}

SQL:"#,
            schema.to_text(),
            question
        )
    }

    /// Ask the generation collaborator for a statement. The reply is
    /// an unvalidated candidate; callers must pass it through the
    /// safety gate before execution.
    pub async fn synthesize(
        &self,
        question: &str,
        schema: &SchemaDescription,
        max_new_tokens: u32,
    ) -> Result<CandidateSql> {
        let prompt = self.build_prompt(question, schema);
        let raw = self.generator.generate(&prompt, max_new_tokens).await?;
        let sql = strip_code_fences(&raw);
        debug!("Generated candidate SQL: {}", sql);
        Ok(CandidateSql {
            sql,
            provenance: Provenance::Model,
        })
    }
}

/// Models tend to wrap replies in markdown fences despite instructions.
fn strip_code_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    let inner = if let Some(s) = trimmed.strip_prefix("```sql") {
        s
    } else if let Some(s) = trimmed.strip_prefix("```") {
        s
    } else {
        trimmed
    };
    inner.strip_suffix("```").unwrap_or(inner).trim().to_string()
}
