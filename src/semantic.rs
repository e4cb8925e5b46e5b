//! Semantic Intent Matching
//!
//! Resolves intents by embedding similarity instead of exact keywords.
//! The question is embedded once and compared against each intent's
//! exemplar phrases; a schema-relevance gate rejects questions that do
//! not look like they are about the store at all.
//!
//! Every embedding call is bounded by the configured timeout. On
//! timeout, embedder failure, or sub-threshold similarity the resolver
//! degrades to the lexical strategy — semantic resolution never makes
//! a question unanswerable.

use crate::config::ChatConfig;
use crate::error::Result;
use crate::intent::{self, Intent, IntentKind, Resolution, RESOLUTION_ORDER};
use crate::schema::SchemaDescription;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Embedding collaborator: pure, stateless, potentially slow.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Cosine similarity between two vectors, 0.0 when either is degenerate.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

pub struct SemanticResolver {
    embedder: Arc<dyn Embedder>,
}

impl SemanticResolver {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    /// Resolve a question by exemplar similarity. Total like the
    /// lexical resolver: any failure path lands on a lexical result.
    pub async fn resolve(
        &self,
        question: &str,
        schema: &SchemaDescription,
        table: &str,
        config: &ChatConfig,
    ) -> Resolution {
        let scored = tokio::time::timeout(
            config.inference_timeout(),
            self.score(question, schema, table, config),
        )
        .await;

        match scored {
            Ok(Ok(Some(resolution))) => resolution,
            Ok(Ok(None)) => {
                debug!("Similarity below threshold, using lexical matching");
                intent::resolve_lexical(question, schema, table, config)
            }
            Ok(Err(e)) => {
                warn!("Embedding failed ({}), using lexical matching", e);
                intent::resolve_lexical(question, schema, table, config)
            }
            Err(_) => {
                warn!(
                    "Embedding timed out after {:?}, using lexical matching",
                    config.inference_timeout()
                );
                intent::resolve_lexical(question, schema, table, config)
            }
        }
    }

    /// Returns `None` when the question fails the schema gate or no
    /// intent clears the keyword threshold.
    async fn score(
        &self,
        question: &str,
        schema: &SchemaDescription,
        table: &str,
        config: &ChatConfig,
    ) -> Result<Option<Resolution>> {
        let question_embedding = self.embedder.embed(&question.to_lowercase()).await?;

        let schema_embedding = self.embedder.embed(&schema.to_text()).await?;
        let schema_similarity = cosine_similarity(&question_embedding, &schema_embedding);
        debug!("Schema relevance: {:.3}", schema_similarity);
        if schema_similarity <= config.schema_threshold {
            return Ok(None);
        }

        let mut best: Option<(IntentKind, f32)> = None;
        for kind in RESOLUTION_ORDER {
            let mut kind_score = f32::MIN;
            for phrase in kind.trigger_phrases() {
                let phrase_embedding = self.embedder.embed(phrase).await?;
                let similarity = cosine_similarity(&question_embedding, &phrase_embedding);
                if similarity > kind_score {
                    kind_score = similarity;
                }
            }
            debug!("Intent {:?} scored {:.3}", kind, kind_score);

            // Walking in priority order, a later intent only displaces
            // an earlier one by beating it beyond the tie epsilon.
            match best {
                Some((_, best_score)) if kind_score <= best_score + config.tie_epsilon => {}
                _ => best = Some((kind, kind_score)),
            }
        }

        let (kind, score) = match best {
            Some(b) => b,
            None => return Ok(None),
        };
        if score <= config.keyword_threshold {
            return Ok(None);
        }

        let intent = match kind {
            IntentKind::Count => Intent::Count {
                table: table.to_string(),
            },
            IntentKind::ListAll => Intent::ListAll {
                table: table.to_string(),
                limit: config.list_limit,
            },
            IntentKind::Average => match intent::average_column(schema, table) {
                Some(column) => Intent::Average {
                    table: table.to_string(),
                    column: column.to_string(),
                },
                None => return Ok(None),
            },
        };

        Ok(Some(Resolution {
            intent,
            confidence: score,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChatError;
    use crate::schema::TableDescription;
    use std::collections::HashMap;
    use std::time::Duration;

    fn demo_schema() -> SchemaDescription {
        SchemaDescription::new(vec![TableDescription {
            name: "empleados".to_string(),
            columns: vec!["id".to_string(), "nombre".to_string(), "salario".to_string()],
        }])
    }

    /// Maps known texts to fixed vectors; everything else gets the
    /// default vector.
    struct MockEmbedder {
        vectors: HashMap<String, Vec<f32>>,
        default: Vec<f32>,
    }

    #[async_trait]
    impl Embedder for MockEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(self
                .vectors
                .get(text)
                .cloned()
                .unwrap_or_else(|| self.default.clone()))
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(ChatError::Inference("model unavailable".to_string()))
        }
    }

    struct SlowEmbedder;

    #[async_trait]
    impl Embedder for SlowEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(vec![1.0, 0.0])
        }
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert_eq!(cosine_similarity(&a, &b), 1.0);

        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_cosine_similarity_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_semantic_match_resolves_count() {
        let schema = demo_schema();
        let mut vectors = HashMap::new();
        vectors.insert("how many workers are there".to_string(), vec![1.0, 0.0]);
        vectors.insert("how many".to_string(), vec![0.95, 0.05]);
        vectors.insert(schema.to_text(), vec![0.8, 0.2]);
        let embedder = MockEmbedder {
            vectors,
            default: vec![0.0, 1.0],
        };

        let resolver = SemanticResolver::new(Arc::new(embedder));
        let resolution = resolver
            .resolve(
                "how many workers are there",
                &schema,
                "empleados",
                &ChatConfig::default(),
            )
            .await;
        assert!(matches!(resolution.intent, Intent::Count { .. }));
        assert!(resolution.confidence > 0.5);
    }

    #[tokio::test]
    async fn test_schema_gate_falls_back_to_lexical() {
        let schema = demo_schema();
        // Question is orthogonal to the schema text, so the gate
        // rejects it; the lexical matcher still sees "mostrar".
        let mut vectors = HashMap::new();
        vectors.insert("mostrar todos".to_string(), vec![1.0, 0.0]);
        vectors.insert(schema.to_text(), vec![0.0, 1.0]);
        let embedder = MockEmbedder {
            vectors,
            default: vec![0.0, 1.0],
        };

        let resolver = SemanticResolver::new(Arc::new(embedder));
        let resolution = resolver
            .resolve("mostrar todos", &schema, "empleados", &ChatConfig::default())
            .await;
        assert!(matches!(resolution.intent, Intent::ListAll { .. }));
        assert_eq!(resolution.confidence, 1.0);
    }

    #[tokio::test]
    async fn test_embedder_failure_degrades_to_lexical() {
        let schema = demo_schema();
        let resolver = SemanticResolver::new(Arc::new(FailingEmbedder));
        let resolution = resolver
            .resolve(
                "¿Cuántos empleados hay?",
                &schema,
                "empleados",
                &ChatConfig::default(),
            )
            .await;
        assert!(matches!(resolution.intent, Intent::Count { .. }));
    }

    #[tokio::test]
    async fn test_embedder_timeout_degrades_to_lexical() {
        let schema = demo_schema();
        let config = ChatConfig {
            inference_timeout_secs: 0,
            ..ChatConfig::default()
        };
        let resolver = SemanticResolver::new(Arc::new(SlowEmbedder));
        let resolution = resolver
            .resolve("count the rows", &schema, "empleados", &config)
            .await;
        assert!(matches!(resolution.intent, Intent::Count { .. }));
    }
}
