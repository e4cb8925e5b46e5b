//! Chat Session
//!
//! One session owns one store connection, one cached schema snapshot
//! and the injected inference collaborators. Questions are answered
//! strictly one at a time: resolve, synthesize, validate, execute.
//! Nothing outlives a question except the schema snapshot.

use crate::config::{ChatConfig, ResolutionStrategy, SynthesisMode};
use crate::error::{ChatError, Result};
use crate::intent::{self, Intent, Resolution};
use crate::safety;
use crate::schema::SchemaDescription;
use crate::semantic::{Embedder, SemanticResolver};
use crate::store::{QueryResult, Store};
use crate::synthesize::{self, CandidateSql, Generator, PromptSynthesizer};
use crate::translate::Translator;
use std::sync::Arc;
use tracing::{info, warn};

/// Everything the surface needs to present one answered question.
#[derive(Debug, Clone)]
pub struct Answer {
    pub question: String,
    pub intent: Intent,
    pub confidence: f32,
    pub sql: CandidateSql,
    pub result: QueryResult,
}

pub struct ChatSession {
    store: Store,
    config: ChatConfig,
    embedder: Option<Arc<dyn Embedder>>,
    generator: Option<Arc<dyn Generator>>,
    translator: Option<Arc<dyn Translator>>,
    schema: Option<SchemaDescription>,
}

impl ChatSession {
    pub fn new(store: Store, config: ChatConfig) -> Self {
        Self {
            store,
            config,
            embedder: None,
            generator: None,
            translator: None,
            schema: None,
        }
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn with_generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    /// Lazy schema snapshot, read once per session. INSERT/UPDATE do
    /// not change the shape, so the cache stays valid across requests.
    fn schema(&mut self) -> Result<&SchemaDescription> {
        if self.schema.is_none() {
            let description = self.store.describe()?;
            if description.is_empty() {
                return Err(ChatError::SchemaUnavailable(
                    "store has no tables".to_string(),
                ));
            }
            if let Some(ref table) = self.config.table {
                if !description.contains_table(table) {
                    return Err(ChatError::SchemaUnavailable(format!(
                        "configured table '{}' not present in store",
                        table
                    )));
                }
            }
            info!("Loaded schema: {} table(s)", description.tables().len());
            self.schema = Some(description);
        }
        self.schema
            .as_ref()
            .ok_or_else(|| ChatError::SchemaUnavailable("schema cache empty".to_string()))
    }

    /// Answer one free-text question end to end.
    pub async fn ask(&mut self, question: &str) -> Result<Answer> {
        let question = self.normalize_input(question).await;
        let schema = self.schema()?.clone();
        let table = match self.config.table {
            Some(ref t) => t.clone(),
            None => schema
                .first_table()
                .map(str::to_string)
                .ok_or_else(|| ChatError::SchemaUnavailable("store has no tables".to_string()))?,
        };

        let resolution = self.resolve(&question, &schema, &table).await;
        info!(
            "Resolved intent {:?} with confidence {:.2}",
            resolution.intent, resolution.confidence
        );

        let candidate = self.synthesize(&question, &schema, &resolution).await;

        if !safety::validate(&candidate) {
            return Err(ChatError::ValidationRejected(candidate.sql));
        }

        let result = self.store.execute(&candidate.sql)?;
        Ok(Answer {
            question,
            intent: resolution.intent,
            confidence: resolution.confidence,
            sql: candidate,
            result,
        })
    }

    async fn resolve(
        &self,
        question: &str,
        schema: &SchemaDescription,
        table: &str,
    ) -> Resolution {
        match (self.config.strategy, &self.embedder) {
            (ResolutionStrategy::Semantic, Some(embedder)) => {
                SemanticResolver::new(embedder.clone())
                    .resolve(question, schema, table, &self.config)
                    .await
            }
            (ResolutionStrategy::Semantic, None) => {
                warn!("Semantic strategy selected without an embedder, using lexical matching");
                intent::resolve_lexical(question, schema, table, &self.config)
            }
            (ResolutionStrategy::Lexical, _) => {
                intent::resolve_lexical(question, schema, table, &self.config)
            }
        }
    }

    async fn synthesize(
        &self,
        question: &str,
        schema: &SchemaDescription,
        resolution: &Resolution,
    ) -> CandidateSql {
        match (self.config.synthesis, &self.generator) {
            (SynthesisMode::Model, Some(generator)) => {
                let generated = tokio::time::timeout(
                    self.config.inference_timeout(),
                    PromptSynthesizer::new(generator.clone()).synthesize(
                        question,
                        schema,
                        self.config.max_new_tokens,
                    ),
                )
                .await;
                match generated {
                    Ok(Ok(candidate)) => candidate,
                    Ok(Err(e)) => {
                        warn!("SQL generation failed ({}), using template", e);
                        synthesize::synthesize(&resolution.intent)
                    }
                    Err(_) => {
                        warn!(
                            "SQL generation timed out after {:?}, using template",
                            self.config.inference_timeout()
                        );
                        synthesize::synthesize(&resolution.intent)
                    }
                }
            }
            (SynthesisMode::Model, None) => {
                warn!("Model synthesis selected without a generator, using template");
                synthesize::synthesize(&resolution.intent)
            }
            (SynthesisMode::Template, _) => synthesize::synthesize(&resolution.intent),
        }
    }

    /// Best-effort translation before resolution. Failure or timeout
    /// keeps the original text.
    async fn normalize_input(&self, question: &str) -> String {
        let translator = match self.translator {
            Some(ref t) => t,
            None => return question.to_string(),
        };
        let translated = tokio::time::timeout(
            self.config.inference_timeout(),
            translator.translate(question, "auto", &self.config.translation_target),
        )
        .await;
        match translated {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!("Translation failed ({}), keeping original text", e);
                question.to_string()
            }
            Err(_) => {
                warn!("Translation timed out, keeping original text");
                question.to_string()
            }
        }
    }
}
