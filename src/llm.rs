//! LLM Client
//!
//! OpenAI-compatible HTTP client implementing the embedding,
//! generation and translation collaborator seams. With the
//! "dummy-api-key" the client runs offline: embeddings degrade to a
//! hashed bag-of-words vector, generation and translation return
//! canned output.

use crate::error::{ChatError, Result};
use crate::semantic::Embedder;
use crate::synthesize::Generator;
use crate::translate::Translator;
use async_trait::async_trait;

pub const DUMMY_API_KEY: &str = "dummy-api-key";

pub struct OpenAiClient {
    api_key: String,
    base_url: String,
    chat_model: String,
    embedding_model: String,
}

impl OpenAiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: "https://api.openai.com/v1".to_string(),
            chat_model: "gpt-4".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    fn is_offline(&self) -> bool {
        self.api_key == DUMMY_API_KEY
    }

    async fn chat(&self, system: &str, prompt: &str, max_tokens: u32) -> Result<String> {
        let client = reqwest::Client::new();
        let body = serde_json::json!({
            "model": self.chat_model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": prompt}
            ],
            "temperature": 0.1,
            "max_tokens": max_tokens
        });

        let response = client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatError::Inference(format!("LLM API call failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ChatError::Inference(format!(
                "LLM API error ({}): {}",
                status, error_text
            )));
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ChatError::Inference(format!("Failed to parse LLM response: {}", e)))?;

        let content = response_json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| ChatError::Inference("No content in LLM response".to_string()))?;

        Ok(content.to_string())
    }
}

#[async_trait]
impl Embedder for OpenAiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if self.is_offline() {
            return Ok(offline_embedding(text));
        }

        let client = reqwest::Client::new();
        let body = serde_json::json!({
            "model": self.embedding_model,
            "input": text,
        });

        let response = client
            .post(format!("{}/embeddings", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatError::Inference(format!("Embedding API call failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ChatError::Inference(format!(
                "Embedding API error ({}): {}",
                status, error_text
            )));
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ChatError::Inference(format!("Failed to parse embedding response: {}", e)))?;

        let data = response_json
            .get("data")
            .and_then(|d| d.as_array())
            .and_then(|arr| arr.first())
            .ok_or_else(|| ChatError::Inference("No embedding data in response".to_string()))?;

        let embedding: Vec<f32> = data
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or_else(|| ChatError::Inference("No embedding vector in response".to_string()))?
            .iter()
            .filter_map(|v| v.as_f64().map(|f| f as f32))
            .collect();

        Ok(embedding)
    }
}

#[async_trait]
impl Generator for OpenAiClient {
    async fn generate(&self, prompt: &str, max_new_tokens: u32) -> Result<String> {
        if self.is_offline() {
            return Ok("SELECT 1".to_string());
        }
        self.chat(
            "You return exactly one SQL statement and nothing else.",
            prompt,
            max_new_tokens,
        )
        .await
    }
}

#[async_trait]
impl Translator for OpenAiClient {
    async fn translate(&self, text: &str, _src: &str, dest: &str) -> Result<String> {
        if self.is_offline() {
            return Ok(text.to_string());
        }
        let prompt = format!(
            "Translate the following text to {}. Return only the translation, nothing else.\n\n{}",
            dest, text
        );
        self.chat("You are a precise translator.", &prompt, 512)
            .await
            .map_err(|e| ChatError::Translation(e.to_string()))
    }
}

/// Hashed bag-of-words vector for offline mode. Shared words still
/// produce high cosine similarity, which keeps the semantic strategy
/// usable without a model.
fn offline_embedding(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; 256];
    for word in text.to_lowercase().split_whitespace() {
        let mut hash: u32 = 2166136261;
        for byte in word.bytes() {
            hash ^= byte as u32;
            hash = hash.wrapping_mul(16777619);
        }
        vector[(hash % 256) as usize] += 1.0;
    }
    vector
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::cosine_similarity;

    #[tokio::test]
    async fn test_offline_embedding_is_deterministic() {
        let client = OpenAiClient::new(DUMMY_API_KEY.to_string());
        let a = client.embed("cuántos empleados hay").await.unwrap();
        let b = client.embed("cuántos empleados hay").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_offline_embedding_reflects_shared_words() {
        let client = OpenAiClient::new(DUMMY_API_KEY.to_string());
        let question = client.embed("cuántos empleados hay").await.unwrap();
        let near = client.embed("cuántos hay").await.unwrap();
        let far = client.embed("algo completamente distinto").await.unwrap();
        assert!(
            cosine_similarity(&question, &near) > cosine_similarity(&question, &far)
        );
    }

    #[tokio::test]
    async fn test_offline_generate_returns_allowed_statement() {
        let client = OpenAiClient::new(DUMMY_API_KEY.to_string());
        let sql = client.generate("anything", 16).await.unwrap();
        assert!(sql.to_lowercase().starts_with("select"));
    }

    #[tokio::test]
    async fn test_offline_translate_keeps_text() {
        let client = OpenAiClient::new(DUMMY_API_KEY.to_string());
        let out = client.translate("hola", "auto", "en").await.unwrap();
        assert_eq!(out, "hola");
    }
}
