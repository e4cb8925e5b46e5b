//! Translation Boundary
//!
//! Best-effort input normalization before resolution. A failed or
//! slow translation is never fatal; the session keeps the original
//! question text.

use crate::error::Result;
use async_trait::async_trait;

/// Translation collaborator. `src` may be "auto".
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, src: &str, dest: &str) -> Result<String>;
}
