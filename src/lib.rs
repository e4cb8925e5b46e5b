pub mod config;
pub mod error;
pub mod intent;
pub mod llm;
pub mod render;
pub mod safety;
pub mod schema;
pub mod semantic;
pub mod session;
pub mod store;
pub mod synthesize;
pub mod translate;

pub use config::{ChatConfig, ResolutionStrategy, SynthesisMode};
pub use error::{ChatError, Result};
pub use session::{Answer, ChatSession};
pub use store::{QueryResult, Store};
