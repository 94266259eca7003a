use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::ServiceError;

pub mod gemini;
pub mod mock;

pub use gemini::*;
pub use mock::*;

/// Low-level generation-service abstraction.
///
/// Implementors execute one prompt and return the raw model text. `structured`
/// requests JSON output from the service when the expected result is a list of
/// records; free-text results omit it. All parsing and validation happens
/// above this boundary.
#[async_trait]
pub trait GenerationClient: Send + Sync + Debug {
    async fn generate(&self, prompt: String, structured: bool) -> Result<String, ServiceError>;

    /// Clone this client into a boxed trait object.
    fn clone_box(&self) -> Box<dyn GenerationClient>;
}

impl Clone for Box<dyn GenerationClient> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

#[async_trait]
impl GenerationClient for Box<dyn GenerationClient> {
    async fn generate(&self, prompt: String, structured: bool) -> Result<String, ServiceError> {
        self.as_ref().generate(prompt, structured).await
    }

    fn clone_box(&self) -> Box<dyn GenerationClient> {
        self.as_ref().clone_box()
    }
}
