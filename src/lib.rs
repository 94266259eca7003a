pub mod clients;
pub mod controller;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod normalize;
pub mod quiz;
pub mod selection;
pub mod transcript;

// Convenient re-exports
pub use controller::{AppController, TransitionHook, ViewState};
pub use error::{ActionError, GenerationError, NormalizationError, ServiceError, ValidationError};
pub use gateway::GenerationGateway;
pub use quiz::{QuizSession, ScoreSummary};
