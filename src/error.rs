use thiserror::Error;

/// Transport-level failures from the generation service.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("API error: {0}")]
    Api(String),
    #[error("Rate limit exceeded")]
    RateLimit,
    #[error("Authentication failed")]
    Authentication,
}

/// Failures turning raw model output into typed records.
///
/// `MalformedResponse` carries the diagnostic of the first parse attempt (the
/// one against the repaired text); `SchemaMismatch` names the field category
/// that failed structural validation.
#[derive(Error, Debug)]
pub enum NormalizationError {
    #[error("Yapay zekadan gelen yanıt formatı bozuk (JSON bekleniyordu). Detay: {0}")]
    MalformedResponse(String),
    #[error("Yanıt beklenen formatta gelmedi. Eksik veya hatalı alan: {0}")]
    SchemaMismatch(String),
}

impl NormalizationError {
    pub fn is_schema_mismatch(&self) -> bool {
        matches!(self, Self::SchemaMismatch(_))
    }
}

/// Domain-level generation failure. `Display` is the user-facing message; the
/// source chain keeps the technical cause for logs.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// Service credential absent. Fatal for the session until corrected
    /// externally.
    #[error("API anahtarı yapılandırılmamış. Lütfen GEMINI_API_KEY ortam değişkenini ayarlayın.")]
    Configuration,
    #[error("Yapay zekadan içerik alınamadı. Lütfen tekrar deneyin.")]
    Service(#[from] ServiceError),
    #[error("{0}")]
    Normalization(#[from] NormalizationError),
}

/// A user action attempted without a fully resolved selection path. Surfaced
/// inline, never changes the view state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Composite error for session actions that can fail either way: a
/// validation message to surface inline, or a generation failure.
#[derive(Error, Debug)]
pub enum ActionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
}
