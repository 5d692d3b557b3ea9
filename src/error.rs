use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{field} is empty")]
    EmptyInput { field: &'static str },

    #[error("completion service error: {0}")]
    Service(String),

    #[error("model {model:?} not in available models: {available:?}")]
    ModelConfiguration {
        model: String,
        available: Vec<&'static str>,
    },

    #[error("OPENAI_API_KEY environment variable is not set")]
    MissingApiKey,
}
