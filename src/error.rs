use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("table `{0}` does not exist")]
    TableNotFound(String),

    #[error("duplicate value for unique field `{field}` in table `{table}`")]
    UniqueViolation { table: String, field: String },

    #[error("you need to be logged in")]
    NotLoggedIn,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("user {0} not found")]
    UserNotFound(u64),

    #[error("conversation {0} not found")]
    ConversationNotFound(u64),

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("invalid command: {0}")]
    InvalidCommand(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
