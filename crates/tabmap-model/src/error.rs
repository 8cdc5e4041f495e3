use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("custom field label '{0}' does not produce a usable key")]
    EmptyCustomSlug(String),
    #[error("invalid file identity: {0}")]
    InvalidIdentity(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
