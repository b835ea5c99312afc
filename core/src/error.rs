use crate::DocumentId;

/// Coarse classification of a [`SearchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    Config,
}

#[derive(thiserror::Error, Debug)]
pub enum SearchError {
    #[error("invalid document id {0}")]
    InvalidDocumentId(DocumentId),

    #[error("document id {0} is already indexed")]
    DuplicateDocumentId(DocumentId),

    #[error("word {0:?} is invalid")]
    InvalidWord(String),

    #[error("stop word {0:?} is invalid")]
    InvalidStopWord(String),

    #[error("query word {0:?} is invalid")]
    InvalidQueryWord(String),

    #[error("query is empty")]
    EmptyQuery,

    #[error("document {0} not found")]
    DocumentNotFound(DocumentId),

    #[error(transparent)]
    Config(#[from] serde_json::Error),
}

impl SearchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SearchError::DocumentNotFound(_) => ErrorKind::NotFound,
            SearchError::Config(_) => ErrorKind::Config,
            _ => ErrorKind::InvalidArgument,
        }
    }
}

pub type Result<T> = core::result::Result<T, SearchError>;
