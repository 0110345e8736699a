use std::path::PathBuf;

/// Failures while reading the catalog or the tagged-description file.
#[derive(Debug, thiserror::Error)]
pub enum CatalogLoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed catalog {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Catalog {path} has no {column:?} column")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Duplicate isbn13 {isbn13} in {path}")]
    DuplicateIsbn { path: PathBuf, isbn13: u64 },

    #[error("Malformed tagged line {line_number} in {path}: {reason}")]
    MalformedTaggedLine {
        path: PathBuf,
        line_number: usize,
        reason: String,
    },

    #[error("No tagged descriptions found in {0}")]
    EmptyTaggedFile(PathBuf),
}

/// Failures from an embedding backend.
#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    #[error("Model initialization failed: {0}")]
    InitFailed(String),

    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("Invalid model name: {0}")]
    InvalidModel(String),
}

#[derive(Debug, thiserror::Error)]
pub enum IndexBuildError {
    #[error("Vector database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Failed to embed tagged descriptions: {0}")]
    Embedding(#[from] EmbedError),

    #[error("Embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// Failures while answering a query against a built index.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("Failed to embed query: {0}")]
    Embedding(#[from] EmbedError),

    #[error("Vector search failed: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Not fatal: an empty result is a valid answer.
#[derive(Debug, thiserror::Error)]
#[error("No books matched \"{query}\"")]
pub struct NoResultsError {
    pub query: String,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    CatalogLoad(#[from] CatalogLoadError),

    #[error(transparent)]
    Embed(#[from] EmbedError),

    #[error(transparent)]
    IndexBuild(#[from] IndexBuildError),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error(transparent)]
    NoResults(#[from] NoResultsError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
