/// Centralized constants for bookrec
pub mod constants {
    /// Directory name for bookrec metadata (hidden directory in the workspace)
    pub const BOOKREC_DIR_NAME: &str = ".bookrec";

    /// Configuration filename
    pub const CONFIG_FILENAME: &str = "config.toml";

    /// Global config directory name (in user config/data directories)
    pub const GLOBAL_CONFIG_DIR_NAME: &str = "bookrec";

    /// Models subdirectory name
    pub const MODELS_DIR_NAME: &str = "models";

    /// Default catalog file, relative to the workspace
    pub const DEFAULT_BOOKS_FILENAME: &str = "books_with_emotions.csv";

    /// Default tagged-description file, relative to the workspace
    pub const DEFAULT_DESCRIPTIONS_FILENAME: &str = "tagged_description.txt";

    /// Appended to a thumbnail URL to request the large cover
    pub const LARGE_THUMBNAIL_SUFFIX: &str = "&fife=w800";

    /// Used when an entry has no thumbnail
    pub const COVER_NOT_FOUND: &str = "cover-not-found.jpg";

    /// Sentinel for "no filter" in category and tone choices
    pub const ALL_SENTINEL: &str = "All";

    /// Candidates pulled from the vector index per query
    pub const DEFAULT_INITIAL_TOP_K: usize = 50;

    /// Results returned per query
    pub const DEFAULT_FINAL_TOP_K: usize = 16;

    /// Words kept when truncating a description for a caption
    pub const CAPTION_DESCRIPTION_WORDS: usize = 30;

    /// Default fastembed model name
    pub const DEFAULT_MODEL: &str = "all-mpnet-base-v2";

    /// Buckets used by the hashing embedder
    pub const DEFAULT_HASHING_DIMENSIONS: usize = 384;

    /// Lines embedded per batch while building the index
    pub const DEFAULT_EMBED_BATCH_SIZE: usize = 64;
}
