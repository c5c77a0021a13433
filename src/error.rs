use thiserror::Error;

/**
 * Everything that can abort a run. Skippable rows, clamped
 * trigonometry and classification gaps never end up here,
 * they are counted in the diagnostics instead.
 **/
#[derive(Error, Debug)]
pub enum Error {
    #[error("catalog not found: {0}")]
    MissingCatalog(String),
    #[error("catalog contains no usable records: {0}")]
    EmptyCatalog(String),
    #[error("malformed catalog {path}, line {line}: {reason}")]
    MalformedCatalog {
        path: String,
        line: usize,
        reason: String,
    },
    #[error("unknown projection mode '{0}', expected skybox, skymap or all")]
    UnknownMode(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("glob pattern error: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("logger setup failed: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn malformed(path: &str, line: usize, reason: impl Into<String>) -> Self {
        Error::MalformedCatalog {
            path: path.to_string(),
            line,
            reason: reason.into(),
        }
    }
}
