pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Occurs when `rpbridge.toml` fails to load.
    #[error("failed to load rpbridge.toml: {0}")]
    LoadError(String),
    /// Occurs when a required setting is missing from both the file and the environment.
    #[error("the setting \"{0}\" is not configured")]
    ValueNotFound(String),
    /// Occurs when a screenshot attached to a step can not be read.
    #[error("failed to read screenshot {path:?}: {source}")]
    Screenshot {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}
