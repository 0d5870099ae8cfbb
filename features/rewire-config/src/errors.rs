/// Errors when trying to read a configuration document
#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    /// The document is not valid JSON
    #[error("Failed to parse configuration document: {0}")]
    Parse(#[from] serde_json::Error),
    /// The document could not be read
    #[error("Failed to read configuration document: {0}")]
    Io(#[from] std::io::Error),
}
