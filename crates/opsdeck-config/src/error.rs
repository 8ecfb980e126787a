use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config directory not found")]
    ConfigDirNotFound,

    #[error(
        "Config file not found. Checked:\n\
        - current directory: opsdeck.local.yaml, opsdeck.yaml, .opsdeck.yaml\n\
        - ./.opsdeck/ directory\n\
        - ~/.config/opsdeck/opsdeck.yaml\n\
        Set OPSDECK_CONFIG_PATH to point at a file directly"
    )]
    ConfigFileNotFound,

    #[error("Invalid config {path}: {message}")]
    Invalid { path: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
