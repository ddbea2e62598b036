use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort loading a consist. No partial consist is ever returned.
#[derive(Debug, Error)]
pub enum ConsistError {
    /// The consist file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file extension matches neither the legacy nor the TOML encoding.
    #[error("unsupported consist format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    /// The file bytes are not valid text in the encoding they declare.
    #[error("consist file is not valid {encoding} text")]
    InvalidEncoding { encoding: &'static str },

    /// A legacy file contained something other than the expected delimiter or token.
    #[error("line {line}: expected '{expected}', found '{found}'")]
    UnexpectedToken {
        expected: String,
        found: String,
        line: usize,
    },

    /// A legacy file ended in the middle of a block.
    #[error("unexpected end of file, expected '{expected}'")]
    UnexpectedEof { expected: String },

    /// A legacy literal could not be read as the requested type.
    #[error("line {line}: '{value}' is not a valid {kind}")]
    InvalidLiteral {
        kind: &'static str,
        value: String,
        line: usize,
    },

    /// A legacy file never declared a `Train` block.
    #[error("no Train block found")]
    MissingTrain,

    /// The TOML document does not match the consist schema.
    #[error("invalid TOML consist: {0}")]
    Toml(#[from] toml::de::Error),

    /// A TOML vehicle path is not of the form `folder/name`.
    #[error("vehicle path '{0}' must be of the form 'folder/name'")]
    MalformedVehiclePath(String),

    /// More vehicles than a uid can number.
    #[error("consist has too many vehicles ({0})")]
    TooManyVehicles(usize),

    /// A vehicle finished parsing without an asset folder and name.
    #[error("vehicle #{index} (uid {uid}) has no folder/name data")]
    MissingVehicleData { index: usize, uid: i32 },
}

pub type Result<T> = std::result::Result<T, ConsistError>;
