use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Generation(String),

    #[error("a script is already being generated")]
    Busy,

    #[error("no script with id {0}")]
    UnknownScript(String),

    #[error("storage error: {0}")]
    Persistence(String),

    #[error("export error: {0}")]
    Export(String),
}

impl From<rust_xlsxwriter::XlsxError> for ScriptError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        ScriptError::Export(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ScriptError>;
