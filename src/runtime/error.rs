use crate::runtime::file::FileMode;
use thiserror::Error;

/// A run-time failure: the taxonomy tag plus the operation number at which
/// it occurred. Run-time errors halt the interpreter immediately; the state
/// stays inspectable but must not be resumed.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("operation {operation}: {kind}")]
pub struct RuntimeError {
    pub operation: u32,
    pub kind: RuntimeErrorKind,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeErrorKind {
    #[error("unknown operation {0}")]
    UnknownOperation(u32),
    #[error("unknown file alias {0}")]
    UnknownAlias(String),
    #[error("field {field} not present in the record of {alias}")]
    UnknownField { field: String, alias: String },
    #[error("division by zero")]
    ZeroDivide,
    #[error("type coercion failed: {0}")]
    TypeCoerce(String),
    #[error("file {alias} is not an {expected} file")]
    FileMode { alias: String, expected: FileMode },
    #[error("file {0} has been closed out")]
    FileClosed(String),
    #[error("ran past the last operation without STOP")]
    EndOfProgram,
}
