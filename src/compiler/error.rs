use thiserror::Error;

/// Load-time failures. Everything here is raised before the first operation
/// executes; a program that compiles never fails for syntactic reasons later.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompilerError {
    #[error("syntax error at line {line}: {detail}")]
    Syntax { line: usize, detail: String },
    #[error("duplicate operation number {0}")]
    DuplicateOperation(u32),
}

impl CompilerError {
    pub(crate) fn syntax(source: &str, offset: usize, detail: impl Into<String>) -> Self {
        CompilerError::Syntax {
            line: line_of(source, offset),
            detail: detail.into(),
        }
    }
}

/// 1-based line number of a byte offset into the source.
pub(crate) fn line_of(source: &str, offset: usize) -> usize {
    source[..offset.min(source.len())]
        .bytes()
        .filter(|b| *b == b'\n')
        .count()
        + 1
}
