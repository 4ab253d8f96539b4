pub mod error;
pub mod lexer;
pub mod parser;
pub mod program;

pub use error::CompilerError;
pub use parser::{
    ArithmeticOp, Condition, FieldRef, FileDecl, Operand, Operation, Statement,
};
pub use program::Program;

use parser::Parser;

/// Compiles FLOW-MATIC source text into an executable [`Program`].
pub fn compile(source: &str) -> Result<Program, CompilerError> {
    let stripped = strip_comments(source);
    let tokens = lexer::tokenize(&stripped)?;
    let operations = Parser::new(&stripped, tokens).parse_program()?;
    Program::from_operations(operations)
}

/// Blanks every line whose first non-whitespace character is `*`, keeping
/// the line structure so error positions still point into the original
/// source.
fn strip_comments(source: &str) -> String {
    source
        .lines()
        .map(|line| {
            if line.trim_start().starts_with('*') {
                ""
            } else {
                line
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
