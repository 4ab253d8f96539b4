pub mod engine;
pub mod error;
pub mod file;

pub use engine::Comparison;
pub use error::{RuntimeError, RuntimeErrorKind};
pub use file::{File, FileMode, FileTable};

use crate::compiler::{self, CompilerError, Program};
use crate::values::Record;
use engine::{Engine, EngineState};
use log::warn;
use std::collections::BTreeMap;

/// Knobs for the engine's underspecified corners. The defaults follow the
/// historical reading; hosts can toggle them per interpreter.
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    /// `false`: OTHERWISE fires when the immediately preceding IF was false.
    /// `true`: it fires when no IF in the operation held and at least one
    /// was evaluated.
    pub otherwise_pairs_any_prior: bool,
    /// `true` turns running past the last operation into a runtime error
    /// instead of a warned, clean halt.
    pub fallthrough_is_error: bool,
    /// Minimum scale of a DIVIDE result; the quotient is rounded
    /// half-to-even at `max(operand scales, this)`.
    pub division_scale_floor: u32,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        ExecutionOptions {
            otherwise_pairs_any_prior: false,
            fallthrough_is_error: false,
            division_scale_floor: 2,
        }
    }
}

/// A FLOW-MATIC interpreter: compiled program, file layer, and engine state
/// under exclusive ownership. Strictly single-threaded; clone-with-fresh-
/// inputs is the intended model for parallel use.
#[derive(Debug, Clone, Default)]
pub struct Interpreter {
    program: Option<Program>,
    files: FileTable,
    state: EngineState,
    options: ExecutionOptions,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ExecutionOptions) -> Self {
        Interpreter {
            options,
            ..Self::default()
        }
    }

    /// Parses the source and builds the program table. SYNTAX and
    /// DUPLICATE-OPERATION errors surface here, before anything runs.
    pub fn load_program(&mut self, source: &str) -> Result<(), CompilerError> {
        self.program = Some(compiler::compile(source)?);
        Ok(())
    }

    /// Registers an INPUT file for `alias`. Records are duplicated by value
    /// on every transfer; the caller keeps nothing shared.
    pub fn load_file(&mut self, alias: &str, records: Vec<Record>) {
        self.files.load_input(&alias.to_uppercase(), records);
    }

    /// Executes from the first operation until STOP, fallthrough past the
    /// last operation, or a runtime error. A finished interpreter stays
    /// inspectable but is never resumed; start a fresh instance instead.
    pub fn run(&mut self) -> Result<(), RuntimeError> {
        if self.state.halted {
            warn!("interpreter has already run; it will not be resumed");
            return Ok(());
        }
        let Some(program) = &self.program else {
            warn!("run() called before load_program()");
            return Ok(());
        };
        let result =
            Engine::new(program, &mut self.files, &mut self.state, &self.options).run();
        self.state.halted = true;
        result
    }

    /// Records written to an OUTPUT file, in write order.
    pub fn get_output(&self, alias: &str) -> Option<&[Record]> {
        self.files
            .get(&alias.to_uppercase())
            .filter(|file| file.mode == FileMode::Output)
            .map(|file| file.records())
    }

    /// Lines emitted by PRINT-ITEM, in emission order.
    pub fn get_printer_output(&self) -> &[String] {
        &self.state.printer
    }

    /// Aliases of every OUTPUT and HSP file, in declaration order.
    pub fn output_aliases(&self) -> Vec<&str> {
        self.files
            .iter()
            .filter(|file| matches!(file.mode, FileMode::Output | FileMode::Hsp))
            .map(|file| file.alias.as_str())
            .collect()
    }

    // ---- debug taps ---------------------------------------------------

    pub fn comparison_flag(&self) -> Option<Comparison> {
        self.state.comparison
    }

    /// The live SET OPERATION override map: operation number to the target
    /// its terminal transfer now uses.
    pub fn jump_overrides(&self) -> &BTreeMap<u32, u32> {
        &self.state.overrides
    }

    pub fn working_record(&self, alias: &str) -> Option<&Record> {
        self.state.working.get(&alias.to_uppercase())
    }

    pub fn program(&self) -> Option<&Program> {
        self.program.as_ref()
    }

    pub fn file(&self, alias: &str) -> Option<&File> {
        self.files.get(&alias.to_uppercase())
    }
}
