use crate::compiler::parser::{
    ArithmeticOp, Condition, FieldRef, Operand, Operation, Statement,
};
use crate::compiler::program::Program;
use crate::runtime::ExecutionOptions;
use crate::runtime::error::{RuntimeError, RuntimeErrorKind};
use crate::runtime::file::{FileMode, FileTable};
use crate::values::value as arith;
use crate::values::{NumericError, Record, Value};
use indexmap::IndexMap;
use log::{debug, trace, warn};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use strum::Display;

/// The engine-scoped comparison flag. Set by COMPARE/TEST, consumed by IF;
/// persists until the next COMPARE/TEST regardless of operation boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Comparison {
    #[strum(serialize = "EQUAL")]
    Equal,
    #[strum(serialize = "LESS")]
    Less,
    #[strum(serialize = "GREATER")]
    Greater,
}

/// What a statement did with control.
enum Flow {
    Continue,
    Jump(u32),
    Halt,
}

/// Mutable state carried across the fetch-decode-execute loop. Owned by the
/// interpreter so it stays inspectable after a failed run.
#[derive(Debug, Clone, Default)]
pub struct EngineState {
    pub(crate) pc: u32,
    pub(crate) comparison: Option<Comparison>,
    /// Alias of the most recent READ-ITEM; END OF DATA tests look here.
    pub(crate) last_read: Option<String>,
    /// Working record buffers, one per alias, fed by TRANSFER and MOVE.
    pub(crate) working: IndexMap<String, Record>,
    /// SET OPERATION overrides: operation number to replacement jump target.
    pub(crate) overrides: BTreeMap<u32, u32>,
    pub(crate) printer: Vec<String>,
    pub(crate) halted: bool,
}

pub(crate) struct Engine<'r> {
    program: &'r Program,
    files: &'r mut FileTable,
    state: &'r mut EngineState,
    options: &'r ExecutionOptions,
}

impl<'r> Engine<'r> {
    pub fn new(
        program: &'r Program,
        files: &'r mut FileTable,
        state: &'r mut EngineState,
        options: &'r ExecutionOptions,
    ) -> Self {
        Engine {
            program,
            files,
            state,
            options,
        }
    }

    pub fn run(&mut self) -> Result<(), RuntimeError> {
        let program = self.program;
        let Some(first) = program.first_operation() else {
            warn!("program has no operations, nothing to run");
            return Ok(());
        };
        self.state.pc = first;

        while !self.state.halted {
            let pc = self.state.pc;
            let Some(operation) = program.operation_at(pc) else {
                return Err(self.fail(RuntimeErrorKind::UnknownOperation(pc)));
            };
            debug!("executing operation ({pc})");

            match self.execute_operation(operation)? {
                Flow::Halt => self.state.halted = true,
                Flow::Jump(target) => {
                    if program.operation_at(target).is_none() {
                        return Err(self.fail(RuntimeErrorKind::UnknownOperation(target)));
                    }
                    self.state.pc = target;
                }
                Flow::Continue => match program.next_after(pc) {
                    Some(next) => self.state.pc = next,
                    None => {
                        if self.options.fallthrough_is_error {
                            return Err(self.fail(RuntimeErrorKind::EndOfProgram));
                        }
                        warn!("fell through past operation ({pc}) without STOP");
                        self.state.halted = true;
                    }
                },
            }
        }
        Ok(())
    }

    /// Runs one operation's statements left to right. Returns on the first
    /// statement that transfers control.
    fn execute_operation(&mut self, operation: &Operation) -> Result<Flow, RuntimeError> {
        let mut previous_if_failed = false;
        let mut any_if_held = false;
        let mut any_if_failed = false;

        for statement in &operation.statements {
            match statement {
                Statement::If { condition, action } => {
                    if self.condition_holds(*condition) {
                        any_if_held = true;
                        previous_if_failed = false;
                        match self.execute_statement(action)? {
                            Flow::Continue => {}
                            // a taken IF transfer skips the rest of the
                            // operation and never consults the override map
                            flow => return Ok(flow),
                        }
                    } else {
                        previous_if_failed = true;
                        any_if_failed = true;
                    }
                }
                Statement::Otherwise { action } => {
                    let fires = if self.options.otherwise_pairs_any_prior {
                        !any_if_held && any_if_failed
                    } else {
                        previous_if_failed
                    };
                    previous_if_failed = false;
                    if fires {
                        match self.execute_statement(action)? {
                            Flow::Continue => {}
                            flow => return Ok(flow),
                        }
                    }
                }
                Statement::Jump { target } => {
                    // terminal unconditional transfer: the one place the
                    // override map applies
                    let target = self
                        .state
                        .overrides
                        .get(&operation.number)
                        .copied()
                        .unwrap_or(*target);
                    return Ok(Flow::Jump(target));
                }
                other => {
                    previous_if_failed = false;
                    match self.execute_statement(other)? {
                        Flow::Continue => {}
                        flow => return Ok(flow),
                    }
                }
            }
        }
        Ok(Flow::Continue)
    }

    fn execute_statement(&mut self, statement: &Statement) -> Result<Flow, RuntimeError> {
        trace!("  {statement:?}");
        match statement {
            Statement::Input(decls) => {
                for decl in decls {
                    self.files.declare(&decl.alias, &decl.name, FileMode::Input);
                }
            }
            Statement::Output(decls) => {
                for decl in decls {
                    self.files.declare(&decl.alias, &decl.name, FileMode::Output);
                }
            }
            Statement::Hsp(aliases) => {
                for alias in aliases {
                    self.files.declare(alias, alias, FileMode::Hsp);
                }
            }
            Statement::ReadItem(alias) => self.read_item(alias)?,
            Statement::WriteItem(alias) => self.write_item(alias)?,
            Statement::PrintItem(alias) => self.print_item(alias)?,
            Statement::Transfer { from, to } => {
                let record = {
                    let file = self.file_checked(from, FileMode::Input)?;
                    file.current().cloned().unwrap_or_default()
                };
                *self.working_mut(to)? = record;
            }
            Statement::Move { source, target } => {
                let value = self.operand_value(source)?;
                let field = target.field.clone();
                self.working_mut(&target.alias)?.set(field, value);
            }
            Statement::Compare { left, right } => {
                let a = self.read_field(left)?;
                let b = self.read_field(right)?;
                self.set_comparison(a.compare(&b));
            }
            Statement::Test { field, against } => {
                let a = self.read_field(field)?;
                let b = self.operand_value(against)?;
                self.set_comparison(a.compare(&b));
            }
            Statement::SetOperation { operation, target } => {
                debug!("operation ({operation}) now transfers to ({target})");
                self.state.overrides.insert(*operation, *target);
            }
            Statement::Arithmetic { op, a, b, giving } => {
                self.arithmetic(*op, a, b, giving.as_ref())?;
            }
            Statement::CloseOut(aliases) => {
                for alias in aliases {
                    let operation = self.state.pc;
                    let file = self.files.get_mut(alias).ok_or(RuntimeError {
                        operation,
                        kind: RuntimeErrorKind::UnknownAlias(alias.clone()),
                    })?;
                    debug!("closing out file {alias}");
                    file.close();
                }
            }
            Statement::Jump { target } => return Ok(Flow::Jump(*target)),
            Statement::Stop => return Ok(Flow::Halt),
            Statement::If { .. } | Statement::Otherwise { .. } => {
                unreachable!("the parser rejects nested conditionals")
            }
        }
        Ok(Flow::Continue)
    }

    fn read_item(&mut self, alias: &str) -> Result<(), RuntimeError> {
        let operation = self.state.pc;
        let file = self.file_checked_mut(alias, FileMode::Input)?;
        if file.read_next() {
            trace!("READ-ITEM {alias}: cursor at {}", file.cursor());
        } else {
            debug!("READ-ITEM {alias}: end of data at operation ({operation})");
        }
        self.state.last_read = Some(alias.to_string());
        Ok(())
    }

    fn write_item(&mut self, alias: &str) -> Result<(), RuntimeError> {
        {
            let file = self.file_checked(alias, FileMode::Output)?;
            if file.is_closed() {
                return Err(self.fail(RuntimeErrorKind::FileClosed(alias.to_string())));
            }
        }
        // append a copy of the working record, then clear it
        let record = self.state.working.shift_remove(alias).unwrap_or_default();
        self.file_checked_mut(alias, FileMode::Output)?.append(record);
        Ok(())
    }

    fn print_item(&mut self, alias: &str) -> Result<(), RuntimeError> {
        self.file_checked(alias, FileMode::Hsp)?;
        let line = self
            .state
            .working
            .get(alias)
            .map(Record::printer_line)
            .unwrap_or_default();
        trace!("PRINT-ITEM {alias}: {line}");
        self.state.printer.push(line);
        Ok(())
    }

    fn arithmetic(
        &mut self,
        op: ArithmeticOp,
        a: &Operand,
        b: &Operand,
        giving: Option<&FieldRef>,
    ) -> Result<(), RuntimeError> {
        let va = self.numeric_operand(a)?;
        let vb = self.numeric_operand(b)?;
        let result = match op {
            ArithmeticOp::Add => arith::add(&va, &vb),
            ArithmeticOp::Subtract => arith::subtract(&va, &vb),
            ArithmeticOp::Multiply => arith::multiply(&va, &vb),
            ArithmeticOp::Divide => {
                arith::divide(&va, &vb, self.options.division_scale_floor)
            }
        }
        .map_err(|error| self.numeric_error(error))?;

        let destination = match giving {
            Some(field_ref) => field_ref.clone(),
            None => match b {
                Operand::Field(field_ref) => field_ref.clone(),
                Operand::Literal(_) => {
                    return Err(self.fail(RuntimeErrorKind::TypeCoerce(
                        "arithmetic destination is not a field".to_string(),
                    )));
                }
            },
        };
        let field = destination.field.clone();
        self.working_mut(&destination.alias)?.set(field, result);
        Ok(())
    }

    fn condition_holds(&self, condition: Condition) -> bool {
        match condition {
            Condition::Equal | Condition::Zero => self.flag_is(Comparison::Equal),
            Condition::Less | Condition::Negative => self.flag_is(Comparison::Less),
            Condition::Greater | Condition::Positive => self.flag_is(Comparison::Greater),
            Condition::EndOfData => match &self.state.last_read {
                Some(alias) => self
                    .files
                    .get(alias)
                    .map(|file| file.end_of_data())
                    .unwrap_or(false),
                None => {
                    warn!("IF END OF DATA before any READ-ITEM");
                    false
                }
            },
        }
    }

    fn flag_is(&self, expected: Comparison) -> bool {
        match self.state.comparison {
            Some(flag) => flag == expected,
            None => {
                warn!("conditional test before any COMPARE or TEST");
                false
            }
        }
    }

    fn set_comparison(&mut self, ordering: Ordering) {
        let flag = match ordering {
            Ordering::Less => Comparison::Less,
            Ordering::Equal => Comparison::Equal,
            Ordering::Greater => Comparison::Greater,
        };
        trace!("comparison flag set to {flag}");
        self.state.comparison = Some(flag);
    }

    /// Reads through a field reference: the current record for INPUT
    /// aliases, the working record otherwise. Missing fields read as null.
    fn read_field(&self, field_ref: &FieldRef) -> Result<Value, RuntimeError> {
        Ok(self
            .source_record(&field_ref.alias)?
            .and_then(|record| record.get(&field_ref.field))
            .cloned()
            .unwrap_or(Value::Null))
    }

    /// Like [`read_field`](Self::read_field) but a missing field is an
    /// UNKNOWN-FIELD error; arithmetic sources use this.
    fn read_field_strict(&self, field_ref: &FieldRef) -> Result<Value, RuntimeError> {
        self.source_record(&field_ref.alias)?
            .and_then(|record| record.get(&field_ref.field))
            .cloned()
            .ok_or_else(|| {
                self.fail(RuntimeErrorKind::UnknownField {
                    field: field_ref.field.clone(),
                    alias: field_ref.alias.clone(),
                })
            })
    }

    fn source_record(&self, alias: &str) -> Result<Option<&Record>, RuntimeError> {
        let file = self
            .files
            .get(alias)
            .ok_or_else(|| self.fail(RuntimeErrorKind::UnknownAlias(alias.to_string())))?;
        Ok(match file.mode {
            FileMode::Input => file.current(),
            _ => self.state.working.get(alias),
        })
    }

    fn operand_value(&self, operand: &Operand) -> Result<Value, RuntimeError> {
        match operand {
            Operand::Literal(value) => Ok(value.clone()),
            Operand::Field(field_ref) => self.read_field(field_ref),
        }
    }

    fn numeric_operand(&self, operand: &Operand) -> Result<Value, RuntimeError> {
        match operand {
            Operand::Literal(value) => Ok(value.clone()),
            Operand::Field(field_ref) => self.read_field_strict(field_ref),
        }
    }

    fn working_mut(&mut self, alias: &str) -> Result<&mut Record, RuntimeError> {
        if self.files.get(alias).is_none() {
            return Err(self.fail(RuntimeErrorKind::UnknownAlias(alias.to_string())));
        }
        Ok(self.state.working.entry(alias.to_string()).or_default())
    }

    fn file_checked(
        &self,
        alias: &str,
        expected: FileMode,
    ) -> Result<&crate::runtime::file::File, RuntimeError> {
        let file = self
            .files
            .get(alias)
            .ok_or_else(|| self.fail(RuntimeErrorKind::UnknownAlias(alias.to_string())))?;
        if file.mode != expected {
            return Err(self.fail(RuntimeErrorKind::FileMode {
                alias: alias.to_string(),
                expected,
            }));
        }
        Ok(file)
    }

    fn file_checked_mut(
        &mut self,
        alias: &str,
        expected: FileMode,
    ) -> Result<&mut crate::runtime::file::File, RuntimeError> {
        let operation = self.state.pc;
        let file = self.files.get_mut(alias).ok_or(RuntimeError {
            operation,
            kind: RuntimeErrorKind::UnknownAlias(alias.to_string()),
        })?;
        if file.mode != expected {
            return Err(RuntimeError {
                operation,
                kind: RuntimeErrorKind::FileMode {
                    alias: alias.to_string(),
                    expected,
                },
            });
        }
        Ok(file)
    }

    fn numeric_error(&self, error: NumericError) -> RuntimeError {
        let kind = match error {
            NumericError::ZeroDivide => RuntimeErrorKind::ZeroDivide,
            NumericError::NotNumeric(_) => RuntimeErrorKind::TypeCoerce(error.to_string()),
        };
        self.fail(kind)
    }

    fn fail(&self, kind: RuntimeErrorKind) -> RuntimeError {
        RuntimeError {
            operation: self.state.pc,
            kind,
        }
    }
}
