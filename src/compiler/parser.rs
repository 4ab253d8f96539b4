use crate::compiler::error::CompilerError;
use crate::compiler::lexer::{SpannedToken, Token};
use crate::values::Value;
use bigdecimal::BigDecimal;
use std::str::FromStr;

/// `FIELD-NAME (x)`: a field looked up through the file alias `x`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRef {
    pub field: String,
    pub alias: String,
}

/// An arithmetic or MOVE/TEST operand in symbolic form; nothing resolves
/// until execution.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Field(FieldRef),
    Literal(Value),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

/// Predicates an IF may test. ZERO/POSITIVE/NEGATIVE read the comparison
/// flag the same way EQUAL/GREATER/LESS do; they exist for tests against
/// zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Equal,
    Less,
    Greater,
    EndOfData,
    Zero,
    Positive,
    Negative,
}

/// One `logical-name FILE-x` pair from an INPUT/OUTPUT declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct FileDecl {
    pub name: String,
    pub alias: String,
}

/// A single semicolon-delimited phrase, one variant per statement shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Input(Vec<FileDecl>),
    Output(Vec<FileDecl>),
    Hsp(Vec<String>),
    ReadItem(String),
    WriteItem(String),
    PrintItem(String),
    Transfer { from: String, to: String },
    Move { source: Operand, target: FieldRef },
    Compare { left: FieldRef, right: FieldRef },
    Test { field: FieldRef, against: Operand },
    If { condition: Condition, action: Box<Statement> },
    Otherwise { action: Box<Statement> },
    Jump { target: u32 },
    SetOperation { operation: u32, target: u32 },
    Arithmetic {
        op: ArithmeticOp,
        a: Operand,
        b: Operand,
        giving: Option<FieldRef>,
    },
    CloseOut(Vec<String>),
    Stop,
}

/// A numbered operation: the dispatch target of every branch.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub number: u32,
    pub statements: Vec<Statement>,
}

pub struct Parser<'src> {
    source: &'src str,
    tokens: Vec<SpannedToken>,
    position: usize,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str, tokens: Vec<SpannedToken>) -> Self {
        Parser {
            source,
            tokens,
            position: 0,
        }
    }

    pub fn parse_program(mut self) -> Result<Vec<Operation>, CompilerError> {
        let mut operations = Vec::new();
        while self.peek().is_some() {
            operations.push(self.parse_operation()?);
        }
        Ok(operations)
    }

    fn parse_operation(&mut self) -> Result<Operation, CompilerError> {
        self.expect(&Token::LeftParen, "'(' opening an operation header")?;
        let number = self.parse_operation_number()?;
        self.expect(&Token::RightParen, "')' closing the operation header")?;

        let mut statements = Vec::new();
        loop {
            statements.push(self.parse_statement()?);
            match self.advance() {
                Some((Token::Semicolon, _)) => continue,
                Some((Token::Period, _)) => break,
                other => {
                    return Err(self.unexpected(other, "';' or '.' after a statement"));
                }
            }
        }
        Ok(Operation { number, statements })
    }

    fn parse_statement(&mut self) -> Result<Statement, CompilerError> {
        let keyword = self.take_word("a statement keyword")?;
        match keyword.as_str() {
            "INPUT" => Ok(Statement::Input(self.parse_file_decls()?)),
            "OUTPUT" => Ok(Statement::Output(self.parse_file_decls()?)),
            "HSP" => Ok(Statement::Hsp(self.parse_alias_list()?)),
            "READ-ITEM" => Ok(Statement::ReadItem(self.take_word("a file alias")?)),
            "WRITE-ITEM" => Ok(Statement::WriteItem(self.take_word("a file alias")?)),
            "PRINT-ITEM" => Ok(Statement::PrintItem(self.take_word("a file alias")?)),
            "TRANSFER" => {
                let from = self.take_word("a source file alias")?;
                self.expect_word("TO")?;
                let to = self.take_word("a destination file alias")?;
                Ok(Statement::Transfer { from, to })
            }
            "MOVE" => {
                let source = self.parse_operand()?;
                self.expect_word("TO")?;
                let target = self.parse_field_ref()?;
                Ok(Statement::Move { source, target })
            }
            "COMPARE" => {
                let left = self.parse_field_ref()?;
                self.expect_word("WITH")?;
                let right = self.parse_field_ref()?;
                Ok(Statement::Compare { left, right })
            }
            "TEST" => {
                let field = self.parse_field_ref()?;
                self.expect_word("AGAINST")?;
                let against = self.parse_operand()?;
                Ok(Statement::Test { field, against })
            }
            "IF" => {
                let condition = self.parse_condition()?;
                let action = self.parse_action("IF")?;
                Ok(Statement::If {
                    condition,
                    action: Box::new(action),
                })
            }
            "OTHERWISE" => {
                let action = self.parse_action("OTHERWISE")?;
                Ok(Statement::Otherwise {
                    action: Box::new(action),
                })
            }
            "JUMP" | "GO" => {
                self.expect_word("TO")?;
                self.expect_word("OPERATION")?;
                let target = self.parse_operation_number()?;
                Ok(Statement::Jump { target })
            }
            "SET" => {
                self.expect_word("OPERATION")?;
                let operation = self.parse_operation_number()?;
                self.expect_word("TO")?;
                self.expect_word("GO")?;
                self.expect_word("TO")?;
                self.expect_word("OPERATION")?;
                let target = self.parse_operation_number()?;
                Ok(Statement::SetOperation { operation, target })
            }
            "ADD" => self.parse_arithmetic(ArithmeticOp::Add, "TO"),
            "SUBTRACT" => self.parse_arithmetic(ArithmeticOp::Subtract, "FROM"),
            "MULTIPLY" => self.parse_arithmetic(ArithmeticOp::Multiply, "BY"),
            "DIVIDE" => self.parse_arithmetic(ArithmeticOp::Divide, "BY"),
            "CLOSE-OUT" => {
                self.expect_word("FILES")?;
                Ok(Statement::CloseOut(self.parse_alias_list()?))
            }
            "STOP" => Ok(Statement::Stop),
            other => Err(self.error(format!("unknown statement keyword {other}"))),
        }
    }

    /// The action of an IF/OTHERWISE is a statement itself, but chaining
    /// conditionals is not part of the notation.
    fn parse_action(&mut self, context: &str) -> Result<Statement, CompilerError> {
        let action = self.parse_statement()?;
        if matches!(action, Statement::If { .. } | Statement::Otherwise { .. }) {
            return Err(self.error(format!(
                "the action of {context} cannot be another conditional"
            )));
        }
        Ok(action)
    }

    fn parse_condition(&mut self) -> Result<Condition, CompilerError> {
        let word = self.take_word("a condition")?;
        match word.as_str() {
            "EQUAL" => Ok(Condition::Equal),
            "LESS" => Ok(Condition::Less),
            "GREATER" => Ok(Condition::Greater),
            "ZERO" => Ok(Condition::Zero),
            "POSITIVE" => Ok(Condition::Positive),
            "NEGATIVE" => Ok(Condition::Negative),
            "END" => {
                self.expect_word("OF")?;
                self.expect_word("DATA")?;
                Ok(Condition::EndOfData)
            }
            other => Err(self.error(format!("unknown condition {other}"))),
        }
    }

    fn parse_arithmetic(
        &mut self,
        op: ArithmeticOp,
        connective: &str,
    ) -> Result<Statement, CompilerError> {
        let a = self.parse_operand()?;
        self.expect_word(connective)?;
        let b = self.parse_operand()?;
        let giving = if self.peek_word("GIVING") {
            self.advance();
            Some(self.parse_field_ref()?)
        } else {
            None
        };
        if giving.is_none() && !matches!(b, Operand::Field(_)) {
            return Err(
                self.error("arithmetic without GIVING needs a field as its destination")
            );
        }
        Ok(Statement::Arithmetic { op, a, b, giving })
    }

    fn parse_file_decls(&mut self) -> Result<Vec<FileDecl>, CompilerError> {
        let mut decls = Vec::new();
        loop {
            let name = self.take_word("a logical file name")?;
            let tag = self.take_word("a FILE-<alias> designation")?;
            let Some(alias) = tag.strip_prefix("FILE-").filter(|a| !a.is_empty()) else {
                return Err(self.error(format!("expected FILE-<alias>, found {tag}")));
            };
            decls.push(FileDecl {
                name,
                alias: alias.to_string(),
            });
            if self.at_statement_end() {
                return Ok(decls);
            }
        }
    }

    fn parse_alias_list(&mut self) -> Result<Vec<String>, CompilerError> {
        let mut aliases = vec![self.take_word("a file alias")?];
        while !self.at_statement_end() {
            aliases.push(self.take_word("a file alias")?);
        }
        Ok(aliases)
    }

    fn parse_operand(&mut self) -> Result<Operand, CompilerError> {
        match self.peek().cloned() {
            Some(Token::TextLiteral(text)) => {
                self.advance();
                Ok(Operand::Literal(Value::Text(text)))
            }
            Some(Token::IntegerLiteral(digits)) => {
                self.advance();
                // i64 covers every realistic literal; larger ones become decimals
                match digits.parse::<i64>() {
                    Ok(i) => Ok(Operand::Literal(Value::Integer(i))),
                    Err(_) => Ok(Operand::Literal(Value::Decimal(
                        self.parse_big_decimal(&digits)?,
                    ))),
                }
            }
            Some(Token::DecimalLiteral(digits)) => {
                self.advance();
                Ok(Operand::Literal(Value::Decimal(
                    self.parse_big_decimal(&digits)?,
                )))
            }
            Some(Token::Word(_)) => Ok(Operand::Field(self.parse_field_ref()?)),
            other => Err(self.unexpected(
                other.map(|t| (t, self.current_span())),
                "a literal or field reference",
            )),
        }
    }

    fn parse_big_decimal(&mut self, digits: &str) -> Result<BigDecimal, CompilerError> {
        BigDecimal::from_str(digits)
            .map_err(|_| self.error(format!("invalid number {digits}")))
    }

    fn parse_field_ref(&mut self) -> Result<FieldRef, CompilerError> {
        let field = self.take_word("a field name")?;
        self.expect(&Token::LeftParen, "'(' before the file alias")?;
        let alias = self.take_word("a file alias")?;
        self.expect(&Token::RightParen, "')' after the file alias")?;
        Ok(FieldRef { field, alias })
    }

    fn parse_operation_number(&mut self) -> Result<u32, CompilerError> {
        match self.advance() {
            Some((Token::IntegerLiteral(digits), _)) => digits
                .parse::<u32>()
                .map_err(|_| self.error(format!("invalid operation number {digits}"))),
            other => Err(self.unexpected(other, "an operation number")),
        }
    }

    // ---- token cursor -------------------------------------------------

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position).map(|(t, _)| t)
    }

    fn peek_word(&self, word: &str) -> bool {
        matches!(self.peek(), Some(Token::Word(w)) if w == word)
    }

    fn at_statement_end(&self) -> bool {
        matches!(self.peek(), Some(Token::Semicolon | Token::Period) | None)
    }

    fn advance(&mut self) -> Option<SpannedToken> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn take_word(&mut self, expected: &str) -> Result<String, CompilerError> {
        match self.advance() {
            Some((Token::Word(word), _)) => Ok(word),
            other => Err(self.unexpected(other, expected)),
        }
    }

    fn expect(&mut self, token: &Token, expected: &str) -> Result<(), CompilerError> {
        match self.advance() {
            Some((found, _)) if found == *token => Ok(()),
            other => Err(self.unexpected(other, expected)),
        }
    }

    fn expect_word(&mut self, word: &str) -> Result<(), CompilerError> {
        match self.advance() {
            Some((Token::Word(found), _)) if found == word => Ok(()),
            other => Err(self.unexpected(other, word)),
        }
    }

    fn current_span(&self) -> std::ops::Range<usize> {
        self.tokens
            .get(self.position)
            .map(|(_, span)| span.clone())
            .unwrap_or(self.source.len()..self.source.len())
    }

    fn unexpected(&self, found: Option<SpannedToken>, expected: &str) -> CompilerError {
        match found {
            Some((token, span)) => CompilerError::syntax(
                self.source,
                span.start,
                format!("expected {expected}, found {token}"),
            ),
            None => CompilerError::syntax(
                self.source,
                self.source.len(),
                format!("expected {expected}, found end of source"),
            ),
        }
    }

    fn error(&self, detail: impl Into<String>) -> CompilerError {
        let span = self
            .tokens
            .get(self.position.saturating_sub(1))
            .map(|(_, span)| span.clone())
            .unwrap_or(self.source.len()..self.source.len());
        CompilerError::syntax(self.source, span.start, detail)
    }
}
