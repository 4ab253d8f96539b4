/// Exact-decimal arithmetic through full programs, plus the arithmetic
/// error taxonomy.
use bigdecimal::BigDecimal;
use flowmatic_core::runtime::RuntimeErrorKind;
use flowmatic_core::values::value::{add, divide, multiply};
use flowmatic_core::{Interpreter, Record, Value};
use indoc::indoc;
use std::str::FromStr;

fn dec(s: &str) -> Value {
    Value::Decimal(BigDecimal::from_str(s).unwrap())
}

fn run_calculation(statements: &str, input: Record) -> Interpreter {
    let source = format!(
        "(0) INPUT CALC-INPUT FILE-A ; OUTPUT CALC-RESULT FILE-C .\n\
         (1) READ-ITEM A ; {statements} ; WRITE-ITEM C ; STOP ."
    );
    let mut interpreter = Interpreter::new();
    interpreter.load_program(&source).expect("program compiles");
    interpreter.load_file("A", vec![input]);
    interpreter
}

fn result_field(interpreter: &Interpreter, field: &str) -> Value {
    interpreter.get_output("C").unwrap()[0]
        .get(field)
        .cloned()
        .expect("result field present")
}

#[test]
fn literal_multiplication_is_exact() {
    let mut interpreter = run_calculation(
        "MULTIPLY 0.1 BY 0.2 GIVING PRODUCT (C)",
        Record::new(),
    );
    interpreter.run().unwrap();
    assert_eq!(result_field(&interpreter, "PRODUCT"), dec("0.02"));
}

#[test]
fn add_without_giving_accumulates_in_place() {
    let mut interpreter = run_calculation(
        "MOVE BASE (A) TO TOTAL (C) ; ADD EXTRA (A) TO TOTAL (C)",
        Record::from([("BASE", dec("1.25")), ("EXTRA", dec("0.50"))]),
    );
    interpreter.run().unwrap();
    assert_eq!(result_field(&interpreter, "TOTAL"), dec("1.75"));
}

#[test]
fn subtract_takes_a_from_b() {
    let mut interpreter = run_calculation(
        "SUBTRACT DEDUCTION (A) FROM GROSS (A) GIVING NET (C)",
        Record::from([("GROSS", dec("600.00")), ("DEDUCTION", dec("120.00"))]),
    );
    interpreter.run().unwrap();
    assert_eq!(result_field(&interpreter, "NET"), dec("480.00"));
}

#[test]
fn divide_rounds_half_to_even_at_operand_scale() {
    let mut interpreter = run_calculation(
        "DIVIDE TOTAL (A) BY COUNT (A) GIVING AVERAGE (C)",
        Record::from([("TOTAL", dec("10.00")), ("COUNT", Value::from(3))]),
    );
    interpreter.run().unwrap();
    assert_eq!(result_field(&interpreter, "AVERAGE"), dec("3.33"));
}

#[test]
fn integer_division_gets_the_minimum_scale() {
    let mut interpreter = run_calculation(
        "DIVIDE TOTAL (A) BY COUNT (A) GIVING SHARE (C)",
        Record::from([("TOTAL", Value::from(10)), ("COUNT", Value::from(4))]),
    );
    interpreter.run().unwrap();
    assert_eq!(result_field(&interpreter, "SHARE"), dec("2.50"));
}

#[test]
fn division_by_zero_reports_the_operation() {
    let mut interpreter = run_calculation(
        "DIVIDE TOTAL (A) BY COUNT (A) GIVING SHARE (C)",
        Record::from([("TOTAL", Value::from(1)), ("COUNT", Value::from(0))]),
    );
    let error = interpreter.run().unwrap_err();
    assert_eq!(error.operation, 1);
    assert_eq!(error.kind, RuntimeErrorKind::ZeroDivide);
}

#[test]
fn arithmetic_on_text_is_a_coercion_error() {
    let mut interpreter = run_calculation(
        "ADD NAME (A) TO TOTAL (A) GIVING SUM (C)",
        Record::from([("NAME", Value::from("ACME")), ("TOTAL", Value::from(1))]),
    );
    let error = interpreter.run().unwrap_err();
    assert!(matches!(error.kind, RuntimeErrorKind::TypeCoerce(_)));
}

#[test]
fn missing_arithmetic_operand_is_an_unknown_field() {
    let mut interpreter = run_calculation(
        "ADD MISSING (A) TO TOTAL (A) GIVING SUM (C)",
        Record::from([("TOTAL", Value::from(1))]),
    );
    let error = interpreter.run().unwrap_err();
    assert_eq!(
        error.kind,
        RuntimeErrorKind::UnknownField {
            field: "MISSING".to_string(),
            alias: "A".to_string(),
        }
    );
}

#[test]
fn missing_move_source_reads_as_null() {
    // MOVE is lenient where arithmetic is strict
    let mut interpreter = run_calculation(
        "MOVE MISSING (A) TO GAP (C)",
        Record::from([("TOTAL", Value::from(1))]),
    );
    interpreter.run().unwrap();
    assert_eq!(result_field(&interpreter, "GAP"), Value::Null);
}

#[test]
fn addition_is_associative_over_literals() {
    let a = dec("0.123456789012345678");
    let b = dec("987654.321098765432109876");
    let c = dec("55.5");
    let left = add(&add(&a, &b).unwrap(), &c).unwrap();
    let right = add(&a, &add(&b, &c).unwrap()).unwrap();
    assert_eq!(left, right);
}

#[test]
fn multiplication_keeps_full_precision() {
    let product = multiply(&dec("1.000000000000000001"), &dec("3")).unwrap();
    assert_eq!(product, dec("3.000000000000000003"));
}

#[test]
fn divide_scale_floor_is_configurable_per_call() {
    let quotient = divide(&Value::from(1), &Value::from(8), 4).unwrap();
    assert_eq!(quotient, dec("0.1250"));
}
