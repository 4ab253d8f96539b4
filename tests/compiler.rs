/// Load-time behavior: program structure, SYNTAX and DUPLICATE-OPERATION.
use flowmatic_core::compiler::{CompilerError, Statement, compile};
use indoc::indoc;

#[test]
fn compiles_the_invoice_generator_shape() {
    let program = compile(indoc! {r#"
        * FLOW-MATIC INVOICE GENERATOR
        (0)  INPUT CUSTOMER-ORDERS FILE-A PRODUCT-CATALOG FILE-B ;
             OUTPUT INVOICE-OUTPUT FILE-C ;
             HSP D .
        (1)  READ-ITEM A ;
             IF END OF DATA GO TO OPERATION 8 ;
             READ-ITEM B .
        (2)  COMPARE PRODUCT-NO (A) WITH PRODUCT-NO (B) ;
             IF EQUAL GO TO OPERATION 4 ;
             IF LESS GO TO OPERATION 3 ;
             OTHERWISE GO TO OPERATION 5 .
        (3)  READ-ITEM A ;
             IF END OF DATA GO TO OPERATION 8 ;
             JUMP TO OPERATION 2 .
        (4)  TRANSFER A TO C ;
             MOVE PRODUCT-DESC (B) TO PRODUCT-DESC (C) ;
             MULTIPLY QUANTITY (A) BY UNIT-PRICE (B) GIVING LINE-TOTAL (C) ;
             WRITE-ITEM C ;
             PRINT-ITEM D ;
             READ-ITEM A ;
             IF END OF DATA GO TO OPERATION 8 ;
             JUMP TO OPERATION 2 .
        (5)  READ-ITEM B ;
             IF END OF DATA GO TO OPERATION 6 ;
             JUMP TO OPERATION 2 .
        (6)  JUMP TO OPERATION 8 .
        (7)  JUMP TO OPERATION 8 .
        (8)  CLOSE-OUT FILES C ;
             STOP .
    "#})
    .unwrap();

    assert_eq!(program.len(), 9);
    assert_eq!(program.first_operation(), Some(0));
    assert_eq!(program.last_operation(), Some(8));
    assert_eq!(program.operation_at(4).unwrap().statements.len(), 8);
}

#[test]
fn operations_may_be_numbered_sparsely() {
    let program = compile(indoc! {"
        (10) READ-ITEM A .
        (2) STOP .
        (40) STOP .
    "})
    .unwrap();
    assert_eq!(program.first_operation(), Some(2));
    assert_eq!(program.next_after(2), Some(10));
    assert_eq!(program.next_after(10), Some(40));
    assert_eq!(program.next_after(40), None);
}

#[test]
fn case_is_normalized_to_uppercase() {
    let program = compile("(0) read-item a ; if end of data go to operation 1 .\n(1) stop .")
        .unwrap();
    assert_eq!(
        program.operation_at(0).unwrap().statements[0],
        Statement::ReadItem("A".to_string())
    );
}

#[test]
fn duplicate_operation_numbers_fail() {
    assert_eq!(
        compile("(3) STOP .\n(3) STOP ."),
        Err(CompilerError::DuplicateOperation(3))
    );
}

#[test]
fn unknown_keyword_is_a_syntax_error() {
    let Err(CompilerError::Syntax { detail, .. }) = compile("(0) EXECUTE A .") else {
        panic!("expected a syntax error");
    };
    assert!(detail.contains("EXECUTE"));
}

#[test]
fn missing_operation_terminator_fails() {
    assert!(matches!(
        compile("(0) STOP ; "),
        Err(CompilerError::Syntax { .. })
    ));
}

#[test]
fn negative_operation_numbers_fail() {
    assert!(matches!(
        compile("(-1) STOP ."),
        Err(CompilerError::Syntax { .. })
    ));
}

#[test]
fn malformed_file_designation_fails() {
    assert!(matches!(
        compile("(0) INPUT ORDERS TAPE-A ."),
        Err(CompilerError::Syntax { .. })
    ));
}

#[test]
fn comment_lines_do_not_shift_error_lines() {
    let source = "* header comment\n(0) STOP .\n(1) BOGUS .";
    let Err(CompilerError::Syntax { line, .. }) = compile(source) else {
        panic!("expected a syntax error");
    };
    assert_eq!(line, 3);
}
