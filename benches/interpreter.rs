use bigdecimal::BigDecimal;
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use flowmatic_core::{Interpreter, Record, Value, compile};
use std::str::FromStr;

const MATCH_PROGRAM: &str = r#"
(0)  INPUT CUSTOMER-ORDERS FILE-A PRODUCT-CATALOG FILE-B ;
     OUTPUT INVOICE-OUTPUT FILE-C .
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
     MULTIPLY QUANTITY (A) BY UNIT-PRICE (B) GIVING LINE-TOTAL (C) ;
     WRITE-ITEM C ;
     READ-ITEM A ;
     IF END OF DATA GO TO OPERATION 8 ;
     JUMP TO OPERATION 2 .
(5)  READ-ITEM B ;
     IF END OF DATA GO TO OPERATION 6 ;
     JUMP TO OPERATION 2 .
(6)  JUMP TO OPERATION 8 .
(8)  CLOSE-OUT FILES C ;
     STOP .
"#;

fn sample_files(records: usize) -> (Vec<Record>, Vec<Record>) {
    let orders = (0..records)
        .map(|i| {
            Record::from([
                ("PRODUCT-NO", Value::from(format!("P{i:04}"))),
                ("QUANTITY", Value::from((i % 40 + 1) as i64)),
            ])
        })
        .collect();
    let catalog = (0..records)
        .map(|i| {
            Record::from([
                ("PRODUCT-NO", Value::from(format!("P{i:04}"))),
                (
                    "UNIT-PRICE",
                    Value::Decimal(BigDecimal::from_str("12.50").unwrap()),
                ),
            ])
        })
        .collect();
    (orders, catalog)
}

fn bench_compile(c: &mut Criterion) {
    c.bench_function("compile match program", |b| {
        b.iter(|| compile(black_box(MATCH_PROGRAM)).unwrap())
    });
}

fn bench_run(c: &mut Criterion) {
    let (orders, catalog) = sample_files(100);
    c.bench_function("match 100 records", |b| {
        b.iter(|| {
            let mut interpreter = Interpreter::new();
            interpreter.load_program(MATCH_PROGRAM).unwrap();
            interpreter.load_file("A", orders.clone());
            interpreter.load_file("B", catalog.clone());
            interpreter.run().unwrap();
            black_box(interpreter.get_output("C").unwrap().len())
        })
    });
}

criterion_group!(benches, bench_compile, bench_run);
criterion_main!(benches);
