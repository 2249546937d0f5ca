use std::collections::HashMap;

use cellgrid_formulas::{parse_formula, CellSource, Formula, FormulaValue};
use cellgrid_primitives::{ErrorValue, Position, Value};

#[derive(Default)]
struct Cells(HashMap<Position, Value>);

impl Cells {
    fn with(mut self, a1: &str, value: Value) -> Self {
        self.0.insert(Position::from_a1(a1), value);
        self
    }
}

impl CellSource for Cells {
    fn cell_value(&self, pos: Position) -> Option<Value> {
        self.0.get(&pos).cloned()
    }
}

#[test]
fn test_print_round_trips_through_parser() {
    let sources = [
        "1+2*3",
        "(1+2)*3",
        "1-(2-3)",
        "1-2-3",
        "8/(4/2)",
        "8/4/2",
        "8/(2*2)",
        "2*3/4",
        "-(A1+B2)",
        "-A1*+B2",
        "(A1-B1)/(C1+D1)",
        "--1",
    ];
    for source in sources {
        let ast = parse_formula(source).expect("parse");
        let printed = ast.print_formula();
        assert_eq!(printed, source, "canonical form of {source}");
        let reparsed = parse_formula(&printed).expect("reparse");
        assert_eq!(reparsed, ast);
    }
}

#[test]
fn test_print_removes_redundant_parentheses() {
    let cases = [
        ("((A1))", "A1"),
        ("(1+2)+3", "1+2+3"),
        ("1+(2+3)", "1+2+3"),
        ("(2*3)+1", "2*3+1"),
        ("(2*3)*4", "2*3*4"),
        ("2*(3*4)", "2*3*4"),
        ("(8/2)/2", "8/2/2"),
        ("-(2)", "-2"),
        ("-(A1*B1)", "-A1*B1"),
        ("1.50+2e1", "1.5+20"),
    ];
    for (source, expected) in cases {
        let formula = Formula::parse(source).expect("parse");
        assert_eq!(formula.expression(), expected, "printing {source}");
    }
}

#[test]
fn test_invalid_reference_prints_and_evaluates_as_ref() {
    let formula = Formula::parse("A1+ZZZZ9").expect("parse");
    assert_eq!(formula.expression(), "A1+#REF!");
    assert_eq!(
        formula.referenced_cells(),
        vec![Position::new(0, 0), Position::NONE]
    );
    let cells = Cells::default().with("A1", Value::Number(1.0));
    assert_eq!(
        formula.evaluate(&cells),
        FormulaValue::Error(ErrorValue::Ref)
    );
}

#[test]
fn test_evaluate_against_cells() {
    let cells = Cells::default()
        .with("A1", Value::Number(4.0))
        .with("B1", Value::Text("2.5".to_string()))
        .with("C1", Value::Text(String::new()));

    let formula = Formula::parse("A1*B1-C1+D1").expect("parse");
    assert_eq!(formula.evaluate(&cells), FormulaValue::Number(10.0));
    assert_eq!(Value::from(formula.evaluate(&cells)), Value::Number(10.0));
}

#[test]
fn test_error_propagates_unchanged() {
    let cells = Cells::default().with("A1", Value::Error(ErrorValue::Ref));
    let formula = Formula::parse("A1/0").expect("parse");
    assert_eq!(
        formula.evaluate(&cells),
        FormulaValue::Error(ErrorValue::Ref)
    );
}

#[test]
fn test_syntax_errors() {
    for source in ["", "1+", "(1", "1)", "SUM(A1)", "a1", "A1:B2", "1,2", "=A1"] {
        assert!(Formula::parse(source).is_err(), "{source:?} should fail");
    }
}
