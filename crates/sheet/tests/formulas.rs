use cellgrid_sheet::{ErrorValue, Position, Result, Sheet, Value};

fn pos(name: &str) -> Position {
    Position::from_a1(name)
}

fn sheet_with(cells: &[(&str, &str)]) -> Result<Sheet> {
    let mut sheet = Sheet::new();
    for (name, text) in cells {
        sheet.set_cell(pos(name), text)?;
    }
    Ok(sheet)
}

#[test]
fn test_absent_reference_is_zero() -> Result<()> {
    let sheet = sheet_with(&[("A1", "=B1+1")])?;
    assert_eq!(sheet.value_at(pos("A1"))?, Value::Number(1.0));
    Ok(())
}

#[test]
fn test_text_reference_is_value_error() -> Result<()> {
    let mut sheet = sheet_with(&[("A1", "=B1+1"), ("B1", "abc")])?;
    assert_eq!(sheet.value_at(pos("A1"))?, Value::Error(ErrorValue::Value));

    sheet.set_cell(pos("B1"), "41")?;
    assert_eq!(sheet.value_at(pos("A1"))?, Value::Number(42.0));

    sheet.set_cell(pos("B1"), " 41")?;
    assert_eq!(sheet.value_at(pos("A1"))?, Value::Error(ErrorValue::Value));
    Ok(())
}

#[test]
fn test_escaped_number_is_used_as_number() -> Result<()> {
    let sheet = sheet_with(&[("B1", "'12"), ("A1", "=B1*2")])?;
    assert_eq!(sheet.value_at(pos("B1"))?, Value::Text("12".to_string()));
    assert_eq!(sheet.value_at(pos("A1"))?, Value::Number(24.0));
    Ok(())
}

#[test]
fn test_empty_text_reference_is_zero() -> Result<()> {
    let sheet = sheet_with(&[("B1", ""), ("A1", "=B1+2")])?;
    assert_eq!(sheet.value_at(pos("A1"))?, Value::Number(2.0));
    assert_eq!(sheet.printable_size().cols, 2);
    Ok(())
}

#[test]
fn test_division_by_zero_is_arithmetic_error() -> Result<()> {
    let sheet = sheet_with(&[("A1", "=1/0"), ("A2", "=-1/B2"), ("A3", "=0/0")])?;
    for name in ["A1", "A2", "A3"] {
        let value = sheet.value_at(pos(name))?;
        assert_eq!(value, Value::Error(ErrorValue::Arithmetic), "{name}");
        assert_eq!(value.to_string(), "#ARITHM!");
    }
    Ok(())
}

#[test]
fn test_out_of_range_reference_is_ref_error() -> Result<()> {
    let sheet = sheet_with(&[("A1", "=A99999+1")])?;
    let cell = sheet.get_cell(pos("A1"))?.expect("A1");
    assert_eq!(cell.value(), Value::Error(ErrorValue::Ref));
    assert_eq!(cell.text(), "=#REF!+1");
    assert_eq!(cell.referenced_cells(), vec![Position::NONE]);
    assert!(sheet.precedents_of(pos("A1"))?.is_empty());
    Ok(())
}

#[test]
fn test_formula_text_is_canonical() -> Result<()> {
    let sheet = sheet_with(&[
        ("A1", "=(1+2)*3"),
        ("A2", "= ((B1)) + ( C1 * 2 )"),
        ("A3", "=1-(2-3)"),
        ("A4", "=1e3"),
    ])?;
    assert_eq!(sheet.text_at(pos("A1"))?, "=(1+2)*3");
    assert_eq!(sheet.text_at(pos("A2"))?, "=B1+C1*2");
    assert_eq!(sheet.text_at(pos("A3"))?, "=1-(2-3)");
    assert_eq!(sheet.text_at(pos("A4"))?, "=1000");
    Ok(())
}

#[test]
fn test_lone_formula_sign_is_text() -> Result<()> {
    let sheet = sheet_with(&[("A1", "="), ("B1", "=A1")])?;
    let a1 = sheet.get_cell(pos("A1"))?.expect("A1");
    assert!(!a1.is_formula());
    assert_eq!(a1.value(), Value::Text("=".to_string()));
    assert_eq!(a1.text(), "=");
    assert_eq!(sheet.value_at(pos("B1"))?, Value::Error(ErrorValue::Value));
    Ok(())
}

#[test]
fn test_referenced_cells_keep_duplicates_and_order() -> Result<()> {
    let sheet = sheet_with(&[("A1", "=C3+B2+C3")])?;
    let cell = sheet.get_cell(pos("A1"))?.expect("A1");
    assert_eq!(
        cell.referenced_cells(),
        vec![pos("C3"), pos("B2"), pos("C3")]
    );
    assert_eq!(sheet.precedents_of(pos("A1"))?, vec![pos("B2"), pos("C3")]);
    Ok(())
}

#[test]
fn test_chain_of_formulas() -> Result<()> {
    let mut sheet = Sheet::new();
    sheet.set_cell(pos("A1"), "1")?;
    for row in 2..=50 {
        sheet.set_cell(Position::new(row - 1, 0), &format!("=A{}*2", row - 1))?;
    }
    assert_eq!(
        sheet.value_at(pos("A50"))?,
        Value::Number(2f64.powi(49))
    );

    sheet.set_cell(pos("A1"), "0.5")?;
    assert_eq!(
        sheet.value_at(pos("A50"))?,
        Value::Number(2f64.powi(48))
    );
    Ok(())
}

#[test]
fn test_overflowing_literal_is_syntax_error() -> Result<()> {
    let mut sheet = sheet_with(&[("A1", "=1e308*10")])?;
    assert_eq!(
        sheet.value_at(pos("A1"))?,
        Value::Error(ErrorValue::Arithmetic)
    );

    let err = sheet.set_cell(pos("A2"), "=1e400").unwrap_err();
    assert!(matches!(err, cellgrid_sheet::SheetError::FormulaSyntax(_)));
    assert!(sheet.get_cell(pos("A2"))?.is_none());
    Ok(())
}
