//! Simple Formula Demo
//!
//! Run with: cargo run --example formula_demo -p cellgrid-sheet

use cellgrid_sheet::{Position, Sheet, SheetError};

fn cell(name: &str) -> Position {
    Position::from_a1(name)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Formula Demo ===\n");

    let mut sheet = Sheet::new();

    sheet.set_cell(cell("A1"), "10")?;
    sheet.set_cell(cell("B1"), "20")?;
    sheet.set_cell(cell("A2"), "5")?;
    sheet.set_cell(cell("B2"), "15")?;

    sheet.set_cell(cell("C1"), "=A1+B1")?;
    sheet.set_cell(cell("C2"), "=A2*B2")?;
    sheet.set_cell(cell("C3"), "=(C1+C2)/2")?;
    sheet.set_cell(cell("A3"), "'=not a formula")?;

    println!("Texts:");
    sheet.print_texts(&mut std::io::stdout())?;
    println!("\nValues:");
    sheet.print_values(&mut std::io::stdout())?;

    // Editing an input recomputes everything downstream on the next read.
    sheet.set_cell(cell("A2"), "7")?;
    println!("\nAfter A2 = 7, C3 = {}", sheet.value_at(cell("C3"))?);

    // Errors are values.
    sheet.set_cell(cell("D1"), "=C1/(B1-20)")?;
    sheet.set_cell(cell("D2"), "=A3+1")?;
    println!("D1 = {}", sheet.value_at(cell("D1"))?);
    println!("D2 = {}", sheet.value_at(cell("D2"))?);

    // Cycles are rejected and leave the sheet untouched.
    match sheet.set_cell(cell("A1"), "=C3") {
        Err(SheetError::CircularDependency { cycle }) => {
            let path: Vec<String> = cycle.iter().map(Position::to_a1).collect();
            println!("\nRejected cycle: {}", path.join(" -> "));
        }
        other => println!("\nUnexpected: {other:?}"),
    }

    println!(
        "\nPrintable size: {}, C3 depends on {:?}",
        sheet.printable_size(),
        sheet
            .precedents_of(cell("C3"))?
            .iter()
            .map(Position::to_a1)
            .collect::<Vec<_>>()
    );

    Ok(())
}
