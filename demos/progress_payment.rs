use chrono::NaiveDate;
use progress_payment_engine::*;

fn main() {
    println!("🏗️  Progress Payment Demo\n");

    let mut concrete = WorkSheet::new(
        "Block A Foundation",
        "15.120.100",
        "C25/30 ready-mixed concrete",
        "m3",
        2450.0,
    );
    concrete.push_row(
        MeasurementRow::new("Footings")
            .with_dimensions(Some(12.0), Some(10.0), Some(1.0))
            .with_count(Some(1.0)),
    );
    concrete.push_row(
        MeasurementRow::new("Columns")
            .with_dimensions(Some(0.6), Some(0.6), Some(3.1))
            .with_count(Some(14.0)),
    );

    let mut walls = WorkSheet::new(
        "Ground Floor Walls",
        "Y.26.005/012",
        "13.5 brick wall",
        "m2",
        450.0,
    );
    // Zero dimensions are "not applicable", so this row is simply 500 m2
    walls.push_row(
        MeasurementRow::new("All rooms")
            .with_dimensions(Some(0.0), Some(0.0), Some(0.0))
            .with_count(Some(500.0)),
    );

    let mut previous_quantities = PreviousQuantityMap::new();
    previous_quantities.insert("15.120.100".to_string(), 80.0);
    previous_quantities.insert("Y.26.005/012".to_string(), 200.0);

    let book = PaymentBook {
        project: ProjectInfo {
            project_name: "Sample Housing Project".to_string(),
            contractor: "Demir Construction Ltd.".to_string(),
            employer: "Metropolitan Municipality".to_string(),
            period: "Progress Payment No. 2".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
            signatories: ProjectInfo::default_signatories(),
        },
        sheets: vec![concrete, walls],
        previous_quantities,
        financial: FinancialConfig {
            tax_rate: 20.0,
            extra_payments: vec![LedgerLine::new("Price escalation", 0.0, 12_500.0)],
            deductions: vec![
                LedgerLine::new("Stamp duty", 1_150.0, 980.0),
                LedgerLine::new("Performance retention", 5_000.0, 4_200.0),
            ],
        },
    };

    let statement = match process_with_verification(&book, 1e-6) {
        Ok(statement) => statement,
        Err(e) => {
            eprintln!("❌ Could not produce statement: {}", e);
            return;
        }
    };

    println!("📋 Reconciliation:");
    for item in &statement.items {
        println!(
            "  {:<14} {:<30} prev {:>10.3} | current {:>10.3} | total {:>10.3} {}",
            item.code,
            item.description,
            item.previous_quantity,
            item.current_quantity,
            item.cumulative_quantity,
            item.unit
        );
    }

    for warning in &statement.warnings {
        println!("  ⚠️  {}", warning);
    }

    println!("\n💰 Cover page:");
    println!(
        "  {:<22} {:>14} {:>14} {:>14}",
        "", "General", "Previous", "Current"
    );
    for (name, value) in statement.rollup.fields() {
        println!(
            "  {:<22} {:>14.2} {:>14.2} {:>14.2}",
            name,
            round_to(value.general(), 2),
            round_to(value.previous(), 2),
            round_to(value.current(), 2)
        );
    }

    if let Err(e) = require_non_negative_net_payable(&statement.rollup) {
        println!("\n⚠️  {}", e);
    }
}
