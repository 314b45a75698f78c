use chrono::NaiveDate;
use dcf_model_builder::*;
use std::error::Error;
use std::fs;
use std::result::Result;

const INCOME: &str = "StatementsOfIncome";
const BALANCE: &str = "BalanceSheets";

/// Annual figures in millions, loosely shaped like a large hardware vendor.
const HISTORY: [(i32, i64, i64, i64, i64, i64, i64); 4] = [
    // year, revenue, cost, R&D, SG&A, tax, net income
    (2020, 274_515, 169_559, 18_752, 19_916, 9_680, 57_411),
    (2021, 365_817, 212_981, 21_914, 21_973, 14_527, 94_680),
    (2022, 394_328, 223_546, 26_251, 25_094, 19_300, 99_803),
    (2023, 383_285, 214_137, 29_915, 24_932, 16_741, 96_995),
];

fn date(y: i32, m: u32, d: u32) -> Result<NaiveDate, Box<dyn Error>> {
    NaiveDate::from_ymd_opt(y, m, d).ok_or_else(|| format!("invalid date {}-{}-{}", y, m, d).into())
}

fn annual_filing(row: (i32, i64, i64, i64, i64, i64, i64)) -> Result<Filing, Box<dyn Error>> {
    let (year, revenue, cost, research, admin, tax, net_income) = row;
    let start = date(year - 1, 9, 27)?;
    let end = date(year, 9, 30)?;
    let fy = |value: i64| vec![Fact::duration(start, end, value.to_string())];

    Ok(Filing::new(
        format!("0000320193-{}-000106", year % 100),
        format!("https://www.sec.gov/Archives/edgar/data/320193/{}-10k.htm", year),
        "10-K",
        date(year, 11, 3)?,
    )
    .with_fact_series(INCOME, "RevenueFromContractWithCustomerExcludingAssessedTax", fy(revenue))
    .with_fact_series(INCOME, "CostOfGoodsAndServicesSold", fy(cost))
    .with_fact_series(INCOME, "ResearchAndDevelopmentExpense", fy(research))
    .with_fact_series(INCOME, "SellingGeneralAndAdministrativeExpense", fy(admin))
    .with_fact_series(INCOME, "NonoperatingIncomeExpense", fy(-565))
    .with_fact_series(INCOME, "IncomeTaxExpenseBenefit", fy(tax))
    .with_fact_series(INCOME, "NetIncomeLoss", fy(net_income))
    .with_fact_series(
        INCOME,
        "WeightedAverageNumberOfSharesOutstandingBasic",
        fy(15_744),
    )
    .with_fact_series(
        BALANCE,
        "CashAndCashEquivalentsAtCarryingValue",
        vec![Fact::instant(end, "29965")],
    )
    .with_fact_series(BALANCE, "LongTermDebtNoncurrent", vec![Fact::instant(end, "95281")]))
}

fn main() -> Result<(), Box<dyn Error>> {
    println!("📈 DCF Model Builder Demo\n");

    let config = match std::env::args().nth(1) {
        Some(path) => {
            println!("Loading configuration from {}", path);
            ModelConfig::from_json(&fs::read_to_string(path)?)?
        }
        None => ModelConfig::default(),
    };

    let filings = HISTORY
        .iter()
        .copied()
        .map(annual_filing)
        .collect::<Result<Vec<_>, _>>()?;

    let market = MarketSnapshot {
        current_price: 187.44,
        beta: 1.29,
        interest_expense: 3_933.0,
    };

    let model = build_dcf_model(&config, &filings, &market)?;

    println!("📋 Historical years:");
    for record in &model.records {
        println!(
            "  {} | revenue {:>9} | gross profit {:>9} | operating income {:>9} | net income {:>9}",
            record.year,
            record.revenue,
            record.gross_profit,
            record.operating_income(),
            record.net_income
        );
    }

    println!("\n🧮 Column plan:");
    println!(
        "  historical {}..{}, forecast {}..{}, terminal {}",
        model.plan.first_historical(),
        model.plan.last_historical(),
        model.plan.forecast()[0],
        model.plan.last_forecast(),
        model.plan.terminal()
    );
    println!(
        "  {} columns to insert at {}",
        model.plan.inserted_columns(),
        config.base_column
    );

    println!("\n🔗 Summary sheet ({}):", model.summary.sheet);
    for (address, value) in model.summary.cells(&config.summary_cells) {
        println!("  {:>4}: {}", address, value);
    }

    fs::write("dcf_model.csv", model.grid.to_csv())?;
    fs::write("dcf_model.json", model.grid.to_json()?)?;
    println!("\n✅ Wrote {} cells to dcf_model.csv and dcf_model.json", model.grid.len());

    Ok(())
}
