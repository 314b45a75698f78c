use chrono::NaiveDate;
use dcf_model_builder::*;
use serde_json::json;
use std::collections::HashMap;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn duration(year: i32, value: serde_json::Value) -> serde_json::Value {
    json!({
        "period": {
            "startDate": format!("{}-09-25", year - 1),
            "endDate": format!("{}-09-30", year)
        },
        "value": value,
        "unitRef": "usd",
        "decimals": "-6"
    })
}

/// XBRL-to-JSON document for fiscal `year`, also restating the prior year the
/// way real 10-Ks do.
fn xbrl_document(year: i32, revenue: i64, cost: i64) -> String {
    let prior = year - 1;
    json!({
        "CoverPage": {"DocumentType": "10-K"},
        "StatementsOfIncome": {
            "RevenueFromContractWithCustomerExcludingAssessedTax": [
                duration(year, json!(revenue.to_string())),
                duration(prior, json!((revenue - 10).to_string())),
                {
                    "period": {"startDate": format!("{}-09-25", prior), "endDate": format!("{}-09-30", year)},
                    "value": (revenue / 2).to_string(),
                    "segment": {"dimension": "srt:ProductOrServiceAxis", "value": "aapl:IPhoneMember"}
                }
            ],
            "CostOfGoodsAndServicesSold": [duration(year, json!(cost.to_string()))],
            "ResearchAndDevelopmentExpense": [duration(year, json!("10"))],
            "SellingGeneralAndAdministrativeExpense": [duration(year, json!("8"))],
            "InvestmentIncomeInterest": [duration(year, json!("3"))],
            "InterestExpense": [duration(year, json!("5"))],
            "OtherNonoperatingIncomeExpense": [duration(year, json!("-1"))],
            "IncomeTaxExpenseBenefit": [duration(year, json!("6"))],
            "NetIncomeLoss": [
                duration(year, json!("20")),
                duration(prior, json!("18"))
            ],
            "WeightedAverageNumberOfSharesOutstandingBasic": [duration(year, json!(1000))],
            "EarningsPerShareBasic": [duration(year, json!("0.02"))],
            "EarningsPerShareDiluted": [duration(year, json!(0.019))]
        },
        "BalanceSheets": {
            "CashAndCashEquivalentsAtCarryingValue": [
                {"period": {"instant": format!("{}-09-30", year)}, "value": "300"}
            ],
            "ShortTermInvestments": [
                {"period": {"instant": format!("{}-09-30", year)}, "value": "50"}
            ],
            "LongTermDebtNoncurrent": [
                {"period": {"instant": format!("{}-09-30", year)}, "value": "90"}
            ],
            "LongTermDebtCurrent": [
                {"period": {"instant": format!("{}-09-30", year)}, "value": "10"}
            ]
        }
    })
    .to_string()
}

fn filings(years: &[(i32, i64, i64)]) -> anyhow::Result<Vec<Filing>> {
    years
        .iter()
        .map(|(year, revenue, cost)| {
            Ok(Filing::from_xbrl_json(
                format!("0000320193-{}", year),
                format!("https://www.sec.gov/Archives/edgar/data/320193/{}.htm", year),
                "10-K",
                date(*year, 11, 3),
                &xbrl_document(*year, *revenue, *cost),
            )?)
        })
        .collect()
}

fn market() -> MarketSnapshot {
    MarketSnapshot {
        current_price: 187.5,
        beta: 1.29,
        interest_expense: 3_933_000_000.0,
    }
}

#[test]
fn test_xbrl_documents_to_grid() -> anyhow::Result<()> {
    let filings = filings(&[(2021, 100, 40), (2022, 110, 45), (2023, 125, 50)])?;
    let model = build_dcf_model(&ModelConfig::default(), &filings, &market())?;

    let years: Vec<i32> = model.records.iter().map(|r| r.year).collect();
    assert_eq!(years, vec![2021, 2022, 2023]);

    let latest = &model.records[2];
    assert_eq!(latest.revenue, 125);
    assert_eq!(latest.gross_profit, 75);
    // no OperatingExpenses tag: R&D + SG&A
    assert_eq!(latest.operating_expenses, 18);
    assert_eq!(latest.interest_net, -2);
    assert_eq!(latest.pretax_income(), 75 - 18 - 2 - 1);
    assert_eq!(latest.shares_basic, 1000);
    assert!((latest.eps_diluted - 0.019).abs() < 1e-12);

    assert_eq!(model.opening.cash, 350);
    assert_eq!(model.opening.debt, 100);
    assert_eq!(model.opening.shares_basic, 1000);

    assert_eq!(model.grid.get_a1("E16"), Some(&CellValue::Integer(57)));
    assert_eq!(
        model.grid.get_a1("F8").and_then(CellValue::as_formula),
        Some("=F6-F10")
    );
    assert_eq!(
        model.grid.get_a1("L22").and_then(CellValue::as_formula),
        Some("=L21/(1+Main!$I$9)^7")
    );
    assert_eq!(
        model.grid.get_a1("M23").and_then(CellValue::as_formula),
        Some("=SUM(F22:M22)")
    );

    Ok(())
}

#[test]
fn test_grid_csv_reads_back() -> anyhow::Result<()> {
    let filings = filings(&[(2022, 110, 45), (2023, 125, 50)])?;
    let model = build_dcf_model(&ModelConfig::default(), &filings, &market())?;
    let csv_text = model.grid.to_csv();

    let mut reader = csv::Reader::from_reader(csv_text.as_bytes());
    let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
    assert_eq!(headers.first().map(String::as_str), Some("Row"));
    assert_eq!(headers.get(1).map(String::as_str), Some("C"));
    assert_eq!(headers.last().map(String::as_str), Some("L"));

    let mut rows: HashMap<String, Vec<String>> = HashMap::new();
    for record in reader.records() {
        let record = record?;
        let cells: Vec<String> = record.iter().map(String::from).collect();
        rows.insert(cells[0].clone(), cells[1..].to_vec());
    }

    assert_eq!(rows["1"][0], "2022");
    assert_eq!(rows["6"][..3], ["110", "125", "=D6*(1+$B$31)"]);
    assert_eq!(rows["7"][0], "");
    assert_eq!(rows["7"][1], "=D6/C6-1");
    assert_eq!(rows["23"][9], "=SUM(E22:L22)");
    assert!(!rows.contains_key("2"));

    Ok(())
}

#[test]
fn test_grid_json_export() -> anyhow::Result<()> {
    let filings = filings(&[(2023, 125, 50)])?;
    let model = build_dcf_model(&ModelConfig::default(), &filings, &market())?;

    let value: serde_json::Value = serde_json::from_str(&model.grid.to_json()?)?;
    assert_eq!(value["C6"], json!(125));
    assert_eq!(value["C25"], json!(0.02));
    assert_eq!(value["D6"], json!("=C6*(1+$B$31)"));
    assert!(value.get("C7").is_none());

    Ok(())
}

#[test]
fn test_config_from_json_moves_the_grid() -> anyhow::Result<()> {
    let config = ModelConfig::from_json(
        r#"{
            "model_sheet": "DCF Model",
            "base_column": "D",
            "assumptions": {"revenue_growth": "Drivers!$B$2"}
        }"#,
    )?;
    assert_eq!(config.summary_sheet, "Main");
    assert_eq!(config.assumptions.gross_margin_growth, "$B$32");

    let filings = filings(&[(2022, 110, 45), (2023, 125, 50)])?;
    let model = build_dcf_model(&config, &filings, &market())?;

    assert_eq!(model.grid.get_a1("D6"), Some(&CellValue::Integer(110)));
    assert_eq!(
        model.grid.get_a1("F6").and_then(CellValue::as_formula),
        Some("=E6*(1+Drivers!$B$2)")
    );
    assert_eq!(model.summary.links.final_net_income, "='DCF Model'!L21");
    assert_eq!(model.summary.links.dcf_total, "='DCF Model'!M23");

    Ok(())
}

#[test]
fn test_long_history_uses_two_letter_columns() -> anyhow::Result<()> {
    let years: Vec<(i32, i64, i64)> = (1997..2024).map(|y| (y, 100, 40)).collect();
    let filings = filings(&years)?;

    let model = build_dcf_model(&ModelConfig::default(), &filings, &market())?;
    assert_eq!(model.plan.last_historical().label(), "AC");
    assert_eq!(model.plan.forecast()[0].label(), "AD");
    assert_eq!(model.plan.terminal().label(), "AK");
    assert_eq!(
        model.grid.get_a1("AD6").and_then(CellValue::as_formula),
        Some("=AC6*(1+$B$31)")
    );

    let narrow = ModelConfig {
        max_columns: 26,
        ..ModelConfig::default()
    };
    let err = build_dcf_model(&narrow, &filings, &market()).unwrap_err();
    assert!(matches!(
        err,
        DcfModelError::ColumnRangeExceeded {
            required: 37,
            max: 26
        }
    ));

    Ok(())
}

#[test]
fn test_summary_view_cells() -> anyhow::Result<()> {
    let config = ModelConfig::default();
    let filings = filings(&[(2022, 110, 45), (2023, 125, 50)])?;
    let model = build_dcf_model(&config, &filings, &market())?;

    let cells: HashMap<String, CellValue> =
        model.summary.cells(&config.summary_cells).into_iter().collect();
    assert_eq!(cells["C3"], CellValue::Decimal(187.5));
    assert_eq!(cells["C6"], CellValue::Integer(350));
    assert_eq!(cells["C7"], CellValue::Integer(100));
    assert_eq!(cells["L3"], CellValue::Formula("=Model!K21".to_string()));
    assert_eq!(cells["C15"], CellValue::Formula("=Model!L23".to_string()));

    Ok(())
}

#[test]
fn test_config_schema_describes_fields() -> anyhow::Result<()> {
    let schema = ModelConfig::schema_as_json()?;
    assert!(schema.contains("\"max_columns\""));
    assert!(schema.contains("\"assumptions\""));
    assert!(schema.contains("\"aliases\""));
    Ok(())
}
