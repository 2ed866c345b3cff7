use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use lending_core::recommendation::{recommend_credit, EmploymentCategory, RecommendationInput};

use crate::input;

/// Arguments for the credit recommendation heuristic
#[derive(Args)]
pub struct RecommendArgs {
    /// Path to a JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Monthly income
    #[arg(long)]
    pub income: Option<Decimal>,

    /// Employment category (salaried, public_servant, retired, pensioner,
    /// self_employed, business_owner, unemployed, other)
    #[arg(long)]
    pub category: Option<String>,
}

pub fn run_recommend(args: RecommendArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let rec_input: RecommendationInput = if let Some(ref path) = args.input {
        input::file::read_structured(path)?
    } else if let Some(data) = input::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let employment = match args.category {
            Some(ref raw) => Some(parse_category(raw)?),
            None => None,
        };
        RecommendationInput {
            monthly_income: args.income,
            employment,
        }
    };

    let output = recommend_credit(&rec_input)?;
    Ok(serde_json::to_value(output)?)
}

fn parse_category(raw: &str) -> Result<EmploymentCategory, Box<dyn std::error::Error>> {
    serde_json::from_value(Value::String(raw.to_string()))
        .map_err(|_| format!("Unknown employment category: '{raw}'").into())
}
