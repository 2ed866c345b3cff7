use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use lending_core::rates::{validate_tiers, RateTable, RateTableSpec};
use lending_core::schedule::{simulate_loan, SimulationInput};

use crate::input;

/// Arguments for loan simulation
#[derive(Args)]
pub struct SimulateArgs {
    /// Path to a JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Requested principal
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Number of installments
    #[arg(long, alias = "n")]
    pub installments: Option<u32>,

    /// Fixed monthly rate in percent (e.g. 2.5); ignored when --table is given
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Path to a rate table file; the rate is resolved from its tiers
    #[arg(long)]
    pub table: Option<String>,

    /// Schedule anchor date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Day of month the installments fall due
    #[arg(long, default_value_t = 5)]
    pub due_day: u8,
}

pub fn run_simulate(args: SimulateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let sim_input: SimulationInput = if let Some(ref path) = args.input {
        input::file::read_structured(path)?
    } else if let Some(data) = input::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let rate_table = match args.table {
            Some(ref path) => Some(load_table(path)?),
            None => None,
        };
        SimulationInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            installments: args
                .installments
                .ok_or("--installments is required (or provide --input)")?,
            start_date: args
                .start_date
                .unwrap_or_else(|| chrono::Local::now().date_naive()),
            due_day: args.due_day,
            monthly_rate: args.rate,
            rate_table,
        }
    };

    let output = simulate_loan(&sim_input)?;
    Ok(serde_json::to_value(output)?)
}

/// Read a rate table spec from disk and validate its tiers before use.
pub fn load_table(path: &str) -> Result<RateTable, Box<dyn std::error::Error>> {
    let spec: RateTableSpec = input::file::read_structured(path)?;
    let tiers = validate_tiers(&spec.tiers)?;
    Ok(RateTable {
        id: 0,
        name: spec.name,
        reference_year: spec.reference_year,
        description: spec.description,
        active: spec.active,
        tiers,
    })
}
