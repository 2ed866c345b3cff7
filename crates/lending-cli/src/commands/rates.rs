use clap::Args;
use serde_json::{json, Value};

use lending_core::rates::{validate_tiers, RateTableSpec};

use crate::commands::simulate::load_table;
use crate::input;

/// Arguments for rate resolution
#[derive(Args)]
pub struct ResolveRateArgs {
    /// Path to a rate table file (JSON/YAML)
    #[arg(long)]
    pub table: String,

    /// Tenor to resolve
    #[arg(long)]
    pub installments: u32,
}

/// Arguments for rate table validation
#[derive(Args)]
pub struct ValidateTableArgs {
    /// Path to a rate table file; piped stdin is used when omitted
    #[arg(long)]
    pub table: Option<String>,
}

pub fn run_resolve_rate(args: ResolveRateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let table = load_table(&args.table)?;
    let rate = table.resolve_rate(args.installments)?;

    Ok(json!({
        "result": {
            "installments": args.installments,
            "monthly_rate": rate.to_string(),
            "max_tenor": table.max_tenor(),
            "table": table.name,
        }
    }))
}

pub fn run_validate_table(args: ValidateTableArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let spec: RateTableSpec = if let Some(ref path) = args.table {
        input::file::read_structured(path)?
    } else if let Some(data) = input::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--table is required (or pipe the spec on stdin)".into());
    };

    let tiers = validate_tiers(&spec.tiers)?;
    let max_tenor = tiers.iter().map(|t| t.to_installments).max().unwrap_or(0);

    Ok(json!({
        "result": {
            "valid": true,
            "name": spec.name,
            "tiers": tiers.len(),
            "max_tenor": max_tenor,
        }
    }))
}
