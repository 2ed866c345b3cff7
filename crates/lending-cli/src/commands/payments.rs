use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use lending_core::ledger::{quote_payment, LatePenaltyPolicy, PaymentQuoteInput};

use crate::input;

/// Arguments for the late-payment quote
#[derive(Args)]
pub struct SuggestPaymentArgs {
    /// Path to a JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Original installment amount
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// Installment due date (YYYY-MM-DD)
    #[arg(long)]
    pub due_date: Option<NaiveDate>,

    /// Date the payment is being made (YYYY-MM-DD)
    #[arg(long)]
    pub paid_date: Option<NaiveDate>,

    /// One-off penalty in percent (default 2)
    #[arg(long)]
    pub fixed_percent: Option<Decimal>,

    /// Arrears interest in percent per day (default 0.33)
    #[arg(long)]
    pub daily_percent: Option<Decimal>,
}

pub fn run_suggest_payment(args: SuggestPaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let quote_input: PaymentQuoteInput = if let Some(ref path) = args.input {
        input::file::read_structured(path)?
    } else if let Some(data) = input::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let policy = match (args.fixed_percent, args.daily_percent) {
            (None, None) => None,
            (fixed, daily) => {
                let default = LatePenaltyPolicy::default();
                Some(LatePenaltyPolicy {
                    fixed_percent: fixed.unwrap_or(default.fixed_percent),
                    daily_percent: daily.unwrap_or(default.daily_percent),
                })
            }
        };
        PaymentQuoteInput {
            amount: args.amount.ok_or("--amount is required (or provide --input)")?,
            due_date: args
                .due_date
                .ok_or("--due-date is required (or provide --input)")?,
            paid_date: args
                .paid_date
                .ok_or("--paid-date is required (or provide --input)")?,
            policy,
        }
    };

    let output = quote_payment(&quote_input)?;
    Ok(serde_json::to_value(output)?)
}
