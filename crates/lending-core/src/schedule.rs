use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::LendingError;
use crate::rates::RateTable;
use crate::types::{round_money, with_methodology, CalcOutput, Money, RatePercent};
use crate::LendingResult;

// ---------------------------------------------------------------------------
// Price installment
// ---------------------------------------------------------------------------

/// Fixed nominal installment under the Price (French amortization) method.
///
/// Zero count yields zero — callers validate before this reaches production
/// use. A zero rate degenerates to straight division. Rounding happens once,
/// at the end, half away from zero.
pub fn price_installment(principal: Money, monthly_rate: RatePercent, count: u32) -> Money {
    if count == 0 {
        return Decimal::ZERO;
    }

    let periods = Decimal::from(count);
    if monthly_rate.is_zero() {
        return round_money(principal / periods);
    }

    // amount = (i * P) / (1 - (1+i)^-n), computed with the positive power
    // so rust_decimal never sees a negative exponent.
    let i = monthly_rate / dec!(100);
    let factor = (Decimal::ONE + i).powd(periods);
    round_money(principal * i * factor / (factor - Decimal::ONE))
}

// ---------------------------------------------------------------------------
// Schedule generation
// ---------------------------------------------------------------------------

/// One generated schedule row, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallmentDraft {
    pub sequence: u32,
    pub due_date: NaiveDate,
    pub amount: Money,
}

/// Due date `months_ahead` calendar months after `start`, on `due_day`.
/// When the target month is shorter than `due_day` the date clamps to the
/// last day of that month, so the schedule keeps one row per month.
fn due_date_for(start: NaiveDate, months_ahead: u32, due_day: u8) -> LendingResult<NaiveDate> {
    let total_months = start.year() * 12 + start.month0() as i32 + months_ahead as i32;
    let year = total_months.div_euclid(12);
    let month = total_months.rem_euclid(12) as u32 + 1;

    // Month length from the calendar itself: day before the first of the
    // following month.
    let last_of_month = NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next_first| next_first.pred_opt())
        .ok_or_else(|| LendingError::InvalidInput {
            field: "due_day".into(),
            reason: format!("cannot build a due date in {year}-{month:02}"),
        })?;

    let day = (due_day as u32).min(last_of_month.day());
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| LendingError::InvalidInput {
        field: "due_day".into(),
        reason: format!("cannot build due date {year}-{month:02}-{day:02}"),
    })
}

/// Generate `count` monthly rows from `start_date`, each carrying `amount`
/// rounded to 2 decimals. Returns the rows and the end date (the last due
/// date, or `start_date` when count is 0).
pub fn generate_schedule(
    amount: Money,
    count: u32,
    start_date: NaiveDate,
    due_day: u8,
) -> LendingResult<(Vec<InstallmentDraft>, NaiveDate)> {
    if !(1..=31).contains(&due_day) {
        return Err(LendingError::InvalidInput {
            field: "due_day".into(),
            reason: "must be between 1 and 31".into(),
        });
    }

    let rounded = round_money(amount);
    let mut rows = Vec::with_capacity(count as usize);
    for k in 1..=count {
        rows.push(InstallmentDraft {
            sequence: k,
            due_date: due_date_for(start_date, k, due_day)?,
            amount: rounded,
        });
    }

    let end_date = rows.last().map(|r| r.due_date).unwrap_or(start_date);
    Ok((rows, end_date))
}

// ---------------------------------------------------------------------------
// Loan planning
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanInput {
    pub principal: Money,
    pub monthly_rate: RatePercent,
    pub installments: u32,
    pub start_date: NaiveDate,
    pub due_day: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanPlan {
    pub installment_amount: Money,
    pub monthly_rate: RatePercent,
    pub schedule: Vec<InstallmentDraft>,
    pub end_date: NaiveDate,
    pub total_payable: Money,
}

/// Installment amount plus full schedule for a validated set of terms.
///
/// Interest-bearing plans keep every row at the nominal Price installment;
/// zero-rate plans let the last row absorb the division remainder so the
/// schedule sums exactly to principal.
pub fn plan_loan(input: &PlanInput) -> LendingResult<LoanPlan> {
    if input.principal <= Decimal::ZERO {
        return Err(LendingError::InvalidInput {
            field: "principal".into(),
            reason: "must be positive".into(),
        });
    }
    if input.installments == 0 {
        return Err(LendingError::InvalidInput {
            field: "installments".into(),
            reason: "must be at least 1".into(),
        });
    }
    if input.monthly_rate < Decimal::ZERO {
        return Err(LendingError::InvalidInput {
            field: "monthly_rate".into(),
            reason: "must not be negative".into(),
        });
    }

    let amount = price_installment(input.principal, input.monthly_rate, input.installments);
    let (mut schedule, end_date) =
        generate_schedule(amount, input.installments, input.start_date, input.due_day)?;

    if input.monthly_rate.is_zero() {
        if let Some(last) = schedule.last_mut() {
            let paid_before_last = amount * Decimal::from(input.installments - 1);
            last.amount = round_money(input.principal - paid_before_last);
        }
    }

    let total_payable = schedule.iter().map(|r| r.amount).sum();

    Ok(LoanPlan {
        installment_amount: amount,
        monthly_rate: input.monthly_rate,
        schedule,
        end_date,
        total_payable,
    })
}

// ---------------------------------------------------------------------------
// Simulation (pure calculator surface)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationInput {
    pub principal: Money,
    pub installments: u32,
    pub start_date: NaiveDate,
    pub due_day: u8,
    /// Explicit monthly rate; ignored when a rate table is supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_rate: Option<RatePercent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_table: Option<RateTable>,
}

/// Resolve the effective rate, compute the installment and build the
/// schedule, without touching any store.
pub fn simulate_loan(input: &SimulationInput) -> LendingResult<CalcOutput<LoanPlan>> {
    let mut warnings = Vec::new();

    let rate = match &input.rate_table {
        Some(table) => table.resolve_rate(input.installments)?,
        None => input.monthly_rate.ok_or_else(|| LendingError::InvalidInput {
            field: "monthly_rate".into(),
            reason: "a fixed rate or a rate table is required".into(),
        })?,
    };

    if input.due_day > 28 {
        warnings.push("due day clamps to the last day of shorter months".to_string());
    }

    let plan = plan_loan(&PlanInput {
        principal: input.principal,
        monthly_rate: rate,
        installments: input.installments,
        start_date: input.start_date,
        due_day: input.due_day,
    })?;

    Ok(with_methodology(
        "Price method (French amortization), fixed nominal installment",
        warnings,
        plan,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_price_installment_reference_case() {
        // 10_000 at 2%/month over 12 months.
        assert_eq!(price_installment(dec!(10000), dec!(2), 12), dec!(945.60));
    }

    #[test]
    fn test_price_installment_zero_rate() {
        assert_eq!(price_installment(dec!(1200), dec!(0), 12), dec!(100));
    }

    #[test]
    fn test_price_installment_zero_count() {
        assert_eq!(price_installment(dec!(1000), dec!(2), 0), Decimal::ZERO);
    }

    #[test]
    fn test_schedule_advances_month_and_wraps_year() {
        let (rows, end) = generate_schedule(dec!(500), 3, date(2025, 11, 10), 5).unwrap();
        assert_eq!(rows[0].due_date, date(2025, 12, 5));
        assert_eq!(rows[1].due_date, date(2026, 1, 5));
        assert_eq!(rows[2].due_date, date(2026, 2, 5));
        assert_eq!(end, date(2026, 2, 5));
    }

    #[test]
    fn test_schedule_clamps_short_months() {
        let (rows, _) = generate_schedule(dec!(100), 3, date(2025, 1, 15), 31).unwrap();
        assert_eq!(rows[0].due_date, date(2025, 2, 28));
        assert_eq!(rows[1].due_date, date(2025, 3, 31));
        assert_eq!(rows[2].due_date, date(2025, 4, 30));
    }

    #[test]
    fn test_schedule_clamps_leap_february() {
        let (rows, _) = generate_schedule(dec!(100), 1, date(2024, 1, 31), 31).unwrap();
        assert_eq!(rows[0].due_date, date(2024, 2, 29));

        // Century years are only leap when divisible by 400.
        let (rows, _) = generate_schedule(dec!(100), 1, date(2100, 1, 31), 31).unwrap();
        assert_eq!(rows[0].due_date, date(2100, 2, 28));
    }

    #[test]
    fn test_schedule_zero_count_end_date_is_start() {
        let (rows, end) = generate_schedule(dec!(100), 0, date(2025, 6, 1), 10).unwrap();
        assert!(rows.is_empty());
        assert_eq!(end, date(2025, 6, 1));
    }

    #[test]
    fn test_schedule_rejects_bad_due_day() {
        assert!(generate_schedule(dec!(100), 1, date(2025, 6, 1), 0).is_err());
        assert!(generate_schedule(dec!(100), 1, date(2025, 6, 1), 32).is_err());
    }

    #[test]
    fn test_plan_zero_rate_last_row_absorbs_remainder() {
        let plan = plan_loan(&PlanInput {
            principal: dec!(100),
            monthly_rate: Decimal::ZERO,
            installments: 3,
            start_date: date(2025, 1, 10),
            due_day: 5,
        })
        .unwrap();
        assert_eq!(plan.schedule[0].amount, dec!(33.33));
        assert_eq!(plan.schedule[1].amount, dec!(33.33));
        assert_eq!(plan.schedule[2].amount, dec!(33.34));
        assert_eq!(plan.total_payable, dec!(100));
    }

    #[test]
    fn test_plan_interest_bearing_is_not_reconciled() {
        let plan = plan_loan(&PlanInput {
            principal: dec!(10000),
            monthly_rate: dec!(2),
            installments: 12,
            start_date: date(2025, 3, 1),
            due_day: 5,
        })
        .unwrap();
        assert_eq!(plan.installment_amount, dec!(945.60));
        assert!(plan.schedule.iter().all(|r| r.amount == dec!(945.60)));
        assert_eq!(plan.total_payable, dec!(11347.20));
    }

    #[test]
    fn test_plan_rejects_nonpositive_principal() {
        let err = plan_loan(&PlanInput {
            principal: Decimal::ZERO,
            monthly_rate: dec!(2),
            installments: 12,
            start_date: date(2025, 3, 1),
            due_day: 5,
        })
        .unwrap_err();
        match err {
            LendingError::InvalidInput { field, .. } => assert_eq!(field, "principal"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_simulate_requires_some_rate_source() {
        let err = simulate_loan(&SimulationInput {
            principal: dec!(1000),
            installments: 10,
            start_date: date(2025, 2, 1),
            due_day: 5,
            monthly_rate: None,
            rate_table: None,
        })
        .unwrap_err();
        match err {
            LendingError::InvalidInput { field, .. } => assert_eq!(field, "monthly_rate"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_simulate_warns_on_clamping_due_day() {
        let out = simulate_loan(&SimulationInput {
            principal: dec!(1000),
            installments: 2,
            start_date: date(2025, 1, 15),
            due_day: 31,
            monthly_rate: Some(dec!(1.5)),
            rate_table: None,
        })
        .unwrap();
        assert_eq!(out.warnings.len(), 1);
    }
}
