use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::LendingError;
use crate::schedule::{plan_loan, PlanInput};
use crate::store::{with_transaction, LendingStore};
use crate::types::{
    round_money, with_methodology, CalcOutput, ClientId, InstallmentId, LoanId, Money,
    RatePercent, RateTableId,
};
use crate::LendingResult;

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Active,
    Finalized,
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LoanStatus::Active => "active",
            LoanStatus::Finalized => "finalized",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub client_id: ClientId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_table_id: Option<RateTableId>,
    pub principal: Money,
    pub installment_count: u32,
    pub installment_amount: Money,
    pub monthly_rate: RatePercent,
    pub start_date: NaiveDate,
    pub due_day: u8,
    pub end_date: NaiveDate,
    pub status: LoanStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallmentStatus {
    Pending,
    Paid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Installment {
    pub id: InstallmentId,
    pub loan_id: LoanId,
    pub sequence: u32,
    pub amount: Money,
    pub due_date: NaiveDate,
    pub status: InstallmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_amount: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Where the monthly rate comes from when creating or recalculating a loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSpec {
    Fixed(RatePercent),
    FromTable(RateTableId),
}

fn resolve_rate_spec<S>(store: &S, spec: &RateSpec, installments: u32) -> LendingResult<RatePercent>
where
    S: LendingStore + ?Sized,
{
    match spec {
        RateSpec::Fixed(rate) => {
            if *rate < Decimal::ZERO {
                return Err(LendingError::InvalidInput {
                    field: "monthly_rate".into(),
                    reason: "must not be negative".into(),
                });
            }
            Ok(*rate)
        }
        RateSpec::FromTable(table_id) => {
            let table = store.rate_table(*table_id)?;
            table.resolve_rate(installments)
        }
    }
}

// ---------------------------------------------------------------------------
// Loan creation (direct path, without a request)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLoan {
    pub client_id: ClientId,
    pub principal: Money,
    pub installments: u32,
    pub rate: RateSpec,
    pub start_date: NaiveDate,
    pub due_day: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Create a loan and its installment batch in one transaction.
pub fn create_loan<S>(store: &mut S, input: &NewLoan) -> LendingResult<LoanId>
where
    S: LendingStore + ?Sized,
{
    let rate = resolve_rate_spec(store, &input.rate, input.installments)?;
    let plan = plan_loan(&PlanInput {
        principal: input.principal,
        monthly_rate: rate,
        installments: input.installments,
        start_date: input.start_date,
        due_day: input.due_day,
    })?;

    let rate_table_id = match input.rate {
        RateSpec::FromTable(id) => Some(id),
        RateSpec::Fixed(_) => None,
    };

    with_transaction(store, |tx| {
        let loan_id = tx.insert_loan(Loan {
            id: 0,
            client_id: input.client_id,
            rate_table_id,
            principal: input.principal,
            installment_count: input.installments,
            installment_amount: plan.installment_amount,
            monthly_rate: rate,
            start_date: input.start_date,
            due_day: input.due_day,
            end_date: plan.end_date,
            status: LoanStatus::Active,
            notes: input.notes.clone(),
        })?;
        tx.insert_installments(loan_id, &plan.schedule)?;
        Ok(loan_id)
    })
}

// ---------------------------------------------------------------------------
// Recalculation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecalculationInput {
    pub principal: Money,
    pub installments: u32,
    pub rate: RateSpec,
    pub start_date: NaiveDate,
    pub due_day: u8,
    /// When false, only the loan row is updated and the existing
    /// installments are left alone.
    pub regenerate_pending: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Recompute amount and schedule for new terms. When regeneration is
/// requested, pending installments are deleted and the fresh batch inserted;
/// paid installments are immutable history and are never touched.
pub fn recalculate_loan<S>(
    store: &mut S,
    loan_id: LoanId,
    input: &RecalculationInput,
) -> LendingResult<()>
where
    S: LendingStore + ?Sized,
{
    let mut loan = store.loan(loan_id)?;

    let rate = resolve_rate_spec(store, &input.rate, input.installments)?;
    let plan = plan_loan(&PlanInput {
        principal: input.principal,
        monthly_rate: rate,
        installments: input.installments,
        start_date: input.start_date,
        due_day: input.due_day,
    })?;

    loan.rate_table_id = match input.rate {
        RateSpec::FromTable(id) => Some(id),
        RateSpec::Fixed(_) => None,
    };
    loan.principal = input.principal;
    loan.installment_count = input.installments;
    loan.installment_amount = plan.installment_amount;
    loan.monthly_rate = rate;
    loan.start_date = input.start_date;
    loan.due_day = input.due_day;
    loan.end_date = plan.end_date;
    loan.notes = input.notes.clone();

    with_transaction(store, |tx| {
        tx.update_loan(&loan)?;
        if input.regenerate_pending {
            tx.delete_pending_installments(loan_id)?;
            tx.insert_installments(loan_id, &plan.schedule)?;
        }
        Ok(())
    })
}

// ---------------------------------------------------------------------------
// Arrears and payment
// ---------------------------------------------------------------------------

/// Whole days elapsed past the due date; never negative.
pub fn days_late(due_date: NaiveDate, paid_date: NaiveDate) -> i64 {
    (paid_date - due_date).num_days().max(0)
}

/// Late-payment charge policy. Advisory: the ledger reports a suggested
/// amount but accepts whatever the caller actually collected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatePenaltyPolicy {
    pub fixed_percent: Decimal,
    pub daily_percent: Decimal,
}

impl Default for LatePenaltyPolicy {
    fn default() -> Self {
        Self {
            fixed_percent: dec!(2),
            daily_percent: dec!(0.33),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentQuoteInput {
    pub amount: Money,
    pub due_date: NaiveDate,
    pub paid_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<LatePenaltyPolicy>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentQuote {
    pub days_late: i64,
    pub suggested_amount: Money,
}

/// Suggested collection amount: original plus fixed penalty plus daily
/// arrears interest, only when the payment date is past due.
pub fn quote_payment(input: &PaymentQuoteInput) -> LendingResult<CalcOutput<PaymentQuote>> {
    if input.amount <= Decimal::ZERO {
        return Err(LendingError::InvalidInput {
            field: "amount".into(),
            reason: "must be positive".into(),
        });
    }

    let policy = input.policy.clone().unwrap_or_default();
    let days = days_late(input.due_date, input.paid_date);

    let suggested = if days > 0 {
        let fine = input.amount * policy.fixed_percent / dec!(100);
        let interest = input.amount * policy.daily_percent / dec!(100) * Decimal::from(days);
        round_money(input.amount + fine + interest)
    } else {
        round_money(input.amount)
    };

    Ok(with_methodology(
        "Fixed penalty plus simple daily arrears interest",
        Vec::new(),
        PaymentQuote {
            days_late: days,
            suggested_amount: suggested,
        },
    ))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInput {
    pub installment_id: InstallmentId,
    pub paid_date: NaiveDate,
    pub amount: Money,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub installment_id: InstallmentId,
    pub loan_id: LoanId,
    /// For reporting only; the paid amount is accepted as given.
    pub days_late: i64,
    pub loan_finalized: bool,
}

/// Mark an installment paid. Paying the last pending installment finalizes
/// the loan in the same transaction.
pub fn apply_payment<S>(store: &mut S, input: &PaymentInput) -> LendingResult<PaymentReceipt>
where
    S: LendingStore + ?Sized,
{
    if input.amount <= Decimal::ZERO {
        return Err(LendingError::InvalidInput {
            field: "amount".into(),
            reason: "must be positive".into(),
        });
    }
    if input.method.trim().is_empty() {
        return Err(LendingError::InvalidInput {
            field: "method".into(),
            reason: "payment method is required".into(),
        });
    }

    let mut installment = store.installment(input.installment_id)?;
    if installment.status == InstallmentStatus::Paid {
        return Err(LendingError::AlreadyPaid {
            installment_id: installment.id,
        });
    }

    let days = days_late(installment.due_date, input.paid_date);

    installment.status = InstallmentStatus::Paid;
    installment.paid_date = Some(input.paid_date);
    installment.paid_amount = Some(round_money(input.amount));
    installment.payment_method = Some(input.method.trim().to_string());
    installment.notes = input.notes.clone();

    with_transaction(store, |tx| {
        tx.update_installment(&installment)?;

        let pending_left = tx
            .installments_for_loan(installment.loan_id)?
            .iter()
            .filter(|i| i.status == InstallmentStatus::Pending)
            .count();

        let loan_finalized = pending_left == 0;
        if loan_finalized {
            let mut loan = tx.loan(installment.loan_id)?;
            loan.status = LoanStatus::Finalized;
            tx.update_loan(&loan)?;
        }

        Ok(PaymentReceipt {
            installment_id: installment.id,
            loan_id: installment.loan_id,
            days_late: days,
            loan_finalized,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_days_late_never_negative() {
        assert_eq!(days_late(date(2025, 5, 10), date(2025, 5, 20)), 10);
        assert_eq!(days_late(date(2025, 5, 10), date(2025, 5, 10)), 0);
        assert_eq!(days_late(date(2025, 5, 10), date(2025, 5, 1)), 0);
    }

    #[test]
    fn test_quote_on_time_is_original() {
        let out = quote_payment(&PaymentQuoteInput {
            amount: dec!(500),
            due_date: date(2025, 5, 10),
            paid_date: date(2025, 5, 10),
            policy: None,
        })
        .unwrap();
        assert_eq!(out.result.days_late, 0);
        assert_eq!(out.result.suggested_amount, dec!(500));
    }

    #[test]
    fn test_quote_ten_days_late_default_policy() {
        // original x (1 + 0.02 + 0.0033 * 10) = original x 1.053
        let out = quote_payment(&PaymentQuoteInput {
            amount: dec!(945.60),
            due_date: date(2025, 5, 10),
            paid_date: date(2025, 5, 20),
            policy: None,
        })
        .unwrap();
        assert_eq!(out.result.days_late, 10);
        assert_eq!(out.result.suggested_amount, dec!(995.72));
    }

    #[test]
    fn test_quote_custom_policy() {
        let out = quote_payment(&PaymentQuoteInput {
            amount: dec!(1000),
            due_date: date(2025, 5, 10),
            paid_date: date(2025, 5, 15),
            policy: Some(LatePenaltyPolicy {
                fixed_percent: dec!(1),
                daily_percent: dec!(0.1),
            }),
        })
        .unwrap();
        // 1000 + 10 + 5 = 1015
        assert_eq!(out.result.suggested_amount, dec!(1015));
    }

    #[test]
    fn test_quote_rejects_nonpositive_amount() {
        let err = quote_payment(&PaymentQuoteInput {
            amount: Decimal::ZERO,
            due_date: date(2025, 5, 10),
            paid_date: date(2025, 5, 10),
            policy: None,
        })
        .unwrap_err();
        assert!(matches!(err, LendingError::InvalidInput { .. }));
    }
}
