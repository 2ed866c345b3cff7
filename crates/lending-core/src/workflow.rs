use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::authz::{require_role, CallerContext, Role};
use crate::directory::ClientDirectory;
use crate::error::LendingError;
use crate::ledger::{Loan, LoanStatus};
use crate::schedule::{plan_loan, PlanInput};
use crate::store::{with_transaction, LendingStore};
use crate::types::{ClientId, LoanId, Money, RatePercent, RateTableId, RequestId, UserId};
use crate::LendingResult;

// ---------------------------------------------------------------------------
// Request entity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Draft,
    Submitted,
    InAnalysis,
    Approved,
    Rejected,
    Disbursed,
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RequestStatus::Draft => "draft",
            RequestStatus::Submitted => "submitted",
            RequestStatus::InAnalysis => "in_analysis",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Disbursed => "disbursed",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanRequest {
    pub id: RequestId,
    pub client_id: ClientId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_table_id: Option<RateTableId>,
    pub requested_principal: Money,
    pub requested_installments: u32,
    /// Explicit rate captured at request time; only used when no rate table
    /// is attached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quoted_rate: Option<RatePercent>,
    pub status: RequestStatus,
    pub created_by: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disbursed_by: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disbursement_channel: Option<String>,
    /// Set exactly once, at first approval; never cleared afterwards.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_id: Option<LoanId>,
}

fn invalid_transition(action: &str, from: RequestStatus) -> LendingError {
    LendingError::InvalidStateTransition {
        action: action.to_string(),
        from: from.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Creation and submission
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLoanRequest {
    pub client_id: ClientId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_table_id: Option<RateTableId>,
    pub principal: Money,
    pub installments: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quoted_rate: Option<RatePercent>,
}

/// Create a draft request on behalf of the calling agent.
pub fn create_request<S>(
    store: &mut S,
    ctx: &CallerContext,
    input: &NewLoanRequest,
) -> LendingResult<RequestId>
where
    S: LendingStore + ?Sized,
{
    require_role(ctx, &[Role::Agent, Role::Admin], "create loan request")?;

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
    if let Some(rate) = input.quoted_rate {
        if rate < Decimal::ZERO {
            return Err(LendingError::InvalidInput {
                field: "quoted_rate".into(),
                reason: "must not be negative".into(),
            });
        }
    }

    store.insert_request(LoanRequest {
        id: 0,
        client_id: input.client_id,
        rate_table_id: input.rate_table_id,
        requested_principal: input.principal,
        requested_installments: input.installments,
        quoted_rate: input.quoted_rate,
        status: RequestStatus::Draft,
        created_by: ctx.user_id,
        reviewed_by: None,
        disbursed_by: None,
        rejection_reason: None,
        disbursement_channel: None,
        loan_id: None,
    })
}

/// Send a draft (or a previously rejected request) to analysis. Agents may
/// only submit their own requests; admins may submit any.
pub fn submit_request<S>(store: &mut S, ctx: &CallerContext, id: RequestId) -> LendingResult<()>
where
    S: LendingStore + ?Sized,
{
    require_role(ctx, &[Role::Agent, Role::Admin], "submit loan request")?;

    let mut request = store.request(id)?;
    if ctx.role == Role::Agent && request.created_by != ctx.user_id {
        return Err(LendingError::PermissionDenied {
            action: "submit loan request".into(),
        });
    }

    match request.status {
        RequestStatus::Draft | RequestStatus::Rejected => {}
        other => return Err(invalid_transition("submit", other)),
    }

    request.status = RequestStatus::Submitted;
    store.update_request(&request)
}

/// Mark a submitted request as under analysis.
pub fn begin_analysis<S>(store: &mut S, ctx: &CallerContext, id: RequestId) -> LendingResult<()>
where
    S: LendingStore + ?Sized,
{
    require_role(ctx, &[Role::Analyst, Role::Admin], "analyze loan request")?;

    let mut request = store.request(id)?;
    match request.status {
        RequestStatus::Submitted => {}
        other => return Err(invalid_transition("analyze", other)),
    }

    request.status = RequestStatus::InAnalysis;
    store.update_request(&request)
}

// ---------------------------------------------------------------------------
// Approval
// ---------------------------------------------------------------------------

/// Loan terms fixed at approval time. The request itself only carries
/// principal, tenor and rate source.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ApprovalTerms {
    pub start_date: NaiveDate,
    pub due_day: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalOutcome {
    pub loan_id: LoanId,
    /// False on idempotent re-approval of a request that already links a loan.
    pub loan_created: bool,
    pub installment_amount: Money,
    pub monthly_rate: RatePercent,
}

fn resolve_request_rate<S>(store: &S, request: &LoanRequest) -> LendingResult<RatePercent>
where
    S: LendingStore + ?Sized,
{
    match request.rate_table_id {
        Some(table_id) => {
            let table = store.rate_table(table_id)?;
            table.resolve_rate(request.requested_installments)
        }
        None => request
            .quoted_rate
            .ok_or_else(|| LendingError::InvalidInput {
                field: "quoted_rate".into(),
                reason: "request has neither a quoted rate nor a rate table".into(),
            }),
    }
}

/// Approve a request, materializing the loan and its schedule.
///
/// If the request already links a loan, only status and reviewer are
/// updated: approval is idempotent, and at most one loan ever exists per
/// request even under concurrent approval.
pub fn approve_request<S>(
    store: &mut S,
    ctx: &CallerContext,
    id: RequestId,
    terms: &ApprovalTerms,
) -> LendingResult<ApprovalOutcome>
where
    S: LendingStore + ?Sized,
{
    require_role(ctx, &[Role::Analyst, Role::Admin], "approve loan request")?;

    let request = store.request(id)?;
    match request.status {
        RequestStatus::Submitted | RequestStatus::InAnalysis | RequestStatus::Approved => {}
        other => return Err(invalid_transition("approve", other)),
    }

    if let Some(loan_id) = request.loan_id {
        let loan = store.loan(loan_id)?;
        let mut updated = request.clone();
        updated.status = RequestStatus::Approved;
        updated.reviewed_by = Some(ctx.user_id);
        updated.rejection_reason = None;
        store.update_request(&updated)?;
        return Ok(ApprovalOutcome {
            loan_id,
            loan_created: false,
            installment_amount: loan.installment_amount,
            monthly_rate: loan.monthly_rate,
        });
    }

    let rate = resolve_request_rate(store, &request)?;
    let plan = plan_loan(&PlanInput {
        principal: request.requested_principal,
        monthly_rate: rate,
        installments: request.requested_installments,
        start_date: terms.start_date,
        due_day: terms.due_day,
    })?;

    with_transaction(store, |tx| {
        let loan_id = tx.insert_loan(Loan {
            id: 0,
            client_id: request.client_id,
            rate_table_id: request.rate_table_id,
            principal: request.requested_principal,
            installment_count: request.requested_installments,
            installment_amount: plan.installment_amount,
            monthly_rate: rate,
            start_date: terms.start_date,
            due_day: terms.due_day,
            end_date: plan.end_date,
            status: LoanStatus::Active,
            notes: None,
        })?;
        tx.insert_installments(loan_id, &plan.schedule)?;

        let mut updated = request.clone();
        updated.status = RequestStatus::Approved;
        updated.reviewed_by = Some(ctx.user_id);
        updated.rejection_reason = None;
        updated.loan_id = Some(loan_id);
        tx.update_request(&updated)?;

        Ok(ApprovalOutcome {
            loan_id,
            loan_created: true,
            installment_amount: plan.installment_amount,
            monthly_rate: rate,
        })
    })
}

// ---------------------------------------------------------------------------
// Rejection and disbursement
// ---------------------------------------------------------------------------

/// Reject a request with an optional free-text reason. A fresh reject
/// replaces any previous reason.
pub fn reject_request<S>(
    store: &mut S,
    ctx: &CallerContext,
    id: RequestId,
    reason: Option<&str>,
) -> LendingResult<()>
where
    S: LendingStore + ?Sized,
{
    require_role(ctx, &[Role::Analyst, Role::Admin], "reject loan request")?;

    let mut request = store.request(id)?;
    match request.status {
        RequestStatus::Submitted | RequestStatus::InAnalysis | RequestStatus::Approved => {}
        other => return Err(invalid_transition("reject", other)),
    }

    request.status = RequestStatus::Rejected;
    request.reviewed_by = Some(ctx.user_id);
    request.rejection_reason = reason
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(String::from);
    store.update_request(&request)
}

/// Release the approved principal to the client's principal bank account.
/// Records the payout channel on the request and keeps the loan active.
pub fn disburse_request<S, D>(
    store: &mut S,
    directory: &D,
    ctx: &CallerContext,
    id: RequestId,
    method: &str,
) -> LendingResult<String>
where
    S: LendingStore + ?Sized,
    D: ClientDirectory + ?Sized,
{
    require_role(ctx, &[Role::Finance, Role::Admin], "disburse loan request")?;

    if method.trim().is_empty() {
        return Err(LendingError::InvalidInput {
            field: "method".into(),
            reason: "disbursement method is required".into(),
        });
    }

    let request = store.request(id)?;
    match request.status {
        RequestStatus::Approved => {}
        other => return Err(invalid_transition("disburse", other)),
    }

    let loan_id = request.loan_id.ok_or_else(|| LendingError::InvalidInput {
        field: "loan_id".into(),
        reason: "request has no loan attached; approve it first".into(),
    })?;
    let loan = store.loan(loan_id)?;

    let client = directory.get_client(loan.client_id)?;
    let account = client
        .principal_account
        .ok_or(LendingError::NoPrincipalAccount {
            client_id: client.id,
        })?;

    let channel = format!("{} to {}", method.trim(), account.channel_description());

    with_transaction(store, |tx| {
        let mut updated = request.clone();
        updated.status = RequestStatus::Disbursed;
        updated.disbursed_by = Some(ctx.user_id);
        updated.disbursement_channel = Some(channel.clone());
        tx.update_request(&updated)?;

        let mut loan = loan.clone();
        loan.status = LoanStatus::Active;
        tx.update_loan(&loan)?;

        Ok(())
    })?;

    Ok(channel)
}
