use std::collections::BTreeMap;

use crate::error::LendingError;
use crate::ledger::{Installment, InstallmentStatus, Loan};
use crate::rates::RateTable;
use crate::schedule::InstallmentDraft;
use crate::store::LendingStore;
use crate::types::{InstallmentId, LoanId, RateTableId, RequestId};
use crate::workflow::LoanRequest;
use crate::LendingResult;

#[derive(Debug, Clone, Default)]
struct State {
    rate_tables: BTreeMap<RateTableId, RateTable>,
    requests: BTreeMap<RequestId, LoanRequest>,
    loans: BTreeMap<LoanId, Loan>,
    installments: BTreeMap<InstallmentId, Installment>,
    next_rate_table_id: RateTableId,
    next_request_id: RequestId,
    next_loan_id: LoanId,
    next_installment_id: InstallmentId,
}

/// In-memory store with snapshot-based transactions: `begin` clones the
/// whole state, `rollback` restores it. Nested transactions stack.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: State,
    snapshots: Vec<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while at least one transaction is open. Test hook.
    pub fn in_transaction(&self) -> bool {
        !self.snapshots.is_empty()
    }
}

impl LendingStore for MemoryStore {
    fn begin(&mut self) -> LendingResult<()> {
        self.snapshots.push(self.state.clone());
        Ok(())
    }

    fn commit(&mut self) -> LendingResult<()> {
        self.snapshots
            .pop()
            .map(|_| ())
            .ok_or_else(|| LendingError::Storage("commit without open transaction".into()))
    }

    fn rollback(&mut self) -> LendingResult<()> {
        match self.snapshots.pop() {
            Some(snapshot) => {
                self.state = snapshot;
                Ok(())
            }
            None => Err(LendingError::Storage(
                "rollback without open transaction".into(),
            )),
        }
    }

    fn insert_rate_table(&mut self, mut table: RateTable) -> LendingResult<RateTableId> {
        self.state.next_rate_table_id += 1;
        table.id = self.state.next_rate_table_id;
        let id = table.id;
        self.state.rate_tables.insert(id, table);
        Ok(id)
    }

    fn rate_table(&self, id: RateTableId) -> LendingResult<RateTable> {
        self.state
            .rate_tables
            .get(&id)
            .cloned()
            .ok_or(LendingError::NotFound {
                entity: "rate table",
                id,
            })
    }

    fn update_rate_table(&mut self, table: &RateTable) -> LendingResult<()> {
        if !self.state.rate_tables.contains_key(&table.id) {
            return Err(LendingError::NotFound {
                entity: "rate table",
                id: table.id,
            });
        }
        self.state.rate_tables.insert(table.id, table.clone());
        Ok(())
    }

    fn delete_rate_table(&mut self, id: RateTableId) -> LendingResult<()> {
        self.state
            .rate_tables
            .remove(&id)
            .map(|_| ())
            .ok_or(LendingError::NotFound {
                entity: "rate table",
                id,
            })
    }

    fn insert_request(&mut self, mut request: LoanRequest) -> LendingResult<RequestId> {
        self.state.next_request_id += 1;
        request.id = self.state.next_request_id;
        let id = request.id;
        self.state.requests.insert(id, request);
        Ok(id)
    }

    fn request(&self, id: RequestId) -> LendingResult<LoanRequest> {
        self.state
            .requests
            .get(&id)
            .cloned()
            .ok_or(LendingError::NotFound {
                entity: "loan request",
                id,
            })
    }

    fn update_request(&mut self, request: &LoanRequest) -> LendingResult<()> {
        if !self.state.requests.contains_key(&request.id) {
            return Err(LendingError::NotFound {
                entity: "loan request",
                id: request.id,
            });
        }
        self.state.requests.insert(request.id, request.clone());
        Ok(())
    }

    fn insert_loan(&mut self, mut loan: Loan) -> LendingResult<LoanId> {
        self.state.next_loan_id += 1;
        loan.id = self.state.next_loan_id;
        let id = loan.id;
        self.state.loans.insert(id, loan);
        Ok(id)
    }

    fn loan(&self, id: LoanId) -> LendingResult<Loan> {
        self.state
            .loans
            .get(&id)
            .cloned()
            .ok_or(LendingError::NotFound { entity: "loan", id })
    }

    fn update_loan(&mut self, loan: &Loan) -> LendingResult<()> {
        if !self.state.loans.contains_key(&loan.id) {
            return Err(LendingError::NotFound {
                entity: "loan",
                id: loan.id,
            });
        }
        self.state.loans.insert(loan.id, loan.clone());
        Ok(())
    }

    fn delete_loan(&mut self, id: LoanId) -> LendingResult<()> {
        self.state
            .loans
            .remove(&id)
            .ok_or(LendingError::NotFound { entity: "loan", id })?;
        self.state.installments.retain(|_, i| i.loan_id != id);
        Ok(())
    }

    fn insert_installments(
        &mut self,
        loan_id: LoanId,
        drafts: &[InstallmentDraft],
    ) -> LendingResult<Vec<InstallmentId>> {
        if !self.state.loans.contains_key(&loan_id) {
            return Err(LendingError::NotFound {
                entity: "loan",
                id: loan_id,
            });
        }

        let mut ids = Vec::with_capacity(drafts.len());
        for draft in drafts {
            self.state.next_installment_id += 1;
            let id = self.state.next_installment_id;
            self.state.installments.insert(
                id,
                Installment {
                    id,
                    loan_id,
                    sequence: draft.sequence,
                    amount: draft.amount,
                    due_date: draft.due_date,
                    status: InstallmentStatus::Pending,
                    paid_date: None,
                    paid_amount: None,
                    payment_method: None,
                    notes: None,
                },
            );
            ids.push(id);
        }
        Ok(ids)
    }

    fn installment(&self, id: InstallmentId) -> LendingResult<Installment> {
        self.state
            .installments
            .get(&id)
            .cloned()
            .ok_or(LendingError::NotFound {
                entity: "installment",
                id,
            })
    }

    fn installments_for_loan(&self, loan_id: LoanId) -> LendingResult<Vec<Installment>> {
        let mut rows: Vec<Installment> = self
            .state
            .installments
            .values()
            .filter(|i| i.loan_id == loan_id)
            .cloned()
            .collect();
        rows.sort_by_key(|i| (i.sequence, i.id));
        Ok(rows)
    }

    fn update_installment(&mut self, installment: &Installment) -> LendingResult<()> {
        if !self.state.installments.contains_key(&installment.id) {
            return Err(LendingError::NotFound {
                entity: "installment",
                id: installment.id,
            });
        }
        self.state
            .installments
            .insert(installment.id, installment.clone());
        Ok(())
    }

    fn delete_pending_installments(&mut self, loan_id: LoanId) -> LendingResult<usize> {
        let before = self.state.installments.len();
        self.state
            .installments
            .retain(|_, i| i.loan_id != loan_id || i.status != InstallmentStatus::Pending);
        Ok(before - self.state.installments.len())
    }
}
