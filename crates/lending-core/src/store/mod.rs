//! Persistence collaborator contract. The core only ever talks to storage
//! through [`LendingStore`]; the bundled [`MemoryStore`] backs tests and
//! tooling.

pub mod memory;

pub use memory::MemoryStore;

use crate::ledger::{Installment, Loan};
use crate::rates::RateTable;
use crate::schedule::InstallmentDraft;
use crate::types::{InstallmentId, LoanId, RateTableId, RequestId};
use crate::workflow::LoanRequest;
use crate::LendingResult;

/// Transactional CRUD over the lending entities.
///
/// Inserts take the entity with a zero id and return the assigned id.
/// `begin`/`commit`/`rollback` nest; prefer [`with_transaction`] over calling
/// them directly.
pub trait LendingStore {
    fn begin(&mut self) -> LendingResult<()>;
    fn commit(&mut self) -> LendingResult<()>;
    fn rollback(&mut self) -> LendingResult<()>;

    fn insert_rate_table(&mut self, table: RateTable) -> LendingResult<RateTableId>;
    fn rate_table(&self, id: RateTableId) -> LendingResult<RateTable>;
    fn update_rate_table(&mut self, table: &RateTable) -> LendingResult<()>;
    /// Hard delete; tiers go with the table.
    fn delete_rate_table(&mut self, id: RateTableId) -> LendingResult<()>;

    fn insert_request(&mut self, request: LoanRequest) -> LendingResult<RequestId>;
    fn request(&self, id: RequestId) -> LendingResult<LoanRequest>;
    fn update_request(&mut self, request: &LoanRequest) -> LendingResult<()>;

    fn insert_loan(&mut self, loan: Loan) -> LendingResult<LoanId>;
    fn loan(&self, id: LoanId) -> LendingResult<Loan>;
    fn update_loan(&mut self, loan: &Loan) -> LendingResult<()>;
    /// Cascade delete: the loan's installments are removed with it.
    fn delete_loan(&mut self, id: LoanId) -> LendingResult<()>;

    fn insert_installments(
        &mut self,
        loan_id: LoanId,
        drafts: &[InstallmentDraft],
    ) -> LendingResult<Vec<InstallmentId>>;
    fn installment(&self, id: InstallmentId) -> LendingResult<Installment>;
    /// Ordered by sequence number, then id.
    fn installments_for_loan(&self, loan_id: LoanId) -> LendingResult<Vec<Installment>>;
    fn update_installment(&mut self, installment: &Installment) -> LendingResult<()>;
    /// Remove only rows still pending; returns how many went away.
    fn delete_pending_installments(&mut self, loan_id: LoanId) -> LendingResult<usize>;
}

/// Scoped transaction: begin, run the closure, then commit on `Ok` or roll
/// back on `Err`. Generate-then-persist operations are all-or-nothing.
pub fn with_transaction<S, T, F>(store: &mut S, f: F) -> LendingResult<T>
where
    S: LendingStore + ?Sized,
    F: FnOnce(&mut S) -> LendingResult<T>,
{
    store.begin()?;
    match f(store) {
        Ok(value) => {
            store.commit()?;
            Ok(value)
        }
        Err(err) => {
            store.rollback()?;
            Err(err)
        }
    }
}
