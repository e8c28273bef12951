use std::{collections::HashSet, sync::Mutex};

use bursary_domain::FeeBook;
use tracing::debug;

use crate::CoreError;

/// Persistence collaborator holding the authoritative [`FeeBook`].
///
/// `transact` is the only write path. Implementations run `work` against a private copy
/// of the book while holding their write lock and publish the copy only when `work`
/// returns `Ok`, so every operation is a single read-validate-write unit.
pub trait FeeStore: Send + Sync {
    /// Returns a consistent snapshot of the book.
    fn load(&self) -> Result<FeeBook, CoreError>;

    fn transact(
        &self,
        work: &mut dyn FnMut(&mut FeeBook) -> Result<(), CoreError>,
    ) -> Result<(), CoreError>;
}

/// Runs `work` inside a store transaction and hands back its result.
pub fn transact_with<S, T, F>(store: &S, work: F) -> Result<T, CoreError>
where
    S: FeeStore + ?Sized,
    F: FnOnce(&mut FeeBook) -> Result<T, CoreError>,
{
    let mut work = Some(work);
    let mut output = None;
    store.transact(&mut |book| {
        let job = work
            .take()
            .ok_or_else(|| CoreError::Storage("transaction body already ran".into()))?;
        output = Some(job(book)?);
        Ok(())
    })?;
    output.ok_or_else(|| CoreError::Storage("transaction produced no result".into()))
}

/// Volatile store, suitable for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryFeeStore {
    book: Mutex<FeeBook>,
}

impl MemoryFeeStore {
    pub fn new(book: FeeBook) -> Self {
        Self {
            book: Mutex::new(book),
        }
    }
}

impl FeeStore for MemoryFeeStore {
    fn load(&self) -> Result<FeeBook, CoreError> {
        let guard = self
            .book
            .lock()
            .map_err(|_| CoreError::Storage("fee book lock poisoned".into()))?;
        Ok(guard.clone())
    }

    fn transact(
        &self,
        work: &mut dyn FnMut(&mut FeeBook) -> Result<(), CoreError>,
    ) -> Result<(), CoreError> {
        let mut guard = self
            .book
            .lock()
            .map_err(|_| CoreError::Storage("fee book lock poisoned".into()))?;
        let mut draft = guard.clone();
        work(&mut draft)?;
        *guard = draft;
        debug!("memory store committed");
        Ok(())
    }
}

/// Detects dangling references and broken singleton invariants within a book snapshot.
pub fn book_warnings(book: &FeeBook) -> Vec<String> {
    let student_ids: HashSet<_> = book.students.iter().map(|s| s.id).collect();
    let term_ids: HashSet<_> = book.terms.iter().map(|t| t.id).collect();
    let session_ids: HashSet<_> = book.sessions.iter().map(|s| s.id).collect();
    let payment_ids: HashSet<_> = book.payments.iter().map(|p| p.id).collect();
    let mut warnings = Vec::new();

    for term in &book.terms {
        if !session_ids.contains(&term.session_id) {
            warnings.push(format!(
                "term {} references unknown session {}",
                term.id, term.session_id
            ));
        }
    }
    for payment in &book.payments {
        if !student_ids.contains(&payment.student_id) {
            warnings.push(format!(
                "payment {} references unknown student {}",
                payment.id, payment.student_id
            ));
        }
        if !term_ids.contains(&payment.term_id) {
            warnings.push(format!(
                "payment {} references unknown term {}",
                payment.id, payment.term_id
            ));
        }
    }
    for audit in &book.audits {
        if !payment_ids.contains(&audit.payment_id) {
            warnings.push(format!(
                "audit {} references unknown payment {}",
                audit.id, audit.payment_id
            ));
        }
    }
    let active_terms = book.terms.iter().filter(|t| t.is_active).count();
    if active_terms > 1 {
        warnings.push(format!("{active_terms} terms are flagged active"));
    }
    let active_sessions = book.sessions.iter().filter(|s| s.is_active).count();
    if active_sessions > 1 {
        warnings.push(format!("{active_sessions} sessions are flagged active"));
    }
    warnings
}
