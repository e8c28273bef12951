//! Academic sessions, terms and their fee schedules.

use std::collections::HashSet;

use bursary_domain::{
    is_non_negative_amount, AcademicSession, Action, Displayable, FeeBook, FeeRow, FeeSchedule, Term,
    TermOrdinal,
};
use tracing::info;
use uuid::Uuid;

use crate::{access_service::AccessService, time::Clock, CoreError};

pub struct SessionService;

impl SessionService {
    /// Creates a session together with its three terms. With `carry_fees`, every new term
    /// starts from the most recently created non-empty fee schedule.
    pub fn create_session(
        book: &mut FeeBook,
        clock: &dyn Clock,
        actor_id: Uuid,
        name: &str,
        start_year: i32,
        end_year: i32,
        carry_fees: bool,
    ) -> Result<(AcademicSession, Vec<Term>), CoreError> {
        AccessService::authorize(book, actor_id, Action::ManageSessions)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::Validation("session name is required".into()));
        }
        if end_year < start_year {
            return Err(CoreError::Validation(format!(
                "session cannot end ({end_year}) before it starts ({start_year})"
            )));
        }
        if book
            .sessions
            .iter()
            .any(|s| s.name.eq_ignore_ascii_case(name))
        {
            return Err(CoreError::Conflict(format!("session `{name}` already exists")));
        }

        let schedule = if carry_fees {
            book.terms
                .iter()
                .filter(|t| !t.fee_schedule.is_empty())
                .max_by_key(|t| (t.created_at, t.ordinal))
                .map(|t| t.fee_schedule.clone())
                .unwrap_or_default()
        } else {
            FeeSchedule::default()
        };

        let now = clock.now();
        let session = AcademicSession::new(name, start_year, end_year, now);
        let terms: Vec<Term> = TermOrdinal::ALL
            .iter()
            .map(|ordinal| {
                let mut term = Term::new(session.id, *ordinal, now);
                term.fee_schedule = schedule.clone();
                term
            })
            .collect();
        book.sessions.push(session.clone());
        book.terms.extend(terms.iter().cloned());
        book.touch(now);
        info!(session = %session.id, label = %session.display_label(), "session created");
        Ok((session, terms))
    }

    /// Makes `term_id` the only active term and its session the only active session.
    pub fn activate_term(
        book: &mut FeeBook,
        clock: &dyn Clock,
        actor_id: Uuid,
        term_id: Uuid,
    ) -> Result<Term, CoreError> {
        AccessService::authorize(book, actor_id, Action::ManageSessions)?;
        let session_id = book
            .term(term_id)
            .map(|t| t.session_id)
            .ok_or_else(|| CoreError::not_found("term", term_id))?;
        if book.session(session_id).is_none() {
            return Err(CoreError::not_found("session", session_id));
        }
        for term in &mut book.terms {
            term.is_active = term.id == term_id;
        }
        for session in &mut book.sessions {
            session.is_active = session.id == session_id;
        }
        let now = clock.now();
        book.touch(now);
        let term = book
            .term(term_id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("term", term_id))?;
        info!(term = %term_id, label = %term.display_label(), "term activated");
        Ok(term)
    }

    /// The active session and term, if a term has been activated.
    pub fn active(book: &FeeBook) -> Option<(&AcademicSession, &Term)> {
        let term = book.active_term()?;
        let session = book.session(term.session_id)?;
        Some((session, term))
    }

    /// Terms of a session in ordinal order.
    pub fn terms_of(book: &FeeBook, session_id: Uuid) -> Vec<&Term> {
        let mut terms: Vec<_> = book.terms_of(session_id).collect();
        terms.sort_by_key(|t| t.ordinal);
        terms
    }

    /// Deletes a session and its terms. Refused while the session is active or while any
    /// payment, fee change or promotion refers to one of its terms.
    pub fn delete_session(
        book: &mut FeeBook,
        clock: &dyn Clock,
        actor_id: Uuid,
        session_id: Uuid,
    ) -> Result<AcademicSession, CoreError> {
        AccessService::authorize(book, actor_id, Action::ManageSessions)?;
        let session = book
            .session(session_id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("session", session_id))?;
        if session.is_active {
            return Err(CoreError::invalid_state("session", session_id, "active"));
        }
        let term_ids: HashSet<Uuid> = book.terms_of(session_id).map(|t| t.id).collect();
        let referenced = book.payments.iter().any(|p| term_ids.contains(&p.term_id))
            || book.fee_changes.iter().any(|r| term_ids.contains(&r.term_id))
            || book.promotions.iter().any(|r| term_ids.contains(&r.term_id));
        if referenced {
            return Err(CoreError::invalid_state(
                "session",
                session_id,
                "referenced by recorded activity",
            ));
        }
        book.terms.retain(|t| t.session_id != session_id);
        book.sessions.retain(|s| s.id != session_id);
        book.touch(clock.now());
        info!(session = %session_id, "session deleted");
        Ok(session)
    }

    /// Replaces a term's whole fee schedule in one step.
    pub fn replace_fee_schedule(
        book: &mut FeeBook,
        clock: &dyn Clock,
        actor_id: Uuid,
        term_id: Uuid,
        rows: Vec<FeeRow>,
    ) -> Result<Term, CoreError> {
        AccessService::authorize(book, actor_id, Action::EditFeeSchedule)?;
        let mut seen = HashSet::new();
        for row in &rows {
            if !seen.insert(row.class) {
                return Err(CoreError::Validation(format!(
                    "class {} appears more than once",
                    row.class
                )));
            }
            if !is_non_negative_amount(row.new_intake_fee)
                || !is_non_negative_amount(row.returning_fee)
            {
                return Err(CoreError::Validation(format!(
                    "fees for {} must be numbers of zero or more",
                    row.class
                )));
            }
        }
        let now = clock.now();
        let term = book
            .term_mut(term_id)
            .ok_or_else(|| CoreError::not_found("term", term_id))?;
        term.fee_schedule = FeeSchedule::new(rows);
        let updated = term.clone();
        book.touch(now);
        info!(term = %term_id, rows = updated.fee_schedule.rows.len(), "fee schedule replaced");
        Ok(updated)
    }
}
