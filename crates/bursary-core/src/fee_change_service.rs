//! Review workflow for proposed fee-schedule edits.

use bursary_domain::{
    is_non_negative_amount, Action, ApprovalStatus, FeeBook, FeeChangeRequest, SchoolClass,
};
use tracing::info;
use uuid::Uuid;

use crate::{access_service::AccessService, time::Clock, CoreError};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeeChangeProposal {
    pub term_id: Uuid,
    pub class: SchoolClass,
    pub new_intake_fee: f64,
    pub returning_fee: f64,
}

pub struct FeeChangeService;

impl FeeChangeService {
    pub fn propose(
        book: &mut FeeBook,
        clock: &dyn Clock,
        actor_id: Uuid,
        proposal: FeeChangeProposal,
    ) -> Result<FeeChangeRequest, CoreError> {
        let actor = AccessService::authorize(book, actor_id, Action::ProposeFeeChange)?;
        for (label, value) in [
            ("new intake fee", proposal.new_intake_fee),
            ("returning fee", proposal.returning_fee),
        ] {
            if !is_non_negative_amount(value) {
                return Err(CoreError::Validation(format!(
                    "{label} must be a number of zero or more, got {value}"
                )));
            }
        }
        if book.term(proposal.term_id).is_none() {
            return Err(CoreError::not_found("term", proposal.term_id));
        }
        let now = clock.now();
        let request = FeeChangeRequest {
            id: Uuid::new_v4(),
            term_id: proposal.term_id,
            class: proposal.class,
            new_intake_fee: proposal.new_intake_fee,
            returning_fee: proposal.returning_fee,
            status: ApprovalStatus::Pending,
            requested_by: actor.id,
            decided_by: None,
            decided_at: None,
            created_at: now,
        };
        book.fee_changes.push(request.clone());
        book.touch(now);
        info!(request = %request.id, class = %request.class, "fee change proposed");
        Ok(request)
    }

    /// Approves a pending request and writes its row into the term's fee schedule.
    pub fn approve(
        book: &mut FeeBook,
        clock: &dyn Clock,
        request_id: Uuid,
        actor_id: Uuid,
    ) -> Result<FeeChangeRequest, CoreError> {
        let actor = AccessService::authorize(book, actor_id, Action::ApproveFeeChange)?;
        let request = Self::pending_request(book, request_id)?;
        let row = request.proposed_row();
        let term_id = request.term_id;
        let now = clock.now();

        let term = book
            .term_mut(term_id)
            .ok_or_else(|| CoreError::not_found("term", term_id))?;
        term.fee_schedule.upsert(row);

        let request = book
            .fee_change_mut(request_id)
            .ok_or_else(|| CoreError::not_found("fee change request", request_id))?;
        request.status = ApprovalStatus::Approved;
        request.decided_by = Some(actor.id);
        request.decided_at = Some(now);
        let updated = request.clone();
        book.touch(now);
        info!(request = %request_id, class = %row.class, "fee change approved");
        Ok(updated)
    }

    /// Rejects a pending request. The fee schedule is left untouched.
    pub fn reject(
        book: &mut FeeBook,
        clock: &dyn Clock,
        request_id: Uuid,
        actor_id: Uuid,
    ) -> Result<FeeChangeRequest, CoreError> {
        let actor = AccessService::authorize(book, actor_id, Action::ApproveFeeChange)?;
        Self::pending_request(book, request_id)?;
        let now = clock.now();
        let request = book
            .fee_change_mut(request_id)
            .ok_or_else(|| CoreError::not_found("fee change request", request_id))?;
        request.status = ApprovalStatus::Rejected;
        request.decided_by = Some(actor.id);
        request.decided_at = Some(now);
        let updated = request.clone();
        book.touch(now);
        info!(request = %request_id, "fee change rejected");
        Ok(updated)
    }

    /// Requests in `status` (all when `None`), oldest first.
    pub fn list(book: &FeeBook, status: Option<ApprovalStatus>) -> Vec<&FeeChangeRequest> {
        let mut rows: Vec<_> = book
            .fee_changes
            .iter()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .collect();
        rows.sort_by_key(|r| r.created_at);
        rows
    }

    fn pending_request(book: &FeeBook, request_id: Uuid) -> Result<&FeeChangeRequest, CoreError> {
        let request = book
            .fee_change(request_id)
            .ok_or_else(|| CoreError::not_found("fee change request", request_id))?;
        if request.status != ApprovalStatus::Pending {
            return Err(CoreError::invalid_state(
                "fee change request",
                request_id,
                request.status,
            ));
        }
        Ok(request)
    }
}
