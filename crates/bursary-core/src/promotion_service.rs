//! End-of-session promotion of the whole roster.

use bursary_domain::{
    Action, ArchiveReason, FeeBook, PromotionCounts, PromotionRun, SchoolClass, Student,
};
use tracing::info;
use uuid::Uuid;

use crate::{access_service::AccessService, time::Clock, CoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
/// School policy knobs for promotion.
pub struct PromotionPolicy {
    /// Classes whose students are never advanced automatically.
    pub manual_classes: Vec<SchoolClass>,
}

impl Default for PromotionPolicy {
    fn default() -> Self {
        Self {
            manual_classes: vec![SchoolClass::Creche],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromotionOutcome {
    Promoted { from: SchoolClass, to: SchoolClass },
    Graduated,
    Manual,
}

pub struct PromotionService;

impl PromotionService {
    /// What promotion would do to `student` under `policy`.
    pub fn plan(student: &Student, policy: &PromotionPolicy) -> PromotionOutcome {
        if policy.manual_classes.contains(&student.class) {
            return PromotionOutcome::Manual;
        }
        match student.class.next() {
            Some(to) => PromotionOutcome::Promoted {
                from: student.class,
                to,
            },
            None => PromotionOutcome::Graduated,
        }
    }

    /// Counts the outcomes for the current roster without changing anything.
    pub fn preview(book: &FeeBook, policy: &PromotionPolicy) -> PromotionCounts {
        let mut counts = PromotionCounts::default();
        for student in book.active_students() {
            Self::tally(&mut counts, Self::plan(student, policy));
        }
        counts
    }

    /// Promotes every non-archived student in one pass. Only valid while `term_id` is the
    /// active term and the closing term of its session, and only once per term.
    pub fn promote_all(
        book: &mut FeeBook,
        clock: &dyn Clock,
        actor_id: Uuid,
        term_id: Uuid,
        policy: &PromotionPolicy,
    ) -> Result<PromotionRun, CoreError> {
        let actor = AccessService::authorize(book, actor_id, Action::PromoteStudents)?;
        let term = book
            .term(term_id)
            .ok_or_else(|| CoreError::not_found("term", term_id))?;
        if !term.ordinal.is_last() {
            return Err(CoreError::Validation(format!(
                "promotion runs after the 3rd term; term {} is the {} term",
                term_id, term.ordinal
            )));
        }
        if book.active_term().map(|active| active.id) != Some(term_id) {
            return Err(CoreError::Validation(format!(
                "term {term_id} is not the active term; activate it before promoting"
            )));
        }
        if book.promotions.iter().any(|run| run.term_id == term_id) {
            return Err(CoreError::invalid_state("term", term_id, "already promoted"));
        }

        let now = clock.now();
        let mut counts = PromotionCounts::default();
        for student in book.students.iter_mut().filter(|s| !s.is_archived()) {
            let outcome = Self::plan(student, policy);
            match outcome {
                PromotionOutcome::Manual => {}
                PromotionOutcome::Graduated => student.archive(ArchiveReason::Graduated, now),
                PromotionOutcome::Promoted { to, .. } => {
                    student.class = to;
                    student.is_new_intake = false;
                }
            }
            Self::tally(&mut counts, outcome);
        }

        let run = PromotionRun {
            id: Uuid::new_v4(),
            term_id,
            performed_by: actor.id,
            performed_at: now,
            counts,
        };
        book.promotions.push(run.clone());
        book.touch(now);
        info!(
            term = %term_id,
            promoted = counts.promoted,
            graduated = counts.graduated,
            manual = counts.manual,
            "roster promoted"
        );
        Ok(run)
    }

    fn tally(counts: &mut PromotionCounts, outcome: PromotionOutcome) {
        match outcome {
            PromotionOutcome::Promoted { .. } => counts.promoted += 1,
            PromotionOutcome::Graduated => counts.graduated += 1,
            PromotionOutcome::Manual => counts.manual += 1,
        }
    }
}
