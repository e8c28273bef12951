//! Student registration and roster maintenance.

use bursary_domain::{
    Action, ArchiveReason, Displayable, FeeBook, RegistrationNumber, SchoolClass, Section, Student,
};
use tracing::info;
use uuid::Uuid;

use crate::{access_service::AccessService, time::Clock, CoreError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationFormat {
    /// Optional school code placed in front of every registration number.
    pub prefix: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewStudent {
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub class: SchoolClass,
    pub parent_name: Option<String>,
    pub parent_phone: String,
    pub entry_year: i32,
    pub is_new_intake: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
/// Field-level changes; `None` leaves a field as is. An empty middle name clears it.
pub struct StudentUpdate {
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub class: Option<SchoolClass>,
    pub is_new_intake: Option<bool>,
    pub parent_name: Option<String>,
    pub parent_phone: Option<String>,
}

pub struct RosterService;

impl RosterService {
    pub fn register(
        book: &mut FeeBook,
        clock: &dyn Clock,
        actor_id: Uuid,
        format: &RegistrationFormat,
        draft: NewStudent,
    ) -> Result<Student, CoreError> {
        AccessService::authorize(book, actor_id, Action::ManageStudents)?;
        let first_name = Self::required("first name", &draft.first_name)?;
        let last_name = Self::required("last name", &draft.last_name)?;
        let parent_phone = Self::required("parent phone", &draft.parent_phone)?;
        if !(1900..=9999).contains(&draft.entry_year) {
            return Err(CoreError::Validation(format!(
                "entry year {} is out of range",
                draft.entry_year
            )));
        }

        let section = draft.class.section();
        let serial = Self::next_serial(book, section, draft.entry_year)?;
        let registration_number = RegistrationNumber::compose(
            format.prefix.as_deref(),
            section,
            draft.entry_year,
            serial,
        );
        if book
            .students
            .iter()
            .any(|s| s.registration_number == registration_number)
        {
            return Err(CoreError::Conflict(format!(
                "registration number {registration_number} is already assigned"
            )));
        }

        let now = clock.now();
        let student = Student {
            id: Uuid::new_v4(),
            registration_number,
            first_name,
            middle_name: Self::optional(draft.middle_name),
            last_name,
            entry_section: section,
            class: draft.class,
            parent_name: Self::optional(draft.parent_name),
            parent_phone,
            entry_year: draft.entry_year,
            is_new_intake: draft.is_new_intake,
            created_at: now,
            archived_at: None,
            archive_reason: None,
        };
        book.students.push(student.clone());
        book.touch(now);
        info!(student = %student.id, label = %student.display_label(), "student registered");
        Ok(student)
    }

    pub fn update(
        book: &mut FeeBook,
        clock: &dyn Clock,
        actor_id: Uuid,
        student_id: Uuid,
        changes: StudentUpdate,
    ) -> Result<Student, CoreError> {
        AccessService::authorize(book, actor_id, Action::ManageStudents)?;
        let first_name = changes
            .first_name
            .as_deref()
            .map(|v| Self::required("first name", v))
            .transpose()?;
        let last_name = changes
            .last_name
            .as_deref()
            .map(|v| Self::required("last name", v))
            .transpose()?;
        let parent_phone = changes
            .parent_phone
            .as_deref()
            .map(|v| Self::required("parent phone", v))
            .transpose()?;

        let now = clock.now();
        let student = book
            .student_mut(student_id)
            .ok_or_else(|| CoreError::not_found("student", student_id))?;
        if student.is_archived() {
            return Err(CoreError::invalid_state("student", student_id, "archived"));
        }
        if let Some(value) = first_name {
            student.first_name = value;
        }
        if let Some(value) = last_name {
            student.last_name = value;
        }
        if let Some(value) = changes.middle_name {
            student.middle_name = Self::optional(Some(value));
        }
        if let Some(class) = changes.class {
            student.class = class;
        }
        if let Some(flag) = changes.is_new_intake {
            student.is_new_intake = flag;
        }
        if let Some(value) = changes.parent_name {
            student.parent_name = Self::optional(Some(value));
        }
        if let Some(value) = parent_phone {
            student.parent_phone = value;
        }
        let updated = student.clone();
        book.touch(now);
        Ok(updated)
    }

    /// Soft-deletes a student. Payments already recorded remain on file.
    pub fn archive(
        book: &mut FeeBook,
        clock: &dyn Clock,
        actor_id: Uuid,
        student_id: Uuid,
    ) -> Result<Student, CoreError> {
        AccessService::authorize(book, actor_id, Action::ManageStudents)?;
        let now = clock.now();
        let student = book
            .student_mut(student_id)
            .ok_or_else(|| CoreError::not_found("student", student_id))?;
        if student.is_archived() {
            return Err(CoreError::invalid_state("student", student_id, "archived"));
        }
        student.archive(ArchiveReason::Withdrawn, now);
        let updated = student.clone();
        book.touch(now);
        info!(student = %student_id, "student archived");
        Ok(updated)
    }

    /// Case-insensitive match on name or registration number among active students.
    pub fn search<'a>(book: &'a FeeBook, query: &str) -> Vec<&'a Student> {
        let needle = query.trim().to_lowercase();
        book.active_students()
            .filter(|s| {
                needle.is_empty()
                    || s.full_name().to_lowercase().contains(&needle)
                    || s.registration_number
                        .as_str()
                        .to_lowercase()
                        .contains(&needle)
            })
            .collect()
    }

    /// Active students of `class`, sorted by last then first name.
    pub fn in_class(book: &FeeBook, class: SchoolClass) -> Vec<&Student> {
        let mut rows: Vec<_> = book.active_students().filter(|s| s.class == class).collect();
        rows.sort_by(|a, b| {
            a.last_name
                .cmp(&b.last_name)
                .then_with(|| a.first_name.cmp(&b.first_name))
        });
        rows
    }

    // Serial = students already registered into the same section and entry year, plus one.
    fn next_serial(book: &FeeBook, section: Section, entry_year: i32) -> Result<u32, CoreError> {
        let existing = book
            .students
            .iter()
            .filter(|s| s.entry_section == section && s.entry_year == entry_year)
            .count();
        u32::try_from(existing + 1)
            .map_err(|_| CoreError::Conflict("registration serials exhausted".into()))
    }

    fn required(label: &str, value: &str) -> Result<String, CoreError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(CoreError::Validation(format!("{label} is required")));
        }
        Ok(trimmed.to_string())
    }

    fn optional(value: Option<String>) -> Option<String> {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}
