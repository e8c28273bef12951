//! The fee office: one handle that owns the store, the clock and the school settings and
//! runs every engine operation as a single store transaction.

use bursary_config::{Config, ConfigManager};
use bursary_core::{
    transact_with, AccessService, Clock, CoreError, Decision, DebtorGroup, FeeChangeProposal,
    FeeChangeService, FeeStore, MemoryFeeStore, NewStudent, PaymentService, PaymentSubmission,
    PromotionPolicy, PromotionService, ReceiptStatus, RegistrationFormat, RosterService,
    SessionService, StudentStatement, StudentUpdate, SummaryService, SystemClock, TermOverview,
};
use bursary_domain::{
    AcademicSession, Action, ApprovalStatus, FeeBook, FeeChangeRequest, FeeRow, Payment,
    PaymentAudit, PaymentMethod, PromotionCounts, PromotionRun, Role, SchoolClass, Student, Term,
    User,
};
use bursary_storage_json::JsonFeeStore;
use tracing::{info, warn};
use uuid::Uuid;

use crate::BursaryError;

pub type OfficeResult<T> = Result<T, BursaryError>;

pub struct FeeOffice {
    store: Box<dyn FeeStore>,
    clock: Box<dyn Clock>,
    policy: PromotionPolicy,
    format: RegistrationFormat,
    school_name: String,
    currency: String,
}

impl FeeOffice {
    pub fn new(store: Box<dyn FeeStore>, clock: Box<dyn Clock>, config: &Config) -> Self {
        Self {
            store,
            clock,
            policy: PromotionPolicy {
                manual_classes: config.manual_promotion_classes.clone(),
            },
            format: RegistrationFormat {
                prefix: config.normalized_prefix(),
            },
            school_name: config.school_name.clone(),
            currency: config.currency.clone(),
        }
    }

    /// Opens the JSON fee book under the configured data directory.
    pub fn open(config: &Config) -> OfficeResult<Self> {
        config.validate()?;
        let store = JsonFeeStore::with_retention(
            config.ledger_path(),
            config.backups_dir(),
            config.backup_retention,
        )?;
        info!(school = %config.school_name, path = %store.path().display(), "fee office opened");
        Ok(Self::new(Box::new(store), Box::new(SystemClock), config))
    }

    /// Reads the settings file (writing defaults on first run) and opens the office it
    /// describes.
    pub fn open_with(manager: &ConfigManager) -> OfficeResult<Self> {
        let config = manager.load_or_init()?;
        Self::open(&config)
    }

    /// Volatile office over an empty book.
    pub fn in_memory(config: &Config, clock: Box<dyn Clock>) -> Self {
        let book = FeeBook::new(clock.now());
        Self::new(Box::new(MemoryFeeStore::new(book)), clock, config)
    }

    pub fn school_name(&self) -> &str {
        &self.school_name
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn promotion_policy(&self) -> &PromotionPolicy {
        &self.policy
    }

    /// Consistent copy of the whole book.
    pub fn snapshot(&self) -> OfficeResult<FeeBook> {
        Ok(self.store.load()?)
    }

    /// Pretty JSON export of the book for off-site archiving.
    pub fn export_json(&self, actor_id: Uuid) -> OfficeResult<String> {
        let book = self.read(actor_id, Action::ViewReports, |book| Ok(book.clone()))?;
        serde_json::to_string_pretty(&book).map_err(|err| BursaryError::Storage(err.to_string()))
    }

    // Users

    /// Creates the first super admin of an empty book.
    pub fn bootstrap_admin(&self, display_name: &str) -> OfficeResult<User> {
        self.write("bootstrap_admin", |book, clock| {
            AccessService::bootstrap(book, clock, display_name)
        })
    }

    pub fn add_user(&self, actor_id: Uuid, display_name: &str, role: Role) -> OfficeResult<User> {
        self.write("add_user", |book, clock| {
            AccessService::add_user(book, clock, actor_id, display_name, role)
        })
    }

    pub fn assign_role(&self, actor_id: Uuid, user_id: Uuid, role: Role) -> OfficeResult<User> {
        self.write("assign_role", |book, clock| {
            AccessService::assign_role(book, clock, actor_id, user_id, role)
        })
    }

    pub fn set_user_active(
        &self,
        actor_id: Uuid,
        user_id: Uuid,
        active: bool,
    ) -> OfficeResult<User> {
        self.write("set_user_active", |book, clock| {
            AccessService::set_active(book, clock, actor_id, user_id, active)
        })
    }

    // Sessions and fee schedules

    pub fn create_session(
        &self,
        actor_id: Uuid,
        name: &str,
        start_year: i32,
        end_year: i32,
        carry_fees: bool,
    ) -> OfficeResult<(AcademicSession, Vec<Term>)> {
        self.write("create_session", |book, clock| {
            SessionService::create_session(
                book, clock, actor_id, name, start_year, end_year, carry_fees,
            )
        })
    }

    pub fn activate_term(&self, actor_id: Uuid, term_id: Uuid) -> OfficeResult<Term> {
        self.write("activate_term", |book, clock| {
            SessionService::activate_term(book, clock, actor_id, term_id)
        })
    }

    /// The active session and term, if any. Needs no permission.
    pub fn active_term(&self) -> OfficeResult<Option<(AcademicSession, Term)>> {
        let book = self.store.load()?;
        Ok(SessionService::active(&book).map(|(s, t)| (s.clone(), t.clone())))
    }

    pub fn delete_session(&self, actor_id: Uuid, session_id: Uuid) -> OfficeResult<AcademicSession> {
        self.write("delete_session", |book, clock| {
            SessionService::delete_session(book, clock, actor_id, session_id)
        })
    }

    pub fn replace_fee_schedule(
        &self,
        actor_id: Uuid,
        term_id: Uuid,
        rows: Vec<FeeRow>,
    ) -> OfficeResult<Term> {
        self.write("replace_fee_schedule", |book, clock| {
            SessionService::replace_fee_schedule(book, clock, actor_id, term_id, rows)
        })
    }

    // Roster

    pub fn register_student(&self, actor_id: Uuid, draft: NewStudent) -> OfficeResult<Student> {
        let format = &self.format;
        self.write("register_student", |book, clock| {
            RosterService::register(book, clock, actor_id, format, draft)
        })
    }

    pub fn update_student(
        &self,
        actor_id: Uuid,
        student_id: Uuid,
        changes: StudentUpdate,
    ) -> OfficeResult<Student> {
        self.write("update_student", |book, clock| {
            RosterService::update(book, clock, actor_id, student_id, changes)
        })
    }

    pub fn archive_student(&self, actor_id: Uuid, student_id: Uuid) -> OfficeResult<Student> {
        self.write("archive_student", |book, clock| {
            RosterService::archive(book, clock, actor_id, student_id)
        })
    }

    pub fn search_students(&self, actor_id: Uuid, query: &str) -> OfficeResult<Vec<Student>> {
        self.read(actor_id, Action::ManageStudents, |book| {
            Ok(RosterService::search(book, query).into_iter().cloned().collect())
        })
    }

    pub fn class_list(&self, actor_id: Uuid, class: SchoolClass) -> OfficeResult<Vec<Student>> {
        self.read(actor_id, Action::ManageStudents, |book| {
            Ok(RosterService::in_class(book, class).into_iter().cloned().collect())
        })
    }

    // Payments

    pub fn submit_payment(
        &self,
        actor_id: Uuid,
        submission: PaymentSubmission,
    ) -> OfficeResult<Payment> {
        self.write("submit_payment", |book, clock| {
            PaymentService::submit(book, clock, actor_id, submission)
        })
    }

    pub fn decide_payment(
        &self,
        reviewer_id: Uuid,
        payment_id: Uuid,
        decision: Decision,
        notes: Option<&str>,
    ) -> OfficeResult<Payment> {
        self.write("decide_payment", |book, clock| {
            PaymentService::decide(book, clock, payment_id, decision, reviewer_id, notes)
        })
    }

    pub fn edit_payment(
        &self,
        actor_id: Uuid,
        payment_id: Uuid,
        new_amount: f64,
        new_method: PaymentMethod,
        reason: &str,
    ) -> OfficeResult<Payment> {
        self.write("edit_payment", |book, clock| {
            PaymentService::edit(
                book, clock, payment_id, new_amount, new_method, reason, actor_id,
            )
        })
    }

    pub fn void_payment(
        &self,
        actor_id: Uuid,
        payment_id: Uuid,
        reason: &str,
    ) -> OfficeResult<Payment> {
        self.write("void_payment", |book, clock| {
            PaymentService::void(book, clock, payment_id, reason, actor_id)
        })
    }

    pub fn receipt(&self, actor_id: Uuid, payment_id: Uuid) -> OfficeResult<ReceiptStatus> {
        self.read(actor_id, Action::RecordPayment, |book| {
            PaymentService::receipt(book, payment_id)
        })
    }

    /// The approval queue, oldest first.
    pub fn pending_payments(&self, actor_id: Uuid) -> OfficeResult<Vec<Payment>> {
        self.read(actor_id, Action::ApprovePayment, |book| {
            Ok(PaymentService::pending(book).into_iter().cloned().collect())
        })
    }

    pub fn payment_history(
        &self,
        actor_id: Uuid,
        student_id: Uuid,
        term_id: Option<Uuid>,
    ) -> OfficeResult<Vec<Payment>> {
        self.read(actor_id, Action::RecordPayment, |book| {
            Ok(PaymentService::history(book, student_id, term_id)
                .into_iter()
                .cloned()
                .collect())
        })
    }

    pub fn audit_trail(&self, actor_id: Uuid, payment_id: Uuid) -> OfficeResult<Vec<PaymentAudit>> {
        self.read(actor_id, Action::ViewReports, |book| {
            Ok(PaymentService::audit_trail(book, payment_id)?
                .into_iter()
                .cloned()
                .collect())
        })
    }

    // Fee changes

    pub fn propose_fee_change(
        &self,
        actor_id: Uuid,
        proposal: FeeChangeProposal,
    ) -> OfficeResult<FeeChangeRequest> {
        self.write("propose_fee_change", |book, clock| {
            FeeChangeService::propose(book, clock, actor_id, proposal)
        })
    }

    pub fn approve_fee_change(
        &self,
        actor_id: Uuid,
        request_id: Uuid,
    ) -> OfficeResult<FeeChangeRequest> {
        self.write("approve_fee_change", |book, clock| {
            FeeChangeService::approve(book, clock, request_id, actor_id)
        })
    }

    pub fn reject_fee_change(
        &self,
        actor_id: Uuid,
        request_id: Uuid,
    ) -> OfficeResult<FeeChangeRequest> {
        self.write("reject_fee_change", |book, clock| {
            FeeChangeService::reject(book, clock, request_id, actor_id)
        })
    }

    pub fn fee_changes(
        &self,
        actor_id: Uuid,
        status: Option<ApprovalStatus>,
    ) -> OfficeResult<Vec<FeeChangeRequest>> {
        self.read(actor_id, Action::ViewReports, |book| {
            Ok(FeeChangeService::list(book, status).into_iter().cloned().collect())
        })
    }

    // Promotion

    pub fn preview_promotion(&self, actor_id: Uuid) -> OfficeResult<PromotionCounts> {
        let policy = &self.policy;
        self.read(actor_id, Action::PromoteStudents, |book| {
            Ok(PromotionService::preview(book, policy))
        })
    }

    pub fn promote_all(&self, actor_id: Uuid, term_id: Uuid) -> OfficeResult<PromotionRun> {
        let policy = &self.policy;
        self.write("promote_all", |book, clock| {
            PromotionService::promote_all(book, clock, actor_id, term_id, policy)
        })
    }

    // Reports

    pub fn term_overview(&self, actor_id: Uuid, term_id: Option<Uuid>) -> OfficeResult<TermOverview> {
        self.read(actor_id, Action::ViewReports, |book| {
            SummaryService::term_overview(book, term_id)
        })
    }

    pub fn student_statement(
        &self,
        actor_id: Uuid,
        student_id: Uuid,
        term_id: Option<Uuid>,
    ) -> OfficeResult<StudentStatement> {
        self.read(actor_id, Action::ViewReports, |book| {
            SummaryService::student_statement(book, student_id, term_id)
        })
    }

    pub fn debtors(&self, actor_id: Uuid, term_id: Option<Uuid>) -> OfficeResult<Vec<DebtorGroup>> {
        self.read(actor_id, Action::ViewReports, |book| {
            SummaryService::debtors_report(book, term_id)
        })
    }

    pub fn collections_by_method(
        &self,
        actor_id: Uuid,
        term_id: Option<Uuid>,
    ) -> OfficeResult<Vec<(PaymentMethod, f64)>> {
        self.read(actor_id, Action::ViewReports, |book| {
            SummaryService::collections_by_method(book, term_id)
        })
    }

    fn write<T>(
        &self,
        operation: &'static str,
        work: impl FnOnce(&mut FeeBook, &dyn Clock) -> Result<T, CoreError>,
    ) -> OfficeResult<T> {
        let clock = self.clock.as_ref();
        transact_with(self.store.as_ref(), |book| work(book, clock)).map_err(|err| {
            Self::log_rejection(operation, &err);
            err.into()
        })
    }

    fn read<T>(
        &self,
        actor_id: Uuid,
        action: Action,
        query: impl FnOnce(&FeeBook) -> Result<T, CoreError>,
    ) -> OfficeResult<T> {
        let book = self.store.load()?;
        AccessService::authorize(&book, actor_id, action).map_err(|err| {
            Self::log_rejection("read", &err);
            BursaryError::from(err)
        })?;
        Ok(query(&book)?)
    }

    fn log_rejection(operation: &'static str, err: &CoreError) {
        match err {
            CoreError::PermissionDenied { .. } | CoreError::InvalidState { .. } => {
                warn!(operation, error = %err, "operation rejected");
            }
            CoreError::Storage(_) | CoreError::Serde(_) | CoreError::Io(_) => {
                warn!(operation, error = %err, "storage failure");
            }
            _ => {}
        }
    }
}
