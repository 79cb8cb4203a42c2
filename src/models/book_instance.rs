//! Book instance (loanable copy) model and loan status

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

/// Loan period applied by the loan workflow
pub const LOAN_PERIOD_DAYS: i64 = 28;

/// Due-back date for a loan starting on `today`
pub fn due_back_from(today: NaiveDate) -> NaiveDate {
    today + Duration::days(LOAN_PERIOD_DAYS)
}

/// Loan status of a copy, stored as a single character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Maintenance,
    OnLoan,
    Available,
    Reserved,
}

impl LoanStatus {
    pub fn code(&self) -> &'static str {
        match self {
            LoanStatus::Maintenance => "m",
            LoanStatus::OnLoan => "o",
            LoanStatus::Available => "a",
            LoanStatus::Reserved => "r",
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            LoanStatus::Maintenance => "maintenance",
            LoanStatus::OnLoan => "on loan",
            LoanStatus::Available => "available",
            LoanStatus::Reserved => "reserved",
        };
        write!(f, "{}", label)
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "m" => Ok(LoanStatus::Maintenance),
            "o" => Ok(LoanStatus::OnLoan),
            "a" => Ok(LoanStatus::Available),
            "r" => Ok(LoanStatus::Reserved),
            _ => Err(format!("Invalid loan status code: {}", s)),
        }
    }
}

// SQLx conversion for LoanStatus
impl sqlx::Type<Postgres> for LoanStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for LoanStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for LoanStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.code(), buf)
    }
}

/// Copy as listed under its book
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookInstanceShort {
    pub id: Uuid,
    pub status: LoanStatus,
    pub due_back: Option<NaiveDate>,
}

/// Copy with its book title and borrower, for loan lists and forms
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookInstanceDetails {
    pub id: Uuid,
    pub book_id: i32,
    pub book_title: String,
    pub status: LoanStatus,
    pub due_back: Option<NaiveDate>,
    pub borrower_id: Option<i32>,
    pub borrower_username: Option<String>,
    /// Set on loan listings when the due date has passed
    #[sqlx(skip)]
    #[serde(default)]
    pub is_overdue: bool,
}

impl BookInstanceDetails {
    pub fn overdue_on(&self, today: NaiveDate) -> bool {
        self.status == LoanStatus::OnLoan && self.due_back.map(|d| d < today).unwrap_or(false)
    }
}

/// Create instance form
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct InstanceForm {
    /// Initial status; defaults to available. Loans go through the loan workflow.
    pub status: Option<LoanStatus>,
}

impl InstanceForm {
    pub fn initial_status(&self) -> LoanStatus {
        self.status.unwrap_or(LoanStatus::Available)
    }
}

impl Validate for InstanceForm {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.status == Some(LoanStatus::OnLoan) {
            let mut error = ValidationError::new("on_loan_not_allowed");
            error.message = Some("New copies cannot start on loan".into());
            errors.add("status", error);
        }
        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Librarian loan form
///
/// `status` and `due_back` may be echoed back from the form pre-fill in any
/// shape; they are discarded on input. The workflow always sets on-loan and
/// computes the due date from the server clock.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoanBookForm {
    pub borrower_id: i32,
    #[serde(skip_deserializing)]
    pub status: Option<LoanStatus>,
    #[serde(skip_deserializing)]
    pub due_back: Option<NaiveDate>,
}

/// Loan form pre-filled for display
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoanFormInitial {
    pub instance_id: Uuid,
    pub book_title: String,
    pub status: LoanStatus,
    pub due_back: Option<NaiveDate>,
    pub borrower_id: Option<i32>,
}

impl From<BookInstanceDetails> for LoanFormInitial {
    fn from(instance: BookInstanceDetails) -> Self {
        Self {
            instance_id: instance.id,
            book_title: instance.book_title,
            status: instance.status,
            due_back: instance.due_back,
            borrower_id: instance.borrower_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loan_form_discards_status_and_due_date() {
        let form: LoanBookForm = serde_json::from_str(
            r#"{"borrower_id": 9, "status": "o", "due_back": "next tuesday"}"#,
        )
        .unwrap();
        assert_eq!(form.borrower_id, 9);
        assert_eq!(form.status, None);
        assert_eq!(form.due_back, None);
    }

    #[test]
    fn due_back_is_four_weeks_out() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 10).unwrap();
        assert_eq!(due_back_from(today), NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
    }

    #[test]
    fn status_codes_parse_back() {
        for status in [
            LoanStatus::Maintenance,
            LoanStatus::OnLoan,
            LoanStatus::Available,
            LoanStatus::Reserved,
        ] {
            assert_eq!(status.code().parse::<LoanStatus>().unwrap(), status);
        }
        assert!("x".parse::<LoanStatus>().is_err());
    }

    #[test]
    fn new_copies_cannot_start_on_loan() {
        let form = InstanceForm { status: Some(LoanStatus::OnLoan) };
        assert!(form.validate().is_err());
        assert_eq!(InstanceForm::default().initial_status(), LoanStatus::Available);
    }

    #[test]
    fn overdue_only_when_on_loan_and_past_due() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let mut instance = BookInstanceDetails {
            id: Uuid::new_v4(),
            book_id: 1,
            book_title: "Kindred".into(),
            status: LoanStatus::OnLoan,
            due_back: NaiveDate::from_ymd_opt(2024, 4, 30),
            borrower_id: Some(3),
            borrower_username: Some("octavia".into()),
            is_overdue: false,
        };
        assert!(instance.overdue_on(today));
        instance.due_back = Some(today);
        assert!(!instance.overdue_on(today));
        instance.status = LoanStatus::Available;
        instance.due_back = None;
        assert!(!instance.overdue_on(today));
    }
}
