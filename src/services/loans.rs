//! Loan workflow service: librarian loans, returns and loan listings

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        book_instance::{due_back_from, BookInstanceDetails, LoanBookForm, LoanFormInitial, LoanStatus},
        Page,
    },
    repository::Repository,
};

use super::field_error;

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
}

impl LoansService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn get_instance(&self, id: Uuid) -> AppResult<BookInstanceDetails> {
        self.repository.instances.get_by_id(id).await
    }

    /// Copies currently on loan to a user, soonest due first
    pub async fn loans_of(&self, user_id: i32, page: Page) -> AppResult<(Vec<BookInstanceDetails>, i64)> {
        self.loans_of_on(user_id, page, Utc::now().date_naive()).await
    }

    /// Loans of a user with overdue copies flagged against `today`
    pub async fn loans_of_on(
        &self,
        user_id: i32,
        page: Page,
        today: NaiveDate,
    ) -> AppResult<(Vec<BookInstanceDetails>, i64)> {
        let (mut instances, total) = self.repository.instances.list_on_loan_to(user_id, page).await?;
        page.ensure_exists(total)?;
        for instance in &mut instances {
            instance.is_overdue = instance.overdue_on(today);
        }
        Ok((instances, total))
    }

    /// Available copies ordered by book title
    pub async fn available(&self, page: Page) -> AppResult<(Vec<BookInstanceDetails>, i64)> {
        let (instances, total) = self.repository.instances.list_available(page).await?;
        page.ensure_exists(total)?;
        Ok((instances, total))
    }

    /// Loan form pre-filled with the copy's book title and current state
    pub async fn loan_form(&self, id: Uuid) -> AppResult<LoanFormInitial> {
        let instance = self.repository.instances.get_by_id(id).await?;
        Ok(instance.into())
    }

    /// Loan a copy starting today (server clock)
    pub async fn loan_instance(&self, id: Uuid, form: LoanBookForm) -> AppResult<BookInstanceDetails> {
        self.loan_instance_on(id, form, Utc::now().date_naive()).await
    }

    /// Loan a copy starting on `today`.
    ///
    /// The copy must be available. Whatever the form says about status and
    /// due date, the copy ends up on loan and due four weeks after `today`.
    pub async fn loan_instance_on(
        &self,
        id: Uuid,
        form: LoanBookForm,
        today: NaiveDate,
    ) -> AppResult<BookInstanceDetails> {
        let instance = self.repository.instances.get_by_id(id).await?;
        if instance.status != LoanStatus::Available {
            return Err(AppError::BusinessRule(format!(
                "Book instance {} is {} and cannot be loaned",
                id, instance.status
            )));
        }

        if !self.repository.users.exists(form.borrower_id).await? {
            return Err(field_error(
                "borrower_id",
                "invalid_choice",
                format!("Borrower with id {} does not exist", form.borrower_id),
            ));
        }

        let due_back = due_back_from(today);
        let loaned = self
            .repository
            .instances
            .mark_on_loan(id, form.borrower_id, due_back)
            .await?;

        tracing::info!(
            "Loaned copy {} of '{}' to user id={} until {}",
            id,
            loaned.book_title,
            form.borrower_id,
            due_back
        );
        Ok(loaned)
    }

    /// Return an on-loan copy, making it available again
    pub async fn return_instance(&self, id: Uuid) -> AppResult<BookInstanceDetails> {
        let instance = self.repository.instances.get_by_id(id).await?;
        if instance.status != LoanStatus::OnLoan {
            return Err(AppError::BusinessRule(format!(
                "Book instance {} is {} and cannot be returned",
                id, instance.status
            )));
        }

        let returned = self.repository.instances.mark_returned(id).await?;
        tracing::info!("Returned copy {} of '{}'", id, returned.book_title);
        Ok(returned)
    }
}
