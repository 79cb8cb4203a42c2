//! Book instances repository: copy listings and loan state transitions

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        book_instance::{BookInstanceDetails, LoanStatus},
        Page,
    },
};

use super::is_foreign_key_violation;

const DETAILS_SELECT: &str = r#"
    SELECT bi.id, bi.book_id, b.title AS book_title, bi.status, bi.due_back,
           bi.borrower_id, u.username AS borrower_username
    FROM book_instances bi
    JOIN books b ON b.id = bi.book_id
    LEFT JOIN users u ON u.id = bi.borrower_id
"#;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InstancesRepository: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> AppResult<BookInstanceDetails>;

    /// On-loan copies borrowed by a user, soonest due first
    async fn list_on_loan_to(&self, user_id: i32, page: Page) -> AppResult<(Vec<BookInstanceDetails>, i64)>;

    /// Available copies ordered by book title
    async fn list_available(&self, page: Page) -> AppResult<(Vec<BookInstanceDetails>, i64)>;

    async fn create(&self, book_id: i32, status: LoanStatus) -> AppResult<BookInstanceDetails>;

    /// Move an available copy to on-loan. Fails with `BusinessRule` when the
    /// copy is no longer available at the time of the update.
    async fn mark_on_loan(&self, id: Uuid, borrower_id: i32, due_back: NaiveDate) -> AppResult<BookInstanceDetails>;

    /// Move an on-loan copy back to available, clearing due date and borrower
    async fn mark_returned(&self, id: Uuid) -> AppResult<BookInstanceDetails>;

    async fn count(&self) -> AppResult<i64>;

    async fn count_with_status(&self, status: LoanStatus) -> AppResult<i64>;
}

#[derive(Clone)]
pub struct PgInstancesRepository {
    pool: Pool<Postgres>,
}

impl PgInstancesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Lock the copy row and apply `update` only if it is in `expected` state
    async fn transition(
        &self,
        id: Uuid,
        expected: LoanStatus,
        update: sqlx::query::Query<'_, Postgres, sqlx::postgres::PgArguments>,
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let current: LoanStatus =
            sqlx::query_scalar("SELECT status FROM book_instances WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))?;

        if current != expected {
            return Err(AppError::BusinessRule(format!(
                "Book instance {} is {}, expected {}",
                id, current, expected
            )));
        }

        update.execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl InstancesRepository for PgInstancesRepository {
    async fn get_by_id(&self, id: Uuid) -> AppResult<BookInstanceDetails> {
        sqlx::query_as::<_, BookInstanceDetails>(&format!("{} WHERE bi.id = $1", DETAILS_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }

    async fn list_on_loan_to(&self, user_id: i32, page: Page) -> AppResult<(Vec<BookInstanceDetails>, i64)> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM book_instances WHERE borrower_id = $1 AND status = $2",
        )
        .bind(user_id)
        .bind(LoanStatus::OnLoan)
        .fetch_one(&self.pool)
        .await?;

        let instances = sqlx::query_as::<_, BookInstanceDetails>(&format!(
            r#"{}
            WHERE bi.borrower_id = $1 AND bi.status = $2
            ORDER BY bi.due_back ASC NULLS LAST, bi.id
            LIMIT $3 OFFSET $4
            "#,
            DETAILS_SELECT
        ))
        .bind(user_id)
        .bind(LoanStatus::OnLoan)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((instances, total))
    }

    async fn list_available(&self, page: Page) -> AppResult<(Vec<BookInstanceDetails>, i64)> {
        let total = self.count_with_status(LoanStatus::Available).await?;

        let instances = sqlx::query_as::<_, BookInstanceDetails>(&format!(
            r#"{}
            WHERE bi.status = $1
            ORDER BY b.title ASC, bi.id
            LIMIT $2 OFFSET $3
            "#,
            DETAILS_SELECT
        ))
        .bind(LoanStatus::Available)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((instances, total))
    }

    async fn create(&self, book_id: i32, status: LoanStatus) -> AppResult<BookInstanceDetails> {
        let id = Uuid::new_v4();

        sqlx::query("INSERT INTO book_instances (id, book_id, status) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(book_id)
            .bind(status)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    AppError::NotFound(format!("Book with id {} not found", book_id))
                } else {
                    e.into()
                }
            })?;

        self.get_by_id(id).await
    }

    async fn mark_on_loan(&self, id: Uuid, borrower_id: i32, due_back: NaiveDate) -> AppResult<BookInstanceDetails> {
        let update = sqlx::query(
            "UPDATE book_instances SET status = $1, due_back = $2, borrower_id = $3 WHERE id = $4",
        )
        .bind(LoanStatus::OnLoan)
        .bind(due_back)
        .bind(borrower_id)
        .bind(id);

        self.transition(id, LoanStatus::Available, update).await?;
        self.get_by_id(id).await
    }

    async fn mark_returned(&self, id: Uuid) -> AppResult<BookInstanceDetails> {
        let update = sqlx::query(
            "UPDATE book_instances SET status = $1, due_back = NULL, borrower_id = NULL WHERE id = $2",
        )
        .bind(LoanStatus::Available)
        .bind(id);

        self.transition(id, LoanStatus::OnLoan, update).await?;
        self.get_by_id(id).await
    }

    async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_instances")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_with_status(&self, status: LoanStatus) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_instances WHERE status = $1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
