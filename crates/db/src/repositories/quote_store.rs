use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use quotedesk_core::domain::budget::BudgetCategory;
use quotedesk_core::domain::provider::CancellationTarget;
use quotedesk_core::domain::quote::{QuoteId, QuoteResponse, QuoteStatus};
use quotedesk_core::domain::request::{ProviderRequest, RequestId, RequestStatus};
use quotedesk_core::errors::{RemoteOperation, RemoteOperationError};
use quotedesk_core::normalize::normalize_provider_name;
use quotedesk_core::store::{CancelResult, NewQuoteRequest, QuoteStore, SupplierAssignment};

use super::{parse_decimal, parse_optional_decimal, parse_timestamp, RepositoryError};
use crate::DbPool;

const RESPONSE_COLUMNS: &str = "id, supplier_name, supplier_email, supplier_id, supplier_phone,
     total_price, amount, price, description, confidence, services_included,
     payment_terms, cancellation_policy, delivery_time, status, received_at";

/// SQLite-backed quote store: requests, responses, service slots and budget lines.
pub struct SqlQuoteStore {
    pool: DbPool,
}

impl SqlQuoteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn requests(&self, category: &str) -> Result<Vec<ProviderRequest>, RepositoryError> {
        let rows: Vec<SqliteRow> = sqlx::query(
            "SELECT id, supplier_name, supplier_email, status, sent_at
             FROM quote_request WHERE category = ? ORDER BY sent_at ASC, id ASC",
        )
        .bind(category)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_request).collect()
    }

    pub async fn responses(&self, category: &str) -> Result<Vec<QuoteResponse>, RepositoryError> {
        let rows: Vec<SqliteRow> = sqlx::query(&format!(
            "SELECT {RESPONSE_COLUMNS} FROM quote_response
             WHERE category = ? ORDER BY received_at ASC, id ASC"
        ))
        .bind(category)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_response).collect()
    }

    pub async fn find_response(
        &self,
        quote_id: &QuoteId,
    ) -> Result<Option<QuoteResponse>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {RESPONSE_COLUMNS} FROM quote_response WHERE id = ?"))
            .bind(&quote_id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_response).transpose()
    }

    /// Same as [`find_response`](Self::find_response) but only within `category`.
    pub async fn find_response_in(
        &self,
        category: &str,
        quote_id: &QuoteId,
    ) -> Result<Option<QuoteResponse>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {RESPONSE_COLUMNS} FROM quote_response WHERE id = ? AND category = ?"
        ))
        .bind(&quote_id.0)
        .bind(category)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_response).transpose()
    }

    pub async fn save_request(
        &self,
        category: &str,
        request: &ProviderRequest,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO quote_request (id, category, supplier_name, supplier_email, status, sent_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 category = excluded.category,
                 supplier_name = excluded.supplier_name,
                 supplier_email = excluded.supplier_email,
                 status = excluded.status,
                 sent_at = excluded.sent_at",
        )
        .bind(&request.id.0)
        .bind(category)
        .bind(&request.name)
        .bind(&request.email)
        .bind(request.status.as_str())
        .bind(request.sent_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn save_response(
        &self,
        category: &str,
        quote: &QuoteResponse,
    ) -> Result<(), RepositoryError> {
        let services = serde_json::to_string(&quote.services_included)
            .map_err(|error| RepositoryError::Decode(error.to_string()))?;

        sqlx::query(
            "INSERT INTO quote_response (id, category, supplier_name, supplier_email, supplier_id,
                                         supplier_phone, total_price, amount, price, description,
                                         confidence, services_included, payment_terms,
                                         cancellation_policy, delivery_time, status, received_at,
                                         updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 category = excluded.category,
                 supplier_name = excluded.supplier_name,
                 supplier_email = excluded.supplier_email,
                 supplier_id = excluded.supplier_id,
                 supplier_phone = excluded.supplier_phone,
                 total_price = excluded.total_price,
                 amount = excluded.amount,
                 price = excluded.price,
                 description = excluded.description,
                 confidence = excluded.confidence,
                 services_included = excluded.services_included,
                 payment_terms = excluded.payment_terms,
                 cancellation_policy = excluded.cancellation_policy,
                 delivery_time = excluded.delivery_time,
                 status = excluded.status,
                 received_at = excluded.received_at,
                 updated_at = excluded.updated_at",
        )
        .bind(&quote.id.0)
        .bind(category)
        .bind(&quote.supplier_name)
        .bind(&quote.supplier_email)
        .bind(&quote.supplier_id)
        .bind(&quote.supplier_phone)
        .bind(quote.total_price.map(|value| value.to_string()))
        .bind(quote.amount.map(|value| value.to_string()))
        .bind(quote.price.map(|value| value.to_string()))
        .bind(&quote.description)
        .bind(quote.confidence.map(i64::from))
        .bind(services)
        .bind(&quote.payment_terms)
        .bind(&quote.cancellation_policy)
        .bind(&quote.delivery_time)
        .bind(quote.status.as_str())
        .bind(quote.received_at.to_rfc3339())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn set_quote_status(
        &self,
        quote_id: &QuoteId,
        status: QuoteStatus,
        note: Option<&str>,
    ) -> Result<QuoteResponse, RepositoryError> {
        let result = sqlx::query(
            "UPDATE quote_response SET status = ?, status_note = ?, updated_at = ? WHERE id = ?",
        )
        .bind(status.as_str())
        .bind(note)
        .bind(Utc::now().to_rfc3339())
        .bind(&quote_id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(quote_id.0.clone()));
        }

        self.find_response(quote_id).await?.ok_or_else(|| RepositoryError::NotFound(quote_id.0.clone()))
    }

    /// Cancels every open request of the provider behind `target`.
    ///
    /// The provider is the one whose request carries `supplier_id`, matched by normalized name;
    /// any open request sent to `supplier_email` is cancelled as well. Only requests in
    /// `target.category` are touched.
    pub async fn cancel_requests(&self, target: &CancellationTarget) -> Result<u32, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let provider_key = match target.supplier_id.as_deref() {
            Some(request_id) => {
                sqlx::query_scalar::<_, String>(
                    "SELECT supplier_name FROM quote_request WHERE id = ? AND category = ?",
                )
                .bind(request_id)
                .bind(&target.category)
                .fetch_optional(&mut *tx)
                .await?
                .map(|name| normalize_provider_name(&name))
            }
            None => None,
        };

        let open: Vec<SqliteRow> = sqlx::query(
            "SELECT id, supplier_name, supplier_email FROM quote_request
             WHERE status != 'cancelled' AND category = ?",
        )
        .bind(&target.category)
        .fetch_all(&mut *tx)
        .await?;

        let mut cancelled = 0;
        for row in &open {
            let id: String = row.try_get("id")?;
            let name: String = row.try_get("supplier_name")?;
            let email: Option<String> = row.try_get("supplier_email")?;

            let same_provider = provider_key.as_deref() == Some(normalize_provider_name(&name).as_str());
            let same_email = target.supplier_email.is_some() && email == target.supplier_email;
            if !(same_provider || same_email) {
                continue;
            }

            sqlx::query("UPDATE quote_request SET status = 'cancelled' WHERE id = ?")
                .bind(&id)
                .execute(&mut *tx)
                .await?;
            cancelled += 1;
        }

        tx.commit().await?;
        Ok(cancelled)
    }

    pub async fn create_request(
        &self,
        request: &NewQuoteRequest,
    ) -> Result<ProviderRequest, RepositoryError> {
        let created = ProviderRequest {
            id: RequestId(Uuid::new_v4().to_string()),
            name: request.supplier_name.clone(),
            email: request.supplier_email.clone(),
            status: RequestStatus::Pending,
            sent_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO quote_request (id, category, supplier_name, supplier_email, supplier_ref,
                                        service, message, urgent, status, sent_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&created.id.0)
        .bind(&request.category)
        .bind(&request.supplier_name)
        .bind(&request.supplier_email)
        .bind(&request.supplier_id)
        .bind(&request.service)
        .bind(&request.message)
        .bind(request.urgent)
        .bind(created.status.as_str())
        .bind(created.sent_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(created)
    }

    pub async fn assign(
        &self,
        role: &str,
        assignment: &SupplierAssignment,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO service_assignment (role, supplier_id, supplier_name, supplier_email,
                                             supplier_phone, price, notes, status_label, assigned_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(role) DO UPDATE SET
                 supplier_id = excluded.supplier_id,
                 supplier_name = excluded.supplier_name,
                 supplier_email = excluded.supplier_email,
                 supplier_phone = excluded.supplier_phone,
                 price = excluded.price,
                 notes = excluded.notes,
                 status_label = excluded.status_label,
                 assigned_at = excluded.assigned_at",
        )
        .bind(role)
        .bind(&assignment.supplier_id)
        .bind(&assignment.supplier_name)
        .bind(&assignment.supplier_email)
        .bind(&assignment.supplier_phone)
        .bind(assignment.price.to_string())
        .bind(&assignment.notes)
        .bind(&assignment.status_label)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn assignments(&self) -> Result<Vec<(String, SupplierAssignment)>, RepositoryError> {
        let rows: Vec<SqliteRow> = sqlx::query(
            "SELECT role, supplier_id, supplier_name, supplier_email, supplier_phone, price,
                    notes, status_label
             FROM service_assignment ORDER BY role ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<_, RepositoryError> {
                let role: String = row.try_get("role")?;
                let assignment = SupplierAssignment {
                    supplier_id: row.try_get("supplier_id")?,
                    supplier_name: row.try_get("supplier_name")?,
                    supplier_email: row.try_get("supplier_email")?,
                    supplier_phone: row.try_get("supplier_phone")?,
                    price: parse_decimal("price", row.try_get("price")?)?,
                    notes: row.try_get("notes")?,
                    status_label: row.try_get("status_label")?,
                };
                Ok((role, assignment))
            })
            .collect()
    }

    pub async fn budget(&self) -> Result<Vec<BudgetCategory>, RepositoryError> {
        let rows: Vec<SqliteRow> =
            sqlx::query("SELECT name, amount FROM budget_category ORDER BY position ASC")
                .fetch_all(&self.pool)
                .await?;

        rows.iter()
            .map(|row| -> Result<_, RepositoryError> {
                Ok(BudgetCategory {
                    name: row.try_get("name")?,
                    amount: parse_decimal("amount", row.try_get("amount")?)?,
                })
            })
            .collect()
    }

    /// Replaces the whole budget; positions follow slice order.
    pub async fn replace_budget(&self, categories: &[BudgetCategory]) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM budget_category").execute(&mut *tx).await?;
        for (position, category) in categories.iter().enumerate() {
            sqlx::query("INSERT INTO budget_category (position, name, amount) VALUES (?, ?, ?)")
                .bind(position as i64)
                .bind(&category.name)
                .bind(category.amount.to_string())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Updates the `index`-th budget line in position order.
    pub async fn set_budget_amount(&self, index: usize, amount: Decimal) -> Result<(), RepositoryError> {
        let position: Option<i64> = sqlx::query_scalar(
            "SELECT position FROM budget_category ORDER BY position ASC LIMIT 1 OFFSET ?",
        )
        .bind(index as i64)
        .fetch_optional(&self.pool)
        .await?;

        let position =
            position.ok_or_else(|| RepositoryError::NotFound(format!("budget category #{index}")))?;

        sqlx::query("UPDATE budget_category SET amount = ? WHERE position = ?")
            .bind(amount.to_string())
            .bind(position)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

fn row_to_request(row: &SqliteRow) -> Result<ProviderRequest, RepositoryError> {
    let status: String = row.try_get("status")?;
    Ok(ProviderRequest {
        id: RequestId(row.try_get("id")?),
        name: row.try_get("supplier_name")?,
        email: row.try_get("supplier_email")?,
        status: RequestStatus::parse(&status),
        sent_at: parse_timestamp("sent_at", row.try_get("sent_at")?)?,
    })
}

fn row_to_response(row: &SqliteRow) -> Result<QuoteResponse, RepositoryError> {
    let confidence: Option<i64> = row.try_get("confidence")?;
    let confidence = confidence
        .map(|value| {
            u8::try_from(value).map_err(|_| {
                RepositoryError::Decode(format!("confidence `{value}` is out of range"))
            })
        })
        .transpose()?;
    let services: String = row.try_get("services_included")?;
    let services_included: Vec<String> = serde_json::from_str(&services)
        .map_err(|error| RepositoryError::Decode(format!("services_included: {error}")))?;
    let status: String = row.try_get("status")?;

    Ok(QuoteResponse {
        id: QuoteId(row.try_get("id")?),
        supplier_name: row.try_get("supplier_name")?,
        supplier_email: row.try_get("supplier_email")?,
        supplier_id: row.try_get("supplier_id")?,
        supplier_phone: row.try_get("supplier_phone")?,
        total_price: parse_optional_decimal("total_price", row.try_get("total_price")?)?,
        amount: parse_optional_decimal("amount", row.try_get("amount")?)?,
        price: parse_optional_decimal("price", row.try_get("price")?)?,
        description: row.try_get("description")?,
        confidence,
        services_included,
        payment_terms: row.try_get("payment_terms")?,
        cancellation_policy: row.try_get("cancellation_policy")?,
        delivery_time: row.try_get("delivery_time")?,
        received_at: parse_timestamp("received_at", row.try_get("received_at")?)?,
        status: QuoteStatus::parse(&status),
    })
}

#[async_trait::async_trait]
impl QuoteStore for SqlQuoteStore {
    async fn list_requests(
        &self,
        category: &str,
    ) -> Result<Vec<ProviderRequest>, RemoteOperationError> {
        self.requests(category).await.map_err(|error| error.into_remote(RemoteOperation::ListRequests))
    }

    async fn list_responses(
        &self,
        category: &str,
    ) -> Result<Vec<QuoteResponse>, RemoteOperationError> {
        self.responses(category)
            .await
            .map_err(|error| error.into_remote(RemoteOperation::ListResponses))
    }

    async fn update_quote_status(
        &self,
        quote_id: &QuoteId,
        status: QuoteStatus,
        note: Option<&str>,
    ) -> Result<QuoteResponse, RemoteOperationError> {
        self.set_quote_status(quote_id, status, note)
            .await
            .map_err(|error| error.into_remote(RemoteOperation::UpdateQuoteStatus))
    }

    async fn cancel_provider_requests(
        &self,
        target: &CancellationTarget,
    ) -> Result<CancelResult, RemoteOperationError> {
        self.cancel_requests(target)
            .await
            .map(|cancelled| CancelResult { cancelled })
            .map_err(|error| error.into_remote(RemoteOperation::CancelProviderRequests))
    }

    async fn create_quote_request(
        &self,
        request: &NewQuoteRequest,
    ) -> Result<ProviderRequest, RemoteOperationError> {
        self.create_request(request)
            .await
            .map_err(|error| error.into_remote(RemoteOperation::CreateQuoteRequest))
    }

    async fn assign_supplier_to_service(
        &self,
        role: &str,
        assignment: &SupplierAssignment,
    ) -> Result<(), RemoteOperationError> {
        self.assign(role, assignment)
            .await
            .map_err(|error| error.into_remote(RemoteOperation::AssignSupplier))
    }

    async fn budget_categories(&self) -> Result<Vec<BudgetCategory>, RemoteOperationError> {
        self.budget().await.map_err(|error| error.into_remote(RemoteOperation::ListBudgetCategories))
    }

    async fn update_budget_category(
        &self,
        index: usize,
        amount: Decimal,
    ) -> Result<(), RemoteOperationError> {
        self.set_budget_amount(index, amount)
            .await
            .map_err(|error| error.into_remote(RemoteOperation::UpdateBudgetCategory))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use quotedesk_core::domain::budget::BudgetCategory;
    use quotedesk_core::domain::provider::CancellationTarget;
    use quotedesk_core::domain::quote::{QuoteId, QuoteResponse, QuoteStatus};
    use quotedesk_core::domain::request::{ProviderRequest, RequestId, RequestStatus};
    use quotedesk_core::errors::RemoteOperationError;
    use quotedesk_core::store::{NewQuoteRequest, QuoteStore, SupplierAssignment};

    use super::SqlQuoteStore;
    use crate::{connect_with_settings, migrations};

    const CATEGORY: &str = "fotografia";

    async fn setup() -> SqlQuoteStore {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlQuoteStore::new(pool)
    }

    fn request(id: &str, name: &str, email: Option<&str>, minute: u32) -> ProviderRequest {
        ProviderRequest {
            id: RequestId(id.to_string()),
            name: name.to_string(),
            email: email.map(str::to_string),
            status: RequestStatus::Quoted,
            sent_at: Utc.with_ymd_and_hms(2026, 3, 1, 10, minute, 0).unwrap(),
        }
    }

    fn quote(id: &str, supplier: &str, total: Option<i64>) -> QuoteResponse {
        QuoteResponse {
            id: QuoteId(id.to_string()),
            supplier_name: supplier.to_string(),
            supplier_email: None,
            supplier_id: None,
            supplier_phone: Some("+34 600 000 000".to_string()),
            total_price: total.map(Decimal::from),
            amount: None,
            price: None,
            description: Some("Reportaje completo".to_string()),
            confidence: Some(92),
            services_included: vec!["album".to_string(), "drone".to_string()],
            payment_terms: Some("50% deposit".to_string()),
            cancellation_policy: None,
            delivery_time: Some("6 weeks".to_string()),
            received_at: Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap(),
            status: QuoteStatus::Received,
        }
    }

    #[tokio::test]
    async fn responses_keep_every_offer_field() {
        let store = setup().await;
        let offer = quote("q-1", "Foto Lux", Some(1200));
        store.save_response(CATEGORY, &offer).await.expect("save");

        let listed = store.list_responses(CATEGORY).await.expect("list");
        assert_eq!(listed, vec![offer]);
        assert!(store.list_responses("catering").await.expect("other category").is_empty());
    }

    #[tokio::test]
    async fn requests_are_listed_in_send_order() {
        let store = setup().await;
        store.save_request(CATEGORY, &request("r-2", "Luz Norte", None, 30)).await.expect("r-2");
        store.save_request(CATEGORY, &request("r-1", "Foto Lux", None, 5)).await.expect("r-1");

        let ids: Vec<String> = store
            .list_requests(CATEGORY)
            .await
            .expect("list")
            .into_iter()
            .map(|request| request.id.0)
            .collect();
        assert_eq!(ids, vec!["r-1".to_string(), "r-2".to_string()]);
    }

    #[tokio::test]
    async fn status_update_returns_the_stored_quote() {
        let store = setup().await;
        store.save_response(CATEGORY, &quote("q-1", "Foto Lux", None)).await.expect("save");

        let updated = store
            .update_quote_status(&QuoteId("q-1".to_string()), QuoteStatus::Rejected, Some("too far"))
            .await
            .expect("update");
        assert_eq!(updated.status, QuoteStatus::Rejected);

        let missing = store
            .update_quote_status(&QuoteId("q-404".to_string()), QuoteStatus::Accepted, None)
            .await;
        assert!(matches!(missing, Err(RemoteOperationError::NotFound { .. })));
    }

    #[tokio::test]
    async fn cancellation_matches_provider_name_and_email() {
        let store = setup().await;
        store
            .save_request(CATEGORY, &request("r-1", "Foto Lux", Some("hola@fotolux.es"), 1))
            .await
            .expect("r-1");
        store.save_request(CATEGORY, &request("r-2", "FOTO  LUX", None, 2)).await.expect("r-2");
        store
            .save_request("video", &request("r-3", "Lux Films", Some("hola@fotolux.es"), 3))
            .await
            .expect("r-3");
        store.save_request(CATEGORY, &request("r-4", "Luz Norte", None, 4)).await.expect("r-4");

        let target = CancellationTarget {
            category: CATEGORY.to_string(),
            supplier_id: Some("r-1".to_string()),
            supplier_email: Some("hola@fotolux.es".to_string()),
        };
        let result = store.cancel_provider_requests(&target).await.expect("cancel");
        assert_eq!(result.cancelled, 2);

        let again = store.cancel_provider_requests(&target).await.expect("cancel again");
        assert_eq!(again.cancelled, 0);

        let untouched = store.list_requests(CATEGORY).await.expect("list");
        let luz = untouched.iter().find(|request| request.id.0 == "r-4").expect("r-4 listed");
        assert_eq!(luz.status, RequestStatus::Quoted);

        let video = store.list_requests("video").await.expect("list video");
        assert_eq!(video[0].status, RequestStatus::Quoted, "other categories keep their requests");
    }

    #[tokio::test]
    async fn created_requests_start_pending() {
        let store = setup().await;
        let created = store
            .create_quote_request(&NewQuoteRequest {
                supplier_id: Some("sup-9".to_string()),
                supplier_name: "Flores Alba".to_string(),
                supplier_email: Some("alba@flores.es".to_string()),
                category: "flores".to_string(),
                service: "Flores".to_string(),
                message: "Quote request for Flores".to_string(),
                urgent: false,
            })
            .await
            .expect("create");

        let listed = store.list_requests("flores").await.expect("list");
        assert_eq!(listed, vec![created.clone()]);
        assert_eq!(created.status, RequestStatus::Pending);
    }

    #[tokio::test]
    async fn budget_lines_update_by_position() {
        let store = setup().await;
        store
            .replace_budget(&[
                BudgetCategory { name: "catering".to_string(), amount: Decimal::from(8000) },
                BudgetCategory { name: "fotografia".to_string(), amount: Decimal::from(1500) },
            ])
            .await
            .expect("budget");

        store.update_budget_category(1, Decimal::from(1200)).await.expect("update");
        let budget = store.budget_categories().await.expect("list");
        assert_eq!(budget[1].amount, Decimal::from(1200));
        assert_eq!(budget[0].amount, Decimal::from(8000));

        let out_of_range = store.update_budget_category(5, Decimal::ONE).await;
        assert!(matches!(out_of_range, Err(RemoteOperationError::NotFound { .. })));
    }

    #[tokio::test]
    async fn assigning_a_role_twice_keeps_the_latest_supplier() {
        let store = setup().await;
        let mut assignment = SupplierAssignment {
            supplier_id: "foto lux".to_string(),
            supplier_name: "Foto Lux".to_string(),
            supplier_email: None,
            supplier_phone: None,
            price: Decimal::from(1200),
            notes: "Quote accepted".to_string(),
            status_label: "contracted".to_string(),
        };
        store.assign_supplier_to_service("Fotografía", &assignment).await.expect("first");
        assignment.supplier_name = "Luz Norte".to_string();
        store.assign_supplier_to_service("Fotografía", &assignment).await.expect("second");

        let assignments = store.assignments().await.expect("list");
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].1.supplier_name, "Luz Norte");
    }
}
