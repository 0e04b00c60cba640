use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use time::Date;
use uuid::Uuid;

use super::repo_types::{MealPatch, MealRecord, NewPayment, PaymentRecord};

const MEAL_COLUMNS: &str = "id, user_id, date, breakfast, lunch, dinner, \
     breakfast_paid, lunch_paid, dinner_paid, created_at, updated_at";

/// Access to the hosted `meals` and `payments` tables, always scoped to one owner.
#[async_trait]
pub trait MealGateway: Send + Sync {
    /// All rows of `owner`, newest date first.
    async fn fetch_meals(&self, owner: Uuid) -> anyhow::Result<Vec<MealRecord>>;

    /// Inserts the (owner, date) row or merges `patch` into the existing one.
    async fn upsert_meal(&self, owner: Uuid, date: Date, patch: MealPatch)
        -> anyhow::Result<MealRecord>;

    /// Full-row upsert of many rows in one call. Rows are written under `owner`
    /// whatever their `user_id` says.
    async fn bulk_upsert_meals(&self, owner: Uuid, rows: &[MealRecord]) -> anyhow::Result<()>;

    async fn insert_payment(&self, payment: NewPayment) -> anyhow::Result<PaymentRecord>;
}

#[derive(Clone)]
pub struct PgMealGateway {
    db: PgPool,
}

impl PgMealGateway {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MealGateway for PgMealGateway {
    async fn fetch_meals(&self, owner: Uuid) -> anyhow::Result<Vec<MealRecord>> {
        let rows = sqlx::query_as::<_, MealRecord>(&format!(
            r#"
            SELECT {MEAL_COLUMNS}
            FROM meals
            WHERE user_id = $1
            ORDER BY date DESC
            "#
        ))
        .bind(owner)
        .fetch_all(&self.db)
        .await
        .context("fetch meals")?;
        Ok(rows)
    }

    async fn upsert_meal(
        &self,
        owner: Uuid,
        date: Date,
        patch: MealPatch,
    ) -> anyhow::Result<MealRecord> {
        let row = sqlx::query_as::<_, MealRecord>(&format!(
            r#"
            INSERT INTO meals (user_id, date, breakfast, lunch, dinner,
                               breakfast_paid, lunch_paid, dinner_paid)
            VALUES ($1, $2,
                    COALESCE($3, FALSE), COALESCE($4, FALSE), COALESCE($5, FALSE),
                    COALESCE($6, FALSE), COALESCE($7, FALSE), COALESCE($8, FALSE))
            ON CONFLICT (user_id, date) DO UPDATE SET
                breakfast      = COALESCE($3, meals.breakfast),
                lunch          = COALESCE($4, meals.lunch),
                dinner         = COALESCE($5, meals.dinner),
                breakfast_paid = COALESCE($6, meals.breakfast_paid),
                lunch_paid     = COALESCE($7, meals.lunch_paid),
                dinner_paid    = COALESCE($8, meals.dinner_paid),
                updated_at     = now()
            RETURNING {MEAL_COLUMNS}
            "#
        ))
        .bind(owner)
        .bind(date)
        .bind(patch.breakfast)
        .bind(patch.lunch)
        .bind(patch.dinner)
        .bind(patch.breakfast_paid)
        .bind(patch.lunch_paid)
        .bind(patch.dinner_paid)
        .fetch_one(&self.db)
        .await
        .with_context(|| format!("upsert meal {date}"))?;
        Ok(row)
    }

    async fn bulk_upsert_meals(&self, owner: Uuid, rows: &[MealRecord]) -> anyhow::Result<()> {
        let mut tx = self.db.begin().await.context("begin tx")?;
        for row in rows {
            upsert_full_row_tx(&mut tx, owner, row).await?;
        }
        tx.commit().await.context("commit tx")?;
        Ok(())
    }

    async fn insert_payment(&self, payment: NewPayment) -> anyhow::Result<PaymentRecord> {
        let row = sqlx::query_as::<_, PaymentRecord>(
            r#"
            INSERT INTO payments (user_id, amount, meal_count, payment_date, description)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, amount, meal_count, payment_date, description, created_at
            "#,
        )
        .bind(payment.user_id)
        .bind(payment.amount)
        .bind(payment.meal_count)
        .bind(payment.payment_date)
        .bind(payment.description)
        .fetch_one(&self.db)
        .await
        .context("insert payment")?;
        Ok(row)
    }
}

async fn upsert_full_row_tx(
    tx: &mut Transaction<'_, Postgres>,
    owner: Uuid,
    row: &MealRecord,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO meals (id, user_id, date, breakfast, lunch, dinner,
                           breakfast_paid, lunch_paid, dinner_paid)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (user_id, date) DO UPDATE SET
            breakfast      = EXCLUDED.breakfast,
            lunch          = EXCLUDED.lunch,
            dinner         = EXCLUDED.dinner,
            breakfast_paid = EXCLUDED.breakfast_paid,
            lunch_paid     = EXCLUDED.lunch_paid,
            dinner_paid    = EXCLUDED.dinner_paid,
            updated_at     = now()
        "#,
    )
    .bind(row.id)
    .bind(owner)
    .bind(row.date)
    .bind(row.breakfast)
    .bind(row.lunch)
    .bind(row.dinner)
    .bind(row.breakfast_paid)
    .bind(row.lunch_paid)
    .bind(row.dinner_paid)
    .execute(&mut **tx)
    .await
    .with_context(|| format!("bulk upsert meal {}", row.date))?;
    Ok(())
}
