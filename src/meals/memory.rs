use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::repo::MealGateway;
use super::repo_types::{MealPatch, MealRecord, NewPayment, PaymentRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Fetch,
    Upsert,
    BulkUpsert,
    InsertPayment,
}

/// In-process stand-in for the hosted tables, with per-operation failure switches.
#[derive(Default)]
pub struct MemoryGateway {
    meals: Mutex<Vec<MealRecord>>,
    payments: Mutex<Vec<PaymentRecord>>,
    failing: Mutex<HashSet<Op>>,
}

impl MemoryGateway {
    pub fn with_rows(rows: Vec<MealRecord>) -> Self {
        let gw = Self::default();
        *gw.meals.lock().unwrap() = rows;
        gw
    }

    pub fn fail(&self, op: Op, failing: bool) {
        let mut set = self.failing.lock().unwrap();
        if failing {
            set.insert(op);
        } else {
            set.remove(&op);
        }
    }

    pub fn rows(&self, owner: Uuid) -> Vec<MealRecord> {
        let mut rows: Vec<_> = self
            .meals
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == owner)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        rows
    }

    pub fn payments(&self) -> Vec<PaymentRecord> {
        self.payments.lock().unwrap().clone()
    }

    fn check(&self, op: Op) -> anyhow::Result<()> {
        if self.failing.lock().unwrap().contains(&op) {
            anyhow::bail!("simulated {op:?} failure");
        }
        Ok(())
    }
}

#[async_trait]
impl MealGateway for MemoryGateway {
    async fn fetch_meals(&self, owner: Uuid) -> anyhow::Result<Vec<MealRecord>> {
        self.check(Op::Fetch)?;
        Ok(self.rows(owner))
    }

    async fn upsert_meal(
        &self,
        owner: Uuid,
        date: Date,
        patch: MealPatch,
    ) -> anyhow::Result<MealRecord> {
        self.check(Op::Upsert)?;
        let now = OffsetDateTime::now_utc();
        let mut meals = self.meals.lock().unwrap();
        if let Some(existing) = meals.iter_mut().find(|r| r.user_id == owner && r.date == date) {
            existing.apply(&patch);
            existing.updated_at = now;
            return Ok(existing.clone());
        }
        let mut row = MealRecord::new(owner, date, now);
        row.apply(&patch);
        meals.push(row.clone());
        Ok(row)
    }

    async fn bulk_upsert_meals(&self, owner: Uuid, rows: &[MealRecord]) -> anyhow::Result<()> {
        self.check(Op::BulkUpsert)?;
        let mut meals = self.meals.lock().unwrap();
        for row in rows {
            let mut row = row.clone();
            row.user_id = owner;
            match meals.iter_mut().find(|r| r.user_id == owner && r.date == row.date) {
                Some(existing) => {
                    row.id = existing.id;
                    row.created_at = existing.created_at;
                    *existing = row;
                }
                None => meals.push(row),
            }
        }
        Ok(())
    }

    async fn insert_payment(&self, payment: NewPayment) -> anyhow::Result<PaymentRecord> {
        self.check(Op::InsertPayment)?;
        let record = PaymentRecord {
            id: Uuid::new_v4(),
            user_id: payment.user_id,
            amount: payment.amount,
            meal_count: payment.meal_count,
            payment_date: payment.payment_date,
            description: payment.description,
            created_at: OffsetDateTime::now_utc(),
        };
        self.payments.lock().unwrap().push(record.clone());
        Ok(record)
    }
}
