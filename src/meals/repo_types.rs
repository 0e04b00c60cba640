use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::format::iso_date;

/// One of the three daily meal periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealKind {
    Breakfast,
    Lunch,
    Dinner,
}

impl MealKind {
    pub const ALL: [MealKind; 3] = [MealKind::Breakfast, MealKind::Lunch, MealKind::Dinner];

    pub fn label(self) -> &'static str {
        match self {
            MealKind::Breakfast => "Breakfast",
            MealKind::Lunch => "Lunch",
            MealKind::Dinner => "Dinner",
        }
    }
}

impl fmt::Display for MealKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MealKind::Breakfast => f.write_str("breakfast"),
            MealKind::Lunch => f.write_str("lunch"),
            MealKind::Dinner => f.write_str("dinner"),
        }
    }
}

impl FromStr for MealKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "breakfast" => Ok(MealKind::Breakfast),
            "lunch" => Ok(MealKind::Lunch),
            "dinner" => Ok(MealKind::Dinner),
            other => Err(format!("unknown meal '{other}'")),
        }
    }
}

/// Row of the `meals` table: one per (owner, date).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct MealRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(with = "iso_date")]
    pub date: Date,
    pub breakfast: bool,
    pub lunch: bool,
    pub dinner: bool,
    pub breakfast_paid: bool,
    pub lunch_paid: bool,
    pub dinner_paid: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl MealRecord {
    /// Fresh record with every flag cleared.
    pub fn new(user_id: Uuid, date: Date, now: OffsetDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            date,
            breakfast: false,
            lunch: false,
            dinner: false,
            breakfast_paid: false,
            lunch_paid: false,
            dinner_paid: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn taken(&self, kind: MealKind) -> bool {
        match kind {
            MealKind::Breakfast => self.breakfast,
            MealKind::Lunch => self.lunch,
            MealKind::Dinner => self.dinner,
        }
    }

    pub fn paid(&self, kind: MealKind) -> bool {
        match kind {
            MealKind::Breakfast => self.breakfast_paid,
            MealKind::Lunch => self.lunch_paid,
            MealKind::Dinner => self.dinner_paid,
        }
    }

    pub fn set_taken(&mut self, kind: MealKind, value: bool) {
        match kind {
            MealKind::Breakfast => self.breakfast = value,
            MealKind::Lunch => self.lunch = value,
            MealKind::Dinner => self.dinner = value,
        }
    }

    pub fn set_paid(&mut self, kind: MealKind, value: bool) {
        match kind {
            MealKind::Breakfast => self.breakfast_paid = value,
            MealKind::Lunch => self.lunch_paid = value,
            MealKind::Dinner => self.dinner_paid = value,
        }
    }

    /// Merges the fields present in `patch`, leaving the rest untouched.
    pub fn apply(&mut self, patch: &MealPatch) {
        for kind in MealKind::ALL {
            if let Some(v) = patch.taken(kind) {
                self.set_taken(kind, v);
            }
            if let Some(v) = patch.paid(kind) {
                self.set_paid(kind, v);
            }
        }
    }

    /// Same row with every taken meal marked paid.
    pub fn settled(&self) -> Self {
        let mut next = self.clone();
        for kind in MealKind::ALL {
            if next.taken(kind) {
                next.set_paid(kind, true);
            }
        }
        next
    }
}

/// Partial update for a meal row. `None` keeps the stored value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakfast: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lunch: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dinner: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakfast_paid: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lunch_paid: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dinner_paid: Option<bool>,
}

impl MealPatch {
    pub fn taken(&self, kind: MealKind) -> Option<bool> {
        match kind {
            MealKind::Breakfast => self.breakfast,
            MealKind::Lunch => self.lunch,
            MealKind::Dinner => self.dinner,
        }
    }

    pub fn paid(&self, kind: MealKind) -> Option<bool> {
        match kind {
            MealKind::Breakfast => self.breakfast_paid,
            MealKind::Lunch => self.lunch_paid,
            MealKind::Dinner => self.dinner_paid,
        }
    }

    pub fn with_taken(mut self, kind: MealKind, value: bool) -> Self {
        match kind {
            MealKind::Breakfast => self.breakfast = Some(value),
            MealKind::Lunch => self.lunch = Some(value),
            MealKind::Dinner => self.dinner = Some(value),
        }
        self
    }

    /// Patch for the first toggle on a date with no row yet: the toggled meal
    /// gets `value`, the other two get `untouched`.
    pub fn first_toggle(kind: MealKind, value: bool, untouched: bool) -> Self {
        MealKind::ALL.into_iter().fold(Self::default(), |patch, k| {
            patch.with_taken(k, if k == kind { value } else { untouched })
        })
    }
}

/// Row of the append-only `payments` ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PaymentRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: i64,
    pub meal_count: i32,
    #[serde(with = "iso_date")]
    pub payment_date: Date,
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPayment {
    pub user_id: Uuid,
    pub amount: i64,
    pub meal_count: i32,
    pub payment_date: Date,
    pub description: Option<String>,
}
