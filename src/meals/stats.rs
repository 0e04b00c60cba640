use serde::Serialize;

use super::repo_types::{MealKind, MealRecord};

/// Charge per meal, in whole rupees.
pub const MEAL_PRICE: i64 = 250;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MealStats {
    pub total_meals: u32,
    pub paid_meals: u32,
    pub unpaid_meals: u32,
    pub total_due: i64,
    pub total_paid: i64,
    pub balance: i64,
}

/// Reduces a list of rows to meal and payment totals. Rows sharing a date are
/// counted independently.
pub fn compute_stats<'a>(records: impl IntoIterator<Item = &'a MealRecord>) -> MealStats {
    let (total_meals, paid_meals, unpaid_meals) =
        records.into_iter().fold((0u32, 0u32, 0u32), |(total, paid, unpaid), r| {
            (total + count_taken(r), paid + count_paid(r), unpaid + count_unpaid(r))
        });

    let total_due = i64::from(unpaid_meals) * MEAL_PRICE;
    MealStats {
        total_meals,
        paid_meals,
        unpaid_meals,
        total_due,
        total_paid: i64::from(paid_meals) * MEAL_PRICE,
        balance: total_due,
    }
}

pub fn count_taken(record: &MealRecord) -> u32 {
    count_where(record, |taken, _| taken)
}

/// Paid meals only count when the meal was taken.
pub fn count_paid(record: &MealRecord) -> u32 {
    count_where(record, |taken, paid| taken && paid)
}

pub fn count_unpaid(record: &MealRecord) -> u32 {
    count_where(record, |taken, paid| taken && !paid)
}

/// Number of meals in `record` for which `cond(taken, paid)` holds.
pub fn count_where(record: &MealRecord, cond: impl Fn(bool, bool) -> bool) -> u32 {
    MealKind::ALL
        .into_iter()
        .filter(|&k| cond(record.taken(k), record.paid(k)))
        .count() as u32
}

pub fn has_unpaid(record: &MealRecord) -> bool {
    count_unpaid(record) > 0
}
