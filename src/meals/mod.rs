pub mod format;
#[cfg(test)]
pub mod memory;
pub mod repo;
pub mod repo_types;
pub mod stats;

pub use repo::{MealGateway, PgMealGateway};
pub use repo_types::{MealKind, MealPatch, MealRecord, NewPayment, PaymentRecord};
