use time::{Date, OffsetDateTime};
use tracing::{debug, info, warn};

use super::screen::MealScreen;
use crate::error::AppError;
use crate::meals::{
    format::format_currency,
    stats::{compute_stats, has_unpaid},
    MealGateway, MealKind, MealRecord, NewPayment, PaymentRecord,
};
use crate::notice::Notice;

/// Replaces the screen's rows with the owner's rows from the datastore.
pub async fn refresh(screen: &mut MealScreen, gateway: &dyn MealGateway) -> Result<(), AppError> {
    let token = screen.begin_fetch();
    match gateway.fetch_meals(screen.owner()).await {
        Ok(rows) => {
            debug!(owner = %screen.owner(), rows = rows.len(), "meals fetched");
            screen.complete_fetch(token, Ok(rows));
            Ok(())
        }
        Err(e) => {
            screen.complete_fetch(token, Err(format!("{e:#}")));
            Err(AppError::gateway("fetch meals")(e))
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Toggle {
    pub date: Date,
    pub kind: MealKind,
    pub taken: bool,
}

/// Optimistically flips one taken flag and writes it through. On failure the
/// screen is re-fetched so it shows what the datastore holds.
pub async fn toggle_meal(
    screen: &mut MealScreen,
    gateway: &dyn MealGateway,
    toggle: Toggle,
    seed_untouched: bool,
    now: OffsetDateTime,
) -> Result<Notice, AppError> {
    let Toggle { date, kind, taken } = toggle;
    let patch = screen.apply_toggle(date, kind, taken, seed_untouched, now);

    match gateway.upsert_meal(screen.owner(), date, patch).await {
        Ok(stored) => {
            info!(owner = %screen.owner(), %date, %kind, taken, "meal updated");
            screen.confirm_toggle(kind, stored);
            Ok(Notice::info("Success", "Meal updated successfully"))
        }
        Err(e) => {
            screen.fail_toggle(date, kind);
            if let Err(refetch) = refresh(screen, gateway).await {
                warn!(error = %refetch, "re-fetch after failed update also failed");
            }
            Err(AppError::gateway("update meal")(e))
        }
    }
}

#[derive(Debug)]
pub enum PaymentOutcome {
    NothingDue(Notice),
    Paid {
        payment: PaymentRecord,
        notice: Notice,
    },
}

/// Marks every taken, unpaid meal on the screen as paid and records one
/// ledger entry for the total.
///
/// The row update and the ledger insert are separate calls: if the insert
/// fails the rows stay paid and [`AppError::PartialPayment`] is returned.
pub async fn mark_all_paid(
    screen: &mut MealScreen,
    gateway: &dyn MealGateway,
    today: Date,
) -> Result<PaymentOutcome, AppError> {
    let unpaid: Vec<MealRecord> = screen
        .records()
        .iter()
        .filter(|r| has_unpaid(r))
        .cloned()
        .collect();
    if unpaid.is_empty() {
        return Ok(PaymentOutcome::NothingDue(Notice::info(
            "No unpaid meals",
            "All meals are already paid",
        )));
    }

    let updates: Vec<MealRecord> = unpaid.iter().map(MealRecord::settled).collect();
    gateway
        .bulk_upsert_meals(screen.owner(), &updates)
        .await
        .map_err(AppError::gateway("process payment"))?;
    screen.merge_rows(&updates);

    let settled = compute_stats(&unpaid);
    let payment = NewPayment {
        user_id: screen.owner(),
        amount: settled.total_due,
        meal_count: i32::try_from(settled.unpaid_meals).unwrap_or(i32::MAX),
        payment_date: today,
        description: Some(format!("Bulk payment for {} meals", settled.unpaid_meals)),
    };
    let payment = gateway
        .insert_payment(payment)
        .await
        .map_err(AppError::PartialPayment)?;

    info!(
        owner = %screen.owner(),
        meals = settled.unpaid_meals,
        amount = settled.total_due,
        "bulk payment recorded"
    );
    Ok(PaymentOutcome::Paid {
        payment,
        notice: Notice::info(
            "Payment successful",
            format!(
                "Marked {} meals as paid ({})",
                settled.unpaid_meals,
                format_currency(settled.total_due)
            ),
        ),
    })
}
