use serde::{Deserialize, Serialize};
use time::Date;

use super::reconcile::SyncState;
use super::screen::MealScreen;
use crate::auth::Session;
use crate::meals::{
    format::{format_currency, format_date, iso_date},
    stats::{count_paid, count_taken, MealStats, MEAL_PRICE},
    MealKind, MealRecord, PaymentRecord,
};
use crate::notice::Notice;

#[derive(Debug, Serialize)]
pub struct StatsView {
    #[serde(flatten)]
    pub stats: MealStats,
    pub total_due_display: String,
    pub total_paid_display: String,
    pub balance_display: String,
}

impl From<MealStats> for StatsView {
    fn from(stats: MealStats) -> Self {
        Self {
            total_due_display: format_currency(stats.total_due),
            total_paid_display: format_currency(stats.total_paid),
            balance_display: format_currency(stats.balance),
            stats,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MealSlot {
    pub kind: MealKind,
    pub label: &'static str,
    pub taken: bool,
    pub paid: bool,
    /// A write for this flag has not been confirmed yet.
    pub pending: bool,
}

fn slots(screen: &MealScreen, date: Date, record: Option<&MealRecord>) -> Vec<MealSlot> {
    MealKind::ALL
        .into_iter()
        .map(|kind| MealSlot {
            kind,
            label: kind.label(),
            taken: record.is_some_and(|r| r.taken(kind)),
            paid: record.is_some_and(|r| r.paid(kind)),
            pending: matches!(screen.sync_state(date, kind), SyncState::Pending { .. }),
        })
        .collect()
}

fn meal_badge(count: u32) -> String {
    if count == 1 {
        "1 meal".to_string()
    } else {
        format!("{count} meals")
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub greeting: String,
    pub stats: StatsView,
    /// Taken meals for today; empty when nothing is recorded.
    pub today: Vec<MealSlot>,
    pub today_recorded: bool,
    pub quick_report_hint: Option<String>,
}

impl DashboardView {
    pub fn build(session: &Session, screen: &MealScreen, today: Date) -> Self {
        let record = screen.record_for(today);
        let today_meals = match record {
            Some(r) => slots(screen, today, Some(r))
                .into_iter()
                .filter(|s| s.taken)
                .collect(),
            None => Vec::new(),
        };
        Self {
            greeting: format!("Welcome back, {}", session.first_name()),
            stats: screen.stats().into(),
            today: today_meals,
            today_recorded: record.is_some(),
            quick_report_hint: screen
                .records()
                .is_empty()
                .then(|| "Record meals on the calendar to generate reports".to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CalendarDay {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub label: String,
    pub badge: String,
    pub meals: Vec<MealSlot>,
}

impl CalendarDay {
    fn for_date(screen: &MealScreen, date: Date) -> Self {
        let record = screen.record_for(date);
        Self {
            date,
            label: format_date(date),
            badge: meal_badge(record.map(count_taken).unwrap_or(0)),
            meals: slots(screen, date, record),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CalendarView {
    pub days: Vec<CalendarDay>,
}

impl CalendarView {
    /// One entry per day from `start` through `today`, newest first.
    pub fn build(screen: &MealScreen, start: Date, today: Date) -> Self {
        let mut days = Vec::new();
        let mut day = today;
        while day >= start {
            days.push(CalendarDay::for_date(screen, day));
            match day.previous_day() {
                Some(prev) => day = prev,
                None => break,
            }
        }
        Self { days }
    }
}

#[derive(Debug, Serialize)]
pub struct LogEntry {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub label: String,
    /// Taken meals only.
    pub meals: Vec<MealSlot>,
    pub summary: String,
    pub paid_amount: String,
    pub due_amount: String,
}

#[derive(Debug, Serialize)]
pub struct PaymentPrompt {
    pub unpaid_meals: u32,
    pub total_due: i64,
    pub label: String,
}

#[derive(Debug, Serialize)]
pub struct LogView {
    pub stats: StatsView,
    pub entries: Vec<LogEntry>,
    pub payment_prompt: Option<PaymentPrompt>,
}

impl LogView {
    pub fn build(screen: &MealScreen) -> Self {
        let entries = screen
            .records()
            .iter()
            .map(|r| {
                let taken = count_taken(r);
                let paid = count_paid(r);
                LogEntry {
                    date: r.date,
                    label: format_date(r.date),
                    meals: slots(screen, r.date, Some(r))
                        .into_iter()
                        .filter(|s| s.taken)
                        .collect(),
                    summary: if taken == 0 {
                        "No meals".to_string()
                    } else {
                        format!("{taken} meals total")
                    },
                    paid_amount: format_currency(i64::from(paid) * MEAL_PRICE),
                    due_amount: format_currency(i64::from(taken - paid) * MEAL_PRICE),
                }
            })
            .collect();

        let stats = screen.stats();
        let payment_prompt = (stats.unpaid_meals > 0).then(|| PaymentPrompt {
            unpaid_meals: stats.unpaid_meals,
            total_due: stats.total_due,
            label: format!("Mark All as Paid ({})", format_currency(stats.total_due)),
        });
        Self {
            stats: stats.into(),
            entries,
            payment_prompt,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub taken: bool,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub notice: Notice,
    pub day: CalendarDay,
}

impl ToggleResponse {
    pub fn build(screen: &MealScreen, date: Date, notice: Notice) -> Self {
        Self {
            notice,
            day: CalendarDay::for_date(screen, date),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub notice: Notice,
    pub payment: Option<PaymentRecord>,
    pub stats: StatsView,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};
    use uuid::Uuid;

    fn session(name: Option<&str>) -> Session {
        Session {
            owner: Uuid::new_v4(),
            email: None,
            display_name: name.map(str::to_string),
            avatar_url: None,
        }
    }

    fn loaded(session: &Session, rows: Vec<MealRecord>) -> MealScreen {
        let mut screen = MealScreen::new(session);
        let token = screen.begin_fetch();
        screen.complete_fetch(token, Ok(rows));
        screen
    }

    fn row(owner: Uuid, date: Date, taken: [bool; 3], paid: [bool; 3]) -> MealRecord {
        let mut r = MealRecord::new(owner, date, datetime!(2024-05-02 08:00 UTC));
        for (i, kind) in MealKind::ALL.into_iter().enumerate() {
            r.set_taken(kind, taken[i]);
            r.set_paid(kind, paid[i]);
        }
        r
    }

    #[test]
    fn dashboard_greets_by_first_name_and_lists_today() {
        let s = session(Some("Asha Rao"));
        let today = date!(2024-05-06);
        let screen = loaded(
            &s,
            vec![row(s.owner, today, [true, false, true], [true, false, false])],
        );
        let view = DashboardView::build(&s, &screen, today);
        assert_eq!(view.greeting, "Welcome back, Asha");
        assert!(view.today_recorded);
        let kinds: Vec<_> = view.today.iter().map(|m| (m.kind, m.paid)).collect();
        assert_eq!(kinds, vec![(MealKind::Breakfast, true), (MealKind::Dinner, false)]);
        assert_eq!(view.stats.total_due_display, "Rs.250");
        assert!(view.quick_report_hint.is_none());
    }

    #[test]
    fn empty_dashboard_falls_back_to_user() {
        let s = session(None);
        let screen = loaded(&s, vec![]);
        let view = DashboardView::build(&s, &screen, date!(2024-05-06));
        assert_eq!(view.greeting, "Welcome back, User");
        assert!(!view.today_recorded);
        assert!(view.quick_report_hint.is_some());
    }

    #[test]
    fn calendar_runs_newest_first_from_start() {
        let s = session(None);
        let screen = loaded(
            &s,
            vec![row(s.owner, date!(2024-05-03), [true, false, false], [false; 3])],
        );
        let view = CalendarView::build(&screen, date!(2024-05-02), date!(2024-05-04));
        let dates: Vec<_> = view.days.iter().map(|d| d.date).collect();
        assert_eq!(dates, vec![date!(2024-05-04), date!(2024-05-03), date!(2024-05-02)]);
        assert_eq!(view.days[0].badge, "0 meals");
        assert_eq!(view.days[1].badge, "1 meal");
        assert_eq!(view.days[1].label, "3 May 2024");
        assert!(view.days[1].meals[0].taken);
        assert_eq!(view.days[1].meals.len(), 3);
    }

    #[test]
    fn calendar_before_start_is_empty() {
        let s = session(None);
        let screen = loaded(&s, vec![]);
        let view = CalendarView::build(&screen, date!(2024-05-02), date!(2024-05-01));
        assert!(view.days.is_empty());
    }

    #[test]
    fn log_shows_daily_amounts_and_prompt() {
        let s = session(None);
        let screen = loaded(
            &s,
            vec![
                row(s.owner, date!(2024-05-02), [true, true, false], [true, false, false]),
                row(s.owner, date!(2024-05-03), [false; 3], [false; 3]),
            ],
        );
        let view = LogView::build(&screen);
        assert_eq!(view.entries[0].date, date!(2024-05-03));
        assert_eq!(view.entries[0].summary, "No meals");
        assert_eq!(view.entries[1].summary, "2 meals total");
        assert_eq!(view.entries[1].paid_amount, "Rs.250");
        assert_eq!(view.entries[1].due_amount, "Rs.250");
        let prompt = view.payment_prompt.expect("unpaid meals prompt");
        assert_eq!(prompt.unpaid_meals, 1);
        assert_eq!(prompt.label, "Mark All as Paid (Rs.250)");
    }

    #[test]
    fn settled_log_has_no_prompt() {
        let s = session(None);
        let screen = loaded(
            &s,
            vec![row(s.owner, date!(2024-05-02), [true; 3], [true; 3])],
        );
        assert!(LogView::build(&screen).payment_prompt.is_none());
    }
}
