//! Plain-text meal reports.
//!
//! Every report goes through the same pipeline: keep the rows that have at
//! least one meal matching the report's condition (optionally inside a date
//! window), sort them oldest first, total them, and render a fixed layout with
//! a tab-separated daily table. Variants differ only in their
//! [`ReportTemplate`].

use std::fmt;

use time::{Date, Duration, OffsetDateTime};

use crate::meals::{
    format::{format_currency, format_date, format_timestamp},
    stats::{compute_stats, count_where, MealStats, MEAL_PRICE},
    MealKind, MealRecord,
};
use crate::notice::Notice;

/// Longest window accepted for a "last N days" report.
pub const MAX_RECENT_DAYS: u32 = 366;

const UTF8_BOM: &str = "\u{feff}";

pub type MealCondition = fn(taken: bool, paid: bool) -> bool;
pub type SummarySelector = fn(&MealStats) -> Vec<(&'static str, String)>;

pub struct ReportTemplate {
    pub title: String,
    pub filename: String,
    /// Which meals the report is about; drives row selection, the row count
    /// and the `Y` marker.
    pub matches: MealCondition,
    /// Inclusive at both ends.
    pub window: Option<(Date, Date)>,
    pub summary: SummarySelector,
    pub footer: Option<String>,
    /// Keep rows inside the window that have no matching meal.
    pub keep_idle_days: bool,
    /// Shown instead of a report when no row qualifies.
    pub empty_message: String,
}

impl fmt::Debug for ReportTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportTemplate")
            .field("title", &self.title)
            .field("filename", &self.filename)
            .field("window", &self.window)
            .field("footer", &self.footer)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub filename: String,
    pub body: String,
}

impl Report {
    /// File contents as downloaded: UTF-8 with a byte-order mark.
    pub fn download_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(UTF8_BOM.len() + self.body.len());
        bytes.extend_from_slice(UTF8_BOM.as_bytes());
        bytes.extend_from_slice(self.body.as_bytes());
        bytes
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    Ready(Report),
    Empty(Notice),
}

fn unpaid(taken: bool, paid: bool) -> bool {
    taken && !paid
}

fn paid(taken: bool, paid: bool) -> bool {
    taken && paid
}

fn taken(taken: bool, _paid: bool) -> bool {
    taken
}

impl ReportTemplate {
    pub fn unpaid() -> Self {
        Self {
            title: "UNPAID MEALS REPORT".into(),
            filename: "unpaid-meals-report.txt".into(),
            matches: unpaid,
            window: None,
            summary: |s| {
                vec![
                    ("Meals", s.unpaid_meals.to_string()),
                    ("Balance", format_currency(s.total_due)),
                ]
            },
            footer: None,
            keep_idle_days: false,
            empty_message: "No unpaid meals found".into(),
        }
    }

    pub fn paid() -> Self {
        Self {
            title: "PAID MEALS REPORT".into(),
            filename: "paid-meals-report.txt".into(),
            matches: paid,
            window: None,
            summary: |s| {
                vec![
                    ("Meals", s.paid_meals.to_string()),
                    ("Amount", format_currency(s.total_paid)),
                ]
            },
            footer: None,
            keep_idle_days: false,
            empty_message: "No paid meals found".into(),
        }
    }

    /// Every taken meal between `start` and `end`, both included.
    /// Callers check `start <= end`.
    pub fn range(start: Date, end: Date) -> Self {
        Self {
            title: "DAILY MEAL TRACKER REPORT".into(),
            filename: format!("meal-report-{start}-to-{end}.txt"),
            matches: taken,
            window: Some((start, end)),
            summary: |s| {
                vec![
                    ("Meals", s.total_meals.to_string()),
                    ("Balance", format_currency(s.balance)),
                ]
            },
            footer: None,
            keep_idle_days: false,
            empty_message: "No meals found in the selected date range".into(),
        }
    }

    /// The `days` most recent days ending with `today`.
    pub fn recent(days: u32, today: Date) -> Self {
        let start = today - Duration::days(i64::from(days.max(1)) - 1);
        Self {
            title: format!("MEAL REPORT - LAST {days} DAYS"),
            filename: format!("quick-meal-report-{days}days.txt"),
            matches: taken,
            window: Some((start, today)),
            summary: |s| {
                vec![
                    ("Total Meals", s.total_meals.to_string()),
                    ("Amount Due", format_currency(s.total_due)),
                    ("Amount Paid", format_currency(s.total_paid)),
                ]
            },
            footer: Some(format!("Rate: {} per meal", format_currency(MEAL_PRICE))),
            keep_idle_days: true,
            empty_message: format!("No meals found in the last {days} days"),
        }
    }

    fn in_window(&self, date: Date) -> bool {
        self.window
            .map_or(true, |(start, end)| start <= date && date <= end)
    }

    fn marker(&self, record: &MealRecord, kind: MealKind) -> char {
        let (taken, paid) = (record.taken(kind), record.paid(kind));
        if taken && (self.matches)(taken, paid) {
            'Y'
        } else if taken {
            '-'
        } else {
            'N'
        }
    }

    pub fn build(&self, records: &[MealRecord], generated_at: OffsetDateTime) -> ReportOutcome {
        let mut rows: Vec<&MealRecord> = records
            .iter()
            .filter(|r| {
                self.in_window(r.date)
                    && (self.keep_idle_days || count_where(r, self.matches) > 0)
            })
            .collect();
        if rows.is_empty() {
            return ReportOutcome::Empty(Notice::info("No data", self.empty_message.clone()));
        }
        rows.sort_by_key(|r| r.date);

        let stats = compute_stats(rows.iter().copied());
        ReportOutcome::Ready(Report {
            filename: self.filename.clone(),
            body: self.render(&rows, &stats, generated_at),
        })
    }

    fn render(&self, rows: &[&MealRecord], stats: &MealStats, generated_at: OffsetDateTime) -> String {
        let mut out = String::new();
        out.push_str(&format!("{}\n{}\n\n", self.title, "=".repeat(self.title.len())));
        if let Some((start, end)) = self.window {
            out.push_str(&format!(
                "Report Period: {} to {}\n",
                format_date(start),
                format_date(end)
            ));
        }
        out.push_str(&format!("Generated: {}\n\n", format_timestamp(generated_at)));

        out.push_str("SUMMARY\n-------\n");
        for (label, value) in (self.summary)(stats) {
            out.push_str(&format!("{label}: {value}\n"));
        }
        out.push('\n');

        out.push_str("DAILY BREAKDOWN\n---------------\n");
        out.push_str("Date\t\tMeals\tBreakfast\tLunch\tDinner\n");
        out.push_str("----\t\t-----\t---------\t-----\t------\n");
        for r in rows {
            out.push_str(&format!(
                "{}\t{}\t{}\t\t{}\t{}\n",
                format_date(r.date),
                count_where(r, self.matches),
                self.marker(r, MealKind::Breakfast),
                self.marker(r, MealKind::Lunch),
                self.marker(r, MealKind::Dinner),
            ));
        }

        if let Some(footer) = &self.footer {
            out.push_str(&format!("\n{footer}\n"));
        }
        out
    }
}
