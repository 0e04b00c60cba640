use time::{Date, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::reconcile::{EntityKey, Reconciler, SyncState};
use super::sequence::{FetchSequencer, FetchToken};
use crate::auth::Session;
use crate::meals::{
    stats::{compute_stats, MealStats},
    MealKind, MealPatch, MealRecord,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Ready,
    Error(String),
}

/// Local, possibly stale copy of one owner's meal rows as a screen sees it.
#[derive(Debug)]
pub struct MealScreen {
    owner: Uuid,
    phase: Phase,
    records: Vec<MealRecord>,
    fetches: FetchSequencer,
    sync: Reconciler,
}

impl MealScreen {
    pub fn new(session: &Session) -> Self {
        Self {
            owner: session.owner,
            phase: Phase::Loading,
            records: Vec::new(),
            fetches: FetchSequencer::default(),
            sync: Reconciler::default(),
        }
    }

    pub fn owner(&self) -> Uuid {
        self.owner
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Rows ordered newest date first.
    pub fn records(&self) -> &[MealRecord] {
        &self.records
    }

    pub fn record_for(&self, date: Date) -> Option<&MealRecord> {
        self.records.iter().find(|r| r.date == date)
    }

    pub fn stats(&self) -> MealStats {
        compute_stats(&self.records)
    }

    pub fn sync_state(&self, date: Date, kind: MealKind) -> SyncState {
        self.sync.state(EntityKey { date, kind })
    }

    pub fn begin_fetch(&mut self) -> FetchToken {
        self.phase = Phase::Loading;
        self.fetches.issue()
    }

    /// Applies a fetch result unless a newer fetch has been issued since.
    /// Returns whether the result was used.
    pub fn complete_fetch(
        &mut self,
        token: FetchToken,
        result: Result<Vec<MealRecord>, String>,
    ) -> bool {
        if !self.fetches.is_latest(token) {
            debug!(owner = %self.owner, ?token, "discarding superseded fetch");
            return false;
        }
        match result {
            Ok(mut rows) => {
                rows.sort_by(|a, b| b.date.cmp(&a.date));
                self.sync.settle(&mut rows);
                self.records = rows;
                self.phase = Phase::Ready;
            }
            Err(message) => {
                self.records.clear();
                self.sync.abandon_reverts();
                self.phase = Phase::Error(message);
            }
        }
        true
    }

    /// Shows the new taken value right away and returns the patch to send.
    /// A date without a row gets one, seeded per `seed_untouched`.
    pub fn apply_toggle(
        &mut self,
        date: Date,
        kind: MealKind,
        taken: bool,
        seed_untouched: bool,
        now: OffsetDateTime,
    ) -> MealPatch {
        self.sync.begin(EntityKey { date, kind }, taken);
        if let Some(existing) = self.records.iter_mut().find(|r| r.date == date) {
            existing.set_taken(kind, taken);
            return MealPatch::default().with_taken(kind, taken);
        }

        let patch = MealPatch::first_toggle(kind, taken, seed_untouched);
        let mut row = MealRecord::new(self.owner, date, now);
        row.apply(&patch);
        self.records.push(row);
        self.records.sort_by(|a, b| b.date.cmp(&a.date));
        patch
    }

    /// The write went through; keep the stored row.
    pub fn confirm_toggle(&mut self, kind: MealKind, stored: MealRecord) {
        self.sync.confirm(EntityKey {
            date: stored.date,
            kind,
        });
        self.replace_row(stored);
    }

    /// The write failed; the flag waits for the next authoritative fetch.
    pub fn fail_toggle(&mut self, date: Date, kind: MealKind) {
        self.sync.fail(EntityKey { date, kind });
    }

    /// Replaces local rows by date with `rows` after a confirmed bulk write.
    pub fn merge_rows(&mut self, rows: &[MealRecord]) {
        for row in rows {
            self.replace_row(row.clone());
        }
    }

    fn replace_row(&mut self, row: MealRecord) {
        match self.records.iter_mut().find(|r| r.date == row.date) {
            Some(existing) => *existing = row,
            None => {
                self.records.push(row);
                self.records.sort_by(|a, b| b.date.cmp(&a.date));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    fn session() -> Session {
        Session {
            owner: Uuid::new_v4(),
            email: None,
            display_name: None,
            avatar_url: None,
        }
    }

    fn now() -> OffsetDateTime {
        datetime!(2024-05-06 09:00 UTC)
    }

    fn row(owner: Uuid, date: Date) -> MealRecord {
        MealRecord::new(owner, date, now())
    }

    #[test]
    fn fetch_orders_newest_first() {
        let mut s = MealScreen::new(&session());
        let owner = s.owner();
        let token = s.begin_fetch();
        assert_eq!(s.phase(), &Phase::Loading);
        assert!(s.complete_fetch(
            token,
            Ok(vec![row(owner, date!(2024-05-02)), row(owner, date!(2024-05-04))])
        ));
        assert_eq!(s.phase(), &Phase::Ready);
        assert_eq!(s.records()[0].date, date!(2024-05-04));
    }

    #[test]
    fn superseded_fetch_is_discarded() {
        let mut s = MealScreen::new(&session());
        let owner = s.owner();
        let stale = s.begin_fetch();
        let fresh = s.begin_fetch();

        let mut newer = row(owner, date!(2024-05-02));
        newer.breakfast = true;
        assert!(s.complete_fetch(fresh, Ok(vec![newer])));
        assert!(!s.complete_fetch(stale, Ok(vec![row(owner, date!(2024-05-02))])));

        assert!(s.records()[0].breakfast);
        assert_eq!(s.phase(), &Phase::Ready);
    }

    #[test]
    fn failed_fetch_drops_rows() {
        let mut s = MealScreen::new(&session());
        let owner = s.owner();
        let t = s.begin_fetch();
        s.complete_fetch(t, Ok(vec![row(owner, date!(2024-05-02))]));
        let t = s.begin_fetch();
        s.complete_fetch(t, Err("offline".into()));
        assert_eq!(s.phase(), &Phase::Error("offline".into()));
        assert!(s.records().is_empty());
    }

    #[test]
    fn first_toggle_creates_seeded_row() {
        let mut s = MealScreen::new(&session());
        let patch = s.apply_toggle(date!(2024-05-05), MealKind::Breakfast, false, true, now());
        assert_eq!(patch.breakfast, Some(false));
        assert_eq!(patch.lunch, Some(true));
        assert_eq!(patch.dinner, Some(true));

        let r = s.record_for(date!(2024-05-05)).expect("row created");
        assert!(!r.breakfast && r.lunch && r.dinner);
        assert_eq!(
            s.sync_state(date!(2024-05-05), MealKind::Breakfast),
            SyncState::Pending { intended: false }
        );
    }

    #[test]
    fn toggle_on_existing_row_sends_single_field() {
        let mut s = MealScreen::new(&session());
        let owner = s.owner();
        let t = s.begin_fetch();
        s.complete_fetch(t, Ok(vec![row(owner, date!(2024-05-02))]));

        let patch = s.apply_toggle(date!(2024-05-02), MealKind::Dinner, true, true, now());
        assert_eq!(patch, MealPatch::default().with_taken(MealKind::Dinner, true));
        assert!(s.record_for(date!(2024-05-02)).unwrap().dinner);
        assert!(!s.record_for(date!(2024-05-02)).unwrap().lunch);
    }

    #[test]
    fn failed_toggle_reverts_on_next_fetch() {
        let mut s = MealScreen::new(&session());
        let owner = s.owner();
        let t = s.begin_fetch();
        s.complete_fetch(t, Ok(vec![row(owner, date!(2024-05-02))]));

        s.apply_toggle(date!(2024-05-02), MealKind::Lunch, true, true, now());
        s.fail_toggle(date!(2024-05-02), MealKind::Lunch);
        assert_eq!(s.sync_state(date!(2024-05-02), MealKind::Lunch), SyncState::Reverting);
        assert!(s.record_for(date!(2024-05-02)).unwrap().lunch);

        let t = s.begin_fetch();
        s.complete_fetch(t, Ok(vec![row(owner, date!(2024-05-02))]));
        assert!(!s.record_for(date!(2024-05-02)).unwrap().lunch);
        assert_eq!(s.sync_state(date!(2024-05-02), MealKind::Lunch), SyncState::Clean);
    }
}
