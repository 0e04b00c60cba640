use std::collections::HashMap;

use time::Date;

use crate::meals::{MealKind, MealRecord};

/// One editable flag on the calendar grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityKey {
    pub date: Date,
    pub kind: MealKind,
}

/// Sync state of an optimistically edited flag:
/// `Clean -> Pending -> Clean` on success,
/// `Pending -> Reverting -> Clean` once a failed write is followed by an
/// authoritative fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Clean,
    Pending { intended: bool },
    Reverting,
}

#[derive(Debug, Default)]
pub struct Reconciler {
    entries: HashMap<EntityKey, SyncState>,
}

impl Reconciler {
    pub fn state(&self, key: EntityKey) -> SyncState {
        self.entries.get(&key).copied().unwrap_or(SyncState::Clean)
    }

    pub fn begin(&mut self, key: EntityKey, intended: bool) {
        self.entries.insert(key, SyncState::Pending { intended });
    }

    pub fn confirm(&mut self, key: EntityKey) {
        if matches!(self.state(key), SyncState::Pending { .. }) {
            self.entries.remove(&key);
        }
    }

    pub fn fail(&mut self, key: EntityKey) {
        if matches!(self.state(key), SyncState::Pending { .. }) {
            self.entries.insert(key, SyncState::Reverting);
        }
    }

    /// Rows just came from the datastore: reverting flags take whatever it
    /// says, writes still in flight are laid back on top.
    pub fn settle(&mut self, rows: &mut [MealRecord]) {
        self.entries.retain(|_, s| !matches!(s, SyncState::Reverting));
        for (key, state) in &self.entries {
            if let SyncState::Pending { intended } = state {
                if let Some(row) = rows.iter_mut().find(|r| r.date == key.date) {
                    row.set_taken(key.kind, *intended);
                }
            }
        }
    }

    /// No trustworthy rows are left; every reverting flag is dropped.
    pub fn abandon_reverts(&mut self) {
        self.entries.retain(|_, s| !matches!(s, SyncState::Reverting));
    }
}
