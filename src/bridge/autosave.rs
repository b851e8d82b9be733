use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::models::NoteId;
use crate::services::{NotePersistence, PersistenceError};
use crate::utils::ScopeGuard;

/// How the current user relates to the open note
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Owned,
    Shared,
}

/// Which note a save writes, and through which persistence call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutosaveTarget {
    Owned { user_id: i64, note_id: NoteId },
    Shared { note_id: NoteId },
}

impl AutosaveTarget {
    pub fn new(user_id: i64, note_id: NoteId, ownership: Ownership) -> Self {
        match ownership {
            Ownership::Owned => AutosaveTarget::Owned { user_id, note_id },
            Ownership::Shared => AutosaveTarget::Shared { note_id },
        }
    }

    pub fn note_id(&self) -> &NoteId {
        match self {
            AutosaveTarget::Owned { note_id, .. } | AutosaveTarget::Shared { note_id } => note_id,
        }
    }

    pub async fn save(&self, store: &dyn NotePersistence, content: &str) -> Result<(), PersistenceError> {
        match self {
            AutosaveTarget::Owned { user_id, note_id } => store.save_owned(*user_id, note_id, content).await,
            AutosaveTarget::Shared { note_id } => store.save_shared(note_id, content).await,
        }
    }
}

type TimerGuard = ScopeGuard<Box<dyn FnOnce() + Send>>;

/// Periodically writes the editing buffer of the open note to storage.
///
/// The timer belongs to one target; switching notes tears it down before the
/// next one starts, so a tick never writes one note's text under another's id.
pub struct AutosaveScheduler {
    store: Arc<dyn NotePersistence>,
    period: Duration,
    content: watch::Receiver<String>,
    target: Option<AutosaveTarget>,
    timer: Option<TimerGuard>,
}

impl AutosaveScheduler {
    pub fn new(store: Arc<dyn NotePersistence>, period: Duration, content: watch::Receiver<String>) -> Self {
        Self {
            store,
            period,
            content,
            target: None,
            timer: None,
        }
    }

    pub fn target(&self) -> Option<&AutosaveTarget> {
        self.target.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Point the timer at `target`. A different target restarts the timer; the
    /// same one keeps the running timer.
    pub fn retarget(&mut self, target: AutosaveTarget) {
        if self.timer.is_some() && self.target.as_ref() == Some(&target) {
            return;
        }
        self.stop();

        let task = tokio::spawn(run_timer(
            self.store.clone(),
            self.period,
            self.content.clone(),
            target.clone(),
        ));
        let note_id = target.note_id().clone();
        let clear: Box<dyn FnOnce() + Send> = Box::new(move || {
            task.abort();
            debug!("Autosave cleared for note {}", note_id);
        });
        self.timer = Some(ScopeGuard::new(clear));
        info!("Autosave started for note {} every {:?}", target.note_id(), self.period);
        self.target = Some(target);
    }

    pub fn stop(&mut self) {
        self.timer = None;
        self.target = None;
    }

    /// Save the buffer now and report the outcome to the caller
    pub async fn save_now(&self) -> Result<(), PersistenceError> {
        let target = self.target.as_ref().ok_or(PersistenceError::NoOpenNote)?;
        let snapshot = self.content.borrow().clone();
        target.save(self.store.as_ref(), &snapshot).await
    }
}

async fn run_timer(
    store: Arc<dyn NotePersistence>,
    period: Duration,
    content: watch::Receiver<String>,
    target: AutosaveTarget,
) {
    let mut ticks = interval_at(Instant::now() + period, period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticks.tick().await;
        let snapshot = content.borrow().clone();
        let store = store.clone();
        let target = target.clone();
        // Saves are not serialized against each other; a slow one may still
        // be in flight when the next tick fires.
        tokio::spawn(async move {
            match target.save(store.as_ref(), &snapshot).await {
                Ok(()) => debug!("Auto saved note {}", target.note_id()),
                Err(e) => warn!("Autosave of note {} failed, next tick retries: {}", target.note_id(), e),
            }
        });
    }
}
