//! Shared Visible-Item List
//!
//! Multiplexes one repository subscription to any number of observers. The
//! first observer opens the upstream stream; later observers share it. When
//! the last observer detaches, the upstream is kept for a grace period so a
//! quick resubscription reuses it, then torn down.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::domain::Item;
use crate::repository::ItemsRepository;

/// Default time the upstream survives without observers
pub const DEFAULT_GRACE: Duration = Duration::from_millis(5_000);

#[derive(Debug, Clone, PartialEq, Eq)]
enum Snapshot {
    /// No snapshot since the upstream (re)started
    Pending,
    Ready(Vec<Item>),
    /// The list has been shut down
    Closed,
}

#[derive(Debug, Default)]
struct ShareState {
    observers: usize,
    upstream: Option<JoinHandle<()>>,
    /// Bumped on every attach and on the last detach; a pending teardown only
    /// fires if nothing changed since it was scheduled
    generation: u64,
    connections: u64,
    closed: bool,
}

struct Shared {
    repository: ItemsRepository,
    grace: Duration,
    latest: watch::Sender<Snapshot>,
    state: Mutex<ShareState>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, ShareState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn attach(self: &Arc<Self>) -> watch::Receiver<Snapshot> {
        let mut state = self.lock();
        state.observers += 1;
        state.generation += 1;

        let running = state
            .upstream
            .as_ref()
            .is_some_and(|handle| !handle.is_finished());
        if !running && !state.closed {
            state.upstream = Some(self.connect());
            state.connections += 1;
            log::debug!("visible items: upstream opened ({} observers)", state.observers);
        }

        self.latest.subscribe()
    }

    fn connect(self: &Arc<Self>) -> JoinHandle<()> {
        let mut stream = self.repository.list_unbought();
        let weak = Arc::downgrade(self);

        tokio::spawn(async move {
            while let Some(items) = stream.next().await {
                let Some(shared) = weak.upgrade() else {
                    break;
                };
                shared.latest.send_replace(Snapshot::Ready(items));
            }
        })
    }

    fn detach(self: &Arc<Self>) {
        let generation = {
            let mut state = self.lock();
            state.observers = state.observers.saturating_sub(1);
            if state.observers > 0 || state.closed {
                return;
            }
            state.generation += 1;
            state.generation
        };

        if self.grace.is_zero() {
            self.teardown_if_idle(generation);
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let weak = Arc::downgrade(self);
                let grace = self.grace;
                runtime.spawn(async move {
                    tokio::time::sleep(grace).await;
                    if let Some(shared) = weak.upgrade() {
                        shared.teardown_if_idle(generation);
                    }
                });
            }
            // Nothing can resubscribe without a runtime anyway
            Err(_) => self.teardown_if_idle(generation),
        }
    }

    fn teardown_if_idle(&self, generation: u64) {
        let mut state = self.lock();
        if state.observers > 0 || state.generation != generation {
            return;
        }
        if let Some(handle) = state.upstream.take() {
            handle.abort();
            self.latest.send_replace(Snapshot::Pending);
            log::debug!("visible items: upstream closed after grace period");
        }
    }

    fn shutdown(&self) {
        let mut state = self.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        if let Some(handle) = state.upstream.take() {
            handle.abort();
        }
        self.latest.send_replace(Snapshot::Closed);
        log::debug!("visible items: shut down");
    }
}

/// Reference-counted live projection of the unbought items
pub struct SharedItemList {
    shared: Arc<Shared>,
}

impl SharedItemList {
    pub fn new(repository: ItemsRepository, grace: Duration) -> Self {
        let (latest, _) = watch::channel(Snapshot::Pending);
        Self {
            shared: Arc::new(Shared {
                repository,
                grace,
                latest,
                state: Mutex::new(ShareState::default()),
            }),
        }
    }

    /// Attach an observer. Must be called within a Tokio runtime.
    pub fn subscribe(&self) -> VisibleItems {
        let rx = self.shared.attach();
        VisibleItems {
            rx,
            shared: Arc::clone(&self.shared),
            primed: false,
        }
    }

    pub fn observer_count(&self) -> usize {
        self.shared.lock().observers
    }

    /// Whether an upstream store subscription is currently open
    pub fn is_connected(&self) -> bool {
        self.shared.lock().upstream.is_some()
    }

    /// Number of times an upstream store subscription has been opened
    pub fn connection_count(&self) -> u64 {
        self.shared.lock().connections
    }

    /// Close the upstream now and end every observer's stream
    pub fn shutdown(&self) {
        self.shared.shutdown();
    }
}

impl Drop for SharedItemList {
    fn drop(&mut self) {
        self.shared.shutdown();
    }
}

/// One observer of the visible items; dropping it detaches
pub struct VisibleItems {
    rx: watch::Receiver<Snapshot>,
    shared: Arc<Shared>,
    primed: bool,
}

impl VisibleItems {
    /// Next full snapshot, newest item first
    ///
    /// The first call returns the latest known snapshot if there is one.
    /// Returns `None` once the list has been shut down.
    pub async fn next(&mut self) -> Option<Vec<Item>> {
        if !self.primed {
            self.primed = true;
            let snapshot = self.rx.borrow_and_update().clone();
            match snapshot {
                Snapshot::Ready(items) => return Some(items),
                Snapshot::Closed => return None,
                Snapshot::Pending => {}
            }
        }
        loop {
            self.rx.changed().await.ok()?;
            let snapshot = self.rx.borrow_and_update().clone();
            match snapshot {
                Snapshot::Ready(items) => return Some(items),
                Snapshot::Closed => return None,
                Snapshot::Pending => {}
            }
        }
    }

    /// Latest snapshot without waiting
    pub fn current(&self) -> Option<Vec<Item>> {
        match &*self.rx.borrow() {
            Snapshot::Ready(items) => Some(items.clone()),
            _ => None,
        }
    }
}

impl Drop for VisibleItems {
    fn drop(&mut self) {
        self.shared.detach();
    }
}
