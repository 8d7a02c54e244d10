//! Refresh passes and the view state they publish
//!
//! Passes are serialized: a trigger that arrives while a pass is running is folded into a
//! single follow-up pass instead of interleaving with the current one.

pub mod scheduler;
pub mod watcher;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use crate::config::Settings;
use crate::highlights::sampler::sample_with;
use crate::highlights::{collect_highlights, Highlight};
use crate::render::DisplaySurface;
use crate::vault::DocumentSource;

/// What the view currently shows
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ViewState {
    /// No pass has completed yet
    Empty,
    Ready {
        highlights: Vec<Highlight>,
        /// Size of the pool the displayed highlights were drawn from
        pool_size: usize,
        refreshed_at: DateTime<Utc>,
    },
    Failed {
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshStatus {
    /// This call ran the pass (plus any passes requested meanwhile)
    Completed,
    /// A pass was already running; it will run once more after it finishes
    Coalesced,
}

/// Depth-1 queue of refresh requests.
///
/// A request always raises `pending` before trying to take `in_flight`, and the owner
/// re-checks `pending` after dropping `in_flight`, so a request that loses the race is
/// always picked up by whichever side holds the guard last.
#[derive(Default)]
struct PassQueue {
    in_flight: AtomicBool,
    pending: AtomicBool,
}

impl PassQueue {
    /// Record a request. `true` means the caller now owns the guard and must run passes.
    fn request(&self) -> bool {
        self.pending.store(true, Ordering::SeqCst);
        self.try_acquire()
    }

    fn try_acquire(&self) -> bool {
        self.in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Consume the queued request, if any (owner only).
    fn next_pass(&self) -> bool {
        self.pending.swap(false, Ordering::SeqCst)
    }

    /// Drop the guard. `true` means a request arrived meanwhile and the caller took the
    /// guard back, so it must keep running passes.
    fn release(&self) -> bool {
        self.in_flight.store(false, Ordering::SeqCst);
        self.pending.load(Ordering::SeqCst) && self.try_acquire()
    }
}

pub struct HighlightService {
    source: Arc<dyn DocumentSource>,
    settings: RwLock<Settings>,
    surface: Option<Arc<dyn DisplaySurface>>,
    state: RwLock<ViewState>,
    rng: Mutex<StdRng>,
    queue: PassQueue,
    passes: AtomicUsize,
}

impl HighlightService {
    pub fn new(source: Arc<dyn DocumentSource>, settings: Settings) -> Self {
        Self {
            source,
            settings: RwLock::new(settings.normalized()),
            surface: None,
            state: RwLock::new(ViewState::Empty),
            rng: Mutex::new(StdRng::from_entropy()),
            queue: PassQueue::default(),
            passes: AtomicUsize::new(0),
        }
    }

    /// Render every completed pass to `surface`
    pub fn with_surface(mut self, surface: Arc<dyn DisplaySurface>) -> Self {
        self.surface = Some(surface);
        self
    }

    /// Replace the random source (tests pin it with a seed)
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    pub fn settings(&self) -> Settings {
        match self.settings.read() {
            Ok(s) => s.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Takes effect on the next pass
    pub fn update_settings(&self, settings: Settings) {
        match self.settings.write() {
            Ok(mut s) => *s = settings.normalized(),
            Err(poisoned) => *poisoned.into_inner() = settings.normalized(),
        }
    }

    pub fn state(&self) -> ViewState {
        match self.state.read() {
            Ok(s) => s.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Highlights currently on display (empty unless the last pass succeeded)
    pub fn highlights(&self) -> Vec<Highlight> {
        match self.state() {
            ViewState::Ready { highlights, .. } => highlights,
            _ => Vec::new(),
        }
    }

    /// Number of passes run so far
    pub fn pass_count(&self) -> usize {
        self.passes.load(Ordering::SeqCst)
    }

    pub fn is_refreshing(&self) -> bool {
        self.queue.in_flight.load(Ordering::SeqCst)
    }

    /// Run a refresh pass, or queue one if a pass is already in flight.
    pub fn refresh(&self) -> RefreshStatus {
        if !self.queue.request() {
            log::debug!("Refresh already running, coalescing request");
            return RefreshStatus::Coalesced;
        }

        loop {
            while self.queue.next_pass() {
                self.run_pass();
            }
            if !self.queue.release() {
                break;
            }
        }

        RefreshStatus::Completed
    }

    /// Callback suitable for timers and file watchers
    pub fn refresh_trigger(self: &Arc<Self>) -> impl Fn() + Send + Sync + 'static {
        let service = Arc::clone(self);
        move || {
            service.refresh();
        }
    }

    fn run_pass(&self) {
        let settings = self.settings();

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            collect_highlights(self.source.as_ref(), &settings)
        }))
        .unwrap_or_else(|_| Err("Unexpected failure while scanning notes".to_string()));

        let state = match result {
            Ok(pool) => {
                let pool_size = pool.len();
                let highlights = {
                    let mut rng = match self.rng.lock() {
                        Ok(rng) => rng,
                        Err(poisoned) => poisoned.into_inner(),
                    };
                    sample_with(&pool, settings.random_count, &mut *rng)
                };
                ViewState::Ready {
                    highlights,
                    pool_size,
                    refreshed_at: Utc::now(),
                }
            }
            Err(message) => {
                log::error!("Highlight refresh failed: {}", message);
                ViewState::Failed { message }
            }
        };

        match self.state.write() {
            Ok(mut s) => *s = state.clone(),
            Err(poisoned) => *poisoned.into_inner() = state.clone(),
        }
        self.passes.fetch_add(1, Ordering::SeqCst);

        if let Some(surface) = &self.surface {
            match &state {
                ViewState::Ready { highlights, .. } => {
                    surface.show_highlights(highlights, &settings.display_options())
                }
                ViewState::Failed { message } => surface.show_error(message),
                ViewState::Empty => {}
            }
        }
    }
}
