//! Timer-driven carousel runner.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, trace};

use super::{Carousel, CarouselInput, StepOutcome};

struct Shared {
    carousel: Mutex<Carousel>,
    transition_timer: Mutex<Option<JoinHandle<()>>>,
    transition: Duration,
}

impl Shared {
    fn carousel(&self) -> MutexGuard<'_, Carousel> {
        self.carousel.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn timer_slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.transition_timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn begin(shared: &Arc<Shared>, input: CarouselInput) -> StepOutcome {
    let outcome = shared.carousel().apply(input);
    match outcome {
        StepOutcome::Started { from, position } => {
            trace!(?input, from, position, "Carousel transition started");
            arm_transition_timer(shared);
        }
        StepOutcome::Ignored => trace!(?input, "Carousel locked, input ignored"),
        StepOutcome::Unchanged => {}
    }
    outcome
}

fn arm_transition_timer(shared: &Arc<Shared>) {
    let mut slot = shared.timer_slot();
    if let Some(previous) = slot.take() {
        previous.abort();
    }
    let task_shared = Arc::clone(shared);
    *slot = Some(tokio::spawn(async move {
        tokio::time::sleep(task_shared.transition).await;
        if let Some(settled) = task_shared.carousel().finish_transition() {
            trace!(index = settled.index, snapped = settled.snapped, "Carousel settled");
        }
    }));
}

fn spawn_autoplay(shared: &Arc<Shared>, every: Duration) -> JoinHandle<()> {
    let task_shared = Arc::clone(shared);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            begin(&task_shared, CarouselInput::AutoplayTick);
        }
    })
}

/// Runs a [`Carousel`] with a transition lock timer and optional autoplay.
///
/// At most one transition timer and one autoplay timer are pending at any
/// time: each is cancelled before being re-armed. Dropping the driver cancels
/// both.
///
/// Must be created and used inside a Tokio runtime.
pub struct CarouselDriver {
    shared: Arc<Shared>,
    autoplay_every: Option<Duration>,
    autoplay: Option<JoinHandle<()>>,
}

impl CarouselDriver {
    /// Start driving `carousel`.
    ///
    /// Transitions hold the input lock for `transition`. If `autoplay_every`
    /// is set and non-zero, an autoplay tick is fed at that interval. A zero
    /// interval disables autoplay.
    #[must_use]
    pub fn start(
        carousel: Carousel,
        transition: Duration,
        autoplay_every: Option<Duration>,
    ) -> Self {
        let shared = Arc::new(Shared {
            carousel: Mutex::new(carousel),
            transition_timer: Mutex::new(None),
            transition,
        });
        let mut driver = Self {
            shared,
            autoplay_every: autoplay_every.filter(|every| !every.is_zero()),
            autoplay: None,
        };
        driver.resume();
        driver
    }

    /// Feed user input.
    pub fn input(&self, input: CarouselInput) -> StepOutcome {
        begin(&self.shared, input)
    }

    /// Copy of the current machine state.
    #[must_use]
    pub fn snapshot(&self) -> Carousel {
        self.shared.carousel().clone()
    }

    /// Stop autoplay. A running transition still completes.
    pub fn pause(&mut self) {
        if let Some(handle) = self.autoplay.take() {
            handle.abort();
            debug!("Carousel autoplay paused");
        }
    }

    /// Restart autoplay, if configured.
    pub fn resume(&mut self) {
        self.pause();
        if let Some(every) = self.autoplay_every {
            self.autoplay = Some(spawn_autoplay(&self.shared, every));
        }
    }

    /// Whether autoplay is running.
    #[must_use]
    pub const fn is_autoplaying(&self) -> bool {
        self.autoplay.is_some()
    }

    /// Cancel every timer.
    pub fn dispose(mut self) {
        self.cancel_all();
    }

    fn cancel_all(&mut self) {
        self.pause();
        if let Some(handle) = self.shared.timer_slot().take() {
            handle.abort();
        }
    }
}

impl Drop for CarouselDriver {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

impl std::fmt::Debug for CarouselDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CarouselDriver")
            .field("carousel", &*self.shared.carousel())
            .field("transition", &self.shared.transition)
            .field("autoplay_every", &self.autoplay_every)
            .field("autoplaying", &self.autoplay.is_some())
            .finish()
    }
}
