//! Background click recording.
//!
//! The redirect path hands [`ClickEvent`]s to a [`ClickQueue`]. A single
//! [`run_click_worker`] task drains the queue and, for every event, writes the
//! analytics record and increments the link's counter through a
//! [`ClickRecorder`]. Writes are retried with exponential backoff; a final
//! failure is logged and counted, never surfaced to the visitor.
//!
//! Retrying the analytics insert is safe because events carry a key the store
//! deduplicates on. The click counter has no such key: if an increment commits
//! but its acknowledgement is lost, the retry counts the visit twice.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use metrics::counter;
use tokio::sync::{Semaphore, mpsc, mpsc::error::TrySendError};
use tokio::task::JoinSet;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, error, info, warn};

use crate::domain::click_event::ClickEvent;
use crate::domain::repositories::{AnalyticsRepository, LinkRepository};

/// Retries after the first attempt, so each write is tried three times.
const WRITE_RETRIES: usize = 2;

fn retry_strategy() -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(10)
        .max_delay(Duration::from_secs(1))
        .map(jitter)
        .take(WRITE_RETRIES)
}

/// Applies the two independent writes of one visit.
pub struct ClickRecorder {
    analytics: Arc<dyn AnalyticsRepository>,
    links: Arc<dyn LinkRepository>,
}

impl ClickRecorder {
    pub fn new(analytics: Arc<dyn AnalyticsRepository>, links: Arc<dyn LinkRepository>) -> Self {
        Self { analytics, links }
    }

    /// Records the analytics event and increments the counter concurrently.
    ///
    /// Neither write depends on the other. Returns once both have succeeded or
    /// exhausted their retries.
    pub async fn record(&self, event: ClickEvent) {
        let link_id = event.link_id;
        let new_event = event.into_new_event();

        let analytics = self.analytics.clone();
        let write_event = Retry::spawn(retry_strategy(), move || {
            let analytics = analytics.clone();
            let new_event = new_event.clone();
            async move { analytics.record(new_event).await }
        });

        let links = self.links.clone();
        let increment = Retry::spawn(retry_strategy(), move || {
            let links = links.clone();
            async move { links.increment_click_count(link_id).await }
        });

        let (recorded, incremented) = tokio::join!(write_event, increment);

        match recorded {
            Ok(_) => {
                counter!("clicks_recorded_total").increment(1);
                debug!(link_id, "Click recorded");
            }
            Err(e) => {
                counter!("click_record_failures_total").increment(1);
                error!(link_id, error = %e, "Failed to record analytics event");
            }
        }

        if let Err(e) = incremented {
            counter!("click_increment_failures_total").increment(1);
            error!(link_id, error = %e, "Failed to increment click count");
        }
    }
}

/// Recordings started outside the worker when the queue was unavailable.
///
/// Holds no queue sender, so keeping a handle does not keep the worker alive.
#[derive(Clone, Default)]
pub struct OverflowTasks {
    tasks: Arc<Mutex<JoinSet<()>>>,
}

impl OverflowTasks {
    fn spawn(&self, recorder: Arc<ClickRecorder>, event: ClickEvent) {
        let mut tasks = self.lock();
        while tasks.try_join_next().is_some() {}
        tasks.spawn(async move {
            recorder.record(event).await;
        });
    }

    /// Waits for every overflow recording, including ones started meanwhile.
    pub async fn drain(&self) {
        loop {
            let mut pending = std::mem::take(&mut *self.lock());
            if pending.is_empty() {
                return;
            }
            while pending.join_next().await.is_some() {}
        }
    }

    fn lock(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Producer side of the click pipeline, cloned into the application state.
#[derive(Clone)]
pub struct ClickQueue {
    sender: mpsc::Sender<ClickEvent>,
    recorder: Arc<ClickRecorder>,
    overflow: OverflowTasks,
}

impl ClickQueue {
    /// Creates the queue and the receiver to pass to [`run_click_worker`].
    pub fn new(
        capacity: usize,
        recorder: Arc<ClickRecorder>,
    ) -> (Self, mpsc::Receiver<ClickEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let queue = Self {
            sender,
            recorder,
            overflow: OverflowTasks::default(),
        };
        (queue, receiver)
    }

    /// Hands an event off without waiting for it to be written.
    ///
    /// When the queue is full or the worker is gone, the event is recorded in
    /// a task tracked by [`ClickQueue::overflow`] instead, so no click is
    /// dropped.
    pub fn dispatch(&self, event: ClickEvent) {
        match self.sender.try_send(event) {
            Ok(()) => {
                counter!("clicks_enqueued_total").increment(1);
            }
            Err(TrySendError::Full(event)) | Err(TrySendError::Closed(event)) => {
                counter!("clicks_overflow_total").increment(1);
                warn!(
                    link_id = event.link_id,
                    "Click queue unavailable, recording in an overflow task"
                );
                self.overflow.spawn(self.recorder.clone(), event);
            }
        }
    }

    /// Handle to await overflow recordings at shutdown.
    pub fn overflow(&self) -> OverflowTasks {
        self.overflow.clone()
    }

    /// Returns true once the worker has stopped receiving.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Free slots in the queue.
    pub fn available(&self) -> usize {
        self.sender.capacity()
    }

    pub fn max_capacity(&self) -> usize {
        self.sender.max_capacity()
    }
}

/// Drains the click queue until every sender is dropped.
///
/// At most `concurrency` events are processed at once. Events still in flight
/// when the channel closes are awaited before returning.
pub async fn run_click_worker(
    mut rx: mpsc::Receiver<ClickEvent>,
    recorder: Arc<ClickRecorder>,
    concurrency: usize,
) {
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut in_flight = JoinSet::new();

    info!(concurrency, "Click worker started");

    while let Some(event) = rx.recv().await {
        let Ok(permit) = permits.clone().acquire_owned().await else {
            break;
        };
        let recorder = recorder.clone();
        in_flight.spawn(async move {
            recorder.record(event).await;
            drop(permit);
        });

        while in_flight.try_join_next().is_some() {}
    }

    while in_flight.join_next().await.is_some() {}

    info!("Click worker stopped");
}
