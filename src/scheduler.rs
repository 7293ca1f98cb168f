use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, Instant};

use crate::error::SchedulerError;

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// One elapsed period, stamped with the acquisition that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub generation: u64,
}

pub type TickSender = mpsc::UnboundedSender<Tick>;
pub type TickReceiver = mpsc::UnboundedReceiver<Tick>;

/// Cancellable periodic scheduler.
///
/// Ticks land on a single channel, so whoever consumes the receiver sees them
/// one at a time. A tick that was already queued when the scheduler got
/// cancelled fails [`TickScheduler::is_current`] and must be dropped.
#[derive(Debug)]
pub struct TickScheduler {
    period: Duration,
    tx: TickSender,
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl TickScheduler {
    pub fn new(period: Duration) -> (Self, TickReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            period,
            tx,
            generation: 0,
            task: None,
        };
        (scheduler, rx)
    }

    /// Acquire the scheduler. The first tick arrives one period from now.
    pub fn start(&mut self) -> Result<(), SchedulerError> {
        let runtime = Handle::try_current().map_err(|_| SchedulerError::NoRuntime)?;
        self.cancel();
        self.generation += 1;

        let generation = self.generation;
        let period = self.period;
        let tx = self.tx.clone();
        self.task = Some(runtime.spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                if tx.send(Tick { generation }).is_err() {
                    break;
                }
            }
        }));
        tracing::trace!("Tick scheduler acquired (generation {})", generation);
        Ok(())
    }

    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::trace!("Tick scheduler released (generation {})", self.generation);
        }
    }

    pub fn is_active(&self) -> bool {
        self.task.is_some()
    }

    pub fn is_current(&self, tick: Tick) -> bool {
        self.is_active() && tick.generation == self.generation
    }
}

impl Drop for TickScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
