use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::AbortHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::case_id::CaseId;

/// The countdown interval. Sub-second precision is never consumed so there is no drift correction.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// One countdown tick, addressed to a single activation of a single case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tick {
    pub case_id: CaseId,
    /// The activation the ticker was attached for. A case discards ticks that were issued for an
    /// earlier activation, which covers ticks that were already queued when the ticker was
    /// detached.
    pub activation: u64,
}

/// Something that can attach a periodic ticker to a running case.
pub trait TickSource {
    /// Start ticking for the given case activation. Ticking continues until the returned handle is
    /// detached or dropped.
    fn attach(&self, case_id: CaseId, activation: u64) -> TickerHandle;

    /// The number of handles from this source that are still attached.
    fn attached_count(&self) -> usize;
}

/// Exclusive ownership of an attached ticker.
///
/// Detaching is synchronous: the backing task is aborted before [TickerHandle::detach] returns, so
/// it is never polled again. Dropping the handle detaches it.
#[derive(Debug)]
pub struct TickerHandle {
    activation: u64,
    task: Option<AbortHandle>,
    live: Option<Arc<AtomicUsize>>,
}

impl TickerHandle {
    fn new(activation: u64, task: Option<AbortHandle>, live: Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        Self {
            activation,
            task,
            live: Some(live),
        }
    }

    pub fn activation(&self) -> u64 {
        self.activation
    }

    pub fn is_attached(&self) -> bool {
        self.live.is_some()
    }

    /// Stop ticking. Calling this more than once is a no-op.
    pub fn detach(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if let Some(live) = self.live.take() {
            live.fetch_sub(1, Ordering::SeqCst);
            log::trace!("Detached ticker for activation {}", self.activation);
        }
    }
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Wall-clock ticker backed by a Tokio task per activation.
///
/// Ticks are delivered into the same channel as every other session event so that they are
/// processed in order with operator triggers.
#[derive(Debug)]
pub struct ClockTicker<E> {
    runtime: tokio::runtime::Handle,
    sender: UnboundedSender<E>,
    live: Arc<AtomicUsize>,
}

impl<E> ClockTicker<E>
where
    E: From<Tick> + Send + 'static,
{
    pub fn new(runtime: tokio::runtime::Handle, sender: UnboundedSender<E>) -> Self {
        Self {
            runtime,
            sender,
            live: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl<E> TickSource for ClockTicker<E>
where
    E: From<Tick> + Send + 'static,
{
    fn attach(&self, case_id: CaseId, activation: u64) -> TickerHandle {
        let sender = self.sender.clone();
        let task = self.runtime.spawn(async move {
            let first_tick = Instant::now() + TICK_INTERVAL;
            let mut interval = tokio::time::interval_at(first_tick, TICK_INTERVAL);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;

                let tick = Tick {
                    case_id: case_id.clone(),
                    activation,
                };
                if sender.send(tick.into()).is_err() {
                    // The session has gone away, nobody is left to count down for.
                    log::debug!("Tick receiver closed, stopping ticker for case {case_id}");
                    break;
                }
            }
        });

        TickerHandle::new(activation, Some(task.abort_handle()), self.live.clone())
    }

    fn attached_count(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

/// A ticker that never fires on its own.
///
/// Useful when the caller delivers ticks itself, for example from a test or a replay.
#[derive(Debug, Default, Clone)]
pub struct ManualTicker {
    live: Arc<AtomicUsize>,
}

impl ManualTicker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TickSource for ManualTicker {
    fn attach(&self, _case_id: CaseId, activation: u64) -> TickerHandle {
        TickerHandle::new(activation, None, self.live.clone())
    }

    fn attached_count(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}
