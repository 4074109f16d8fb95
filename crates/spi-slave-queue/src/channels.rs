use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use heapless::Vec;
use portable_atomic::{AtomicU8, AtomicUsize, Ordering};

use crate::error::Status;
use crate::timeout::Timeout;
use crate::transfer::Transfer;

/// Lifecycle of the worker bound to a [`SlaveChannels`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum WorkerState {
    /// No worker, or the last one terminated cleanly.
    Idle = 0,
    /// A worker was handed out but has not initialized the peripheral yet.
    Starting = 1,
    Running = 2,
    /// The worker could not initialize the peripheral and exited.
    Faulted = 3,
}

impl WorkerState {
    const fn from_u8(value: u8) -> Self {
        match value {
            1 => WorkerState::Starting,
            2 => WorkerState::Running,
            3 => WorkerState::Faulted,
            _ => WorkerState::Idle,
        }
    }
}

/// Transfers handed to the worker in one go.
pub(crate) struct Batch<'b, const N: usize> {
    pub(crate) transfers: Vec<Transfer<'b>, N>,
    pub(crate) timeout: Timeout,
}

/// State shared by one [`Slave`](crate::Slave) and its [`Worker`](crate::Worker).
///
/// `N` is the storage bound of the pending batch and of the result and error
/// queues. The batch capacity of a session is `SlaveConfig::queue_size`,
/// which may be smaller. Each instance backs exactly one peripheral; place it
/// in a `StaticCell` when the worker runs in its own task.
pub struct SlaveChannels<'b, M: RawMutex, const N: usize> {
    pub(crate) batches: Channel<M, Batch<'b, N>, 1>,
    pub(crate) results: Channel<M, usize, N>,
    pub(crate) errors: Channel<M, Status, N>,
    /// Transfers of the last completed batch, waiting to be reclaimed.
    pub(crate) done: Channel<M, Vec<Transfer<'b>, N>, 1>,
    in_flight: AtomicUsize,
    pub(crate) progress: Signal<M, ()>,
    pub(crate) stop: Signal<M, ()>,
    pub(crate) stopped: Signal<M, ()>,
    state: AtomicU8,
}

impl<'b, M: RawMutex, const N: usize> SlaveChannels<'b, M, N> {
    pub const fn new() -> Self {
        Self {
            batches: Channel::new(),
            results: Channel::new(),
            errors: Channel::new(),
            done: Channel::new(),
            in_flight: AtomicUsize::new(0),
            progress: Signal::new(),
            stop: Signal::new(),
            stopped: Signal::new(),
            state: AtomicU8::new(WorkerState::Idle as u8),
        }
    }

    /// Overwrite the in-flight mailbox and wake anyone waiting on progress.
    pub(crate) fn publish_in_flight(&self, n: usize) {
        self.in_flight.store(n, Ordering::Release);
        self.progress.signal(());
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn worker_state(&self) -> WorkerState {
        WorkerState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn set_worker_state(&self, state: WorkerState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Claim the channels for a new worker.
    ///
    /// Fails with the current state unless the previous worker is gone.
    pub(crate) fn claim(&self) -> Result<(), WorkerState> {
        let current = self.state.load(Ordering::Acquire);
        match WorkerState::from_u8(current) {
            WorkerState::Idle | WorkerState::Faulted => self
                .state
                .compare_exchange(
                    current,
                    WorkerState::Starting as u8,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .map(|_| ())
                .map_err(WorkerState::from_u8),
            other => Err(other),
        }
    }

    /// Drop every queued batch and record, and zero the mailbox.
    ///
    /// Completed transfers in `done` are kept so they can still be reclaimed
    /// after the worker exits.
    pub(crate) fn clear(&self) {
        self.batches.clear();
        self.results.clear();
        self.errors.clear();
        self.in_flight.store(0, Ordering::Release);
    }
}

impl<M: RawMutex, const N: usize> Default for SlaveChannels<'_, M, N> {
    fn default() -> Self {
        Self::new()
    }
}
