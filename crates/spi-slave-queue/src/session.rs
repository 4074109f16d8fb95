use embassy_sync::blocking_mutex::raw::RawMutex;
use heapless::Vec;

use crate::channels::{Batch, SlaveChannels, WorkerState};
use crate::config::SlaveConfig;
use crate::driver::{SlaveDriver, TransferHooks};
use crate::error::{SlaveError, Status};
use crate::timeout::Timeout;
use crate::transfer::Transfer;
use crate::worker::Worker;

/// Bound for the worker to acknowledge a stop request.
const STOP_TIMEOUT: Timeout = Timeout::from_millis(5000);

/// Outcome of one transfer, popped from both result queues at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Completion {
    pub received: usize,
    pub status: Status,
}

/// Caller-side handle of a slave-mode peripheral.
///
/// Transfers are collected with [`queue`](Self::queue) and handed to the
/// worker as one batch by [`trigger`](Self::trigger). Only one batch can be in
/// flight at a time; its byte counts and status codes come back in queue order.
pub struct Slave<'a, 'b, M: RawMutex, const N: usize> {
    channels: &'a SlaveChannels<'b, M, N>,
    pending: Vec<Transfer<'b>, N>,
    config: Option<SlaveConfig>,
}

impl<'a, 'b, M: RawMutex, const N: usize> Slave<'a, 'b, M, N> {
    pub const fn new(channels: &'a SlaveChannels<'b, M, N>) -> Self {
        Self { channels, pending: Vec::new(), config: None }
    }

    /// Bind the session to `driver` and return the worker that will own it.
    ///
    /// The peripheral is initialized by the worker once [`Worker::run`] is
    /// polled. `config.queue_size` must fit in the `N` slots of the channels.
    pub fn start<D, H>(
        &mut self,
        driver: D,
        hooks: H,
        config: SlaveConfig,
    ) -> Result<Worker<'a, 'b, M, D, H, N>, SlaveError>
    where
        D: SlaveDriver,
        H: TransferHooks,
    {
        if self.config.is_some() {
            return Err(SlaveError::AlreadyStarted);
        }
        config.validate::<N>()?;
        self.channels.claim().map_err(|state| {
            warn!("previous spi slave worker still {:?}", state);
            SlaveError::WorkerBusy
        })?;

        self.channels.clear();
        self.channels.done.clear();
        self.channels.stop.reset();
        self.channels.stopped.reset();
        self.channels.progress.reset();
        self.pending.clear();
        self.config = Some(config);

        debug!("spi slave started on {:?}", config.host);
        Ok(Worker::new(self.channels, driver, hooks, config))
    }

    /// Ask the worker to finish its current batch, release the peripheral and exit.
    ///
    /// Stopping a session that is not running is a no-op. On
    /// [`SlaveError::ShutdownTimeout`] the worker may still own the peripheral
    /// and a new `start` fails with [`SlaveError::WorkerBusy`] until it exits.
    pub async fn stop(&mut self) -> Result<(), SlaveError> {
        if self.config.take().is_none() {
            warn!("spi slave worker already terminated");
            return Ok(());
        }
        self.pending.clear();

        self.channels.stop.signal(());
        match STOP_TIMEOUT.run(self.channels.stopped.wait()).await {
            Ok(()) => Ok(()),
            Err(_) => {
                warn!("timeout waiting for the termination of spi slave worker");
                Err(SlaveError::ShutdownTimeout)
            }
        }
    }

    pub fn is_started(&self) -> bool {
        self.config.is_some()
    }

    pub fn worker_state(&self) -> WorkerState {
        self.channels.worker_state()
    }

    /// Append a transfer to the pending batch. Never touches the hardware.
    ///
    /// A transfer reclaimed with [`take_batch`](Self::take_batch) can be
    /// queued again; its transferred length starts over at zero.
    pub fn queue(&mut self, mut transfer: Transfer<'b>) -> Result<(), SlaveError> {
        let config = self.config.as_ref().ok_or(SlaveError::NotStarted)?;
        let capacity = config.queue_size;
        if self.pending.len() >= capacity {
            warn!(
                "failed to queue transfer: queue is full - only {} transfers can be queued at once",
                capacity
            );
            return Err(SlaveError::QueueFull { capacity });
        }
        transfer.validate(config.max_transfer_size)?;
        transfer.set_transferred_bits(0);
        self.pending
            .push(transfer)
            .map_err(|_| SlaveError::QueueFull { capacity })
    }

    /// Hand the pending batch to the worker.
    ///
    /// `timeout_ms` bounds the hand-off and each driver call of the batch.
    /// If the hand-off times out the batch is dropped. While a previous batch
    /// is in flight the pending batch is kept for a later attempt.
    pub async fn trigger(&mut self, timeout_ms: u32) -> Result<(), SlaveError> {
        self.ensure_running()?;
        if self.pending.is_empty() {
            warn!("failed to trigger transfer: no transfer is queued");
            return Err(SlaveError::EmptyBatch);
        }
        let in_flight = self.num_in_flight();
        if in_flight > 0 {
            warn!(
                "failed to trigger transfer: {} transfers are already in flight",
                in_flight
            );
            return Err(SlaveError::InFlight(in_flight));
        }

        let timeout = Timeout::from_millis(timeout_ms);
        let batch =
            Batch { transfers: core::mem::take(&mut self.pending), timeout };
        // The worker is idle until it receives the batch, so the session may
        // write the mailbox here; it closes the window before the worker's
        // own publish.
        self.channels.publish_in_flight(batch.transfers.len());

        // The slot is always empty once the mailbox reads zero, so with a
        // running worker the send completes at once.
        match timeout.run(self.channels.batches.send(batch)).await {
            Ok(()) => Ok(()),
            Err(_) => {
                self.channels.publish_in_flight(0);
                error!("failed to trigger transfer: transfer channel between session and worker is full");
                Err(SlaveError::HandoffTimeout)
            }
        }
    }

    /// Trigger the pending batch and wait for all of its results.
    pub async fn wait(
        &mut self,
        timeout_ms: u32,
    ) -> Result<Vec<usize, N>, SlaveError> {
        let count = self.pending.len();
        self.trigger(timeout_ms).await?;
        // Every driver call of the batch is already bounded by `timeout_ms`.
        self.wait_all(count, 0).await
    }

    /// Queue one transfer, run the pending batch and return the last byte count.
    pub async fn transfer(
        &mut self,
        transfer: Transfer<'b>,
        timeout_ms: u32,
    ) -> Result<usize, SlaveError> {
        self.queue(transfer)?;
        let received = self.wait(timeout_ms).await?;
        Ok(received.last().copied().unwrap_or(0))
    }

    /// Wait until nothing is in flight and exactly `count` results are ready,
    /// then drain them.
    pub async fn wait_all(
        &mut self,
        count: usize,
        timeout_ms: u32,
    ) -> Result<Vec<usize, N>, SlaveError> {
        if self.config.is_none() {
            return Err(SlaveError::NotStarted);
        }

        let ready = Timeout::from_millis(timeout_ms)
            .run(async {
                while !self.is_ready(count) {
                    if self.channels.worker_state() == WorkerState::Faulted {
                        return Err(SlaveError::WorkerFaulted);
                    }
                    self.channels.progress.wait().await;
                }
                Ok(())
            })
            .await;

        match ready {
            Ok(Ok(())) => Ok(self.num_bytes_received_all()),
            Ok(Err(e)) => Err(e),
            Err(_) => {
                warn!("timed out waiting for {} transfer results", count);
                Err(SlaveError::WaitTimeout)
            }
        }
    }

    /// Transfers of the current batch not completed yet.
    pub fn num_in_flight(&self) -> usize {
        self.channels.in_flight()
    }

    /// Results ready to be consumed.
    pub fn num_completed(&self) -> usize {
        self.channels.results.len()
    }

    pub fn available(&self) -> usize {
        self.num_completed()
    }

    pub fn num_errors(&self) -> usize {
        self.channels.errors.len()
    }

    /// Transfers queued but not triggered yet.
    pub fn num_pending(&self) -> usize {
        self.pending.len()
    }

    /// Pop the oldest byte count, or 0 if no result is ready.
    pub fn num_bytes_received(&mut self) -> usize {
        self.channels.results.try_receive().unwrap_or(0)
    }

    pub fn num_bytes_received_all(&mut self) -> Vec<usize, N> {
        let mut received = Vec::new();
        for _ in 0..self.num_completed() {
            match self.channels.results.try_receive() {
                Ok(n) => {
                    let _ = received.push(n);
                }
                Err(_) => break,
            }
        }
        received
    }

    /// Pop the oldest status code, or `Ok(())` if none is ready.
    pub fn error(&mut self) -> Status {
        self.channels.errors.try_receive().unwrap_or(Ok(()))
    }

    pub fn errors(&mut self) -> Vec<Status, N> {
        let mut errors = Vec::new();
        for _ in 0..self.num_errors() {
            match self.channels.errors.try_receive() {
                Ok(status) => {
                    let _ = errors.push(status);
                }
                Err(_) => break,
            }
        }
        errors
    }

    /// Pop the oldest byte count and status code together.
    pub fn completion(&mut self) -> Option<Completion> {
        let received = self.channels.results.try_receive().ok()?;
        let status = self.channels.errors.try_receive().unwrap_or(Ok(()));
        Some(Completion { received, status })
    }

    /// Reclaim the transfers of the last completed batch, in queue order.
    ///
    /// Their `rx` buffers hold what the master sent. Returns an empty batch
    /// while a batch is still in flight or once the transfers were taken.
    /// Transfers that are not reclaimed are dropped when the next batch runs.
    pub fn take_batch(&mut self) -> Vec<Transfer<'b>, N> {
        self.channels.done.try_receive().unwrap_or_default()
    }

    /// Discard the oldest completion record.
    pub fn pop(&mut self) {
        let _ = self.completion();
    }

    /// Nothing in flight and every result consumed.
    pub fn is_idle(&self) -> bool {
        self.num_in_flight() == 0 && self.num_completed() == 0
    }

    /// Nothing in flight and exactly `count` results ready.
    pub fn is_ready(&self, count: usize) -> bool {
        self.num_in_flight() == 0 && self.num_completed() == count
    }

    fn ensure_running(&self) -> Result<(), SlaveError> {
        if self.config.is_none() {
            return Err(SlaveError::NotStarted);
        }
        if self.channels.worker_state() == WorkerState::Faulted {
            return Err(SlaveError::WorkerFaulted);
        }
        Ok(())
    }
}
