use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use heapless::Vec;

use crate::channels::{Batch, SlaveChannels, WorkerState};
use crate::config::SlaveConfig;
use crate::driver::{SlaveDriver, TransferHooks};
use crate::error::{DriverError, Status};
use crate::timeout::Timeout;

/// Bound for pushing one record into the result or error queue.
const PUBLISH_TIMEOUT: Timeout = Timeout::from_millis(5000);

/// The task that owns the peripheral.
///
/// Obtained from [`Slave::start`](crate::Slave::start). Nothing happens until
/// [`Worker::run`] is polled, typically from a dedicated embassy task on the
/// executor the peripheral should be serviced from.
pub struct Worker<'a, 'b, M: RawMutex, D, H, const N: usize> {
    channels: &'a SlaveChannels<'b, M, N>,
    driver: D,
    hooks: H,
    config: SlaveConfig,
}

impl<'a, 'b, M, D, H, const N: usize> Worker<'a, 'b, M, D, H, N>
where
    M: RawMutex,
    D: SlaveDriver,
    H: TransferHooks,
{
    pub(crate) fn new(
        channels: &'a SlaveChannels<'b, M, N>,
        driver: D,
        hooks: H,
        config: SlaveConfig,
    ) -> Self {
        Self { channels, driver, hooks, config }
    }

    /// Service batches until the session asks the worker to stop.
    ///
    /// Returns the released driver. If the driver cannot be initialized the
    /// worker exits at once and hands back the error along with the driver.
    pub async fn run(mut self) -> Result<D, (DriverError, D)> {
        debug!("spi slave worker start");
        let channels = self.channels;

        if let Err(e) = self.driver.initialize(&self.config).await {
            error!("failed to initialize spi slave driver: {:?}", e);
            channels.set_worker_state(WorkerState::Faulted);
            channels.progress.signal(());
            channels.stopped.signal(());
            return Err((e, self.driver));
        }
        channels.set_worker_state(WorkerState::Running);

        loop {
            // A batch that is already queued wins over a stop request.
            match select(channels.batches.receive(), channels.stop.wait()).await {
                Either::First(batch) => self.process(batch).await,
                Either::Second(()) => break,
            }
        }

        debug!("terminate spi slave worker as requested by the session");

        channels.clear();
        self.driver.release();
        channels.set_worker_state(WorkerState::Idle);
        channels.stopped.signal(());

        debug!("spi slave worker finished");
        Ok(self.driver)
    }

    async fn process(&mut self, batch: Batch<'b, N>) {
        let Batch { mut transfers, timeout } = batch;
        let size = transfers.len();
        self.channels.publish_in_flight(size);
        debug!("new transfer batch received (size = {})", size);

        let mut statuses: Vec<Status, N> = Vec::new();
        for (i, transfer) in transfers.iter_mut().enumerate() {
            let status = match timeout.run(self.driver.queue(transfer)).await {
                Ok(Ok(())) => {
                    self.hooks.armed(transfer);
                    Ok(())
                }
                Ok(Err(e)) => Err(e),
                Err(_) => Err(DriverError::Timeout),
            };
            if let Err(e) = status {
                error!("failed to queue transfer {}: {:?}", i, e);
            }
            // A batch never holds more than N transfers.
            let _ = statuses.push(status);
        }

        let stale = self.channels.results.len();
        if stale > 0 {
            warn!("discarding {} unconsumed results of a previous batch", stale);
        }
        self.channels.results.clear();
        self.channels.errors.clear();
        if self.channels.done.try_receive().is_ok() {
            warn!("discarding transfers of a previous batch that were never reclaimed");
        }

        for (i, (transfer, status)) in
            transfers.iter_mut().zip(statuses.iter_mut()).enumerate()
        {
            let mut received = 0;
            if status.is_ok() {
                match timeout.run(self.driver.result(transfer)).await {
                    Ok(Ok(bits)) => {
                        transfer.set_transferred_bits(bits);
                        received = transfer.received_bytes();
                        debug!(
                            "transfer complete: {} bits ({} bytes) received",
                            transfer.transferred_bits(),
                            received
                        );
                        self.hooks.finished(transfer);
                    }
                    Ok(Err(e)) => {
                        error!("failed to get result of transfer {}: {:?}", i, e);
                        *status = Err(e);
                    }
                    Err(_) => {
                        error!("timed out waiting for transfer {}", i);
                        *status = Err(DriverError::Timeout);
                    }
                }
            } else {
                error!("skip result of transfer {} because queueing failed", i);
            }

            self.publish(received, *status).await;
            // Records are visible before the count drops.
            let remaining = size - (i + 1);
            if remaining > 0 {
                self.channels.publish_in_flight(remaining);
            }
        }

        // The transfers are back with the session before the count reaches zero.
        if self.channels.done.try_send(transfers).is_err() {
            error!("failed to hand completed transfers back to the session");
        }
        self.channels.publish_in_flight(0);
        debug!("all requested transfers completed");
    }

    async fn publish(&self, received: usize, status: Status) {
        if PUBLISH_TIMEOUT
            .run(self.channels.results.send(received))
            .await
            .is_err()
        {
            error!("failed to publish received byte count: {}", received);
        }
        if PUBLISH_TIMEOUT
            .run(self.channels.errors.send(status))
            .await
            .is_err()
        {
            error!("failed to publish transfer status: {:?}", status);
        }
    }
}
