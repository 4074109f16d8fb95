use crate::config::SlaveConfig;
use crate::error::DriverError;
use crate::transfer::Transfer;

/// Low-level slave-mode peripheral driver.
///
/// Only the worker calls into the driver, and it never calls `queue` or
/// `result` after `release`. Transfers are queued in order and their results
/// are collected in the same order.
#[allow(async_fn_in_trait)]
pub trait SlaveDriver {
    /// Bind the peripheral to the configured host, pins and mode.
    async fn initialize(&mut self, config: &SlaveConfig) -> Result<(), DriverError>;

    /// Arm one transfer in the hardware queue.
    async fn queue(&mut self, transfer: &mut Transfer<'_>) -> Result<(), DriverError>;

    /// Wait for the master to clock the oldest armed transfer.
    ///
    /// `transfer` is the descriptor passed to the matching `queue` call; its
    /// `rx` buffer receives the data. Returns the number of bits transferred.
    async fn result(&mut self, transfer: &mut Transfer<'_>) -> Result<usize, DriverError>;

    /// Free the peripheral.
    fn release(&mut self);
}

/// Per-transfer callbacks run by the worker.
pub trait TransferHooks {
    /// The driver has armed `transfer`.
    fn armed(&mut self, _transfer: &Transfer<'_>) {}

    /// The master has clocked `transfer`; `rx` and `transferred_bits` are final.
    fn finished(&mut self, _transfer: &Transfer<'_>) {}
}

impl TransferHooks for () {}

impl<T: TransferHooks + ?Sized> TransferHooks for &mut T {
    fn armed(&mut self, transfer: &Transfer<'_>) {
        (**self).armed(transfer)
    }

    fn finished(&mut self, transfer: &Transfer<'_>) {
        (**self).finished(transfer)
    }
}

/// [`TransferHooks`] built from a pair of closures.
pub struct FnHooks<A, F> {
    armed: A,
    finished: F,
}

impl<A, F> FnHooks<A, F>
where
    A: FnMut(&Transfer<'_>),
    F: FnMut(&Transfer<'_>),
{
    pub fn new(armed: A, finished: F) -> Self {
        Self { armed, finished }
    }
}

impl<A, F> TransferHooks for FnHooks<A, F>
where
    A: FnMut(&Transfer<'_>),
    F: FnMut(&Transfer<'_>),
{
    fn armed(&mut self, transfer: &Transfer<'_>) {
        (self.armed)(transfer)
    }

    fn finished(&mut self, transfer: &Transfer<'_>) {
        (self.finished)(transfer)
    }
}
