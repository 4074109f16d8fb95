#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use spi_slave_queue::{DriverError, SlaveConfig, SlaveDriver, Transfer, TransferHooks};

// ---------------------------------------------------------------------------
// Mock master
// ---------------------------------------------------------------------------

/// What the remote master does with the next queued transfer.
#[derive(Debug, Clone)]
pub enum Step {
    /// Clock `bits` bits, sending `mosi` to the slave.
    Clock { mosi: Vec<u8>, bits: Option<usize> },
    /// The driver refuses to arm the transfer.
    QueueFails(DriverError),
    /// The transfer is armed but its result reports an error.
    ResultFails(DriverError),
    /// The master never clocks the transfer.
    Stall,
}

impl Step {
    /// Clock the full armed length, sending `mosi`.
    pub fn clock(mosi: &[u8]) -> Self {
        Step::Clock { mosi: mosi.to_vec(), bits: None }
    }

    /// Clock only `bits` bits.
    pub fn partial(mosi: &[u8], bits: usize) -> Self {
        Step::Clock { mosi: mosi.to_vec(), bits: Some(bits) }
    }
}

/// Everything the mock observed, shared with the test body.
#[derive(Debug, Default)]
pub struct MasterLog {
    pub initialized: usize,
    pub released: usize,
    pub queued: usize,
    pub config: Option<SlaveConfig>,
    /// Bytes the slave shifted out, one entry per clocked transfer.
    pub miso: Vec<Vec<u8>>,
}

pub struct MockMaster {
    script: VecDeque<Step>,
    armed: VecDeque<Step>,
    init_error: Option<DriverError>,
    log: Rc<RefCell<MasterLog>>,
}

impl MockMaster {
    pub fn new(script: impl IntoIterator<Item = Step>) -> Self {
        Self {
            script: script.into_iter().collect(),
            armed: VecDeque::new(),
            init_error: None,
            log: Rc::new(RefCell::new(MasterLog::default())),
        }
    }

    pub fn failing_init(error: DriverError) -> Self {
        let mut master = Self::new([]);
        master.init_error = Some(error);
        master
    }

    pub fn log(&self) -> Rc<RefCell<MasterLog>> {
        self.log.clone()
    }
}

impl SlaveDriver for MockMaster {
    async fn initialize(&mut self, config: &SlaveConfig) -> Result<(), DriverError> {
        if let Some(e) = self.init_error {
            return Err(e);
        }
        let mut log = self.log.borrow_mut();
        log.initialized += 1;
        log.config = Some(*config);
        Ok(())
    }

    async fn queue(&mut self, _transfer: &mut Transfer<'_>) -> Result<(), DriverError> {
        let step = self.script.pop_front().unwrap_or(Step::Clock { mosi: Vec::new(), bits: None });
        if let Step::QueueFails(e) = step {
            return Err(e);
        }
        self.log.borrow_mut().queued += 1;
        self.armed.push_back(step);
        Ok(())
    }

    async fn result(&mut self, transfer: &mut Transfer<'_>) -> Result<usize, DriverError> {
        // Let the session observe intermediate progress.
        embassy_futures::yield_now().await;

        match self.armed.pop_front() {
            Some(Step::Clock { mosi, bits }) => {
                let bits = bits.unwrap_or(transfer.length_bits());
                let len = (bits / 8).min(transfer.size());
                if let Some(tx) = transfer.tx() {
                    self.log.borrow_mut().miso.push(tx[..len].to_vec());
                }
                if let Some(rx) = transfer.rx_mut() {
                    let n = len.min(mosi.len());
                    rx[..n].copy_from_slice(&mosi[..n]);
                }
                Ok(bits)
            }
            Some(Step::ResultFails(e)) => Err(e),
            Some(Step::Stall) => core::future::pending().await,
            Some(Step::QueueFails(_)) | None => Err(DriverError::InvalidState),
        }
    }

    fn release(&mut self) {
        self.log.borrow_mut().released += 1;
    }
}

// ---------------------------------------------------------------------------
// Hook recorder
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct Recorder {
    /// Context values of armed transfers.
    pub armed: Vec<usize>,
    /// Context value and received bytes of finished transfers.
    pub finished: Vec<(usize, Vec<u8>)>,
}

impl TransferHooks for Recorder {
    fn armed(&mut self, transfer: &Transfer<'_>) {
        self.armed.push(transfer.context());
    }

    fn finished(&mut self, transfer: &Transfer<'_>) {
        let received = transfer
            .rx()
            .map(|rx| rx[..transfer.received_bytes()].to_vec())
            .unwrap_or_default();
        self.finished.push((transfer.context(), received));
    }
}
