#![no_std]
//! Non-blocking transaction queue for SPI peripherals in slave mode.
//!
//! A remote master decides when a slave transfer is clocked, so the caller
//! cannot wait on the peripheral directly. Instead a [`Slave`] session collects
//! [`Transfer`]s into a batch and hands the batch to a [`Worker`], the only
//! task that touches the [`SlaveDriver`]. The worker reports each transfer's
//! received byte count and status code back through bounded queues, and keeps
//! a single-slot in-flight counter the caller can poll at any time.
//!
//! Received data lands in the transfer's own receive buffer. Once the batch
//! completes, [`Slave::take_batch`] hands the transfers back so the buffers can
//! be read and reused. [`TransferHooks::finished`] sees each transfer as soon
//! as it is clocked.
//!
//! ```ignore
//! use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
//! use spi_slave_queue::{Slave, SlaveChannels, SlaveConfig, SlaveError, SpiBus, Transfer};
//! use static_cell::StaticCell;
//!
//! type Channels = SlaveChannels<'static, CriticalSectionRawMutex, 3>;
//! type AppWorker = spi_slave_queue::Worker<'static, 'static, CriticalSectionRawMutex, EspSlave, (), 3>;
//!
//! static CHANNELS: StaticCell<Channels> = StaticCell::new();
//! static RX: StaticCell<[u8; 8]> = StaticCell::new();
//!
//! #[embassy_executor::task]
//! async fn spi_slave_task(worker: AppWorker) {
//!     let _ = worker.run().await;
//! }
//!
//! let channels = CHANNELS.init(SlaveChannels::new());
//! let mut slave = Slave::new(channels);
//! let worker = slave.start(driver, (), SlaveConfig::for_bus(SpiBus::Vspi))?;
//! high_prio_spawner.must_spawn(spi_slave_task(worker));
//!
//! let mut rx: &'static mut [u8] = RX.init([0; 8]);
//! loop {
//!     slave.transfer(Transfer::duplex(TX, rx, 8), 1000).await?;
//!     let done = slave.take_batch().pop().ok_or(SlaveError::EmptyBatch)?;
//!     handle(done.rx().unwrap_or_default());
//!     rx = done.into_rx().ok_or(SlaveError::InvalidTransfer)?;
//! }
//! ```

// This mod MUST go first, so that the others see its macros.
mod fmt;

mod channels;
mod config;
mod driver;
mod error;
mod session;
mod timeout;
mod transfer;
mod worker;

pub use channels::{SlaveChannels, WorkerState};
pub use config::{
    Chip, DataLines, Gpio, Mode, Pins, SlaveConfig, SlaveFlags, SpiBus,
    SpiHost, DEFAULT_MAX_TRANSFER_SIZE, DEFAULT_QUEUE_SIZE, UNUSED,
};
pub use driver::{FnHooks, SlaveDriver, TransferHooks};
pub use error::{ConfigError, DriverError, SlaveError, Status};
pub use session::{Completion, Slave};
pub use timeout::Timeout;
pub use transfer::Transfer;
pub use worker::Worker;
