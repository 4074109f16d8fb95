/// Failure reported by the peripheral driver for a single transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverError {
    /// The driver did not accept or complete the transfer within the batch timeout.
    Timeout,
    /// The transfer descriptor was rejected by the driver.
    InvalidArg,
    /// The peripheral was not in a state to accept the request.
    InvalidState,
    /// The driver ran out of transfer slots or DMA memory.
    NoMem,
    /// Any other vendor status code.
    Code(i32),
}

impl core::fmt::Display for DriverError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DriverError::Timeout => write!(f, "driver timed out"),
            DriverError::InvalidArg => write!(f, "invalid transfer argument"),
            DriverError::InvalidState => write!(f, "peripheral in invalid state"),
            DriverError::NoMem => write!(f, "out of transfer memory"),
            DriverError::Code(code) => write!(f, "driver error 0x{:X}", code),
        }
    }
}

/// Per-transfer status code carried by the error queue.
pub type Status = Result<(), DriverError>;

/// Errors found while validating a [`SlaveConfig`](crate::SlaveConfig).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// `queue_size` must be at least one.
    ZeroQueueSize,
    /// `queue_size` exceeds the storage reserved by the channels.
    QueueSizeTooLarge { requested: usize, capacity: usize },
    /// `max_transfer_size` must be at least one byte.
    ZeroMaxTransferSize,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::ZeroQueueSize => write!(f, "queue size must be non-zero"),
            ConfigError::QueueSizeTooLarge { requested, capacity } => write!(
                f,
                "queue size {} exceeds channel capacity {}",
                requested, capacity
            ),
            ConfigError::ZeroMaxTransferSize => {
                write!(f, "max transfer size must be non-zero")
            }
        }
    }
}

/// Errors returned by the [`Slave`](crate::Slave) session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlaveError {
    /// The session has not been started, or has been stopped.
    NotStarted,
    /// `start` was called on a session that is already running.
    AlreadyStarted,
    /// A previous worker never acknowledged its stop request.
    WorkerBusy,
    /// The worker failed to initialize the peripheral and has exited.
    WorkerFaulted,
    /// The configuration passed to `start` was rejected.
    InvalidConfig(ConfigError),
    /// The transfer is empty, too large, or its buffers are shorter than its size.
    InvalidTransfer,
    /// The pending batch already holds `capacity` transfers.
    QueueFull { capacity: usize },
    /// There is nothing queued to trigger.
    EmptyBatch,
    /// This many transfers of the previous batch have not completed yet.
    InFlight(usize),
    /// The worker did not take the batch within the timeout; the batch is dropped.
    HandoffTimeout,
    /// The expected results did not become ready within the timeout.
    WaitTimeout,
    /// The worker did not acknowledge the stop request in time.
    ShutdownTimeout,
}

impl core::fmt::Display for SlaveError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SlaveError::NotStarted => write!(f, "spi slave is not started"),
            SlaveError::AlreadyStarted => {
                write!(f, "spi slave is already started")
            }
            SlaveError::WorkerBusy => {
                write!(f, "previous worker has not terminated yet")
            }
            SlaveError::WorkerFaulted => {
                write!(f, "worker failed to initialize the peripheral")
            }
            SlaveError::InvalidConfig(e) => write!(f, "invalid config: {}", e),
            SlaveError::InvalidTransfer => write!(f, "invalid transfer"),
            SlaveError::QueueFull { capacity } => write!(
                f,
                "queue is full - only {} transfers can be queued at once",
                capacity
            ),
            SlaveError::EmptyBatch => write!(f, "no transfer is queued"),
            SlaveError::InFlight(n) => {
                write!(f, "{} transfers are still in flight", n)
            }
            SlaveError::HandoffTimeout => {
                write!(f, "transfer channel to the worker is full")
            }
            SlaveError::WaitTimeout => {
                write!(f, "timed out waiting for transfer results")
            }
            SlaveError::ShutdownTimeout => {
                write!(f, "timed out waiting for the worker to terminate")
            }
        }
    }
}

impl From<ConfigError> for SlaveError {
    fn from(e: ConfigError) -> Self {
        SlaveError::InvalidConfig(e)
    }
}
