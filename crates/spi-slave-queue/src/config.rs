//! Peripheral selection, pin mapping and interface options consumed once by
//! [`Slave::start`](crate::Slave::start).

use bitflags::bitflags;

use crate::error::ConfigError;

/// GPIO number, `-1` when the line is not used.
pub type Gpio = i8;

pub const UNUSED: Gpio = -1;

/// Largest transfer the peripheral accepts without DMA.
pub const DEFAULT_MAX_TRANSFER_SIZE: usize = 64;

pub const DEFAULT_QUEUE_SIZE: usize = 3;

/// Hardware SPI controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiHost {
    Spi1,
    Spi2,
    Spi3,
}

/// Bus names used by board support packages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiBus {
    Fspi,
    Hspi,
    Vspi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Chip {
    Esp32,
    Esp32C3,
    Esp32S3,
    Other,
}

impl SpiHost {
    /// Resolve a bus name to its controller on `chip`.
    pub const fn from_bus(bus: SpiBus, chip: Chip) -> Self {
        match (bus, chip) {
            (SpiBus::Fspi, Chip::Esp32) => SpiHost::Spi1,
            (SpiBus::Fspi, _) => SpiHost::Spi2,
            (SpiBus::Hspi, Chip::Esp32 | Chip::Esp32C3) => SpiHost::Spi2,
            (SpiBus::Hspi, _) => SpiHost::Spi3,
            (SpiBus::Vspi, Chip::Esp32) => SpiHost::Spi3,
            // VSPI only exists on the original ESP32.
            (SpiBus::Vspi, _) => SpiHost::Spi2,
        }
    }
}

/// Clock polarity and phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    #[default]
    Mode0,
    Mode1,
    Mode2,
    Mode3,
}

impl Mode {
    pub const fn cpol(self) -> bool {
        matches!(self, Mode::Mode2 | Mode::Mode3)
    }

    pub const fn cpha(self) -> bool {
        matches!(self, Mode::Mode1 | Mode::Mode3)
    }
}

impl TryFrom<u8> for Mode {
    type Error = u8;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Mode::Mode0),
            1 => Ok(Mode::Mode1),
            2 => Ok(Mode::Mode2),
            3 => Ok(Mode::Mode3),
            _ => Err(value),
        }
    }
}

bitflags! {
    /// Interface flags applied when the peripheral is initialized.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SlaveFlags: u32 {
        const TXBIT_LSBFIRST = 1 << 0;
        const RXBIT_LSBFIRST = 1 << 1;
        const BIT_LSBFIRST = Self::TXBIT_LSBFIRST.bits() | Self::RXBIT_LSBFIRST.bits();
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SlaveFlags {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "SlaveFlags({=u32:#x})", self.bits())
    }
}

/// Data line assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataLines {
    Standard { mosi: Gpio, miso: Gpio },
    Quad([Gpio; 4]),
    Octal([Gpio; 8]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pins {
    pub sclk: Gpio,
    pub cs: Gpio,
    pub data: DataLines,
}

impl Pins {
    pub const fn standard(sclk: Gpio, miso: Gpio, mosi: Gpio, cs: Gpio) -> Self {
        Self { sclk, cs, data: DataLines::Standard { mosi, miso } }
    }

    pub const fn quad(sclk: Gpio, cs: Gpio, data: [Gpio; 4]) -> Self {
        Self { sclk, cs, data: DataLines::Quad(data) }
    }

    pub const fn octal(sclk: Gpio, cs: Gpio, data: [Gpio; 8]) -> Self {
        Self { sclk, cs, data: DataLines::Octal(data) }
    }

    /// IO-MUX pins of the ESP32 HSPI/VSPI controllers.
    pub const fn esp32_default(bus: SpiBus) -> Self {
        match bus {
            SpiBus::Hspi => Self::standard(14, 12, 13, 15),
            SpiBus::Vspi | SpiBus::Fspi => Self::standard(18, 19, 23, 5),
        }
    }

    pub const fn data_width(&self) -> usize {
        match self.data {
            DataLines::Standard { .. } => 1,
            DataLines::Quad(_) => 4,
            DataLines::Octal(_) => 8,
        }
    }
}

impl Default for Pins {
    fn default() -> Self {
        Self::esp32_default(SpiBus::Vspi)
    }
}

/// Everything the worker needs to bind the peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlaveConfig {
    pub host: SpiHost,
    pub pins: Pins,
    pub mode: Mode,
    /// Maximum number of transfers in one batch.
    pub queue_size: usize,
    pub flags: SlaveFlags,
    /// Largest accepted transfer, in bytes.
    pub max_transfer_size: usize,
    /// Level driven on idle data lines.
    pub data_io_default_level: bool,
}

impl Default for SlaveConfig {
    fn default() -> Self {
        Self {
            host: SpiHost::Spi3,
            pins: Pins::default(),
            mode: Mode::Mode0,
            queue_size: DEFAULT_QUEUE_SIZE,
            flags: SlaveFlags::empty(),
            max_transfer_size: DEFAULT_MAX_TRANSFER_SIZE,
            data_io_default_level: false,
        }
    }
}

impl SlaveConfig {
    /// Default pins of `bus` on an ESP32.
    pub fn for_bus(bus: SpiBus) -> Self {
        Self {
            host: SpiHost::from_bus(bus, Chip::Esp32),
            pins: Pins::esp32_default(bus),
            ..Self::default()
        }
    }

    pub fn with_host(mut self, host: SpiHost) -> Self {
        self.host = host;
        self
    }

    pub fn with_pins(mut self, pins: Pins) -> Self {
        self.pins = pins;
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_queue_size(mut self, queue_size: usize) -> Self {
        self.queue_size = queue_size;
        self
    }

    pub fn with_flags(mut self, flags: SlaveFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_max_transfer_size(mut self, size: usize) -> Self {
        self.max_transfer_size = size;
        self
    }

    pub fn with_data_io_default_level(mut self, level: bool) -> Self {
        self.data_io_default_level = level;
        self
    }

    /// Check the config against channels holding `N` entries.
    pub fn validate<const N: usize>(&self) -> Result<(), ConfigError> {
        if self.queue_size == 0 {
            return Err(ConfigError::ZeroQueueSize);
        }
        if self.queue_size > N {
            return Err(ConfigError::QueueSizeTooLarge {
                requested: self.queue_size,
                capacity: N,
            });
        }
        if self.max_transfer_size == 0 {
            return Err(ConfigError::ZeroMaxTransferSize);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bus_maps_to_host_per_chip() {
        assert_eq!(SpiHost::from_bus(SpiBus::Fspi, Chip::Esp32), SpiHost::Spi1);
        assert_eq!(SpiHost::from_bus(SpiBus::Fspi, Chip::Esp32S3), SpiHost::Spi2);
        assert_eq!(SpiHost::from_bus(SpiBus::Hspi, Chip::Esp32), SpiHost::Spi2);
        assert_eq!(SpiHost::from_bus(SpiBus::Hspi, Chip::Esp32C3), SpiHost::Spi2);
        assert_eq!(SpiHost::from_bus(SpiBus::Hspi, Chip::Esp32S3), SpiHost::Spi3);
        assert_eq!(SpiHost::from_bus(SpiBus::Vspi, Chip::Esp32), SpiHost::Spi3);
        assert_eq!(SpiHost::from_bus(SpiBus::Vspi, Chip::Other), SpiHost::Spi2);
    }

    #[test]
    fn esp32_default_pins() {
        let vspi = SlaveConfig::for_bus(SpiBus::Vspi);
        assert_eq!(vspi.host, SpiHost::Spi3);
        assert_eq!(vspi.pins, Pins::standard(18, 19, 23, 5));

        let hspi = SlaveConfig::for_bus(SpiBus::Hspi);
        assert_eq!(hspi.host, SpiHost::Spi2);
        assert_eq!(hspi.pins.cs, 15);
        assert_eq!(hspi.pins.data, DataLines::Standard { mosi: 13, miso: 12 });
    }

    #[test]
    fn data_width_follows_lines() {
        assert_eq!(Pins::default().data_width(), 1);
        assert_eq!(Pins::quad(1, 2, [3, 4, 5, 6]).data_width(), 4);
        assert_eq!(Pins::octal(1, 2, [3; 8]).data_width(), 8);
    }

    #[test]
    fn mode_bits() {
        assert!(!Mode::Mode0.cpol() && !Mode::Mode0.cpha());
        assert!(!Mode::Mode1.cpol() && Mode::Mode1.cpha());
        assert!(Mode::Mode2.cpol() && !Mode::Mode2.cpha());
        assert!(Mode::Mode3.cpol() && Mode::Mode3.cpha());
        assert_eq!(Mode::try_from(3), Ok(Mode::Mode3));
        assert_eq!(Mode::try_from(4), Err(4));
    }

    #[test]
    fn lsb_first_covers_both_directions() {
        assert!(SlaveFlags::BIT_LSBFIRST.contains(SlaveFlags::TXBIT_LSBFIRST));
        assert!(SlaveFlags::BIT_LSBFIRST.contains(SlaveFlags::RXBIT_LSBFIRST));
    }

    #[test]
    fn validate_bounds_queue_size() {
        let config = SlaveConfig::default();
        assert_eq!(config.queue_size, 3);
        assert_eq!(config.validate::<3>(), Ok(()));
        assert_eq!(
            config.validate::<2>(),
            Err(ConfigError::QueueSizeTooLarge { requested: 3, capacity: 2 })
        );
        assert_eq!(
            config.with_queue_size(0).validate::<3>(),
            Err(ConfigError::ZeroQueueSize)
        );
        assert_eq!(
            config.with_max_transfer_size(0).validate::<3>(),
            Err(ConfigError::ZeroMaxTransferSize)
        );
    }
}
