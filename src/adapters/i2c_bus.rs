//! I²C adapter with a deadline on every transfer.
//!
//! [`BoundedI2c`] implements `embedded_hal::i2c::I2c` on top of any
//! [`DeadlineBus`].  On target that is the ESP-IDF `I2cDriver`, whose own
//! `embedded-hal` impl waits forever on a hung bus.
//!
//! Each operation of a transaction goes out as its own bus transfer, so
//! there is no repeated start between them.  The SHT3x protocol issues
//! the command write and the frame read as separate transactions anyway.

use core::fmt::Debug;

use embedded_hal::i2c::{self, ErrorKind, ErrorType, I2c, Operation};

/// Upper bound on a single write or read.
pub const BUS_TIMEOUT_MS: u32 = 100;

/// Blocking bus transfers that give up after `timeout_ms`.
pub trait DeadlineBus {
    type Error: Debug;

    fn write_within(
        &mut self,
        addr: u8,
        bytes: &[u8],
        timeout_ms: u32,
    ) -> Result<(), Self::Error>;

    fn read_within(
        &mut self,
        addr: u8,
        buf: &mut [u8],
        timeout_ms: u32,
    ) -> Result<(), Self::Error>;

    fn error_kind(_err: &Self::Error) -> ErrorKind {
        ErrorKind::Other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusError<E> {
    kind: ErrorKind,
    cause: E,
}

impl<E> BusError<E> {
    pub fn cause(&self) -> &E {
        &self.cause
    }
}

impl<E: Debug> i2c::Error for BusError<E> {
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

pub struct BoundedI2c<B> {
    bus: B,
    timeout_ms: u32,
}

impl<B: DeadlineBus> BoundedI2c<B> {
    pub fn new(bus: B) -> Self {
        Self::with_timeout(bus, BUS_TIMEOUT_MS)
    }

    pub fn with_timeout(bus: B, timeout_ms: u32) -> Self {
        Self { bus, timeout_ms }
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    pub fn release(self) -> B {
        self.bus
    }

    fn wrap(cause: B::Error) -> BusError<B::Error> {
        BusError {
            kind: B::error_kind(&cause),
            cause,
        }
    }
}

impl<B: DeadlineBus> ErrorType for BoundedI2c<B> {
    type Error = BusError<B::Error>;
}

impl<B: DeadlineBus> I2c for BoundedI2c<B> {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        for op in operations {
            let done = match op {
                Operation::Write(bytes) => self.bus.write_within(address, bytes, self.timeout_ms),
                Operation::Read(buf) => self.bus.read_within(address, buf, self.timeout_ms),
            };
            done.map_err(Self::wrap)?;
        }
        Ok(())
    }
}

#[cfg(target_os = "espidf")]
impl DeadlineBus for esp_idf_hal::i2c::I2cDriver<'_> {
    type Error = esp_idf_hal::sys::EspError;

    fn write_within(
        &mut self,
        addr: u8,
        bytes: &[u8],
        timeout_ms: u32,
    ) -> Result<(), Self::Error> {
        let ticks = esp_idf_hal::delay::TickType::new_millis(u64::from(timeout_ms));
        self.write(addr, bytes, ticks.into())
    }

    fn read_within(
        &mut self,
        addr: u8,
        buf: &mut [u8],
        timeout_ms: u32,
    ) -> Result<(), Self::Error> {
        let ticks = esp_idf_hal::delay::TickType::new_millis(u64::from(timeout_ms));
        self.read(addr, buf, ticks.into())
    }
}
