use crate::defs::{I2C_ADDR, READ_CHUNK};

/// Transport settings for [`crate::FtsI2c`].
///
/// Defaults follow the FTM5 reference driver.
///
/// # Example
/// ```no_run
/// use fts_gesture::Config;
///
/// let config = Config::default().with_address(0x48).with_read_chunk(256);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
  /// Seven bit I²C address of the controller.
  pub address: u8,
  /// Largest number of bytes fetched by a single memory read.
  pub read_chunk: usize,
}

impl Config {
  pub const fn new(address: u8, read_chunk: usize) -> Self {
    Self { address, read_chunk }
  }

  pub const fn with_address(mut self, address: u8) -> Self {
    self.address = address;
    self
  }

  /// A chunk of zero is treated as one byte.
  pub const fn with_read_chunk(mut self, read_chunk: usize) -> Self {
    self.read_chunk = if read_chunk == 0 { 1 } else { read_chunk };
    self
  }
}

impl Default for Config {
  fn default() -> Self {
    Self::new(I2C_ADDR, READ_CHUNK)
  }
}
