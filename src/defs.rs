/******************************************************************************
 * Refer to the FTM5 host interface documentation for more information.       *
 * ========================================================================== *
 *                FTM5 - Commands, Events & Firmware Constants                *
*******************************************************************************/

/// Size in bytes of the gesture mask understood by the firmware.
pub const MASK_SIZE: usize = 4;
/// Maximum number of coordinate pairs kept for a single gesture.
pub const MAX_COORD_PAIRS: usize = 100;

pub(crate) const I2C_ADDR: u8 = 0x49;
pub(crate) const READ_CHUNK: usize = 1024;

// Enable discriminants used by the raw mask request
pub(crate) const FEAT_ENABLE: u8 = 1;
pub(crate) const FEAT_DISABLE: u8 = 0;

// FIFO event layout
pub(crate) const EVT_ID_USER_REPORT: u8 = 0x23;
pub(crate) const EVT_TYPE_USER_GESTURE: u8 = 0x02;
pub(crate) const EVT_MIN_GESTURE_LEN: usize = 6;

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum EventByte {
  Id = 0,
  Kind = 1,
  GestureId = 2,
  OffsetLow = 3,
  OffsetHigh = 4,
  Pairs = 5,
}

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Cmd {
  ScanMode = 0xA0,
  Feature = 0xA2,
  FrameBufferRead = 0xA6,
}

impl From<Cmd> for u8 {
  #[inline]
  fn from(c: Cmd) -> Self {
    c as u8
  }
}

/// Feature selector sent with [`crate::Firmware::set_feature`].
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Feature {
  Glove = 0x00,
  Gesture = 0x01,
  Stylus = 0x02,
  Cover = 0x04,
  Charger = 0x05,
  Grip = 0x06,
  Corner = 0x07,
}

impl From<Feature> for u8 {
  fn from(f: Feature) -> Self {
    f as u8
  }
}

/// Scan modes of the sensing firmware.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScanMode {
  Hibernate = 0x00,
  Active = 0x01,
  /// Low-power scanning with gesture detection.
  LowPower = 0x02,
  Locked = 0x03,
}

impl From<ScanMode> for u8 {
  fn from(m: ScanMode) -> Self {
    m as u8
  }
}

/// Width of the address that follows a memory read command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AddressWidth {
  Bits8,
  Bits16,
  Bits24,
  Bits32,
  Bits64,
}

impl AddressWidth {
  /// Number of address bytes on the wire.
  pub const fn bytes(self) -> usize {
    match self {
      AddressWidth::Bits8 => 1,
      AddressWidth::Bits16 => 2,
      AddressWidth::Bits24 => 3,
      AddressWidth::Bits32 => 4,
      AddressWidth::Bits64 => 8,
    }
  }
}

/// Whether the firmware prepends a dummy byte to memory read responses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dummy {
  Absent,
  /// Frame buffer reads carry one leading dummy byte.
  Present,
}

impl Dummy {
  /// Number of dummy bytes preceding the payload.
  pub const fn bytes(self) -> usize {
    match self {
      Dummy::Absent => 0,
      Dummy::Present => 1,
    }
  }
}
