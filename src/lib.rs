#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Async, `no_std` gesture-mode core for STMicroelectronics FTM5 touch
//! controllers.
//!
//! FTM5 firmware can keep sensing in a low-power scan mode and wake the host
//! only when the user draws one of the enabled gestures. This crate owns the
//! host side of that feature:
//!
//! - A [`MaskStore`] holding the gesture enable mask and a dirty flag behind a
//!   single async mutex, so any task can stage mask changes
//! - [`FtsGesture::enable_gesture`] / [`FtsGesture::disable_gesture`] to merge
//!   and push the mask synchronously
//! - [`FtsGesture::enter_gesture_mode`], which suspends the interrupt line,
//!   re-pushes a stale mask, switches to [`ScanMode::LowPower`] and always
//!   resumes the interrupt line, reporting every failure it saw
//! - [`FtsGesture::read_gesture_coordinates`] to decode the 12-bit coordinate
//!   trace the firmware leaves in its frame buffer after a gesture event
//!
//! Bus access and interrupt control are abstracted by the [`Firmware`] and
//! [`Interrupts`] traits. [`FtsI2c`] implements [`Firmware`] on top of any
//! `embedded-hal-async` I²C bus.
//!
//! ```no_run
//! use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
//! use embedded_hal_async::i2c::{I2c, SevenBitAddress};
//! use fts_gesture::{Config, FtsGesture, FtsI2c, GestureMask, Interrupts, MaskStore};
//!
//! static MASK: MaskStore<CriticalSectionRawMutex> = MaskStore::new();
//!
//! async fn example<I2C, IRQ>(i2c: I2C, irq: IRQ, event: &[u8]) -> Result<(), fts_gesture::Error<fts_gesture::TransportError<I2C::Error>, IRQ::Error>>
//! where
//!   I2C: I2c<SevenBitAddress>,
//!   IRQ: Interrupts,
//! {
//!   let mut touch = FtsGesture::new(FtsI2c::new(i2c, Config::default()), irq, &MASK);
//!
//!   let double_tap = GestureMask::new().with(0x01);
//!   touch.enable_gesture(Some(double_tap.as_bytes())).await?;
//!   touch.enter_gesture_mode(false).await?;
//!
//!   // Later, from the event handler
//!   touch.read_gesture_coordinates(event).await?;
//!   if let Some((x, y)) = touch.coordinates() {
//!     let _ = (x, y);
//!   }
//!   Ok(())
//! }
//! ```

#[macro_use]
mod fmt;

mod config;
mod control;
mod defs;
mod event;
mod firmware;
mod i2c;
mod mask;
#[cfg(test)]
mod mock;

use core::fmt::{Debug, Display, Formatter};

use embassy_sync::blocking_mutex::raw::RawMutex;

pub use config::*;
pub use defs::{AddressWidth, Dummy, Feature, ScanMode, MASK_SIZE, MAX_COORD_PAIRS};
pub use event::{Coordinates, GestureEvent, Point};
pub use firmware::*;
pub use i2c::*;
pub use mask::*;

/// Errors that can occur while driving gesture mode.
///
/// `E` is the [`Firmware`] error and `I` the [`Interrupts`] error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E, I> {
  /// A required buffer was missing or empty.
  InvalidArgument,
  /// The mask delta is longer than [`MASK_SIZE`] bytes.
  InvalidSize(usize),
  /// The enable discriminant is neither enable nor disable.
  InvalidEnableValue(u8),
  /// The event is not a user gesture report.
  InvalidEvent,
  /// A firmware transaction failed.
  Io(E),
  /// Interrupts could not be suspended; nothing else was attempted.
  Interrupt(I),
  /// Interrupts could not be resumed after a gesture mode transition.
  ///
  /// `io` carries the firmware failure that happened before, if any.
  Unwind { io: Option<E>, interrupt: I },
}

impl<E, I> Error<E, I> {
  /// The firmware failure behind this error, if there is one.
  pub fn io(&self) -> Option<&E> {
    match self {
      Error::Io(e) | Error::Unwind { io: Some(e), .. } => Some(e),
      _ => None,
    }
  }

  /// The interrupt control failure behind this error, if there is one.
  pub fn interrupt(&self) -> Option<&I> {
    match self {
      Error::Interrupt(i) | Error::Unwind { interrupt: i, .. } => Some(i),
      _ => None,
    }
  }
}

impl<E, I> From<MaskError> for Error<E, I> {
  fn from(e: MaskError) -> Self {
    match e {
      MaskError::InvalidArgument => Error::InvalidArgument,
      MaskError::InvalidSize(size) => Error::InvalidSize(size),
      MaskError::InvalidEnableValue(v) => Error::InvalidEnableValue(v),
    }
  }
}

impl<E: Debug, I: Debug> Display for Error<E, I> {
  fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
    match self {
      Error::InvalidArgument => f.write_str("missing mask buffer"),
      Error::InvalidSize(size) => write!(f, "mask size {size} exceeds {MASK_SIZE} bytes"),
      Error::InvalidEnableValue(v) => write!(f, "invalid enable value {v}"),
      Error::InvalidEvent => f.write_str("event is not a gesture report"),
      Error::Io(e) => write!(f, "firmware transaction failed: {e:?}"),
      Error::Interrupt(i) => write!(f, "cannot suspend interrupts: {i:?}"),
      Error::Unwind { io: Some(e), interrupt } => {
        write!(f, "firmware transaction failed: {e:?}; cannot resume interrupts: {interrupt:?}")
      }
      Error::Unwind { io: None, interrupt } => write!(f, "cannot resume interrupts: {interrupt:?}"),
    }
  }
}

/// Gesture-mode driver for an FTM5 controller.
///
/// The driver owns the firmware transport and interrupt control, and borrows
/// the [`MaskStore`] so other tasks can keep staging mask updates through a
/// shared reference while the driver runs. Operations that talk to the
/// firmware take `&mut self`, which keeps mode entry and coordinate decoding
/// single-threaded per device.
pub struct FtsGesture<'m, F, IRQ, M: RawMutex> {
  firmware: F,
  interrupts: IRQ,
  mask: &'m MaskStore<M>,
  coordinates: Coordinates,
}

impl<'m, F, IRQ, M> FtsGesture<'m, F, IRQ, M>
where
  F: Firmware,
  IRQ: Interrupts,
  M: RawMutex,
{
  /// Create a driver around the firmware transport, the interrupt control and
  /// the shared mask store.
  ///
  /// Nothing is sent to the device until one of the gesture operations runs.
  pub fn new(firmware: F, interrupts: IRQ, mask: &'m MaskStore<M>) -> Self {
    Self { firmware, interrupts, mask, coordinates: Coordinates::new() }
  }

  /// The mask store this driver pushes from.
  pub fn mask(&self) -> &'m MaskStore<M> {
    self.mask
  }

  /// Give back the firmware transport and interrupt control.
  pub fn release(self) -> (F, IRQ) {
    (self.firmware, self.interrupts)
  }
}
