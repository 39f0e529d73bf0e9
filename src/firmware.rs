use core::fmt::Debug;

use crate::{AddressWidth, Dummy, Feature, ScanMode};

/// Error type shared by the collaborator traits.
pub trait ErrorType {
  type Error: Debug;
}

impl<T: ErrorType + ?Sized> ErrorType for &mut T {
  type Error = T::Error;
}

/// Firmware operations the gesture core relies on.
///
/// Implementations are expected to handle any command echo or status polling
/// the transport needs; a returned `Ok` means the firmware accepted the
/// command.
#[allow(async_fn_in_trait)]
pub trait Firmware: ErrorType {
  /// Push a feature payload, such as the gesture mask, to the firmware.
  async fn set_feature(&mut self, feature: Feature, payload: &[u8]) -> Result<(), Self::Error>;

  /// Switch the firmware scan mode. `setting` is the mode specific parameter.
  async fn set_scan_mode(&mut self, mode: ScanMode, setting: u8) -> Result<(), Self::Error>;

  /// Fill `buf` from the frame buffer starting at `offset`.
  async fn read_frame_buffer(
    &mut self,
    width: AddressWidth,
    offset: u64,
    buf: &mut [u8],
    dummy: Dummy,
  ) -> Result<(), Self::Error>;
}

impl<T: Firmware + ?Sized> Firmware for &mut T {
  #[inline]
  async fn set_feature(&mut self, feature: Feature, payload: &[u8]) -> Result<(), Self::Error> {
    T::set_feature(self, feature, payload).await
  }

  #[inline]
  async fn set_scan_mode(&mut self, mode: ScanMode, setting: u8) -> Result<(), Self::Error> {
    T::set_scan_mode(self, mode, setting).await
  }

  #[inline]
  async fn read_frame_buffer(
    &mut self,
    width: AddressWidth,
    offset: u64,
    buf: &mut [u8],
    dummy: Dummy,
  ) -> Result<(), Self::Error> {
    T::read_frame_buffer(self, width, offset, buf, dummy).await
  }
}

/// Host side control of the controller interrupt line.
#[allow(async_fn_in_trait)]
pub trait Interrupts: ErrorType {
  /// Stop delivering controller interrupts to the event handler.
  async fn suspend(&mut self) -> Result<(), Self::Error>;

  /// Deliver controller interrupts again.
  async fn resume(&mut self) -> Result<(), Self::Error>;
}

impl<T: Interrupts + ?Sized> Interrupts for &mut T {
  #[inline]
  async fn suspend(&mut self) -> Result<(), Self::Error> {
    T::suspend(self).await
  }

  #[inline]
  async fn resume(&mut self) -> Result<(), Self::Error> {
    T::resume(self).await
  }
}
