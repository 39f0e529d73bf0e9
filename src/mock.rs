//! Recording collaborators for unit tests.
extern crate std;

use core::cell::RefCell;
use std::vec::Vec;

use crate::{AddressWidth, Dummy, ErrorType, Feature, Firmware, Interrupts, ScanMode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
  Suspend,
  Resume,
  Feature(Feature, Vec<u8>),
  ScanMode(ScanMode, u8),
  Read { width: AddressWidth, offset: u64, len: usize, dummy: Dummy },
  /// Marker pushed by tests around concurrent work.
  Staged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MockError(pub(crate) u8);

/// Call log shared by the mocks of one test.
#[derive(Default)]
pub(crate) struct Log(RefCell<Vec<Call>>);

impl Log {
  pub(crate) fn push(&self, call: Call) {
    self.0.borrow_mut().push(call);
  }

  pub(crate) fn calls(&self) -> Vec<Call> {
    self.0.borrow().clone()
  }
}

pub(crate) struct MockFirmware<'a> {
  log: &'a Log,
  pub(crate) fail_feature: Option<MockError>,
  pub(crate) fail_scan: Option<MockError>,
  pub(crate) fail_read: Option<MockError>,
  /// Yield once inside `set_feature` so other futures get polled.
  pub(crate) yield_on_feature: bool,
  /// Frame buffer contents served from offset 0 of each read.
  pub(crate) frame: Vec<u8>,
}

impl<'a> MockFirmware<'a> {
  pub(crate) fn new(log: &'a Log) -> Self {
    Self { log, fail_feature: None, fail_scan: None, fail_read: None, yield_on_feature: false, frame: Vec::new() }
  }
}

impl ErrorType for MockFirmware<'_> {
  type Error = MockError;
}

impl Firmware for MockFirmware<'_> {
  async fn set_feature(&mut self, feature: Feature, payload: &[u8]) -> Result<(), Self::Error> {
    self.log.push(Call::Feature(feature, payload.to_vec()));
    if self.yield_on_feature {
      embassy_futures::yield_now().await;
    }
    self.fail_feature.map_or(Ok(()), Err)
  }

  async fn set_scan_mode(&mut self, mode: ScanMode, setting: u8) -> Result<(), Self::Error> {
    self.log.push(Call::ScanMode(mode, setting));
    self.fail_scan.map_or(Ok(()), Err)
  }

  async fn read_frame_buffer(
    &mut self,
    width: AddressWidth,
    offset: u64,
    buf: &mut [u8],
    dummy: Dummy,
  ) -> Result<(), Self::Error> {
    self.log.push(Call::Read { width, offset, len: buf.len(), dummy });
    if let Some(e) = self.fail_read {
      return Err(e);
    }
    for (i, b) in buf.iter_mut().enumerate() {
      *b = self.frame.get(i).copied().unwrap_or(0);
    }
    Ok(())
  }
}

pub(crate) struct MockIrq<'a> {
  log: &'a Log,
  pub(crate) fail_suspend: Option<MockError>,
  pub(crate) fail_resume: Option<MockError>,
}

impl<'a> MockIrq<'a> {
  pub(crate) fn new(log: &'a Log) -> Self {
    Self { log, fail_suspend: None, fail_resume: None }
  }
}

impl ErrorType for MockIrq<'_> {
  type Error = MockError;
}

impl Interrupts for MockIrq<'_> {
  async fn suspend(&mut self) -> Result<(), Self::Error> {
    self.log.push(Call::Suspend);
    self.fail_suspend.map_or(Ok(()), Err)
  }

  async fn resume(&mut self) -> Result<(), Self::Error> {
    self.log.push(Call::Resume);
    self.fail_resume.map_or(Ok(()), Err)
  }
}
