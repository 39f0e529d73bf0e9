use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::defs::{EventByte, EVT_ID_USER_REPORT, EVT_MIN_GESTURE_LEN, EVT_TYPE_USER_GESTURE, MAX_COORD_PAIRS};
use crate::{AddressWidth, Dummy, Error, Firmware, FtsGesture, Interrupts};

/// Gesture report as found in the firmware event FIFO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GestureEvent {
  /// Raw gesture id, not interpreted by this crate.
  pub gesture_id: u8,
  /// Frame buffer offset of the coordinate trace.
  pub offset: u16,
  /// Number of coordinate pairs the firmware reported.
  pub pairs: u8,
}

impl GestureEvent {
  /// Reported pairs, clamped to what the driver can hold.
  pub fn pairs(&self) -> usize {
    (self.pairs as usize).min(MAX_COORD_PAIRS)
  }
}

impl TryFrom<&[u8]> for GestureEvent {
  type Error = ();

  fn try_from(event: &[u8]) -> Result<Self, Self::Error> {
    if event.len() < EVT_MIN_GESTURE_LEN
      || event[EventByte::Id as usize] != EVT_ID_USER_REPORT
      || event[EventByte::Kind as usize] != EVT_TYPE_USER_GESTURE
    {
      return Err(());
    }

    Ok(Self {
      gesture_id: event[EventByte::GestureId as usize],
      offset: u16::from_le_bytes([event[EventByte::OffsetLow as usize], event[EventByte::OffsetHigh as usize]]),
      pairs: event[EventByte::Pairs as usize],
    })
  }
}

#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Point {
  pub x: u16,
  pub y: u16,
}

impl Point {
  pub const fn new(x: u16, y: u16) -> Self {
    Self { x, y }
  }
}

impl core::fmt::Debug for Point {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    write!(f, "({}, {})", self.x, self.y)
  }
}

/// Coordinate trace of the last decoded gesture.
#[derive(Clone)]
pub struct Coordinates {
  x: [u16; MAX_COORD_PAIRS],
  y: [u16; MAX_COORD_PAIRS],
  /// `None` until a decode succeeds, and again after a failed read.
  count: Option<usize>,
  gesture_id: u8,
}

impl Coordinates {
  pub const fn new() -> Self {
    Self { x: [0; MAX_COORD_PAIRS], y: [0; MAX_COORD_PAIRS], count: None, gesture_id: 0 }
  }

  pub const fn count(&self) -> Option<usize> {
    self.count
  }

  /// X coordinates of the trace, empty when there is none.
  pub fn x(&self) -> &[u16] {
    &self.x[..self.count.unwrap_or(0)]
  }

  /// Y coordinates of the trace, empty when there is none.
  pub fn y(&self) -> &[u16] {
    &self.y[..self.count.unwrap_or(0)]
  }

  pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
    self.x().iter().zip(self.y()).map(|(&x, &y)| Point::new(x, y))
  }

  /// Gesture id of the event the trace came from.
  pub const fn gesture_id(&self) -> Option<u8> {
    match self.count {
      Some(_) => Some(self.gesture_id),
      None => None,
    }
  }

  pub(crate) fn invalidate(&mut self) {
    self.count = None;
  }

  /// Unpack `pairs` coordinates from `raw`: all x words first, then all y
  /// words, each a 12-bit value in a little-endian 16-bit slot.
  pub(crate) fn fill(&mut self, gesture_id: u8, pairs: usize, raw: &[u8]) {
    let (xs, ys) = raw.split_at(pairs * 2);
    for (i, (x, y)) in xs.chunks_exact(2).zip(ys.chunks_exact(2)).enumerate() {
      self.x[i] = unpack(x);
      self.y[i] = unpack(y);
    }
    self.gesture_id = gesture_id;
    self.count = Some(pairs);
  }
}

impl Default for Coordinates {
  fn default() -> Self {
    Self::new()
  }
}

impl core::fmt::Debug for Coordinates {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("Coordinates")
      .field("count", &self.count)
      .field("x", &self.x())
      .field("y", &self.y())
      .finish()
  }
}

#[inline]
fn unpack(word: &[u8]) -> u16 {
  u16::from_le_bytes([word[0], word[1] & 0x0F])
}

impl<F, IRQ, M> FtsGesture<'_, F, IRQ, M>
where
  F: Firmware,
  IRQ: Interrupts,
  M: RawMutex,
{
  /// Read the coordinate trace of a gesture event from the frame buffer.
  ///
  /// `event` is the raw FIFO event. Returns the number of pairs decoded, which
  /// is the reported count clamped to [`crate::MAX_COORD_PAIRS`]. A failed read
  /// clears the stored trace.
  pub async fn read_gesture_coordinates(&mut self, event: &[u8]) -> Result<usize, Error<F::Error, IRQ::Error>> {
    let Ok(report) = GestureEvent::try_from(event) else {
      error!("gesture coordinates: event is not a gesture report");
      return Err(Error::InvalidEvent);
    };

    let pairs = report.pairs();
    if pairs < report.pairs as usize {
      warn!("gesture coordinates: firmware reported {} pairs, keeping {}", report.pairs, pairs);
    }
    debug!("gesture coordinates: offset {:#x}, pairs {}", report.offset, pairs);

    // x and y words, two bytes each
    let mut raw = [0u8; MAX_COORD_PAIRS * 4];
    let raw = &mut raw[..pairs * 4];
    if let Err(e) =
      self.firmware.read_frame_buffer(AddressWidth::Bits16, report.offset as u64, raw, Dummy::Present).await
    {
      error!("gesture coordinates: cannot read the frame buffer");
      self.coordinates.invalidate();
      return Err(Error::Io(e));
    }

    self.coordinates.fill(report.gesture_id, pairs, raw);
    debug!("gesture coordinates: read done");
    Ok(pairs)
  }

  /// X and Y coordinates of the last decoded gesture.
  ///
  /// `None` when no gesture was decoded yet or the last read failed.
  pub fn coordinates(&self) -> Option<(&[u16], &[u16])> {
    debug!("gesture coordinates: {} pairs returned", self.coordinates.count().unwrap_or(0));
    self.coordinates.count().map(|_| (self.coordinates.x(), self.coordinates.y()))
  }

  /// Number of pairs of the last decoded gesture.
  pub fn coordinate_count(&self) -> Option<usize> {
    self.coordinates.count()
  }

  /// Raw id of the last decoded gesture.
  pub fn last_gesture(&self) -> Option<u8> {
    self.coordinates.gesture_id()
  }

  /// Full trace of the last decoded gesture.
  pub fn trace(&self) -> &Coordinates {
    &self.coordinates
  }
}
