use core::fmt::{Display, Formatter};

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};

use crate::defs::{FEAT_DISABLE, FEAT_ENABLE, MASK_SIZE};

/// Errors raised by [`MaskStore`] before the mask is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MaskError {
  /// The request carried no mask buffer.
  InvalidArgument,
  /// The delta is longer than [`MASK_SIZE`] bytes.
  InvalidSize(usize),
  /// The enable discriminant is neither enable nor disable.
  InvalidEnableValue(u8),
}

impl Display for MaskError {
  fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
    match self {
      MaskError::InvalidArgument => f.write_str("missing mask buffer"),
      MaskError::InvalidSize(size) => write!(f, "mask size {size} exceeds {MASK_SIZE} bytes"),
      MaskError::InvalidEnableValue(v) => write!(f, "invalid enable value {v}"),
    }
  }
}

/// How a delta is merged into the stored mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
  /// Clear the gestures of the delta that are currently enabled.
  Disable,
  /// Set every gesture of the delta, keeping the others as they are.
  Enable,
}

impl From<Action> for u8 {
  fn from(a: Action) -> Self {
    match a {
      Action::Disable => FEAT_DISABLE,
      Action::Enable => FEAT_ENABLE,
    }
  }
}

impl TryFrom<u8> for Action {
  type Error = MaskError;

  fn try_from(v: u8) -> Result<Self, Self::Error> {
    match v {
      FEAT_ENABLE => Ok(Self::Enable),
      FEAT_DISABLE => Ok(Self::Disable),
      _ => Err(MaskError::InvalidEnableValue(v)),
    }
  }
}

/// Whether any gesture of a mask is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FeatureState {
  Disabled,
  Enabled,
}

impl FeatureState {
  pub const fn is_enabled(self) -> bool {
    matches!(self, FeatureState::Enabled)
  }
}

/// Gesture enable mask as understood by the firmware.
///
/// Gesture id `n` maps to bit `n % 8` of byte `n / 8`. Ids beyond the mask
/// width are ignored by the bit helpers.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GestureMask([u8; MASK_SIZE]);

impl GestureMask {
  /// A mask with every gesture disabled.
  pub const fn new() -> Self {
    Self([0; MASK_SIZE])
  }

  pub const fn from_bytes(bytes: [u8; MASK_SIZE]) -> Self {
    Self(bytes)
  }

  /// Builder form of [`GestureMask::set`].
  pub const fn with(mut self, id: u8) -> Self {
    let byte = id as usize / 8;
    if byte < MASK_SIZE {
      self.0[byte] |= 1 << (id % 8);
    }
    self
  }

  pub fn set(&mut self, id: u8) {
    *self = self.with(id);
  }

  pub fn clear(&mut self, id: u8) {
    if let Some(byte) = self.0.get_mut(id as usize / 8) {
      *byte &= !(1 << (id % 8));
    }
  }

  pub fn contains(&self, id: u8) -> bool {
    self.0.get(id as usize / 8).is_some_and(|byte| byte & (1 << (id % 8)) != 0)
  }

  pub const fn as_bytes(&self) -> &[u8; MASK_SIZE] {
    &self.0
  }

  /// `true` when no gesture is enabled.
  pub fn is_empty(&self) -> bool {
    !self.state().is_enabled()
  }

  /// Report whether any gesture is enabled.
  pub fn state(&self) -> FeatureState {
    // The last byte is evaluated even when the scan runs off the end.
    let mut i = 0;
    while i < MASK_SIZE - 1 && self.0[i] == 0 {
      i += 1;
    }

    if self.0[i] != 0 {
      FeatureState::Enabled
    } else {
      FeatureState::Disabled
    }
  }

  /// Merge `delta`, starting from the least significant byte.
  pub(crate) fn merge(&mut self, delta: &[u8], action: Action) {
    for (mask, delta) in self.0.iter_mut().zip(delta) {
      match action {
        Action::Enable => *mask |= delta,
        Action::Disable => *mask &= *mask ^ delta,
      }
    }
  }
}

impl AsRef<[u8]> for GestureMask {
  fn as_ref(&self) -> &[u8] {
    &self.0
  }
}

impl core::fmt::Debug for GestureMask {
  fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
    write!(f, "GestureMask({:02x?})", self.0)
  }
}

pub(crate) struct MaskState {
  pub(crate) mask: GestureMask,
  /// Set when the firmware copy of the mask may be stale.
  pub(crate) dirty: bool,
}

/// Shared gesture mask plus the flag telling whether the firmware needs it
/// again.
///
/// Every read-modify-write happens under one async mutex, so the store can
/// live in a `static` and be updated from any task:
///
/// ```no_run
/// use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
/// use fts_gesture::{Action, MaskStore};
///
/// static MASK: MaskStore<CriticalSectionRawMutex> = MaskStore::new();
///
/// async fn stage() {
///   MASK.update(&[0x02], Action::Enable).await.ok();
/// }
/// ```
pub struct MaskStore<M: RawMutex> {
  state: Mutex<M, MaskState>,
}

impl<M: RawMutex> MaskStore<M> {
  pub const fn new() -> Self {
    Self { state: Mutex::new(MaskState { mask: GestureMask::new(), dirty: false }) }
  }

  /// Merge `delta` into the stored mask and mark it for the next gesture mode
  /// entry. The firmware is not contacted.
  pub async fn update(&self, delta: &[u8], action: Action) -> Result<(), MaskError> {
    if delta.len() > MASK_SIZE {
      error!("gesture mask: size {} exceeds {}", delta.len(), MASK_SIZE);
      return Err(MaskError::InvalidSize(delta.len()));
    }

    let mut state = self.state.lock().await;
    state.mask.merge(delta, action);
    state.dirty = true;
    debug!("gesture mask: {} bytes merged, enable = {}", delta.len(), u8::from(action));
    Ok(())
  }

  /// Apply a raw request of the form `[enable, mask bytes...]`.
  ///
  /// `enable` is `1` to enable and `0` to disable the gestures of the mask
  /// bytes that follow.
  pub async fn apply(&self, request: Option<&[u8]>) -> Result<(), MaskError> {
    let (action, delta) = parse_request(request)?;
    self.update(delta, action).await
  }

  /// Report whether any gesture of the stored mask is enabled.
  pub async fn is_any_active(&self) -> FeatureState {
    let state = self.state.lock().await.mask.state();
    match state {
      FeatureState::Enabled => debug!("gesture mask: active gestures found"),
      FeatureState::Disabled => debug!("gesture mask: all gestures disabled"),
    }
    state
  }

  /// Copy of the stored mask and its dirty flag.
  pub async fn snapshot(&self) -> (GestureMask, bool) {
    let state = self.state.lock().await;
    (state.mask, state.dirty)
  }

  pub(crate) async fn lock(&self) -> MutexGuard<'_, M, MaskState> {
    self.state.lock().await
  }
}

/// Split a raw `[enable, mask bytes...]` request into its action and delta.
pub(crate) fn parse_request(request: Option<&[u8]>) -> Result<(Action, &[u8]), MaskError> {
  let Some((&enable, delta)) = request.and_then(<[u8]>::split_first) else {
    error!("gesture mask: request without mask");
    return Err(MaskError::InvalidArgument);
  };

  if delta.len() > MASK_SIZE {
    error!("gesture mask: size {} exceeds {}", delta.len(), MASK_SIZE);
    return Err(MaskError::InvalidSize(delta.len()));
  }

  let action = Action::try_from(enable).inspect_err(|_| {
    error!("gesture mask: enable value {} is neither {} nor {}", enable, FEAT_DISABLE, FEAT_ENABLE);
  })?;
  Ok((action, delta))
}

impl<M: RawMutex> Default for MaskStore<M> {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use embassy_futures::block_on;
  use embassy_sync::blocking_mutex::raw::NoopRawMutex;

  fn store() -> MaskStore<NoopRawMutex> {
    MaskStore::new()
  }

  #[test]
  fn enable_accumulates_with_or() {
    let store = store();
    block_on(async {
      store.update(&[0b0001, 0x10], Action::Enable).await.unwrap();
      store.update(&[0b0100, 0x00, 0x80], Action::Enable).await.unwrap();
      let (mask, dirty) = store.snapshot().await;
      assert_eq!(mask.as_bytes(), &[0b0101, 0x10, 0x80, 0x00]);
      assert!(dirty);
    });
  }

  #[test]
  fn enable_then_disable_cancels_out() {
    let store = store();
    let delta = [0xA5, 0x0F, 0xFF, 0x01];
    block_on(async {
      store.update(&delta, Action::Enable).await.unwrap();
      store.update(&delta, Action::Disable).await.unwrap();
      assert_eq!(store.snapshot().await.0, GestureMask::new());
    });
  }

  #[test]
  fn disable_leaves_unset_bits_alone() {
    let store = store();
    block_on(async {
      store.update(&[0b0001], Action::Enable).await.unwrap();
      store.update(&[0b0010], Action::Disable).await.unwrap();
      assert_eq!(store.snapshot().await.0.as_bytes(), &[0b0001, 0, 0, 0]);
    });
  }

  #[test]
  fn oversized_delta_is_rejected_without_side_effects() {
    let store = store();
    block_on(async {
      assert_eq!(store.update(&[0xFF; MASK_SIZE + 1], Action::Enable).await, Err(MaskError::InvalidSize(MASK_SIZE + 1)));
      assert_eq!(store.snapshot().await, (GestureMask::new(), false));
    });
  }

  #[test]
  fn raw_request_validation() {
    let store = store();
    block_on(async {
      assert_eq!(store.apply(None).await, Err(MaskError::InvalidArgument));
      assert_eq!(store.apply(Some(&[])).await, Err(MaskError::InvalidArgument));
      assert_eq!(store.apply(Some(&[2, 0x01])).await, Err(MaskError::InvalidEnableValue(2)));
      assert_eq!(store.apply(Some(&[1, 1, 2, 3, 4, 5])).await, Err(MaskError::InvalidSize(5)));
      assert_eq!(store.snapshot().await, (GestureMask::new(), false));

      store.apply(Some(&[1, 0x06])).await.unwrap();
      store.apply(Some(&[0, 0x02])).await.unwrap();
      assert_eq!(store.snapshot().await, (GestureMask::from_bytes([0x04, 0, 0, 0]), true));
    });
  }

  #[test]
  fn action_discriminants() {
    assert_eq!(Action::try_from(1), Ok(Action::Enable));
    assert_eq!(Action::try_from(0), Ok(Action::Disable));
    assert_eq!(Action::try_from(0xFF), Err(MaskError::InvalidEnableValue(0xFF)));
    assert_eq!(u8::from(Action::Enable), 1);
  }

  #[test]
  fn any_active_scans_every_byte() {
    assert_eq!(GestureMask::new().state(), FeatureState::Disabled);
    assert_eq!(GestureMask::from_bytes([0, 0, 0, 0x40]).state(), FeatureState::Enabled);
    assert_eq!(GestureMask::from_bytes([0, 0x01, 0, 0]).state(), FeatureState::Enabled);
    assert_eq!(GestureMask::from_bytes([0x80, 0, 0, 0]).state(), FeatureState::Enabled);

    let store = store();
    block_on(async {
      assert_eq!(store.is_any_active().await, FeatureState::Disabled);
      store.update(&[0, 0, 0, 0x01], Action::Enable).await.unwrap();
      assert_eq!(store.is_any_active().await, FeatureState::Enabled);
    });
  }

  #[test]
  fn gesture_ids_map_to_bits() {
    let mut mask = GestureMask::new().with(0x01).with(0x09).with(31);
    assert_eq!(mask.as_bytes(), &[0x02, 0x02, 0x00, 0x80]);
    assert!(mask.contains(0x09));
    assert!(!mask.contains(0x08));

    mask.clear(0x09);
    mask.set(0x10);
    assert_eq!(mask.as_bytes(), &[0x02, 0x00, 0x01, 0x80]);

    // Out of range ids are ignored
    mask.set(200);
    assert!(!mask.contains(200));
    assert_eq!(mask.as_bytes(), &[0x02, 0x00, 0x01, 0x80]);
    assert!(GestureMask::new().is_empty());
  }
}
