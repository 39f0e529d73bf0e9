use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::defs::MASK_SIZE;
use crate::mask::parse_request;
use crate::{Action, Error, Feature, Firmware, FtsGesture, Interrupts, ScanMode};

impl<F, IRQ, M> FtsGesture<'_, F, IRQ, M>
where
  F: Firmware,
  IRQ: Interrupts,
  M: RawMutex,
{
  /// Enable the gestures of `delta` and push the resulting mask to the
  /// firmware.
  ///
  /// With `None` the stored mask is pushed unchanged. The mask lock is held
  /// until the firmware answers.
  pub async fn enable_gesture(&mut self, delta: Option<&[u8]>) -> Result<(), Error<F::Error, IRQ::Error>> {
    debug!("trying to enable gestures");
    self.push_mask(delta, Action::Enable).await
  }

  /// Disable the gestures of `delta` and push the resulting mask to the
  /// firmware.
  ///
  /// With `None` every gesture is disabled in the firmware by pushing a zero
  /// mask; the stored mask is left as it is so a later reload restores it.
  pub async fn disable_gesture(&mut self, delta: Option<&[u8]>) -> Result<(), Error<F::Error, IRQ::Error>> {
    debug!("trying to disable gestures");
    self.push_mask(delta, Action::Disable).await
  }

  /// Apply a raw `[enable, mask bytes...]` request and push the result to
  /// the firmware right away.
  ///
  /// `enable` is `1` to enable and `0` to disable the gestures of the mask
  /// bytes that follow.
  pub async fn apply_gesture(&mut self, request: Option<&[u8]>) -> Result<(), Error<F::Error, IRQ::Error>> {
    let (action, delta) = parse_request(request)?;
    self.push_mask(Some(delta), action).await
  }

  async fn push_mask(&mut self, delta: Option<&[u8]>, action: Action) -> Result<(), Error<F::Error, IRQ::Error>> {
    let size = delta.map_or(0, <[u8]>::len);
    if size > MASK_SIZE {
      error!("gesture push: size {} exceeds {}", size, MASK_SIZE);
      return Err(Error::InvalidSize(size));
    }

    let mut state = self.mask.lock().await;
    let res = match (delta, action) {
      (Some(delta), _) => {
        state.mask.merge(delta, action);
        self.firmware.set_feature(Feature::Gesture, state.mask.as_bytes()).await
      }
      (None, Action::Enable) => self.firmware.set_feature(Feature::Gesture, state.mask.as_bytes()).await,
      (None, Action::Disable) => self.firmware.set_feature(Feature::Gesture, &[0; MASK_SIZE]).await,
    };

    match res {
      Ok(()) => {
        debug!("gesture push done, enable = {}", u8::from(action));
        Ok(())
      }
      Err(e) => {
        error!("gesture push failed, enable = {}", u8::from(action));
        if delta.is_some() {
          // The firmware still holds the previous mask
          state.dirty = true;
        }
        Err(Error::Io(e))
      }
    }
  }

  /// Put the controller in gesture mode.
  ///
  /// Interrupts are suspended first; if that fails nothing else happens. The
  /// stored mask is pushed again when `reload` is set or it changed since the
  /// last push, then the firmware switches to [`ScanMode::LowPower`].
  /// Interrupts are resumed whatever happened in between. A resume failure is
  /// reported as [`Error::Unwind`] next to the firmware failure, if any.
  pub async fn enter_gesture_mode(&mut self, reload: bool) -> Result<(), Error<F::Error, IRQ::Error>> {
    if let Err(e) = self.interrupts.suspend().await {
      error!("gesture mode: cannot suspend interrupts");
      return Err(Error::Interrupt(e));
    }

    let outcome = self.gesture_mode_steps(reload).await;

    match self.interrupts.resume().await {
      Ok(()) => outcome.map_err(Error::Io),
      Err(interrupt) => {
        error!("gesture mode: cannot resume interrupts");
        Err(Error::Unwind { io: outcome.err(), interrupt })
      }
    }
  }

  /// The steps that run with interrupts suspended.
  async fn gesture_mode_steps(&mut self, reload: bool) -> Result<(), F::Error> {
    {
      let mut state = self.mask.lock().await;
      if reload || state.dirty {
        self.firmware.set_feature(Feature::Gesture, state.mask.as_bytes()).await.inspect_err(|_| {
          error!("gesture mode: mask push failed");
        })?;
        state.dirty = false;
        debug!("gesture mode: mask pushed");
      }
    }

    self.firmware.set_scan_mode(ScanMode::LowPower, 0).await.inspect_err(|_| {
      error!("gesture mode: cannot switch to low power scan");
    })?;

    info!("gesture mode entered");
    Ok(())
  }
}
