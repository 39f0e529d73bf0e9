use embedded_hal::i2c::Operation;
use embedded_hal_async::i2c::{I2c, SevenBitAddress};

use crate::defs::Cmd;
use crate::{AddressWidth, Config, Dummy, ErrorType, Feature, Firmware, ScanMode};

const WRITE_MAX: usize = 32;

/// Errors of the I²C firmware transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError<E> {
  /// I²C bus transaction failed with the underlying driver error.
  I2c(E),
  /// A command does not fit in the write buffer.
  BufferOverflow,
}

/// [`Firmware`] over an `embedded-hal-async` I²C bus.
///
/// Commands are written as `[opcode, arguments...]`. Frame buffer reads send
/// the opcode and a big-endian address, then drop the dummy byte that
/// precedes the data. Waiting for the command echo is left to the caller.
pub struct FtsI2c<I> {
  i2c: I,
  config: Config,
}

impl<I> FtsI2c<I> {
  pub fn new(i2c: I, config: Config) -> Self {
    Self { i2c, config }
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  /// Give back the bus.
  pub fn release(self) -> I {
    self.i2c
  }
}

impl<I: I2c<SevenBitAddress>> ErrorType for FtsI2c<I> {
  type Error = TransportError<I::Error>;
}

impl<I: I2c<SevenBitAddress>> FtsI2c<I> {
  async fn write_cmd(&mut self, cmd: Cmd, args: &[u8], payload: &[u8]) -> Result<(), TransportError<I::Error>> {
    let len = 1 + args.len() + payload.len();
    if len > WRITE_MAX {
      return Err(TransportError::BufferOverflow);
    }

    let mut buf = [0u8; WRITE_MAX];
    buf[0] = cmd.into();
    buf[1..=args.len()].copy_from_slice(args);
    buf[1 + args.len()..len].copy_from_slice(payload);
    trace!("fts i2c: write {} bytes, cmd {:#x}", len, buf[0]);
    self.i2c.write(self.config.address, &buf[..len]).await.map_err(TransportError::I2c)
  }
}

impl<I: I2c<SevenBitAddress>> Firmware for FtsI2c<I> {
  async fn set_feature(&mut self, feature: Feature, payload: &[u8]) -> Result<(), Self::Error> {
    self.write_cmd(Cmd::Feature, &[feature.into()], payload).await
  }

  async fn set_scan_mode(&mut self, mode: ScanMode, setting: u8) -> Result<(), Self::Error> {
    self.write_cmd(Cmd::ScanMode, &[mode.into(), setting], &[]).await
  }

  async fn read_frame_buffer(
    &mut self,
    width: AddressWidth,
    offset: u64,
    buf: &mut [u8],
    dummy: Dummy,
  ) -> Result<(), Self::Error> {
    let address = self.config.address;
    let n = width.bytes();
    let mut at = offset;

    for chunk in buf.chunks_mut(self.config.read_chunk.max(1)) {
      let mut header = [0u8; 9];
      header[0] = Cmd::FrameBufferRead.into();
      header[1..=n].copy_from_slice(&at.to_be_bytes()[8 - n..]);

      let len = chunk.len();
      trace!("fts i2c: frame buffer read {} bytes", len);
      let res = match dummy {
        Dummy::Absent => self.i2c.write_read(address, &header[..=n], chunk).await,
        Dummy::Present => {
          let mut skip = [0u8; 1];
          let mut ops = [Operation::Write(&header[..=n]), Operation::Read(&mut skip[..dummy.bytes()]), Operation::Read(chunk)];
          self.i2c.transaction(address, &mut ops).await
        }
      };
      res.map_err(TransportError::I2c)?;

      at = at.wrapping_add(len as u64);
    }

    Ok(())
  }
}
