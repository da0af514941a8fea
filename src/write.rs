use crate::error::Error;
use byteorder::{LittleEndian, WriteBytesExt};
use std::io::Write;

/// Writer extension mirroring [`PtpRead`](crate::read::PtpRead). Writes to
/// in-memory buffers are infallible for well-typed inputs; the `Result`
/// covers the string length limit.
pub trait PtpWrite: WriteBytesExt {
    fn write_ptp_u8(&mut self, v: u8) -> Result<(), Error> {
        Ok(self.write_u8(v)?)
    }

    fn write_ptp_i8(&mut self, v: i8) -> Result<(), Error> {
        Ok(self.write_i8(v)?)
    }

    fn write_ptp_u16(&mut self, v: u16) -> Result<(), Error> {
        Ok(self.write_u16::<LittleEndian>(v)?)
    }

    fn write_ptp_i16(&mut self, v: i16) -> Result<(), Error> {
        Ok(self.write_i16::<LittleEndian>(v)?)
    }

    fn write_ptp_u32(&mut self, v: u32) -> Result<(), Error> {
        Ok(self.write_u32::<LittleEndian>(v)?)
    }

    fn write_ptp_i32(&mut self, v: i32) -> Result<(), Error> {
        Ok(self.write_i32::<LittleEndian>(v)?)
    }

    fn write_ptp_u64(&mut self, v: u64) -> Result<(), Error> {
        Ok(self.write_u64::<LittleEndian>(v)?)
    }

    fn write_ptp_i64(&mut self, v: i64) -> Result<(), Error> {
        Ok(self.write_i64::<LittleEndian>(v)?)
    }

    fn write_ptp_u128(&mut self, v: u128) -> Result<(), Error> {
        Ok(self.write_u128::<LittleEndian>(v)?)
    }

    fn write_ptp_i128(&mut self, v: i128) -> Result<(), Error> {
        Ok(self.write_i128::<LittleEndian>(v)?)
    }

    #[inline(always)]
    fn write_ptp_vec<T, U: Fn(&mut Self, &T) -> Result<(), Error>>(
        &mut self,
        items: &[T],
        func: U,
    ) -> Result<(), Error> {
        self.write_u32::<LittleEndian>(items.len() as u32)?;
        for item in items {
            func(self, item)?;
        }
        Ok(())
    }

    /// Encode a PTP string: code-unit count including the trailing NUL,
    /// then UTF-16LE units ending in NUL. Empty encodes as a lone 0x00.
    fn write_ptp_str(&mut self, s: &str) -> Result<(), Error> {
        let units: Vec<u16> = s.encode_utf16().collect();
        if s.is_empty() {
            return Ok(self.write_u8(0)?);
        }
        // u8 count limits a string to 254 units plus NUL
        if units.len() > 254 {
            return Err(crate::error::ValidationError::TypeMismatch {
                codec: "string",
                got: "string longer than 254 UTF-16 code units",
            }
            .into());
        }
        self.write_u8(units.len() as u8 + 1)?;
        for unit in units {
            self.write_u16::<LittleEndian>(unit)?;
        }
        Ok(self.write_u16::<LittleEndian>(0)?)
    }
}

impl<T: Write> PtpWrite for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read::PtpRead;
    use std::io::Cursor;

    #[test]
    fn str_round_trip() {
        for s in ["", "x", "Hello Camera", "日本語"] {
            let mut buf = vec![];
            buf.write_ptp_str(s).unwrap();
            let mut cur = Cursor::new(&buf);
            assert_eq!(cur.read_ptp_str().unwrap(), s);
            cur.expect_end().unwrap();
        }
    }

    #[test]
    fn empty_str_is_single_byte() {
        let mut buf = vec![];
        buf.write_ptp_str("").unwrap();
        assert_eq!(buf, vec![0x00]);
    }

    #[test]
    fn str_over_254_units_rejected() {
        let long: String = std::iter::repeat('a').take(255).collect();
        let mut buf = vec![];
        assert!(buf.write_ptp_str(&long).is_err());
    }

    #[test]
    fn vec_round_trip() {
        let mut buf = vec![];
        buf.write_ptp_vec(&[1u32, 2, 3], |w, v| w.write_ptp_u32(*v))
            .unwrap();
        let mut cur = Cursor::new(&buf);
        assert_eq!(cur.read_ptp_u32_vec().unwrap(), vec![1, 2, 3]);
    }
}
