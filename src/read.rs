use crate::error::{Error, ProtocolError};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

/// Reader extension for PTP wire primitives. All multi-byte integers are
/// little-endian per the USB class specification; the registry records the
/// endianness so a PTP/IP port can revisit the choice.
pub trait PtpRead: ReadBytesExt {
    fn read_ptp_u8(&mut self) -> Result<u8, Error> {
        Ok(self.read_u8()?)
    }

    fn read_ptp_i8(&mut self) -> Result<i8, Error> {
        Ok(self.read_i8()?)
    }

    fn read_ptp_u16(&mut self) -> Result<u16, Error> {
        Ok(self.read_u16::<LittleEndian>()?)
    }

    fn read_ptp_i16(&mut self) -> Result<i16, Error> {
        Ok(self.read_i16::<LittleEndian>()?)
    }

    fn read_ptp_u32(&mut self) -> Result<u32, Error> {
        Ok(self.read_u32::<LittleEndian>()?)
    }

    fn read_ptp_i32(&mut self) -> Result<i32, Error> {
        Ok(self.read_i32::<LittleEndian>()?)
    }

    fn read_ptp_u64(&mut self) -> Result<u64, Error> {
        Ok(self.read_u64::<LittleEndian>()?)
    }

    fn read_ptp_i64(&mut self) -> Result<i64, Error> {
        Ok(self.read_i64::<LittleEndian>()?)
    }

    fn read_ptp_u128(&mut self) -> Result<u128, Error> {
        Ok(self.read_u128::<LittleEndian>()?)
    }

    fn read_ptp_i128(&mut self) -> Result<i128, Error> {
        Ok(self.read_i128::<LittleEndian>()?)
    }

    #[inline(always)]
    fn read_ptp_vec<T: Sized, U: Fn(&mut Self) -> Result<T, Error>>(
        &mut self,
        func: U,
    ) -> Result<Vec<T>, Error> {
        let len = self.read_u32::<LittleEndian>()? as usize;
        (0..len).map(|_| func(self)).collect()
    }

    fn read_ptp_u8_vec(&mut self) -> Result<Vec<u8>, Error> {
        self.read_ptp_vec(|cur| cur.read_ptp_u8())
    }

    fn read_ptp_i8_vec(&mut self) -> Result<Vec<i8>, Error> {
        self.read_ptp_vec(|cur| cur.read_ptp_i8())
    }

    fn read_ptp_u16_vec(&mut self) -> Result<Vec<u16>, Error> {
        self.read_ptp_vec(|cur| cur.read_ptp_u16())
    }

    fn read_ptp_i16_vec(&mut self) -> Result<Vec<i16>, Error> {
        self.read_ptp_vec(|cur| cur.read_ptp_i16())
    }

    fn read_ptp_u32_vec(&mut self) -> Result<Vec<u32>, Error> {
        self.read_ptp_vec(|cur| cur.read_ptp_u32())
    }

    fn read_ptp_i32_vec(&mut self) -> Result<Vec<i32>, Error> {
        self.read_ptp_vec(|cur| cur.read_ptp_i32())
    }

    fn read_ptp_u64_vec(&mut self) -> Result<Vec<u64>, Error> {
        self.read_ptp_vec(|cur| cur.read_ptp_u64())
    }

    fn read_ptp_i64_vec(&mut self) -> Result<Vec<i64>, Error> {
        self.read_ptp_vec(|cur| cur.read_ptp_i64())
    }

    fn read_ptp_u128_vec(&mut self) -> Result<Vec<u128>, Error> {
        self.read_ptp_vec(|cur| cur.read_ptp_u128())
    }

    fn read_ptp_i128_vec(&mut self) -> Result<Vec<i128>, Error> {
        self.read_ptp_vec(|cur| cur.read_ptp_i128())
    }

    /// PTP string: u8 code-unit count including the trailing NUL, then
    /// UTF-16LE code units. A count of 0 is the empty string. The trailing
    /// NUL is trimmed when present; `strict` rejects its absence.
    fn read_ptp_str_policy(&mut self, strict: bool) -> Result<String, Error> {
        let len = self.read_u8()?;
        if len == 0 {
            return Ok("".into());
        }
        let mut units: Vec<u16> = (0..len)
            .map(|_| self.read_u16::<LittleEndian>())
            .collect::<std::result::Result<_, _>>()?;
        match units.last() {
            Some(0) => {
                units.pop();
            }
            _ if strict => return Err(ProtocolError::MalformedString.into()),
            _ => {}
        }
        String::from_utf16(&units).map_err(|_| ProtocolError::InvalidUtf16.into())
    }

    fn read_ptp_str(&mut self) -> Result<String, Error> {
        self.read_ptp_str_policy(false)
    }

    fn expect_end(&mut self) -> Result<(), Error>;
}

impl<T: AsRef<[u8]>> PtpRead for Cursor<T> {
    fn expect_end(&mut self) -> Result<(), Error> {
        let len = self.get_ref().as_ref().len();
        if len as u64 != self.position() {
            Err(ProtocolError::TrailingBytes(len - self.position() as usize).into())
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn str_empty() {
        let mut cur = Cursor::new([0x00u8]);
        assert_eq!(cur.read_ptp_str().unwrap(), "");
        cur.expect_end().unwrap();
    }

    #[test]
    fn str_single_nul_unit() {
        // length 1: one code unit, the NUL itself
        let mut cur = Cursor::new([0x01u8, 0x00, 0x00]);
        assert_eq!(cur.read_ptp_str().unwrap(), "");
    }

    #[test]
    fn str_basic() {
        let mut cur = Cursor::new([0x03u8, b'H', 0x00, b'i', 0x00, 0x00, 0x00]);
        assert_eq!(cur.read_ptp_str().unwrap(), "Hi");
    }

    #[test]
    fn str_missing_nul_lenient_vs_strict() {
        let bytes = [0x02u8, b'H', 0x00, b'i', 0x00];
        let mut cur = Cursor::new(bytes);
        assert_eq!(cur.read_ptp_str().unwrap(), "Hi");

        let mut cur = Cursor::new(bytes);
        assert!(matches!(
            cur.read_ptp_str_policy(true),
            Err(Error::Protocol(ProtocolError::MalformedString))
        ));
    }

    #[test]
    fn str_max_length() {
        let mut bytes = vec![0xFFu8];
        for _ in 0..254 {
            bytes.extend_from_slice(&[b'a', 0x00]);
        }
        bytes.extend_from_slice(&[0x00, 0x00]);
        let mut cur = Cursor::new(bytes);
        let s = cur.read_ptp_str().unwrap();
        assert_eq!(s.len(), 254);
        cur.expect_end().unwrap();
    }

    #[test]
    fn vec_reads_count_prefix() {
        let mut cur = Cursor::new([0x02, 0x00, 0x00, 0x00, 0x34, 0x12, 0x78, 0x56]);
        assert_eq!(cur.read_ptp_u16_vec().unwrap(), vec![0x1234, 0x5678]);
    }

    #[test]
    fn short_read_is_protocol_error() {
        let mut cur = Cursor::new([0x01u8]);
        assert!(matches!(
            cur.read_ptp_u32(),
            Err(Error::Protocol(ProtocolError::ShortRead { .. }))
        ));
    }

    #[test]
    fn expect_end_flags_trailing() {
        let mut cur = Cursor::new([0x00u8, 0x11, 0x22]);
        cur.read_ptp_u8().unwrap();
        assert!(matches!(
            cur.expect_end(),
            Err(Error::Protocol(ProtocolError::TrailingBytes(2)))
        ));
    }
}
