//! Fixed-width opaque records
//!
//! States and inputs are handled as byte blobs whose width is fixed when the
//! record is created. Copies go through `copy_from`/`copy_to`, which refuse
//! any slice of a different width instead of truncating or padding.

use crate::{Error, Result};
use std::fmt;

/// An owned, fixed-width byte buffer with value semantics.
///
/// Cloning a `Record` copies its bytes; two records never alias.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Record {
    bytes: Box<[u8]>,
}

impl Record {
    /// Create an all-zero record of the given width
    pub fn zeroed(width: usize) -> Self {
        Self {
            bytes: vec![0u8; width].into_boxed_slice(),
        }
    }

    /// Create a record holding a copy of `bytes`
    ///
    /// The width of the new record is `bytes.len()`.
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Width of this record in bytes
    pub fn width(&self) -> usize {
        self.bytes.len()
    }

    /// Borrow the bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Mutably borrow the bytes
    ///
    /// The width cannot change through this borrow.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Overwrite this record with `src`
    ///
    /// Returns `Err` if `src` is not exactly `self.width()` bytes.
    pub fn copy_from(&mut self, src: &[u8]) -> Result<()> {
        self.check_width(src.len())?;
        self.bytes.copy_from_slice(src);
        Ok(())
    }

    /// Copy this record into `dst`
    ///
    /// Returns `Err` if `dst` is not exactly `self.width()` bytes.
    pub fn copy_to(&self, dst: &mut [u8]) -> Result<()> {
        self.check_width(dst.len())?;
        dst.copy_from_slice(&self.bytes);
        Ok(())
    }

    /// Overwrite this record with another record of the same width
    pub fn assign(&mut self, other: &Record) -> Result<()> {
        self.copy_from(other.as_bytes())
    }

    fn check_width(&self, got: usize) -> Result<()> {
        if got != self.width() {
            return Err(Error::RecordSize {
                expected: self.width(),
                got,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Record({}B:", self.width())?;
        for byte in self.bytes.iter().take(16) {
            write!(f, " {:02x}", byte)?;
        }
        if self.width() > 16 {
            write!(f, " ..")?;
        }
        write!(f, ")")
    }
}

impl AsRef<[u8]> for Record {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeroed() {
        let record = Record::zeroed(4);
        assert_eq!(record.width(), 4);
        assert_eq!(record.as_bytes(), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_copy_from_rejects_wrong_width() {
        let mut record = Record::zeroed(4);
        assert_eq!(
            record.copy_from(&[1, 2, 3]),
            Err(Error::RecordSize {
                expected: 4,
                got: 3
            })
        );
        // Unchanged after the failed copy
        assert_eq!(record.as_bytes(), &[0, 0, 0, 0]);

        record.copy_from(&[1, 2, 3, 4]).unwrap();
        assert_eq!(record.as_bytes(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_copy_to() {
        let record = Record::from_slice(&[9, 8]);
        let mut out = [0u8; 2];
        record.copy_to(&mut out).unwrap();
        assert_eq!(out, [9, 8]);

        let mut too_long = [0u8; 3];
        assert!(record.copy_to(&mut too_long).is_err());
    }

    #[test]
    fn test_assign() {
        let mut target = Record::zeroed(3);
        target.assign(&Record::from_slice(&[4, 5, 6])).unwrap();
        assert_eq!(target.as_bytes(), &[4, 5, 6]);

        assert_eq!(
            target.assign(&Record::zeroed(2)),
            Err(Error::RecordSize {
                expected: 3,
                got: 2
            })
        );
        assert_eq!(target.as_bytes(), &[4, 5, 6]);
    }

    #[test]
    fn test_clone_does_not_alias() {
        let mut a = Record::from_slice(&[1, 1]);
        let b = a.clone();
        a.as_bytes_mut()[0] = 7;
        assert_eq!(b.as_bytes(), &[1, 1]);
        assert_eq!(a.as_bytes(), &[7, 1]);
    }

    #[test]
    fn test_debug_truncates() {
        let record = Record::zeroed(32);
        let text = format!("{:?}", record);
        assert!(text.starts_with("Record(32B:"));
        assert!(text.ends_with(" ..)"));
    }
}
