//! # Saving and loading bitmaps
//!
//! The on-disk form is the packed word array, verbatim: no header, native
//! word size and byte order, starting at byte 0 of the file. A file written
//! on one machine therefore only loads back on a machine with the same word
//! layout.

use crate::store::{BitStore, WORD_BYTES, byte_count, last_word_mask};
use alloc::vec;
use alloc::vec::Vec;
use core::convert::Infallible;
use core::sync::atomic::Ordering;

/// A positional file that bitmaps can be saved to and loaded from.
///
/// Both methods return the number of bytes actually transferred, which may be
/// less than requested.
pub trait BitmapFile {
    type Error;

    /// Reads up to `buf.len()` bytes starting at byte `offset`.
    ///
    /// # Errors
    /// Implementation-defined I/O failures.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Writes up to `buf.len()` bytes starting at byte `offset`.
    ///
    /// # Errors
    /// Implementation-defined I/O failures.
    fn write_at(&mut self, offset: u64, buf: &[u8]) -> Result<usize, Self::Error>;
}

/// Why saving or loading a bitmap failed.
#[derive(Debug, thiserror::Error)]
pub enum PersistError<E> {
    #[error("short read: got {actual} of {expected} bytes")]
    ShortRead { expected: usize, actual: usize },
    #[error("short write: wrote {actual} of {expected} bytes")]
    ShortWrite { expected: usize, actual: usize },
    #[error("file access failed: {0}")]
    File(E),
}

/// Save/load support for every [`BitStore`].
pub trait BitmapPersist: BitStore {
    /// Bytes needed to store the bitmap in a file.
    fn file_size(&self) -> usize {
        byte_count(self.bit_cnt())
    }

    /// Loads the packed words from byte 0 of `file`.
    ///
    /// Bits past `bit_cnt()` in the last word are cleared afterwards, whatever
    /// the file held. On a short read the bytes that did arrive are kept.
    ///
    /// # Errors
    /// [`PersistError::ShortRead`] if the file ends early, or
    /// [`PersistError::File`] if the file reports an error.
    fn read_from<F: BitmapFile + ?Sized>(&self, file: &mut F) -> Result<(), PersistError<F::Error>> {
        if self.bit_cnt() == 0 {
            return Ok(());
        }

        // Start from the current contents so bytes the file does not deliver
        // keep their value.
        let mut buf = packed_bytes(self);
        let expected = buf.len();
        let actual = file.read_at(0, &mut buf).map_err(PersistError::File)?;

        for (word, bytes) in self.words().iter().zip(buf.chunks_exact(WORD_BYTES)) {
            let mut raw = [0u8; WORD_BYTES];
            raw.copy_from_slice(bytes);
            word.store(usize::from_ne_bytes(raw), Ordering::Release);
        }
        if let Some(last) = self.words().last() {
            last.fetch_and(last_word_mask(self.bit_cnt()), Ordering::AcqRel);
        }

        if actual == expected {
            Ok(())
        } else {
            Err(PersistError::ShortRead { expected, actual })
        }
    }

    /// Writes the packed words to byte 0 of `file`.
    ///
    /// A partial write is not rolled back.
    ///
    /// # Errors
    /// [`PersistError::ShortWrite`] if the file accepts fewer bytes, or
    /// [`PersistError::File`] if the file reports an error.
    fn write_to<F: BitmapFile + ?Sized>(&self, file: &mut F) -> Result<(), PersistError<F::Error>> {
        let buf = packed_bytes(self);
        let expected = buf.len();
        let actual = file.write_at(0, &buf).map_err(PersistError::File)?;
        if actual == expected {
            Ok(())
        } else {
            Err(PersistError::ShortWrite { expected, actual })
        }
    }
}

impl<B: BitStore + ?Sized> BitmapPersist for B {}

/// Snapshot of the packed words in native byte order.
fn packed_bytes<B: BitStore + ?Sized>(bits: &B) -> Vec<u8> {
    let mut buf = vec![0u8; byte_count(bits.bit_cnt())];
    for (word, bytes) in bits.words().iter().zip(buf.chunks_exact_mut(WORD_BYTES)) {
        bytes.copy_from_slice(&word.load(Ordering::Acquire).to_ne_bytes());
    }
    buf
}

/// An in-memory file that grows on write.
impl BitmapFile for Vec<u8> {
    type Error = Infallible;

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let available = usize::try_from(offset)
            .ok()
            .and_then(|offset| self.get(offset..))
            .unwrap_or_default();
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        Ok(n)
    }

    fn write_at(&mut self, offset: u64, buf: &[u8]) -> Result<usize, Self::Error> {
        let Some(end) = usize::try_from(offset)
            .ok()
            .and_then(|offset| offset.checked_add(buf.len()))
        else {
            return Ok(0);
        };
        let start = end - buf.len();
        if self.len() < end {
            self.resize(end, 0);
        }
        self[start..end].copy_from_slice(buf);
        Ok(buf.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Bitmap, WORD_BITS};

    /// A file that accepts at most `limit` bytes per transfer.
    struct Truncating {
        data: Vec<u8>,
        limit: usize,
    }

    impl BitmapFile for Truncating {
        type Error = Infallible;

        fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize, Self::Error> {
            let n = buf.len().min(self.limit);
            self.data.read_at(offset, &mut buf[..n])
        }

        fn write_at(&mut self, offset: u64, buf: &[u8]) -> Result<usize, Self::Error> {
            let n = buf.len().min(self.limit);
            self.data.write_at(offset, &buf[..n])
        }
    }

    struct Broken;

    impl BitmapFile for Broken {
        type Error = &'static str;

        fn read_at(&mut self, _offset: u64, _buf: &mut [u8]) -> Result<usize, Self::Error> {
            Err("device gone")
        }

        fn write_at(&mut self, _offset: u64, _buf: &[u8]) -> Result<usize, Self::Error> {
            Err("device gone")
        }
    }

    #[test]
    fn round_trip() {
        let src = Bitmap::new(150).unwrap();
        for idx in [0, 7, 63, 64, 100, 149] {
            src.mark(idx);
        }
        let mut file = Vec::new();
        src.write_to(&mut file).unwrap();
        assert_eq!(file.len(), src.file_size());
        assert_eq!(src.file_size(), 3 * WORD_BYTES);

        let dst = Bitmap::new(150).unwrap();
        dst.read_from(&mut file).unwrap();
        for idx in 0..150 {
            assert_eq!(dst.test(idx), src.test(idx), "bit {idx}");
        }
    }

    #[test]
    fn load_masks_trailing_bits() {
        let mut file = vec![0xFFu8; WORD_BYTES];
        let b = Bitmap::new(5).unwrap();
        b.read_from(&mut file).unwrap();
        assert!(b.all(0, 5));
        assert_eq!(b.words()[0].load(Ordering::Relaxed), 0b1_1111);
    }

    #[test]
    fn short_read_keeps_what_arrived() {
        let b = Bitmap::new(2 * WORD_BITS).unwrap();
        b.mark(WORD_BITS);
        let mut file = Truncating {
            data: vec![0xFF; 2 * WORD_BYTES],
            limit: WORD_BYTES,
        };
        let err = b.read_from(&mut file).unwrap_err();
        assert!(matches!(
            err,
            PersistError::ShortRead { expected, actual } if expected == 2 * WORD_BYTES && actual == WORD_BYTES
        ));
        assert!(b.all(0, WORD_BITS));
        assert_eq!(b.count(WORD_BITS, WORD_BITS, true), 1);
    }

    #[test]
    fn short_write_is_reported() {
        let b = Bitmap::new(2 * WORD_BITS).unwrap();
        let mut file = Truncating {
            data: Vec::new(),
            limit: 3,
        };
        let err = b.write_to(&mut file).unwrap_err();
        assert!(matches!(err, PersistError::ShortWrite { actual: 3, .. }));
        assert_eq!(file.data.len(), 3);
    }

    #[test]
    fn file_errors_propagate() {
        let b = Bitmap::new(8).unwrap();
        assert!(matches!(b.read_from(&mut Broken), Err(PersistError::File("device gone"))));
        assert_eq!(
            b.write_to(&mut Broken).unwrap_err().to_string(),
            "file access failed: device gone"
        );
    }

    #[test]
    fn empty_bitmap_reads_nothing() {
        let b = Bitmap::new(0).unwrap();
        assert_eq!(b.file_size(), 0);
        b.read_from(&mut Broken).unwrap();
    }

    #[test]
    fn vec_file_reads_past_end_as_empty() {
        let mut file = vec![1u8, 2, 3];
        let mut buf = [0u8; 4];
        assert_eq!(file.read_at(2, &mut buf), Ok(1));
        assert_eq!(buf[0], 3);
        assert_eq!(file.read_at(10, &mut buf), Ok(0));
        assert_eq!(file.write_at(5, &[9]), Ok(1));
        assert_eq!(file, [1, 2, 3, 0, 0, 9]);
    }
}
