//! Human-readable dumps for debugging.

use crate::store::{BitStore, WORD_BITS, byte_count};
use core::fmt;
use core::sync::atomic::Ordering;

/// Bytes shown per hex dump line.
const HEX_BYTES_PER_LINE: usize = 16;

/// Text dumps of any [`BitStore`].
pub trait BitmapDump: BitStore {
    /// Writes the packed words as a canonical hex dump: sixteen bytes per
    /// line, prefixed by the byte offset, with a `-` between the two groups
    /// of eight.
    ///
    /// ```text
    /// 00000000  ff 00 00 00 00 00 00 00-01 00 00 00 00 00 00 00
    /// ```
    ///
    /// # Errors
    /// Propagates errors from `out`.
    fn write_hex_dump<W: fmt::Write + ?Sized>(&self, out: &mut W) -> fmt::Result {
        let bytes = self
            .words()
            .iter()
            .flat_map(|word| word.load(Ordering::Acquire).to_ne_bytes());

        let total = byte_count(self.bit_cnt());
        for (ofs, byte) in bytes.enumerate() {
            let column = ofs % HEX_BYTES_PER_LINE;
            if column == 0 {
                write!(out, "{ofs:08x}  ")?;
            }
            write!(out, "{byte:02x}")?;

            let line_end = column == HEX_BYTES_PER_LINE - 1 || ofs + 1 == total;
            if line_end {
                out.write_char('\n')?;
            } else if column == HEX_BYTES_PER_LINE / 2 - 1 {
                out.write_char('-')?;
            } else {
                out.write_char(' ')?;
            }
        }
        Ok(())
    }

    /// Writes one line per word, listing its bits lowest index first.
    /// The last line stops at `bit_cnt()`.
    ///
    /// # Errors
    /// Propagates errors from `out`.
    fn write_binary_dump<W: fmt::Write + ?Sized>(&self, out: &mut W) -> fmt::Result {
        let bit_cnt = self.bit_cnt();
        for (w, word) in self.words().iter().enumerate() {
            let word = word.load(Ordering::Acquire);
            let used = (bit_cnt - w * WORD_BITS).min(WORD_BITS);
            for bit in 0..used {
                out.write_char(if word & (1 << bit) == 0 { '0' } else { '1' })?;
            }
            out.write_char('\n')?;
        }
        Ok(())
    }
}

impl<B: BitStore + ?Sized> BitmapDump for B {}
