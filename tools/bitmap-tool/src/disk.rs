use kernel_bitmap::BitmapFile;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};

/// A [`BitmapFile`] backed by a file on the host.
pub struct DiskFile(File);

impl DiskFile {
    pub const fn new(file: File) -> Self {
        Self(file)
    }
}

impl BitmapFile for DiskFile {
    type Error = io::Error;

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        self.0.seek(SeekFrom::Start(offset))?;
        let mut filled = 0;
        while filled < buf.len() {
            match self.0.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }

    fn write_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<usize> {
        self.0.seek(SeekFrom::Start(offset))?;
        self.0.write_all(buf)?;
        Ok(buf.len())
    }
}
