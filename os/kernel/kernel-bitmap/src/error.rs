/// Recoverable failures when constructing a bitmap.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BitmapError {
    #[error("out of memory allocating storage for {bit_cnt} bits")]
    OutOfMemory { bit_cnt: usize },
}
