//! Runtime sizing configuration types

use std::num::NonZeroUsize;

nonzero_newtype! {
    /// A non-zero thread count
    ///
    /// Ensures the tokio runtime always has at least 1 worker thread.
    ///
    /// # Examples
    /// ```
    /// use airsense::types::ThreadCount;
    ///
    /// let threads = ThreadCount::new(2).unwrap();
    /// assert_eq!(threads.get(), 2);
    ///
    /// assert!(ThreadCount::new(0).is_none());
    /// ```
    pub struct ThreadCount(NonZeroUsize: usize, serialize as serialize_u64);
}

impl ThreadCount {
    /// Default thread count (single-threaded runtime)
    pub const DEFAULT: Self = Self(NonZeroUsize::new(1).unwrap());
}

impl Default for ThreadCount {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// `0` selects one worker per available CPU
impl std::str::FromStr for ThreadCount {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.parse::<usize>()?;
        Ok(Self::new(value).unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(Self)
                .unwrap_or(Self::DEFAULT)
        }))
    }
}
