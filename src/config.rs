// -----------------------------------------------------------------------------
// DuplicateKeys

/// What a decoder does when a set or map receives a key it already holds.
///
/// A well-formed payload never contains duplicates, so this only matters for
/// buffers whose checksum happened to survive corruption.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateKeys {
    /// Keep the first entry and drop the repeat.
    #[default]
    Lenient,
    /// Fail with [`CorruptedData::DuplicateKey`](crate::CorruptedData::DuplicateKey).
    Reject,
}

// -----------------------------------------------------------------------------
// ArchiveConfig

/// Decoder settings.
///
/// # Examples
///
/// ```
/// use vc_archive::{ArchiveConfig, DuplicateKeys};
///
/// let config = ArchiveConfig::DEFAULT
///     .with_duplicate_keys(DuplicateKeys::Reject)
///     .with_reserve_limit(64);
///
/// assert_eq!(config.reserve_limit, 64);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveConfig {
    pub duplicate_keys: DuplicateKeys,
    /// Upper bound on elements reserved before a container is decoded.
    ///
    /// The element count in the payload is still honored; only the up-front
    /// allocation is capped.
    pub reserve_limit: usize,
}

impl ArchiveConfig {
    pub const DEFAULT: Self = Self {
        duplicate_keys: DuplicateKeys::Lenient,
        reserve_limit: 4096,
    };

    #[inline]
    pub const fn with_duplicate_keys(mut self, policy: DuplicateKeys) -> Self {
        self.duplicate_keys = policy;
        self
    }

    #[inline]
    pub const fn with_reserve_limit(mut self, limit: usize) -> Self {
        self.reserve_limit = limit;
        self
    }
}

impl Default for ArchiveConfig {
    #[inline]
    fn default() -> Self {
        Self::DEFAULT
    }
}
