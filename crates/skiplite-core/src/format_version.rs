//! File format versions for SkipLite snapshots.
//!
//! The snapshot data file is plain `key:value` text and carries no header.
//! Versioning lives in the metadata sidecar written next to it, so a reader
//! can refuse a sidecar produced by a newer writer.

/// Snapshot sidecar format version
pub const SNAPSHOT_FORMAT_VERSION: u16 = 1;

/// Magic numbers for file validation
pub mod magic {
    /// Snapshot metadata magic: "SLSM" (SkipLite Snapshot Meta)
    pub const SNAPSHOT_META: u32 = 0x534C534D;
}

/// Version compatibility information
#[derive(Debug, Clone, Copy)]
pub struct FormatVersion {
    /// Current version of this format
    pub current: u16,
    /// Minimum supported version for reading
    pub min_read: u16,
}

impl FormatVersion {
    /// Check if a version can be read
    pub fn can_read(&self, version: u16) -> bool {
        version >= self.min_read && version <= self.current
    }
}

/// Snapshot sidecar format version info
pub fn snapshot_version() -> FormatVersion {
    FormatVersion {
        current: SNAPSHOT_FORMAT_VERSION,
        min_read: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_compatibility() {
        let v = snapshot_version();
        assert!(v.can_read(1));
        assert!(!v.can_read(0));
        assert!(!v.can_read(SNAPSHOT_FORMAT_VERSION + 1));
    }
}
