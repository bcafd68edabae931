//! Construction-time configuration for packing and unpacking.

use crate::marker::MAX_WIRE_LEN;

/// Default bound on nested containers for both packing and unpacking.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Configuration for a `Packer`.
#[derive(Debug, Clone, Copy)]
pub struct PackOptions {
    /// Maximum number of nested containers. Both implementations enforce
    /// this identically so their outputs and failures agree.
    pub max_depth: usize,
}

impl PackOptions {
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Configuration for an `Unpacker`.
///
/// The length limits default to the format's own 32-bit ceiling; lower them
/// when decoding untrusted input to bound memory consumption before any
/// allocation happens.
#[derive(Debug, Clone, Copy)]
pub struct UnpackOptions {
    /// Reject map keys of kind array or map.
    pub strict_map_key: bool,
    /// Accept (and discard) bytes after the first complete value instead of
    /// failing with an extra-data error.
    pub allow_trailing: bool,
    /// Maximum declared byte length of a string.
    pub max_str_len: u64,
    /// Maximum declared byte length of a binary.
    pub max_bin_len: u64,
    /// Maximum declared element count of an array.
    pub max_array_len: u64,
    /// Maximum declared pair count of a map.
    pub max_map_len: u64,
    /// Maximum number of nested containers.
    pub max_depth: usize,
}

impl UnpackOptions {
    pub fn strict_map_key(mut self, on: bool) -> Self {
        self.strict_map_key = on;
        self
    }

    pub fn allow_trailing(mut self, on: bool) -> Self {
        self.allow_trailing = on;
        self
    }

    pub fn max_str_len(mut self, max: u64) -> Self {
        self.max_str_len = max;
        self
    }

    pub fn max_bin_len(mut self, max: u64) -> Self {
        self.max_bin_len = max;
        self
    }

    pub fn max_array_len(mut self, max: u64) -> Self {
        self.max_array_len = max;
        self
    }

    pub fn max_map_len(mut self, max: u64) -> Self {
        self.max_map_len = max;
        self
    }

    pub fn max_depth(mut self, max: usize) -> Self {
        self.max_depth = max;
        self
    }
}

impl Default for UnpackOptions {
    fn default() -> Self {
        Self {
            strict_map_key: false,
            allow_trailing: false,
            max_str_len: MAX_WIRE_LEN,
            max_bin_len: MAX_WIRE_LEN,
            max_array_len: MAX_WIRE_LEN,
            max_map_len: MAX_WIRE_LEN,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}
