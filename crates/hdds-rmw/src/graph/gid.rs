// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Size of an rmw GID in bytes.
pub const RMW_GID_STORAGE_SIZE: usize = 24;

/// Globally scoped entity identifier.
///
/// Locally minted GIDs are laid out as `pid (4) | context instance (4) |
/// entity counter (8) | zero padding (8)`, all big-endian. Remote GIDs are
/// opaque and taken as-is from discovery.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Gid([u8; RMW_GID_STORAGE_SIZE]);

impl Gid {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; RMW_GID_STORAGE_SIZE]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; RMW_GID_STORAGE_SIZE] {
        &self.0
    }

    pub(crate) fn local(instance_id: u32, entity: u64) -> Self {
        let mut bytes = [0u8; RMW_GID_STORAGE_SIZE];
        bytes[0..4].copy_from_slice(&std::process::id().to_be_bytes());
        bytes[4..8].copy_from_slice(&instance_id.to_be_bytes());
        bytes[8..16].copy_from_slice(&entity.to_be_bytes());
        Self(bytes)
    }
}

impl fmt::Debug for Gid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gid({})", self)
    }
}

impl fmt::Display for Gid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0[..16].iter().enumerate() {
            if i > 0 && i % 4 == 0 {
                f.write_str(".")?;
            }
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Mints unique GIDs for one context.
pub(crate) struct GidAllocator {
    instance_id: u32,
    next: AtomicU64,
}

impl GidAllocator {
    pub(crate) fn new(instance_id: u32) -> Self {
        Self {
            instance_id,
            next: AtomicU64::new(1),
        }
    }

    pub(crate) fn next(&self) -> Gid {
        Gid::local(self.instance_id, self.next.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocator_mints_distinct_gids() {
        let alloc = GidAllocator::new(7);
        let a = alloc.next();
        let b = alloc.next();
        assert_ne!(a, b);
        assert_eq!(&a.as_bytes()[4..8], &7u32.to_be_bytes());
        assert_eq!(&a.as_bytes()[16..], &[0u8; 8]);
    }

    #[test]
    fn contexts_do_not_collide() {
        let a = GidAllocator::new(1).next();
        let b = GidAllocator::new(2).next();
        assert_ne!(a, b);
    }

    #[test]
    fn display_is_grouped_hex() {
        let gid = Gid::from_bytes([0xab; RMW_GID_STORAGE_SIZE]);
        assert_eq!(gid.to_string(), "abababab.abababab.abababab.abababab");
    }
}
