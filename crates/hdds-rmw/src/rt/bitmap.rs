// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::sync::atomic::{AtomicU64, Ordering};

const WORD_BITS: usize = u64::BITS as usize;

/// Fixed-width set of pending slot indices, shared between signalling
/// threads and the single waiter.
pub(super) struct SlotBits {
    words: Box<[AtomicU64]>,
    len: usize,
}

impl SlotBits {
    pub(super) fn new(len: usize) -> Self {
        let words = (0..len.div_ceil(WORD_BITS))
            .map(|_| AtomicU64::new(0))
            .collect();
        Self { words, len }
    }

    /// Mark `index` pending. Returns the previous state; out-of-range
    /// indices are ignored and report `true` so no wake is issued.
    pub(super) fn mark(&self, index: usize) -> bool {
        if index >= self.len {
            return true;
        }
        let bit = 1u64 << (index % WORD_BITS);
        let prev = self.words[index / WORD_BITS].fetch_or(bit, Ordering::AcqRel);
        prev & bit != 0
    }

    /// Clear every pending bit and return the indices that were set.
    pub(super) fn drain(&self) -> Vec<usize> {
        let mut out = Vec::new();
        for (word_index, word) in self.words.iter().enumerate() {
            let mut value = word.swap(0, Ordering::AcqRel);
            while value != 0 {
                let offset = value.trailing_zeros() as usize;
                value &= value - 1;
                let index = word_index * WORD_BITS + offset;
                if index < self.len {
                    out.push(index);
                }
            }
        }
        out
    }

    /// Clear one bit, used when a slot is released.
    pub(super) fn clear(&self, index: usize) {
        if index < self.len {
            let bit = 1u64 << (index % WORD_BITS);
            self.words[index / WORD_BITS].fetch_and(!bit, Ordering::AcqRel);
        }
    }
}
