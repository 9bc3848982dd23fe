// SPDX-License-Identifier: MIT

//! Process-wide nonce provider.
//!
//! Instances that are not given an explicit nonce draw one from a
//! single 128-bit counter shared by the whole process. Two generators
//! instantiated with identical entropy therefore still start from
//! different states.
use std::sync::{Mutex, PoisonError};

/// Length in bytes of a generated nonce.
pub const NONCE_LEN: usize = 16;

static NONCE: Mutex<NonceCounter> = Mutex::new(NonceCounter::new());

/// A big-endian 128-bit counter.
///
/// ```
/// use nist_drbg::nonce::NonceCounter;
///
/// let mut ctr = NonceCounter::starting_at([0xff; 16]);
/// assert_eq!(ctr.next(), [0u8; 16]);
/// ```
#[derive(Debug, Clone)]
pub struct NonceCounter {
    block: [u8; NONCE_LEN],
}

impl NonceCounter {
    pub const fn new() -> Self {
        Self {
            block: [0u8; NONCE_LEN],
        }
    }

    /// A counter whose next value is `value + 1`.
    pub const fn starting_at(value: [u8; NONCE_LEN]) -> Self {
        Self { block: value }
    }

    /// Increment the counter from the least significant byte, wrapping
    /// to zero after all-`0xff`, and return the new value.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> [u8; NONCE_LEN] {
        for byte in self.block.iter_mut().rev() {
            *byte = byte.wrapping_add(1);
            if *byte != 0 {
                break;
            }
        }
        self.block
    }
}

impl Default for NonceCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Draw the next value from the process-wide counter.
///
/// The counter has its own lock, independent of any generator.
pub fn next() -> [u8; NONCE_LEN] {
    // The counter holds no secret and every update is a complete
    // increment, so a poisoned lock is still consistent.
    NONCE
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .next()
}
