// SPDX-License-Identifier: MIT

//! The interface between the [`Drbg`](crate::drbg::Drbg) engine and
//! a concrete DRBG mechanism.
//!
//! The engine owns configuration, lifecycle and entropy acquisition.
//! A mechanism only knows how to turn entropy into internal state and
//! internal state into output. Every mechanism call is made with the
//! engine lock held; mechanisms are not thread-safe on their own.
use crate::{error::Error, params::DrbgParams};

use std::sync::atomic::{AtomicI64, Ordering};

/// Lengths and bounds pinned by
/// [`Mechanism::choose_algorithm_and_strength`]. All lengths are in
/// bytes, strengths in bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    pub algorithm: String,
    pub security_strength: u32,
    pub highest_supported_strength: u32,
    pub min_length: usize,
    pub max_length: usize,
    pub max_personalization_length: usize,
    pub max_additional_input_length: usize,
    pub max_bytes_per_request: usize,
    pub reseed_interval: i64,
    pub use_df: bool,
    pub supports_reseeding: bool,
    pub supports_prediction_resistance: bool,
}

/// A DRBG mechanism such as CTR_DRBG.
pub trait Mechanism: Send {
    /// Mechanism name as used by SP 800-90A, e.g. `"CTR_DRBG"`.
    const NAME: &'static str;

    /// Choose the algorithm and strength satisfying `params` and
    /// report the resulting limits. Must not change any state; the
    /// engine commits the result only if its own checks pass.
    fn choose_algorithm_and_strength(&self, params: &DrbgParams) -> Result<Limits, Error>;

    /// Adopt `limits` and discard any previous internal state. Called
    /// right before [`instantiate_algorithm`](Self::instantiate_algorithm).
    fn init_engine(&mut self, limits: &Limits);

    /// Instantiate from `entropy`, `nonce` and the personalization
    /// string. Sets `counter` to 1.
    fn instantiate_algorithm(
        &mut self,
        entropy: &[u8],
        nonce: &[u8],
        personalization: Option<&[u8]>,
        counter: &ReseedCounter,
    ) -> Result<(), Error>;

    /// Mix fresh `entropy` and optional additional input into the
    /// state. Sets `counter` to 1.
    fn reseed_algorithm(
        &mut self,
        entropy: &[u8],
        additional: Option<&[u8]>,
        counter: &ReseedCounter,
    ) -> Result<(), Error>;

    /// Fill `bytes` and advance the state. Increments `counter`.
    fn generate_algorithm(
        &mut self,
        bytes: &mut [u8],
        additional: Option<&[u8]>,
        counter: &ReseedCounter,
    ) -> Result<(), Error>;
}

/// Number of generate calls since the last (re)seed.
///
/// Only ever written with the engine lock held. The engine reads it
/// without the lock as a hint before taking the lock and
/// checking again. A stale read costs at most one extra generate
/// before the reseed happens.
#[derive(Debug, Default)]
pub struct ReseedCounter {
    count: AtomicI64,
    interval: AtomicI64,
}

impl ReseedCounter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Current count. Zero before instantiation, may be negative after
    /// wrapping.
    pub fn get(&self) -> i64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.count.store(1, Ordering::Relaxed);
    }

    pub fn increment(&self) {
        // fetch_add wraps on overflow
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    /// True when the count has wrapped or passed the reseed interval.
    pub fn needs_reseed(&self) -> bool {
        let count = self.get();
        count < 0 || count > self.interval.load(Ordering::Relaxed)
    }

    pub(crate) fn configure(&self, interval: i64) {
        self.interval.store(interval, Ordering::Relaxed);
        self.count.store(0, Ordering::Relaxed);
    }

    #[cfg(test)]
    pub(crate) fn set(&self, count: i64) {
        self.count.store(count, Ordering::Relaxed);
    }
}
