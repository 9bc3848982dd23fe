// SPDX-License-Identifier: MIT

//! A thread-local interface for the CTR_DRBG engine.
use crate::{
    ctr::CtrDrbg,
    drbg::Drbg,
    error::Error,
    params::{Capability, DrbgBuilder, NextBytes, Reseed},
};

use std::{
    rc::Rc,
    sync::atomic::{AtomicU64, Ordering},
    thread_local,
};

/// A thread-local instance of CTR_DRBG.
///
/// A call to [`LocalDrbg::default()`] returns a handle to a
/// pre-allocated thread-local instance. Each instance is
/// automatically configured with the following configuration:
///
/// - AES-128 at 128-bit strength with the derivation function.
///
/// - Entropy from the process-wide seeder.
///
/// - Reseed interval of 2^14.
///
/// - 8 byte unique ID as personalization information.
///
/// # Example
///
/// ```
/// use nist_drbg::thread::LocalDrbg;
///
/// # fn main() -> Result<(), nist_drbg::Error> {
/// let drbg = LocalDrbg::default();
/// let mut random_data = [0u8; 32];
/// drbg.fill_bytes(&mut random_data, None)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LocalDrbg {
    rng: Rc<Drbg<CtrDrbg>>,
}

const STRENGTH: u32 = 128;

const RESEED_INTERVAL: i64 = 1 << 14;

static NEXT_LOCAL_ID: AtomicU64 = AtomicU64::new(0);

thread_local!(
    static LOCAL_RNG: Rc<Drbg<CtrDrbg>> = {
        let id = NEXT_LOCAL_ID.fetch_add(1, Ordering::Relaxed);
        let drbg = DrbgBuilder::new()
            .strength(STRENGTH)
            .capability(Capability::ReseedOnly)
            .personal(&id.to_be_bytes())
            .reseed_interval(RESEED_INTERVAL)
            .build_ctr()
            .expect("DrbgBuilder failure");

        Rc::new(drbg)
    }
);

impl Default for LocalDrbg {
    fn default() -> Self {
        Self {
            rng: LOCAL_RNG.with(|v| v.clone()),
        }
    }
}

impl LocalDrbg {
    /// See [`next_bytes`](crate::drbg::Drbg::next_bytes) for details.
    pub fn next_bytes(&self, bytes: &mut [u8], params: NextBytes) -> Result<(), Error> {
        self.rng.next_bytes(bytes, params)
    }

    /// See [`fill_bytes`](crate::drbg::Drbg::fill_bytes) for details.
    pub fn fill_bytes(&self, bytes: &mut [u8], additional: Option<&[u8]>) -> Result<(), Error> {
        self.rng.fill_bytes(bytes, additional)
    }

    /// See [`reseed`](crate::drbg::Drbg::reseed) for details.
    pub fn reseed(&self, additional: Option<&[u8]>) -> Result<(), Error> {
        self.rng.reseed(Reseed::new(false, additional))
    }
}

#[cfg(feature = "rand_core")]
#[cfg_attr(docsrs, doc(cfg(feature = "rand_core")))]
impl rand_core::CryptoRng for LocalDrbg {}

#[cfg(feature = "rand_core")]
#[cfg_attr(docsrs, doc(cfg(feature = "rand_core")))]
impl rand_core::RngCore for LocalDrbg {
    fn next_u32(&mut self) -> u32 {
        rand_core::impls::next_u32_via_fill(self)
    }

    fn next_u64(&mut self) -> u64 {
        rand_core::impls::next_u64_via_fill(self)
    }

    fn fill_bytes(&mut self, bytes: &mut [u8]) {
        if let Err(e) = self.rng.next_bytes(bytes, NextBytes::default()) {
            panic!("LocalDrbg: {}", e);
        }
    }

    fn try_fill_bytes(&mut self, bytes: &mut [u8]) -> Result<(), rand_core::Error> {
        self.rng
            .next_bytes(bytes, NextBytes::default())
            .map_err(rand_core::Error::new)
    }
}
