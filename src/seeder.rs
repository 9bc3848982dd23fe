// SPDX-License-Identifier: MIT

//! The process-wide seeder DRBG behind
//! [`SeederEntropy`](crate::entropy::SeederEntropy).
//!
//! Seeding every generator straight from the operating system is
//! costly, so generators that do not need prediction resistance are
//! seeded from a single 256-bit CTR_DRBG instead. The seeder itself
//! draws from [`OsEntropy`] and cannot be reseeded on request.
use crate::{
    ctr::CtrDrbg,
    drbg::Drbg,
    entropy::OsEntropy,
    params::{Capability, DrbgBuilder},
};

use once_cell::sync::Lazy;
use std::{
    process, thread,
    time::{SystemTime, UNIX_EPOCH},
};

const SEEDER_STRENGTH: u32 = 256;

static SEEDER: Lazy<Drbg<CtrDrbg>> = Lazy::new(|| {
    DrbgBuilder::new()
        .strength(SEEDER_STRENGTH)
        .capability(Capability::None)
        .use_df(true)
        .entropy(OsEntropy::new())
        .personal(&personalization())
        .build_ctr()
        .expect("seeder configuration failure")
});

/// Process id, creating thread and wall clock time.
fn personalization() -> Vec<u8> {
    let mut info = Vec::with_capacity(64);
    info.extend_from_slice(&process::id().to_be_bytes());
    info.extend_from_slice(format!("{:?}", thread::current().id()).as_bytes());
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    info.extend_from_slice(&now.as_nanos().to_be_bytes());
    info
}

/// The seeder, created on first use.
pub fn seeder() -> &'static Drbg<CtrDrbg> {
    &SEEDER
}

#[cfg(test)]
mod tests {
    use crate::{
        error::Error,
        params::{Capability, Reseed},
        seeder::{personalization, seeder},
    };

    #[test]
    fn configuration() {
        let params = seeder().parameters();
        assert_eq!(params.strength, 256);
        assert_eq!(params.capability, Capability::None);
        assert!(params.personalization.is_some());
        assert_eq!(format!("{}", seeder()), "CTR_DRBG,AES-256,256,none");
    }

    #[test]
    fn single_instance() {
        assert!(std::ptr::eq(seeder(), seeder()));
    }

    #[test]
    fn reseed_is_refused() {
        assert!(matches!(
            seeder().reseed(Reseed::default()),
            Err(Error::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn personalization_has_process_id() {
        let info = personalization();
        assert_eq!(info[..4], std::process::id().to_be_bytes());
        assert!(info.len() > 4 + 16);
    }
}
