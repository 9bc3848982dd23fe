// SPDX-License-Identifier: MIT

//! A deterministic random bit generator engine as defined by NIST [SP
//! 800-90A Rev. 1](https://csrc.nist.gov/publications/detail/sp/800-90a/rev-1/final),
//! with the CTR_DRBG mechanism over AES-128, AES-192 and AES-256.
//!
//! The [`Drbg`] engine handles configuration, lazy instantiation,
//! reseed scheduling and request validation. The cryptography lives
//! in a [`Mechanism`]; this crate ships [`CtrDrbg`]. Instances are
//! seeded through an [`EntropySource`], by default a process-wide
//! seeder DRBG that is itself seeded from the OS.
//!
//! # Quick Example
//!
//! A simple way to obtain crypographic random data is to use the
//! [`LocalDrbg::default()`](crate::thread::LocalDrbg::default())
//! function. This returns a handle to a thread-local instance of
//! CTR_DRBG.
//!
//! ```
//! use nist_drbg::thread::LocalDrbg;
//!
//! # fn main() -> Result<(), nist_drbg::Error> {
//! let drbg = LocalDrbg::default();
//! let mut random_data = [0u8; 32];
//! drbg.fill_bytes(&mut random_data, None)?;
//! # Ok(())
//! # }
//! ```
//!
//! Otherwise an instance may be configured by hand using the
//! [`DrbgBuilder`] class.
//!
//! ```
//! use nist_drbg::{Capability, DrbgBuilder, NextBytes};
//!
//! # fn main() -> Result<(), nist_drbg::Error> {
//! let drbg = DrbgBuilder::new()
//!     .algorithm("AES-192")
//!     .capability(Capability::PredictionResistanceAndReseed)
//!     .personal(b"my application")
//!     .build_ctr()?;
//! assert_eq!(drbg.to_string(), "CTR_DRBG,AES-192,128,pr_and_reseed");
//!
//! let mut key = [0u8; 24];
//! drbg.next_bytes(&mut key, NextBytes::new(Some(128), true, None))?;
//! # Ok(())
//! # }
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod ctr;
pub mod drbg;
pub mod entropy;
pub mod error;
pub mod mechanism;
pub mod nonce;
pub mod params;
pub mod seeder;
pub mod thread;

pub use crate::{
    ctr::CtrDrbg,
    drbg::Drbg,
    entropy::{EntropySource, OsEntropy},
    error::Error,
    mechanism::{Limits, Mechanism, ReseedCounter},
    params::{Capability, DrbgBuilder, DrbgParams, Instantiation, NextBytes, Reseed},
};
