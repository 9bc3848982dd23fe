//
// Copyright (c) 2023 Daniel Ottavio
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
// THE SOFTWARE
//
//! Traits and types for defining entropy sources.
//!
//! A [`Drbg`](crate::drbg::Drbg) pulls entropy input through the
//! [`EntropySource`] trait. Unless a source is configured explicitly,
//! [`DefaultEntropy`] is used: prediction resistant requests are
//! answered by [`OsEntropy`], everything else by [`SeederEntropy`],
//! which draws from a process-wide seeder DRBG.
use crate::{params::NextBytes, seeder};

use std::fmt::{Debug, Display};
use thiserror::Error;
use zeroize::Zeroizing;

/// Error type for entropy source failures.
#[derive(Debug, Error)]
#[error("entropy error: {inner}")]
pub struct Error {
    inner: String,
}

impl Error {
    /// Create a new error by wrapping an underlying entropy source
    /// error.
    ///
    /// # Example
    /// ```
    /// use nist_drbg::entropy::Error;
    ///
    /// fn fill_bytes(bytes: &mut [u8]) -> Result<(), Error> {
    ///    getrandom::getrandom(bytes).map_err(Error::new)
    /// }
    /// ```
    pub fn new<E>(error: E) -> Self
    where
        E: Display + Debug,
    {
        Self {
            inner: error.to_string(),
        }
    }
}

/// Represents a source of cryptographically secure random data used
/// to seed and reseed a DRBG.
///
/// Any closure with the same signature as
/// [`get_entropy`](EntropySource::get_entropy) is a source as well.
///
/// ```
/// use nist_drbg::entropy::{EntropySource, Error};
/// use zeroize::Zeroizing;
///
/// let fixed = |_: usize, min_len: usize, _: usize, _: bool| -> Result<Zeroizing<Vec<u8>>, Error> {
///     Ok(Zeroizing::new(vec![0x5a; min_len]))
/// };
/// let input = fixed.get_entropy(16, 16, 32, false).unwrap();
/// assert_eq!(input.len(), 16);
/// ```
pub trait EntropySource: Send + Sync {
    /// Return `min_length` bytes holding at least `min_entropy` worth
    /// of unpredictable data. `max_length` bounds what the caller can
    /// accept. Implementations may block.
    ///
    /// # Error
    ///
    /// Returns an error if there is a problem with the underlying
    /// entropy source, or if `prediction_resistance` is requested from
    /// a source that cannot provide it.
    fn get_entropy(
        &self,
        min_entropy: usize,
        min_length: usize,
        max_length: usize,
        prediction_resistance: bool,
    ) -> Result<Zeroizing<Vec<u8>>, Error>;
}

impl<F> EntropySource for F
where
    F: Fn(usize, usize, usize, bool) -> Result<Zeroizing<Vec<u8>>, Error> + Send + Sync,
{
    fn get_entropy(
        &self,
        min_entropy: usize,
        min_length: usize,
        max_length: usize,
        prediction_resistance: bool,
    ) -> Result<Zeroizing<Vec<u8>>, Error> {
        self(min_entropy, min_length, max_length, prediction_resistance)
    }
}

/// An entropy source that draws random data from the host operating
/// system. Every call reads fresh OS entropy, so it satisfies
/// prediction resistant requests.
///
/// ```
/// use nist_drbg::entropy::{EntropySource, OsEntropy};
///
/// # use nist_drbg::entropy::Error;
/// #
/// # fn main() -> Result<(),Error> {
/// #
/// let entropy = OsEntropy::default();
/// let random_data = entropy.get_entropy(32, 32, 32, true)?;
/// assert_eq!(random_data.len(), 32);
/// #
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropy {}

impl OsEntropy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EntropySource for OsEntropy {
    /// Fill `min_length` bytes with random data from the operating
    /// system using [`getrandom`](getrandom::getrandom).
    ///
    /// # Error
    ///
    /// Returns any error from `getrandom`.
    fn get_entropy(
        &self,
        _min_entropy: usize,
        min_length: usize,
        _max_length: usize,
        _prediction_resistance: bool,
    ) -> Result<Zeroizing<Vec<u8>>, Error> {
        let mut bytes = Zeroizing::new(vec![0u8; min_length]);
        getrandom::getrandom(&mut bytes).map_err(Error::new)?;
        Ok(bytes)
    }
}

/// An entropy source backed by the process-wide seeder DRBG.
///
/// The seeder is itself a CTR_DRBG instance seeded once from
/// [`OsEntropy`], so output from this source is not prediction
/// resistant and such requests are rejected.
#[derive(Debug, Default, Clone, Copy)]
pub struct SeederEntropy {}

impl EntropySource for SeederEntropy {
    fn get_entropy(
        &self,
        _min_entropy: usize,
        min_length: usize,
        _max_length: usize,
        prediction_resistance: bool,
    ) -> Result<Zeroizing<Vec<u8>>, Error> {
        if prediction_resistance {
            return Err(Error::new(
                "seeder source does not provide prediction resistance",
            ));
        }
        let mut bytes = Zeroizing::new(vec![0u8; min_length]);
        seeder::seeder()
            .next_bytes(&mut bytes, NextBytes::default())
            .map_err(Error::new)?;
        Ok(bytes)
    }
}

/// The source used by a [`Drbg`](crate::drbg::Drbg) that was not
/// configured with one.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultEntropy {}

impl EntropySource for DefaultEntropy {
    fn get_entropy(
        &self,
        min_entropy: usize,
        min_length: usize,
        max_length: usize,
        prediction_resistance: bool,
    ) -> Result<Zeroizing<Vec<u8>>, Error> {
        if prediction_resistance {
            OsEntropy::new().get_entropy(min_entropy, min_length, max_length, true)
        } else {
            SeederEntropy::default().get_entropy(min_entropy, min_length, max_length, false)
        }
    }
}
