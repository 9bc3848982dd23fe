// SPDX-License-Identifier: MIT

//! Configuration and per-call parameters.
//!
//! A generator is configured with [`DrbgParams`], usually assembled
//! through [`DrbgBuilder`]. Individual requests take [`NextBytes`] and
//! [`Reseed`], and the active configuration is reported back as an
//! [`Instantiation`].
use crate::{
    ctr::CtrDrbg,
    drbg::Drbg,
    entropy::EntropySource,
    error::Error,
};

use std::{
    fmt,
    fmt::{Debug, Display, Formatter},
    sync::Arc,
};
use zeroize::Zeroizing;

/// Strength used when none is requested.
pub const DEFAULT_STRENGTH: u32 = 128;

/// Round a requested strength up to one of 112, 128, 192 or 256.
pub fn standard_strength(requested: u32) -> Result<u32, Error> {
    match requested {
        0..=112 => Ok(112),
        113..=128 => Ok(128),
        129..=192 => Ok(192),
        193..=256 => Ok(256),
        _ => Err(Error::invalid(format!(
            "strength {} exceeds 256 bits",
            requested
        ))),
    }
}

/// Reseeding and prediction resistance offered by an instance.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Neither explicit reseeding nor prediction resistance.
    None,
    #[default]
    ReseedOnly,
    PredictionResistanceAndReseed,
}

impl Capability {
    pub fn supports_reseeding(self) -> bool {
        self != Capability::None
    }

    pub fn supports_prediction_resistance(self) -> bool {
        self == Capability::PredictionResistanceAndReseed
    }
}

impl Display for Capability {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let s = match self {
            Capability::None => "none",
            Capability::ReseedOnly => "reseed_only",
            Capability::PredictionResistanceAndReseed => "pr_and_reseed",
        };
        f.write_str(s)
    }
}

/// Configuration of a DRBG instance.
///
/// Fields left unset are chosen by the mechanism. Byte strings are
/// wiped when the value is dropped.
#[derive(Clone)]
pub struct DrbgParams {
    pub(crate) strength: Option<u32>,
    pub(crate) capability: Capability,
    pub(crate) personalization: Option<Zeroizing<Vec<u8>>>,
    pub(crate) algorithm: Option<String>,
    pub(crate) nonce: Option<Zeroizing<Vec<u8>>>,
    pub(crate) entropy: Option<Arc<dyn EntropySource>>,
    pub(crate) use_df: bool,
    pub(crate) reseed_interval: Option<i64>,
}

impl Default for DrbgParams {
    fn default() -> Self {
        Self {
            strength: None,
            capability: Capability::default(),
            personalization: None,
            algorithm: None,
            nonce: None,
            entropy: None,
            use_df: true,
            reseed_interval: None,
        }
    }
}

impl DrbgParams {
    /// Requested strength in bits, before rounding.
    pub fn strength(&self) -> Option<u32> {
        self.strength
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    /// The personalization string, if a non-empty one was given.
    pub fn personalization(&self) -> Option<&[u8]> {
        self.personalization.as_deref().map(Vec::as_slice)
    }

    pub fn algorithm(&self) -> Option<&str> {
        self.algorithm.as_deref()
    }

    pub fn nonce(&self) -> Option<&[u8]> {
        self.nonce.as_deref().map(Vec::as_slice)
    }

    pub fn use_df(&self) -> bool {
        self.use_df
    }

    pub fn reseed_interval(&self) -> Option<i64> {
        self.reseed_interval
    }

    pub(crate) fn entropy_source(&self) -> Option<Arc<dyn EntropySource>> {
        self.entropy.clone()
    }
}

impl Debug for DrbgParams {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("DrbgParams")
            .field("strength", &self.strength)
            .field("capability", &self.capability)
            .field(
                "personalization",
                &self.personalization.as_ref().map(|p| p.len()),
            )
            .field("algorithm", &self.algorithm)
            .field("nonce", &self.nonce.as_ref().map(|n| n.len()))
            .field("entropy", &self.entropy.is_some())
            .field("use_df", &self.use_df)
            .field("reseed_interval", &self.reseed_interval)
            .finish()
    }
}

/// Builder class for [`DrbgParams`] and CTR_DRBG instances.
///
/// By default the instance uses 128-bit strength, supports reseeding
/// but not prediction resistance, applies the derivation function and
/// draws entropy and nonce from the process-wide defaults.
///
/// # Example
/// ```
/// use nist_drbg::{Capability, DrbgBuilder};
///
/// # fn main() -> Result<(), nist_drbg::Error> {
/// let my_info = 0u32;
/// let drbg = DrbgBuilder::new()
///     .strength(256)
///     .capability(Capability::PredictionResistanceAndReseed)
///     .personal(&my_info.to_be_bytes())
///     .build_ctr()?;
/// assert_eq!(drbg.security_strength(), 256);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct DrbgBuilder {
    params: DrbgParams,
}

impl DrbgBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requested security strength in bits. Values are rounded up to
    /// the next standard strength when the instance is configured.
    pub fn strength(mut self, strength: u32) -> Self {
        self.params.strength = Some(strength);
        self
    }

    pub fn capability(mut self, capability: Capability) -> Self {
        self.params.capability = capability;
        self
    }

    /// Personalization string mixed in at instantiation. An empty
    /// string is the same as none.
    pub fn personal(mut self, personal: &[u8]) -> Self {
        self.params.personalization = match personal.is_empty() {
            true => None,
            false => Some(Zeroizing::new(personal.to_vec())),
        };
        self
    }

    /// Mechanism specific algorithm, e.g. `"AES-128"` for CTR_DRBG.
    pub fn algorithm(mut self, algorithm: &str) -> Self {
        self.params.algorithm = Some(algorithm.to_string());
        self
    }

    /// Fixed nonce used at instantiation instead of the process-wide
    /// nonce counter.
    pub fn nonce(mut self, nonce: &[u8]) -> Self {
        self.params.nonce = Some(Zeroizing::new(nonce.to_vec()));
        self
    }

    /// Entropy source used instead of
    /// [`DefaultEntropy`](crate::entropy::DefaultEntropy).
    pub fn entropy<E>(mut self, entropy: E) -> Self
    where
        E: EntropySource + 'static,
    {
        self.params.entropy = Some(Arc::new(entropy));
        self
    }

    /// Same as [`entropy`](Self::entropy) for an already shared source.
    pub fn shared_entropy(mut self, entropy: Arc<dyn EntropySource>) -> Self {
        self.params.entropy = Some(entropy);
        self
    }

    /// Whether the derivation function is applied to seed material.
    /// Without it, entropy input must be exactly seed length.
    pub fn use_df(mut self, use_df: bool) -> Self {
        self.params.use_df = use_df;
        self
    }

    /// Number of generate calls permitted between reseeds. Must be
    /// between 1 and the mechanism's maximum.
    pub fn reseed_interval(mut self, reseed_interval: i64) -> Self {
        self.params.reseed_interval = Some(reseed_interval);
        self
    }

    pub fn build(self) -> DrbgParams {
        self.params
    }

    /// Build and configure a new CTR_DRBG instance. The instance is
    /// instantiated lazily on first use.
    ///
    /// # Error
    ///
    /// Returns [`Error::InvalidArgument`] when the parameters cannot
    /// be satisfied.
    pub fn build_ctr(self) -> Result<Drbg<CtrDrbg>, Error> {
        Drbg::new(CtrDrbg::new(), self.params)
    }
}

/// Parameters of a single generate request.
#[derive(Debug, Default, Clone, Copy)]
pub struct NextBytes<'a> {
    /// Minimum strength the output must have. `None` accepts the
    /// configured strength.
    pub strength: Option<u32>,
    pub prediction_resistance: bool,
    pub additional: Option<&'a [u8]>,
}

impl<'a> NextBytes<'a> {
    pub fn new(
        strength: Option<u32>,
        prediction_resistance: bool,
        additional: Option<&'a [u8]>,
    ) -> Self {
        Self {
            strength,
            prediction_resistance,
            additional,
        }
    }
}

/// Parameters of an explicit reseed.
#[derive(Debug, Default, Clone, Copy)]
pub struct Reseed<'a> {
    pub prediction_resistance: bool,
    pub additional: Option<&'a [u8]>,
}

impl<'a> Reseed<'a> {
    pub fn new(prediction_resistance: bool, additional: Option<&'a [u8]>) -> Self {
        Self {
            prediction_resistance,
            additional,
        }
    }
}

/// The configuration an instance is actually running with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instantiation {
    pub strength: u32,
    pub capability: Capability,
    pub personalization: Option<Vec<u8>>,
}

impl Display for Instantiation {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{},{},", self.strength, self.capability)?;
        if let Some(p) = &self.personalization {
            for b in p {
                write!(f, "{:02x}", b)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::params::{standard_strength, Capability, DrbgBuilder, Instantiation};

    #[test]
    fn strength_rounding() {
        assert_eq!(standard_strength(0).unwrap(), 112);
        assert_eq!(standard_strength(112).unwrap(), 112);
        assert_eq!(standard_strength(113).unwrap(), 128);
        assert_eq!(standard_strength(160).unwrap(), 192);
        assert_eq!(standard_strength(256).unwrap(), 256);
        assert!(standard_strength(257).is_err());
    }

    #[test]
    fn capability_flags() {
        assert!(!Capability::None.supports_reseeding());
        assert!(!Capability::None.supports_prediction_resistance());
        assert!(Capability::ReseedOnly.supports_reseeding());
        assert!(!Capability::ReseedOnly.supports_prediction_resistance());
        assert!(Capability::PredictionResistanceAndReseed.supports_reseeding());
        assert!(Capability::PredictionResistanceAndReseed.supports_prediction_resistance());
    }

    #[test]
    fn builder_defaults() {
        let params = DrbgBuilder::new().build();
        assert_eq!(params.strength(), None);
        assert_eq!(params.capability(), Capability::ReseedOnly);
        assert!(params.use_df());
        assert!(params.personalization().is_none());
    }

    #[test]
    fn empty_personal_is_absent() {
        let params = DrbgBuilder::new().personal(&[]).build();
        assert!(params.personalization().is_none());
    }

    #[test]
    fn debug_hides_bytes() {
        let params = DrbgBuilder::new().personal(b"secret-label").build();
        let s = format!("{:?}", params);
        assert!(!s.contains("secret"));
        assert!(s.contains("Some(12)"));
    }

    #[test]
    fn instantiation_display() {
        let inst = Instantiation {
            strength: 128,
            capability: Capability::PredictionResistanceAndReseed,
            personalization: Some(vec![0xab, 0x01]),
        };
        assert_eq!(format!("{}", inst), "128,pr_and_reseed,ab01");
    }
}
