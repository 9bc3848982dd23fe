// SPDX-License-Identifier: MIT

//! The DRBG engine: configuration, lazy instantiation, reseed
//! scheduling and request validation on top of a [`Mechanism`].
use crate::{
    ctr::CtrDrbg,
    entropy::{DefaultEntropy, EntropySource, Error as EntropyError},
    error::Error,
    mechanism::{Limits, Mechanism, ReseedCounter},
    nonce,
    params::{DrbgParams, Instantiation, NextBytes, Reseed},
};

use log::{debug, trace};
use std::{
    fmt,
    fmt::{Display, Formatter},
    sync::{Arc, Mutex, MutexGuard},
};
use zeroize::Zeroizing;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Uninstantiated,
    Instantiated,
}

struct State<M> {
    mechanism: M,
    params: DrbgParams,
    limits: Limits,
    entropy: Arc<dyn EntropySource>,
    status: Status,
    nonce: Option<Zeroizing<Vec<u8>>>,
}

/// A deterministic random bit generator as described by [SP 800-90A
/// Rev. 1](https://csrc.nist.gov/publications/detail/sp/800-90a/rev-1/final).
///
/// `Drbg` owns the lifecycle of an instance and delegates the
/// cryptographic work to a [`Mechanism`]. An instance is configured on
/// construction and instantiated lazily, on the first request, with
/// entropy from the configured [`EntropySource`] and a nonce. It
/// reseeds automatically once the reseed interval is exceeded or
/// prediction resistance is requested.
///
/// All state sits behind one lock, so an instance may be shared
/// between threads.
///
/// # Example
///
/// ```
/// use nist_drbg::{Capability, DrbgBuilder, NextBytes, Reseed};
///
/// # fn main() -> Result<(), nist_drbg::Error> {
/// let drbg = DrbgBuilder::new()
///     .strength(128)
///     .capability(Capability::PredictionResistanceAndReseed)
///     .build_ctr()?;
///
/// let mut key = [0u8; 16];
/// drbg.next_bytes(&mut key, NextBytes::new(Some(128), true, Some(&b"key"[..])))?;
/// drbg.reseed(Reseed::default())?;
/// # Ok(())
/// # }
/// ```
pub struct Drbg<M> {
    state: Mutex<State<M>>,
    reseed_counter: ReseedCounter,
}

impl Drbg<CtrDrbg> {
    /// A CTR_DRBG instance configured with `params`.
    pub fn new_ctr(params: DrbgParams) -> Result<Self, Error> {
        Self::new(CtrDrbg::new(), params)
    }
}

/// Treat empty input the same as no input.
fn non_empty(bytes: Option<&[u8]>) -> Option<&[u8]> {
    bytes.filter(|b| !b.is_empty())
}

impl<M> Drbg<M>
where
    M: Mechanism,
{
    /// Create an instance of `mechanism` configured with `params`.
    ///
    /// # Error
    ///
    /// Returns [`Error::InvalidArgument`] when `params` cannot be
    /// satisfied by the mechanism.
    pub fn new(mechanism: M, params: DrbgParams) -> Result<Self, Error> {
        let limits = Self::check_params(&mechanism, &params)?;
        let reseed_counter = ReseedCounter::new();
        reseed_counter.configure(limits.reseed_interval);
        debug!(
            "{}: configured {} strength {}",
            M::NAME,
            limits.algorithm,
            limits.security_strength
        );
        let state = State {
            mechanism,
            entropy: Self::entropy_for(&params),
            params,
            limits,
            status: Status::Uninstantiated,
            nonce: None,
        };
        Ok(Self {
            state: Mutex::new(state),
            reseed_counter,
        })
    }

    /// Replace the configuration. The instance is instantiated again,
    /// with fresh entropy and nonce, on next use. On error the current
    /// configuration is kept.
    ///
    /// # Error
    ///
    /// Returns [`Error::InvalidArgument`] when `params` cannot be
    /// satisfied by the mechanism.
    pub fn configure(&self, params: DrbgParams) -> Result<(), Error> {
        let mut state = self.lock();
        let limits = Self::check_params(&state.mechanism, &params)?;
        debug!(
            "{}: reconfigured {} strength {}",
            M::NAME,
            limits.algorithm,
            limits.security_strength
        );
        self.reseed_counter.configure(limits.reseed_interval);
        state.entropy = Self::entropy_for(&params);
        state.params = params;
        state.limits = limits;
        state.status = Status::Uninstantiated;
        state.nonce = None;
        Ok(())
    }

    /// Fill `bytes` with random data.
    ///
    /// The request is rejected, without touching any state, if it asks
    /// for more strength than configured, carries too much additional
    /// input, or asks for prediction resistance the instance was not
    /// configured for. Otherwise the instance is instantiated if
    /// needed and reseeded if the reseed interval has passed or
    /// prediction resistance is requested. Additional input is mixed
    /// into that reseed instead of the generate call.
    ///
    /// There is no limit to the length of `bytes`.
    ///
    /// # Error
    ///
    /// Returns [`Error::InvalidArgument`] for rejected requests and
    /// [`Error::Entropy`] when the entropy source fails.
    pub fn next_bytes(&self, bytes: &mut [u8], params: NextBytes) -> Result<(), Error> {
        let additional = non_empty(params.additional);
        let pr = params.prediction_resistance;
        // Read before locking. When false, the reseed condition is not
        // evaluated again under the lock.
        let wants_reseed = pr || self.reseed_counter.needs_reseed();

        let mut state = self.lock();
        if let Some(strength) = params.strength {
            if strength > state.limits.security_strength {
                return Err(Error::invalid(format!(
                    "strength {} too high, configured {}",
                    strength, state.limits.security_strength
                )));
            }
        }
        Self::check_additional(&state, additional)?;
        if pr && !state.params.capability.supports_prediction_resistance() {
            return Err(Error::invalid("prediction resistance not available"));
        }

        self.ensure_instantiated(&mut state, None)?;

        let mut additional = additional;
        if wants_reseed && (pr || self.reseed_counter.needs_reseed()) {
            let entropy = Self::entropy_input(&state, pr)?;
            debug!(
                "{}: reseed, counter {}, prediction resistance {}",
                M::NAME,
                self.reseed_counter.get(),
                pr
            );
            state
                .mechanism
                .reseed_algorithm(&entropy, additional, &self.reseed_counter)?;
            additional = None;
        }
        trace!("{}: generate {} bytes", M::NAME, bytes.len());
        state
            .mechanism
            .generate_algorithm(bytes, additional, &self.reseed_counter)
    }

    /// Fill `bytes` at the configured strength, without prediction
    /// resistance.
    pub fn fill_bytes(&self, bytes: &mut [u8], additional: Option<&[u8]>) -> Result<(), Error> {
        self.next_bytes(bytes, NextBytes::new(None, false, additional))
    }

    /// Reseed with fresh entropy and optional additional input.
    ///
    /// # Error
    ///
    /// Returns [`Error::UnsupportedOperation`] if the instance was
    /// configured without reseeding, [`Error::InvalidArgument`] for
    /// unavailable prediction resistance or too much additional input,
    /// and [`Error::Entropy`] when the entropy source fails.
    pub fn reseed(&self, params: Reseed) -> Result<(), Error> {
        let additional = non_empty(params.additional);
        let pr = params.prediction_resistance;

        let mut state = self.lock();
        if !state.params.capability.supports_reseeding() {
            return Err(Error::unsupported("reseed not supported"));
        }
        if pr && !state.params.capability.supports_prediction_resistance() {
            return Err(Error::invalid("prediction resistance not available"));
        }
        Self::check_additional(&state, additional)?;

        self.ensure_instantiated(&mut state, None)?;
        let entropy = Self::entropy_input(&state, pr)?;
        debug!("{}: explicit reseed", M::NAME);
        state
            .mechanism
            .reseed_algorithm(&entropy, additional, &self.reseed_counter)
    }

    /// Supply seed material directly.
    ///
    /// `input` is zero padded or truncated to the accepted entropy
    /// length. Before instantiation it replaces the entropy input of
    /// the instantiation; afterwards it is mixed in with a reseed.
    pub fn set_seed(&self, input: &[u8]) -> Result<(), Error> {
        let mut state = self.lock();
        let len = input
            .len()
            .clamp(state.limits.min_length, state.limits.max_length);
        let mut seed = Zeroizing::new(vec![0u8; len]);
        let n = input.len().min(len);
        seed[..n].copy_from_slice(&input[..n]);

        let status = state.status;
        match status {
            Status::Uninstantiated => self.ensure_instantiated(&mut state, Some(seed)),
            Status::Instantiated => {
                debug!("{}: reseed from supplied seed", M::NAME);
                state
                    .mechanism
                    .reseed_algorithm(&seed, None, &self.reseed_counter)
            }
        }
    }

    /// The configuration currently in effect.
    pub fn parameters(&self) -> Instantiation {
        let state = self.lock();
        Instantiation {
            strength: state.limits.security_strength,
            capability: state.params.capability,
            personalization: state.params.personalization().map(<[u8]>::to_vec),
        }
    }

    pub fn security_strength(&self) -> u32 {
        self.lock().limits.security_strength
    }

    pub fn is_instantiated(&self) -> bool {
        self.lock().status == Status::Instantiated
    }

    /// Generate calls since the last (re)seed, zero before
    /// instantiation.
    pub fn reseed_counter(&self) -> i64 {
        self.reseed_counter.get()
    }

    fn lock(&self) -> MutexGuard<'_, State<M>> {
        match self.state.lock() {
            Ok(guard) => guard,
            // A panic in the middle of a mechanism call leaves the
            // secret state undefined.
            Err(_) => panic!("{}: state poisoned by an earlier panic", M::NAME),
        }
    }

    fn entropy_for(params: &DrbgParams) -> Arc<dyn EntropySource> {
        params
            .entropy_source()
            .unwrap_or_else(|| Arc::new(DefaultEntropy::default()))
    }

    fn check_params(mechanism: &M, params: &DrbgParams) -> Result<Limits, Error> {
        let mut limits = mechanism.choose_algorithm_and_strength(params)?;
        if limits.security_strength > limits.highest_supported_strength {
            return Err(Error::invalid(format!(
                "strength {} too high, {} supports up to {}",
                limits.security_strength, limits.algorithm, limits.highest_supported_strength
            )));
        }
        let capability = params.capability();
        if capability.supports_prediction_resistance() && !limits.supports_prediction_resistance {
            return Err(Error::invalid(format!(
                "{} does not support prediction resistance",
                M::NAME
            )));
        }
        if capability.supports_reseeding() && !limits.supports_reseeding {
            return Err(Error::invalid(format!(
                "{} does not support reseeding",
                M::NAME
            )));
        }
        if let Some(ps) = params.personalization() {
            if ps.len() > limits.max_personalization_length {
                return Err(Error::invalid(format!(
                    "personalization string longer than {} bytes",
                    limits.max_personalization_length
                )));
            }
        }
        if let Some(interval) = params.reseed_interval() {
            if interval < 1 || interval > limits.reseed_interval {
                return Err(Error::invalid(format!(
                    "reseed interval must be between 1 and {}",
                    limits.reseed_interval
                )));
            }
            limits.reseed_interval = interval;
        }
        Ok(limits)
    }

    fn check_additional(state: &State<M>, additional: Option<&[u8]>) -> Result<(), Error> {
        match additional {
            Some(add) if add.len() > state.limits.max_additional_input_length => {
                Err(Error::invalid(format!(
                    "additional input longer than {} bytes",
                    state.limits.max_additional_input_length
                )))
            }
            _ => Ok(()),
        }
    }

    /// Fetch entropy input. The minimum length is also passed as the
    /// minimum entropy: without the derivation function CTR_DRBG needs
    /// full seed length entropy.
    fn entropy_input(state: &State<M>, pr: bool) -> Result<Zeroizing<Vec<u8>>, Error> {
        let limits = &state.limits;
        let entropy = state.entropy.get_entropy(
            limits.min_length,
            limits.min_length,
            limits.max_length,
            pr,
        )?;
        if entropy.len() < limits.min_length || entropy.len() > limits.max_length {
            return Err(EntropyError::new(format!(
                "source returned {} bytes, expected {} to {}",
                entropy.len(),
                limits.min_length,
                limits.max_length
            ))
            .into());
        }
        Ok(entropy)
    }

    /// Instantiate unless already done. `seed` replaces the entropy
    /// input when given.
    fn ensure_instantiated(
        &self,
        state: &mut State<M>,
        seed: Option<Zeroizing<Vec<u8>>>,
    ) -> Result<(), Error> {
        if state.status == Status::Instantiated {
            return Ok(());
        }
        let entropy = match seed {
            Some(seed) => seed,
            None => {
                let pr = state.params.capability.supports_prediction_resistance();
                Self::entropy_input(state, pr)?
            }
        };
        let nonce = match state.params.nonce() {
            Some(n) => Zeroizing::new(n.to_vec()),
            None => Zeroizing::new(nonce::next().to_vec()),
        };

        let State {
            mechanism,
            params,
            limits,
            ..
        } = &mut *state;
        mechanism.init_engine(limits);
        mechanism.instantiate_algorithm(
            &entropy,
            &nonce,
            params.personalization(),
            &self.reseed_counter,
        )?;
        state.nonce = Some(nonce);
        state.status = Status::Instantiated;
        debug!(
            "{}: instantiated {} strength {}",
            M::NAME,
            state.limits.algorithm,
            state.limits.security_strength
        );
        Ok(())
    }
}

impl<M> Display for Drbg<M>
where
    M: Mechanism,
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let state = self.lock();
        write!(
            f,
            "{},{},{},{}",
            M::NAME,
            state.limits.algorithm,
            state.limits.security_strength,
            state.params.capability
        )
    }
}

impl<M> fmt::Debug for Drbg<M>
where
    M: Mechanism,
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("Drbg")
            .field("mechanism", &M::NAME)
            .field("algorithm", &state.limits.algorithm)
            .field("strength", &state.limits.security_strength)
            .field("capability", &state.params.capability)
            .field("instantiated", &(state.status == Status::Instantiated))
            .field("nonce_len", &state.nonce.as_ref().map(|n| n.len()))
            .field("reseed_counter", &self.reseed_counter.get())
            .finish()
    }
}

#[cfg(feature = "rand_core")]
#[cfg_attr(docsrs, doc(cfg(feature = "rand_core")))]
impl<M> rand_core::RngCore for Drbg<M>
where
    M: Mechanism,
{
    fn next_u32(&mut self) -> u32 {
        rand_core::impls::next_u32_via_fill(self)
    }

    fn next_u64(&mut self) -> u64 {
        rand_core::impls::next_u64_via_fill(self)
    }

    fn fill_bytes(&mut self, bytes: &mut [u8]) {
        if let Err(e) = self.next_bytes(bytes, NextBytes::default()) {
            panic!("{}: {}", M::NAME, e);
        }
    }

    fn try_fill_bytes(&mut self, bytes: &mut [u8]) -> Result<(), rand_core::Error> {
        self.next_bytes(bytes, NextBytes::default())
            .map_err(rand_core::Error::new)
    }
}

#[cfg(feature = "rand_core")]
#[cfg_attr(docsrs, doc(cfg(feature = "rand_core")))]
impl<M> rand_core::CryptoRng for Drbg<M> where M: Mechanism {}
