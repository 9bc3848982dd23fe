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
//! A module to facilitate the CTR_DRBG algorithm.
//!
//! The CTR_DRBG mechanism is implemented via the [`CtrDrbg`] type and
//! driven by the [`Drbg`](crate::drbg::Drbg) engine. Instances are
//! usually created with
//! [`DrbgBuilder::build_ctr`](crate::params::DrbgBuilder::build_ctr).
//!
use crate::{
    error::Error,
    mechanism::{Limits, Mechanism, ReseedCounter},
    params::{standard_strength, DrbgParams, DEFAULT_STRENGTH},
};

use aes::{
    cipher::{generic_array::GenericArray, BlockEncrypt, KeyInit},
    Aes128Enc, Aes192Enc, Aes256Enc, Block,
};
use core::{fmt, iter::zip};
use zeroize::{Zeroize, Zeroizing};

const BLOCK_LEN: usize = 16;
// The whole of V is used as the counter.
const CTR_LEN: usize = BLOCK_LEN;
const MAX_INPUT_LEN: usize = i32::MAX as usize;
const MAX_RESEED_INTERVAL: i64 = i32::MAX as i64;
const HIGHEST_STRENGTH: u32 = 256;

/// AES variant backing an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeySize {
    Aes128,
    Aes192,
    Aes256,
}

impl KeySize {
    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "AES-128" => Some(KeySize::Aes128),
            "AES-192" => Some(KeySize::Aes192),
            "AES-256" => Some(KeySize::Aes256),
            _ => None,
        }
    }

    fn from_strength(strength: u32) -> Self {
        match strength {
            0..=128 => KeySize::Aes128,
            129..=192 => KeySize::Aes192,
            _ => KeySize::Aes256,
        }
    }

    fn name(self) -> &'static str {
        match self {
            KeySize::Aes128 => "AES-128",
            KeySize::Aes192 => "AES-192",
            KeySize::Aes256 => "AES-256",
        }
    }

    fn strength(self) -> u32 {
        match self {
            KeySize::Aes128 => 128,
            KeySize::Aes192 => 192,
            KeySize::Aes256 => 256,
        }
    }

    fn key_len(self) -> usize {
        self.strength() as usize / 8
    }
}

/// Single block AES encryption with a fixed key.
enum Cipher {
    Aes128(Aes128Enc),
    Aes192(Aes192Enc),
    Aes256(Aes256Enc),
}

impl Cipher {
    fn new(key: &[u8]) -> Self {
        match key.len() {
            16 => Cipher::Aes128(Aes128Enc::new(GenericArray::from_slice(key))),
            24 => Cipher::Aes192(Aes192Enc::new(GenericArray::from_slice(key))),
            32 => Cipher::Aes256(Aes256Enc::new(GenericArray::from_slice(key))),
            n => panic!("CtrDrbg: invalid AES key length {}", n),
        }
    }

    fn encrypt_block(&self, block: &mut Block) {
        match self {
            Cipher::Aes128(c) => c.encrypt_block(block),
            Cipher::Aes192(c) => c.encrypt_block(block),
            Cipher::Aes256(c) => c.encrypt_block(block),
        }
    }
}

/// Secret working state: `Key` and `V`.
struct CtrState {
    key: Zeroizing<Vec<u8>>,
    v: Zeroizing<[u8; BLOCK_LEN]>,
}

impl CtrState {
    fn zero(key_len: usize) -> Self {
        Self {
            key: Zeroizing::new(vec![0u8; key_len]),
            v: Zeroizing::new([0u8; BLOCK_LEN]),
        }
    }
}

/// Implementation of the CTR_DRBG mechanism of [SP 800-90A
/// Rev. 1](https://csrc.nist.gov/publications/detail/sp/800-90a/rev-1/final)
/// over AES-128, AES-192 or AES-256, with or without the derivation
/// function.
///
/// The algorithm is chosen from the requested name (`"AES-128"`,
/// `"AES-192"`, `"AES-256"`, case-insensitive) or, when none is
/// given, from the security strength.
///
/// # Example
///
/// ```
/// use nist_drbg::{DrbgBuilder, NextBytes};
///
/// # fn main() -> Result<(), nist_drbg::Error> {
/// // Build a new instance
/// let drbg = DrbgBuilder::new().algorithm("AES-256").build_ctr()?;
///
/// // Generate random data
/// let mut random_data = [0u8; 32];
/// drbg.next_bytes(&mut random_data, NextBytes::default())?;
/// assert_eq!(drbg.to_string(), "CTR_DRBG,AES-256,128,reseed_only");
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct CtrDrbg {
    key_size: Option<KeySize>,
    use_df: bool,
    state: Option<CtrState>,
}

impl fmt::Debug for CtrDrbg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("CtrDrbg")
            .field("algorithm", &self.key_size.map(KeySize::name))
            .field("use_df", &self.use_df)
            .field("instantiated", &self.state.is_some())
            .finish()
    }
}

/// Increment a slice of bytes by 1 in big-endian order.
fn inc_bytes(block: &mut [u8]) {
    for bit in block.iter_mut().rev() {
        if *bit == 0xff {
            *bit = 0;
        } else {
            *bit += 1;
            break;
        }
    }
}

/// Concatenate two inputs, bounded by the 32-bit length field of the
/// derivation function.
fn concat(a: &[u8], b: &[u8]) -> Result<Zeroizing<Vec<u8>>, Error> {
    match a.len().checked_add(b.len()) {
        Some(len) if len <= u32::MAX as usize => {
            let mut out = Zeroizing::new(Vec::with_capacity(len));
            out.extend_from_slice(a);
            out.extend_from_slice(b);
            Ok(out)
        }
        _ => Err(Error::invalid("input too long for derivation function")),
    }
}

/// Block chaining function used by the derivation function.
///
/// `chunks` are processed as one byte stream. A trailing partial block
/// is implicitly zero padded.
fn bcc(cipher: &Cipher, chunks: &[&[u8]]) -> Block {
    let mut chain = Block::default();
    let mut pos = 0;
    for chunk in chunks {
        for b in chunk.iter() {
            chain[pos] ^= *b;
            pos += 1;
            if pos == BLOCK_LEN {
                cipher.encrypt_block(&mut chain);
                pos = 0;
            }
        }
    }
    if pos != 0 {
        cipher.encrypt_block(&mut chain);
    }
    chain
}

impl CtrDrbg {
    pub fn new() -> Self {
        Self::default()
    }

    fn key_size(&self) -> KeySize {
        match self.key_size {
            Some(k) => k,
            None => panic!("CtrDrbg: used before init_engine"),
        }
    }

    fn seed_len(&self) -> usize {
        self.key_size().key_len() + BLOCK_LEN
    }

    fn state_mut(&mut self) -> &mut CtrState {
        match self.state.as_mut() {
            Some(s) => s,
            None => panic!("CtrDrbg: state used before instantiation"),
        }
    }

    /// Block_cipher_df, returns seed length bytes derived from
    /// `input`.
    fn df(&self, input: &[u8]) -> Zeroizing<Vec<u8>> {
        let key_len = self.key_size().key_len();
        let seed_len = self.seed_len();

        let mut header = [0u8; 8];
        header[..4].copy_from_slice(&(input.len() as u32).to_be_bytes());
        header[4..].copy_from_slice(&(seed_len as u32).to_be_bytes());

        let k: Vec<u8> = (0..key_len as u8).collect();
        let cipher = Cipher::new(&k);
        //
        // Build the buffer that contains the derived K and X values.
        //
        let mut tmp_buf = Zeroizing::new(vec![0u8; seed_len]);
        for (i, blk) in tmp_buf.chunks_mut(BLOCK_LEN).enumerate() {
            let mut iv = [0u8; BLOCK_LEN];
            iv[..4].copy_from_slice(&(i as u32).to_be_bytes());
            let chunks: [&[u8]; 4] = [&iv, &header, input, &[0x80]];
            let mut chain = bcc(&cipher, &chunks);
            blk.copy_from_slice(&chain[..blk.len()]);
            chain.as_mut_slice().zeroize();
        }
        // K
        let cipher = Cipher::new(&tmp_buf[..key_len]);
        // X
        let mut x_blk = Block::clone_from_slice(&tmp_buf[key_len..seed_len]);
        let mut output = Zeroizing::new(vec![0u8; seed_len]);
        for blk in output.chunks_mut(BLOCK_LEN) {
            cipher.encrypt_block(&mut x_blk);
            blk.copy_from_slice(&x_blk[..blk.len()]);
        }
        x_blk.as_mut_slice().zeroize();
        output
    }

    /// CTR_DRBG_Update. `data` must be exactly seed length.
    fn update(&mut self, data: &[u8]) {
        let key_len = self.key_size().key_len();
        let seed_len = self.seed_len();
        assert_eq!(
            data.len(),
            seed_len,
            "CtrDrbg: update requires seed length input"
        );

        let state = self.state_mut();
        let cipher = Cipher::new(&state.key);
        let blocks = (seed_len + BLOCK_LEN - 1) / BLOCK_LEN;
        let mut tmp_buf = Zeroizing::new(vec![0u8; blocks * BLOCK_LEN]);
        for blk in tmp_buf.chunks_mut(BLOCK_LEN) {
            inc_bytes(&mut state.v[BLOCK_LEN - CTR_LEN..]);
            blk.copy_from_slice(&state.v[..]);
            cipher.encrypt_block(Block::from_mut_slice(blk));
        }
        for (i, j) in zip(tmp_buf.iter_mut(), data) {
            *i ^= *j
        }
        state.key.copy_from_slice(&tmp_buf[..key_len]);
        state.v.copy_from_slice(&tmp_buf[seed_len - BLOCK_LEN..seed_len]);
    }
}

impl Mechanism for CtrDrbg {
    const NAME: &'static str = "CTR_DRBG";

    fn choose_algorithm_and_strength(&self, params: &DrbgParams) -> Result<Limits, Error> {
        let requested = params.strength().map(standard_strength).transpose()?;
        let fixed = match params.algorithm() {
            Some(name) => Some(KeySize::from_name(name).ok_or_else(|| {
                Error::invalid(format!("{} not supported in CTR_DRBG", name))
            })?),
            None => None,
        };
        let highest = fixed.map_or(HIGHEST_STRENGTH, KeySize::strength);
        let strength = requested.unwrap_or(DEFAULT_STRENGTH.min(highest));
        let key_size = fixed.unwrap_or_else(|| KeySize::from_strength(strength));
        let seed_len = key_size.key_len() + BLOCK_LEN;

        let (min_length, max_length) = match params.use_df() {
            true => (strength as usize / 8, MAX_INPUT_LEN),
            false => (seed_len, seed_len),
        };
        Ok(Limits {
            algorithm: key_size.name().into(),
            security_strength: strength,
            highest_supported_strength: highest,
            min_length,
            max_length,
            max_personalization_length: max_length,
            max_additional_input_length: max_length,
            max_bytes_per_request: usize::MAX,
            reseed_interval: MAX_RESEED_INTERVAL,
            use_df: params.use_df(),
            supports_reseeding: true,
            supports_prediction_resistance: true,
        })
    }

    fn init_engine(&mut self, limits: &Limits) {
        let key_size = match KeySize::from_name(&limits.algorithm) {
            Some(k) => k,
            None => panic!("CtrDrbg: unknown algorithm {}", limits.algorithm),
        };
        self.key_size = Some(key_size);
        self.use_df = limits.use_df;
        self.state = None;
    }

    fn instantiate_algorithm(
        &mut self,
        entropy: &[u8],
        nonce: &[u8],
        personalization: Option<&[u8]>,
        counter: &ReseedCounter,
    ) -> Result<(), Error> {
        if self.use_df {
            let more = concat(nonce, personalization.unwrap_or(&[]))?;
            self.reseed_algorithm(entropy, Some(more.as_slice()), counter)
        } else {
            // The nonce is not used without the derivation function.
            self.reseed_algorithm(entropy, personalization, counter)
        }
    }

    fn reseed_algorithm(
        &mut self,
        entropy: &[u8],
        additional: Option<&[u8]>,
        counter: &ReseedCounter,
    ) -> Result<(), Error> {
        let seed = if self.use_df {
            let input = match additional {
                Some(add) => concat(entropy, add)?,
                None => Zeroizing::new(entropy.to_vec()),
            };
            self.df(&input)
        } else {
            let mut seed = Zeroizing::new(entropy.to_vec());
            if let Some(add) = additional {
                debug_assert!(add.len() <= seed.len());
                for (i, j) in zip(seed.iter_mut(), add) {
                    *i ^= *j
                }
            }
            seed
        };
        if self.state.is_none() {
            self.state = Some(CtrState::zero(self.key_size().key_len()));
        }
        self.update(&seed);
        counter.reset();
        Ok(())
    }

    fn generate_algorithm(
        &mut self,
        bytes: &mut [u8],
        additional: Option<&[u8]>,
        counter: &ReseedCounter,
    ) -> Result<(), Error> {
        let seed_len = self.seed_len();
        let add = match additional {
            Some(add) => {
                let add = if self.use_df {
                    self.df(add)
                } else {
                    let mut padded = Zeroizing::new(vec![0u8; seed_len]);
                    let n = add.len().min(seed_len);
                    padded[..n].copy_from_slice(&add[..n]);
                    padded
                };
                self.update(&add);
                add
            }
            None => Zeroizing::new(vec![0u8; seed_len]),
        };

        let state = self.state_mut();
        let cipher = Cipher::new(&state.key);
        let mut tmp_blk = Block::default();
        for blk in bytes.chunks_mut(BLOCK_LEN) {
            inc_bytes(&mut state.v[BLOCK_LEN - CTR_LEN..]);
            tmp_blk.copy_from_slice(&state.v[..]);
            cipher.encrypt_block(&mut tmp_blk);
            blk.copy_from_slice(&tmp_blk[..blk.len()]);
        }
        // drop the unused tail of the last block
        tmp_blk.as_mut_slice().zeroize();

        self.update(&add);
        counter.increment();
        Ok(())
    }
}
