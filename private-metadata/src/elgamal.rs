//! Twisted ElGamal over the Ristretto group
//!
//! The secret key is never stored: it is re-derived from a wallet signature
//! over a fixed message, so the same wallet always recovers the same keypair.
//!
//! Scheme (Pedersen-commitment form):
//! - H = hash-to-group(compressed G), independent of G
//! - secret s, public P = s⁻¹·H
//! - Enc(x; r) = (C, D) = (x·G + r·H, r·P)
//! - Dec: C - s·D = x·G, then a bounded discrete log recovers x

use std::fmt;
use std::sync::OnceLock;

use curve25519_dalek::{
    constants::{RISTRETTO_BASEPOINT_COMPRESSED, RISTRETTO_BASEPOINT_POINT},
    ristretto::{CompressedRistretto, RistrettoPoint},
    scalar::Scalar,
};
use rand::RngCore;
use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::error::ErrorKind;

/// Length of the wallet signature the keypair is derived from (ed25519)
pub const SIGNATURE_LEN: usize = 64;

/// Byte length of a compressed ElGamal public key
pub const ELGAMAL_PUBKEY_LEN: usize = 32;

/// Byte length of an ElGamal ciphertext (commitment + decrypt handle)
pub const ELGAMAL_CIPHERTEXT_LEN: usize = 64;

/// Domain separator for signature-to-scalar derivation
const DOMAIN_SEPARATOR: &[u8] = b"private_metadata_elgamal_v1";

/// The Pedersen blinding generator H
pub fn pedersen_h() -> &'static RistrettoPoint {
    static H: OnceLock<RistrettoPoint> = OnceLock::new();
    H.get_or_init(|| {
        let mut wide = [0u8; 64];
        wide.copy_from_slice(&Sha512::digest(RISTRETTO_BASEPOINT_COMPRESSED.as_bytes()));
        RistrettoPoint::from_uniform_bytes(&wide)
    })
}

// ============================================================================
// Keys
// ============================================================================

/// ElGamal secret scalar, zeroized on drop
pub struct ElGamalSecretKey {
    bytes: [u8; 32],
}

impl ElGamalSecretKey {
    fn from_scalar(scalar: &Scalar) -> Self {
        Self { bytes: scalar.to_bytes() }
    }

    pub(crate) fn to_scalar(&self) -> Scalar {
        Scalar::from_bytes_mod_order(self.bytes)
    }
}

impl Drop for ElGamalSecretKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl fmt::Debug for ElGamalSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ElGamalSecretKey(<redacted>)")
    }
}

/// ElGamal public key P = s⁻¹·H
#[derive(Clone, Copy)]
pub struct ElGamalPubkey {
    point: RistrettoPoint,
    compressed: CompressedRistretto,
}

impl ElGamalPubkey {
    fn from_point(point: RistrettoPoint) -> Self {
        Self { point, compressed: point.compress() }
    }

    /// Parse a compressed public key, rejecting non-canonical encodings
    pub fn from_bytes(bytes: &[u8; ELGAMAL_PUBKEY_LEN]) -> Option<Self> {
        let compressed = CompressedRistretto(*bytes);
        let point = compressed.decompress()?;
        Some(Self { point, compressed })
    }

    pub fn to_bytes(&self) -> [u8; ELGAMAL_PUBKEY_LEN] {
        self.compressed.to_bytes()
    }

    pub(crate) fn point(&self) -> &RistrettoPoint {
        &self.point
    }
}

impl PartialEq for ElGamalPubkey {
    fn eq(&self, other: &Self) -> bool {
        bool::from(self.compressed.as_bytes().ct_eq(other.compressed.as_bytes()))
    }
}

impl Eq for ElGamalPubkey {}

impl fmt::Debug for ElGamalPubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElGamalPubkey({:02x?})", self.compressed.as_bytes())
    }
}

/// A keypair owned by exactly one recovery run
///
/// Clone is NOT derived so the secret is never duplicated by accident.
pub struct ElGamalKeypair {
    secret: ElGamalSecretKey,
    pubkey: ElGamalPubkey,
}

impl ElGamalKeypair {
    /// Build from a non-zero secret scalar
    fn from_scalar(scalar: &Scalar) -> Self {
        let pubkey = ElGamalPubkey::from_point(&scalar.invert() * pedersen_h());
        Self {
            secret: ElGamalSecretKey::from_scalar(scalar),
            pubkey,
        }
    }

    /// Generate a random keypair (fixtures and tests; production keys come
    /// from [`derive_keypair`])
    pub fn new_rand() -> Self {
        let mut rng = rand::rngs::OsRng;
        loop {
            let scalar = random_scalar(&mut rng);
            if scalar != Scalar::zero() {
                return Self::from_scalar(&scalar);
            }
        }
    }

    pub fn pubkey(&self) -> &ElGamalPubkey {
        &self.pubkey
    }

    pub(crate) fn secret(&self) -> &ElGamalSecretKey {
        &self.secret
    }
}

impl fmt::Debug for ElGamalKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElGamalKeypair")
            .field("pubkey", &self.pubkey)
            .finish_non_exhaustive()
    }
}

/// Derive the ElGamal keypair bound to a wallet signature
///
/// s = SHA512(domain || signature) reduced mod l, P = s⁻¹·H.
/// The same signature bytes always produce the same keypair.
pub fn derive_keypair(signature: &[u8]) -> Result<ElGamalKeypair, ErrorKind> {
    if signature.len() != SIGNATURE_LEN {
        return Err(ErrorKind::InvalidSignatureLength {
            expected: SIGNATURE_LEN,
            actual: signature.len(),
        });
    }

    let scalar = hash_signature_to_scalar(signature);
    Ok(ElGamalKeypair::from_scalar(&scalar))
}

/// Hash to a non-zero scalar; a zero result is re-hashed with a counter
fn hash_signature_to_scalar(signature: &[u8]) -> Scalar {
    let mut counter: u8 = 0;
    loop {
        let mut hasher = Sha512::new();
        hasher.update(DOMAIN_SEPARATOR);
        hasher.update(signature);
        if counter > 0 {
            hasher.update([counter]);
        }

        let mut wide = [0u8; 64];
        wide.copy_from_slice(&hasher.finalize());
        let scalar = Scalar::from_bytes_mod_order_wide(&wide);
        wide.zeroize();

        if scalar != Scalar::zero() {
            return scalar;
        }
        counter = counter.wrapping_add(1);
    }
}

fn random_scalar<R: RngCore>(rng: &mut R) -> Scalar {
    let mut bytes = [0u8; 64];
    rng.fill_bytes(&mut bytes);
    let scalar = Scalar::from_bytes_mod_order_wide(&bytes);
    bytes.zeroize();
    scalar
}

// ============================================================================
// Ciphertexts
// ============================================================================

/// Twisted ElGamal ciphertext of a u32
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ElGamalCiphertext {
    commitment: RistrettoPoint,
    handle: RistrettoPoint,
}

impl ElGamalCiphertext {
    /// Parse `commitment || handle`; None if either half is not a canonical point
    pub fn from_bytes(bytes: &[u8; ELGAMAL_CIPHERTEXT_LEN]) -> Option<Self> {
        let commitment = CompressedRistretto::from_slice(&bytes[..32]).decompress()?;
        let handle = CompressedRistretto::from_slice(&bytes[32..]).decompress()?;
        Some(Self { commitment, handle })
    }

    pub fn to_bytes(&self) -> [u8; ELGAMAL_CIPHERTEXT_LEN] {
        let mut bytes = [0u8; ELGAMAL_CIPHERTEXT_LEN];
        bytes[..32].copy_from_slice(self.commitment.compress().as_bytes());
        bytes[32..].copy_from_slice(self.handle.compress().as_bytes());
        bytes
    }

    /// C - s·D, the plaintext lifted into the group as x·G
    pub(crate) fn decrypt_to_point(&self, secret: &ElGamalSecretKey) -> RistrettoPoint {
        let mut s = secret.to_scalar();
        let point = &self.commitment - &(&s * &self.handle);
        s.zeroize();
        point
    }
}

/// Encrypt a u32 under `pubkey` with fresh randomness
pub fn encrypt_u32(pubkey: &ElGamalPubkey, value: u32) -> ElGamalCiphertext {
    let mut rng = rand::rngs::OsRng;
    let mut opening = random_scalar(&mut rng);

    let g = RISTRETTO_BASEPOINT_POINT;
    let commitment = &(&Scalar::from(value) * &g) + &(&opening * pedersen_h());
    let handle = &opening * pubkey.point();
    opening.zeroize();

    ElGamalCiphertext { commitment, handle }
}
