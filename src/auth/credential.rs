//! Password credentials: scrypt with a per-user random salt.
//!
//! The salt is stored hex-encoded and its hex text is what feeds the KDF, so
//! `(hash, salt)` pairs stay verifiable by any scrypt implementation using
//! N=2^14, r=8, p=1 and a 64-byte output.

use rand::rngs::OsRng;
use rand::RngCore;
use subtle::ConstantTimeEq;

use crate::error::CredentialError;

pub const SALT_LEN: usize = 16;
pub const KEY_LEN: usize = 64;

const SCRYPT_LOG_N: u8 = 14;
const SCRYPT_R: u32 = 8;
const SCRYPT_P: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub hash: String,
    pub salt: String,
}

fn scrypt_params() -> Result<scrypt::Params, CredentialError> {
    scrypt::Params::new(SCRYPT_LOG_N, SCRYPT_R, SCRYPT_P, KEY_LEN)
        .map_err(|e| CredentialError::Derivation(e.to_string()))
}

fn derive_key(plaintext: &str, salt: &str) -> Result<[u8; KEY_LEN], CredentialError> {
    let mut key = [0u8; KEY_LEN];
    scrypt::scrypt(plaintext.as_bytes(), salt.as_bytes(), &scrypt_params()?, &mut key)
        .map_err(|e| CredentialError::Derivation(e.to_string()))?;
    Ok(key)
}

pub fn generate_salt() -> Result<String, CredentialError> {
    let mut salt = [0u8; SALT_LEN];
    OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| CredentialError::Entropy(e.to_string()))?;
    Ok(hex::encode(salt))
}

/// Hashes `plaintext`. A fresh salt is generated unless one is supplied.
pub fn derive_credential(plaintext: &str, salt: Option<&str>) -> Result<Credential, CredentialError> {
    let salt = match salt {
        Some(salt) => salt.to_string(),
        None => generate_salt()?,
    };
    let key = derive_key(plaintext, &salt)?;

    Ok(Credential {
        hash: hex::encode(key),
        salt,
    })
}

/// Checks `plaintext` against a stored hash. Any malformed input is a mismatch, never an error.
pub fn verify_credential(plaintext: &str, hash: &str, salt: &str) -> bool {
    let expected = match hex::decode(hash) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    if expected.len() != KEY_LEN {
        return false;
    }
    match derive_key(plaintext, salt) {
        Ok(derived) => derived[..].ct_eq(&expected[..]).into(),
        Err(_) => false,
    }
}
