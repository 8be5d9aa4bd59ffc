//! MikroDB - Envelope Encryption
//! Optional whole-file AES-256-GCM encryption for table files.
//!
//! ## On-disk layout
//! ```text
//! version:  1 byte  (1)
//! iv_len:   1 byte  (12)
//! iv:       12 bytes
//! tag_len:  1 byte  (16)
//! tag:      16 bytes
//! ciphertext: remaining bytes
//! ```
//! The ciphertext is the complete plaintext table image, MDB header included.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::RngCore;
use scrypt::Params;

use crate::error::{Error, Result};

/// Fixed scrypt salt. Hard-coded so the key is deterministic from the
/// password alone; a known weakness of the on-disk format, preserved here
/// for compatibility.
const SALT: &str = "salt";

const ENVELOPE_VERSION: u8 = 1;
const IV_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// First byte of an encrypted file. Plaintext MDB files start with `'M'`
/// (0x4D), so this byte alone distinguishes the two on load.
pub const ENVELOPE_MARKER: u8 = ENVELOPE_VERSION;

/// Returns true if `bytes` looks like an encrypted envelope (its first byte
/// is the envelope version marker). Used for load-time format detection;
/// supports mixed fleets and unencrypted upgrades.
pub fn looks_encrypted(bytes: &[u8]) -> bool {
    bytes.first() == Some(&ENVELOPE_MARKER)
}

fn derive_key(password: &str) -> Result<[u8; 32]> {
    let password_input = format!("{SALT}#{password}");
    let params = Params::new(14, 8, 1, 32)
        .map_err(|e| Error::CryptoFailure(format!("invalid scrypt params: {e}")))?;
    let mut key = [0u8; 32];
    scrypt::scrypt(password_input.as_bytes(), SALT.as_bytes(), &params, &mut key)
        .map_err(|e| Error::CryptoFailure(format!("key derivation failed: {e}")))?;
    Ok(key)
}

/// Encrypt a full plaintext table image under `password`, with a fresh
/// random 96-bit IV.
pub fn encrypt(plaintext: &[u8], password: &str) -> Result<Vec<u8>> {
    let key_bytes = derive_key(password)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));

    let mut iv = [0u8; IV_LEN];
    rand::thread_rng().fill_bytes(&mut iv);
    let nonce = Nonce::from_slice(&iv);

    let ciphertext_with_tag = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| Error::CryptoFailure("AES-GCM encryption failed".to_string()))?;

    let split_at = ciphertext_with_tag.len().saturating_sub(TAG_LEN);
    let (ciphertext, tag) = ciphertext_with_tag.split_at(split_at);

    let mut out = Vec::with_capacity(4 + IV_LEN + TAG_LEN + ciphertext.len());
    out.push(ENVELOPE_VERSION);
    out.push(IV_LEN as u8);
    out.extend_from_slice(&iv);
    out.push(TAG_LEN as u8);
    out.extend_from_slice(tag);
    out.extend_from_slice(ciphertext);
    Ok(out)
}

/// Decrypt an envelope produced by [`encrypt`]. Authentication-tag failure
/// (bad key, tampered ciphertext) surfaces as [`Error::CryptoFailure`]; the
/// caller is expected to log it and fall back to treating the file as
/// plaintext/empty.
pub fn decrypt(envelope: &[u8], password: &str) -> Result<Vec<u8>> {
    let mut cursor = 0usize;
    let version = *envelope
        .first()
        .ok_or_else(|| Error::CryptoFailure("empty envelope".to_string()))?;
    if version != ENVELOPE_VERSION {
        return Err(Error::CryptoFailure(format!(
            "unsupported envelope version {version}"
        )));
    }
    cursor += 1;

    let iv_len = *envelope
        .get(cursor)
        .ok_or_else(|| Error::CryptoFailure("truncated envelope (iv_len)".to_string()))?
        as usize;
    cursor += 1;
    let iv = envelope
        .get(cursor..cursor + iv_len)
        .ok_or_else(|| Error::CryptoFailure("truncated envelope (iv)".to_string()))?;
    cursor += iv_len;

    let tag_len = *envelope
        .get(cursor)
        .ok_or_else(|| Error::CryptoFailure("truncated envelope (tag_len)".to_string()))?
        as usize;
    cursor += 1;
    let tag = envelope
        .get(cursor..cursor + tag_len)
        .ok_or_else(|| Error::CryptoFailure("truncated envelope (tag)".to_string()))?;
    cursor += tag_len;

    let ciphertext = &envelope[cursor..];

    let key_bytes = derive_key(password)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));
    let nonce = Nonce::from_slice(iv);

    let mut combined = Vec::with_capacity(ciphertext.len() + tag.len());
    combined.extend_from_slice(ciphertext);
    combined.extend_from_slice(tag);

    cipher
        .decrypt(nonce, combined.as_ref())
        .map_err(|_| Error::CryptoFailure("authentication tag mismatch".to_string()))
}
