//! OpenSSL-compatible decryption of the encrypted statistics artifact.
//!
//! The artifact is `openssl enc -aes-256-cbc -salt -a` output, gzip-compressed:
//!
//! ```text
//! gzip( base64( "Salted__" || salt[8] || AES-256-CBC(key, iv, pkcs7(plaintext)) ) )
//! ```
//!
//! Key and IV come from OpenSSL's legacy `EVP_BytesToKey` with MD5 and a single
//! iteration. Every failure is reported as a [`DecryptError`]; callers treat all
//! of them the same way and simply omit the dependent metric.

use aes::cipher::block_padding::{NoPadding, Pkcs7};
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::read::GzDecoder;
use md5::{Digest, Md5};
use std::io::Read;
use thiserror::Error;

type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;
type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;

/// Container magic written by `openssl enc` when a salt is used.
pub const MAGIC: &[u8; 8] = b"Salted__";

/// Cipher block size in bytes.
pub const BLOCK_SIZE: usize = 16;

const SALT_LEN: usize = 8;
const KEY_LEN: usize = 32;
const IV_LEN: usize = 16;
const HEADER_LEN: usize = MAGIC.len() + SALT_LEN;

/// Upper bound for the decompressed statistics text.
pub const DEFAULT_STATS_LIMIT: u64 = 256 * 1024 * 1024;

/// Decryption failures.
#[derive(Debug, Error)]
pub enum DecryptError {
    #[error("gzip decompression failed: {0}")]
    Gzip(#[source] std::io::Error),

    #[error("decompressed payload exceeds {0} bytes")]
    TooLarge(u64),

    #[error("base64 decoding failed: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("not a recognized salted container")]
    NotRecognized,

    #[error("ciphertext length {0} is not a positive multiple of the block size")]
    Length(usize),

    #[error("invalid PKCS#7 padding")]
    Padding,

    #[error("decrypted payload is not text")]
    NotText,
}

/// Derive the AES-256 key and CBC IV from a passphrase and salt.
///
/// `D_i = MD5(D_{i-1} || passphrase || salt)`, concatenated until 48 bytes are
/// available; the first 32 form the key, the next 16 the IV.
pub fn derive_key_iv(passphrase: &[u8], salt: &[u8]) -> ([u8; KEY_LEN], [u8; IV_LEN]) {
    let mut material = Vec::with_capacity(KEY_LEN + IV_LEN + 16);
    let mut previous: Vec<u8> = Vec::new();

    while material.len() < KEY_LEN + IV_LEN {
        let mut hasher = Md5::new();
        hasher.update(&previous);
        hasher.update(passphrase);
        hasher.update(salt);
        previous = hasher.finalize().to_vec();
        material.extend_from_slice(&previous);
    }

    let mut key = [0u8; KEY_LEN];
    let mut iv = [0u8; IV_LEN];
    key.copy_from_slice(&material[..KEY_LEN]);
    iv.copy_from_slice(&material[KEY_LEN..KEY_LEN + IV_LEN]);
    (key, iv)
}

/// Decrypt a salted container and return its text.
pub fn decrypt(container: &[u8], passphrase: &[u8]) -> Result<String, DecryptError> {
    if !container.starts_with(MAGIC) {
        return Err(DecryptError::NotRecognized);
    }
    if container.len() < HEADER_LEN {
        return Err(DecryptError::Length(0));
    }

    let salt = &container[MAGIC.len()..HEADER_LEN];
    let body = &container[HEADER_LEN..];
    if body.is_empty() || body.len() % BLOCK_SIZE != 0 {
        return Err(DecryptError::Length(body.len()));
    }

    let (key, iv) = derive_key_iv(passphrase, salt);
    let mut buf = body.to_vec();
    let plain_len = Aes256CbcDec::new(&key.into(), &iv.into())
        .decrypt_padded_mut::<NoPadding>(&mut buf)
        .map_err(|_| DecryptError::Length(body.len()))?
        .len();
    buf.truncate(plain_len);

    let unpadded = strip_pkcs7(&buf)?;
    buf.truncate(unpadded);

    String::from_utf8(buf).map_err(|_| DecryptError::NotText)
}

/// Validate PKCS#7 padding and return the unpadded length.
fn strip_pkcs7(plain: &[u8]) -> Result<usize, DecryptError> {
    let pad = *plain.last().ok_or(DecryptError::Padding)? as usize;
    if pad == 0 || pad > BLOCK_SIZE || pad > plain.len() {
        return Err(DecryptError::Padding);
    }
    let start = plain.len() - pad;
    if plain[start..].iter().any(|&b| b as usize != pad) {
        return Err(DecryptError::Padding);
    }
    Ok(start)
}

/// Raw key file bytes without surrounding ASCII whitespace.
fn trim_passphrase(raw: &[u8]) -> &[u8] {
    let start = raw.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(raw.len());
    let end = raw.iter().rposition(|b| !b.is_ascii_whitespace()).map_or(start, |i| i + 1);
    &raw[start..end]
}

/// Unwrap a `stats.txt.openssl.gz` payload: gunzip, base64-decode, decrypt.
///
/// `passphrase` is the raw key file content and need not be UTF-8.
pub fn open_stats_artifact(
    compressed: &[u8],
    passphrase: &[u8],
    limit: u64,
) -> Result<String, DecryptError> {
    let mut armored = Vec::new();
    GzDecoder::new(compressed)
        .take(limit.saturating_add(1))
        .read_to_end(&mut armored)
        .map_err(DecryptError::Gzip)?;
    if armored.len() as u64 > limit {
        return Err(DecryptError::TooLarge(limit));
    }

    armored.retain(|b| !b.is_ascii_whitespace());
    let container = STANDARD.decode(&armored)?;

    decrypt(&container, trim_passphrase(passphrase))
}

/// Encrypt `plaintext` into a salted container, as `openssl enc -aes-256-cbc -S <salt>` would.
///
/// The inverse of [`decrypt`]; used to build statistics fixtures.
pub fn seal(plaintext: &[u8], passphrase: &[u8], salt: [u8; SALT_LEN]) -> Vec<u8> {
    let (key, iv) = derive_key_iv(passphrase, &salt);
    let ciphertext =
        Aes256CbcEnc::new(&key.into(), &iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut container = Vec::with_capacity(HEADER_LEN + ciphertext.len());
    container.extend_from_slice(MAGIC);
    container.extend_from_slice(&salt);
    container.extend_from_slice(&ciphertext);
    container
}
