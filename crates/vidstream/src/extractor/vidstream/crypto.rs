//! AES-CBC codec used by the encrypt-ajax handshake.
//!
//! Keys and IVs are the literal byte values of the strings scraped from the
//! page or supplied by configuration; they are never hex- or base64-decoded.
//! Ciphertext crosses the boundary as standard base64 text.

use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use base64::{Engine, prelude::BASE64_STANDARD};

use crate::extractor::error::ExtractorError;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes192CbcEnc = cbc::Encryptor<aes::Aes192>;
type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type Aes192CbcDec = cbc::Decryptor<aes::Aes192>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

fn invalid_params(e: aes::cipher::InvalidLength) -> ExtractorError {
    ExtractorError::CryptoError(format!("invalid key/iv length: {e}"))
}

/// Encrypts `plaintext` with AES-CBC/PKCS#7 and returns base64 text.
///
/// The key must be 16, 24 or 32 bytes and the IV 16 bytes.
pub fn encrypt_aes(plaintext: &[u8], iv: &[u8], key: &[u8]) -> Result<String, ExtractorError> {
    let ciphertext = match key.len() {
        16 => Aes128CbcEnc::new_from_slices(key, iv)
            .map_err(invalid_params)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        24 => Aes192CbcEnc::new_from_slices(key, iv)
            .map_err(invalid_params)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        32 => Aes256CbcEnc::new_from_slices(key, iv)
            .map_err(invalid_params)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        n => {
            return Err(ExtractorError::CryptoError(format!(
                "unsupported key length {n}, expected 16/24/32 bytes"
            )));
        }
    };
    Ok(BASE64_STANDARD.encode(ciphertext))
}

/// Decrypts base64 ciphertext and returns the UTF-8 plaintext.
///
/// Fails on malformed base64, a wrong key/iv (padding validation) or
/// non-UTF-8 plaintext.
pub fn decrypt_aes(ciphertext_b64: &str, iv: &[u8], key: &[u8]) -> Result<String, ExtractorError> {
    let ciphertext = BASE64_STANDARD
        .decode(ciphertext_b64.trim())
        .map_err(|e| ExtractorError::CryptoError(format!("invalid base64 ciphertext: {e}")))?;

    let padding_failed =
        |_| ExtractorError::CryptoError("padding validation failed on decrypt".to_string());

    let plaintext = match key.len() {
        16 => Aes128CbcDec::new_from_slices(key, iv)
            .map_err(invalid_params)?
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
            .map_err(padding_failed)?,
        24 => Aes192CbcDec::new_from_slices(key, iv)
            .map_err(invalid_params)?
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
            .map_err(padding_failed)?,
        32 => Aes256CbcDec::new_from_slices(key, iv)
            .map_err(invalid_params)?
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
            .map_err(padding_failed)?,
        n => {
            return Err(ExtractorError::CryptoError(format!(
                "unsupported key length {n}, expected 16/24/32 bytes"
            )));
        }
    };

    String::from_utf8(plaintext)
        .map_err(|_| ExtractorError::CryptoError("decrypted payload is not utf-8".to_string()))
}
