//! Public keys, public key tokens and image hashes.

use md5::{Digest, Md5};
use sha1::Sha1;

use crate::{metadata::flags::AssemblyHashAlgorithm, Error, Result};

/// Size of a public key token in bytes
pub const PUBLIC_KEY_TOKEN_SIZE: usize = 8;

/// The strong name part of an assembly identity
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PublicKeyOrToken {
    /// The full public key blob
    PublicKey(Vec<u8>),
    /// The 8 byte public key token, in display order
    Token([u8; PUBLIC_KEY_TOKEN_SIZE]),
}

impl PublicKeyOrToken {
    /// Build from an `Assembly` or `AssemblyRef` blob.
    ///
    /// `is_public_key` selects how the blob is interpreted. An empty blob yields `None`.
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] if a token blob is not exactly 8 bytes long
    pub fn from_blob(data: &[u8], is_public_key: bool) -> Result<Option<PublicKeyOrToken>> {
        if data.is_empty() {
            return Ok(None);
        }

        if is_public_key {
            return Ok(Some(PublicKeyOrToken::PublicKey(data.to_vec())));
        }

        let token: [u8; PUBLIC_KEY_TOKEN_SIZE] = data.try_into().map_err(|_| {
            bad_image_error!(
                "Public key token must be {} bytes, got {}",
                PUBLIC_KEY_TOKEN_SIZE,
                data.len()
            )
        })?;
        Ok(Some(PublicKeyOrToken::Token(token)))
    }

    /// The public key token, computed from the key if necessary
    #[must_use]
    pub fn token(&self) -> [u8; PUBLIC_KEY_TOKEN_SIZE] {
        match self {
            PublicKeyOrToken::PublicKey(key) => public_key_token(key),
            PublicKeyOrToken::Token(token) => *token,
        }
    }

    /// The full public key, `None` if only the token is known
    #[must_use]
    pub fn public_key(&self) -> Option<&[u8]> {
        match self {
            PublicKeyOrToken::PublicKey(key) => Some(key),
            PublicKeyOrToken::Token(_) => None,
        }
    }
}

/// The token of a public key: the last 8 bytes of its SHA-1 hash, in reverse order
#[must_use]
pub fn public_key_token(public_key: &[u8]) -> [u8; PUBLIC_KEY_TOKEN_SIZE] {
    let digest = Sha1::digest(public_key);

    let mut token = [0_u8; PUBLIC_KEY_TOKEN_SIZE];
    for (slot, byte) in token
        .iter_mut()
        .zip(digest[digest.len() - PUBLIC_KEY_TOKEN_SIZE..].iter().rev())
    {
        *slot = *byte;
    }
    token
}

/// Hash `data` with `algorithm`.
///
/// # Errors
/// Returns [`crate::Error::NotSupported`] for algorithms other than MD5 and SHA-1
pub fn compute_hash(data: &[u8], algorithm: AssemblyHashAlgorithm) -> Result<Vec<u8>> {
    match algorithm {
        AssemblyHashAlgorithm::Md5 => Ok(Md5::digest(data).to_vec()),
        AssemblyHashAlgorithm::Sha1 => Ok(Sha1::digest(data).to_vec()),
        other => Err(Error::NotSupported(format!(
            "Hash algorithm 0x{:04x}",
            other.to_u32()
        ))),
    }
}
