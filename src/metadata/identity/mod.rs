//! Assembly identity.
//!
//! - [`assembly`] - names, versions and display name parsing
//! - [`cryptographic`] - public keys, public key tokens and image hashes
//!
//! # Reference
//! - ECMA-335 II.6.2.1.3 and II.22.2

pub mod assembly;
pub mod cryptographic;

pub use assembly::{AssemblyIdentity, AssemblyVersion, ProcessorArchitecture};
pub use cryptographic::{compute_hash, public_key_token, PublicKeyOrToken, PUBLIC_KEY_TOKEN_SIZE};
