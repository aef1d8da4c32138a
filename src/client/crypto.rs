//! Crypto helpers of the native library.
//!
//! [`PrivmxCrypto`] does not need a connection: it wraps the native
//! [`CryptoApi`], created on first use and shared by every clone. Get one
//! from [`EndpointContext::crypto`](crate::EndpointContext::crypto).
//!
//! | Operation | Input | Output |
//! |-----------|-------|--------|
//! | [`sign_data`](PrivmxCrypto::sign_data) | data, WIF private key | signature |
//! | [`verify_signature`](PrivmxCrypto::verify_signature) | data, signature, BASE58DER public key | `bool` |
//! | [`encrypt_data_symmetric`](PrivmxCrypto::encrypt_data_symmetric) | data, key | ciphertext |
//! | [`decrypt_data_symmetric`](PrivmxCrypto::decrypt_data_symmetric) | ciphertext, key | data |
//! | [`generate_private_key`](PrivmxCrypto::generate_private_key) | optional seed | WIF key |
//! | [`derive_private_key`](PrivmxCrypto::derive_private_key) | password, salt | WIF key |
//! | [`derive_public_key`](PrivmxCrypto::derive_public_key) | WIF key | BASE58DER key |
//! | [`generate_key_symmetric`](PrivmxCrypto::generate_key_symmetric) | - | key |
//! | [`derive_key_symmetric`](PrivmxCrypto::derive_key_symmetric) | password, salt | key |
//! | [`convert_pem_key_to_wif_key`](PrivmxCrypto::convert_pem_key_to_wif_key) | PEM key | WIF key |
//!
//! ```ignore
//! let crypto = context.crypto();
//! let private_key = crypto.generate_private_key(None).await?;
//! let public_key = crypto.derive_public_key(&private_key).await?;
//! let signature = crypto.sign_data(b"hello", &private_key).await?;
//! assert!(crypto.verify_signature(b"hello", &signature, &public_key).await?);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::debug;

use crate::error::Result;
use crate::transport::native::{CryptoApi, EndpointFactory};

// ============================================================================
// Types
// ============================================================================

struct CryptoInner {
    factory: Arc<dyn EndpointFactory>,
    api: OnceCell<Arc<dyn CryptoApi>>,
}

// ============================================================================
// PrivmxCrypto
// ============================================================================

/// Lazily created handle to the native crypto API.
///
/// Cheap to clone; clones share the API.
#[derive(Clone)]
pub struct PrivmxCrypto {
    inner: Arc<CryptoInner>,
}

impl fmt::Debug for PrivmxCrypto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivmxCrypto")
            .field("initialized", &self.inner.api.initialized())
            .finish_non_exhaustive()
    }
}

impl PrivmxCrypto {
    /// Creates a wrapper; the native API is created on first call.
    #[must_use]
    pub fn new(factory: Arc<dyn EndpointFactory>) -> Self {
        Self {
            inner: Arc::new(CryptoInner {
                factory,
                api: OnceCell::new(),
            }),
        }
    }

    /// Returns the native crypto API, creating it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Endpoint`](crate::Error::Endpoint) if the native
    /// library fails to create it; the next call retries.
    pub async fn api(&self) -> Result<Arc<dyn CryptoApi>> {
        let api = self
            .inner
            .api
            .get_or_try_init(|| async {
                debug!("Creating Crypto API");
                self.inner.factory.create_crypto_api().await
            })
            .await?;
        Ok(Arc::clone(api))
    }
}

// ============================================================================
// PrivmxCrypto - Keys
// ============================================================================

impl PrivmxCrypto {
    /// Generates a new ECC private key in WIF format.
    ///
    /// `random_seed`, if given, is the base the key is generated from.
    pub async fn generate_private_key(&self, random_seed: Option<&str>) -> Result<String> {
        self.api().await?.generate_private_key(random_seed).await
    }

    /// Derives an ECC private key from `password` and `salt` using PBKDF2.
    pub async fn derive_private_key(&self, password: &str, salt: &str) -> Result<String> {
        self.api().await?.derive_private_key(password, salt).await
    }

    /// Returns the BASE58DER public key paired with a WIF private key.
    pub async fn derive_public_key(&self, private_key: &str) -> Result<String> {
        self.api().await?.derive_public_key(private_key).await
    }

    /// Generates a new symmetric key.
    pub async fn generate_key_symmetric(&self) -> Result<Vec<u8>> {
        self.api().await?.generate_key_symmetric().await
    }

    /// Derives a symmetric key from `password` and `salt`.
    pub async fn derive_key_symmetric(&self, password: &str, salt: &str) -> Result<Vec<u8>> {
        self.api().await?.derive_key_symmetric(password, salt).await
    }

    /// Converts a PEM private key to WIF.
    pub async fn convert_pem_key_to_wif_key(&self, pem_key: &str) -> Result<String> {
        self.api().await?.convert_pem_key_to_wif_key(pem_key).await
    }
}

// ============================================================================
// PrivmxCrypto - Data
// ============================================================================

impl PrivmxCrypto {
    /// Signs `data` with a WIF private key.
    pub async fn sign_data(&self, data: &[u8], private_key: &str) -> Result<Vec<u8>> {
        self.api().await?.sign_data(data, private_key).await
    }

    /// Checks `signature` over `data` against a BASE58DER public key.
    pub async fn verify_signature(
        &self,
        data: &[u8],
        signature: &[u8],
        public_key: &str,
    ) -> Result<bool> {
        self.api()
            .await?
            .verify_signature(data, signature, public_key)
            .await
    }

    /// Encrypts `data` with AES under `key`.
    pub async fn encrypt_data_symmetric(&self, data: &[u8], key: &[u8]) -> Result<Vec<u8>> {
        self.api().await?.encrypt_data_symmetric(data, key).await
    }

    /// Decrypts `data` with AES under `key`.
    pub async fn decrypt_data_symmetric(&self, data: &[u8], key: &[u8]) -> Result<Vec<u8>> {
        self.api().await?.decrypt_data_symmetric(data, key).await
    }
}

// ============================================================================
// Tests
// ============================================================================
