//! Per-target key derivation.
//!
//! A single token yields one key seed, but every asset inside a resource is
//! encrypted under its own key: HMAC-SHA256 keyed by the seed over the
//! asset's file name. Distinct names under the same token therefore yield
//! independent keys.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Length of a derived cipher key.
pub const DERIVED_KEY_LEN: usize = 32;

/// Canonical name of the primary container asset, used when no explicit
/// target name is given.
pub const PRIMARY_ASSET_NAME: &str = "resource.rpf";

/// Derive the cipher key for a target asset.
///
/// `target` defaults to [`PRIMARY_ASSET_NAME`].
pub fn derive_key(key_seed: &[u8], target: Option<&str>) -> [u8; DERIVED_KEY_LEN] {
    let name = target.unwrap_or(PRIMARY_ASSET_NAME);

    // HMAC accepts keys of any length.
    #[allow(clippy::unwrap_used)]
    let mut mac = HmacSha256::new_from_slice(key_seed).unwrap();
    mac.update(name.as_bytes());

    mac.finalize().into_bytes().into()
}
