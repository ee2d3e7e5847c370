//! SSH algorithm preferences for network-device compatibility.
//!
//! Field-deployed IOS images frequently top out at legacy key exchange and
//! CBC ciphers. The preference orders below keep modern algorithms first
//! while still admitting the legacy tail, so one profile covers both current
//! IOS-XE and decade-old access switches.

use std::borrow::Cow;

use russh::keys::{Algorithm, EcdsaCurve, HashAlg};
use russh::{Preferred, cipher, compression, kex, mac};

/// Key exchange algorithms in order of preference.
pub const KEX_ORDER: &[kex::Name] = &[
    kex::CURVE25519,
    kex::DH_G14_SHA256,
    kex::DH_GEX_SHA256,
    kex::DH_G16_SHA512,
    kex::DH_G14_SHA1,
    kex::DH_GEX_SHA1,
    kex::DH_G1_SHA1,
];

/// Cipher algorithms in order of preference.
///
/// The CBC entries at the tail exist only for IOS trains that never learned
/// CTR or GCM modes.
pub const CIPHERS: &[cipher::Name] = &[
    cipher::AES_256_GCM,
    cipher::CHACHA20_POLY1305,
    cipher::AES_128_CTR,
    cipher::AES_192_CTR,
    cipher::AES_256_CTR,
    cipher::AES_128_CBC,
    cipher::AES_192_CBC,
    cipher::AES_256_CBC,
];

/// MAC algorithms in order of preference.
pub const MAC_ALGORITHMS: &[mac::Name] = &[
    mac::HMAC_SHA256,
    mac::HMAC_SHA512,
    mac::HMAC_SHA256_ETM,
    mac::HMAC_SHA512_ETM,
    mac::HMAC_SHA1,
];

/// Host key algorithms accepted from the device.
pub const KEY_TYPES: &[Algorithm] = &[
    Algorithm::Ed25519,
    Algorithm::Ecdsa {
        curve: EcdsaCurve::NistP256,
    },
    Algorithm::Ecdsa {
        curve: EcdsaCurve::NistP384,
    },
    Algorithm::Rsa {
        hash: Some(HashAlg::Sha256),
    },
    Algorithm::Rsa {
        hash: Some(HashAlg::Sha512),
    },
    Algorithm::Rsa { hash: None },
    Algorithm::Dsa,
];

/// Compression algorithms. Network gear rarely negotiates anything but none.
pub const COMPRESSION_ALGORITHMS: &[compression::Name] =
    &[compression::NONE, compression::ZLIB];

/// The preference set used for every device session.
pub fn device_preferred() -> Preferred {
    Preferred {
        kex: Cow::Borrowed(KEX_ORDER),
        key: Cow::Borrowed(KEY_TYPES),
        cipher: Cow::Borrowed(CIPHERS),
        mac: Cow::Borrowed(MAC_ALGORITHMS),
        compression: Cow::Borrowed(COMPRESSION_ALGORITHMS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modern_algorithms_are_preferred() {
        let preferred = device_preferred();
        assert_eq!(preferred.kex.first(), Some(&kex::CURVE25519));
        assert_eq!(preferred.cipher.first(), Some(&cipher::AES_256_GCM));
    }

    #[test]
    fn legacy_tail_is_still_offered() {
        let preferred = device_preferred();
        assert!(preferred.kex.contains(&kex::DH_G1_SHA1));
        assert!(preferred.cipher.contains(&cipher::AES_128_CBC));
        assert!(preferred.mac.contains(&mac::HMAC_SHA1));
    }

    #[test]
    fn null_algorithms_are_never_offered() {
        let preferred = device_preferred();
        assert!(preferred.kex.iter().all(|alg| *alg != kex::NONE));
        assert!(preferred.cipher.iter().all(|alg| *alg != cipher::NONE));
        assert!(preferred.cipher.iter().all(|alg| *alg != cipher::CLEAR));
        assert!(preferred.mac.iter().all(|alg| *alg != mac::NONE));
    }
}
