//! SHA-256 + base36 store identifiers.
//!
//! A store id names one resolved package on one platform. It is derived
//! only from the pin and the package coordinates, so re-resolving with an
//! unchanged manifest reproduces every id exactly.

use cpshell_config::{Platform, Upstream};
use num_bigint::BigUint;
use num_traits::Zero;
use sha2::{Digest, Sha256};

use crate::resolve::PackageKind;

/// Length of a store id in base36 digits.
pub const STORE_ID_LEN: usize = 32;

/// Base36 alphabet (0-9, a-z).
const BASE36_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Separator byte written between fields.
const SEP: u8 = 0;

/// Converts a byte slice to a base36 string of exactly `length` digits.
///
/// Shorter encodings are zero-padded on the left; longer ones keep the least
/// significant digits.
pub fn encode_base36(data: &[u8], length: usize) -> String {
    let mut num = BigUint::from_bytes_be(data);
    let base = BigUint::from(36u32);

    // Least-significant digit first.
    let mut digits: Vec<char> = Vec::with_capacity(length);
    while !num.is_zero() {
        let rem = &num % &base;
        num /= &base;
        let i = rem.to_u32_digits().first().copied().unwrap_or(0) as usize;
        digits.push(BASE36_ALPHABET[i] as char);
    }
    digits.truncate(length);
    while digits.len() < length {
        digits.push('0');
    }

    digits.into_iter().rev().collect()
}

/// Computes the store id for one package of a resolution.
pub fn store_id(
    upstream: &Upstream,
    platform: &Platform,
    kind: PackageKind,
    name: &str,
    version: &str,
) -> String {
    let mut h = Sha256::new();
    write_str(&mut h, &upstream.name);
    write_str(&mut h, &upstream.revision);
    write_str(&mut h, platform.as_str());
    write_str(&mut h, kind.as_str());
    write_str(&mut h, name);
    write_str(&mut h, version);
    encode_base36(&h.finalize(), STORE_ID_LEN)
}

fn write_str(h: &mut Sha256, s: &str) {
    h.update(s.as_bytes());
    h.update([SEP]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn linux() -> Platform {
        "x86_64-linux".parse().unwrap()
    }

    #[test]
    fn encode_base36_zero_pads() {
        assert_eq!(encode_base36(&[], 4), "0000");
        assert_eq!(encode_base36(&[35], 3), "00z");
        assert_eq!(encode_base36(&[36], 3), "010");
    }

    #[test]
    fn encode_base36_truncates_to_low_digits() {
        // 0xFFFF = 65535 = "1ekf" in base36.
        assert_eq!(encode_base36(&[0xFF, 0xFF], 4), "1ekf");
        assert_eq!(encode_base36(&[0xFF, 0xFF], 3), "ekf");
    }

    #[test]
    fn store_id_is_deterministic() {
        let up = Upstream::default();
        let a = store_id(&up, &linux(), PackageKind::Library, "requests", "2.32");
        let b = store_id(&up, &linux(), PackageKind::Library, "requests", "2.32");
        assert_eq!(a, b);
        assert_eq!(a.len(), STORE_ID_LEN);
        assert!(a.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn store_id_depends_on_every_coordinate() {
        let up = Upstream::default();
        let base = store_id(&up, &linux(), PackageKind::Library, "requests", "2.32");

        let mut other_rev = up.clone();
        other_rev.revision = "nixos-25.05".to_string();
        assert_ne!(
            base,
            store_id(&other_rev, &linux(), PackageKind::Library, "requests", "2.32")
        );

        let darwin: Platform = "aarch64-darwin".parse().unwrap();
        assert_ne!(
            base,
            store_id(&up, &darwin, PackageKind::Library, "requests", "2.32")
        );
        assert_ne!(
            base,
            store_id(&up, &linux(), PackageKind::Wrapper, "requests", "2.32")
        );
        assert_ne!(
            base,
            store_id(&up, &linux(), PackageKind::Library, "requests", "2.31")
        );
    }

    #[test]
    fn separator_prevents_field_bleed() {
        let up = Upstream::default();
        let a = store_id(&up, &linux(), PackageKind::Library, "ab", "c");
        let b = store_id(&up, &linux(), PackageKind::Library, "a", "bc");
        assert_ne!(a, b);
    }
}
