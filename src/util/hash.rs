//! Hash helpers shared by the registry, objects and values
//!
//! All hashes here are deterministic across runs; nothing is seeded.

/// 64-bit finaliser (MurmurHash3 `fmix64`).
///
/// Every input bit affects every output bit, so small integer keys and
/// float bit patterns spread evenly over buckets.
#[inline]
pub fn mix64(mut x: u64) -> u64 {
    x ^= x >> 33;
    x = x.wrapping_mul(0xff51_afd7_ed55_8ccd);
    x ^= x >> 33;
    x = x.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    x ^= x >> 33;
    x
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Hash a byte string (FNV-1a, then mixed).
pub fn hash_bytes(bytes: &[u8]) -> u64 {
    let mut h = FNV_OFFSET;
    for &b in bytes {
        h ^= u64::from(b);
        h = h.wrapping_mul(FNV_PRIME);
    }
    mix64(h)
}

/// Hash a 128-bit quantity (object identities).
#[inline]
pub fn hash_u128(x: u128) -> u64 {
    mix64((x as u64) ^ mix64((x >> 64) as u64))
}
