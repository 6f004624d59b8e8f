//! Random object names.
//!
//! Names only need to avoid collisions between uploads to the same guild folder. They carry no
//! access-control meaning, and no existence check is made against the backend.

use rand::Rng;

/// 64 characters, all safe in a URL path segment.
const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_-";

/// Shortest generated name, extension excluded.
pub const MIN_NAME_LEN: usize = 9;
/// Longest generated name, extension excluded.
pub const MAX_NAME_LEN: usize = 16;

/// Uniformly random string of `length` characters over [`ALPHABET`].
pub fn generate_string(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Uniformly random integer in `[min, max]`. Swapped bounds are tolerated.
pub fn random_length(min: usize, max: usize) -> usize {
    let (low, high) = if min <= max { (min, max) } else { (max, min) };
    rand::rng().random_range(low..=high)
}

/// `{random name}.{extension}`
pub fn generate_filename(extension: &str) -> String {
    format!("{}.{}", generate_string(random_length(MIN_NAME_LEN, MAX_NAME_LEN)), extension)
}
