//! Temporary password generation.
//!
//! The password only exists until the staff member follows the recovery
//! link, so it is drawn from a plain thread RNG. The alphabet leaves out
//! look-alike characters (`0 O 1 l I`).

use rand::Rng;
use secrecy::SecretString;

/// Characters a temporary password may contain.
pub const SAFE_ALPHABET: &[u8] =
    b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz23456789!@#$%";

/// Length of generated temporary passwords.
pub const TEMP_PASSWORD_LEN: usize = 24;

/// Generate a temporary password for a new account.
pub fn generate_temp_password() -> SecretString {
    SecretString::from(generate_with(&mut rand::thread_rng(), TEMP_PASSWORD_LEN))
}

/// Draw `len` characters from [`SAFE_ALPHABET`] using `rng`.
pub fn generate_with<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| char::from(SAFE_ALPHABET[rng.gen_range(0..SAFE_ALPHABET.len())]))
        .collect()
}
