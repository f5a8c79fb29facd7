/*!
 * Admin authentication
 * Password check, emailed one-time code, session guard
 */
pub mod guard;
pub mod otp;
pub mod session;

use rand::Rng;
use sha2::{Digest, Sha256};

pub use guard::require_admin;
pub use otp::{Authenticator, LoginForm, LoginOutcome};
pub use session::{
    session_manager, AdminSession, AuthState, Flash, FlashLevel, MemorySessionStore, Session,
    SESSION_COOKIE,
};

/// Number of digits in an admin login code.
pub const OTP_DIGITS: usize = 6;

/// Draw a numeric one-time code; every digit comes independently from the
/// thread-local CSPRNG.
pub fn generate_otp() -> String {
    let mut rng = rand::rng();
    (0..OTP_DIGITS)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

/// Equality whose timing does not depend on where the inputs differ.
///
/// Both sides are hashed first so the length of the secret does not leak
/// either.
pub fn constant_time_eq(given: &str, expected: &str) -> bool {
    let given = Sha256::digest(given.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    given
        .iter()
        .zip(expected.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
