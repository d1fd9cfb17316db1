//! Various small helper functions

use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use std::num::ParseIntError;
use std::time::Duration;

/// Parses a Duration from a string containing milliseconds.
/// Useful for command line parsing
pub fn parse_millis(src: &str) -> Result<Duration, ParseIntError> {
    let millis = src.parse::<u64>()?;
    Ok(Duration::from_millis(millis))
}

/// Generates a short, random identifier in the form of `<prefix>_<random>`
///
/// The random part consists of `length` alphanumeric characters. It is not guaranteed to be unique,
/// storage backends are expected to reject collisions.
pub fn short_identifier(prefix: &str, length: usize) -> String {
    let random: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect();

    format!("{}_{}", prefix, random)
}
