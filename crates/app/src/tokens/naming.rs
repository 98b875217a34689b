//! Generated access token names.

use rand::{seq::SliceRandom, thread_rng};
use sha2::{Digest, Sha256};

/// Prefix of every access token name generated during migration.
pub const GENERATED_NAME_PREFIX: &str = "generated-spi-access-token-";

/// Characters used for random suffixes. Vowels and look-alikes are left out.
const RANDOM_ALPHABET: &[u8] = b"bcdfghjklmnpqrstvwxz2456789";

const RANDOM_SUFFIX_LEN: usize = 5;

const DERIVED_SUFFIX_LEN: usize = 16;

/// How generated access tokens are named.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TokenNaming {
    /// A random suffix per creation.
    Random,

    /// A suffix derived from the namespace and provider URL, so every
    /// creation for the same provider targets the same name.
    #[default]
    Derived,
}

impl TokenNaming {
    /// Name for a new access token bound to `provider_url` in `namespace`.
    #[must_use]
    pub fn name_for(self, namespace: &str, provider_url: &str) -> String {
        let suffix = match self {
            Self::Random => random_suffix(),
            Self::Derived => derived_suffix(namespace, provider_url),
        };

        format!("{GENERATED_NAME_PREFIX}{suffix}")
    }
}

fn random_suffix() -> String {
    let mut rng = thread_rng();

    (0..RANDOM_SUFFIX_LEN)
        .filter_map(|_| RANDOM_ALPHABET.choose(&mut rng))
        .map(|byte| char::from(*byte))
        .collect()
}

fn derived_suffix(namespace: &str, provider_url: &str) -> String {
    let digest = Sha256::digest(format!("{namespace}\n{provider_url}").as_bytes());

    format!("{digest:x}").chars().take(DERIVED_SUFFIX_LEN).collect()
}
