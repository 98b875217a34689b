//! Test Helpers

use crate::{
    objects::ObjectKey,
    secrets::{
        CandidateSecret, PROVIDER_URL_KEY, SPI_TOKEN_NAME_KEY, TOKEN_DATA_KEY, TOKEN_SECRET_LABEL,
        USER_NAME_KEY,
    },
    tokens::AccessToken,
};

pub(crate) const NAMESPACE: &str = "team-a";

pub(crate) const PROVIDER_URL: &str = "https://git.example.com";

pub(crate) fn labeled_secret(name: &str) -> CandidateSecret {
    CandidateSecret::new(ObjectKey::new(NAMESPACE, name)).with_label(TOKEN_SECRET_LABEL, "true")
}

pub(crate) fn provider_secret(name: &str, provider_url: &str) -> CandidateSecret {
    labeled_secret(name)
        .with_data(PROVIDER_URL_KEY, provider_url)
        .with_data(USER_NAME_KEY, "bot")
        .with_data(TOKEN_DATA_KEY, "abc123")
}

pub(crate) fn reference_secret(name: &str, token_name: &str) -> CandidateSecret {
    labeled_secret(name)
        .with_data(SPI_TOKEN_NAME_KEY, token_name)
        .with_data(USER_NAME_KEY, "bot")
        .with_data(TOKEN_DATA_KEY, "abc123")
}

pub(crate) fn access_token(name: &str, provider_url: &str) -> AccessToken {
    AccessToken {
        key: ObjectKey::new(NAMESPACE, name),
        service_provider_url: provider_url.to_string(),
    }
}
