//! Access Token Records

use crate::objects::ObjectKey;

/// API group and version of the access token resource.
pub const ACCESS_TOKEN_API_VERSION: &str = "appstudio.redhat.com/v1beta1";

/// Kind of the access token resource.
pub const ACCESS_TOKEN_KIND: &str = "SPIAccessToken";

/// Access token metadata. Holds routing data only, never credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// Access token identity.
    pub key: ObjectKey,

    /// Service provider the token is bound to.
    pub service_provider_url: String,
}

/// New access token persistence payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccessToken {
    /// Identity of the token to create.
    pub key: ObjectKey,

    /// Service provider to bind the token to.
    pub service_provider_url: String,
}

impl From<NewAccessToken> for AccessToken {
    fn from(token: NewAccessToken) -> Self {
        Self {
            key: token.key,
            service_provider_url: token.service_provider_url,
        }
    }
}
