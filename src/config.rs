use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{acc::KeyType, client::ChallengeType, dir::DirectoryUrl, store::WriteMode};

/// Renewal is not initiated while the certificate is valid for more than this many days.
pub const RENEW_DAYS_LIMIT: i64 = 45;

/// Settings for [`CertManager`](crate::CertManager).
///
/// Every field has a default, so a partial JSON document such as
/// `{ "directory": "lets-encrypt-staging" }` is a complete configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// ACME directory of the CA.
    pub directory: DirectoryUrl,

    /// Renewal threshold, see [`RENEW_DAYS_LIMIT`].
    pub renew_days_limit: i64,

    /// Type of the throwaway account key, also requested for issued certificates.
    pub key_type: KeyType,

    /// Challenge types never used for domain validation.
    pub excluded_challenges: Vec<ChallengeType>,

    /// How certificate files are replaced on save.
    pub write_mode: WriteMode,

    /// Upper bound for a whole issuance or renewal call. No limit when unset.
    pub timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            directory: DirectoryUrl::default(),
            renew_days_limit: RENEW_DAYS_LIMIT,
            key_type: KeyType::default(),
            // only challenges we can answer ourselves, DNS records are not provisioned
            excluded_challenges: vec![ChallengeType::Dns01],
            write_mode: WriteMode::default(),
            timeout: None,
        }
    }
}

impl Config {
    /// Default configuration against the Let's Encrypt staging directory.
    pub fn staging() -> Self {
        Config {
            directory: DirectoryUrl::LetsEncryptStaging,
            ..Default::default()
        }
    }
}
