use serde::{Deserialize, Serialize};

const LETSENCRYPT_URL: &str = "https://acme-v02.api.letsencrypt.org/directory";
const LETSENCRYPT_STAGING_URL: &str = "https://acme-staging-v02.api.letsencrypt.org/directory";

/// Enumeration of known ACME API directories.
///
/// Deserializes from `"lets-encrypt"`, `"lets-encrypt-staging"` or `{ "other": "<url>" }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DirectoryUrl {
    /// The main Let's Encrypt directory.
    ///
    /// Not appropriate for testing / development.
    #[default]
    LetsEncrypt,

    /// The staging Let's Encrypt directory.
    ///
    /// Use for testing and development. Doesn't issue "valid" certificates. The root signing
    /// certificate is not supposed to be in any trust chains.
    LetsEncryptStaging,

    /// Provide an arbitrary directory URL to connect to, e.g. a local test CA.
    Other(String),
}

impl DirectoryUrl {
    pub fn to_url(&self) -> &str {
        match self {
            DirectoryUrl::LetsEncrypt => LETSENCRYPT_URL,
            DirectoryUrl::LetsEncryptStaging => LETSENCRYPT_STAGING_URL,
            DirectoryUrl::Other(url) => url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_directories() {
        assert_eq!(DirectoryUrl::default().to_url(), LETSENCRYPT_URL);
        assert_eq!(
            DirectoryUrl::LetsEncryptStaging.to_url(),
            LETSENCRYPT_STAGING_URL
        );
        assert_eq!(
            DirectoryUrl::Other("http://127.0.0.1:14000/dir".to_owned()).to_url(),
            "http://127.0.0.1:14000/dir"
        );
    }

    #[test]
    fn deserialize_directory() {
        let dir = serde_json::from_str::<DirectoryUrl>(r#""lets-encrypt-staging""#).unwrap();
        assert_eq!(dir, DirectoryUrl::LetsEncryptStaging);

        let dir = serde_json::from_str::<DirectoryUrl>(r#"{"other": "https://ca.test/dir"}"#)
            .unwrap();
        assert_eq!(dir.to_url(), "https://ca.test/dir");
    }
}
