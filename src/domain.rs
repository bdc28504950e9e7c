//! Host name checks and construction of the domain set submitted for one certificate.

use std::{fmt, str::FromStr};

use crate::error::{Error, Result};

/// Characters that may never appear in a host name.
const FORBIDDEN_CHARS: &str = "`~!@#$%^&*()+={}[]|\\\"';:><?/";

/// Characters a host name must not start or end with.
const EDGE_CHARS: [char; 3] = ['-', '_', '.'];

/// Characters no single label may start or end with.
const LABEL_EDGE_CHARS: [char; 2] = ['-', '_'];

/// Maximum length of a host name in bytes, see RFC 1035.
const MAX_LEN: usize = 255;

/// Returns true if `host` looks like a usable domain name (see RFC 1035, RFC 3696).
///
/// Surrounding whitespace is ignored. Neither the name nor any of its labels may start or end
/// with `-` or `_`, and the name may not start or end with `.`.
///
/// The check is purely syntactic and deliberately loose: the list of rejected characters is not
/// exhaustive and anything it lets through will be rejected by the CA later on.
pub fn is_valid_domain(host: &str) -> bool {
    let host = host.trim();

    if host.is_empty() || host.len() > MAX_LEN {
        return false;
    }

    if host.starts_with(EDGE_CHARS) || host.ends_with(EDGE_CHARS) {
        return false;
    }

    if host
        .split('.')
        .any(|label| label.starts_with(LABEL_EDGE_CHARS) || label.ends_with(LABEL_EDGE_CHARS))
    {
        return false;
    }

    !host.contains(|c: char| FORBIDDEN_CHARS.contains(c))
}

/// Returns true if `domain` has more than two dot-separated labels.
pub fn is_sub_domain(domain: &str) -> bool {
    domain.split('.').count() > 2
}

/// Builds the ordered list of names to bundle into one certificate.
///
/// The primary domain comes first, followed by `<sub>.<domain>` for every entry of
/// `sub_domains`. When `domain` is already a subdomain the list is ignored.
pub fn domain_set(domain: &str, sub_domains: &[&str]) -> Vec<String> {
    let mut domains = vec![domain.to_owned()];

    if !is_sub_domain(domain) {
        domains.extend(sub_domains.iter().map(|sub| format!("{sub}.{domain}")));
    }

    domains
}

/// A host name that passed [`is_valid_domain`], stored without surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Domain(String);

impl Domain {
    pub fn parse(host: &str) -> Result<Self> {
        if !is_valid_domain(host) {
            return Err(Error::Validation {
                domain: host.to_owned(),
            });
        }

        Ok(Domain(host.trim().to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this domain has more than two labels.
    pub fn is_sub_domain(&self) -> bool {
        is_sub_domain(&self.0)
    }
}

impl FromStr for Domain {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Domain::parse(s)
    }
}

impl AsRef<str> for Domain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Domain> for String {
    fn from(domain: Domain) -> Self {
        domain.0
    }
}
