use std::{collections::BTreeMap, fmt, io, path::PathBuf, time::Duration};

use thiserror::Error;

/// Per-domain challenge failures reported by a CA client, keyed by domain name.
pub type DomainFailures = BTreeMap<String, eyre::Report>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors returned by the certificate lifecycle operations.
///
/// Failures of the external CA client are carried as [`eyre::Report`]s, the rest are raised by
/// this crate. Nothing is retried; every failure is handed back to the caller.
#[derive(Debug, Error)]
pub enum Error {
    /// A host name failed [`is_valid_domain`](crate::is_valid_domain).
    #[error("invalid domain name: {domain:?}")]
    Validation { domain: String },

    /// A certificate or metadata file does not exist.
    #[error("{} not found", .path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The metadata file is not valid JSON of the expected shape.
    #[error("malformed certificate metadata in {}", .path.display())]
    Meta {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The certificate bytes could not be parsed as a PEM encoded X.509 certificate.
    #[error("malformed certificate: {0:#}")]
    Certificate(eyre::Report),

    /// Registration, agreement acceptance or renewal failed at the CA.
    #[error("{0:#}")]
    Protocol(eyre::Report),

    /// One or more domains of a bundled order failed validation.
    #[error("failed to obtain certificate for domains {}", Failures(.failures))]
    Issuance { failures: DomainFailures },

    /// Renewal was requested while the certificate is still comfortably valid.
    #[error("certificate has not expired yet, please renew in {days_left} days")]
    NotDue { days_left: i64 },

    /// Reading or writing certificate material failed.
    #[error("I/O error on {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The account key pair could not be generated.
    #[error("account key generation failed: {0:#}")]
    KeyGeneration(eyre::Report),

    /// The configured deadline elapsed before the operation finished.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Coarse classification of [`Error`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Parse,
    Protocol,
    Policy,
    Io,
    KeyGeneration,
    Timeout,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation { .. } => ErrorKind::Validation,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::Meta { .. } | Error::Certificate(_) => ErrorKind::Parse,
            Error::Protocol(_) | Error::Issuance { .. } => ErrorKind::Protocol,
            Error::NotDue { .. } => ErrorKind::Policy,
            Error::Io { .. } => ErrorKind::Io,
            Error::KeyGeneration(_) => ErrorKind::KeyGeneration,
            Error::Timeout(_) => ErrorKind::Timeout,
        }
    }

    /// Maps a failed read of `path`, separating a missing file from other I/O errors.
    pub(crate) fn read(path: PathBuf, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Error::NotFound { path, source }
        } else {
            Error::Io { path, source }
        }
    }
}

struct Failures<'a>(&'a DomainFailures);

impl fmt::Display for Failures<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let domains = self.0.keys().map(String::as_str).collect::<Vec<_>>();
        write!(f, "[{}], with following errors:", domains.join(", "))?;

        for (domain, err) in self.0 {
            write!(f, " {domain}: {err:#};")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issuance_error_lists_each_domain_and_cause() {
        let mut failures = DomainFailures::new();
        failures.insert(
            "api.example.com".to_owned(),
            eyre::eyre!("connection refused"),
        );
        failures.insert(
            "www.example.com".to_owned(),
            eyre::eyre!("unauthorized: invalid response"),
        );

        let err = Error::Issuance { failures };
        let msg = err.to_string();

        assert_eq!(err.kind(), ErrorKind::Protocol);
        assert!(msg.contains("[api.example.com, www.example.com]"), "{msg}");
        assert!(msg.contains("api.example.com: connection refused"), "{msg}");
        assert!(
            msg.contains("www.example.com: unauthorized: invalid response"),
            "{msg}"
        );
    }

    #[test]
    fn read_errors_split_by_kind() {
        let missing = Error::read(
            PathBuf::from("public.crt"),
            io::Error::from(io::ErrorKind::NotFound),
        );
        assert_eq!(missing.kind(), ErrorKind::NotFound);

        let denied = Error::read(
            PathBuf::from("public.crt"),
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        assert_eq!(denied.kind(), ErrorKind::Io);
    }
}
