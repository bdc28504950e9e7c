use eyre::eyre;

use crate::{
    cert::CertificateResource,
    client::{CaClient as _, CaConnector},
    domain::{domain_set, Domain},
    error::{Error, Result},
    manager::{CertManager, BUNDLE},
};

impl<C: CaConnector> CertManager<C> {
    /// Obtains a new certificate for `domain` and its `sub_domains`.
    ///
    /// The certificate covers `domain` followed by `<sub>.<domain>` for each subdomain, unless
    /// `domain` already is a subdomain itself (see [`domain_set`]). All names are validated
    /// before contacting the CA.
    ///
    /// Issuance is all-or-nothing: if the CA fails to validate any of the names, the error lists
    /// every failed name with its own cause. The returned certificate is not saved.
    pub async fn gen_certs(
        &self,
        email: &str,
        domain: &str,
        sub_domains: &[&str],
    ) -> Result<CertificateResource> {
        self.with_timeout(self.issue(email, domain, sub_domains)).await
    }

    async fn issue(
        &self,
        email: &str,
        domain: &str,
        sub_domains: &[&str],
    ) -> Result<CertificateResource> {
        let primary = Domain::parse(domain)?;
        let domains = domain_set(primary.as_str(), sub_domains)
            .iter()
            .map(|name| Domain::parse(name).map(String::from))
            .collect::<Result<Vec<_>>>()?;

        let (account, mut client) = self.open_session(email).await?;

        log::debug!(
            "Requesting certificate for {domains:?} as {}",
            account.email()
        );

        match client.obtain_certificate(&domains, BUNDLE).await {
            Ok(cert) => {
                log::info!("Obtained certificate for {}", domains.join(", "));
                Ok(cert)
            }

            Err(failures) if failures.is_empty() => Err(Error::Protocol(eyre!(
                "no certificate issued for {} and no failed domain reported",
                domains.join(", ")
            ))),

            Err(failures) => {
                for (domain, err) in &failures {
                    log::warn!("Validation of {domain} failed: {err:#}");
                }

                Err(Error::Issuance { failures })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::{
        test::{test_config, FakeCa},
        ChallengeType, CertManager, Config, Error, ErrorKind,
    };

    #[tokio::test]
    async fn issues_bundled_certificate_for_domain_set() {
        let ca = FakeCa::new();
        let manager = CertManager::new(ca.clone(), test_config());

        let cert = manager
            .gen_certs("foo@bar.com", "example.com", &["www", "api"])
            .await
            .unwrap();

        assert_eq!(cert.domain, "example.com");
        assert!(cert.valid_days_left().unwrap() > 45);
        assert!(!cert.private_key.is_empty());

        assert_eq!(
            ca.calls(),
            [
                "connect https://ca.test/directory",
                "exclude dns-01",
                "register",
                "agree",
                "obtain example.com,www.example.com,api.example.com",
            ]
        );

        let state = ca.state();
        assert_eq!(state.excluded, [ChallengeType::Dns01]);
        assert_eq!(state.bundle, Some(true));
        assert_eq!(state.accounts.len(), 1);
        assert_eq!(state.accounts[0].email, "foo@bar.com");
    }

    #[tokio::test]
    async fn sub_domain_is_issued_alone() {
        let ca = FakeCa::new();
        let manager = CertManager::new(ca.clone(), test_config());

        manager
            .gen_certs("foo@bar.com", "sub.example.com", &["www", "api"])
            .await
            .unwrap();

        assert_eq!(ca.state().requested, ["sub.example.com"]);
    }

    #[tokio::test]
    async fn failed_domains_are_aggregated() {
        let ca = FakeCa::new();
        ca.fail_domain("www.example.com", "unauthorized: invalid response from server");
        ca.fail_domain("api.example.com", "connection: timeout during connect");
        let manager = CertManager::new(ca.clone(), test_config());

        let err = manager
            .gen_certs("foo@bar.com", "example.com", &["www", "api"])
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Protocol);

        let Error::Issuance { failures } = &err else {
            panic!("expected aggregate failure, got {err:?}");
        };
        assert_eq!(
            failures.keys().collect::<Vec<_>>(),
            ["api.example.com", "www.example.com"]
        );

        let msg = err.to_string();
        assert!(msg.contains("www.example.com"), "{msg}");
        assert!(msg.contains("api.example.com"), "{msg}");
        assert!(msg.contains("invalid response from server"), "{msg}");
        assert!(msg.contains("timeout during connect"), "{msg}");
    }

    #[tokio::test]
    async fn registration_failure_stops_before_agreement() {
        let ca = FakeCa::new();
        ca.state().fail_register = Some("urn:ietf:params:acme:error:invalidContact".to_owned());
        let manager = CertManager::new(ca.clone(), test_config());

        let err = manager
            .gen_certs("foo@bar.com", "example.com", &[])
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Protocol);
        assert!(err.to_string().contains("invalidContact"), "{err}");
        assert_eq!(ca.calls().last().unwrap(), "register");
    }

    #[tokio::test]
    async fn agreement_failure_stops_before_issuance() {
        let ca = FakeCa::new();
        ca.state().fail_agreement = Some("terms of service unavailable".to_owned());
        let manager = CertManager::new(ca.clone(), test_config());

        let err = manager
            .gen_certs("foo@bar.com", "example.com", &[])
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Protocol);
        assert_eq!(ca.calls().last().unwrap(), "agree");
        assert!(ca.state().requested.is_empty());
    }

    #[tokio::test]
    async fn invalid_names_never_reach_the_ca() {
        let ca = FakeCa::new();
        let manager = CertManager::new(ca.clone(), test_config());

        let err = manager
            .gen_certs("foo@bar.com", "-example.com", &[])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = manager
            .gen_certs("foo@bar.com", "example.com", &["w$w"])
            .await
            .unwrap_err();
        assert!(
            matches!(&err, Error::Validation { domain } if domain == "w$w.example.com"),
            "{err:?}"
        );

        assert!(ca.calls().is_empty());
    }

    #[tokio::test]
    async fn every_call_uses_a_fresh_account() {
        let ca = FakeCa::new();
        let manager = CertManager::new(ca.clone(), test_config());

        for _ in 0..2 {
            manager
                .gen_certs("foo@bar.com", "example.com", &[])
                .await
                .unwrap();
        }

        let state = ca.state();
        assert_eq!(state.accounts.len(), 2);
        assert_ne!(state.accounts[0].key_pem, state.accounts[1].key_pem);
        assert_eq!(
            state.calls.iter().filter(|call| *call == "register").count(),
            2
        );
    }

    #[tokio::test]
    async fn times_out_when_configured() {
        let ca = FakeCa::new();
        ca.state().connect_delay = Some(Duration::from_secs(30));
        let config = Config {
            timeout: Some(Duration::from_millis(50)),
            ..test_config()
        };
        let manager = CertManager::new(ca.clone(), config);

        let err = manager
            .gen_certs("foo@bar.com", "example.com", &[])
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Timeout(limit) if limit == Duration::from_millis(50)));
        assert!(ca.state().requested.is_empty());
    }
}
