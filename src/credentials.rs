//! API credentials.
//!
//! Secrets are referenced by env-var name in `config.toml` and resolved once
//! at startup. They are held as [`SecretString`] and never logged or served;
//! the fleet only asks whether the execution credential is present.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::config::CredentialsConfig;

/// Boundary consulted by the controller at start-command time.
pub trait CredentialProvider: Send + Sync {
    /// Whether the credential required to execute bots is configured.
    fn has_execution_credential(&self) -> bool;

    /// Name shown to the operator when the credential is missing.
    fn execution_credential_name(&self) -> &str;
}

/// Resolved API keys.
pub struct ApiKeys {
    execution_key_env: String,
    /// Payment provider secret (Paystack). Required to start the fleet.
    pub payment: Option<SecretString>,
    pub storefront: Option<SecretString>,
    pub marketplace: Option<SecretString>,
    pub target_site: Option<String>,
}

/// Which credentials are present, safe to serve.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CredentialStatus {
    pub payment: bool,
    pub storefront: bool,
    pub marketplace: bool,
    pub target_site: bool,
}

fn read_secret(env_name: Option<&str>) -> Option<SecretString> {
    let name = env_name?;
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Some(SecretString::new(v)),
        _ => None,
    }
}

impl ApiKeys {
    /// Resolve every key named in config from the environment.
    pub fn from_env(cfg: &CredentialsConfig) -> Self {
        Self {
            execution_key_env: cfg.payment_key_env.clone(),
            payment: read_secret(Some(&cfg.payment_key_env)),
            storefront: read_secret(cfg.storefront_key_env.as_deref()),
            marketplace: read_secret(cfg.marketplace_key_env.as_deref()),
            target_site: cfg
                .target_site_env
                .as_deref()
                .and_then(|n| std::env::var(n).ok())
                .filter(|v| !v.trim().is_empty()),
        }
    }

    /// Keys with only the payment secret set (or none).
    pub fn with_payment(secret: Option<&str>) -> Self {
        Self {
            execution_key_env: "PAYSTACK_SECRET_KEY".to_string(),
            payment: secret.map(|s| SecretString::new(s.to_string())),
            storefront: None,
            marketplace: None,
            target_site: None,
        }
    }

    pub fn status(&self) -> CredentialStatus {
        CredentialStatus {
            payment: self.payment.is_some(),
            storefront: self.storefront.is_some(),
            marketplace: self.marketplace.is_some(),
            target_site: self.target_site.is_some(),
        }
    }
}

impl CredentialProvider for ApiKeys {
    fn has_execution_credential(&self) -> bool {
        self.payment
            .as_ref()
            .is_some_and(|s| !s.expose_secret().trim().is_empty())
    }

    fn execution_credential_name(&self) -> &str {
        &self.execution_key_env
    }
}

impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeys")
            .field("execution_key_env", &self.execution_key_env)
            .field("status", &self.status())
            .finish()
    }
}
