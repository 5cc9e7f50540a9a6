//! Runtime settings loaded via OrthoConfig.
//!
//! Values layer CLI flags over `LIBRARY_*` environment variables over an
//! optional configuration file. Every field is optional; accessors supply the
//! defaults.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::{DEFAULT_VERIFICATION_TIMEOUT, MediaLocator};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_MEDIA_PREFIX: &str = "/api/v1/media";

/// Errors raised while interpreting loaded settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind address {value}: {message}")]
    BindAddr { value: String, message: String },
    #[error("invalid {field} URL {value}: {message}")]
    Url {
        field: &'static str,
        value: String,
        message: String,
    },
}

/// Configuration for the library backend process.
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "LIBRARY")]
pub struct AppSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL. When absent the process keeps all state in memory.
    pub database_url: Option<String>,
    /// Directory for stored files. Overrides the database blob store.
    pub blob_dir: Option<PathBuf>,
    /// Token introspection endpoint of the identity service.
    pub identity_introspection_url: Option<String>,
    /// Password reset endpoint of the identity service.
    pub identity_password_reset_url: Option<String>,
    /// API key sent to the identity service.
    pub identity_api_key: Option<String>,
    /// Bound on each identity service call.
    pub identity_timeout_ms: Option<u64>,
    /// Prefix used when building public file URLs.
    pub public_media_prefix: Option<String>,
    /// Maximum database connections.
    pub pool_max_size: Option<u32>,
}

impl AppSettings {
    /// Parsed listen address.
    ///
    /// # Errors
    /// [`SettingsError::BindAddr`] when the configured value is not a socket
    /// address.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse()
            .map_err(|err: std::net::AddrParseError| SettingsError::BindAddr {
                value: raw.to_owned(),
                message: err.to_string(),
            })
    }

    pub fn identity_timeout(&self) -> Duration {
        self.identity_timeout_ms
            .map_or(DEFAULT_VERIFICATION_TIMEOUT, Duration::from_millis)
    }

    pub fn media_locator(&self) -> MediaLocator {
        MediaLocator::new(
            self.public_media_prefix
                .as_deref()
                .unwrap_or(DEFAULT_MEDIA_PREFIX),
        )
    }

    /// Introspection endpoint, if an external identity service is configured.
    ///
    /// # Errors
    /// [`SettingsError::Url`] when the configured value does not parse.
    pub fn introspection_url(&self) -> Result<Option<Url>, SettingsError> {
        parse_url(
            "identity_introspection_url",
            self.identity_introspection_url.as_deref(),
        )
    }

    /// # Errors
    /// [`SettingsError::Url`] when the configured value does not parse.
    pub fn password_reset_url(&self) -> Result<Option<Url>, SettingsError> {
        parse_url(
            "identity_password_reset_url",
            self.identity_password_reset_url.as_deref(),
        )
    }
}

fn parse_url(field: &'static str, raw: Option<&str>) -> Result<Option<Url>, SettingsError> {
    raw.filter(|value| !value.trim().is_empty())
        .map(|value| {
            Url::parse(value).map_err(|err| SettingsError::Url {
                field,
                value: value.to_owned(),
                message: err.to_string(),
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 9] = [
        "LIBRARY_BIND_ADDR",
        "LIBRARY_DATABASE_URL",
        "LIBRARY_BLOB_DIR",
        "LIBRARY_IDENTITY_INTROSPECTION_URL",
        "LIBRARY_IDENTITY_PASSWORD_RESET_URL",
        "LIBRARY_IDENTITY_API_KEY",
        "LIBRARY_IDENTITY_TIMEOUT_MS",
        "LIBRARY_PUBLIC_MEDIA_PREFIX",
        "LIBRARY_POOL_MAX_SIZE",
    ];

    fn load_from_empty_args() -> AppSettings {
        AppSettings::load_from_iter([OsString::from("library-backend")])
            .expect("config should load")
    }

    #[rstest]
    fn defaults_apply_when_nothing_is_set() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();

        assert_eq!(
            settings.bind_addr().expect("default address"),
            "0.0.0.0:8080".parse::<SocketAddr>().expect("addr")
        );
        assert!(settings.database_url.is_none());
        assert!(settings.blob_dir.is_none());
        assert_eq!(settings.identity_timeout(), DEFAULT_VERIFICATION_TIMEOUT);
        assert!(settings.introspection_url().expect("url").is_none());
        let name = crate::domain::BlobName::new("books/x.pdf").expect("name");
        assert_eq!(settings.media_locator().url_for(&name), "/api/v1/media/books/x.pdf");
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("LIBRARY_BIND_ADDR", Some("127.0.0.1:9000".to_owned())),
            ("LIBRARY_DATABASE_URL", Some("postgres://db/library".to_owned())),
            ("LIBRARY_BLOB_DIR", Some("/var/lib/library".to_owned())),
            (
                "LIBRARY_IDENTITY_INTROSPECTION_URL",
                Some("https://id.example.edu/introspect".to_owned()),
            ),
            ("LIBRARY_IDENTITY_TIMEOUT_MS", Some("250".to_owned())),
            ("LIBRARY_PUBLIC_MEDIA_PREFIX", Some("https://cdn.example.edu/".to_owned())),
            ("LIBRARY_POOL_MAX_SIZE", Some("4".to_owned())),
        ]);

        let settings = load_from_empty_args();

        assert_eq!(
            settings.bind_addr().expect("address"),
            "127.0.0.1:9000".parse::<SocketAddr>().expect("addr")
        );
        assert_eq!(settings.database_url.as_deref(), Some("postgres://db/library"));
        assert_eq!(settings.blob_dir, Some(PathBuf::from("/var/lib/library")));
        assert_eq!(
            settings.introspection_url().expect("url").map(String::from),
            Some("https://id.example.edu/introspect".to_owned())
        );
        assert_eq!(settings.identity_timeout(), Duration::from_millis(250));
        assert_eq!(settings.pool_max_size, Some(4));
        let name = crate::domain::BlobName::new("books/x.pdf").expect("name");
        assert_eq!(
            settings.media_locator().url_for(&name),
            "https://cdn.example.edu/books/x.pdf"
        );
    }

    #[rstest]
    #[case(Some("not an address"), true)]
    #[case(Some("[::1]:8080"), false)]
    fn bind_addr_is_validated(#[case] raw: Option<&str>, #[case] fails: bool) {
        let settings = AppSettings {
            bind_addr: raw.map(str::to_owned),
            ..AppSettings::default()
        };

        assert_eq!(settings.bind_addr().is_err(), fails);
    }

    #[rstest]
    fn malformed_identity_urls_are_reported() {
        let settings = AppSettings {
            identity_password_reset_url: Some("::nope".to_owned()),
            ..AppSettings::default()
        };

        let err = settings.password_reset_url().expect_err("invalid url");
        assert!(err.to_string().contains("identity_password_reset_url"));
    }
}
