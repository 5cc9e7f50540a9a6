//! Adapter selection for the HTTP state ports.
//!
//! A configured database backs profiles, items, purchases, member counters
//! and (unless a blob directory is given) stored files. Without one every
//! port falls back to its in-memory adapter.

use std::io;
use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use tracing::{info, warn};

use library_backend::domain::MediaLocator;
use library_backend::domain::ports::{
    BlobStore, FixtureIdentityProvider, FixturePaymentVerifier, IdentityProvider,
};
use library_backend::inbound::http::state::HttpStatePorts;
use library_backend::outbound::filesystem::FilesystemBlobStore;
use library_backend::outbound::identity::{HttpIdentityProvider, IdentityEndpoints};
use library_backend::outbound::memory::{
    InMemoryBlobStore, InMemoryContentRepository, InMemoryMemberSequence, InMemoryProfileStore,
    InMemoryPurchaseRepository,
};
use library_backend::outbound::persistence::{
    DbPool, DieselBlobStore, DieselContentRepository, DieselMemberSequence,
    DieselProfileRepository, DieselPurchaseRepository, PoolConfig, run_pending_migrations,
};
use library_backend::settings::AppSettings;

/// Build every port from `settings`, running migrations first when a database
/// is configured.
///
/// # Errors
/// Any invalid setting, unreachable database, failed migration or unusable
/// blob directory is reported as an [`io::Error`].
pub(crate) async fn build_ports(settings: &AppSettings) -> io::Result<HttpStatePorts> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let locator = settings.media_locator();
    let identity = build_identity(settings)?;
    let file_blobs = build_file_blobs(settings, &locator)?;

    let Some(database_url) = settings.database_url.clone() else {
        warn!("no database configured; state is kept in memory");
        let profiles = Arc::new(InMemoryProfileStore::new());
        let blobs = file_blobs
            .unwrap_or_else(|| Arc::new(InMemoryBlobStore::new(locator, clock.clone())));
        return Ok(HttpStatePorts {
            identity,
            users: profiles.clone(),
            admins: profiles,
            sequence: Arc::new(InMemoryMemberSequence::new()),
            blobs,
            items: Arc::new(InMemoryContentRepository::new()),
            purchases: Arc::new(InMemoryPurchaseRepository::new()),
            payments: Arc::new(FixturePaymentVerifier),
            clock,
        });
    };

    let applied = run_pending_migrations(database_url.clone())
        .await
        .map_err(io::Error::other)?;
    info!(applied, "database migrations complete");

    let mut pool_config = PoolConfig::new(database_url);
    if let Some(max_size) = settings.pool_max_size {
        pool_config = pool_config.with_max_size(max_size);
    }
    let pool = DbPool::new(pool_config).await.map_err(io::Error::other)?;

    let profiles = Arc::new(DieselProfileRepository::new(pool.clone()));
    let blobs = file_blobs.unwrap_or_else(|| {
        Arc::new(DieselBlobStore::new(pool.clone(), locator, clock.clone()))
    });
    Ok(HttpStatePorts {
        identity,
        users: profiles.clone(),
        admins: profiles,
        sequence: Arc::new(DieselMemberSequence::new(pool.clone())),
        blobs,
        items: Arc::new(DieselContentRepository::new(pool.clone())),
        purchases: Arc::new(DieselPurchaseRepository::new(pool)),
        payments: Arc::new(FixturePaymentVerifier),
        clock,
    })
}

fn build_identity(settings: &AppSettings) -> io::Result<Arc<dyn IdentityProvider>> {
    let Some(introspection) = settings.introspection_url().map_err(io::Error::other)? else {
        warn!("no identity service configured; every credential is rejected");
        return Ok(Arc::new(FixtureIdentityProvider::default()));
    };
    let endpoints = IdentityEndpoints {
        introspection,
        password_reset: settings.password_reset_url().map_err(io::Error::other)?,
        api_key: settings.identity_api_key.clone(),
    };
    let provider = HttpIdentityProvider::new(endpoints, settings.identity_timeout())
        .map_err(io::Error::other)?;
    Ok(Arc::new(provider))
}

fn build_file_blobs(
    settings: &AppSettings,
    locator: &MediaLocator,
) -> io::Result<Option<Arc<dyn BlobStore>>> {
    let Some(dir) = settings.blob_dir.as_deref() else {
        return Ok(None);
    };
    let store = FilesystemBlobStore::open(dir, locator.clone())?;
    info!(dir = %dir.display(), "serving files from disk");
    Ok(Some(Arc::new(store)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn memory_adapters_back_an_empty_configuration() {
        let ports = build_ports(&AppSettings::default())
            .await
            .expect("memory ports");

        let name = library_backend::domain::BlobName::new("books/x.pdf").expect("name");
        assert!(!ports.blobs.exists(&name).await.expect("exists"));
    }

    #[rstest]
    #[tokio::test]
    async fn blob_dir_selects_the_filesystem_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = AppSettings {
            blob_dir: Some(dir.path().to_path_buf()),
            ..AppSettings::default()
        };
        let ports = build_ports(&settings).await.expect("ports");
        let name = library_backend::domain::BlobName::new("books/x.pdf").expect("name");

        ports.blobs.save(&name, b"%PDF".to_vec(), None).await.expect("save");

        assert!(dir.path().join("books").join("x.pdf").exists());
    }

    #[rstest]
    fn malformed_identity_url_fails_startup() {
        let settings = AppSettings {
            identity_introspection_url: Some("not a url".to_owned()),
            ..AppSettings::default()
        };

        assert!(build_identity(&settings).is_err());
    }
}
