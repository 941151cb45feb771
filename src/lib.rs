//! StackTrack core.
//!
//! Persistence and catalog search for a trading-card collection tracker.
//! Users own named collections of card snapshots, stored in DuckDB under a
//! per-user namespace; cards are found through the upstream Pokemon TCG
//! catalog API.
//!
//! # Quick start
//!
//! ```no_run
//! use stacktrack::{CatalogConfig, StackTrack};
//!
//! let st = StackTrack::builder()
//!     .db_path("/var/lib/stacktrack/stacktrack.duckdb")
//!     .catalog(CatalogConfig::default().api_key("my-key"))
//!     .build()
//!     .unwrap();
//!
//! let favorites = st.collections().create("u1", "Favorites").unwrap();
//! let hits = st.catalog().search("sprigatito", 5).unwrap();
//! if let Some(card) = hits.into_iter().next() {
//!     st.items().add("u1", &favorites.id, &card.into()).unwrap();
//! }
//! ```

#[cfg(feature = "async")]
pub mod async_client;
pub mod catalog;
pub mod config;
pub mod connection;
pub mod error;
pub mod identity;
pub mod models;
pub mod sql_builder;
pub mod store;

#[cfg(feature = "async")]
pub use async_client::{AsyncStackTrack, AsyncStackTrackBuilder};
pub use catalog::{CatalogClient, CatalogConfig, SeedCatalog};
pub use config::EmptyQueryPolicy;
pub use connection::Connection;
pub use error::{Result, StackTrackError};
pub use identity::{bearer_token, IdentityVerifier};
pub use sql_builder::SqlBuilder;

use models::VerifiedUser;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// StackTrackBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`StackTrack`] instance.
///
/// Use [`StackTrack::builder()`] to obtain a builder, chain configuration
/// methods, and call [`build()`](StackTrackBuilder::build).
pub struct StackTrackBuilder {
    db_path: Option<PathBuf>,
    store_timeout: Duration,
    catalog: CatalogConfig,
    seed_path: Option<PathBuf>,
}

impl Default for StackTrackBuilder {
    fn default() -> Self {
        Self {
            db_path: None,
            store_timeout: config::STORE_TIMEOUT,
            catalog: CatalogConfig::default(),
            seed_path: None,
        }
    }
}

impl StackTrackBuilder {
    /// Start from the environment.
    ///
    /// `STACKTRACK_DB_PATH` selects the database file and
    /// `STACKTRACK_SEED_CATALOG` an offline seed file; the catalog settings
    /// come from [`CatalogConfig::from_env`].
    pub fn from_env() -> Result<Self> {
        let mut builder = Self {
            catalog: CatalogConfig::from_env()?,
            ..Self::default()
        };
        if let Ok(path) = std::env::var(config::ENV_DB_PATH) {
            builder = builder.db_path(path);
        }
        if let Ok(path) = std::env::var(config::ENV_SEED_CATALOG) {
            builder = builder.seed_catalog(path);
        }
        Ok(builder)
    }

    /// Persist to a DuckDB file. Without this the store is in-memory.
    pub fn db_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.db_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Persist to [`config::default_db_path`] (under the platform data directory).
    pub fn default_db_path(self) -> Self {
        self.db_path(config::default_db_path())
    }

    /// Longest time a store call waits for the database connection.
    ///
    /// Defaults to 5 seconds.
    pub fn store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Catalog client settings.
    pub fn catalog(mut self, catalog: CatalogConfig) -> Self {
        self.catalog = catalog;
        self
    }

    /// Load an offline seed catalog (JSON array of cards) at build time.
    pub fn seed_catalog<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.seed_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Open the store, create the schema if needed and build the catalog client.
    pub fn build(self) -> Result<StackTrack> {
        let conn = match &self.db_path {
            Some(path) => Connection::open(path, self.store_timeout)?,
            None => Connection::open_in_memory(self.store_timeout)?,
        };
        store::init_schema(&conn)?;
        let catalog = CatalogClient::new(self.catalog)?;
        let seed = self.seed_path.map(SeedCatalog::from_path).transpose()?;
        Ok(StackTrack {
            conn,
            catalog,
            seed,
        })
    }
}

// ---------------------------------------------------------------------------
// StackTrack
// ---------------------------------------------------------------------------

/// Entry point: owns the store connection and the catalog client.
///
/// Both are created once and only read afterwards, so one instance can be
/// shared (e.g. behind an `Arc`) by every request handler.
pub struct StackTrack {
    conn: Connection,
    catalog: CatalogClient,
    seed: Option<SeedCatalog>,
}

impl StackTrack {
    /// Create a new builder.
    pub fn builder() -> StackTrackBuilder {
        StackTrackBuilder::default()
    }

    /// Assemble from parts that were already set up.
    ///
    /// The connection must have had [`store::init_schema`] run on it.
    pub fn from_parts(conn: Connection, catalog: CatalogClient) -> Self {
        Self {
            conn,
            catalog,
            seed: None,
        }
    }

    /// Attach an offline seed catalog.
    pub fn with_seed_catalog(mut self, seed: SeedCatalog) -> Self {
        self.seed = Some(seed);
        self
    }

    // -- Accessors ---------------------------------------------------------

    /// Collection operations (list / create / delete), scoped by uid.
    pub fn collections(&self) -> store::CollectionStore<'_> {
        store::CollectionStore::new(&self.conn)
    }

    /// Card item operations (list / add / delete), scoped by uid and collection.
    pub fn items(&self) -> store::ItemStore<'_> {
        store::ItemStore::new(&self.conn)
    }

    /// User profile records.
    pub fn profiles(&self) -> store::ProfileStore<'_> {
        store::ProfileStore::new(&self.conn)
    }

    /// The upstream catalog search client.
    pub fn catalog(&self) -> &CatalogClient {
        &self.catalog
    }

    /// The offline seed catalog, if one was configured.
    pub fn seed_catalog(&self) -> Option<&SeedCatalog> {
        self.seed.as_ref()
    }

    /// The underlying [`Connection`], for maintenance and advanced queries.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    // -- Identity ----------------------------------------------------------

    /// Resolve an `Authorization` header to a verified user.
    ///
    /// After verification the user's profile is upserted. That write is
    /// best-effort: a failure is logged and does not fail the request.
    pub fn authenticate(
        &self,
        verifier: &dyn IdentityVerifier,
        authorization: Option<&str>,
    ) -> Result<VerifiedUser> {
        let user = self.me(verifier, authorization)?;
        self.ensure_profile(&user);
        Ok(user)
    }

    /// Resolve an `Authorization` header without touching the profile.
    pub fn me(
        &self,
        verifier: &dyn IdentityVerifier,
        authorization: Option<&str>,
    ) -> Result<VerifiedUser> {
        let token = bearer_token(authorization)?;
        verifier.verify(token)
    }

    /// Upsert the profile of an already verified user, swallowing failures.
    pub fn ensure_profile(&self, user: &VerifiedUser) {
        if let Err(e) = self.profiles().upsert(user) {
            tracing::warn!(uid = %user.uid, error = %e, "profile upkeep failed");
        }
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for StackTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StackTrack(catalog={}, empty_query={:?}, store_timeout={:?})",
            self.catalog.base_url(),
            self.catalog.empty_query_policy(),
            self.conn.busy_timeout()
        )
    }
}
