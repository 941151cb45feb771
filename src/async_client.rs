//! Async wrapper around [`StackTrack`] for use in async runtimes (Tokio, etc.).
//!
//! Store and catalog calls block, so every operation is dispatched to
//! [`tokio::task::spawn_blocking`], keeping the async event loop free.
//! [`StackTrack`] is `Sync`; the wrapper shares it through an `Arc` without
//! any extra locking.
//!
//! # Example
//!
//! ```no_run
//! use stacktrack::{AsyncStackTrack, CatalogConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let st = AsyncStackTrack::builder()
//!         .catalog(CatalogConfig::default().api_key("my-key"))
//!         .build()
//!         .await
//!         .unwrap();
//!
//!     let mine = st.list_collections("u1").await.unwrap();
//!     let hits = st.search("pikachu", 10).await.unwrap();
//! }
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::models::{Collection, CollectionCardItem, NewCardItem, SearchFilter, SearchResultItem};
use crate::{CatalogConfig, StackTrack, StackTrackBuilder};

// ---------------------------------------------------------------------------
// AsyncStackTrackBuilder
// ---------------------------------------------------------------------------

/// Builder for [`AsyncStackTrack`]; same settings as [`StackTrackBuilder`].
#[derive(Default)]
pub struct AsyncStackTrackBuilder {
    inner: StackTrackBuilder,
}

impl AsyncStackTrackBuilder {
    /// Start from the environment, see [`StackTrackBuilder::from_env`].
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            inner: StackTrackBuilder::from_env()?,
        })
    }

    pub fn db_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.inner = self.inner.db_path(path);
        self
    }

    pub fn store_timeout(mut self, timeout: Duration) -> Self {
        self.inner = self.inner.store_timeout(timeout);
        self
    }

    pub fn catalog(mut self, catalog: CatalogConfig) -> Self {
        self.inner = self.inner.catalog(catalog);
        self
    }

    pub fn seed_catalog<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.inner = self.inner.seed_catalog(path);
        self
    }

    /// Open the store and build the catalog client.
    ///
    /// Runs on the blocking thread pool: the blocking HTTP client must not be
    /// constructed on an async worker.
    pub async fn build(self) -> Result<AsyncStackTrack> {
        let inner = self.inner;
        let st = tokio::task::spawn_blocking(move || inner.build())
            .await
            .map_err(std::io::Error::from)??;
        Ok(AsyncStackTrack::new(st))
    }
}

// ---------------------------------------------------------------------------
// AsyncStackTrack
// ---------------------------------------------------------------------------

/// Async wrapper around [`StackTrack`]. Cheap to clone.
#[derive(Clone)]
pub struct AsyncStackTrack {
    inner: Arc<StackTrack>,
}

impl AsyncStackTrack {
    pub fn builder() -> AsyncStackTrackBuilder {
        AsyncStackTrackBuilder::default()
    }

    /// Wrap an instance that was built outside the async runtime.
    pub fn new(inner: StackTrack) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Run a sync operation on the blocking thread pool.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use stacktrack::AsyncStackTrack;
    /// # async fn example(st: AsyncStackTrack) -> stacktrack::Result<()> {
    /// let purged = st.run(|s| s.items().purge_orphans("u1")).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&StackTrack) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let st = self.inner.clone();
        tokio::task::spawn_blocking(move || f(&st))
            .await
            .map_err(std::io::Error::from)?
    }

    pub async fn list_collections(&self, uid: &str) -> Result<Vec<Collection>> {
        let uid = uid.to_string();
        self.run(move |s| s.collections().list(&uid)).await
    }

    pub async fn create_collection(&self, uid: &str, name: &str) -> Result<Collection> {
        let (uid, name) = (uid.to_string(), name.to_string());
        self.run(move |s| s.collections().create(&uid, &name)).await
    }

    pub async fn delete_collection(&self, uid: &str, id: &str) -> Result<()> {
        let (uid, id) = (uid.to_string(), id.to_string());
        self.run(move |s| s.collections().delete(&uid, &id)).await
    }

    pub async fn list_items(&self, uid: &str, collection_id: &str) -> Result<Vec<CollectionCardItem>> {
        let (uid, collection_id) = (uid.to_string(), collection_id.to_string());
        self.run(move |s| s.items().list(&uid, &collection_id)).await
    }

    pub async fn add_item(
        &self,
        uid: &str,
        collection_id: &str,
        candidate: NewCardItem,
    ) -> Result<CollectionCardItem> {
        let (uid, collection_id) = (uid.to_string(), collection_id.to_string());
        self.run(move |s| s.items().add(&uid, &collection_id, &candidate)).await
    }

    pub async fn delete_item(&self, uid: &str, collection_id: &str, item_id: &str) -> Result<()> {
        let (uid, collection_id, item_id) =
            (uid.to_string(), collection_id.to_string(), item_id.to_string());
        self.run(move |s| s.items().delete(&uid, &collection_id, &item_id)).await
    }

    pub async fn search(
        &self,
        query: &str,
        limit: impl Into<Option<usize>>,
    ) -> Result<Vec<SearchResultItem>> {
        let (query, limit) = (query.to_string(), limit.into());
        self.run(move |s| s.catalog().search(&query, limit)).await
    }

    pub async fn search_filtered(
        &self,
        query: &str,
        limit: impl Into<Option<usize>>,
        filter: SearchFilter,
    ) -> Result<Vec<SearchResultItem>> {
        let (query, limit) = (query.to_string(), limit.into());
        self.run(move |s| s.catalog().search_filtered(&query, limit, &filter)).await
    }

    /// Borrow the wrapped sync instance.
    pub fn inner(&self) -> &StackTrack {
        &self.inner
    }
}
