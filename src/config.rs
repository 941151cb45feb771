use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CATALOG_BASE: &str = "https://api.pokemontcg.io/v2";
pub const USER_AGENT: &str = "StackAndTrack/1.0";

/// Fields requested from the upstream `cards` endpoint.
pub const CARD_SELECT: &str = "id,name,set,images,tcgplayer,rarity,number";

/// Price variants consulted for a card's market price, most representative first.
pub const PRICE_VARIANTS: [&str; 4] = ["holofoil", "normal", "reverseHolofoil", "1stEditionNormal"];

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(8);
pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(15);
pub const RETRY_BACKOFF: Duration = Duration::from_millis(250);
pub const STORE_TIMEOUT: Duration = Duration::from_secs(5);

pub const MIN_SEARCH_LIMIT: usize = 1;
pub const MAX_SEARCH_LIMIT: usize = 50;
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Upstream bodies attached to errors and probe reports are cut to this many chars.
pub const DIAGNOSTIC_BODY_CHARS: usize = 200;

/// Hosts matching this suffix are an authenticating proxy in front of the catalog.
pub const PROXY_HOST_MARKER: &str = ".workers.dev";

pub const ENV_API_KEY: &str = "POKEMONTCG_API_KEY";
pub const ENV_BASE_URL: &str = "POKEMONTCG_BASE_URL";
pub const ENV_DB_PATH: &str = "STACKTRACK_DB_PATH";
pub const ENV_EMPTY_QUERY: &str = "STACKTRACK_EMPTY_QUERY";
pub const ENV_SEED_CATALOG: &str = "STACKTRACK_SEED_CATALOG";

/// What the catalog client does with a blank search query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyQueryPolicy {
    /// Return the first `limit` catalog entries unfiltered.
    #[default]
    Browse,
    /// Reject the query with a validation error.
    Strict,
}

impl EmptyQueryPolicy {
    /// Parse `browse` / `strict` (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "browse" => Some(Self::Browse),
            "strict" => Some(Self::Strict),
            _ => None,
        }
    }
}

pub fn default_db_path() -> PathBuf {
    if let Some(data) = dirs::data_dir() {
        data.join("stacktrack").join("stacktrack.duckdb")
    } else {
        PathBuf::from(".stacktrack").join("stacktrack.duckdb")
    }
}
