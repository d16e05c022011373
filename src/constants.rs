/// Shared constants for the resolution pipeline.

/// How many web search results the enrichment stage requests.
pub const MAX_SEARCH_RESULTS: usize = 3;

/// Separator between formatted search result documents.
pub const SEARCH_DOC_SEPARATOR: &str = "\n\n---\n\n";

/// Separator between components of the combined address query string.
pub const ADDRESS_PART_SEPARATOR: &str = ", ";

/// Default location of the canonical address store.
pub const DEFAULT_STORE_PATH: &str = "data/addresses.json";

/// Default port for the resolution HTTP server.
pub const DEFAULT_SERVER_PORT: u16 = 2024;
