//! Shared configuration constants for tablescrape
//!
//! Default values used across fetch, rendering and file-download code so the
//! same number never appears twice.

/// Default per-request timeout: 30 seconds
///
/// Ranking pages are heavy but served from a CDN; anything slower than this
/// is treated as a transient failure and retried.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default number of attempts per fetch (first try included)
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Delay before the first retry, doubled after every failure
pub const DEFAULT_RETRY_INITIAL_DELAY_MS: u64 = 2_000;

/// Ceiling for a single backoff delay
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 30_000;

/// Upper bound of the random jitter added to each backoff delay
pub const DEFAULT_RETRY_JITTER_MS: u64 = 1_000;

/// Default cap on "load more" clicks per rendered session
///
/// Large ranking lists need 40-60 clicks; the cap only guards against a
/// control that never disappears.
pub const DEFAULT_MAX_CLICKS: u32 = 100;

/// Wait after each "load more" click before counting rows again
pub const DEFAULT_SETTLE_INTERVAL_MS: u64 = 4_000;

/// Consecutive clicks without row growth before the list is considered complete
pub const DEFAULT_NO_GROWTH_THRESHOLD: u32 = 3;

/// Navigation timeout for the rendered session
pub const DEFAULT_NAVIGATION_TIMEOUT_SECS: u64 = 30;

/// How long the rendered session waits for a table to appear after navigation
pub const DEFAULT_TABLE_WAIT_SECS: u64 = 15;

/// Pause between two sequentially processed categories
pub const DEFAULT_CATEGORY_PAUSE_MS: u64 = 2_000;

/// Browser-like user agents, one picked at random per request
///
/// Mixed engines and platforms; refresh alongside stable browser releases.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36 Edg/132.0.0.0",
];

/// Accept header sent with every page request
pub const ACCEPT_HEADER: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// French first: the ranking pages localize number formats from this
pub const ACCEPT_LANGUAGE_HEADER: &str = "fr-FR,fr;q=0.9,en-US;q=0.8,en;q=0.7";

/// Keywords that mark an export or download action, matched case-insensitively
pub const DOWNLOAD_KEYWORDS: &[&str] = &[
    "csv",
    "export",
    "download",
    "télécharger",
    "telecharger",
    "xls",
    "xlsx",
    "excel",
    "tableau",
    "données",
    "données brutes",
    "raw data",
    "extraction",
];

/// Class fragments of anchors/buttons that trigger an export
pub const DOWNLOAD_CLASS_FRAGMENTS: &[&str] = &["export", "download", "csv", "excel"];

/// Attributes that may carry a download target instead of `href`
pub const DOWNLOAD_URL_ATTRIBUTES: &[&str] = &["data-href", "data-url", "data-download"];

/// Variable-name fragments hinting that a script assignment holds table data
pub const PAYLOAD_NAME_HINTS: &[&str] = &["data", "list", "tableau", "table", "classement", "rank"];
