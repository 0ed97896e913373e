/// Application constants

pub const API_VERSION: &str = "v1";

// Upstream defaults
pub const DEFAULT_API_URL: &str = "https://kai-sign-production.up.railway.app";
pub const DEFAULT_GRAPH_URL: &str =
    "https://api.studio.thegraph.com/query/117022/kaisign-subgraph/v0.0.7";

// Metadata backend routes
pub const SPEC_METADATA_PATH: &str = "/api/py/getIPFSMetadata";
pub const BLOB_METADATA_PATH: &str = "/api/py/getBlobMetadata";
pub const HEALTH_PATH: &str = "/api/health";

// Retry policy
pub const METADATA_MAX_RETRIES: u32 = 3;
pub const METADATA_INITIAL_BACKOFF_MS: u64 = 1_000;
pub const RETRYABLE_STATUS_CODES: [u16; 3] = [502, 503, 504];

// Keep-alive
pub const KEEP_ALIVE_INTERVAL_SECS: u64 = 10 * 60;
pub const KEEP_ALIVE_INITIAL_DELAY_SECS: u64 = 30;

// HTTP client
pub const HTTP_CONNECT_TIMEOUT_SECS: u64 = 4;
pub const HTTP_DEFAULT_TIMEOUT_SECS: u64 = 15;

// Identifier sizes, in hex digits
pub const SPEC_ID_HEX_LEN: usize = 64;
pub const ADDRESS_HEX_LEN: usize = 40;

pub const CHAIN_NAMES: &[(u64, &str)] = &[
    (1, "Ethereum Mainnet"),
    (10, "Optimism"),
    (56, "BSC"),
    (137, "Polygon"),
    (250, "Fantom"),
    (8453, "Base"),
    (17000, "Holesky Testnet"),
    (42161, "Arbitrum One"),
    (43114, "Avalanche"),
    (11155111, "Sepolia Testnet"),
];
