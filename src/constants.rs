//! Monitor Constants
//!
//! Cadence, provider defaults and display settings shared by the scheduler,
//! the collaborator clients and the message formatter.
//!
//! ## Cadence
//!
//! | Minute rule        | Effect                                    |
//! |--------------------|-------------------------------------------|
//! | `minute % 5 == 0`  | tick is active, 5m baseline refreshed     |
//! | `minute % 30 == 0` | 30m baseline refreshed (highest priority) |
//! | `minute % 15 == 0` | 15m baseline refreshed                    |
//! | `minute % 10 == 0` | 10m baseline refreshed (lowest priority)  |
//! | `minute == 0`      | hourly summary                            |
//! | `+ hour % 8 == 0`  | news digest, once per hour value          |

/// Every active tick happens on a multiple of this many minutes
pub const ACTIVE_TICK_MINUTES: u32 = 5;

/// News digest is due on hours divisible by this value
pub const NEWS_CADENCE_HOURS: u32 = 8;

/// Fixed pause after an active tick completes
pub const ACTIVE_TICK_SLEEP_SECS: u64 = 60;

/// Outbound HTTP timeout used when `HTTP_TIMEOUT_SECS` is not set
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 8;

/// SQLite busy timeout; a locked database must not stall a tick
pub const DB_BUSY_TIMEOUT_SECS: u64 = 3;

/// Number of listings requested from the market data provider
pub const DEFAULT_LISTING_LIMIT: u32 = 100;

/// News items kept per digest section
pub const NEWS_ITEM_LIMIT: usize = 5;

/// Default change threshold in percent
pub const DEFAULT_CHANGE_THRESHOLD: f64 = 1.0;

pub const DEFAULT_CMC_API: &str = "https://pro-api.coinmarketcap.com/v1";
pub const DEFAULT_CP_API: &str = "https://cryptopanic.com/api/v1";
pub const DEFAULT_RATE_API: &str = "https://open.er-api.com/v6";
pub const TELEGRAM_API: &str = "https://api.telegram.org";

pub const DEFAULT_QUOTE_CURRENCY: &str = "IDR";
pub const DEFAULT_SECONDARY_CURRENCY: &str = "USD";
pub const DEFAULT_TIMEZONE: &str = "Asia/Jakarta";
pub const DEFAULT_DATABASE_PATH: &str = "coinpulse.db";

/// Display format for localized timestamps, e.g. `19-10-2026 14:30:00 WIB`
pub const LOCAL_TIME_FORMAT: &str = "%d-%m-%Y %H:%M:%S %Z";

/// Currency display prefixes; unknown codes fall back to the code itself
pub const CURRENCY_PREFIXES: &[(&str, &str)] = &[
    ("IDR", "Rp"),
    ("USD", "$"),
    ("EUR", "€"),
    ("JPY", "¥"),
    ("GBP", "£"),
];
