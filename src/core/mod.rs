//! Core types - pure abstractions shared across the codebase.

mod driver;
mod state;
mod url;

pub use driver::BuildMode;
pub use state::{is_shutdown, register_server, request_shutdown, setup_shutdown_handler};
pub use url::{decode_request_path, dev_origin, normalize_base, strip_base};

use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock milliseconds since the Unix epoch.
///
/// Used for update timestamps that round-trip through the browser.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_millis_is_epoch_millis() {
        let a = now_millis();
        let b = now_millis();
        // 2020-01-01 in ms; anything earlier means seconds or a broken clock
        assert!(a > 1_577_836_800_000);
        assert!(b >= a);
    }
}
