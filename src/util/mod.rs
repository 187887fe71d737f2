//! Shared helpers for command argument handling.
//!
//! - **Interval parsing**: strings like `"30s"` or `"1m30s"` into [`std::time::Duration`]
//! - **URL validation**: feed URLs checked before anything touches the database

mod duration;
mod url;

pub use self::duration::{parse_interval, ParseIntervalError};
pub use self::url::{validate_feed_url, UrlError};
