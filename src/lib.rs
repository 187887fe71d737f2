//! sift: a small multi-user RSS feed aggregator.
//!
//! The binary dispatches subcommands (`register`, `login`, `addfeed`,
//! `agg`, ...) against a SQLite-backed store of users, feeds, and
//! follows. The long-running piece is [`aggregator::Aggregator`], which
//! polls one feed per cycle, stalest first, and hands parsed items to a
//! pluggable sink.

pub mod aggregator;
pub mod app;
pub mod command;
pub mod config;
pub mod feed;
pub mod storage;
pub mod util;
