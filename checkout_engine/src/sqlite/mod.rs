//! The SQLite backend for the checkout engine.
pub mod db;
mod sqlite_impl;

pub use sqlite_impl::SqliteDatabase;
