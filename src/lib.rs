//! Read-only decoder for SQLite database files: the fixed 100-byte header,
//! the b-tree page layer, and the self-describing record encoding.

pub mod db;
