//! Storage abstractions for service layer
//!
//! File-backed stores that keep a whole collection in memory and rewrite the
//! backing JSON file in full on every change.

pub mod json_list_store;
