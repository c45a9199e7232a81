//! End-to-end tests at the wire request/response level.
//!
//! Each test file covers a specific scenario, starting from an empty
//! database directory and driving a real server over TCP.

#![cfg(test)]

mod test_btree_range;
mod test_concurrent_writers;
mod test_delete_index_maintenance;
mod test_insert_find;
mod test_like_patterns;
mod test_mixed_type_field;
mod test_persistence;
mod test_protocol_errors;
