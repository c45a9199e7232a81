// Life of a request:
// 1. A newline-framed JSON object comes in on the socket
// 2. Decode / validate the frame into a Request
// 3. Look up the collection in the registry (materialising it from disk
//    on first reference) and take the matching side of its gate:
//     - insert / delete / create_index: write side, bounded 5s wait
//     - find: read side
// 4. Run the operation in the storage engine; writes end with a save
// 5. Project the outcome into a Response and write it back as one frame
//
// System components:
//  - Storage engine (per-collection store + hash/B-tree indexes)
//  - Query evaluator and index planner
//  - Collection registry with per-collection reader/writer gates
//  - TCP accept loop with one handler task per connection

pub mod client_connection;
pub mod collection_registry;
pub mod config;
pub mod error;
pub mod query;
pub mod server;
pub mod storage;
pub mod wire;

#[cfg(test)]
mod e2e_tests;
#[cfg(test)]
pub(crate) mod testing;

pub use client_connection::ClientConnection;
pub use collection_registry::CollectionRegistry;
pub use server::Server;
