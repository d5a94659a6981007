// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

mod entry;
mod file_store;
mod kv_store;
mod store;

pub use entry::{HistoryEntry, MethodHistoryEntry};
pub use file_store::FileStore;
pub use kv_store::{KeyValueStore, MemoryStore, StoreError};
pub use store::HistoryStore;
