//! Repository traits and their two implementations.
//!
//! [`StoreRepository`] runs every call against an [`EntityStore`](crate::EntityStore)
//! and attaches its fixed relation list to each record read.
//! [`CachedRepository`] wraps any repository, serves reads from a
//! [`RepoCache`](crate::RepoCache) and forwards writes untouched.

mod base;
mod cached;
mod store_repository;

pub use base::{
    EntityRepository, ReadRepository, Repository, WriteRepository, DEFAULT_ORDER_BY,
};
pub use cached::CachedRepository;
pub use store_repository::StoreRepository;
