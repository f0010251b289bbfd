//! Relational storage behind the cache: the `stars` table, its migration, database drivers and the
//! [`StorageGateway`](crate::traits::StorageGateway) implementation over them.
pub mod driver;
pub mod entity;
pub mod gateway;
pub mod migrations;

pub use gateway::DbGateway;
