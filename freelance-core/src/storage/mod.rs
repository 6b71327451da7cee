pub mod codec;
pub mod database;
pub mod entity;
pub mod object_store;
pub mod page;
pub mod repository;
pub mod schema;
pub mod sql;

pub use database::Database;
pub use entity::Entity;
pub use object_store::{FsObjectStore, MemoryObjectStore, ObjectStore};
pub use page::{Page, Pageable};
pub use repository::SqlRepository;
