pub mod common;
pub mod criteria;
pub mod domain;
pub mod service;
pub mod storage;

pub use common::error::{MarketError, Result};
pub use criteria::Criteria;
pub use domain::*;
pub use service::{Actor, Market};
pub use storage::{Database, Entity, Pageable, SqlRepository};
