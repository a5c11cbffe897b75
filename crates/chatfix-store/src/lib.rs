pub mod db;
pub mod error;

pub use db::{
    INDEX_KEY, MODEL_CACHE_KEY, STATE_CACHE_KEY, StoreSnapshot, WriteReceipt, read, write,
};
pub use error::{Error, Result};
