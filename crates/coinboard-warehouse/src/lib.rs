pub mod api;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod schema;

pub use crate::config::Config;
pub use crate::dashboard::{Dashboard, Frame, Notice, NoticeLevel, Selection};
pub use crate::error::{FetchError, NormalizeError};
