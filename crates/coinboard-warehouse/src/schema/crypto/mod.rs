pub mod history;
pub mod index;
pub mod listings;
