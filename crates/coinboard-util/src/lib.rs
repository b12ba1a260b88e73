pub mod export;
pub mod fs;

pub use crate::export::{csv_string, data_uri, download_link};
pub use crate::fs::{read_asset, read_json, write_file};
