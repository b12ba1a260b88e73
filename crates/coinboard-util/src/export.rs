use anyhow::Result;
use base64::prelude::{Engine, BASE64_STANDARD};

/// Encode a table as CSV: comma-delimited, UTF-8, one header row, no index column.
///
/// ```rust
/// let csv = csv_string(&["coin_symbol", "price"], [vec!["BTC".to_string(), "30000".to_string()]])?;
/// assert_eq!(csv, "coin_symbol,price\nBTC,30000\n");
/// ```
pub fn csv_string<I, R>(header: &[&str], rows: I) -> Result<String>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator,
    R::Item: AsRef<[u8]>,
{
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row)?;
    }
    let bytes = writer.into_inner()?;
    Ok(String::from_utf8(bytes)?)
}

/// `data:` URI of some bytes, base64 encoded.
pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", BASE64_STANDARD.encode(bytes))
}

/// HTML anchor which downloads `csv` as `filename` straight from the browser.
pub fn download_link(csv: &str, filename: &str) -> String {
    let href = data_uri("file/csv", csv.as_bytes());
    format!(r#"<a href="{href}" download="{filename}">Download CSV File</a>"#)
}
