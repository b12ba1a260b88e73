use crate::schema::crypto::history::{PricePoint, PriceSeries};
use crate::schema::crypto::index::{Currency, Window, PERCENT_COLUMNS, PRICE_COLUMNS};
use crate::schema::crypto::listings::{Listing, Listings};
use thiserror::Error;

pub const EXPORT_FILENAME: &str = "crypto_data.csv";

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Charts
//
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Bars are coloured by sign, with the threshold at zero (zero itself is not positive).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Sign {
    Positive,
    NonPositive,
}

impl Sign {
    pub fn of(value: f64) -> Self {
        if value > 0.0 {
            Sign::Positive
        } else {
            Sign::NonPositive
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: f64,
    pub sign: Sign,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BarChart {
    pub title: String,
    pub axis_label: String,
    pub orientation: Orientation,
    pub bars: Vec<Bar>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LineChart {
    pub title: String,
    pub axis_label: String,
    pub points: Vec<PricePoint>,
}

/// Bitcoin, Ethereum & everything else, as percentages of the listings' total market cap.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Dominance {
    pub bitcoin: f64,
    pub ethereum: f64,
    pub other: f64,
}

impl Dominance {
    pub const LABELS: [&'static str; 3] = ["Bitcoin", "Ethereum", "Alt Coins"];

    /// Pie slices as `(label, percent)`.
    pub fn slices(&self) -> [(&'static str, f64); 3] {
        [
            (Self::LABELS[0], self.bitcoin),
            (Self::LABELS[1], self.ethereum),
            (Self::LABELS[2], self.other),
        ]
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DominanceError {
    #[error("{0} is not among the fetched listings; market share unavailable")]
    Missing(&'static str),

    #[error("total market cap is not positive; market share unavailable")]
    EmptyTotal,
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Tables
//
////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Clone, Debug, PartialEq)]
pub struct PriceRow {
    pub coin_name: String,
    pub coin_symbol: String,
    pub market_cap: f64,
    pub price: f64,
    pub volume_24h: f64,
}

impl PriceRow {
    pub const COLUMNS: [&'static str; 5] = PRICE_COLUMNS;

    /// Cells as text, in column order.
    pub fn cells(&self) -> [String; 5] {
        [
            self.coin_name.clone(),
            self.coin_symbol.clone(),
            self.market_cap.to_string(),
            self.price.to_string(),
            self.volume_24h.to_string(),
        ]
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PercentRow {
    pub coin_name: String,
    pub coin_symbol: String,
    pub percent_change_1h: f64,
    pub percent_change_24h: f64,
    pub percent_change_7d: f64,
}

impl PercentRow {
    pub const COLUMNS: [&'static str; 5] = PERCENT_COLUMNS;

    pub fn cells(&self) -> [String; 5] {
        [
            self.coin_name.clone(),
            self.coin_symbol.clone(),
            self.percent_change_1h.to_string(),
            self.percent_change_24h.to_string(),
            self.percent_change_7d.to_string(),
        ]
    }
}

/// The filtered price table, encoded for download.
#[derive(Clone, Debug, PartialEq)]
pub struct CsvExport {
    pub filename: String,
    pub csv: String,
    /// `<a href="data:file/csv;base64,...">` anchor for browsers.
    pub link: String,
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// View functions
//
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Rows of the selected symbols, in listing order.
pub fn filter<'a>(listings: &'a Listings, symbols: &[String]) -> Vec<&'a Listing> {
    listings
        .rows
        .iter()
        .filter(|row| symbols.contains(&row.symbol))
        .collect()
}

/// Percent change over `window`, ascending, coloured by sign.
pub fn percent_change_chart(rows: &[&Listing], window: Window) -> Option<BarChart> {
    if rows.is_empty() {
        return None;
    }

    let mut bars: Vec<Bar> = rows
        .iter()
        .map(|row| {
            let value = row.percent_change(window);
            Bar {
                label: row.symbol.clone(),
                value,
                sign: Sign::of(value),
            }
        })
        .collect();
    bars.sort_by(|a, b| a.value.total_cmp(&b.value));

    Some(BarChart {
        title: format!("Bar plot of % Price Change (Last {window})"),
        axis_label: "Percent Change".to_string(),
        orientation: Orientation::Horizontal,
        bars,
    })
}

/// Market cap of the selected coins, in listing order.
pub fn market_cap_chart(rows: &[&Listing]) -> Option<BarChart> {
    if rows.is_empty() {
        return None;
    }

    Some(BarChart {
        title: "Bar plot of Market Cap (Selected Cryptos)".to_string(),
        axis_label: "Market Cap".to_string(),
        orientation: Orientation::Vertical,
        bars: rows
            .iter()
            .map(|row| Bar {
                label: row.symbol.clone(),
                value: row.market_cap,
                sign: Sign::of(row.market_cap),
            })
            .collect(),
    })
}

/// Market share of Bitcoin & Ethereum within *all* listings, not just the selection.
pub fn dominance(listings: &Listings) -> Result<Dominance, DominanceError> {
    let bitcoin = listings
        .get("BTC")
        .ok_or(DominanceError::Missing("BTC"))?
        .market_cap;
    let ethereum = listings
        .get("ETH")
        .ok_or(DominanceError::Missing("ETH"))?
        .market_cap;

    let total = listings.total_market_cap();
    if total <= 0.0 {
        return Err(DominanceError::EmptyTotal);
    }

    let bitcoin = bitcoin / total * 100.0;
    let ethereum = ethereum / total * 100.0;
    Ok(Dominance {
        bitcoin,
        ethereum,
        other: 100.0 - (bitcoin + ethereum),
    })
}

pub fn history_chart(
    series: &PriceSeries,
    symbol: &str,
    currency: Currency,
    days: u32,
) -> Option<LineChart> {
    if series.is_empty() {
        return None;
    }

    Some(LineChart {
        title: format!("{symbol} over the last {days} days"),
        axis_label: format!("Closing Price ({currency})"),
        points: series.points.clone(),
    })
}

pub fn price_table(rows: &[&Listing]) -> Vec<PriceRow> {
    rows.iter()
        .map(|row| PriceRow {
            coin_name: row.name.clone(),
            coin_symbol: row.symbol.clone(),
            market_cap: row.market_cap,
            price: row.price,
            volume_24h: row.volume_24h,
        })
        .collect()
}

pub fn percent_table(rows: &[&Listing]) -> Vec<PercentRow> {
    rows.iter()
        .map(|row| PercentRow {
            coin_name: row.name.clone(),
            coin_symbol: row.symbol.clone(),
            percent_change_1h: row.percent_change_1h,
            percent_change_24h: row.percent_change_24h,
            percent_change_7d: row.percent_change_7d,
        })
        .collect()
}

/// Encode the price table as CSV, plus a browser download link of it.
pub fn export_csv(rows: &[PriceRow]) -> anyhow::Result<CsvExport> {
    let csv = coinboard_util::csv_string(&PriceRow::COLUMNS, rows.iter().map(PriceRow::cells))?;
    let link = coinboard_util::download_link(&csv, EXPORT_FILENAME);
    Ok(CsvExport {
        filename: EXPORT_FILENAME.to_string(),
        csv,
        link,
    })
}
