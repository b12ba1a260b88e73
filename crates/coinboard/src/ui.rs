use coinboard_warehouse::dashboard::{
    Bar, BarChart, Dominance, LineChart, Notice, NoticeLevel, Orientation, PercentRow, PriceRow,
    Sign,
};
use coinboard_warehouse::schema::crypto::index::LISTINGS_COLUMNS;
use coinboard_warehouse::schema::crypto::listings::Listings;
use coinboard_warehouse::Frame;
use colored::{Color, Colorize};
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt::Write;
use std::time::Duration;

const CHART_WIDTH: usize = 40;
const CHART_HEIGHT: usize = 8;
const SHARE_WIDTH: usize = 50;
const BLOCK: &str = "█";
const SPARKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

pub fn spinner(msg: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Page
//
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Title & "About" section; `logo` is the path & size of the logo asset, when it was found.
pub fn banner(logo: Option<(&str, usize)>) -> String {
    let mut out = String::new();
    if let Some((path, size)) = logo {
        let _ = writeln!(out, "{}", format!("[{path}, {size} bytes]").dimmed());
    }
    let _ = writeln!(out, "{}", "Crypto Web App".bold().underline());
    let _ = writeln!(
        out,
        "This app retrieves cryptocurrency data from the {}!",
        "CoinMarketCap API".bold()
    );
    let _ = writeln!(out, "{}", "About".bold());
    let _ = writeln!(
        out,
        "  * Data source: CoinMarketCap API (http://coinmarketcap.com/api) \
         and Yahoo Finance (https://finance.yahoo.com)."
    );
    out
}

/// Every section of a frame, in page order.
pub fn render(frame: &Frame) -> String {
    let mut out = String::new();
    out.push_str(&notices(&frame.notices));

    if let Some(chart) = &frame.percent_change {
        out.push_str(&bar_chart(chart));
        out.push('\n');
    }
    if let Some(chart) = &frame.market_cap {
        out.push_str(&bar_chart(chart));
        out.push('\n');
    }

    out.push_str(&subheader("Market Share of Top Cryptos"));
    if let Some(share) = &frame.dominance {
        out.push_str(&dominance(share));
    }
    out.push('\n');

    out.push_str(&subheader("Historical Price Data"));
    if let Some(chart) = &frame.history {
        out.push_str(&line_chart(chart));
    }
    out.push('\n');

    let _ = writeln!(out, "{}", "Tables".bold().underline());
    out.push_str(&subheader("Price Data of Selected Cryptocurrencies"));
    if !frame.price_table.is_empty() {
        out.push_str(&table(
            &PriceRow::COLUMNS,
            frame.price_table.iter().map(|row| row.cells().to_vec()),
        ));
    }
    if let Some(export) = &frame.export {
        let _ = writeln!(out, "{}", export.link.dimmed());
    }
    out.push('\n');

    out.push_str(&subheader("Percent Change Data of Select Cryptocurrencies"));
    if !frame.percent_table.is_empty() {
        out.push_str(&table(
            &PercentRow::COLUMNS,
            frame.percent_table.iter().map(|row| row.cells().to_vec()),
        ));
    }
    out
}

pub fn notices(notices: &[Notice]) -> String {
    let mut out = String::new();
    for notice in notices {
        let line = match notice.level {
            NoticeLevel::Error => format!("error: {}", notice.message).red().bold(),
            NoticeLevel::Warning => format!("warning: {}", notice.message).yellow(),
        };
        let _ = writeln!(out, "{line}");
    }
    out
}

fn subheader(title: &str) -> String {
    format!("{}\n", title.bold())
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Charts
//
////////////////////////////////////////////////////////////////////////////////////////////////////

pub fn bar_chart(chart: &BarChart) -> String {
    let mut out = subheader(&chart.title);
    let body = match chart.orientation {
        Orientation::Horizontal => horizontal_bars(&chart.bars),
        Orientation::Vertical => vertical_bars(&chart.bars),
    };
    out.push_str(&body);
    let _ = writeln!(out, "{}", chart.axis_label.dimmed());
    out
}

fn horizontal_bars(bars: &[Bar]) -> String {
    let max = max_abs(bars.iter().map(|bar| bar.value));
    let label_width = bars.iter().map(|bar| bar.label.len()).max().unwrap_or(0);

    // negative bars grow left of the axis, positive ones right
    let has_negative = bars.iter().any(|bar| bar.value < 0.0);
    let (left, right) = if has_negative {
        (CHART_WIDTH / 2, CHART_WIDTH / 2)
    } else {
        (0, CHART_WIDTH)
    };

    let mut out = String::new();
    for bar in bars {
        let (neg, pos) = if bar.value < 0.0 {
            (scaled(bar.value, max, left), 0)
        } else {
            (0, scaled(bar.value, max, right))
        };
        let _ = writeln!(
            out,
            "{:>label_width$} {}{}|{} {}",
            bar.label,
            " ".repeat(left - neg),
            BLOCK.repeat(neg).color(sign_color(bar.sign)),
            BLOCK.repeat(pos).color(sign_color(bar.sign)),
            compact(bar.value),
        );
    }
    out
}

fn vertical_bars(bars: &[Bar]) -> String {
    let max = max_abs(bars.iter().map(|bar| bar.value));
    let column = bars
        .iter()
        .map(|bar| bar.label.len().max(compact(bar.value).len()))
        .max()
        .unwrap_or(0)
        + 1;
    let heights: Vec<usize> = bars
        .iter()
        .map(|bar| scaled(bar.value, max, CHART_HEIGHT))
        .collect();

    let mut out = String::new();
    for level in (1..=CHART_HEIGHT).rev() {
        let row: String = heights
            .iter()
            .map(|&height| {
                let cell = if height >= level {
                    BLOCK.repeat(column - 1)
                } else {
                    " ".repeat(column - 1)
                };
                format!("{} ", cell.color(Color::Blue))
            })
            .collect();
        let _ = writeln!(out, "{}", row.trim_end());
    }
    let _ = writeln!(out, "{}", "─".repeat(column * bars.len()));
    let labels: String = bars
        .iter()
        .map(|bar| format!("{:<column$}", bar.label))
        .collect();
    let _ = writeln!(out, "{}", labels.trim_end());
    let values: String = bars
        .iter()
        .map(|bar| format!("{:<column$}", compact(bar.value)))
        .collect();
    let _ = writeln!(out, "{}", values.trim_end());
    out
}

/// Pie chart as one stacked bar plus a legend.
pub fn dominance(share: &Dominance) -> String {
    let colors = [Color::Blue, Color::Red, Color::Green];
    let slices = share.slices();

    // shares outside 0..=100 are clamped to the bar
    let width = |percent: f64| scaled(percent.clamp(0.0, 100.0), 100.0, SHARE_WIDTH);
    let mut widths = [0usize; 3];
    widths[0] = width(slices[0].1);
    widths[1] = width(slices[1].1).min(SHARE_WIDTH.saturating_sub(widths[0]));
    widths[2] = SHARE_WIDTH.saturating_sub(widths[0] + widths[1]);

    let mut out = String::new();
    for (width, color) in widths.iter().zip(colors) {
        let _ = write!(out, "{}", BLOCK.repeat(*width).color(color));
    }
    out.push('\n');
    for ((label, percent), color) in slices.iter().zip(colors) {
        let _ = writeln!(out, "{} {label} {percent:.1}%", "■".color(color));
    }
    out
}

pub fn line_chart(chart: &LineChart) -> String {
    let mut out = subheader(&chart.title);
    let closes: Vec<f64> = chart.points.iter().map(|point| point.close).collect();
    let _ = writeln!(out, "{}", sparkline(&closes).color(Color::Cyan));

    if let (Some(first), Some(last)) = (chart.points.first(), chart.points.last()) {
        let low = closes.iter().copied().fold(f64::INFINITY, f64::min);
        let high = closes.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let _ = writeln!(
            out,
            "{} .. {}  low {}  high {}  last {}",
            first.date,
            last.date,
            compact(low),
            compact(high),
            compact(last.close),
        );
    }
    let _ = writeln!(out, "{}", chart.axis_label.dimmed());
    out
}

pub fn sparkline(values: &[f64]) -> String {
    let low = values.iter().copied().fold(f64::INFINITY, f64::min);
    let high = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = high - low;
    let top = SPARKS.len() - 1;

    values
        .iter()
        .map(|value| {
            if span > 0.0 {
                SPARKS[(((value - low) / span) * top as f64).round() as usize]
            } else {
                SPARKS[top / 2]
            }
        })
        .collect()
}

fn sign_color(sign: Sign) -> Color {
    match sign {
        Sign::Positive => Color::Cyan,
        Sign::NonPositive => Color::Magenta,
    }
}

fn max_abs(values: impl Iterator<Item = f64>) -> f64 {
    values
        .filter(|value| value.is_finite())
        .map(f64::abs)
        .fold(0.0, f64::max)
}

fn scaled(value: f64, max: f64, width: usize) -> usize {
    if max <= 0.0 || !value.is_finite() {
        return 0;
    }
    ((value.abs() / max) * width as f64).round() as usize
}

/// Short human form of large numbers: `1.23T`, `4.56B`, `7.89M`, `1.50K`.
pub fn compact(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1e12 {
        format!("{:.2}T", value / 1e12)
    } else if abs >= 1e9 {
        format!("{:.2}B", value / 1e9)
    } else if abs >= 1e6 {
        format!("{:.2}M", value / 1e6)
    } else if abs >= 1e3 {
        format!("{:.2}K", value / 1e3)
    } else {
        format!("{value:.2}")
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//
// Tables
//
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Left-aligned text columns, padded to their widest cell.
pub fn table<I>(header: &[&str], rows: I) -> String
where
    I: IntoIterator<Item = Vec<String>>,
{
    let rows: Vec<Vec<String>> = rows.into_iter().collect();
    let widths: Vec<usize> = header
        .iter()
        .enumerate()
        .map(|(i, title)| {
            rows.iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .chain([title.len()])
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: Vec<String>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    let titles = line(header.iter().map(|title| title.to_string()).collect());
    let _ = writeln!(out, "{}", titles.bold());
    for row in rows {
        let _ = writeln!(out, "{}", line(row));
    }
    out
}

pub fn listings_table(listings: &Listings) -> String {
    table(
        &LISTINGS_COLUMNS,
        listings.rows.iter().map(|row| {
            vec![
                row.name.clone(),
                row.symbol.clone(),
                row.market_cap.to_string(),
                row.percent_change_1h.to_string(),
                row.percent_change_24h.to_string(),
                row.percent_change_7d.to_string(),
                row.price.to_string(),
                row.volume_24h.to_string(),
            ]
        }),
    )
}
