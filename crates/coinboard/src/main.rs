use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands::*};
use coinboard_warehouse::api::{build_client, Http};
use coinboard_warehouse::schema::crypto::history::{DateWindow, HistoryQuery, YahooFinance};
use coinboard_warehouse::schema::crypto::listings::{ListingsQuery, ListingsSource};
use coinboard_warehouse::{Config, Frame, Notice, Selection};
use dotenv::dotenv;
use std::path::Path;
use tracing::{debug, error, info, subscriber, trace, warn, Level};
use tracing_subscriber::FmtSubscriber;

mod cli;
mod interactive;
mod ui;

type Board = coinboard_warehouse::Dashboard<ListingsSource, YahooFinance>;

fn preprocess(trace_level: Level) -> Result<()> {
    dotenv().ok();
    let my_subscriber = FmtSubscriber::builder()
        .with_max_level(trace_level)
        .finish();
    subscriber::set_global_default(my_subscriber)?;
    Ok(())
}

/// Recompute the frame for `selection`, then print it.
async fn draw(dashboard: &mut Board, selection: &Selection) -> Frame {
    let pb = ui::spinner("Fetching market data");
    let frame = dashboard.on_selection(selection).await;
    pb.finish_and_clear();
    println!("{}", ui::render(&frame));
    frame
}

/// Logo asset for the banner; a missing file only warns.
async fn logo(path: &Path) -> (Option<(String, usize)>, Option<Notice>) {
    match coinboard_util::read_asset(path).await {
        Ok(bytes) => (Some((path.display().to_string(), bytes.len())), None),
        Err(e) => {
            warn!("{e}");
            let notice = Notice::warning(format!(
                "{} not found. Please make sure it's in the working directory.",
                path.display()
            ));
            (None, Some(notice))
        }
    }
}

async fn header(config: &Config) {
    let (asset, notice) = logo(&config.logo_path).await;
    let asset = asset.as_ref().map(|(path, size)| (path.as_str(), *size));
    println!("{}", ui::banner(asset));
    if let Some(notice) = notice {
        print!("{}", ui::notices(&[notice]));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    preprocess(cli.trace.into())?;
    trace!("Command line input recorded: {cli:#?}");

    let config = Config::from_env()?;
    debug!(
        "Listings limit {}, cached for {:?}; history over {} days",
        config.listings_limit, config.listings_ttl, config.history_days
    );
    let http_client = build_client(&config)?;

    ////////////////////////////////////////////////////////////////////////////////////////////////////

    // cli framework:
    // "> coinboard <COMMAND>"
    match &cli.command {
        // "> coinboard dashboard [--currency --symbols --window --history --export]"
        // one frame for one selection
        Dashboard { selection, export } => {
            let listings = ListingsSource::new(&config, selection.listings_file.as_deref());
            let mut dashboard = Board::new(
                http_client,
                listings,
                YahooFinance::from_config(&config),
                &config,
            );

            header(&config).await;
            let frame = draw(&mut dashboard, &selection.selection()).await;

            if let Some(path) = export {
                match &frame.export {
                    Some(csv) => {
                        coinboard_util::write_file(path, csv.csv.as_bytes()).await?;
                        info!("Price table written to {}", path.display());
                    }
                    None => warn!("the price table is empty; nothing written"),
                }
            }
        }

        // ---------------------------------------------------------------------------
        // "> coinboard listings [--currency --limit]"
        Listings {
            currency,
            limit,
            listings_file,
        } => {
            let source = ListingsSource::new(&config, listings_file.as_deref());
            let query = ListingsQuery {
                currency: (*currency).into(),
                limit: limit.unwrap_or(config.listings_limit),
            };

            let pb = ui::spinner("Fetching listings");
            let result = source.fetch(&http_client, &query).await;
            pb.finish_and_clear();
            match result {
                Ok(listings) => print!("{}", ui::listings_table(&listings)),
                Err(e) => {
                    error!("Listings fetch failed: {e}");
                    return Err(e.into());
                }
            }
        }

        // ---------------------------------------------------------------------------
        // "> coinboard history <SYMBOL> [--currency --days]"
        History {
            symbol,
            currency,
            days,
        } => {
            let days = days.unwrap_or(config.history_days);
            let today = chrono::Utc::now().date_naive();
            let query = HistoryQuery {
                symbol: symbol.trim().to_uppercase(),
                currency: (*currency).into(),
                window: DateWindow::trailing(today, days),
            };

            let pb = ui::spinner(format!("Fetching {}", query.ticker()));
            let result = YahooFinance::from_config(&config)
                .fetch(&http_client, &query)
                .await;
            pb.finish_and_clear();
            match result {
                Ok(series) => {
                    let chart = coinboard_warehouse::dashboard::history_chart(
                        &series,
                        &query.symbol,
                        query.currency,
                        days,
                    );
                    if let Some(chart) = chart {
                        print!("{}", ui::line_chart(&chart));
                    }
                    print!(
                        "{}",
                        ui::table(
                            &["date", "close"],
                            series
                                .points
                                .iter()
                                .map(|point| vec![point.date.to_string(), point.close.to_string()]),
                        )
                    );
                }
                Err(e) => {
                    error!("History fetch failed for {}: {e}", query.ticker());
                    return Err(e.into());
                }
            }
        }

        // ---------------------------------------------------------------------------
        // "> coinboard export [--currency --symbols --output]"
        Export { selection, output } => {
            use coinboard_warehouse::dashboard::{export_csv, filter, price_table};

            let source = ListingsSource::new(&config, selection.listings_file.as_deref());
            let selection = selection.selection();
            let query = ListingsQuery {
                currency: selection.currency,
                limit: config.listings_limit,
            };

            let pb = ui::spinner("Fetching listings");
            let result = source.fetch(&http_client, &query).await;
            pb.finish_and_clear();
            let listings = result.inspect_err(|e| error!("Listings fetch failed: {e}"))?;

            let rows = price_table(&filter(&listings, &selection.symbols));
            if rows.is_empty() {
                anyhow::bail!("none of {:?} is listed; nothing to export", selection.symbols);
            }
            let export = export_csv(&rows)?;
            coinboard_util::write_file(output, export.csv.as_bytes()).await?;
            info!("Price table written to {}", output.display());
        }

        ////////////////////////////////////////////////////////////////////////////////////////////////////

        // "> coinboard interactive"
        // menus edit the selection; every change re-renders
        Interactive { selection } => {
            let listings = ListingsSource::new(&config, selection.listings_file.as_deref());
            let mut dashboard = Board::new(
                http_client,
                listings,
                YahooFinance::from_config(&config),
                &config,
            );

            header(&config).await;
            interactive::run(&mut dashboard, selection.selection()).await?;
        }
    }

    Ok(())
}
