use crate::{draw, Board};
use anyhow::Result;
use coinboard_warehouse::schema::crypto::index::{Currency, Window};
use coinboard_warehouse::{Frame, Selection};
use dialoguer::{theme::ColorfulTheme, FuzzySelect, Input, MultiSelect, Select};
use tracing::{debug, info, warn};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Action {
    Currency,
    Coins,
    Window,
    History,
    Export,
    Refresh,
    Quit,
}

impl Action {
    const ALL: [Action; 7] = [
        Action::Currency,
        Action::Coins,
        Action::Window,
        Action::History,
        Action::Export,
        Action::Refresh,
        Action::Quit,
    ];

    fn label(&self) -> &'static str {
        match self {
            Action::Currency => "Select currency for price",
            Action::Coins => "Cryptocurrency",
            Action::Window => "Percent change time frame",
            Action::History => "Select coin for historical data",
            Action::Export => "Export price table as CSV",
            Action::Refresh => "Refresh market data",
            Action::Quit => "Quit",
        }
    }
}

/// Menu loop: every change to the selection goes back through the dashboard's event handler.
pub async fn run(dashboard: &mut Board, mut selection: Selection) -> Result<()> {
    let theme = ColorfulTheme::default();
    let mut frame = draw(dashboard, &selection).await;

    loop {
        let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();
        let choice = Select::with_theme(&theme)
            .with_prompt("Input Options")
            .default(0)
            .items(&labels)
            .interact()?;
        let action = Action::ALL[choice];
        debug!("interactive action: {action:?}");

        selection = match action {
            Action::Currency => {
                let current = Currency::ALL
                    .iter()
                    .position(|c| *c == selection.currency)
                    .unwrap_or(0);
                let picked = Select::with_theme(&theme)
                    .with_prompt(action.label())
                    .default(current)
                    .items(&Currency::ALL)
                    .interact()?;
                selection.with_currency(Currency::ALL[picked])
            }

            Action::Coins => match pick_coins(&theme, &frame, &selection)? {
                Some(symbols) => selection.with_symbols(symbols),
                None => continue,
            },

            Action::Window => {
                let current = Window::ALL
                    .iter()
                    .position(|w| *w == selection.window)
                    .unwrap_or(0);
                let picked = Select::with_theme(&theme)
                    .with_prompt(action.label())
                    .default(current)
                    .items(&Window::ALL)
                    .interact()?;
                selection.with_window(Window::ALL[picked])
            }

            Action::History => {
                if frame.available.is_empty() {
                    warn!("no listings loaded; nothing to pick from");
                    continue;
                }
                let current = frame
                    .history_symbol
                    .as_ref()
                    .and_then(|s| frame.available.iter().position(|a| a == s))
                    .unwrap_or(0);
                let picked = FuzzySelect::with_theme(&theme)
                    .with_prompt(action.label())
                    .default(current)
                    .items(&frame.available)
                    .interact()?;
                selection.with_history_symbol(Some(&frame.available[picked]))
            }

            Action::Export => {
                export(&theme, &frame).await?;
                continue;
            }

            Action::Refresh => {
                dashboard.refresh();
                selection
            }

            Action::Quit => break,
        };

        frame = draw(dashboard, &selection).await;
    }

    Ok(())
}

/// `None` when there is nothing to choose from.
fn pick_coins(
    theme: &ColorfulTheme,
    frame: &Frame,
    selection: &Selection,
) -> Result<Option<Vec<String>>> {
    if frame.available.is_empty() {
        warn!("no listings loaded; nothing to pick from");
        return Ok(None);
    }

    let checked: Vec<bool> = frame
        .available
        .iter()
        .map(|symbol| selection.contains(symbol))
        .collect();
    let picked = MultiSelect::with_theme(theme)
        .with_prompt(Action::Coins.label())
        .items(&frame.available)
        .defaults(&checked)
        .interact()?;

    Ok(Some(
        picked
            .into_iter()
            .map(|i| frame.available[i].clone())
            .collect(),
    ))
}

async fn export(theme: &ColorfulTheme, frame: &Frame) -> Result<()> {
    let Some(export) = &frame.export else {
        warn!("the price table is empty; nothing to export");
        return Ok(());
    };

    let path: String = Input::with_theme(theme)
        .with_prompt("Write CSV to")
        .default(export.filename.clone())
        .interact_text()?;
    coinboard_util::write_file(&path, export.csv.as_bytes()).await?;
    info!("Price table written to {path}");
    Ok(())
}
