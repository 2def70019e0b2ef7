//! Client commands against a running server: `show`, `add-card`,
//! `move-card`, `move-column`, `export`.

use std::path::Path;

use anyhow::{Context, Result};

use tackboard::board::client::{BoardClient, MoveOutcome};
use tackboard::board::models::CardRequest;
use tackboard::board::ordering::DropTarget;
use tackboard::board::views::{CardFilter, render_board};
use tackboard::config::BoardConfig;

/// Build a client for `url`, or the configured server when not given.
pub fn board_client(config: &BoardConfig, url: Option<&str>) -> Result<BoardClient> {
    let base_url = url.unwrap_or(&config.client.base_url);
    BoardClient::new(base_url, config.client.timeout())
        .with_context(|| format!("Failed to create client for {}", base_url))
}

pub async fn cmd_show(
    client: &BoardClient,
    config: &BoardConfig,
    filter: &CardFilter,
    watch: bool,
) -> Result<()> {
    print_board(client, filter).await?;
    if !watch {
        return Ok(());
    }

    let mut interval = tokio::time::interval(config.client.poll_interval());
    interval.tick().await;
    loop {
        tokio::select! {
            _ = interval.tick() => {
                // A failed refresh keeps the last rendering; the next tick retries.
                if let Err(e) = print_board(client, filter).await {
                    tracing::warn!(error = %e, "Board refresh failed");
                }
            }
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
    }
}

async fn print_board(client: &BoardClient, filter: &CardFilter) -> Result<()> {
    let view = client
        .fetch_board()
        .await
        .with_context(|| format!("Failed to fetch board from {}", client.base_url()))?;
    let today = chrono::Utc::now().date_naive();
    let cards = filter.apply(&view, today);
    println!("{}", render_board(&view, &cards));
    if !filter.is_empty() {
        println!("({} of {} cards shown)", cards.len(), view.cards.len());
    }
    Ok(())
}

pub async fn cmd_add_card(client: &BoardClient, req: CardRequest) -> Result<()> {
    let card = client.create_card(&req).await.context("Failed to add card")?;
    println!(
        "Added card #{} \"{}\" to column {} at position {}",
        card.id, card.title, card.column_id, card.order_index
    );
    Ok(())
}

pub async fn cmd_move_card(client: &BoardClient, card_id: i64, target: DropTarget) -> Result<()> {
    let mut view = client.fetch_board().await.context("Failed to fetch board")?;
    let outcome = client
        .move_card(&mut view, card_id, Some(target))
        .await
        .with_context(|| format!("Failed to move card {}", card_id))?;
    match outcome {
        MoveOutcome::Unchanged => println!("Card #{} is already there", card_id),
        MoveOutcome::Applied { entries } => {
            let card = view.cards.iter().find(|c| c.id == card_id);
            match card {
                Some(card) => println!(
                    "Moved card #{} to column {} at position {} ({} cards renumbered)",
                    card_id, card.column_id, card.order_index, entries
                ),
                None => println!("Moved card #{}", card_id),
            }
        }
    }
    Ok(())
}

pub async fn cmd_move_column(client: &BoardClient, column_id: i64, position: usize) -> Result<()> {
    let mut view = client.fetch_board().await.context("Failed to fetch board")?;
    let outcome = client
        .move_column(&mut view, column_id, position)
        .await
        .with_context(|| format!("Failed to move column {}", column_id))?;
    match outcome {
        MoveOutcome::Unchanged => println!("Column #{} is already at position {}", column_id, position),
        MoveOutcome::Applied { .. } => {
            let order: Vec<&str> = view.columns.iter().map(|c| c.title.as_str()).collect();
            println!("Column order: {}", order.join(" | "));
        }
    }
    Ok(())
}

pub async fn cmd_export(client: &BoardClient, output: Option<&Path>) -> Result<()> {
    let export = client.export_board().await.context("Failed to export board")?;
    let json = serde_json::to_string_pretty(&export).context("Failed to serialize export")?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write export to {}", path.display()))?;
            println!(
                "Exported {} columns, {} cards, {} members to {}",
                export.columns.len(),
                export.cards.len(),
                export.members.len(),
                path.display()
            );
        }
        None => println!("{}", json),
    }
    Ok(())
}
