//! Terminal rendering of journal projections.

use anyhow::Result;

use trading_journal_core::{Entry, JournalView, Outcome, Stats};

pub fn print_entries(entries: &[&Entry], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("No entries.");
        return Ok(());
    }
    for entry in entries {
        let marker = match entry.outcome() {
            Outcome::Profit => "▲",
            Outcome::Loss => "▼",
        };
        let symbol = entry
            .trade
            .as_ref()
            .map(|t| format!(" [{} {}]", t.symbol, t.side))
            .unwrap_or_default();
        let images = match entry.images.len() {
            0 => String::new(),
            n => format!(" ({n} image{})", if n == 1 { "" } else { "s" }),
        };
        println!(
            "{} {} {:>10}{}  {}{}\n    id: {}",
            entry.date,
            marker,
            entry.display_amount(),
            symbol,
            entry.description,
            images,
            entry.id
        );
    }
    Ok(())
}

/// Rendered view as JSON, or the projected entries and their stats as text.
pub fn print_view(view: &JournalView, entries: &[&Entry], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(view)?);
        return Ok(());
    }
    print_entries(entries, false)?;
    println!();
    print_stats(&view.stats, false)
}

pub fn print_stats(stats: &Stats, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(stats)?);
        return Ok(());
    }
    println!("Trades:   {}", stats.total_trades);
    println!("Profit:   {:.2}", stats.total_profit);
    println!("Loss:     {:.2}", stats.total_loss);
    println!("Net:      {:.2}", stats.net);
    println!("Win rate: {:.1}%", stats.win_rate_pct());
    println!("Average:  {:.2}", stats.average_amount);
    Ok(())
}
