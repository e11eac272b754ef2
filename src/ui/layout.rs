use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Row, Table},
    Frame,
};

use crate::models::{format_usd, Side};

use super::{format_timestamp, Snapshot, NO_WHALES_PLACEHOLDER};

/// Alerts listed in the footer.
const FOOTER_ALERTS: usize = 3;

/// Render the full screen: header, ranked whale table, status footer.
pub fn render_layout(f: &mut Frame, snapshot: &Snapshot) {
    let alert_lines = snapshot.alerts.len().min(FOOTER_ALERTS) as u16;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),               // Header
            Constraint::Min(0),                  // Whale table
            Constraint::Length(4 + alert_lines), // Footer
        ])
        .split(f.area());

    render_header(f, chunks[0]);
    render_whale_table(f, chunks[1], snapshot);
    render_footer(f, chunks[2], snapshot);
}

fn render_header(f: &mut Frame, area: Rect) {
    let text = vec![Line::from(vec![
        Span::styled(
            "Polymarket Whale Tracker",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" - press Ctrl+C to stop"),
    ])];

    f.render_widget(
        Paragraph::new(text).block(Block::default().borders(Borders::ALL)),
        area,
    );
}

fn render_whale_table(f: &mut Frame, area: Rect, snapshot: &Snapshot) {
    let header = Row::new(vec!["Wallet", "Amount (USD)", "Side", "Market", "Time"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = if snapshot.rows.is_empty() {
        vec![Row::new(vec!["-", "-", "-", NO_WHALES_PLACEHOLDER, "-"])
            .style(Style::default().fg(Color::DarkGray))]
    } else {
        snapshot
            .rows
            .iter()
            .map(|trade| {
                let color = match trade.side {
                    Side::Buy => Color::Green,
                    Side::Sell => Color::Red,
                    Side::Unknown => Color::Gray,
                };
                Row::new(vec![
                    trade.wallet_short(),
                    format_usd(trade.usd_notional),
                    trade.side.to_string(),
                    trade.market_label.clone(),
                    format_timestamp(trade.timestamp, "%H:%M:%S UTC"),
                ])
                .style(Style::default().fg(color))
            })
            .collect()
    };

    let widths = [
        Constraint::Length(16), // Wallet
        Constraint::Length(16), // Amount
        Constraint::Length(8),  // Side
        Constraint::Min(30),    // Market
        Constraint::Length(13), // Time
    ];

    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Whale Trades"),
    );

    f.render_widget(table, area);
}

fn render_footer(f: &mut Frame, area: Rect, snapshot: &Snapshot) {
    let status_color = if snapshot.summary.ends_with("DEGRADED") {
        Color::Yellow
    } else {
        Color::Green
    };

    let mut text = vec![Line::from(Span::styled(
        snapshot.summary.clone(),
        Style::default().fg(status_color),
    ))];

    let markets = if snapshot.top_markets.is_empty() {
        "-".to_string()
    } else {
        snapshot.top_markets.join(", ")
    };
    text.push(Line::from(vec![
        Span::styled("Top Markets by Volume: ", Style::default().fg(Color::Cyan)),
        Span::styled(markets, Style::default().add_modifier(Modifier::DIM)),
    ]));

    for alert in snapshot.alerts.iter().rev().take(FOOTER_ALERTS) {
        text.push(Line::from(Span::styled(
            alert.clone(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
    }

    f.render_widget(
        Paragraph::new(text).block(Block::default().borders(Borders::ALL).title("Status")),
        area,
    );
}
