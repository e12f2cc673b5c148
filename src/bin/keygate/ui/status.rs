//! Status bar - device state, sample rate, and signal stats

use keygate::input::poller::DeviceStatus;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Signal statistics for display
pub struct SignalStats {
    pub peak: f32,
    pub rms: f32,
}

impl SignalStats {
    pub fn from_buffer(buffer: &[f32]) -> Self {
        if buffer.is_empty() {
            return Self { peak: 0.0, rms: 0.0 };
        }
        let peak = buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        let rms = (buffer.iter().map(|&x| x * x).sum::<f32>() / buffer.len() as f32).sqrt();
        Self { peak, rms }
    }
}

fn status_color(status: DeviceStatus) -> Color {
    match status {
        DeviceStatus::Ready => Color::Green,
        DeviceStatus::Opening | DeviceStatus::Degraded => Color::Yellow,
        DeviceStatus::Unavailable | DeviceStatus::Stopped => Color::Red,
    }
}

/// Render the status bar
pub fn render_status(
    frame: &mut Frame,
    area: Rect,
    device: &str,
    status: DeviceStatus,
    sample_rate: f32,
    key_down: bool,
    stats: &SignalStats,
) {
    let block = Block::default().title(" keygate ").borders(Borders::ALL);

    let line = Line::from(vec![
        Span::styled(format!(" {device}  "), Style::default().fg(Color::White)),
        Span::styled(
            format!("{}  ", status.label()),
            Style::default().fg(status_color(status)),
        ),
        Span::styled(
            if key_down { "● key  " } else { "○ key  " },
            Style::default().fg(if key_down {
                Color::LightRed
            } else {
                Color::DarkGray
            }),
        ),
        Span::styled(
            format!("{:.1}kHz  ", sample_rate / 1000.0),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("Peak: {:.2}  RMS: {:.2}", stats.peak, stats.rms),
            Style::default().fg(Color::Magenta),
        ),
    ]);

    let paragraph = Paragraph::new(line).block(block);
    frame.render_widget(paragraph, area);
}
