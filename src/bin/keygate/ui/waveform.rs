//! Scope chart: the signal and the key gate on shared axes.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

fn points(trace: &[f32]) -> Vec<(f64, f64)> {
    trace
        .iter()
        .enumerate()
        .map(|(i, &sample)| (i as f64, sample as f64))
        .collect()
}

/// Render the trigger-aligned sweep.
pub fn render_waveform(frame: &mut Frame, area: Rect, signal: &[f32], gate: &[f32]) {
    let block = Block::default().title(" Scope ").borders(Borders::ALL);

    let signal_data = points(signal);
    let gate_data = points(gate);

    let datasets = vec![
        Dataset::default()
            .name("signal")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Cyan))
            .data(&signal_data),
        Dataset::default()
            .name("gate")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::LightRed))
            .data(&gate_data),
    ];

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .title("Frames")
                .bounds([0.0, signal.len().max(1) as f64])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([-1.0, 1.0])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
