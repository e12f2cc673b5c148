//! Terminal scope for the `scope` demo.
//!
//! The audio thread pushes one [`ScopeFrame`] per sample into an rtrb ring;
//! this loop drains it, aligns sweeps on the trigger, and redraws at ~60fps.

mod history;
mod status;
mod waveform;

use std::time::Duration;

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use keygate::input::poller::PollerHandle;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use rtrb::Consumer;

use crate::patches::ScopeFrame;

use history::SweepHistory;
use status::{render_status, SignalStats};
use waveform::render_waveform;

/// Frames per displayed sweep.
pub const SWEEP_LEN: usize = 1024;

/// Ring capacity in frames for audio to UI.
pub const FRAME_RING_LEN: usize = SWEEP_LEN * 16;

pub struct ScopeUi {
    frames_rx: Consumer<ScopeFrame>,
    history: SweepHistory,
    device: String,
    sample_rate: f32,
    key_down: bool,
    should_quit: bool,
}

impl ScopeUi {
    pub fn new(frames_rx: Consumer<ScopeFrame>, device: String, sample_rate: f32) -> Self {
        Self {
            frames_rx,
            history: SweepHistory::new(SWEEP_LEN),
            device,
            sample_rate,
            key_down: false,
            should_quit: false,
        }
    }

    /// Run until q or Esc.
    pub fn run(&mut self, terminal: &mut DefaultTerminal, poller: &PollerHandle) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_frames();

            terminal.draw(|frame| self.render(frame, poller))?;

            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }

        Ok(())
    }

    fn poll_frames(&mut self) {
        while let Ok(frame) = self.frames_rx.pop() {
            self.key_down = frame.gate > 0.0;
            self.history.push(frame);
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        if matches!(key, KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc) {
            self.should_quit = true;
        }
    }

    fn render(&self, frame: &mut Frame, poller: &PollerHandle) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Status bar
                Constraint::Min(8),    // Scope
                Constraint::Length(1), // Help bar
            ])
            .split(frame.area());

        let stats = SignalStats::from_buffer(self.history.signal());
        render_status(
            frame,
            chunks[0],
            &self.device,
            poller.status(),
            self.sample_rate,
            self.key_down,
            &stats,
        );

        render_waveform(frame, chunks[1], self.history.signal(), self.history.gate());

        let help = Paragraph::new(format!(
            " [Q] Quit  hold any key on the input device to raise the gate  sweeps: {}",
            self.history.sweeps()
        ))
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[2]);
    }
}
