/// One-shot playback of a multichannel buffer.
///
/// `trigger` rewinds to the first frame and starts playing; playback stops by
/// itself after the last frame. Retriggering while playing restarts from the
/// top.
#[derive(Debug, Clone)]
pub struct OneShot {
    channels: Vec<Vec<f32>>,
    read_pos: usize,
    playing: bool,
}

impl OneShot {
    /// `channels` must be non-empty and share a common length.
    pub fn new(channels: Vec<Vec<f32>>) -> Self {
        assert!(!channels.is_empty(), "one-shot needs at least one channel");
        Self {
            channels,
            read_pos: 0,
            playing: false,
        }
    }

    pub fn mono(samples: Vec<f32>) -> Self {
        Self::new(vec![samples])
    }

    pub fn trigger(&mut self) {
        self.read_pos = 0;
        self.playing = !self.frames_is_empty();
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn frames(&self) -> usize {
        self.channels[0].len()
    }

    fn frames_is_empty(&self) -> bool {
        self.frames() == 0
    }

    pub fn position(&self) -> usize {
        self.read_pos
    }

    /// Write the next frame, one value per output channel. Output channels
    /// beyond the buffer's channel count wrap around onto it.
    pub fn next_frame(&mut self, out: &mut [f32]) {
        if !self.playing {
            out.fill(0.0);
            return;
        }

        for (channel, sample) in out.iter_mut().enumerate() {
            let source = &self.channels[channel % self.channels.len()];
            *sample = source.get(self.read_pos).copied().unwrap_or(0.0);
        }

        self.read_pos += 1;
        if self.read_pos >= self.frames() {
            self.playing = false;
        }
    }

    /// Render a mono block from the first channel.
    pub fn render(&mut self, out: &mut [f32]) {
        let mut frame = [0.0f32; 1];
        for sample in out.iter_mut() {
            self.next_frame(&mut frame);
            *sample = frame[0];
        }
    }
}
