// Stereo frame ring buffer between the feed thread and the device callback

use boombap_core::{SampleFrame, SILENCE};

/// Fixed-capacity ring of stereo frames
pub struct FrameRing {
    buffer: Vec<SampleFrame>,
    write_pos: usize,
    read_pos: usize,
    // One slot stays empty to tell full from empty
    size: usize,
}

impl FrameRing {
    /// Ring able to hold `capacity` frames
    pub fn new(capacity: usize) -> Self {
        let size = capacity.max(1) + 1;
        Self {
            buffer: vec![SILENCE; size],
            write_pos: 0,
            read_pos: 0,
            size,
        }
    }

    pub fn write(&mut self, frames: &[SampleFrame]) -> usize {
        let to_write = frames.len().min(self.available_write());
        if to_write == 0 {
            return 0;
        }

        // Handle wrap-around in two chunks if necessary
        let write_end = self.write_pos + to_write;
        if write_end <= self.size {
            self.buffer[self.write_pos..write_end].copy_from_slice(&frames[..to_write]);
            self.write_pos = write_end % self.size;
        } else {
            let first_chunk = self.size - self.write_pos;
            let second_chunk = to_write - first_chunk;
            self.buffer[self.write_pos..].copy_from_slice(&frames[..first_chunk]);
            self.buffer[..second_chunk].copy_from_slice(&frames[first_chunk..to_write]);
            self.write_pos = second_chunk;
        }

        to_write
    }

    /// Read frames into an interleaved L/R slice, scaling every sample by `gain`.
    /// Returns the number of frames read; the rest of `output` is left untouched.
    pub fn read_interleaved(&mut self, output: &mut [f32], gain: f32) -> usize {
        let to_read = (output.len() / 2).min(self.available_read());
        for pair in output.chunks_exact_mut(2).take(to_read) {
            let [left, right] = self.pop_unchecked();
            pair[0] = left * gain;
            pair[1] = right * gain;
        }
        to_read
    }

    fn pop_unchecked(&mut self) -> SampleFrame {
        let frame = self.buffer[self.read_pos];
        self.read_pos = (self.read_pos + 1) % self.size;
        frame
    }

    pub fn available_write(&self) -> usize {
        self.capacity() - self.available_read()
    }

    pub fn available_read(&self) -> usize {
        if self.write_pos >= self.read_pos {
            self.write_pos - self.read_pos
        } else {
            self.size - (self.read_pos - self.write_pos)
        }
    }

    pub fn clear(&mut self) {
        self.write_pos = 0;
        self.read_pos = 0;
    }

    /// Resize the ring. This clears all existing data.
    pub fn resize(&mut self, capacity: usize) {
        let size = capacity.max(1) + 1;
        if size != self.size {
            self.buffer = vec![SILENCE; size];
            self.size = size;
        }
        self.clear();
    }

    /// Frames the ring can hold
    pub fn capacity(&self) -> usize {
        self.size - 1
    }
}
