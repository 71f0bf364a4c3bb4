//! Sums several independent sources into one output block.
//!
//! Inputs are not synchronised with each other; each keeps its own transport.

use super::source::AudioSource;

#[derive(Default)]
pub struct Mixer {
    inputs: Vec<Box<dyn AudioSource>>,
    scratch: Vec<f32>,
}

impl Mixer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_input(&mut self, input: Box<dyn AudioSource>) {
        self.inputs.push(input);
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }
}

impl AudioSource for Mixer {
    fn prepare(&mut self, block_size: usize, sample_rate: u32, channels: u16) {
        self.scratch = vec![0.0; block_size.max(1) * channels.max(1) as usize];
        for input in &mut self.inputs {
            input.prepare(block_size, sample_rate, channels);
        }
        log::debug!("Mixer prepared with {} inputs", self.inputs.len());
    }

    fn render(&mut self, out: &mut [f32]) {
        out.fill(0.0);
        if self.scratch.is_empty() {
            return;
        }

        // Blocks larger than the prepared size are rendered in scratch-sized chunks
        let chunk_len = self.scratch.len();
        for chunk in out.chunks_mut(chunk_len) {
            let scratch = &mut self.scratch[..chunk.len()];
            for input in &mut self.inputs {
                input.render(scratch);
                for (mixed, sample) in chunk.iter_mut().zip(scratch.iter()) {
                    *mixed += *sample;
                }
            }
            for mixed in chunk.iter_mut() {
                *mixed = mixed.clamp(-1.0, 1.0);
            }
        }
    }

    fn release(&mut self) {
        for input in &mut self.inputs {
            input.release();
        }
        self.scratch = Vec::new();
    }
}
