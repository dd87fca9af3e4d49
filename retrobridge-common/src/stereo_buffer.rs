use retrobridge_core::audio;

use tracing::debug;

use std::collections::VecDeque;

/// Bounded queue of converted stereo frames between the core's audio
/// callback and the playback device. Frames pushed past the bound are
/// dropped rather than stalling the producer.
pub struct StereoBuffer {
    frames: VecDeque<(f32, f32)>,
    max_frames: usize,
    frames_written: usize,
}

impl StereoBuffer {
    pub fn with_max_frames(max_frames: usize) -> StereoBuffer {
        StereoBuffer {
            frames: VecDeque::new(),
            max_frames,
            frames_written: 0,
        }
    }

    /// Enqueues interleaved `[l, r, l, r, ..]` samples. A trailing unpaired
    /// sample is dropped.
    pub fn push_interleaved(&mut self, samples: &[f32]) {
        for frame in samples.chunks_exact(2) {
            self.push_frame((frame[0], frame[1]));
        }
    }

    /// Converts an interleaved 16-bit PCM block and enqueues it.
    pub fn push_pcm(&mut self, samples: &[i16], gain: f32) {
        for frame in audio::convert_stereo(samples, gain) {
            self.push_frame(frame);
        }
    }

    fn push_frame(&mut self, frame: (f32, f32)) {
        if self.frames.len() < self.max_frames {
            self.frames.push_back(frame);
        }
        self.frames_written += 1;
    }

    pub fn pop_frame(&mut self) -> Option<(f32, f32)> {
        self.frames.pop_front()
    }

    /// Drains queued frames into per-channel device buffers, zero-filling
    /// the tail on underrun. Returns how many real frames were written.
    pub fn fill_planar(&mut self, left: &mut [f32], right: &mut [f32]) -> usize {
        assert_eq!(left.len(), right.len());

        let mut filled = 0;
        while filled < left.len() {
            match self.frames.pop_front() {
                Some((l, r)) => {
                    left[filled] = l;
                    right[filled] = r;
                    filled += 1;
                }
                None => break,
            }
        }

        if filled < left.len() {
            debug!("audio underrun, zero filling {} frames", left.len() - filled);
            left[filled..].fill(0.0);
            right[filled..].fill(0.0);
        }

        filled
    }

    pub fn frames_queued(&self) -> usize {
        self.frames.len()
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }
}

#[test]
fn test_frames_past_the_bound_are_dropped() {
    let mut buffer = StereoBuffer::with_max_frames(2);
    buffer.push_interleaved(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);

    assert_eq!(buffer.frames_queued(), 2);
    assert_eq!(buffer.frames_written(), 3);
    assert_eq!(buffer.pop_frame(), Some((0.1, 0.2)));
    assert_eq!(buffer.pop_frame(), Some((0.3, 0.4)));
    assert_eq!(buffer.pop_frame(), None);
}

#[test]
fn test_fill_planar_zero_fills_on_underrun() {
    let mut buffer = StereoBuffer::with_max_frames(8);
    buffer.push_interleaved(&[0.5, -0.5]);

    let mut left = [1.0; 3];
    let mut right = [1.0; 3];
    assert_eq!(buffer.fill_planar(&mut left, &mut right), 1);
    assert_eq!(left, [0.5, 0.0, 0.0]);
    assert_eq!(right, [-0.5, 0.0, 0.0]);
}

#[test]
fn test_push_pcm_converts_before_queueing() {
    let mut buffer = StereoBuffer::with_max_frames(8);
    buffer.push_pcm(&[-32768, 16384], 1.0);

    let (left, right) = buffer.pop_frame().unwrap();
    assert_eq!(left, -1.0);
    assert_eq!(right, 0.5);
}
