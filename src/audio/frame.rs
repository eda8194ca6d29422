// One stereo sample pair. `repr(C)` so a block can be handed to code that
// expects interleaved L/R floats.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StereoFrame {
    pub left: f32,
    pub right: f32,
}

impl StereoFrame {
    pub fn zero() -> Self {
        Self::default()
    }

    /// The same sample on both channels.
    pub fn splat(s: f32) -> Self {
        Self { left: s, right: s }
    }

    pub fn peak(&self) -> f32 {
        self.left.abs().max(self.right.abs())
    }
}

/// Largest absolute sample in a block.
pub fn block_peak(frames: &[StereoFrame]) -> f32 {
    frames.iter().fold(0.0, |m, f| m.max(f.peak()))
}
