// What the control side may ask of the audio side. Commands carry absolute
// device-clock times; the renderer applies them sample-accurately.
use crate::audio::Voice;

/// Where a voice is mixed: straight to the master stage, or through the reverb.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Bus {
    Dry,
    Wet,
}

#[derive(Clone, Debug)]
pub enum AudioCommand {
    SpawnVoice(Box<Voice>),

    // Voices that have not started yet are dropped; sounding ones fade to
    // silence over `fade` seconds from `at`.
    StopAll { at: f64, fade: f64 },

    SetMasterGain { target: f32, at: f64, time_constant: f64 },
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BackendStatus {
    pub clock: f64, // seconds since the backend started
    pub active_voices: usize,
    pub master_gain: f32,
}

/// A running audio output the transport can schedule against.
pub trait AudioBackend: Send {
    fn send(&self, cmd: AudioCommand);

    fn status(&self) -> BackendStatus;

    fn sample_rate(&self) -> u32;

    /// Asks a suspended output to run again. Most backends never suspend.
    fn resume(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
