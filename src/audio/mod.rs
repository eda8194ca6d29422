use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::thread::JoinHandle;

use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};

use crate::audio_api::{AudioBackend, AudioCommand, BackendStatus};
use crate::pipeline::EngineConfig;

mod effect;
mod engine;
mod frame;
mod instruments;
mod mixer;
pub mod nodes;
mod offline;
pub mod param;
mod reverb;
mod voice;

pub use effect::{Compressor, Effect};
pub use engine::Engine;
pub use frame::{block_peak, StereoFrame};
pub use instruments::{synthesize, Instrument};
pub use offline::{write_wav, OfflineBackend};
pub use reverb::Convolver;
pub use voice::{Branch, Voice};

// Written by the audio callback after every block, read by the control side.
#[derive(Default)]
struct Meters {
    frames: AtomicU64,
    active_voices: AtomicUsize,
    master_gain: AtomicU32, // f32 bits
}

// Requests for the thread that owns the stream. Dropping the sender stops it.
enum StreamControl {
    Resume,
}

/// The default output device. The cpal stream lives on its own thread so the
/// handle can move between threads; dropping the handle stops the stream.
pub struct CpalBackend {
    tx: Sender<AudioCommand>,
    meters: Arc<Meters>,
    sample_rate: u32,
    control: Option<Sender<StreamControl>>,
    stream_thread: Option<JoinHandle<()>>,
}

impl CpalBackend {
    pub fn start(config: &EngineConfig) -> anyhow::Result<Self> {
        let (tx, rx) = crossbeam_channel::bounded::<AudioCommand>(1024);
        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<anyhow::Result<u32>>(1);
        let (control_tx, control_rx) = crossbeam_channel::bounded::<StreamControl>(4);
        let meters = Arc::new(Meters::default());

        let thread_meters = meters.clone();
        let config = config.clone();
        let stream_thread = std::thread::Builder::new()
            .name("overture-audio".into())
            .spawn(move || match open_output(&config, rx, thread_meters) {
                Ok((stream, sample_rate)) => {
                    let _ = ready_tx.send(Ok(sample_rate));
                    serve_controls(&control_rx, || stream.play());
                    drop(stream);
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                }
            })
            .context("failed to spawn audio thread")?;

        let sample_rate = ready_rx
            .recv()
            .context("audio thread exited before opening the device")??;
        log::info!("audio output running at {sample_rate} Hz");

        Ok(Self {
            tx,
            meters,
            sample_rate,
            control: Some(control_tx),
            stream_thread: Some(stream_thread),
        })
    }
}

impl AudioBackend for CpalBackend {
    fn send(&self, cmd: AudioCommand) {
        if self.tx.try_send(cmd).is_err() {
            log::warn!("audio command queue full, dropping command");
        }
    }

    fn status(&self) -> BackendStatus {
        BackendStatus {
            clock: self.meters.frames.load(Ordering::Acquire) as f64 / self.sample_rate as f64,
            active_voices: self.meters.active_voices.load(Ordering::Relaxed),
            master_gain: f32::from_bits(self.meters.master_gain.load(Ordering::Relaxed)),
        }
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Asks the stream thread to play the stream again, in case the host
    /// paused it. Playing a running stream is harmless.
    fn resume(&self) -> anyhow::Result<()> {
        let control = self.control.as_ref().context("output stream already shut down")?;
        match control.try_send(StreamControl::Resume) {
            // a resume is already queued
            Ok(()) | Err(crossbeam_channel::TrySendError::Full(_)) => Ok(()),
            Err(crossbeam_channel::TrySendError::Disconnected(_)) => {
                anyhow::bail!("output stream thread has exited")
            }
        }
    }
}

impl Drop for CpalBackend {
    fn drop(&mut self) {
        drop(self.control.take());
        if let Some(handle) = self.stream_thread.take() {
            let _ = handle.join();
        }
    }
}

// Parks the stream thread until every sender is gone, replaying the stream
// on each resume request.
fn serve_controls<E: std::fmt::Display>(
    control: &Receiver<StreamControl>,
    mut play: impl FnMut() -> Result<(), E>,
) {
    while let Ok(StreamControl::Resume) = control.recv() {
        if let Err(e) = play() {
            log::warn!("could not resume output stream: {e}");
        }
    }
}

fn open_output(
    config: &EngineConfig,
    rx: Receiver<AudioCommand>,
    meters: Arc<Meters>,
) -> anyhow::Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host.default_output_device().context("no default output device")?;
    let supported = device.default_output_config().context("no default output config")?;

    let sample_rate = supported.sample_rate();
    let channels = supported.channels() as usize;

    match supported.sample_format() {
        cpal::SampleFormat::F32 => {
            let stream_config: cpal::StreamConfig = supported.into();
            let stream = build_output_stream_f32(&device, &stream_config, config, rx, meters, channels)?;
            stream.play().context("failed to play output stream")?;
            Ok((stream, sample_rate))
        }
        other => anyhow::bail!("unsupported sample format {other:?} (only f32 supported)"),
    }
}

fn build_output_stream_f32(
    device: &cpal::Device,
    stream_config: &cpal::StreamConfig,
    config: &EngineConfig,
    rx: Receiver<AudioCommand>,
    meters: Arc<Meters>,
    channels: usize,
) -> anyhow::Result<cpal::Stream> {
    let mut engine = Engine::new(config, stream_config.sample_rate, config.volume);
    let mut block: Vec<StereoFrame> = vec![StereoFrame::zero(); 4096];
    meters.master_gain.store(engine.master_gain().to_bits(), Ordering::Relaxed);

    let err_fn = |err: cpal::StreamError| {
        let s = err.to_string();
        // underruns are routine on busy machines
        if !s.contains("underrun") && !s.contains("overrun") {
            log::error!("audio output stream error: {s}");
        }
    };

    let stream = device.build_output_stream(
        stream_config,
        move |data: &mut [f32], _info| {
            while let Ok(cmd) = rx.try_recv() {
                engine.handle_cmd(cmd);
            }

            let n_frames = data.len() / channels.max(1);
            if block.len() < n_frames {
                block.resize(n_frames, StereoFrame::zero());
            }
            let frames = &mut block[..n_frames];
            engine.render_block(frames);

            // spread stereo over however many channels the device has
            for (out, f) in data.chunks_exact_mut(channels.max(1)).zip(frames.iter()) {
                match out {
                    [mono] => *mono = 0.5 * (f.left + f.right),
                    [l, r, rest @ ..] => {
                        *l = f.left;
                        *r = f.right;
                        rest.fill(0.0);
                    }
                    [] => {}
                }
            }

            meters.active_voices.store(engine.active_voices(), Ordering::Relaxed);
            meters.master_gain.store(engine.master_gain().to_bits(), Ordering::Relaxed);
            meters.frames.fetch_add(n_frames as u64, Ordering::Release);
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}
