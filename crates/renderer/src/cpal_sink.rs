// cpal-based output sink for the default sound card

use crate::feed::FeedQueue;
use crate::pull_sink::RING_PERIODS;
use crate::sink::{CompletionCallback, GainControl, OutputSink};
use boombap_core::{AudioFormat, EngineError, Result};
use boombap_decode::FrameSource;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, Stream, StreamConfig};
use parking_lot::Mutex;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

enum DeviceCommand {
    Open {
        format: AudioFormat,
        buffer_frames: u32,
        reply: Sender<Result<()>>,
    },
    Shutdown,
}

/// Sink playing through cpal's default output device.
///
/// The cpal stream is not `Send` on every platform, so it lives on a
/// dedicated device thread driven over a command channel.
pub struct CpalSink {
    queue: Arc<FeedQueue>,
    commands: Mutex<Sender<DeviceCommand>>,
    device_thread: Mutex<Option<JoinHandle<()>>>,
}

impl CpalSink {
    pub fn new() -> Result<Self> {
        let queue = Arc::new(FeedQueue::new());
        let (tx, rx) = mpsc::channel();

        let device_queue = queue.clone();
        let handle = thread::Builder::new()
            .name("boombap-device".to_string())
            .spawn(move || device_loop(rx, device_queue))
            .map_err(|e| EngineError::Device(format!("failed to spawn device thread: {}", e)))?;

        Ok(Self {
            queue,
            commands: Mutex::new(tx),
            device_thread: Mutex::new(Some(handle)),
        })
    }
}

impl OutputSink for CpalSink {
    fn configure(&self, format: AudioFormat, buffer: Duration) -> Result<()> {
        let buffer_frames = format.frames_for(buffer);
        self.queue.resize(buffer_frames * RING_PERIODS);

        let (reply_tx, reply_rx) = mpsc::channel();
        self.commands
            .lock()
            .send(DeviceCommand::Open {
                format,
                buffer_frames: buffer_frames as u32,
                reply: reply_tx,
            })
            .map_err(|_| EngineError::Device("device thread is gone".to_string()))?;

        reply_rx
            .recv()
            .map_err(|_| EngineError::Device("device thread is gone".to_string()))?
    }

    fn enqueue(&self, source: Box<dyn FrameSource>, on_complete: CompletionCallback) -> Result<()> {
        self.queue.enqueue(source, on_complete)
    }

    fn silence(&self) {
        self.queue.silence();
    }

    fn gain(&self) -> &GainControl {
        self.queue.gain()
    }
}

impl Drop for CpalSink {
    fn drop(&mut self) {
        self.queue.silence();
        let _ = self.commands.lock().send(DeviceCommand::Shutdown);
        if let Some(handle) = self.device_thread.lock().take() {
            let _ = handle.join();
        }
    }
}

fn device_loop(commands: Receiver<DeviceCommand>, queue: Arc<FeedQueue>) {
    let mut current: Option<(AudioFormat, Stream)> = None;

    while let Ok(command) = commands.recv() {
        match command {
            DeviceCommand::Open {
                format,
                buffer_frames,
                reply,
            } => {
                if matches!(&current, Some((open, _)) if *open == format) {
                    let _ = reply.send(Ok(()));
                    continue;
                }

                // Release the old stream before opening the new one
                current = None;
                let result = open_stream(format, buffer_frames, queue.clone()).map(|stream| {
                    current = Some((format, stream));
                });
                let _ = reply.send(result);
            }
            DeviceCommand::Shutdown => break,
        }
    }

    log::debug!("[device] thread exiting");
}

fn open_stream(format: AudioFormat, buffer_frames: u32, queue: Arc<FeedQueue>) -> Result<Stream> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| EngineError::Device("No output device available".to_string()))?;

    let fixed = StreamConfig {
        channels: format.channels,
        sample_rate: cpal::SampleRate(format.sample_rate),
        buffer_size: BufferSize::Fixed(buffer_frames),
    };

    let stream = match build_stream(&device, &fixed, queue.clone()) {
        Ok(stream) => stream,
        Err(e) => {
            log::warn!(
                "Fixed buffer of {} frames rejected ({}), using device default",
                buffer_frames,
                e
            );
            let fallback = StreamConfig {
                buffer_size: BufferSize::Default,
                ..fixed
            };
            build_stream(&device, &fallback, queue)
                .map_err(|e| EngineError::Device(format!("Failed to build output stream: {}", e)))?
        }
    };

    stream
        .play()
        .map_err(|e| EngineError::Device(format!("Failed to start stream: {}", e)))?;

    log::info!(
        "[device] output stream opened: {} Hz, {} channels, {} frame buffer",
        format.sample_rate,
        format.channels,
        buffer_frames
    );
    Ok(stream)
}

fn build_stream(
    device: &cpal::Device,
    config: &StreamConfig,
    queue: Arc<FeedQueue>,
) -> std::result::Result<Stream, cpal::BuildStreamError> {
    device.build_output_stream(
        config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            queue.render(data);
        },
        |err| {
            log::error!("Audio stream error: {}", err);
        },
        None,
    )
}
