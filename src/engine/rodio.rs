//! `AudioEngine` implementation backed by rodio.
//!
//! rodio exposes no play cursor, so each open stream carries its own
//! elapsed-time bookkeeping, and seeking rebuilds the sink with
//! `Source::skip_duration`.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use lofty::prelude::*;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use tracing::debug;

use super::AudioEngine;
use super::types::{ChannelActivity, EngineError, PcmFormat, StreamHandle};

/// One open stream: the sink plus everything needed to answer position and
/// length queries.
struct Slot {
    path: PathBuf,
    sink: Sink,
    format: PcmFormat,
    duration: Duration,
    /// Set while audibly running; folds into `accumulated` on pause, stop
    /// and seek.
    started_at: Option<Instant>,
    accumulated: Duration,
    volume: f32,
}

impl Slot {
    fn elapsed(&self) -> Duration {
        self.accumulated + self.started_at.map_or(Duration::ZERO, |st| st.elapsed())
    }

    fn position(&self) -> Duration {
        if self.duration > Duration::ZERO {
            self.elapsed().min(self.duration)
        } else {
            self.elapsed()
        }
    }
}

pub struct RodioEngine {
    stream: OutputStream,
    slots: HashMap<u32, Slot>,
    next_id: u32,
}

impl RodioEngine {
    /// Initialize the default output device. Failure here is fatal for the
    /// player; there is nothing to fall back to.
    pub fn new() -> Result<Self, EngineError> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| EngineError::Device(e.to_string()))?;
        // rodio logs to stderr when the stream is dropped; that garbles
        // the status region.
        stream.log_on_drop(false);

        Ok(Self {
            stream,
            slots: HashMap::new(),
            next_id: 1,
        })
    }
}

/// Create a paused sink for `path` that starts at `start_at`. Also reports
/// the decoder's own idea of the total duration, when it has one.
fn create_sink_at(
    stream: &OutputStream,
    path: &Path,
    start_at: Duration,
) -> Result<(Sink, Option<Duration>), EngineError> {
    let open_err = |reason: String| EngineError::Open {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path).map_err(|e| open_err(e.to_string()))?;
    let source = Decoder::new(BufReader::new(file)).map_err(|e| open_err(e.to_string()))?;
    let total = source.total_duration();
    // `skip_duration` is the seeking primitive; even Duration::ZERO is fine.
    let source = source.skip_duration(start_at);

    let sink = Sink::connect_new(stream.mixer());
    sink.append(source);
    sink.pause();
    Ok((sink, total))
}

impl AudioEngine for RodioEngine {
    fn open(&mut self, path: &Path) -> Result<StreamHandle, EngineError> {
        let (sink, decoded_total) = create_sink_at(&self.stream, path, Duration::ZERO)?;

        // Stream parameters come from the tag reader; the decoder does not
        // report a length for every container.
        let mut format = PcmFormat::default();
        let mut duration = decoded_total.unwrap_or(Duration::ZERO);
        if let Ok(tagged) = lofty::read_from_path(path) {
            let props = tagged.properties();
            duration = props.duration();
            if let Some(rate) = props.sample_rate() {
                format.sample_rate = rate;
            }
            if let Some(channels) = props.channels() {
                format.channels = u16::from(channels);
            }
        }

        let id = self.next_id;
        self.next_id += 1;
        self.slots.insert(
            id,
            Slot {
                path: path.to_path_buf(),
                sink,
                format,
                duration,
                started_at: None,
                accumulated: Duration::ZERO,
                volume: 1.0,
            },
        );
        debug!("opened stream {id} for {}", path.display());
        Ok(StreamHandle(id))
    }

    fn play(&mut self, handle: StreamHandle, restart: bool) -> Result<(), EngineError> {
        let stream = &self.stream;
        let Some(slot) = self.slots.get_mut(&handle.0) else {
            return Err(EngineError::BadHandle);
        };

        if restart {
            let (sink, _) = create_sink_at(stream, &slot.path, Duration::ZERO)?;
            sink.set_volume(slot.volume);
            slot.sink.stop();
            slot.sink = sink;
            slot.accumulated = Duration::ZERO;
            slot.started_at = None;
        }

        slot.sink.play();
        if slot.started_at.is_none() {
            slot.started_at = Some(Instant::now());
        }
        Ok(())
    }

    fn pause(&mut self, handle: StreamHandle) {
        if let Some(slot) = self.slots.get_mut(&handle.0) {
            if let Some(st) = slot.started_at.take() {
                slot.accumulated += st.elapsed();
            }
            slot.sink.pause();
        }
    }

    fn stop(&mut self, handle: StreamHandle) {
        if let Some(slot) = self.slots.get_mut(&handle.0) {
            if let Some(st) = slot.started_at.take() {
                slot.accumulated += st.elapsed();
            }
            slot.sink.stop();
        }
    }

    fn activity(&self, handle: StreamHandle) -> ChannelActivity {
        match self.slots.get(&handle.0) {
            None => ChannelActivity::Stopped,
            Some(slot) if slot.sink.empty() => ChannelActivity::Stopped,
            Some(slot) if slot.sink.is_paused() => ChannelActivity::Paused,
            Some(_) => ChannelActivity::Playing,
        }
    }

    fn position_bytes(&self, handle: StreamHandle) -> u64 {
        let Some(slot) = self.slots.get(&handle.0) else {
            return 0;
        };
        slot.format.seconds_to_bytes(slot.position().as_secs_f64())
    }

    fn set_position_bytes(&mut self, handle: StreamHandle, bytes: u64) -> bool {
        let stream = &self.stream;
        let Some(slot) = self.slots.get_mut(&handle.0) else {
            return false;
        };

        let mut target = Duration::from_secs_f64(slot.format.bytes_to_seconds(bytes));
        // End-clamp: a seek past the end lands on the end, which then reads
        // back as a finished stream.
        if slot.duration > Duration::ZERO && target > slot.duration {
            target = slot.duration;
        }

        let was_running = slot.started_at.is_some();
        match create_sink_at(stream, &slot.path, target) {
            Ok((sink, _)) => {
                sink.set_volume(slot.volume);
                slot.sink.stop();
                slot.sink = sink;
                slot.accumulated = target;
                slot.started_at = None;
                if was_running {
                    slot.sink.play();
                    slot.started_at = Some(Instant::now());
                }
                true
            }
            Err(_) => false,
        }
    }

    fn length_bytes(&self, handle: StreamHandle) -> u64 {
        let Some(slot) = self.slots.get(&handle.0) else {
            return 0;
        };
        slot.format.seconds_to_bytes(slot.duration.as_secs_f64())
    }

    fn bytes_to_seconds(&self, handle: StreamHandle, bytes: u64) -> f64 {
        self.slots
            .get(&handle.0)
            .map_or(0.0, |s| s.format.bytes_to_seconds(bytes))
    }

    fn seconds_to_bytes(&self, handle: StreamHandle, seconds: f64) -> u64 {
        self.slots
            .get(&handle.0)
            .map_or(0, |s| s.format.seconds_to_bytes(seconds))
    }

    fn volume(&self, handle: StreamHandle) -> f32 {
        self.slots.get(&handle.0).map_or(0.0, |s| s.sink.volume())
    }

    fn set_volume(&mut self, handle: StreamHandle, volume: f32) {
        if let Some(slot) = self.slots.get_mut(&handle.0) {
            slot.volume = volume;
            slot.sink.set_volume(volume);
        }
    }

    fn free(&mut self, handle: StreamHandle) {
        if let Some(slot) = self.slots.remove(&handle.0) {
            slot.sink.stop();
            debug!("freed stream {}", handle.0);
        }
    }
}
