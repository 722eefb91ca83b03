//! Voice note capture
//!
//! A recording goes through a [`VoiceCapture`] implementation, which in turn
//! drives an [`AudioDevice`]. Two captures are provided: [`EncodedCapture`]
//! returns the audio inline as a base64 data URL, [`FileCapture`] writes it to
//! the recordings directory and returns a `file://` URI.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use shared::{validate_voice_note_size, DataPointType, NewDataPoint};
use tokio::sync::Mutex;

use crate::error::{AppError, AppResult};

/// Microphone or equivalent input
#[allow(async_fn_in_trait)]
pub trait AudioDevice {
    /// Ask the platform for microphone access
    async fn request_permission(&mut self) -> AppResult<()>;

    /// Acquire the device and begin buffering samples
    async fn open(&mut self) -> AppResult<()>;

    /// Take everything buffered since `open`
    fn drain(&mut self) -> AppResult<Vec<u8>>;

    /// Release the device. Must be safe to call more than once.
    fn close(&mut self);
}

/// Closes the device when it goes out of scope
struct OpenDevice<'a, D: AudioDevice> {
    device: &'a mut D,
}

impl<'a, D: AudioDevice> OpenDevice<'a, D> {
    fn new(device: &'a mut D) -> Self {
        Self { device }
    }

    fn drain(&mut self) -> AppResult<Vec<u8>> {
        self.device.drain()
    }
}

impl<D: AudioDevice> Drop for OpenDevice<'_, D> {
    fn drop(&mut self) {
        self.device.close();
    }
}

/// A finished recording
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceNote {
    /// `data:<mime>;base64,<payload>`
    Encoded(String),
    /// `file://` URI of a recording on disk
    File(String),
}

impl VoiceNote {
    /// Characters this note adds to the store
    pub fn stored_chars(&self) -> usize {
        match self {
            VoiceNote::Encoded(payload) => payload.len(),
            VoiceNote::File(uri) => uri.len() * 2,
        }
    }

    /// Data point carrying this note at `timestamp`
    pub fn into_data_point(self, timestamp: u32) -> NewDataPoint {
        let point = NewDataPoint::new(DataPointType::Voice, timestamp);
        match self {
            VoiceNote::Encoded(payload) => point.with_voice_note(payload),
            VoiceNote::File(uri) => point.with_voice_note(uri.clone()).with_voice_note_uri(uri),
        }
    }
}

#[allow(async_fn_in_trait)]
pub trait VoiceCapture {
    async fn request_permission(&mut self) -> AppResult<()>;
    async fn start(&mut self) -> AppResult<()>;
    async fn stop(&mut self) -> AppResult<VoiceNote>;
}

// ============================================================================
// Inline capture
// ============================================================================

pub struct EncodedCapture<D: AudioDevice> {
    device: D,
    mime_type: String,
    active: bool,
}

impl<D: AudioDevice> EncodedCapture<D> {
    pub fn new(device: D, mime_type: impl Into<String>) -> Self {
        Self {
            device,
            mime_type: mime_type.into(),
            active: false,
        }
    }

    pub fn device(&self) -> &D {
        &self.device
    }
}

impl<D: AudioDevice> VoiceCapture for EncodedCapture<D> {
    async fn request_permission(&mut self) -> AppResult<()> {
        self.device.request_permission().await
    }

    async fn start(&mut self) -> AppResult<()> {
        self.device.open().await?;
        self.active = true;
        Ok(())
    }

    async fn stop(&mut self) -> AppResult<VoiceNote> {
        if !std::mem::replace(&mut self.active, false) {
            return Err(AppError::Device("no recording in progress".to_string()));
        }

        let bytes = OpenDevice::new(&mut self.device).drain()?;
        Ok(VoiceNote::Encoded(format!(
            "data:{};base64,{}",
            self.mime_type,
            STANDARD.encode(bytes)
        )))
    }
}

impl<D: AudioDevice> Drop for EncodedCapture<D> {
    fn drop(&mut self) {
        if self.active {
            self.device.close();
        }
    }
}

// ============================================================================
// File capture
// ============================================================================

pub struct FileCapture<D: AudioDevice> {
    device: D,
    directory: PathBuf,
    extension: String,
    active: bool,
}

impl<D: AudioDevice> FileCapture<D> {
    pub fn new(device: D, directory: impl Into<PathBuf>, mime_type: &str) -> Self {
        let extension = mime_type
            .split('/')
            .nth(1)
            .and_then(|s| s.split(';').next())
            .filter(|s| !s.is_empty())
            .unwrap_or("bin")
            .to_string();

        Self {
            device,
            directory: directory.into(),
            extension,
            active: false,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn device(&self) -> &D {
        &self.device
    }
}

impl<D: AudioDevice> VoiceCapture for FileCapture<D> {
    async fn request_permission(&mut self) -> AppResult<()> {
        self.device.request_permission().await
    }

    async fn start(&mut self) -> AppResult<()> {
        self.device.open().await?;
        self.active = true;
        Ok(())
    }

    async fn stop(&mut self) -> AppResult<VoiceNote> {
        if !std::mem::replace(&mut self.active, false) {
            return Err(AppError::Device("no recording in progress".to_string()));
        }

        let bytes = OpenDevice::new(&mut self.device).drain()?;

        tokio::fs::create_dir_all(&self.directory).await?;
        let path = self
            .directory
            .join(format!("voice-{}.{}", shared::generate_id(), self.extension));
        tokio::fs::write(&path, bytes).await?;

        let absolute = if path.is_absolute() {
            path
        } else {
            std::env::current_dir()?.join(path)
        };
        tracing::info!("Saved voice note to {}", absolute.display());
        Ok(VoiceNote::File(format!("file://{}", absolute.display())))
    }
}

impl<D: AudioDevice> Drop for FileCapture<D> {
    fn drop(&mut self) {
        if self.active {
            self.device.close();
        }
    }
}

// ============================================================================
// Recorder
// ============================================================================

const IDLE: u8 = 0;
const STARTING: u8 = 1;
const RECORDING: u8 = 2;

/// Start/stop front end over a capture.
///
/// A second `start_recording` while one is starting or active is ignored.
pub struct VoiceRecorder<C: VoiceCapture> {
    capture: Mutex<C>,
    state: AtomicU8,
    max_chars: usize,
}

impl<C: VoiceCapture> VoiceRecorder<C> {
    pub fn new(capture: C, max_chars: usize) -> Self {
        Self {
            capture: Mutex::new(capture),
            state: AtomicU8::new(IDLE),
            max_chars,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.state.load(Ordering::SeqCst) == RECORDING
    }

    /// Returns `false` when the call was ignored
    pub async fn start_recording(&self) -> AppResult<bool> {
        if self
            .state
            .compare_exchange(IDLE, STARTING, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("Recording already in progress; ignoring start");
            return Ok(false);
        }
        let guard = StartingGuard::new(&self.state);

        let mut capture = self.capture.lock().await;
        let started = match capture.request_permission().await {
            Ok(()) => capture.start().await,
            Err(e) => Err(e),
        };

        match started {
            Ok(()) => {
                self.state.store(RECORDING, Ordering::SeqCst);
                guard.disarm();
                tracing::info!("Voice recording started");
                Ok(true)
            }
            Err(e) => {
                tracing::warn!("Could not start recording: {}", e);
                Err(e)
            }
        }
    }

    /// Finish the recording. `Ok(None)` when nothing was being recorded.
    ///
    /// An oversized note is discarded and reported as a capacity error.
    pub async fn stop_recording(&self) -> AppResult<Option<VoiceNote>> {
        if self
            .state
            .compare_exchange(RECORDING, IDLE, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Ok(None);
        }

        let note = self.capture.lock().await.stop().await?;
        if let VoiceNote::Encoded(payload) = &note {
            validate_voice_note_size(payload, self.max_chars)?;
        }

        tracing::info!("Voice recording finished ({} chars)", note.stored_chars());
        Ok(Some(note))
    }

    pub fn into_capture(self) -> C {
        self.capture.into_inner()
    }
}

/// Puts the recorder back to idle if a start is abandoned before the
/// device is recording, including when the start future is dropped.
struct StartingGuard<'a> {
    state: &'a AtomicU8,
    armed: bool,
}

impl<'a> StartingGuard<'a> {
    fn new(state: &'a AtomicU8) -> Self {
        Self { state, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for StartingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let _ = self
                .state
                .compare_exchange(STARTING, IDLE, Ordering::SeqCst, Ordering::SeqCst);
        }
    }
}
