//! Roasting workflow services for the Coffee Roast Logger

pub mod export;
pub mod history;
pub mod recorder;
pub mod session;
pub mod ticker;

pub use export::{export_timeline_csv, RoastSummary};
pub use history::RoastHistory;
pub use recorder::{AudioDevice, EncodedCapture, FileCapture, VoiceCapture, VoiceNote, VoiceRecorder};
pub use session::{ButtonInput, RoastSession};
pub use ticker::ElapsedTicker;
