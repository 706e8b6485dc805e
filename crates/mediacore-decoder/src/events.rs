// crates/mediacore-decoder/src/events.rs
//
// Out-of-band notifications from the decode worker thread to whatever is
// embedding it — the same "single shared result channel" shape as a
// playback worker's probe/encode progress channel, just for decoder
// lifecycle events instead of media probe results.

use mediacore_types::{CoreError, StreamFormat};

#[derive(Debug, Clone)]
pub enum DecoderEvent {
    FormatChanged(StreamFormat),
    Drained,
    FatalError(CoreError),
}

pub type EventSender = crossbeam_channel::Sender<DecoderEvent>;
pub type EventReceiver = crossbeam_channel::Receiver<DecoderEvent>;

pub fn channel() -> (EventSender, EventReceiver) {
    crossbeam_channel::bounded(64)
}
