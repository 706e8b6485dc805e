// crates/mediacore-decoder/src/lib.rs
//
// The decoder owner: an input FIFO, a worker thread, and the pause/step/
// flush/drain control surface a playback engine drives a single
// elementary stream's decode pipeline through.

pub mod events;
pub mod fifo;
pub mod owner;

pub use events::{DecoderEvent, EventReceiver, EventSender};
pub use fifo::{BlockFifo, FifoItem};
pub use owner::DecoderOwner;
