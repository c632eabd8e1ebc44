//! Pure bookkeeping buffers. Neither buffer locks or calls back into a
//! subscriber; their owners provide the synchronization.

mod demand_buffer;
mod history_buffer;

pub use demand_buffer::{DemandBuffer, Flushed};
pub use history_buffer::HistoryBuffer;
