//! Episode selection: finding playable audio and picking one entry per feed.
//!
//! - [`audio`] decides whether a single entry carries a playable attachment
//! - [`entry`] walks a feed's entries and builds the [`SelectedItem`] for the first match

mod audio;
mod entry;

pub use audio::{resolve, AudioLink};
pub use entry::{
    episode_guid, scan_entries, select_first_audio_entry, SelectedItem, Selection,
    DEFAULT_AUDIO_MIME,
};
