use super::storage::{
    SharedStorage, StorageError, COFFEE_SHOP_IMAGE_KEY, CUSTOM_TIME_KEY, DARK_MODE_KEY,
    MUSIC_MUTED_KEY, SELECTED_SONG_INDEX_KEY,
};
use crate::store::sync::Signals;
use crate::time_utils::POMODORO;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::rc::Rc;
use tracing::{debug, warn};

/// Background shown behind the timer when none was chosen
pub const DEFAULT_COFFEE_SHOP_IMAGE: &str = "coffee-shop-1";

/// Typed access to the persisted preference keys.
///
/// Missing or unreadable values fall back to defaults. Setters write through
/// to storage and announce the change on the matching channel.
#[derive(Clone)]
pub struct Settings {
    storage: SharedStorage,
    signals: Rc<Signals>,
}

impl Settings {
    pub fn new(storage: SharedStorage, signals: Rc<Signals>) -> Self {
        Self { storage, signals }
    }

    /// Saved custom duration in seconds, if it is a positive integer
    pub fn custom_time(&self) -> Option<u32> {
        let raw = self.read_raw(CUSTOM_TIME_KEY)?;
        raw.trim()
            .trim_matches('"')
            .parse::<u32>()
            .ok()
            .filter(|secs| *secs > 0)
    }

    /// Duration the timer starts with
    pub fn initial_time(&self) -> u32 {
        self.custom_time().unwrap_or(POMODORO)
    }

    pub fn save_custom_time(&self, seconds: u32) -> bool {
        self.write(CUSTOM_TIME_KEY, &seconds)
    }

    pub fn music_muted(&self) -> bool {
        self.read(MUSIC_MUTED_KEY).unwrap_or(false)
    }

    pub fn set_music_muted(&self, muted: bool) {
        if self.write(MUSIC_MUTED_KEY, &muted) {
            self.signals.mute_toggled.publish(muted);
        }
    }

    /// Flip the mute flag and return the new value
    pub fn toggle_music_muted(&self) -> bool {
        let muted = !self.music_muted();
        self.set_music_muted(muted);
        muted
    }

    pub fn dark_mode(&self) -> bool {
        self.read(DARK_MODE_KEY).unwrap_or(false)
    }

    pub fn set_dark_mode(&self, enabled: bool) {
        self.write(DARK_MODE_KEY, &enabled);
    }

    pub fn coffee_shop_image(&self) -> String {
        match self.read_raw(COFFEE_SHOP_IMAGE_KEY) {
            // Stored as a bare id; a JSON-quoted value is unquoted
            Some(raw) => serde_json::from_str::<String>(&raw).unwrap_or(raw),
            None => DEFAULT_COFFEE_SHOP_IMAGE.to_string(),
        }
    }

    pub fn set_coffee_shop_image(&self, image: &str) {
        if self.write_raw(COFFEE_SHOP_IMAGE_KEY, image) {
            self.signals.image_changed.publish(image.to_string());
        }
    }

    pub fn selected_song_index(&self) -> usize {
        self.read(SELECTED_SONG_INDEX_KEY).unwrap_or(0)
    }

    pub fn set_selected_song_index(&self, index: usize) {
        if self.write(SELECTED_SONG_INDEX_KEY, &index) {
            self.signals.song_changed.publish(index);
        }
    }

    fn read_raw(&self, key: &str) -> Option<String> {
        match self.storage.borrow().get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Could not read setting");
                None
            }
        }
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.read_raw(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(key, error = %e, "Ignoring unparsable setting");
                None
            }
        }
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) -> bool {
        match serde_json::to_string(value) {
            Ok(json) => self.write_raw(key, &json),
            Err(source) => {
                let e = StorageError::Serialize {
                    key: key.to_string(),
                    source,
                };
                warn!(key, error = %e, "Failed to save setting");
                false
            }
        }
    }

    fn write_raw(&self, key: &str, value: &str) -> bool {
        match self.storage.borrow_mut().set(key, value) {
            Ok(()) => true,
            Err(e) => {
                warn!(key, error = %e, "Failed to save setting");
                false
            }
        }
    }
}
