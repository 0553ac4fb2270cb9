//! Single-photo overlay state: a snapshot of the feed order plus a
//! clamped cursor, pointer zones, and the auto-hiding top bar.

use std::time::Duration;
use store::PhotoKey;

/// How long the top bar stays up after the pointer goes quiet.
pub const TOPBAR_HIDE_DELAY: Duration = Duration::from_millis(1400);

/// Height of the top bar strip; the pointer resting inside it keeps the
/// bar visible.
pub const TOPBAR_HEIGHT: f32 = 56.0;

/// Fraction of the viewport the displayed photo may occupy.
pub const VIEWPORT_FILL: f32 = 0.92;

/// Horizontal thirds of the overlay. Left and right act as navigation
/// targets, the middle closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Left,
    Center,
    Right,
}

pub fn zone_at(x: f32, width: f32) -> Zone {
    if width <= 0.0 {
        return Zone::Center;
    }
    let third = width / 3.0;
    if x < third {
        Zone::Left
    } else if x > width - third {
        Zone::Right
    } else {
        Zone::Center
    }
}

/// Scale natural dimensions to fit inside the viewport's fill box while
/// keeping aspect ratio. Unknown dimensions get the whole box.
pub fn fit_within(natural: (u32, u32), viewport: (f32, f32)) -> (f32, f32) {
    let max_w = viewport.0 * VIEWPORT_FILL;
    let max_h = viewport.1 * VIEWPORT_FILL;
    let (nw, nh) = natural;
    if nw == 0 || nh == 0 {
        return (max_w, max_h);
    }
    let image_aspect = nw as f32 / nh as f32;
    let box_aspect = max_w / max_h;
    if image_aspect > box_aspect {
        (max_w, max_w / image_aspect)
    } else {
        (max_h * image_aspect, max_h)
    }
}

/// The overlay holds its own snapshot of the photo ordering so navigation
/// stays stable while feed pages keep arriving. The cursor never wraps.
#[derive(Debug)]
pub struct Overlay {
    keys: Vec<PhotoKey>,
    cursor: usize,
    generation: u64,
    pub zone: Zone,
    pub topbar_visible: bool,
    pub hovering_topbar: bool,
    pub info_open: bool,
}

impl Overlay {
    /// Open on `key`; returns `None` when the key is not in the snapshot.
    pub fn open(keys: Vec<PhotoKey>, key: PhotoKey, generation: u64) -> Option<Self> {
        let cursor = keys.iter().position(|k| *k == key)?;
        Some(Self {
            keys,
            cursor,
            generation,
            zone: Zone::Center,
            topbar_visible: true,
            hovering_topbar: false,
            info_open: false,
        })
    }

    pub fn current(&self) -> Option<PhotoKey> {
        self.keys.get(self.cursor).copied()
    }

    pub fn has_prev(&self) -> bool {
        self.cursor > 0
    }

    pub fn has_next(&self) -> bool {
        self.cursor + 1 < self.keys.len()
    }

    /// The previous-photo control is only revealed while the pointer
    /// rests in the left third; the center shows neither control.
    pub fn show_prev_control(&self) -> bool {
        self.zone == Zone::Left && self.has_prev()
    }

    /// Right-third counterpart of [`Self::show_prev_control`].
    pub fn show_next_control(&self) -> bool {
        self.zone == Zone::Right && self.has_next()
    }

    /// Step back; clamped at the first photo. Returns whether the cursor
    /// moved.
    pub fn prev(&mut self) -> bool {
        if self.has_prev() {
            self.cursor -= 1;
            self.generation += 1;
            self.info_open = false;
            true
        } else {
            false
        }
    }

    /// Step forward; clamped at the last photo.
    pub fn next(&mut self) -> bool {
        if self.has_next() {
            self.cursor += 1;
            self.generation += 1;
            self.info_open = false;
            true
        } else {
            false
        }
    }

    /// Monotonic counter identifying the currently displayed photo; async
    /// results stamped with an older generation are stale and dropped.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Neighbors of the current photo, for prefetching.
    pub fn neighbors(&self) -> (Option<PhotoKey>, Option<PhotoKey>) {
        let prev = self.cursor.checked_sub(1).and_then(|i| self.keys.get(i));
        let next = self.keys.get(self.cursor + 1);
        (prev.copied(), next.copied())
    }

    /// Drop a key from the snapshot (after a deletion), keeping the cursor
    /// on a valid neighbor. Returns `true` when the snapshot is now empty
    /// and the overlay must close.
    pub fn remove(&mut self, key: PhotoKey) -> bool {
        if let Some(index) = self.keys.iter().position(|k| *k == key) {
            self.keys.remove(index);
            if index < self.cursor {
                self.cursor -= 1;
            } else if index == self.cursor {
                if self.cursor >= self.keys.len() && self.cursor > 0 {
                    self.cursor -= 1;
                }
                self.generation += 1;
                self.info_open = false;
            }
        }
        self.keys.is_empty()
    }

    /// Swap a pending key for its confirmed id without moving the cursor.
    pub fn replace_key(&mut self, old: PhotoKey, new: PhotoKey) {
        if let Some(slot) = self.keys.iter_mut().find(|k| **k == old) {
            *slot = new;
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
