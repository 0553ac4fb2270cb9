//! In-memory photo store: the single source of truth for rendering and
//! navigation. Feed pages append to it, uploads prepend into their date
//! bucket, deletions remove by key. Rendering is a projection of this
//! store, never the reverse.

use api_client::{Block, Photo, PhotoInfo, Scope};
use std::collections::HashSet;
use std::sync::Arc;

/// Identity of a store entry. Confirmed photos carry the server id;
/// in-flight uploads carry a process-local number until the server
/// answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhotoKey {
    Id(i64),
    Local(u64),
}

#[derive(Debug, Clone)]
pub struct PhotoEntry {
    pub key: PhotoKey,
    pub scope: Scope,
    pub thumb_url: String,
    pub full_url: Option<String>,
    pub orig_name: String,
    pub uploaded_at: Option<String>,
    pub owner: Option<String>,
    pub block_date: String,
    pub orig_width: Option<u32>,
    pub orig_height: Option<u32>,
    /// Local preview for a pending upload. Owned by the entry; released
    /// once the server-confirmed thumbnail has loaded.
    pub preview_bytes: Option<Arc<Vec<u8>>>,
}

impl PhotoEntry {
    pub fn id(&self) -> Option<i64> {
        match self.key {
            PhotoKey::Id(id) => Some(id),
            PhotoKey::Local(_) => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.key, PhotoKey::Local(_))
    }

    fn from_wire(photo: Photo, block_date: &str) -> Self {
        PhotoEntry {
            key: PhotoKey::Id(photo.id),
            scope: photo.scope,
            thumb_url: photo.thumb_url,
            full_url: photo.full_url,
            orig_name: photo.orig_name.unwrap_or_else(|| "photo".to_string()),
            uploaded_at: None,
            owner: None,
            block_date: block_date.to_string(),
            orig_width: photo.orig_width,
            orig_height: photo.orig_height,
            preview_bytes: None,
        }
    }
}

/// A not-yet-confirmed upload, shown optimistically.
#[derive(Debug, Clone)]
pub struct PendingUpload {
    pub orig_name: String,
    pub scope: Scope,
    pub block_date: String,
    pub preview_bytes: Arc<Vec<u8>>,
}

#[derive(Debug, Default)]
pub struct PhotoStore {
    photos: Vec<PhotoEntry>,
    next_local: u64,
}

impl PhotoStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PhotoEntry> {
        self.photos.iter()
    }

    pub fn get(&self, key: PhotoKey) -> Option<&PhotoEntry> {
        self.photos.iter().find(|p| p.key == key)
    }

    pub fn get_at(&self, index: usize) -> Option<&PhotoEntry> {
        self.photos.get(index)
    }

    pub fn position_of(&self, key: PhotoKey) -> Option<usize> {
        self.photos.iter().position(|p| p.key == key)
    }

    pub fn contains_id(&self, id: i64) -> bool {
        self.photos.iter().any(|p| p.key == PhotoKey::Id(id))
    }

    /// Snapshot of the current ordering, used by the overlay.
    pub fn keys(&self) -> Vec<PhotoKey> {
        self.photos.iter().map(|p| p.key).collect()
    }

    pub fn clear(&mut self) {
        self.photos.clear();
    }

    /// Merge a feed page. Descriptors whose id is already present are
    /// skipped, so overlapping pages are idempotent. Returns the number of
    /// entries actually added.
    pub fn append_page(&mut self, blocks: Vec<Block>) -> usize {
        let mut added = 0;
        for block in blocks {
            for photo in block.photos {
                if self.contains_id(photo.id) {
                    continue;
                }
                self.photos.push(PhotoEntry::from_wire(photo, &block.date));
                added += 1;
            }
        }
        added
    }

    /// Insert an optimistic upload entry at the top of its date bucket, or
    /// at the very front when no bucket with that date exists yet.
    pub fn insert_pending_upload(&mut self, upload: PendingUpload) -> PhotoKey {
        self.next_local += 1;
        let key = PhotoKey::Local(self.next_local);
        let entry = PhotoEntry {
            key,
            scope: upload.scope,
            thumb_url: String::new(),
            full_url: None,
            orig_name: upload.orig_name,
            uploaded_at: None,
            owner: None,
            block_date: upload.block_date.clone(),
            orig_width: None,
            orig_height: None,
            preview_bytes: Some(upload.preview_bytes),
        };
        let index = self
            .photos
            .iter()
            .position(|p| p.block_date == upload.block_date)
            .unwrap_or(0);
        self.photos.insert(index, entry);
        key
    }

    /// Replace a pending entry in place with the server-confirmed
    /// descriptor. Never duplicates: if the confirmed id somehow already
    /// exists elsewhere, the pending entry is dropped instead.
    pub fn confirm_upload(&mut self, key: PhotoKey, photo: Photo) -> Option<PhotoKey> {
        let index = self.position_of(key)?;
        if self.contains_id(photo.id) {
            tracing::warn!(id = photo.id, "upload confirmed an id already in store");
            self.photos.remove(index);
            return None;
        }
        let entry = &mut self.photos[index];
        entry.key = PhotoKey::Id(photo.id);
        entry.thumb_url = photo.thumb_url;
        entry.full_url = photo.full_url;
        if let Some(name) = photo.orig_name {
            entry.orig_name = name;
        }
        entry.scope = photo.scope;
        entry.orig_width = photo.orig_width;
        entry.orig_height = photo.orig_height;
        Some(entry.key)
    }

    /// Remove by key; unknown keys are a no-op.
    pub fn remove(&mut self, key: PhotoKey) -> bool {
        match self.position_of(key) {
            Some(index) => {
                self.photos.remove(index);
                true
            }
            None => false,
        }
    }

    /// Merge lazily fetched metadata into a confirmed entry.
    pub fn apply_info(&mut self, id: i64, info: &PhotoInfo) {
        if let Some(entry) = self.photos.iter_mut().find(|p| p.key == PhotoKey::Id(id)) {
            if let Some(time) = &info.time {
                entry.uploaded_at = Some(time.clone());
            }
            if let Some(owner) = &info.owner {
                entry.owner = Some(owner.clone());
            }
            if let Some(name) = &info.orig_name {
                entry.orig_name = name.clone();
            }
            if let Some(url) = &info.full_url {
                entry.full_url = Some(url.clone());
            }
        }
    }

    /// Record a full-resolution URL discovered by the resolution pipeline.
    pub fn set_full_url(&mut self, key: PhotoKey, url: String) {
        if let Some(entry) = self.photos.iter_mut().find(|p| p.key == key) {
            entry.full_url = Some(url);
        }
    }

    /// Drop the local preview once the confirmed rendition is displayed.
    pub fn release_preview(&mut self, key: PhotoKey) {
        if let Some(entry) = self.photos.iter_mut().find(|p| p.key == key) {
            entry.preview_bytes = None;
        }
    }

    /// Group consecutive entries by block date, preserving store order.
    pub fn grouped(&self) -> Vec<(&str, Vec<&PhotoEntry>)> {
        let mut groups: Vec<(&str, Vec<&PhotoEntry>)> = Vec::new();
        for entry in &self.photos {
            match groups.last_mut() {
                Some((date, members)) if *date == entry.block_date => members.push(entry),
                _ => groups.push((entry.block_date.as_str(), vec![entry])),
            }
        }
        groups
    }
}

/// Set of selected confirmed photo ids, driving the bulk-action toolbar.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    ids: HashSet<i64>,
}

impl Selection {
    /// Toggle an id; returns whether it is selected afterwards.
    pub fn toggle(&mut self, id: i64) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    pub fn remove(&mut self, id: i64) {
        self.ids.remove(&id);
    }

    pub fn contains(&self, id: i64) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Stable order for sequential deletion.
    pub fn ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.ids.iter().copied().collect();
        ids.sort_unstable();
        ids
    }
}
