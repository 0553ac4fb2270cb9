//! Iced front end for the photo feed: the date-grouped grid, the
//! single-photo overlay, uploads with optimistic entries, and selection
//! with bulk delete.

pub mod image_loader;
pub mod overlay;
pub mod style;

use api_client::{ApiClient, Block, Photo, PhotoInfo, Scope};
use feed::FeedError;
use iced::widget::image::Handle;
use iced::widget::{
    button, checkbox, column, container, image, mouse_area, progress_bar, row, scrollable, text,
    text_input, Column, Row, Space,
};
use iced::{
    executor, keyboard, mouse, window, Application, Command, Element, Event, Length, Settings,
    Subscription, Theme,
};
use image_loader::{full_url_candidates, ImageLoader, LoadedImage, ResolvedFull, RetryOutcome, RetryPolicy};
use overlay::{fit_within, zone_at, Overlay, Zone, TOPBAR_HEIGHT, TOPBAR_HIDE_DELAY};
use session::Session;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use store::{PendingUpload, PhotoKey, PhotoStore, Selection};

pub use image_loader::ImageLoaderError;

const GRID_COLUMNS: usize = 4;
const PROGRESS_TICK: Duration = Duration::from_millis(200);
/// How long a finished upload bar keeps showing 100% before it disappears.
const UPLOAD_DONE_LINGER: Duration = Duration::from_millis(800);
const SCROLL_LOAD_THRESHOLD: f32 = 0.9;

/// Startup parameters handed over by the application shell.
#[derive(Debug, Clone)]
pub struct UiFlags {
    pub server_url: String,
    pub session: Session,
    pub blocks_per_load: usize,
}

pub fn run(flags: UiFlags) -> iced::Result {
    FotolentaUI::run(Settings::with_flags(flags))
}

#[derive(Debug, Clone)]
pub enum Message {
    // feed
    LoadMore,
    Scrolled(f32),
    BlocksLoaded(Result<Vec<Block>, FeedError>),
    SwitchScope(Scope),
    ThumbnailLoaded(PhotoKey, Option<LoadedImage>),
    // overlay
    OpenOverlay(PhotoKey),
    CloseOverlay,
    NextPhoto,
    PrevPhoto,
    OverlayImageLoaded {
        key: PhotoKey,
        generation: u64,
        outcome: RetryOutcome,
    },
    FullResolved {
        key: PhotoKey,
        generation: u64,
        resolved: Option<ResolvedFull>,
        info: Option<PhotoInfo>,
    },
    InfoLoaded(i64, Option<PhotoInfo>),
    NeighborPrefetched(PhotoKey, Option<ResolvedFull>),
    ToggleInfo,
    PointerMoved(f32, f32),
    TopbarTick(u64),
    // session
    ShowLogin,
    CancelLogin,
    LoginUsernameChanged(String),
    LoginPasswordChanged(String),
    SubmitLogin,
    LoginFinished(Result<String, String>),
    Logout,
    // upload
    PickFiles,
    FilesPicked(Vec<(String, Arc<Vec<u8>>)>),
    ProgressTick,
    UploadFinished {
        key: PhotoKey,
        result: Result<Photo, String>,
    },
    UploadBarExpired(PhotoKey),
    // selection and deletion
    ToggleSelect(i64),
    ClearSelection,
    RequestDeleteSelected,
    RequestDeleteCurrent,
    ConfirmDelete,
    CancelDelete,
    PhotoDeleted {
        id: i64,
        result: Result<(), String>,
    },
    // chrome
    DismissError(usize),
    EscapePressed,
    WindowResized(f32, f32),
}

#[derive(Debug, Clone, Default)]
struct LoginDialog {
    username: String,
    password: String,
    error: Option<String>,
    submitting: bool,
}

#[derive(Debug, Clone, Copy)]
enum DeleteRequest {
    Current(i64),
    Selected,
}

pub struct FotolentaUI {
    api_base: String,
    session: Session,
    loader: ImageLoader,
    store: PhotoStore,
    selection: Selection,
    scope: Scope,
    blocks_per_load: usize,
    loaded_blocks: usize,
    loading: bool,
    feed_exhausted: bool,
    thumbnails: HashMap<PhotoKey, Handle>,
    thumb_requested: HashSet<PhotoKey>,
    full_cache: HashMap<PhotoKey, LoadedImage>,
    overlay: Option<Overlay>,
    overlay_image: Option<LoadedImage>,
    overlay_seq: u64,
    topbar_timer: u64,
    uploads: HashMap<PhotoKey, f32>,
    login: Option<LoginDialog>,
    pending_delete: Option<DeleteRequest>,
    delete_queue: VecDeque<i64>,
    errors: Vec<String>,
    viewport: (f32, f32),
}

impl Application for FotolentaUI {
    type Executor = executor::Default;
    type Message = Message;
    type Theme = Theme;
    type Flags = UiFlags;

    fn new(flags: UiFlags) -> (Self, Command<Message>) {
        let mut app = FotolentaUI {
            api_base: flags.server_url,
            session: flags.session,
            loader: ImageLoader::new(),
            store: PhotoStore::new(),
            selection: Selection::default(),
            scope: Scope::Shared,
            blocks_per_load: flags.blocks_per_load.max(1),
            loaded_blocks: 0,
            loading: false,
            feed_exhausted: false,
            thumbnails: HashMap::new(),
            thumb_requested: HashSet::new(),
            full_cache: HashMap::new(),
            overlay: None,
            overlay_image: None,
            overlay_seq: 0,
            topbar_timer: 0,
            uploads: HashMap::new(),
            login: None,
            pending_delete: None,
            delete_queue: VecDeque::new(),
            errors: Vec::new(),
            viewport: (1280.0, 800.0),
        };
        let load = app.load_feed_page();
        (app, load)
    }

    fn title(&self) -> String {
        String::from("Fotolenta")
    }

    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self, message)))]
    fn update(&mut self, message: Message) -> Command<Message> {
        match message {
            Message::LoadMore => return self.load_feed_page(),
            Message::Scrolled(offset) => {
                if offset >= SCROLL_LOAD_THRESHOLD {
                    return self.load_feed_page();
                }
            }
            Message::BlocksLoaded(Ok(blocks)) => {
                self.loading = false;
                if blocks.len() < self.blocks_per_load {
                    self.feed_exhausted = true;
                }
                if !blocks.is_empty() {
                    self.loaded_blocks += blocks.len();
                    let added = self.store.append_page(blocks);
                    tracing::debug!(added, total = self.store.len(), "feed page merged");
                    return self.thumbnail_commands();
                }
            }
            Message::BlocksLoaded(Err(FeedError::Unauthorized)) => {
                return self.handle_session_expired();
            }
            Message::BlocksLoaded(Err(err)) => {
                self.loading = false;
                self.errors.push(format!("Failed to load photos: {err}"));
            }
            Message::SwitchScope(scope) => {
                if scope == self.scope {
                    return Command::none();
                }
                if scope == Scope::Personal && !self.session.is_logged_in() {
                    self.login = Some(LoginDialog::default());
                    return Command::none();
                }
                self.scope = scope;
                return self.reset_and_reload();
            }
            Message::ThumbnailLoaded(key, Some(img)) => {
                self.thumbnails.insert(key, img.handle);
                self.store.release_preview(key);
            }
            Message::ThumbnailLoaded(key, None) => {
                tracing::debug!(?key, "thumbnail failed to load");
            }
            Message::OpenOverlay(key) => {
                if !self.selection.is_empty() {
                    if let PhotoKey::Id(id) = key {
                        self.selection.toggle(id);
                    }
                    return Command::none();
                }
                self.overlay_seq += 1;
                self.overlay = Overlay::open(self.store.keys(), key, self.overlay_seq);
                self.overlay_image = None;
                return self.show_current();
            }
            Message::CloseOverlay => {
                self.close_overlay();
            }
            Message::NextPhoto => {
                if let Some(ov) = &mut self.overlay {
                    if ov.next() {
                        self.overlay_image = None;
                        return self.show_current();
                    }
                }
            }
            Message::PrevPhoto => {
                if let Some(ov) = &mut self.overlay {
                    if ov.prev() {
                        self.overlay_image = None;
                        return self.show_current();
                    }
                }
            }
            Message::OverlayImageLoaded {
                key,
                generation,
                outcome,
            } => {
                if self.is_current(key, generation) && !self.full_cache.contains_key(&key) {
                    if let Some(img) = outcome.image {
                        tracing::debug!(?key, attempts = outcome.attempts, "overlay image ready");
                        self.overlay_image = Some(img);
                    }
                }
            }
            Message::FullResolved {
                key,
                generation,
                resolved,
                info,
            } => {
                if let (PhotoKey::Id(id), Some(info)) = (key, &info) {
                    self.store.apply_info(id, info);
                }
                if let Some(resolved) = resolved {
                    self.store.set_full_url(key, resolved.url);
                    if self.is_current(key, generation) {
                        self.overlay_image = Some(resolved.image.clone());
                    }
                    self.full_cache.insert(key, resolved.image);
                }
            }
            Message::InfoLoaded(id, Some(info)) => {
                self.store.apply_info(id, &info);
            }
            Message::InfoLoaded(id, None) => {
                tracing::debug!(id, "photo info unavailable");
            }
            Message::NeighborPrefetched(key, Some(resolved)) => {
                self.store.set_full_url(key, resolved.url);
                self.full_cache.insert(key, resolved.image);
            }
            Message::NeighborPrefetched(_, None) => {}
            Message::ToggleInfo => {
                if let Some(ov) = &mut self.overlay {
                    ov.info_open = !ov.info_open;
                    ov.topbar_visible = true;
                }
            }
            Message::PointerMoved(x, y) => {
                if let Some(ov) = &mut self.overlay {
                    ov.zone = zone_at(x, self.viewport.0);
                    ov.topbar_visible = true;
                    ov.hovering_topbar = y <= TOPBAR_HEIGHT;
                    self.topbar_timer += 1;
                    let timer = self.topbar_timer;
                    return Command::perform(
                        async move {
                            tokio::time::sleep(TOPBAR_HIDE_DELAY).await;
                            timer
                        },
                        Message::TopbarTick,
                    );
                }
            }
            Message::TopbarTick(timer) => {
                if timer == self.topbar_timer {
                    if let Some(ov) = &mut self.overlay {
                        if !ov.info_open && !ov.hovering_topbar {
                            ov.topbar_visible = false;
                        }
                    }
                }
            }
            Message::ShowLogin => {
                self.login = Some(LoginDialog::default());
            }
            Message::CancelLogin => {
                self.login = None;
            }
            Message::LoginUsernameChanged(value) => {
                if let Some(dialog) = &mut self.login {
                    dialog.username = value;
                }
            }
            Message::LoginPasswordChanged(value) => {
                if let Some(dialog) = &mut self.login {
                    dialog.password = value;
                }
            }
            Message::SubmitLogin => {
                if let Some(dialog) = &mut self.login {
                    if dialog.username.is_empty() || dialog.submitting {
                        return Command::none();
                    }
                    dialog.submitting = true;
                    dialog.error = None;
                    let api = ApiClient::new(self.api_base.clone());
                    let username = dialog.username.clone();
                    let password = dialog.password.clone();
                    return Command::perform(
                        async move {
                            api.login(&username, &password)
                                .await
                                .map_err(|e| e.to_string())
                        },
                        Message::LoginFinished,
                    );
                }
            }
            Message::LoginFinished(Ok(token)) => {
                let username = self
                    .login
                    .take()
                    .map(|d| d.username)
                    .unwrap_or_default();
                if let Err(err) = self.session.login(token, username) {
                    tracing::warn!(%err, "failed to persist session token");
                }
                return self.reset_and_reload();
            }
            Message::LoginFinished(Err(err)) => {
                if let Some(dialog) = &mut self.login {
                    dialog.submitting = false;
                    dialog.error = Some(err);
                }
            }
            Message::Logout => {
                self.session.clear();
                self.scope = Scope::Shared;
                return self.reset_and_reload();
            }
            Message::PickFiles => {
                return Command::perform(pick_image_files(), Message::FilesPicked);
            }
            Message::FilesPicked(files) => {
                let mut commands = Vec::new();
                for (name, bytes) in files {
                    let key = self.store.insert_pending_upload(PendingUpload {
                        orig_name: name.clone(),
                        scope: self.scope,
                        block_date: feed::todays_block_date(),
                        preview_bytes: bytes.clone(),
                    });
                    self.uploads.insert(key, 0.0);
                    self.thumbnails
                        .insert(key, Handle::from_memory((*bytes).clone()));
                    let api = self.api();
                    let scope = self.scope;
                    commands.push(Command::perform(
                        async move { feed::upload_photo(api, name, bytes, scope).await },
                        move |result| Message::UploadFinished {
                            key,
                            result: result.map_err(|e| e.to_string()),
                        },
                    ));
                }
                return Command::batch(commands);
            }
            Message::ProgressTick => {
                for value in self.uploads.values_mut() {
                    if *value < 100.0 {
                        *value = feed::advance_progress(*value);
                    }
                }
            }
            Message::UploadFinished { key, result } => {
                self.uploads.remove(&key);
                match result {
                    Ok(photo) => match self.store.confirm_upload(key, photo) {
                        Some(confirmed) => {
                            if let Some(handle) = self.thumbnails.remove(&key) {
                                self.thumbnails.insert(confirmed, handle);
                            }
                            if let Some(ov) = &mut self.overlay {
                                ov.replace_key(key, confirmed);
                            }
                            // the bar jumps to done and lingers briefly
                            self.uploads.insert(confirmed, 100.0);
                            let linger = Command::perform(
                                async move {
                                    tokio::time::sleep(UPLOAD_DONE_LINGER).await;
                                    confirmed
                                },
                                Message::UploadBarExpired,
                            );
                            // refresh with the server-side rendition
                            self.thumb_requested.remove(&confirmed);
                            let refresh = self.thumbnail_command_for(confirmed);
                            return Command::batch([linger, refresh]);
                        }
                        None => {
                            self.thumbnails.remove(&key);
                        }
                    },
                    Err(err) => {
                        self.store.remove(key);
                        self.thumbnails.remove(&key);
                        let emptied = self.overlay.as_mut().map(|ov| ov.remove(key));
                        if emptied == Some(true) {
                            self.close_overlay();
                        }
                        self.errors.push(format!("Upload failed: {err}"));
                    }
                }
            }
            Message::UploadBarExpired(key) => {
                self.uploads.remove(&key);
            }
            Message::ToggleSelect(id) => {
                self.selection.toggle(id);
            }
            Message::ClearSelection => {
                self.selection.clear();
            }
            Message::RequestDeleteSelected => {
                if !self.selection.is_empty() {
                    self.pending_delete = Some(DeleteRequest::Selected);
                }
            }
            Message::RequestDeleteCurrent => {
                if let Some(id) = self
                    .overlay
                    .as_ref()
                    .and_then(|ov| ov.current())
                    .and_then(|key| self.store.get(key))
                    .and_then(|entry| entry.id())
                {
                    self.pending_delete = Some(DeleteRequest::Current(id));
                }
            }
            Message::ConfirmDelete => {
                let request = self.pending_delete.take();
                match request {
                    Some(DeleteRequest::Current(id)) => {
                        self.delete_queue = VecDeque::from(vec![id]);
                    }
                    Some(DeleteRequest::Selected) => {
                        self.delete_queue = self.selection.ids().into();
                    }
                    None => return Command::none(),
                }
                return self.delete_next();
            }
            Message::CancelDelete => {
                self.pending_delete = None;
            }
            Message::PhotoDeleted { id, result } => {
                match result {
                    Ok(()) => {
                        let key = PhotoKey::Id(id);
                        self.selection.remove(id);
                        self.store.remove(key);
                        self.thumbnails.remove(&key);
                        self.full_cache.remove(&key);
                        match self.overlay.as_mut().map(|ov| ov.remove(key)) {
                            Some(true) => {
                                self.close_overlay();
                            }
                            Some(false) => {
                                // overlay moved to a neighbor
                                self.overlay_image = None;
                                let follow_up = self.show_current();
                                let chain = self.delete_next();
                                return Command::batch([follow_up, chain]);
                            }
                            None => {}
                        }
                    }
                    Err(err) => {
                        self.errors.push(format!("Failed to delete photo: {err}"));
                    }
                }
                // continue the queue regardless of individual failures
                return self.delete_next();
            }
            Message::DismissError(index) => {
                if index < self.errors.len() {
                    self.errors.remove(index);
                }
            }
            Message::EscapePressed => {
                if let Some(ov) = &mut self.overlay {
                    if ov.info_open {
                        ov.info_open = false;
                        return Command::none();
                    }
                }
                if self.pending_delete.is_some() {
                    self.pending_delete = None;
                } else if self.overlay.is_some() {
                    self.close_overlay();
                } else if self.login.is_some() {
                    self.login = None;
                } else {
                    self.selection.clear();
                }
            }
            Message::WindowResized(width, height) => {
                self.viewport = (width, height);
            }
        }
        Command::none()
    }

    fn subscription(&self) -> Subscription<Message> {
        let mut subs: Vec<Subscription<Message>> = Vec::new();

        subs.push(iced::event::listen_with(|event, _status| match event {
            Event::Keyboard(keyboard::Event::KeyPressed {
                key: keyboard::Key::Named(named),
                ..
            }) => match named {
                keyboard::key::Named::Escape => Some(Message::EscapePressed),
                keyboard::key::Named::ArrowLeft => Some(Message::PrevPhoto),
                keyboard::key::Named::ArrowRight => Some(Message::NextPhoto),
                _ => None,
            },
            Event::Mouse(mouse::Event::CursorMoved { position }) => {
                Some(Message::PointerMoved(position.x, position.y))
            }
            Event::Window(_, window::Event::Resized { width, height }) => {
                Some(Message::WindowResized(width as f32, height as f32))
            }
            _ => None,
        }));

        if !self.uploads.is_empty() {
            subs.push(iced::time::every(PROGRESS_TICK).map(|_| Message::ProgressTick));
        }

        Subscription::batch(subs)
    }

    fn view(&self) -> Element<Message> {
        if let Some(ov) = &self.overlay {
            return self.view_overlay(ov);
        }
        self.view_grid()
    }
}

impl FotolentaUI {
    fn api(&self) -> ApiClient {
        ApiClient::with_token(self.api_base.clone(), self.session.token().map(String::from))
    }

    /// Closing the overlay releases every full-size image it pinned.
    fn close_overlay(&mut self) {
        self.overlay = None;
        self.overlay_image = None;
        self.full_cache.clear();
    }

    fn is_current(&self, key: PhotoKey, generation: u64) -> bool {
        self.overlay
            .as_ref()
            .map(|ov| ov.current() == Some(key) && ov.generation() == generation)
            .unwrap_or(false)
    }

    fn load_feed_page(&mut self) -> Command<Message> {
        if self.loading || self.feed_exhausted {
            return Command::none();
        }
        self.loading = true;
        let api = self.api();
        let scope = self.scope;
        let start = self.loaded_blocks;
        let count = self.blocks_per_load;
        Command::perform(
            async move { feed::load_blocks(&api, scope, start, count).await },
            Message::BlocksLoaded,
        )
    }

    fn reset_and_reload(&mut self) -> Command<Message> {
        self.store.clear();
        self.selection.clear();
        self.thumbnails.clear();
        self.thumb_requested.clear();
        self.full_cache.clear();
        self.overlay = None;
        self.overlay_image = None;
        self.loaded_blocks = 0;
        self.loading = false;
        self.feed_exhausted = false;
        self.load_feed_page()
    }

    fn handle_session_expired(&mut self) -> Command<Message> {
        tracing::info!("session expired, dropping credentials");
        self.loading = false;
        self.session.clear();
        self.scope = Scope::Shared;
        self.errors
            .push("Session expired, please sign in again".to_string());
        self.reset_and_reload()
    }

    fn thumbnail_command_for(&mut self, key: PhotoKey) -> Command<Message> {
        let Some(entry) = self.store.get(key) else {
            return Command::none();
        };
        if entry.thumb_url.is_empty() || !self.thumb_requested.insert(key) {
            return Command::none();
        }
        let api = self.api();
        let loader = self.loader.clone();
        let url = self.session.image_url(&entry.thumb_url, entry.scope);
        Command::perform(
            async move { loader.load_thumbnail(&api, &url).await.ok() },
            move |img| Message::ThumbnailLoaded(key, img),
        )
    }

    fn thumbnail_commands(&mut self) -> Command<Message> {
        let missing: Vec<PhotoKey> = self
            .store
            .iter()
            .filter(|e| !e.is_pending())
            .map(|e| e.key)
            .filter(|key| !self.thumbnails.contains_key(key) && !self.thumb_requested.contains(key))
            .collect();
        let commands: Vec<Command<Message>> = missing
            .into_iter()
            .map(|key| self.thumbnail_command_for(key))
            .collect();
        Command::batch(commands)
    }

    /// Kick off everything the overlay needs for its current photo: the
    /// retried base image, full-size resolution, lazy metadata, and
    /// neighbor prefetch.
    fn show_current(&mut self) -> Command<Message> {
        let Some(ov) = &self.overlay else {
            return Command::none();
        };
        let Some(key) = ov.current() else {
            return Command::none();
        };
        let generation = ov.generation();
        let Some(entry) = self.store.get(key) else {
            return Command::none();
        };

        // Pending uploads only have their local preview.
        if let Some(bytes) = &entry.preview_bytes {
            self.overlay_image = Some(LoadedImage {
                handle: Handle::from_memory((**bytes).clone()),
                width: entry.orig_width.unwrap_or(0),
                height: entry.orig_height.unwrap_or(0),
            });
            return Command::none();
        }

        let mut commands = Vec::new();

        if let Some(full) = self.full_cache.get(&key) {
            self.overlay_image = Some(full.clone());
        } else {
            let api = self.api();
            let loader = self.loader.clone();
            let url = self.session.image_url(&entry.thumb_url, entry.scope);
            commands.push(Command::perform(
                async move {
                    loader
                        .load_with_retries(&api, &url, &RetryPolicy::default())
                        .await
                },
                move |outcome| Message::OverlayImageLoaded {
                    key,
                    generation,
                    outcome,
                },
            ));

            let api = self.api();
            let loader = self.loader.clone();
            let scope = entry.scope;
            let id = entry.id();
            let candidates =
                full_url_candidates(entry.full_url.as_deref(), None, &entry.thumb_url);
            commands.push(Command::perform(
                async move {
                    if let Some(resolved) = loader.resolve_full(&api, scope, &candidates).await {
                        return (Some(resolved), None);
                    }
                    let Some(id) = id else {
                        return (None, None);
                    };
                    // ask the server for the authoritative URL and retry once
                    match api.photo_info(id).await {
                        Ok(info) => {
                            let retry = match &info.full_url {
                                Some(url) if !candidates.contains(url) => {
                                    loader
                                        .resolve_full(&api, scope, std::slice::from_ref(url))
                                        .await
                                }
                                _ => None,
                            };
                            (retry, Some(info))
                        }
                        Err(err) => {
                            tracing::debug!(id, %err, "photo info lookup failed");
                            (None, None)
                        }
                    }
                },
                move |(resolved, info)| Message::FullResolved {
                    key,
                    generation,
                    resolved,
                    info,
                },
            ));
        }

        if let Some(id) = entry.id() {
            if entry.uploaded_at.is_none() || entry.owner.is_none() {
                let api = self.api();
                commands.push(Command::perform(
                    async move { api.photo_info(id).await.ok() },
                    move |info| Message::InfoLoaded(id, info),
                ));
            }
        }

        commands.extend(self.prefetch_neighbors());
        Command::batch(commands)
    }

    /// Warm the cache for overlay neighbors. Only photos with a known
    /// full-size URL are prefetched, and personal photos are skipped so no
    /// token-decorated request is issued speculatively.
    fn prefetch_neighbors(&self) -> Vec<Command<Message>> {
        let Some(ov) = &self.overlay else {
            return Vec::new();
        };
        let (prev, next) = ov.neighbors();
        let mut commands = Vec::new();
        for key in [prev, next].into_iter().flatten() {
            if self.full_cache.contains_key(&key) {
                continue;
            }
            let Some(entry) = self.store.get(key) else {
                continue;
            };
            if entry.scope == Scope::Personal || entry.is_pending() {
                continue;
            }
            let Some(url) = entry.full_url.clone() else {
                continue;
            };
            let loader = self.loader.clone();
            let api = self.api();
            commands.push(Command::perform(
                async move { loader.resolve_full(&api, Scope::Shared, &[url]).await },
                move |resolved| Message::NeighborPrefetched(key, resolved),
            ));
        }
        commands
    }

    fn delete_next(&mut self) -> Command<Message> {
        let Some(id) = self.delete_queue.pop_front() else {
            return Command::none();
        };
        let api = self.api();
        Command::perform(
            async move { api.delete_photo(id).await.map_err(|e| e.to_string()) },
            move |result| Message::PhotoDeleted { id, result },
        )
    }

    fn view_grid(&self) -> Element<Message> {
        let mut header = row![text("Fotolenta").size(24)]
            .spacing(style::Palette::SPACING)
            .align_items(iced::Alignment::Center);

        for (label, scope) in [("Shared", Scope::Shared), ("My photos", Scope::Personal)] {
            let mut btn = button(text(label)).style(style::button_primary());
            if scope != self.scope {
                btn = btn.on_press(Message::SwitchScope(scope));
            }
            header = header.push(btn);
        }

        header = header.push(Space::with_width(Length::Fill));
        if self.session.is_logged_in() {
            if let Some(name) = self.session.display_name() {
                header = header.push(text(name.to_string()).size(16));
            }
            header = header.push(
                button("Upload")
                    .style(style::button_primary())
                    .on_press(Message::PickFiles),
            );
            header = header.push(
                button("Sign out")
                    .style(style::button_primary())
                    .on_press(Message::Logout),
            );
        } else {
            header = header.push(
                button("Sign in")
                    .style(style::button_primary())
                    .on_press(Message::ShowLogin),
            );
        }

        let mut page = column![header].spacing(style::Palette::SPACING);

        if let Some(banner) = self.view_errors() {
            page = page.push(banner);
        }
        if !self.selection.is_empty() {
            page = page.push(self.view_selection_bar());
        }
        if let Some(dialog) = &self.login {
            page = page.push(self.view_login(dialog));
        }
        if self.pending_delete.is_some() {
            page = page.push(self.view_confirm_delete());
        }

        let grid: Element<Message> = if self.store.is_empty() {
            let placeholder = if self.loading {
                "Loading photos..."
            } else {
                "No photos yet"
            };
            text(placeholder).size(16).into()
        } else {
            let mut blocks = Column::new().spacing(style::Palette::SPACING);
            for (date, entries) in self.store.grouped() {
                blocks = blocks.push(text(date.to_string()).size(18));
                for chunk in entries.chunks(GRID_COLUMNS) {
                    let mut cells = Row::new().spacing(10);
                    for entry in chunk {
                        cells = cells.push(self.view_thumb(entry));
                    }
                    blocks = blocks.push(cells);
                }
            }
            if !self.feed_exhausted {
                blocks = blocks.push(
                    button("Load more")
                        .style(style::button_primary())
                        .on_press(Message::LoadMore),
                );
            }
            scrollable(blocks)
                .height(Length::Fill)
                .on_scroll(|viewport| Message::Scrolled(viewport.relative_offset().y))
                .into()
        };
        page = page.push(grid);

        container(page)
            .width(Length::Fill)
            .height(Length::Fill)
            .padding(20)
            .into()
    }

    fn view_thumb<'a>(&'a self, entry: &'a store::PhotoEntry) -> Element<'a, Message> {
        let size = style::Palette::THUMB_SIZE;
        let picture: Element<Message> = if let Some(handle) = self.thumbnails.get(&entry.key) {
            image(handle.clone())
                .width(Length::Fixed(size))
                .height(Length::Fixed(size))
                .into()
        } else {
            container(text("..."))
                .width(Length::Fixed(size))
                .height(Length::Fixed(size))
                .center_x()
                .center_y()
                .into()
        };

        let selected = entry.id().map(|id| self.selection.contains(id)).unwrap_or(false);
        let mut cell = column![button(picture)
            .style(style::button_thumb(selected))
            .on_press(Message::OpenOverlay(entry.key))]
        .spacing(4)
        .align_items(iced::Alignment::Center);

        if let Some(progress) = self.uploads.get(&entry.key) {
            cell = cell.push(progress_bar(0.0..=100.0, *progress).width(Length::Fixed(size)));
        }
        if let Some(id) = entry.id() {
            if self.session.is_logged_in() {
                cell = cell.push(
                    checkbox("", self.selection.contains(id))
                        .on_toggle(move |_| Message::ToggleSelect(id)),
                );
            }
        }
        cell.into()
    }

    fn view_selection_bar(&self) -> Element<Message> {
        row![
            text(format!("{} selected", self.selection.len())).size(16),
            button("Delete selected")
                .style(style::button_danger())
                .on_press(Message::RequestDeleteSelected),
            button("Clear")
                .style(style::button_primary())
                .on_press(Message::ClearSelection),
        ]
        .spacing(10)
        .align_items(iced::Alignment::Center)
        .into()
    }

    fn view_errors(&self) -> Option<Element<Message>> {
        if self.errors.is_empty() {
            return None;
        }
        let mut list = Column::new().spacing(5);
        for (i, msg) in self.errors.iter().enumerate() {
            list = list.push(
                row![
                    text(msg.clone()).size(16),
                    button("Dismiss")
                        .style(style::button_primary())
                        .on_press(Message::DismissError(i))
                ]
                .spacing(10)
                .align_items(iced::Alignment::Center),
            );
        }
        Some(
            container(list)
                .style(style::error_banner())
                .padding(10)
                .width(Length::Fill)
                .into(),
        )
    }

    fn view_login(&self, dialog: &LoginDialog) -> Element<Message> {
        let mut card = column![
            text("Sign in").size(18),
            text_input("Username", &dialog.username)
                .style(style::text_input_basic())
                .on_input(Message::LoginUsernameChanged),
            text_input("Password", &dialog.password)
                .style(style::text_input_basic())
                .secure(true)
                .on_input(Message::LoginPasswordChanged)
                .on_submit(Message::SubmitLogin),
        ]
        .spacing(10);
        if let Some(err) = &dialog.error {
            card = card.push(text(err.clone()).size(14));
        }
        card = card.push(
            row![
                button(if dialog.submitting { "Signing in..." } else { "Sign in" })
                    .style(style::button_primary())
                    .on_press(Message::SubmitLogin),
                button("Cancel")
                    .style(style::button_primary())
                    .on_press(Message::CancelLogin),
            ]
            .spacing(10),
        );
        container(card)
            .style(style::card())
            .padding(16)
            .into()
    }

    fn view_confirm_delete(&self) -> Element<Message> {
        let prompt = match self.pending_delete {
            Some(DeleteRequest::Selected) => {
                format!("Delete {} selected photos?", self.selection.len())
            }
            _ => "Delete this photo?".to_string(),
        };
        container(
            column![
                text(prompt).size(16),
                row![
                    button("Delete")
                        .style(style::button_danger())
                        .on_press(Message::ConfirmDelete),
                    button("Cancel")
                        .style(style::button_primary())
                        .on_press(Message::CancelDelete),
                ]
                .spacing(10)
            ]
            .spacing(10),
        )
        .style(style::card())
        .padding(16)
        .into()
    }

    fn view_overlay(&self, ov: &Overlay) -> Element<Message> {
        let current = ov.current();
        let entry = current.and_then(|key| self.store.get(key));

        let (picture, natural): (Element<Message>, (u32, u32)) = match &self.overlay_image {
            Some(img) => (image(img.handle.clone()).into(), (img.width, img.height)),
            None => match current.and_then(|key| self.thumbnails.get(&key)) {
                Some(handle) => (image(handle.clone()).into(), (0, 0)),
                None => (text("Loading...").size(18).into(), (0, 0)),
            },
        };
        let (w, h) = fit_within(natural, self.viewport);
        let framed = container(picture)
            .width(Length::Fixed(w))
            .height(Length::Fixed(h))
            .center_x()
            .center_y();

        let click_target = match ov.zone {
            Zone::Left if ov.has_prev() => Message::PrevPhoto,
            Zone::Right if ov.has_next() => Message::NextPhoto,
            Zone::Left | Zone::Right | Zone::Center => Message::CloseOverlay,
        };

        // arrows only appear while the pointer sits in their zone
        let prev_col: Element<Message> = if ov.show_prev_control() {
            button(text("<").size(32))
                .style(style::button_primary())
                .on_press(Message::PrevPhoto)
                .into()
        } else {
            Space::with_width(Length::Fixed(48.0)).into()
        };
        let next_col: Element<Message> = if ov.show_next_control() {
            button(text(">").size(32))
                .style(style::button_primary())
                .on_press(Message::NextPhoto)
                .into()
        } else {
            Space::with_width(Length::Fixed(48.0)).into()
        };

        let stage = row![
            prev_col,
            mouse_area(
                container(framed)
                    .width(Length::Fill)
                    .height(Length::Fill)
                    .center_x()
                    .center_y()
            )
            .on_press(click_target),
            next_col,
        ]
        .align_items(iced::Alignment::Center)
        .height(Length::Fill);

        let mut page = Column::new();
        if ov.topbar_visible {
            let mut bar = row![].spacing(10).align_items(iced::Alignment::Center);
            if let Some(entry) = entry {
                bar = bar.push(text(entry.orig_name.clone()).size(16));
                if let Some(time) = &entry.uploaded_at {
                    bar = bar.push(text(time.clone()).size(14));
                }
            }
            bar = bar.push(Space::with_width(Length::Fill));
            bar = bar.push(
                button("Info")
                    .style(style::button_primary())
                    .on_press(Message::ToggleInfo),
            );
            if self.session.is_logged_in()
                && entry.map(|e| e.id().is_some()).unwrap_or(false)
            {
                bar = bar.push(
                    button("Delete")
                        .style(style::button_danger())
                        .on_press(Message::RequestDeleteCurrent),
                );
            }
            bar = bar.push(
                button("Close")
                    .style(style::button_primary())
                    .on_press(Message::CloseOverlay),
            );
            page = page.push(
                container(bar)
                    .style(style::overlay_topbar())
                    .padding(10)
                    .width(Length::Fill),
            );
        }
        if ov.info_open {
            if let Some(entry) = entry {
                let mut info = column![text(entry.orig_name.clone()).size(16)].spacing(4);
                if let Some(time) = &entry.uploaded_at {
                    info = info.push(text(format!("Uploaded {time}")).size(14));
                }
                if let Some(owner) = &entry.owner {
                    info = info.push(text(format!("By {owner}")).size(14));
                }
                page = page.push(container(info).style(style::card()).padding(10));
            }
        }
        if self.pending_delete.is_some() {
            page = page.push(self.view_confirm_delete());
        }
        page = page.push(stage);

        container(page)
            .style(style::overlay_backdrop())
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }
}

/// Open the platform file picker and read the chosen images into memory.
async fn pick_image_files() -> Vec<(String, Arc<Vec<u8>>)> {
    let Some(picked) = rfd::AsyncFileDialog::new()
        .add_filter("images", &["jpg", "jpeg", "png", "gif", "webp", "bmp"])
        .set_title("Upload photos")
        .pick_files()
        .await
    else {
        return Vec::new();
    };
    futures::future::join_all(picked.into_iter().map(|handle| async move {
        let bytes = handle.read().await;
        (handle.file_name(), Arc::new(bytes))
    }))
    .await
}
