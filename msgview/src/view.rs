/*
 * msgview - message view
 *
 * Copyright 2024 msgview contributors
 *
 * This file is part of msgview.
 *
 * msgview is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * msgview is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with msgview. If not, see <http://www.gnu.org/licenses/>.
 */

//! The single message view: loads one message through a
//! [`MessagingController`] and accepts user actions in every state.
//!
//! Controller callbacks are queued by a [`ViewListener`] and applied on the
//! UI thread by [`MessageView::process_events`]. A result is applied only if
//! it belongs to the fetch the view is currently waiting for.

use std::{collections::VecDeque, path::PathBuf, sync::Arc};

use crossbeam::channel::{unbounded, Receiver};
use msglib::{
    conf::AttachmentSettings, Error, ErrorKind, FetchRequest, MessageListener,
    MessagingController, Result, SaveId,
};

use crate::{slot, surface::MessageSurface};

mod actions;
pub use actions::*;
mod events;
pub use events::*;
mod state;
pub use state::*;


/// A save this view started. Saves finish in any order, and other views
/// of the same message see them too, so they are matched by id.
#[derive(Debug)]
struct InFlightSave {
    id: SaveId,
    open: bool,
}

pub struct MessageView {
    controller: Arc<dyn MessagingController>,
    request: FetchRequest,
    state: MessageViewState,
    surface: Option<Box<dyn MessageSurface>>,
    listener: Arc<dyn MessageListener>,
    receiver: Receiver<ViewEvent>,
    effects: VecDeque<Effect>,
    saves: Vec<InFlightSave>,
    download_dir: Option<PathBuf>,
}

impl std::fmt::Debug for MessageView {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        fmt.debug_struct(stringify!(MessageView))
            .field("controller", &self.controller)
            .field("request", &self.request)
            .field("state", &self.state)
            .field("attached", &self.surface.is_some())
            .field("effects", &self.effects)
            .field("saves", &self.saves)
            .finish()
    }
}

impl std::fmt::Display for MessageView {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.state, fmt)
    }
}

impl Drop for MessageView {
    fn drop(&mut self) {
        self.controller.remove_listener(&self.listener);
    }
}

impl MessageView {
    pub fn new(controller: Arc<dyn MessagingController>, request: FetchRequest) -> Self {
        let (sender, receiver) = unbounded();
        Self {
            controller,
            request,
            state: MessageViewState::default(),
            surface: None,
            listener: Arc::new(ViewListener::new(sender)),
            receiver,
            effects: VecDeque::new(),
            saves: vec![],
            download_dir: None,
        }
    }

    /// Use the controller installed in the process-wide [`slot`].
    pub fn from_current(request: FetchRequest) -> Result<Self> {
        let controller = slot::current().ok_or_else(|| {
            Error::new("No messaging controller is installed.").set_kind(ErrorKind::Configuration)
        })?;
        Ok(Self::new(controller, request))
    }

    /// Where downloaded and viewed attachments are saved. Without one, the
    /// default from [`AttachmentSettings::download_dir`] is used.
    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = Some(dir.into());
        self
    }

    pub fn state(&self) -> &MessageViewState {
        &self.state
    }

    pub fn request(&self) -> &FetchRequest {
        &self.request
    }

    pub fn is_attached(&self) -> bool {
        self.surface.is_some()
    }

    /// Start showing on `surface`. Loads the message unless it is already
    /// loading or loaded.
    pub fn attach(&mut self, surface: Box<dyn MessageSurface>) {
        self.surface = Some(surface);
        self.controller.add_listener(self.listener.clone());
        match self.state {
            MessageViewState::Idle { .. } | MessageViewState::Failed { .. } => self.start_fetch(),
            MessageViewState::Loading { .. } | MessageViewState::Loaded { .. } => self.render(),
        }
    }

    /// Stop showing. Results that arrive later still update the state, but
    /// nothing is rendered.
    pub fn detach(&mut self) -> Option<Box<dyn MessageSurface>> {
        self.controller.remove_listener(&self.listener);
        self.surface.take()
    }

    /// Load again after a failure. Returns `false` in any other state.
    pub fn retry(&mut self) -> bool {
        if !self.state.is_failed() {
            return false;
        }
        self.start_fetch();
        true
    }

    /// Apply queued controller results. Returns how many were applied.
    pub fn process_events(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.receiver.try_recv() {
            if self.apply(event) {
                applied += 1;
            }
        }
        applied
    }

    pub fn take_effects(&mut self) -> Vec<Effect> {
        self.effects.drain(..).collect()
    }

    pub fn on_click(&mut self, control: ControlId) {
        log::trace!("MessageView::on_click {:?} while {}", control, self.state);
        match control {
            ControlId::Reply => self.compose(ComposeKind::Reply),
            ControlId::ReplyAll => self.compose(ComposeKind::ReplyAll),
            ControlId::Delete => self.delete(),
            ControlId::Next => self.next(),
            ControlId::Previous => self.previous(),
            ControlId::ShowPictures => self.show_pictures(),
            ControlId::Download(idx) => self.save_attachment(idx, false),
            ControlId::View(idx) => self.save_attachment(idx, true),
        }
    }

    /// Returns `true` if the item was handled.
    pub fn handle_menu_item(&mut self, item: MenuItem) -> bool {
        log::trace!("MessageView::handle_menu_item {:?} while {}", item, self.state);
        match item {
            MenuItem::Delete => self.delete(),
            MenuItem::Reply => self.compose(ComposeKind::Reply),
            MenuItem::ReplyAll => self.compose(ComposeKind::ReplyAll),
            MenuItem::Forward => self.compose(ComposeKind::Forward),
            MenuItem::MarkAsUnread => self.mark_as_unread(),
        }
        true
    }

    /// Like [`MessageView::handle_menu_item`], for screens that identify menu
    /// entries by name. Unknown names are not handled.
    pub fn handle_menu_id(&mut self, id: &str) -> bool {
        match id.parse::<MenuItem>() {
            Ok(item) => self.handle_menu_item(item),
            Err(err) => {
                log::trace!("{}", err.summary);
                false
            }
        }
    }

    /// Open a composer once the message is available. Before that the
    /// request is queued, and after a failure it is dropped with a notice.
    pub fn compose(&mut self, kind: ComposeKind) {
        match self.state {
            MessageViewState::Idle { ref mut pending }
            | MessageViewState::Loading {
                ref mut pending, ..
            } => {
                pending.compose.push(kind);
            }
            MessageViewState::Loaded { ref message, .. } => {
                self.effects.push_back(Effect::Compose {
                    kind,
                    message: message.clone(),
                });
            }
            MessageViewState::Failed { .. } => {
                self.effects.push_back(Effect::Notice(format!(
                    "Cannot {kind}: the message could not be loaded."
                )));
            }
        }
    }

    /// Delete the message and move on to the next one, or close if there is
    /// none.
    pub fn delete(&mut self) {
        log::debug!("Deleting message {}.", self.request.message_id());
        self.controller.delete_message(self.request.clone());
        match self.request.next_sibling().map(str::to_string) {
            Some(next) => self.open(next),
            None => self.effects.push_back(Effect::Close),
        }
    }

    pub fn next(&mut self) {
        if let Some(next) = self.request.next_sibling().map(str::to_string) {
            self.open(next);
        }
    }

    pub fn previous(&mut self) {
        if let Some(previous) = self.request.previous_sibling().map(str::to_string) {
            self.open(previous);
        }
    }

    pub fn show_pictures(&mut self) {
        match self.state {
            MessageViewState::Idle { ref mut pending }
            | MessageViewState::Loading {
                ref mut pending, ..
            } => {
                pending.show_pictures = true;
            }
            MessageViewState::Loaded {
                ref mut show_pictures,
                ..
            } => {
                if !*show_pictures {
                    *show_pictures = true;
                    self.render();
                }
            }
            MessageViewState::Failed { .. } => {}
        }
    }

    pub fn mark_as_unread(&mut self) {
        self.controller.set_seen(self.request.clone(), false);
        if let MessageViewState::Loaded {
            ref mut message, ..
        } = self.state
        {
            message.set_seen(false);
        }
    }

    fn save_attachment(&mut self, idx: usize, open: bool) {
        let MessageViewState::Loaded { ref message, .. } = self.state else {
            log::trace!("Ignoring attachment {} while {}.", idx, self.state);
            return;
        };
        let Some(attachment) = message.attachments().get(idx).cloned() else {
            log::debug!(
                "Message {} has no attachment {}.",
                self.request.message_id(),
                idx
            );
            return;
        };
        let directory = match self.download_dir() {
            Ok(directory) => directory,
            Err(err) => {
                log::error!("Could not resolve download directory: {}", err);
                self.effects.push_back(Effect::Notice(format!(
                    "Cannot save {}: {}",
                    attachment.filename, err.summary
                )));
                return;
            }
        };
        let id = self.controller.save_attachment(
            self.request.clone(),
            attachment,
            directory,
            self.listener.clone(),
        );
        log::debug!("Saving attachment {} of {} as {}.", idx, self.request.message_id(), id);
        self.saves.push(InFlightSave { id, open });
    }

    fn download_dir(&self) -> Result<PathBuf> {
        match self.download_dir {
            Some(ref dir) => Ok(dir.clone()),
            None => AttachmentSettings::default().download_dir(),
        }
    }

    /// Show another message of the same folder.
    fn open(&mut self, message_id: String) {
        log::debug!(
            "Navigating from {} to {}.",
            self.request.message_id(),
            message_id
        );
        self.request = self.request.with_message_id(message_id.clone());
        self.state = MessageViewState::default();
        self.effects.push_back(Effect::Navigated(message_id));
        self.start_fetch();
    }

    fn start_fetch(&mut self) {
        let pending = self
            .state
            .pending_mut()
            .map(std::mem::take)
            .unwrap_or_default();
        let fetch_id = self
            .controller
            .fetch_message(self.request.clone(), self.listener.clone());
        log::debug!(
            "Fetching message {} as {}.",
            self.request.message_id(),
            fetch_id
        );
        self.set_state(MessageViewState::Loading { fetch_id, pending });
    }

    fn apply(&mut self, event: ViewEvent) -> bool {
        match event {
            ViewEvent::Loaded {
                fetch_id,
                mut message,
            } => {
                if self.state.fetch_id() != Some(fetch_id) {
                    log::trace!("Ignoring stale result of fetch {}.", fetch_id);
                    return false;
                }
                let pending = self
                    .state
                    .pending_mut()
                    .map(std::mem::take)
                    .unwrap_or_default();
                if !message.is_seen() {
                    self.controller.set_seen(self.request.clone(), true);
                    message.set_seen(true);
                }
                self.set_state(MessageViewState::Loaded {
                    message,
                    show_pictures: pending.show_pictures,
                });
                for kind in pending.compose {
                    self.compose(kind);
                }
                true
            }
            ViewEvent::LoadFailed { fetch_id, err } => {
                if self.state.fetch_id() != Some(fetch_id) {
                    log::trace!("Ignoring stale failure of fetch {}.", fetch_id);
                    return false;
                }
                log::error!(
                    "Could not load message {}: {}",
                    self.request.message_id(),
                    err
                );
                let pending = self
                    .state
                    .pending_mut()
                    .map(std::mem::take)
                    .unwrap_or_default();
                self.set_state(MessageViewState::Failed { err });
                for kind in pending.compose {
                    self.compose(kind);
                }
                true
            }
            ViewEvent::AttachmentSaved { save_id, path } => {
                let Some(pos) = self.saves.iter().position(|s| s.id == save_id) else {
                    return false;
                };
                let save = self.saves.remove(pos);
                self.effects.push_back(if save.open {
                    Effect::OpenAttachment(path)
                } else {
                    Effect::AttachmentSaved(path)
                });
                true
            }
            ViewEvent::AttachmentSaveFailed {
                save_id,
                filename,
                err,
            } => {
                let Some(pos) = self.saves.iter().position(|s| s.id == save_id) else {
                    return false;
                };
                self.saves.remove(pos);
                self.effects.push_back(Effect::Notice(format!(
                    "Could not save {}: {}",
                    filename, err.summary
                )));
                true
            }
        }
    }

    fn set_state(&mut self, new_state: MessageViewState) {
        log::debug!("MessageView {} -> {}", self.state, new_state);
        self.state = new_state;
        self.render();
    }

    fn render(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        match self.state {
            MessageViewState::Idle { .. } => surface.clear(),
            MessageViewState::Loading { .. } => surface.show_loading(),
            MessageViewState::Loaded {
                ref message,
                show_pictures,
            } => surface.show_message(message, show_pictures),
            MessageViewState::Failed { ref err } => surface.show_error(err),
        }
    }
}
