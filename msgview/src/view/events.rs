/*
 * msgview - message view events
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

//! Controller callbacks arrive on worker threads; [`ViewListener`] forwards
//! them to the view's UI thread over a channel.

use std::path::{Path, PathBuf};

use crossbeam::channel::Sender;
use msglib::{Error, FetchId, FetchRequest, Message, MessageListener, SaveId};

#[derive(Debug)]
pub enum ViewEvent {
    Loaded {
        fetch_id: FetchId,
        message: Box<Message>,
    },
    LoadFailed {
        fetch_id: FetchId,
        err: Error,
    },
    AttachmentSaved {
        save_id: SaveId,
        path: PathBuf,
    },
    AttachmentSaveFailed {
        save_id: SaveId,
        filename: String,
        err: Error,
    },
}

#[derive(Debug)]
pub struct ViewListener {
    sender: Sender<ViewEvent>,
}

impl ViewListener {
    pub fn new(sender: Sender<ViewEvent>) -> Self {
        Self { sender }
    }

    fn send(&self, event: ViewEvent) {
        // The view is gone, nobody is waiting for this.
        if let Err(err) = self.sender.send(event) {
            log::trace!("Dropping view event {:?}", err.into_inner());
        }
    }
}

impl MessageListener for ViewListener {
    fn message_loaded(&self, fetch_id: FetchId, _: &FetchRequest, message: &Message) {
        self.send(ViewEvent::Loaded {
            fetch_id,
            message: Box::new(message.clone()),
        });
    }

    fn message_load_failed(&self, fetch_id: FetchId, _: &FetchRequest, err: &Error) {
        self.send(ViewEvent::LoadFailed {
            fetch_id,
            err: err.clone(),
        });
    }

    fn attachment_saved(&self, save_id: SaveId, _: &FetchRequest, path: &Path) {
        self.send(ViewEvent::AttachmentSaved {
            save_id,
            path: path.to_path_buf(),
        });
    }

    fn attachment_save_failed(
        &self,
        save_id: SaveId,
        _: &FetchRequest,
        filename: &str,
        err: &Error,
    ) {
        self.send(ViewEvent::AttachmentSaveFailed {
            save_id,
            filename: filename.to_string(),
            err: err.clone(),
        });
    }
}
