/*
 * msgview - message view actions
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

//! What the screen can ask of a message view, and what the view asks back.

use std::{path::PathBuf, str::FromStr};

use msglib::{Error, ErrorKind, Message};

/// On-screen controls.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ControlId {
    Reply,
    ReplyAll,
    Delete,
    Next,
    Previous,
    ShowPictures,
    /// Save the attachment at this index to the download directory.
    Download(usize),
    /// Save the attachment at this index and open it.
    View(usize),
}

/// Options menu entries.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MenuItem {
    Delete,
    Reply,
    ReplyAll,
    Forward,
    MarkAsUnread,
}

impl FromStr for MenuItem {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "delete" => Self::Delete,
            "reply" => Self::Reply,
            "reply_all" => Self::ReplyAll,
            "forward" => Self::Forward,
            "mark_as_unread" => Self::MarkAsUnread,
            other => {
                return Err(Error::new(format!("Unknown menu item `{other}`."))
                    .set_kind(ErrorKind::ValueError))
            }
        })
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ComposeKind {
    Reply,
    ReplyAll,
    Forward,
}

impl std::fmt::Display for ComposeKind {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Reply => write!(fmt, "reply"),
            Self::ReplyAll => write!(fmt, "reply all"),
            Self::Forward => write!(fmt, "forward"),
        }
    }
}

/// Requests for the screen, collected with
/// [`MessageView::take_effects`](super::MessageView::take_effects).
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Effect {
    /// Open a composer for `message`.
    Compose {
        kind: ComposeKind,
        message: Box<Message>,
    },
    /// The view now shows another message of the same folder.
    Navigated(String),
    /// Nothing left to show.
    Close,
    /// A short message for the user.
    Notice(String),
    AttachmentSaved(PathBuf),
    /// A viewed attachment is ready to be opened.
    OpenAttachment(PathBuf),
}
