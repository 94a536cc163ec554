/*
 * msgview - message view state
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

use msglib::{Error, FetchId, Message};
use smallvec::SmallVec;

use super::ComposeKind;

/// Actions requested before the message finished loading.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PendingActions {
    pub compose: SmallVec<[ComposeKind; 4]>,
    pub show_pictures: bool,
}

#[derive(Debug)]
pub enum MessageViewState {
    Idle {
        pending: PendingActions,
    },
    Loading {
        fetch_id: FetchId,
        pending: PendingActions,
    },
    Loaded {
        message: Box<Message>,
        show_pictures: bool,
    },
    Failed {
        err: Error,
    },
}

impl Default for MessageViewState {
    fn default() -> Self {
        Self::Idle {
            pending: PendingActions::default(),
        }
    }
}

impl std::fmt::Display for MessageViewState {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Idle { .. } => write!(fmt, "idle"),
            Self::Loading { fetch_id, .. } => write!(fmt, "loading ({fetch_id})"),
            Self::Loaded { message, .. } => write!(fmt, "loaded {}", message.uid()),
            Self::Failed { err } => write!(fmt, "failed: {}", err.summary),
        }
    }
}

impl MessageViewState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle { .. })
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// The fetch whose result this state is waiting for.
    pub fn fetch_id(&self) -> Option<FetchId> {
        match self {
            Self::Loading { fetch_id, .. } => Some(*fetch_id),
            _ => None,
        }
    }

    pub fn message(&self) -> Option<&Message> {
        match self {
            Self::Loaded { message, .. } => Some(message.as_ref()),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            Self::Failed { err } => Some(err),
            _ => None,
        }
    }

    pub(super) fn pending_mut(&mut self) -> Option<&mut PendingActions> {
        match self {
            Self::Idle { pending } | Self::Loading { pending, .. } => Some(pending),
            _ => None,
        }
    }
}
