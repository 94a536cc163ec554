/*
 * msgview - lib.rs
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

//! A mail client's single message view, driven by a
//! [`MessagingController`](msglib::MessagingController).
//!
//! - [`view::MessageView`] holds the load state and handles user actions,
//!   whether or not the message has arrived yet
//! - [`surface::MessageSurface`] is implemented by the screen that renders
//!   it
//! - [`slot`] holds a process-wide controller for screens that cannot take
//!   one in their constructor

pub mod slot;
pub mod surface;
pub mod view;

pub use surface::MessageSurface;
pub use view::{ComposeKind, ControlId, Effect, MenuItem, MessageView, MessageViewState};
