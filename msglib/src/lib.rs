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

#![deny(
    unsafe_op_in_unsafe_fn,
    /* groups */
    clippy::correctness,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::style,
    /* restriction */
    clippy::dbg_macro,
    clippy::rc_buffer,
    clippy::as_underscore,
    /* rustdoc */
    rustdoc::broken_intra_doc_links,
    /* pedantic */
    clippy::doc_markdown,
    clippy::expect_fun_call,
    clippy::or_fun_call,
    clippy::borrow_as_ptr,
)]
#![allow(clippy::option_if_let_else, clippy::missing_const_for_fn)]

//! Core of a mail client's single message view.
//!
//! - Allocate collision-free file names for saved attachments (see module
//!   [`utils::files`])
//! - Fetch messages off the caller's thread through the
//!   [`MessagingController`] trait, and deliver results to
//!   [`MessageListener`]s (see module [`controller`])
//! - Read messages from a [`MessageStore`] (see module [`store`])
//! - Accounts and their first-run default (see module [`accounts`])
//! - Configuration from a TOML file (see module [`conf`])

#[macro_use]
pub mod utils;

pub use utils::{
    datetime::UnixTimestamp,
    logging::{LogLevel, StderrLogger},
};

pub mod accounts;
pub use accounts::{Account, AccountId, Accounts};
pub mod conf;
pub use conf::FileSettings;
pub mod controller;
pub use controller::{
    FetchId, FetchRequest, ListenerRegistry, MessageListener, MessagingController,
    ProductionController, SaveId,
};
#[cfg(any(test, feature = "test-seam"))]
pub use controller::MockController;
pub mod email;
pub use email::{Attachment, Message};
pub mod error;
pub use error::*;
pub mod jobs;
pub mod store;
pub use store::{FsStore, MessageStore};

#[macro_use]
extern crate serde_derive;
pub extern crate log;

pub extern crate crossbeam;
pub extern crate futures;
pub extern crate indexmap;
pub extern crate serde_path_to_error;
pub extern crate smallvec;
pub extern crate smol;
pub extern crate uuid;

#[derive(Clone, Copy, Debug)]
#[repr(transparent)]
pub struct BytesDisplay(pub usize);

impl BytesDisplay {
    pub const KILOBYTE: f64 = 1024.0;
    pub const MEGABYTE: f64 = Self::KILOBYTE * 1024.0;
    pub const GIGABYTE: f64 = Self::MEGABYTE * 1024.0;
}

impl std::fmt::Display for BytesDisplay {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        let bytes: f64 = self.0 as f64;
        if bytes == 0.0 {
            write!(fmt, "0")
        } else if bytes < Self::KILOBYTE {
            write!(fmt, "{bytes:.0} bytes")
        } else if bytes < Self::MEGABYTE {
            write!(fmt, "{:.2} KiB", bytes / Self::KILOBYTE)
        } else if bytes < Self::GIGABYTE {
            write!(fmt, "{:.2} MiB", bytes / Self::MEGABYTE)
        } else {
            write!(fmt, "{:.2} GiB", bytes / Self::GIGABYTE)
        }
    }
}

pub use utils::shellexpand::ShellExpandTrait;

#[cfg(test)]
mod tests {
    use super::BytesDisplay;

    #[test]
    fn test_bytes_display() {
        assert_eq!(BytesDisplay(0).to_string(), "0");
        assert_eq!(BytesDisplay(512).to_string(), "512 bytes");
        assert_eq!(BytesDisplay(2048).to_string(), "2.00 KiB");
        assert_eq!(BytesDisplay(3 * 1024 * 1024).to_string(), "3.00 MiB");
    }
}
