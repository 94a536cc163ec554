/*
 * msgview - message store
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

//! Storage backends for messages.
//!
//! A store is blocking: the controller calls it from job executor threads.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    email::{Attachment, Message},
    error::{Error, ErrorKind, Result, ResultIntoError},
};

pub trait MessageStore: std::fmt::Debug + Send + Sync {
    fn fetch(&self, folder: &str, uid: &str) -> Result<Message>;
    fn delete(&self, folder: &str, uid: &str) -> Result<()>;
    fn set_seen(&self, folder: &str, uid: &str, value: bool) -> Result<()>;
}

/// A directory tree of raw messages:
///
/// ```text
/// <root>/<folder>/<uid>.eml
/// <root>/<folder>/<uid>.parts/<attachment files>
/// <root>/<folder>/<uid>.seen
/// ```
#[derive(Clone, Debug)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn folder_path(&self, folder: &str) -> Result<PathBuf> {
        if folder.is_empty() || folder.contains('/') || folder == "." || folder == ".." {
            return Err(
                Error::new(format!("Invalid folder name {folder:?}")).set_kind(ErrorKind::ValueError)
            );
        }
        let path = self.root.join(folder);
        if !path.is_dir() {
            return Err(Error::new(format!(
                "Folder {folder} does not exist in {}",
                self.root.display()
            ))
            .set_kind(ErrorKind::NotFound));
        }
        Ok(path)
    }

    fn message_path(&self, folder: &str, uid: &str, ext: &str) -> Result<PathBuf> {
        if uid.is_empty() || uid.contains('/') {
            return Err(
                Error::new(format!("Invalid message uid {uid:?}")).set_kind(ErrorKind::ValueError)
            );
        }
        Ok(self.folder_path(folder)?.join(format!("{uid}.{ext}")))
    }

    fn read_parts(dir: &Path) -> Result<Vec<Attachment>> {
        let mut entries = fs::read_dir(dir)
            .chain_err_summary(|| format!("Could not list attachments in {}", dir.display()))?
            .collect::<std::io::Result<Vec<_>>>()?;
        entries.sort_by_key(|e| e.file_name());
        let mut ret = Vec::with_capacity(entries.len());
        for entry in entries {
            if !entry.file_type()?.is_file() {
                continue;
            }
            let bytes = fs::read(entry.path())?;
            ret.push(Attachment::new(
                entry.file_name().to_string_lossy().into_owned(),
                bytes,
            ));
        }
        Ok(ret)
    }
}

impl MessageStore for FsStore {
    fn fetch(&self, folder: &str, uid: &str) -> Result<Message> {
        let path = self.message_path(folder, uid, "eml")?;
        let bytes = fs::read(&path).chain_err_summary(|| {
            format!("Could not read message {uid} in folder {folder}")
        })?;
        let mut message = Message::from_bytes(uid, folder, &bytes)?;
        message.set_seen(path.with_extension("seen").exists());
        let parts = path.with_extension("parts");
        if parts.is_dir() {
            for attachment in Self::read_parts(&parts)? {
                message.push_attachment(attachment);
            }
        }
        Ok(message)
    }

    fn delete(&self, folder: &str, uid: &str) -> Result<()> {
        let path = self.message_path(folder, uid, "eml")?;
        fs::remove_file(&path)
            .chain_err_summary(|| format!("Could not delete message {uid} in folder {folder}"))?;
        let seen = path.with_extension("seen");
        if seen.exists() {
            fs::remove_file(seen)?;
        }
        let parts = path.with_extension("parts");
        if parts.is_dir() {
            fs::remove_dir_all(parts)?;
        }
        Ok(())
    }

    fn set_seen(&self, folder: &str, uid: &str, value: bool) -> Result<()> {
        let path = self.message_path(folder, uid, "eml")?;
        if !path.is_file() {
            return Err(Error::new(format!(
                "Message {uid} does not exist in folder {folder}"
            ))
            .set_kind(ErrorKind::NotFound));
        }
        let marker = path.with_extension("seen");
        match (value, marker.exists()) {
            (true, false) => {
                fs::File::create(&marker)?;
            }
            (false, true) => {
                fs::remove_file(&marker)?;
            }
            _ => {}
        }
        Ok(())
    }
}
