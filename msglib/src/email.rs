/*
 * msgview - email module
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

//! Messages as handed to the view: parsed headers, text body and attachment
//! payloads.

use indexmap::IndexMap;

use crate::error::{Error, ErrorKind, Result};

/// A file attached to a message.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Attachment {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Message {
    uid: String,
    folder: String,
    /// Header names are stored lowercase, in the order they first appear.
    headers: IndexMap<String, String>,
    body: String,
    seen: bool,
    attachments: Vec<Attachment>,
}

impl Message {
    pub fn new(uid: impl Into<String>, folder: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            folder: folder.into(),
            ..Self::default()
        }
    }

    /// Parse a raw message: a header block, an empty line and the body.
    /// Folded header lines (starting with whitespace) continue the previous
    /// header.
    pub fn from_bytes(uid: &str, folder: &str, bytes: &[u8]) -> Result<Self> {
        let text = String::from_utf8_lossy(bytes);
        let mut ret = Self::new(uid, folder);
        let mut lines = text.split('\n');
        let mut last_header: Option<String> = None;
        for line in lines.by_ref() {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.is_empty() {
                break;
            }
            if line.starts_with([' ', '\t']) {
                let Some(name) = last_header.as_ref() else {
                    return Err(Error::new(format!(
                        "Message {uid} in {folder} starts with a continuation line."
                    ))
                    .set_kind(ErrorKind::ValueError));
                };
                if let Some(value) = ret.headers.get_mut(name) {
                    value.push(' ');
                    value.push_str(line.trim());
                }
                continue;
            }
            let Some((name, value)) = line.split_once(':') else {
                return Err(Error::new(format!(
                    "Message {uid} in {folder} has a malformed header line: {line:?}"
                ))
                .set_kind(ErrorKind::ValueError));
            };
            let name = name.trim().to_ascii_lowercase();
            ret.headers
                .entry(name.clone())
                .or_insert_with(|| value.trim().to_string());
            last_header = Some(name);
        }
        ret.body = lines.collect::<Vec<&str>>().join("\n");
        Ok(ret)
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn folder(&self) -> &str {
        &self.folder
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn subject(&self) -> &str {
        self.header("subject").unwrap_or_default()
    }

    pub fn from(&self) -> &str {
        self.header("from").unwrap_or_default()
    }

    pub fn to(&self) -> &str {
        self.header("to").unwrap_or_default()
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<String>) -> &mut Self {
        self.body = body.into();
        self
    }

    pub fn is_seen(&self) -> bool {
        self.seen
    }

    pub fn set_seen(&mut self, value: bool) -> &mut Self {
        self.seen = value;
        self
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn push_attachment(&mut self, attachment: Attachment) -> &mut Self {
        self.attachments.push(attachment);
        self
    }
}
