/*
 * msgview - datetime
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

//! Functions for dealing with UNIX epoch timestamps.

use std::time::{SystemTime, UNIX_EPOCH};

pub type UnixTimestamp = u64;

pub const DEFAULT_FMT: &str = "%Y-%m-%d %H:%M:%S";

/// Current time as seconds since the UNIX epoch.
pub fn now() -> UnixTimestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Format `timestamp` in UTC with `fmt`, or [`DEFAULT_FMT`] if `None`.
pub fn timestamp_to_string(timestamp: UnixTimestamp, fmt: Option<&str>) -> String {
    let Ok(secs) = i64::try_from(timestamp) else {
        return String::new();
    };
    chrono::DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.format(fmt.unwrap_or(DEFAULT_FMT)).to_string())
        .unwrap_or_default()
}
