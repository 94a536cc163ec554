/*
 * msgview - unique file allocation
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

//! Reserve collision-free file names in shared directories.
//!
//! Names are reserved with an exclusive create (`O_CREAT | O_EXCL`), so two
//! writers racing for the same name never end up sharing a file: the loser
//! sees `EEXIST` and moves on to the next disambiguated candidate.

use std::{
    fs::{self, OpenOptions},
    io::Write,
    os::unix::fs::OpenOptionsExt,
    path::{Path, PathBuf},
};

use crate::error::{Error, ErrorKind, Result, ResultIntoError};

/// Number of candidate names tried by [`create_unique_file`]: the bare name
/// and then `stem-1.ext` up to `stem-4095.ext`.
pub const MAX_UNIQUE_FILE_ATTEMPTS: usize = 4096;

/// A file that was created by this process and whose ownership has been
/// handed to the caller.
#[derive(Debug)]
pub struct UniqueFile {
    path: PathBuf,
    file: Option<fs::File>,
    /// Delete file when it is dropped.
    delete_on_drop: bool,
}

impl Drop for UniqueFile {
    fn drop(&mut self) {
        drop(self.file.take());
        if self.delete_on_drop {
            let _ = fs::remove_file(&self.path);
        }
    }
}

impl UniqueFile {
    /// The reserved path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the file when this value is dropped, unless
    /// [`UniqueFile::persist`] is called first.
    pub fn delete_on_drop(mut self, value: bool) -> Self {
        self.delete_on_drop = value;
        self
    }

    /// Write `bytes` to the reserved file.
    pub fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let path = &self.path;
        let f = match self.file.take() {
            Some(f) => f,
            None => OpenOptions::new()
                .write(true)
                .open(path)
                .chain_err_summary(|| format!("Could not open {}", path.display()))?,
        };
        let f = self.file.insert(f);
        f.write_all(bytes)
            .and_then(|()| f.flush())
            .chain_err_summary(|| format!("Could not write to {}", path.display()))
    }

    /// Keep the file on disk and return its path.
    pub fn persist(mut self) -> PathBuf {
        self.delete_on_drop = false;
        self.path.clone()
    }

    /// Remove the reserved file now.
    pub fn remove(mut self) -> Result<()> {
        self.delete_on_drop = false;
        drop(self.file.take());
        fs::remove_file(&self.path)
            .chain_err_summary(|| format!("Could not remove {}", self.path.display()))
    }
}

/// Split `base_name` into stem and extension at the last dot. A leading dot
/// belongs to the stem.
pub fn split_extension(base_name: &str) -> (&str, Option<&str>) {
    match base_name.rfind('.') {
        Some(0) | None => (base_name, None),
        Some(idx) => (&base_name[..idx], Some(&base_name[idx + 1..])),
    }
}

/// Name of the `n`th candidate for `base_name`; the `0`th is the bare name.
pub fn candidate_name(base_name: &str, n: usize) -> String {
    if n == 0 {
        return base_name.to_string();
    }
    match split_extension(base_name) {
        (stem, Some(ext)) => format!("{stem}-{n}.{ext}"),
        (stem, None) => format!("{stem}-{n}"),
    }
}

/// Create an empty file in `directory` named after `base_name`, appending a
/// numeric disambiguator if the name is taken.
///
/// ```no_run
/// # use msglib::utils::files::create_unique_file;
/// let dir = std::path::Path::new("/tmp");
/// let first = create_unique_file(dir, "write-test")?.persist();
/// let second = create_unique_file(dir, "write-test")?.persist();
/// assert_ne!(first, second);
/// # Ok::<(), msglib::Error>(())
/// ```
pub fn create_unique_file(directory: &Path, base_name: &str) -> Result<UniqueFile> {
    create_unique_file_with_limit(directory, base_name, MAX_UNIQUE_FILE_ATTEMPTS)
}

/// Like [`create_unique_file`], but gives up after `max_attempts` candidate
/// names with an [`ErrorKind::Exhausted`] error.
pub fn create_unique_file_with_limit(
    directory: &Path,
    base_name: &str,
    max_attempts: usize,
) -> Result<UniqueFile> {
    if base_name.is_empty() || base_name.contains('/') {
        return Err(Error::new(format!(
            "Invalid file name `{base_name}`: must be non-empty and must not contain path \
             separators."
        ))
        .set_kind(ErrorKind::ValueError));
    }
    if !directory.is_dir() {
        return Err(
            Error::new(format!("{} is not a directory.", directory.display()))
                .set_kind(ErrorKind::NotFound),
        );
    }
    for n in 0..max_attempts {
        let path = directory.join(candidate_name(base_name, n));
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .mode(0o600)
            .open(&path)
        {
            Ok(file) => {
                log::trace!("Reserved {}", path.display());
                return Ok(UniqueFile {
                    path,
                    file: Some(file),
                    delete_on_drop: false,
                });
            }
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(err) => {
                return Err(Error::from(err)
                    .set_summary(format!("Could not create file at {}", path.display())));
            }
        }
    }
    Err(Error::new(format!(
        "Could not find a free name for `{base_name}` in {} after {max_attempts} attempts.",
        directory.display()
    ))
    .set_kind(ErrorKind::Exhausted))
}

/// Turn an attachment's advertised filename into a single safe path
/// component.
pub fn sanitize_filename(og: &str) -> String {
    use std::sync::OnceLock;

    static UNSAFE: OnceLock<Option<regex::Regex>> = OnceLock::new();

    let name = og.rsplit(['/', '\\']).next().unwrap_or_default();
    let mut ret = match UNSAFE.get_or_init(|| regex::Regex::new(r"[[:cntrl:]]+").ok()) {
        Some(regex) => regex.replace_all(name, "_").trim().to_string(),
        None => name.chars().filter(|c| !c.is_control()).collect(),
    };
    while ret.starts_with('.') {
        ret.remove(0);
    }
    if ret.is_empty() {
        ret = "attachment".to_string();
    }
    ret
}

/// Save `bytes` under a unique name derived from `filename` in `directory`.
/// The reservation is removed if writing fails.
pub fn save_attachment(directory: &Path, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
    save_attachment_with_limit(directory, filename, bytes, MAX_UNIQUE_FILE_ATTEMPTS)
}

pub fn save_attachment_with_limit(
    directory: &Path,
    filename: &str,
    bytes: &[u8],
    max_attempts: usize,
) -> Result<PathBuf> {
    let filename = sanitize_filename(filename);
    let mut file =
        create_unique_file_with_limit(directory, &filename, max_attempts)?.delete_on_drop(true);
    file.write_all(bytes)?;
    Ok(file.persist())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_files_split_extension() {
        assert_eq!(split_extension("write-test"), ("write-test", None));
        assert_eq!(split_extension("photo.jpeg"), ("photo", Some("jpeg")));
        assert_eq!(split_extension("a.tar.gz"), ("a.tar", Some("gz")));
        assert_eq!(split_extension(".profile"), (".profile", None));
        assert_eq!(candidate_name("photo.jpeg", 0), "photo.jpeg");
        assert_eq!(candidate_name("photo.jpeg", 2), "photo-2.jpeg");
        assert_eq!(candidate_name("write-test", 1), "write-test-1");
    }

    #[test]
    fn test_files_existing_name_is_disambiguated() {
        let tempdir = tempfile::tempdir().unwrap();
        let original = tempdir.path().join("write-test");
        fs::write(&original, b"keep").unwrap();

        let file = create_unique_file(tempdir.path(), "write-test").unwrap();
        assert_eq!(file.path(), tempdir.path().join("write-test-1"));
        assert!(file.path().try_exists().unwrap());
        assert_eq!(fs::read(&original).unwrap(), b"keep");
        assert_eq!(fs::metadata(file.path()).unwrap().len(), 0);
    }

    #[test]
    fn test_files_many_allocations_are_distinct() {
        const N: usize = 50;
        let tempdir = tempfile::tempdir().unwrap();
        let paths = (0..N)
            .map(|_| {
                create_unique_file(tempdir.path(), "report.pdf")
                    .unwrap()
                    .persist()
            })
            .collect::<Vec<PathBuf>>();
        assert_eq!(paths.iter().collect::<HashSet<_>>().len(), N);
        assert!(paths.iter().all(|p| p.try_exists().unwrap()));
        assert_eq!(paths[0], tempdir.path().join("report.pdf"));
        assert_eq!(paths[3], tempdir.path().join("report-3.pdf"));
    }

    #[test]
    fn test_files_concurrent_allocations_are_distinct() {
        let tempdir = tempfile::tempdir().unwrap();
        let dir = tempdir.path().to_path_buf();
        let handles = (0..8)
            .map(|_| {
                let dir = dir.clone();
                std::thread::spawn(move || {
                    (0..16)
                        .map(|_| create_unique_file(&dir, "race.txt").unwrap().persist())
                        .collect::<Vec<_>>()
                })
            })
            .collect::<Vec<_>>();
        let all = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(all.len(), 8 * 16);
        assert_eq!(all.iter().collect::<HashSet<_>>().len(), all.len());
    }

    #[test]
    fn test_files_exhausted() {
        let tempdir = tempfile::tempdir().unwrap();
        for name in ["x.bin", "x-1.bin", "x-2.bin"] {
            fs::write(tempdir.path().join(name), b"").unwrap();
        }
        let err = create_unique_file_with_limit(tempdir.path(), "x.bin", 3).unwrap_err();
        assert!(err.kind.is_exhausted());
        let file = create_unique_file_with_limit(tempdir.path(), "x.bin", 4).unwrap();
        assert_eq!(file.path(), tempdir.path().join("x-3.bin"));
    }

    #[test]
    fn test_files_invalid_input() {
        let tempdir = tempfile::tempdir().unwrap();
        let err = create_unique_file(tempdir.path(), "").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ValueError);
        let err = create_unique_file(&tempdir.path().join("missing"), "a").unwrap_err();
        assert!(err.kind.is_not_found());
    }

    #[test]
    fn test_files_unwritable_directory() {
        use std::os::unix::fs::PermissionsExt;

        let tempdir = tempfile::tempdir().unwrap();
        let ro = tempdir.path().join("ro");
        fs::create_dir(&ro).unwrap();
        fs::set_permissions(&ro, fs::Permissions::from_mode(0o500)).unwrap();
        if fs::write(ro.join("probe"), b"").is_ok() {
            // Running with privileges that ignore directory permissions.
            return;
        }
        let err = create_unique_file(&ro, "a").unwrap_err();
        assert!(err.kind.is_oserror());
        fs::set_permissions(&ro, fs::Permissions::from_mode(0o700)).unwrap();
    }

    #[test]
    fn test_files_delete_on_drop() {
        let tempdir = tempfile::tempdir().unwrap();
        let file = create_unique_file(tempdir.path(), "tmp")
            .unwrap()
            .delete_on_drop(true);
        let path = file.path().to_path_buf();
        assert!(path.try_exists().unwrap());
        drop(file);
        assert!(!path.try_exists().unwrap());

        let file = create_unique_file(tempdir.path(), "tmp").unwrap();
        let path = file.path().to_path_buf();
        file.remove().unwrap();
        assert!(!path.try_exists().unwrap());
    }

    #[test]
    fn test_files_save_attachment() {
        let tempdir = tempfile::tempdir().unwrap();
        let first = save_attachment(tempdir.path(), "../../etc/passwd", b"one").unwrap();
        assert_eq!(first, tempdir.path().join("passwd"));
        let second = save_attachment(tempdir.path(), "passwd", b"two").unwrap();
        assert_eq!(second, tempdir.path().join("passwd-1"));
        assert_eq!(fs::read(&first).unwrap(), b"one");
        assert_eq!(fs::read(&second).unwrap(), b"two");
        let third = save_attachment(tempdir.path(), "", b"").unwrap();
        assert_eq!(third, tempdir.path().join("attachment"));
    }

    #[test]
    fn test_files_sanitize_filename() {
        assert_eq!(sanitize_filename("report.pdf"), "report.pdf");
        assert_eq!(sanitize_filename("dir\\name.txt"), "name.txt");
        assert_eq!(sanitize_filename("bad\u{7}\u{1b}name"), "bad_name");
        assert_eq!(sanitize_filename("..."), "attachment");
        assert_eq!(sanitize_filename(".hidden"), "hidden");
    }
}
