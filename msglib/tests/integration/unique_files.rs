//
// msglib
//
// Copyright 2024 msgview contributors
//
// This file is part of msgview.
//
// msgview is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// msgview is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with msgview. If not, see <http://www.gnu.org/licenses/>.

use std::fs;

use msglib::{
    utils::files::{create_unique_file, create_unique_file_with_limit, save_attachment},
    ErrorKind,
};
use tempfile::TempDir;

#[test]
fn test_unique_files_write_test_sequence() {
    let tmp_dir = TempDir::new().unwrap();

    let first = create_unique_file(tmp_dir.path(), "write-test").unwrap();
    assert_eq!(first.path(), tmp_dir.path().join("write-test"));
    let second = create_unique_file(tmp_dir.path(), "write-test").unwrap();
    assert_eq!(second.path(), tmp_dir.path().join("write-test-1"));
    let first = first.persist();
    let second = second.persist();
    assert!(first.is_file());
    assert!(second.is_file());
    assert_eq!(fs::metadata(&second).unwrap().len(), 0);
}

#[test]
fn test_unique_files_keep_extension() {
    let tmp_dir = TempDir::new().unwrap();
    let names = (0..3)
        .map(|_| {
            create_unique_file(tmp_dir.path(), "photo.jpeg")
                .unwrap()
                .persist()
        })
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect::<Vec<_>>();
    assert_eq!(names, ["photo.jpeg", "photo-1.jpeg", "photo-2.jpeg"]);
}

#[test]
fn test_unique_files_exhausted_leaves_directory_alone() {
    let tmp_dir = TempDir::new().unwrap();
    for _ in 0..3 {
        create_unique_file_with_limit(tmp_dir.path(), "a.txt", 3)
            .unwrap()
            .persist();
    }
    let err = create_unique_file_with_limit(tmp_dir.path(), "a.txt", 3).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Exhausted);
    assert_eq!(fs::read_dir(tmp_dir.path()).unwrap().count(), 3);
}

#[test]
fn test_unique_files_save_attachment_does_not_clobber() {
    let tmp_dir = TempDir::new().unwrap();
    fs::write(tmp_dir.path().join("notes.txt"), b"mine").unwrap();
    let path = save_attachment(tmp_dir.path(), "notes.txt", b"theirs").unwrap();
    assert_eq!(path, tmp_dir.path().join("notes-1.txt"));
    assert_eq!(fs::read(tmp_dir.path().join("notes.txt")).unwrap(), b"mine");
    assert_eq!(fs::read(path).unwrap(), b"theirs");
}
