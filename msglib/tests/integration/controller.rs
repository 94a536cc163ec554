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

use std::{fs, path::Path, sync::Arc, time::Duration};

use msglib::{
    crossbeam::channel::{unbounded, Sender},
    Accounts, Error, FetchId, FetchRequest, FileSettings, Message, MessageListener,
    MessagingController, ProductionController,
};
use tempfile::TempDir;

const TIMEOUT: Duration = Duration::from_secs(10);

struct Forward(Sender<(FetchId, Result<String, Error>)>);

impl MessageListener for Forward {
    fn message_loaded(&self, fetch_id: FetchId, _: &FetchRequest, message: &Message) {
        _ = self
            .0
            .send((fetch_id, Ok(message.header("x-custom").unwrap_or_default().to_string())));
    }

    fn message_load_failed(&self, fetch_id: FetchId, _: &FetchRequest, err: &Error) {
        _ = self.0.send((fetch_id, Err(err.clone())));
    }
}

fn write_message(root: &Path, folder: &str, uid: &str, custom: &str) {
    let dir = root.join(folder);
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join(format!("{uid}.eml")),
        format!("Subject: test\r\nX-Custom: {custom}\r\n  continued\r\n\r\nbody\r\n"),
    )
    .unwrap();
}

#[test]
fn test_controller_from_settings_end_to_end() {
    let tmp_dir = TempDir::new().unwrap();
    write_message(tmp_dir.path(), "INBOX", "1", "one");
    write_message(tmp_dir.path(), "INBOX", "2", "two");
    let settings = FileSettings::validate_string(&format!(
        "[accounts.local]\nidentity = \"me@example.com\"\nroot = \"{}\"\n",
        tmp_dir.path().display()
    ))
    .unwrap();
    let accounts = Accounts::from_settings(&settings);
    let account_id = accounts.default_account_id();
    let controller = ProductionController::from_settings(&settings, &accounts).unwrap();

    let (tx, rx) = unbounded();
    let listener: Arc<dyn MessageListener> = Arc::new(Forward(tx));
    let siblings = vec!["1".to_string(), "2".to_string()];
    let request = FetchRequest::new(account_id, "INBOX", "1", siblings);
    let first = controller.fetch_message(request.clone(), listener.clone());
    let next = request.next_sibling().unwrap();
    let second = controller.fetch_message(request.with_message_id(next), listener.clone());
    assert_ne!(first, second);

    let mut results = (0..2)
        .map(|_| rx.recv_timeout(TIMEOUT).unwrap())
        .map(|(id, res)| (id, res.unwrap()))
        .collect::<Vec<_>>();
    results.sort_by_key(|(id, _)| *id != first);
    assert_eq!(
        results,
        vec![
            (first, "one continued".to_string()),
            (second, "two continued".to_string())
        ]
    );
}

#[test]
fn test_controller_every_fetch_terminates() {
    let tmp_dir = TempDir::new().unwrap();
    write_message(tmp_dir.path(), "INBOX", "1", "one");
    let settings = FileSettings::validate_string(&format!(
        "[accounts.local]\nidentity = \"me@example.com\"\nroot = \"{}\"\n",
        tmp_dir.path().display()
    ))
    .unwrap();
    let accounts = Accounts::from_settings(&settings);
    let account_id = accounts.default_account_id();
    let controller = ProductionController::from_settings(&settings, &accounts).unwrap();

    let (tx, rx) = unbounded();
    let listener: Arc<dyn MessageListener> = Arc::new(Forward(tx));
    let uids = ["1", "missing", "1", "also-missing"];
    let mut ids = uids
        .iter()
        .map(|uid| {
            controller.fetch_message(
                FetchRequest::new(account_id, "INBOX", *uid, vec![]),
                listener.clone(),
            )
        })
        .collect::<Vec<_>>();
    let mut got = (0..uids.len())
        .map(|_| rx.recv_timeout(TIMEOUT).unwrap())
        .map(|(id, res)| {
            if let Err(err) = res {
                assert!(err.kind.is_not_found());
            }
            id
        })
        .collect::<Vec<_>>();
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    ids.sort();
    got.sort();
    assert_eq!(ids, got);
}
