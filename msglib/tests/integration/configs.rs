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

use msglib::{accounts::AccountId, Accounts, ErrorKind, FileSettings};

#[test]
fn test_configs_accounts_and_attachments() {
    let settings = FileSettings::validate_string(
        r#"
[accounts.personal]
identity = "me@example.com"
display_name = "Me"
root = "/var/mail/me"
default = true

[accounts.work]
identity = "me@example.org"

[log]
maximum_level = "DEBUG"

[attachments]
download_dir = "/tmp/msgview-downloads"
max_unique_attempts = 16
"#,
    )
    .unwrap();
    assert_eq!(settings.attachments.max_unique_attempts, 16);
    assert_eq!(settings.log.maximum_level, msglib::LogLevel::DEBUG);

    let accounts = Accounts::from_settings(&settings);
    let default = accounts.default_account_id();
    assert_eq!(default, AccountId::from_name("personal"));
    let account = accounts.restore_account(default).unwrap();
    assert_eq!(account.make_display_name(), "Me <me@example.com>");
    assert_eq!(
        account.root.as_deref(),
        Some(std::path::Path::new("/var/mail/me"))
    );
}

#[test]
fn test_configs_rejects_unknown_fields() {
    let err = FileSettings::validate_string(
        r#"
[accounts.personal]
identity = "me@example.com"
colour = "blue"
"#,
    )
    .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Configuration);
}

#[test]
fn test_configs_two_defaults() {
    let err = FileSettings::validate_string(
        r#"
[accounts.a]
identity = "a@example.com"
default = true

[accounts.b]
identity = "b@example.com"
default = true
"#,
    )
    .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Configuration);
}
