//
// msgview
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

use std::sync::Arc;

use msglib::{AccountId, Error, ErrorKind, FetchRequest, Message, MockController};
use msgview::{ControlId, Effect, MenuItem, MessageSurface, MessageView};

#[derive(Default)]
struct Blank;

impl MessageSurface for Blank {
    fn show_loading(&mut self) {}

    fn show_message(&mut self, _: &Message, _: bool) {}

    fn show_error(&mut self, _: &Error) {}
}

fn request() -> FetchRequest {
    FetchRequest::new(
        AccountId::from_name("default"),
        "folder",
        "message_uid",
        ["why", "is", "java", "so", "ugly?"]
            .into_iter()
            .map(String::from)
            .collect(),
    )
}

fn every_action(view: &mut MessageView) {
    view.on_click(ControlId::Reply);
    view.on_click(ControlId::ReplyAll);
    view.on_click(ControlId::Delete);
    view.on_click(ControlId::Next);
    view.on_click(ControlId::Previous);
    view.on_click(ControlId::ShowPictures);
    view.on_click(ControlId::Download(0));
    view.on_click(ControlId::View(0));

    assert!(view.handle_menu_item(MenuItem::Delete));
    assert!(view.handle_menu_item(MenuItem::Reply));
    assert!(view.handle_menu_item(MenuItem::ReplyAll));
    assert!(view.handle_menu_item(MenuItem::Forward));
    assert!(view.handle_menu_item(MenuItem::MarkAsUnread));
}

#[test]
fn test_ui_actions_before_load() {
    let mock = Arc::new(MockController::new());
    let mut view = MessageView::new(mock.clone(), request());
    every_action(&mut view);
    view.attach(Box::new(Blank));
    every_action(&mut view);

    assert!(view.state().is_loading());
    assert_eq!(view.process_events(), 0);
    // The current message is not among its siblings, so there is nowhere to
    // navigate to.
    assert_eq!(mock.requests().len(), 1);
    assert_eq!(mock.deleted().len(), 4);
    assert!(view
        .take_effects()
        .iter()
        .all(|effect| *effect == Effect::Close));

    mock.resolve_next(Ok(Message::new("message_uid", "folder")));
    assert_eq!(view.process_events(), 1);
    assert!(view.state().is_loaded());
    let composes = view
        .take_effects()
        .into_iter()
        .filter(|effect| matches!(effect, Effect::Compose { .. }))
        .count();
    assert_eq!(composes, 10);
}

#[test]
fn test_ui_actions_after_failure() {
    let mock = Arc::new(MockController::new());
    let mut view = MessageView::new(mock.clone(), request());
    view.attach(Box::new(Blank));
    mock.fail_all(Error::new("message_uid not found").set_kind(ErrorKind::NotFound));
    assert_eq!(view.process_events(), 1);
    assert!(view.state().is_failed());
    _ = view.take_effects();

    every_action(&mut view);
    assert!(view.state().is_failed());
    assert!(view
        .take_effects()
        .iter()
        .all(|effect| matches!(effect, Effect::Notice(_) | Effect::Close)));
    assert!(mock.saved().is_empty());
}

#[test]
fn test_ui_late_result_after_drop() {
    let mock = Arc::new(MockController::new());
    let mut view = MessageView::new(mock.clone(), request());
    view.attach(Box::new(Blank));
    drop(view);
    assert_eq!(mock.pending_count(), 1);
    assert!(mock
        .resolve_next(Ok(Message::new("message_uid", "folder")))
        .is_some());
}
