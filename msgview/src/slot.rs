/*
 * msgview - controller slot
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

//! Process-wide controller slot.
//!
//! Prefer passing a controller to [`MessageView::new`]; the slot exists for
//! screens that are created by a framework and cannot take constructor
//! arguments. Production start-up calls [`install`]. Tests swap the
//! controller with [`inject`] and are responsible for restoring the
//! previous one.
//!
//! [`MessageView::new`]: crate::view::MessageView::new

use std::sync::{Arc, PoisonError, RwLock};

use msglib::MessagingController;

static CONTROLLER: RwLock<Option<Arc<dyn MessagingController>>> = RwLock::new(None);

/// The installed controller, if any.
pub fn current() -> Option<Arc<dyn MessagingController>> {
    CONTROLLER
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Install the production controller. Returns the one it replaces.
pub fn install(controller: Arc<dyn MessagingController>) -> Option<Arc<dyn MessagingController>> {
    log::debug!("Installing messaging controller {:?}", controller);
    swap(Some(controller))
}

/// Replace the installed controller, or clear the slot with `None`.
/// Returns the previous controller so the caller can restore it.
#[cfg(any(test, feature = "test-seam"))]
pub fn inject(
    controller: Option<Arc<dyn MessagingController>>,
) -> Option<Arc<dyn MessagingController>> {
    swap(controller)
}

fn swap(controller: Option<Arc<dyn MessagingController>>) -> Option<Arc<dyn MessagingController>> {
    let mut slot = CONTROLLER.write().unwrap_or_else(PoisonError::into_inner);
    std::mem::replace(&mut *slot, controller)
}

#[cfg(test)]
mod tests {
    use msglib::MockController;
    use rusty_fork::rusty_fork_test;

    use super::*;

    fn same(a: &Arc<dyn MessagingController>, b: &Arc<dyn MessagingController>) -> bool {
        std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
    }

    rusty_fork_test! {
        #[test]
        fn test_slot_empty_by_default() {
            assert!(current().is_none());
        }

        #[test]
        fn test_slot_inject_and_restore() {
            let production: Arc<dyn MessagingController> = Arc::new(MockController::new());
            assert!(install(production.clone()).is_none());

            let mock: Arc<dyn MessagingController> = Arc::new(MockController::new());
            let previous = inject(Some(mock.clone()));
            assert!(same(previous.as_ref().unwrap(), &production));
            assert!(same(&current().unwrap(), &mock));

            let restored = inject(previous);
            assert!(same(&restored.unwrap(), &mock));
            assert!(same(&current().unwrap(), &production));

            inject(None);
            assert!(current().is_none());
        }
    }
}
