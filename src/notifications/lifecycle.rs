use std::sync::Arc;

use log::debug;

use crate::collaborators::Notifier;

use super::{Notice, NotificationCategory, NotificationId};

/// Holds at most one live notification per category.
///
/// Per category the states are `absent -> live -> absent`. `update` on an
/// absent category does nothing, `remove` is idempotent and `remove_all` is
/// the teardown path.
pub struct NotificationLifecycle {
    notifier: Arc<dyn Notifier>,
    live: [Option<NoticeStamp>; 3],
    next_revision: u64,
}

/// Identifies one version of a live notification. Any later write to the
/// same category produces a new stamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeStamp {
    pub id: NotificationId,
    pub revision: u64,
}

impl NotificationLifecycle {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            notifier,
            live: [None, None, None],
            next_revision: 0,
        }
    }

    fn bump(&mut self) -> u64 {
        self.next_revision += 1;
        self.next_revision
    }

    fn open(&mut self, category: NotificationCategory, notice: &Notice) -> NotificationId {
        let id = self.notifier.show(notice);
        debug!("Opened {category} notification {id}");
        let revision = self.bump();
        self.live[category.slot()] = Some(NoticeStamp {
            id: id.clone(),
            revision,
        });
        id
    }

    fn rewrite(&mut self, category: NotificationCategory, notice: &Notice) -> Option<NotificationId> {
        let revision = self.bump();
        let stamp = self.live[category.slot()].as_mut()?;
        self.notifier.update(&stamp.id, notice);
        stamp.revision = revision;
        Some(stamp.id.clone())
    }

    /// Opens a notification unless one is already live for `category`.
    /// Returns the new id, or `None` when nothing was opened.
    pub fn show_pending(
        &mut self,
        category: NotificationCategory,
        notice: &Notice,
    ) -> Option<NotificationId> {
        if self.live[category.slot()].is_some() {
            return None;
        }
        Some(self.open(category, notice))
    }

    /// Rewrites the live notification for `category`. No-op when absent.
    pub fn update(&mut self, category: NotificationCategory, notice: &Notice) -> bool {
        self.rewrite(category, notice).is_some()
    }

    /// Updates the live notification or opens one; either way the category
    /// ends up with exactly one handle. Returns that handle.
    pub fn present(&mut self, category: NotificationCategory, notice: &Notice) -> NotificationId {
        match self.rewrite(category, notice) {
            Some(id) => id,
            None => self.open(category, notice),
        }
    }

    pub fn remove(&mut self, category: NotificationCategory) -> bool {
        match self.live[category.slot()].take() {
            Some(stamp) => {
                self.notifier.remove(&stamp.id);
                debug!("Removed {category} notification {}", stamp.id);
                true
            }
            None => false,
        }
    }

    /// Removes the category only if it still shows exactly the version
    /// `stamp` refers to. Used for auto-expiring notices.
    pub fn expire(&mut self, category: NotificationCategory, stamp: &NoticeStamp) -> bool {
        if self.live[category.slot()].as_ref() == Some(stamp) {
            self.remove(category)
        } else {
            false
        }
    }

    pub fn remove_all(&mut self) {
        for category in NotificationCategory::ALL {
            self.remove(category);
        }
    }

    pub fn is_live(&self, category: NotificationCategory) -> bool {
        self.live[category.slot()].is_some()
    }

    pub fn handle(&self, category: NotificationCategory) -> Option<&NotificationId> {
        self.live[category.slot()].as_ref().map(|stamp| &stamp.id)
    }

    pub fn stamp(&self, category: NotificationCategory) -> Option<NoticeStamp> {
        self.live[category.slot()].clone()
    }

    pub fn live_categories(&self) -> Vec<NotificationCategory> {
        NotificationCategory::ALL
            .into_iter()
            .filter(|c| self.is_live(*c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::NotificationLevel;
    use crate::sim::RecordingNotifier;

    fn lifecycle() -> (NotificationLifecycle, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::new());
        (NotificationLifecycle::new(notifier.clone()), notifier)
    }

    fn notice(message: &str) -> Notice {
        Notice::new(NotificationLevel::Pending, "t", message)
    }

    #[test]
    fn show_pending_twice_keeps_one_handle() {
        let (mut notices, notifier) = lifecycle();

        let first = notices.show_pending(NotificationCategory::Status, &notice("a"));
        let second = notices.show_pending(NotificationCategory::Status, &notice("b"));

        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(notifier.live_count(), 1);
        assert_eq!(notices.handle(NotificationCategory::Status), first.as_ref());
    }

    #[test]
    fn update_without_handle_is_noop() {
        let (mut notices, notifier) = lifecycle();
        assert!(!notices.update(NotificationCategory::RangeWarning, &notice("x")));
        assert_eq!(notifier.calls().len(), 0);
    }

    #[test]
    fn update_rewrites_the_same_id() {
        let (mut notices, notifier) = lifecycle();
        let id = notices
            .show_pending(NotificationCategory::Status, &notice("0%"))
            .unwrap();

        assert!(notices.update(NotificationCategory::Status, &notice("50%")));
        assert_eq!(notifier.current(&id).unwrap().message, "50%");
        assert_eq!(notifier.live_count(), 1);
    }

    #[test]
    fn present_replaces_instead_of_stacking() {
        let (mut notices, notifier) = lifecycle();
        let a = notices.present(NotificationCategory::Status, &notice("error"));
        let b = notices.present(NotificationCategory::Status, &notice("retry ok"));

        assert_eq!(a, b);
        assert_eq!(notifier.live_count(), 1);
        assert_eq!(notifier.current(&a).unwrap().message, "retry ok");
    }

    #[test]
    fn remove_is_idempotent() {
        let (mut notices, notifier) = lifecycle();
        notices.show_pending(NotificationCategory::CaptureGuide, &notice("guide"));

        assert!(notices.remove(NotificationCategory::CaptureGuide));
        assert!(!notices.remove(NotificationCategory::CaptureGuide));
        assert_eq!(notifier.live_count(), 0);
        assert_eq!(notifier.removed_count(), 1);
    }

    #[test]
    fn expire_ignores_a_rewritten_notice() {
        let (mut notices, _notifier) = lifecycle();
        notices.present(NotificationCategory::Status, &notice("uploaded"));
        let first = notices.stamp(NotificationCategory::Status).unwrap();

        notices.present(NotificationCategory::Status, &notice("checked in"));
        let second = notices.stamp(NotificationCategory::Status).unwrap();
        assert_eq!(first.id, second.id);

        assert!(!notices.expire(NotificationCategory::Status, &first));
        assert!(notices.is_live(NotificationCategory::Status));
        assert!(notices.expire(NotificationCategory::Status, &second));
        assert!(!notices.is_live(NotificationCategory::Status));
    }

    #[test]
    fn expire_ignores_a_reopened_category() {
        let (mut notices, _notifier) = lifecycle();
        notices.present(NotificationCategory::Status, &notice("a"));
        let old = notices.stamp(NotificationCategory::Status).unwrap();
        notices.remove(NotificationCategory::Status);
        notices.present(NotificationCategory::Status, &notice("b"));

        assert!(!notices.expire(NotificationCategory::Status, &old));
        assert!(notices.is_live(NotificationCategory::Status));
    }

    #[test]
    fn remove_all_clears_every_category() {
        let (mut notices, notifier) = lifecycle();
        for category in NotificationCategory::ALL {
            notices.show_pending(category, &notice(category.as_str()));
        }
        assert_eq!(notices.live_categories().len(), 3);

        notices.remove_all();
        assert!(notices.live_categories().is_empty());
        assert_eq!(notifier.live_count(), 0);

        notices.remove_all();
        assert_eq!(notifier.removed_count(), 3);
    }
}
