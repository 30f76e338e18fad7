//! The message list container.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::broadcast;

use super::bubble::{Bubble, BubbleId, BubbleKind, Role};

/// Capacity of the change-event channel.
const EVENT_CAPACITY: usize = 256;

/// A change applied to the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerEvent {
    /// A bubble was added at the end of the list.
    Appended(Bubble),
    /// A bubble was swapped in place for a new one.
    Replaced { old: BubbleId, new: Bubble },
    /// A bubble was taken out of the list.
    Removed(BubbleId),
}

/// Ordered list of chat bubbles shared between the widget and its host.
///
/// Cloning yields another handle to the same list.
#[derive(Debug, Clone)]
pub struct ChatContainer {
    inner: Arc<ContainerInner>,
}

#[derive(Debug)]
struct ContainerInner {
    state: RwLock<ContainerState>,
    events: broadcast::Sender<ContainerEvent>,
}

#[derive(Debug, Default)]
struct ContainerState {
    bubbles: Vec<Bubble>,
    next_id: u64,
    /// Bubble currently scrolled into view.
    scroll_anchor: Option<BubbleId>,
}

impl ContainerState {
    fn allocate_id(&mut self) -> BubbleId {
        let id = BubbleId(self.next_id);
        self.next_id += 1;
        id
    }

    fn scroll_to_bottom(&mut self) {
        self.scroll_anchor = self.bubbles.last().map(|b| b.id);
    }
}

impl Default for ChatContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatContainer {
    /// Create an empty container.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(ContainerInner {
                state: RwLock::new(ContainerState::default()),
                events,
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ContainerState> {
        self.inner.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ContainerState> {
        self.inner.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: ContainerEvent) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }

    /// Subscribe to changes made after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ContainerEvent> {
        self.inner.events.subscribe()
    }

    /// Append a bubble at the end and scroll it into view.
    pub fn append(&self, role: Role, kind: BubbleKind, text: impl Into<String>) -> BubbleId {
        let mut state = self.write();
        let bubble = Bubble {
            id: state.allocate_id(),
            role,
            kind,
            text: text.into(),
        };
        let id = bubble.id;
        state.bubbles.push(bubble.clone());
        state.scroll_to_bottom();
        self.emit(ContainerEvent::Appended(bubble));
        id
    }

    /// Replace bubble `id` in place with a new bubble.
    ///
    /// Returns the new bubble's id, or `None` if `id` is no longer present.
    pub fn replace(
        &self,
        id: BubbleId,
        role: Role,
        kind: BubbleKind,
        text: impl Into<String>,
    ) -> Option<BubbleId> {
        let mut state = self.write();
        let pos = state.bubbles.iter().position(|b| b.id == id)?;
        let bubble = Bubble {
            id: state.allocate_id(),
            role,
            kind,
            text: text.into(),
        };
        let new_id = bubble.id;
        state.bubbles[pos] = bubble.clone();
        state.scroll_to_bottom();
        self.emit(ContainerEvent::Replaced {
            old: id,
            new: bubble,
        });
        Some(new_id)
    }

    /// Remove bubble `id`.
    pub fn remove(&self, id: BubbleId) -> Option<Bubble> {
        let mut state = self.write();
        let pos = state.bubbles.iter().position(|b| b.id == id)?;
        let removed = state.bubbles.remove(pos);
        if state.scroll_anchor == Some(id) {
            state.scroll_to_bottom();
        }
        self.emit(ContainerEvent::Removed(id));
        Some(removed)
    }

    /// Remove the most recently appended node.
    pub fn remove_last(&self) -> Option<Bubble> {
        let id = self.last()?.id;
        self.remove(id)
    }

    /// Scroll the newest bubble into view.
    pub fn scroll_to_bottom(&self) {
        self.write().scroll_to_bottom();
    }

    /// Bubble currently scrolled into view.
    pub fn scroll_anchor(&self) -> Option<BubbleId> {
        self.read().scroll_anchor
    }

    /// Snapshot of all bubbles in display order.
    pub fn bubbles(&self) -> Vec<Bubble> {
        self.read().bubbles.clone()
    }

    pub fn get(&self, id: BubbleId) -> Option<Bubble> {
        self.read().bubbles.iter().find(|b| b.id == id).cloned()
    }

    pub fn last(&self) -> Option<Bubble> {
        self.read().bubbles.last().cloned()
    }

    pub fn len(&self) -> usize {
        self.read().bubbles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().bubbles.is_empty()
    }

    /// Ids of placeholders still waiting for a reply.
    pub fn placeholders(&self) -> Vec<BubbleId> {
        self.read()
            .bubbles
            .iter()
            .filter(|b| b.is_placeholder())
            .map(|b| b.id)
            .collect()
    }

    /// Render the list as HTML nodes, one per bubble.
    pub fn to_html(&self) -> String {
        self.read()
            .bubbles
            .iter()
            .map(Bubble::to_html)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_scrolls_to_newest() {
        let container = ChatContainer::new();
        assert!(container.is_empty());
        assert_eq!(container.scroll_anchor(), None);

        let first = container.append(Role::User, BubbleKind::Message, "Hello");
        assert_eq!(container.scroll_anchor(), Some(first));

        let second = container.append(Role::Assistant, BubbleKind::Placeholder, "Planning...");
        assert_eq!(container.scroll_anchor(), Some(second));
        assert_eq!(container.len(), 2);
        assert_ne!(first, second);
    }

    #[test]
    fn test_replace_keeps_position() {
        let container = ChatContainer::new();
        container.append(Role::User, BubbleKind::Message, "A");
        let placeholder = container.append(Role::Assistant, BubbleKind::Placeholder, "Planning...");
        container.append(Role::User, BubbleKind::Message, "B");

        let reply = container
            .replace(placeholder, Role::Assistant, BubbleKind::Message, "reply A")
            .unwrap();

        let texts: Vec<_> = container.bubbles().into_iter().map(|b| b.text).collect();
        assert_eq!(texts, ["A", "reply A", "B"]);
        assert!(container.get(placeholder).is_none());
        assert_eq!(container.get(reply).unwrap().text, "reply A");
        assert!(container.placeholders().is_empty());
    }

    #[test]
    fn test_replace_missing_bubble() {
        let container = ChatContainer::new();
        let id = container.append(Role::User, BubbleKind::Message, "A");
        container.remove(id);
        assert!(
            container
                .replace(id, Role::Assistant, BubbleKind::Message, "late")
                .is_none()
        );
        assert!(container.is_empty());
    }

    #[test]
    fn test_remove_last() {
        let container = ChatContainer::new();
        let first = container.append(Role::User, BubbleKind::Message, "A");
        container.append(Role::Assistant, BubbleKind::Placeholder, "Planning...");

        let removed = container.remove_last().unwrap();
        assert_eq!(removed.text, "Planning...");
        assert_eq!(container.len(), 1);
        assert_eq!(container.scroll_anchor(), Some(first));

        container.remove_last();
        assert!(container.remove_last().is_none());
        assert_eq!(container.scroll_anchor(), None);
    }

    #[test]
    fn test_ids_never_reused() {
        let container = ChatContainer::new();
        let a = container.append(Role::User, BubbleKind::Message, "A");
        container.remove(a);
        let b = container.append(Role::User, BubbleKind::Message, "B");
        assert_ne!(a, b);
    }

    #[test]
    fn test_events() {
        let container = ChatContainer::new();
        let mut rx = container.subscribe();

        let id = container.append(Role::User, BubbleKind::Message, "A");
        let new = container
            .replace(id, Role::User, BubbleKind::Message, "A2")
            .unwrap();
        container.remove(new);

        match rx.try_recv().unwrap() {
            ContainerEvent::Appended(b) => assert_eq!(b.id, id),
            other => panic!("unexpected event: {other:?}"),
        }
        match rx.try_recv().unwrap() {
            ContainerEvent::Replaced { old, new: bubble } => {
                assert_eq!(old, id);
                assert_eq!(bubble.id, new);
                assert_eq!(bubble.text, "A2");
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(rx.try_recv().unwrap(), ContainerEvent::Removed(new));
    }

    #[test]
    fn test_clones_share_state() {
        let container = ChatContainer::new();
        let handle = container.clone();
        handle.append(Role::User, BubbleKind::Message, "shared");
        assert_eq!(container.len(), 1);
    }

    #[test]
    fn test_to_html() {
        let container = ChatContainer::new();
        container.append(Role::User, BubbleKind::Message, "Hi");
        container.append(Role::Assistant, BubbleKind::Message, "Hello");
        let html = container.to_html();
        let lines: Vec<_> = html.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("bg-blue-100 self-end"));
        assert!(lines[1].ends_with(">Hello</div>"));
    }
}
