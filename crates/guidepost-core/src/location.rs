// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Navigation input. Router adapters translate their own events into
//! [`NavigationEvent`] and feed them to [`crate::GuideEngine::on_navigate`].

/// A navigation observed by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationEvent {
    /// New history entry.
    Push(String),
    /// Current history entry replaced.
    Replace(String),
    /// Back/forward.
    Pop(String),
    /// Fragment change.
    HashChange(String),
}

impl NavigationEvent {
    /// Resolved href after the navigation.
    pub fn href(&self) -> &str {
        match self {
            NavigationEvent::Push(href)
            | NavigationEvent::Replace(href)
            | NavigationEvent::Pop(href)
            | NavigationEvent::HashChange(href) => href,
        }
    }
}

/// Decides which navigations reach the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationTracker {
    attached: bool,
}

impl Default for LocationTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationTracker {
    /// Attached tracker.
    pub fn new() -> Self {
        Self { attached: true }
    }

    /// Start forwarding navigations.
    pub fn attach(&mut self) {
        self.attached = true;
    }

    /// Stop forwarding navigations.
    pub fn detach(&mut self) {
        self.attached = false;
    }

    /// Whether navigations are forwarded.
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// The href to store for `event`, or `None` when detached or unchanged.
    pub fn resolve<'e>(&self, event: &'e NavigationEvent, current: Option<&str>) -> Option<&'e str> {
        if !self.attached {
            return None;
        }
        let href = event.href();
        (current != Some(href)).then_some(href)
    }
}
