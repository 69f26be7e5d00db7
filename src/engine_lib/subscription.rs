// src/engine_lib/subscription.rs

/// Handle for a host event listener owned by a session. Events for the topic are
/// only acted on while the handle is active.
#[derive(Debug)]
pub struct Subscription {
    topic: &'static str,
    active: bool,
}

impl Subscription {
    pub fn attach(topic: &'static str) -> Self {
        log::debug!("Attached {topic} listener");
        Self { topic, active: true }
    }

    pub fn topic(&self) -> &'static str {
        self.topic
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// True only for the call that actually detached the listener.
    pub fn release(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.active = false;
        log::debug!("Released {} listener", self.topic);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_happens_once() {
        let mut sub = Subscription::attach("resize");
        assert!(sub.is_active());
        assert!(sub.release());
        assert!(!sub.release());
        assert!(!sub.is_active());
        assert_eq!(sub.topic(), "resize");
    }
}
