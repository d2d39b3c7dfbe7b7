/// A one-shot listener registration.
///
/// Created armed; [`Subscription::unsubscribe`] disarms it for good.  The
/// owner checks [`Subscription::is_active`] when the event it listens for
/// happens and decides whether to unsubscribe after handling it.
#[derive(Debug)]
pub struct Subscription {
    event: &'static str,
    active: bool,
    deliveries: u32,
}

impl Subscription {
    pub fn new(event: &'static str) -> Self {
        Self {
            event,
            active: true,
            deliveries: 0,
        }
    }

    pub fn event(&self) -> &'static str {
        self.event
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Record an occurrence of the event.  Returns whether the listener is
    /// still registered and should handle it.
    pub fn deliver(&mut self) -> bool {
        if self.active {
            self.deliveries += 1;
        }
        self.active
    }

    pub fn deliveries(&self) -> u32 {
        self.deliveries
    }

    pub fn unsubscribe(&mut self) {
        self.active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_armed_until_unsubscribed() {
        let mut sub = Subscription::new("interaction");
        assert!(sub.deliver());
        assert!(sub.deliver());
        sub.unsubscribe();
        assert!(!sub.deliver());
        assert!(!sub.is_active());
        assert_eq!(sub.deliveries(), 2);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let mut sub = Subscription::new("interaction");
        sub.unsubscribe();
        sub.unsubscribe();
        assert!(!sub.is_active());
        assert_eq!(sub.event(), "interaction");
    }
}
