//! Where the current page address lives

/// A mutable page address, the way a browser exposes `location`
pub trait Location {
    /// Current absolute address, if the context has one
    fn href(&self) -> Option<String>;

    /// Swap the current address without adding a history entry
    fn replace(&mut self, href: &str);
}

impl<L: Location + ?Sized> Location for Box<L> {
    fn href(&self) -> Option<String> {
        (**self).href()
    }

    fn replace(&mut self, href: &str) {
        (**self).replace(href)
    }
}

/// Context without an address. Reads find nothing, writes are dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct Detached;

impl Location for Detached {
    fn href(&self) -> Option<String> {
        None
    }

    fn replace(&mut self, _href: &str) {}
}

/// In-process address with a navigation history
#[derive(Debug, Clone)]
pub struct MemoryLocation {
    history: Vec<String>,
    replacements: usize,
}

impl MemoryLocation {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            history: vec![href.into()],
            replacements: 0,
        }
    }

    /// Push a new entry, as following a link would
    pub fn navigate(&mut self, href: impl Into<String>) {
        self.history.push(href.into());
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Number of in-place updates so far
    pub fn replacements(&self) -> usize {
        self.replacements
    }
}

impl Location for MemoryLocation {
    fn href(&self) -> Option<String> {
        self.history.last().cloned()
    }

    fn replace(&mut self, href: &str) {
        match self.history.last_mut() {
            Some(current) => *current = href.to_string(),
            None => self.history.push(href.to_string()),
        }
        self.replacements += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_keeps_history_length() {
        let mut location = MemoryLocation::new("https://example.com/");
        location.replace("https://example.com/?state=a");
        location.replace("https://example.com/?state=b");

        assert_eq!(location.history_len(), 1);
        assert_eq!(location.replacements(), 2);
        assert_eq!(location.href().as_deref(), Some("https://example.com/?state=b"));
    }

    #[test]
    fn test_navigate_pushes() {
        let mut location = MemoryLocation::new("https://example.com/");
        location.navigate("https://example.com/other");
        assert_eq!(location.history_len(), 2);
        assert_eq!(location.href().as_deref(), Some("https://example.com/other"));
    }

    #[test]
    fn test_detached() {
        let mut location: Box<dyn Location> = Box::new(Detached);
        location.replace("https://example.com/");
        assert!(location.href().is_none());
    }
}
