use std::collections::HashSet;

/// Links already accepted or rejected during the current run
#[derive(Debug, Default)]
pub struct SeenLinks {
    seen: HashSet<String>,
}

impl SeenLinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `link` and return true if it was not seen before in this run.
    /// A repeated link leaves the registry untouched.
    pub fn add_if_new(&mut self, link: &str) -> bool {
        if self.seen.contains(link) {
            return false;
        }
        self.seen.insert(link.to_string())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_add_is_rejected() {
        let mut seen = SeenLinks::new();
        assert!(seen.is_empty());

        assert!(seen.add_if_new("https://www.njuskalo.hr/nekretnine/stan-1"));
        assert_eq!(seen.len(), 1);

        assert!(!seen.add_if_new("https://www.njuskalo.hr/nekretnine/stan-1"));
        assert_eq!(seen.len(), 1);
        assert!(!seen.is_empty());
    }

    #[test]
    fn test_distinct_links_grow_the_set() {
        let mut seen = SeenLinks::new();
        for link in ["a", "b", "c", "b", "a"] {
            seen.add_if_new(link);
        }
        assert_eq!(seen.len(), 3);
    }
}
