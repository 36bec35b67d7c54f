use std::collections::{HashMap, HashSet};

use crate::error::{Result, SimError};

/// Lookup form of a body name. Names compare case-insensitively.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Session-owned set of used names, grouped by a kind tag so that two kinds
/// of body may reuse a name while one kind may not.
#[derive(Debug, Clone, Default)]
pub struct NameRegistry {
    used: HashMap<String, HashSet<String>>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, kind: &str, name: &str) -> bool {
        self.used
            .get(kind)
            .is_some_and(|names| names.contains(&name_key(name)))
    }

    /// Claim `name` for `kind`, failing if it is already taken.
    pub fn register(&mut self, kind: &str, name: &str) -> Result<()> {
        let names = self.used.entry(kind.to_string()).or_default();
        if !names.insert(name_key(name)) {
            return Err(SimError::DuplicateName {
                kind: kind.to_string(),
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Give a name back. Returns whether it was registered.
    pub fn release(&mut self, kind: &str, name: &str) -> bool {
        self.used
            .get_mut(kind)
            .is_some_and(|names| names.remove(&name_key(name)))
    }

    pub fn count(&self, kind: &str) -> usize {
        self.used.get(kind).map_or(0, HashSet::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_kind_rejects_duplicate() {
        let mut reg = NameRegistry::new();
        reg.register("kbody", "Earth").unwrap();
        let err = reg.register("kbody", "Earth").unwrap_err();
        assert!(matches!(err, SimError::DuplicateName { .. }));
        assert_eq!(reg.count("kbody"), 1);
    }

    #[test]
    fn names_are_case_insensitive() {
        let mut reg = NameRegistry::new();
        reg.register("kbody", "Earth").unwrap();
        assert!(reg.contains("kbody", "EARTH"));
        assert!(reg.register("kbody", "earth").is_err());
    }

    #[test]
    fn kinds_are_independent() {
        let mut reg = NameRegistry::new();
        reg.register("kbody", "Vesta").unwrap();
        reg.register("asteroid", "Vesta").unwrap();
        assert_eq!(reg.count("asteroid"), 1);
    }

    #[test]
    fn released_name_can_be_reused() {
        let mut reg = NameRegistry::new();
        reg.register("kbody", "Ceres").unwrap();
        assert!(reg.release("kbody", "ceres"));
        assert!(!reg.release("kbody", "ceres"));
        reg.register("kbody", "Ceres").unwrap();
    }
}
