use std::collections::HashSet;

use traceviz_protocol::Label;

/// Per-profile string table. Each distinct name is allocated once; every
/// other occurrence is a refcount bump on the same allocation.
#[derive(Debug, Default)]
pub struct Interner {
    strings: HashSet<Label>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, s: &str) -> Label {
        if let Some(existing) = self.strings.get(s) {
            return existing.clone();
        }
        let label = Label::from(s);
        self.strings.insert(label.clone());
        label
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}
