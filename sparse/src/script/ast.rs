use crate::collection::indexed::Indexed;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add { label: String },
    Clone { index: usize },
    Remove { index: usize },
    At { index: usize },
    Pack,
    Clear,
    List,
    Size,
    Stats,
}

impl Command {
    pub fn add(label: &str) -> Self {
        Self::Add {
            label: label.to_string(),
        }
    }

    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Command::Add { .. }
                | Command::Clone { .. }
                | Command::Remove { .. }
                | Command::Pack
                | Command::Clear
        )
    }
}

/// A labelled node held by the script executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    index: usize,
    pub label: String,
}

impl Entry {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            index: 0,
            label: label.into(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl Indexed for Entry {
    fn slot_index(&self) -> usize {
        self.index
    }

    fn set_slot_index(&mut self, index: usize) {
        self.index = index;
    }
}
