/// Ordered, duplicate-free section labels. Order is display order and is the
/// order sent with a run request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionList {
    labels: Vec<String>,
}

impl SectionList {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::default();
        for label in labels {
            list.add(label.as_ref());
        }
        list
    }

    /// Appends the trimmed label. Returns false when it is blank or already present.
    pub fn add(&mut self, label: &str) -> bool {
        let label = label.trim();
        if label.is_empty() || self.contains(label) {
            return false;
        }
        self.labels.push(label.to_string());
        true
    }

    pub fn remove(&mut self, index: usize) -> Option<String> {
        if index < self.labels.len() {
            Some(self.labels.remove(index))
        } else {
            None
        }
    }

    /// Replaces the list wholesale in recorded order. Recorded labels go
    /// through the same trimming and duplicate rules as [`SectionList::add`].
    /// A replacement with no usable label leaves the current list untouched.
    pub fn replace_with(&mut self, labels: Vec<String>) -> bool {
        let replacement = Self::new(labels);
        if replacement.is_empty() {
            return false;
        }
        *self = replacement;
        true
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|existing| existing == label)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.labels
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.labels.clone()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
