use crate::Fence;

/// The authoritative, ordered set of active fences.
///
/// The store does not validate: callers run [`crate::validate_new_fence`]
/// against [`FenceStore::list`] before [`FenceStore::insert`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FenceStore {
    fences: Vec<Fence>,
}

impl FenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fences(fences: Vec<Fence>) -> Self {
        Self { fences }
    }

    pub fn insert(&mut self, fence: Fence) {
        self.fences.push(fence);
    }

    /// Position of `uid`. Scans the whole set; the last match wins.
    pub fn position(&self, uid: &str) -> Option<usize> {
        self.fences.iter().rposition(|f| f.uid == uid)
    }

    pub fn get(&self, uid: &str) -> Option<&Fence> {
        self.position(uid).map(|i| &self.fences[i])
    }

    pub fn contains(&self, uid: &str) -> bool {
        self.position(uid).is_some()
    }

    pub fn remove(&mut self, uid: &str) -> Option<Fence> {
        let idx = self.position(uid)?;
        Some(self.fences.remove(idx))
    }

    /// Empty the set, returning the removed fences in insertion order.
    pub fn clear(&mut self) -> Vec<Fence> {
        std::mem::take(&mut self.fences)
    }

    pub fn replace(&mut self, fences: Vec<Fence>) {
        self.fences = fences;
    }

    /// Insertion-ordered view.
    pub fn list(&self) -> &[Fence] {
        &self.fences
    }

    pub fn uids(&self) -> Vec<String> {
        self.fences.iter().map(|f| f.uid.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.fences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fences.is_empty()
    }
}
