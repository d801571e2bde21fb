/// Order-preserving batch read result.
///
/// Three parallel lanes (storage key, version, payload), all exactly as
/// long as the input batch, with element `i` of every lane corresponding to
/// input key `i`. Lookups that carry no version zero-fill the version lane.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedItems<T> {
    keys: Vec<i64>,
    versions: Vec<i32>,
    items: Vec<T>,
}

impl<T> KeyedItems<T> {
    /// Panics if the lanes differ in length; the read path constructs all
    /// three from the same row walk, so a mismatch is a programming error.
    pub fn new(keys: Vec<i64>, versions: Vec<i32>, items: Vec<T>) -> Self {
        assert_eq!(keys.len(), versions.len());
        assert_eq!(keys.len(), items.len());
        Self {
            keys,
            versions,
            items,
        }
    }

    pub fn unversioned(keys: Vec<i64>, items: Vec<T>) -> Self {
        let versions = vec![0; keys.len()];
        Self::new(keys, versions, items)
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new(), Vec::new())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[i64] {
        &self.keys
    }

    pub fn versions(&self) -> &[i32] {
        &self.versions
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, i32, &T)> {
        self.keys
            .iter()
            .copied()
            .zip(self.versions.iter().copied())
            .zip(self.items.iter())
            .map(|((key, version), item)| (key, version, item))
    }

    pub fn into_parts(self) -> (Vec<i64>, Vec<i32>, Vec<T>) {
        (self.keys, self.versions, self.items)
    }
}

impl<T> Default for KeyedItems<T> {
    fn default() -> Self {
        Self::empty()
    }
}
