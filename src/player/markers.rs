//! Named timestamp bookmarks, kept sorted by time.

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub time: f64,
    pub label: String,
}

#[derive(Debug, Default)]
pub struct MarkerStore {
    markers: Vec<Marker>,
}

impl MarkerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a marker and returns its index after sorting.
    ///
    /// Without a label the marker is named `Marker N`, N being the count
    /// before insertion plus one.
    pub fn add(&mut self, time: f64, label: Option<&str>) -> Option<usize> {
        if time.is_nan() {
            return None;
        }
        let time = time.max(0.0);
        let label = match label.map(str::trim) {
            Some(label) if !label.is_empty() => label.to_string(),
            _ => format!("Marker {}", self.markers.len() + 1),
        };

        // Insert after any marker at the same time to keep insertion order stable
        let index = self.markers.partition_point(|m| m.time <= time);
        self.markers.insert(index, Marker { time, label });
        Some(index)
    }

    pub fn remove(&mut self, index: usize) -> bool {
        if index < self.markers.len() {
            self.markers.remove(index);
            true
        } else {
            false
        }
    }

    pub fn get(&self, index: usize) -> Option<&Marker> {
        self.markers.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn clear(&mut self) {
        self.markers.clear();
    }

    /// `"<label> (MM:SS)"` for display.
    pub fn describe(&self, index: usize) -> Option<String> {
        self.get(index).map(|marker| {
            let total = marker.time as u64;
            format!("{} ({:02}:{:02})", marker.label, total / 60, total % 60)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn times(store: &MarkerStore) -> Vec<f64> {
        store.iter().map(|m| m.time).collect()
    }

    #[test]
    fn test_add_keeps_sorted() {
        let mut store = MarkerStore::new();
        store.add(5.0, None);
        store.add(1.0, None);
        store.add(3.0, None);

        assert_eq!(times(&store), vec![1.0, 3.0, 5.0]);
    }

    #[test]
    fn test_add_returns_sorted_index() {
        let mut store = MarkerStore::new();
        assert_eq!(store.add(5.0, None), Some(0));
        assert_eq!(store.add(1.0, None), Some(0));
        assert_eq!(store.add(3.0, None), Some(1));
        assert_eq!(store.add(9.0, None), Some(3));
    }

    #[test]
    fn test_default_labels_use_pre_insert_count() {
        let mut store = MarkerStore::new();
        store.add(5.0, None);
        store.add(1.0, None);

        assert_eq!(store.get(0).unwrap().label, "Marker 2");
        assert_eq!(store.get(1).unwrap().label, "Marker 1");
    }

    #[test]
    fn test_custom_label() {
        let mut store = MarkerStore::new();
        store.add(2.0, Some("chorus"));
        store.add(3.0, Some("   "));

        assert_eq!(store.get(0).unwrap().label, "chorus");
        assert_eq!(store.get(1).unwrap().label, "Marker 2");
    }

    #[test]
    fn test_negative_and_nan_times() {
        let mut store = MarkerStore::new();
        assert_eq!(store.add(-3.0, None), Some(0));
        assert_eq!(store.get(0).unwrap().time, 0.0);
        assert_eq!(store.add(f64::NAN, None), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove_out_of_range_is_noop() {
        let mut store = MarkerStore::new();
        store.add(1.0, None);
        store.add(2.0, None);

        assert!(!store.remove(2));
        assert!(!store.remove(usize::MAX));
        assert_eq!(times(&store), vec![1.0, 2.0]);

        assert!(store.remove(0));
        assert_eq!(times(&store), vec![2.0]);
    }

    #[test]
    fn test_clear() {
        let mut store = MarkerStore::new();
        store.add(1.0, None);
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_describe() {
        let mut store = MarkerStore::new();
        store.add(125.7, Some("bridge"));

        assert_eq!(store.describe(0).as_deref(), Some("bridge (02:05)"));
        assert!(store.describe(1).is_none());
    }
}
