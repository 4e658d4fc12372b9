use super::entities::Timer;

#[derive(PartialEq, Eq, Debug, Clone)]
struct LabelGroup {
    label: String,
    timers: Vec<Timer>,
}

/// In-memory collection of all timers, grouped by label.
///
/// Labels keep the order in which they were first seen, timers inside a label keep creation
/// order. A label stays known even after all of its timers get removed.
#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct TimerStore {
    groups: Vec<LabelGroup>,
}

impl TimerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn group(&self, label: &str) -> Option<&LabelGroup> {
        self.groups.iter().find(|group| group.label == label)
    }

    fn group_mut(&mut self, label: &str) -> Option<&mut LabelGroup> {
        self.groups.iter_mut().find(|group| group.label == label)
    }

    /// Timers of a label in creation order. Unknown labels have no timers.
    pub fn timers(&self, label: &str) -> &[Timer] {
        self.group(label)
            .map(|group| group.timers.as_slice())
            .unwrap_or_default()
    }

    /// The last created timer of a label.
    pub fn latest(&self, label: &str) -> Option<&Timer> {
        self.timers(label).last()
    }

    pub fn latest_mut(&mut self, label: &str) -> Option<&mut Timer> {
        self.group_mut(label).and_then(|group| group.timers.last_mut())
    }

    pub fn contains_label(&self, label: &str) -> bool {
        self.group(label).is_some()
    }

    /// Appends a timer to the end of its label.
    pub fn push(&mut self, timer: Timer) {
        match self.group_mut(&timer.label) {
            Some(group) => group.timers.push(timer),
            None => self.groups.push(LabelGroup {
                label: timer.label.clone(),
                timers: vec![timer],
            }),
        }
    }

    /// Removes the timer at `index` (0-based) of a label.
    pub fn remove(&mut self, label: &str, index: usize) -> Option<Timer> {
        let group = self.group_mut(label)?;
        if index < group.timers.len() {
            Some(group.timers.remove(index))
        } else {
            None
        }
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|group| group.label.as_str())
    }

    /// All timers, label by label.
    pub fn iter(&self) -> impl Iterator<Item = &Timer> {
        self.groups.iter().flat_map(|group| group.timers.iter())
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(|group| group.timers.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<Timer> for TimerStore {
    fn from_iter<T: IntoIterator<Item = Timer>>(iter: T) -> Self {
        let mut store = TimerStore::new();
        for timer in iter {
            store.push(timer);
        }
        store
    }
}
