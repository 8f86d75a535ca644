use crate::interface::Signal;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// A derived signal or scalar produced by one invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Artifact {
    Signal(Signal),
    Scalar(f64),
}

impl Artifact {
    pub fn as_signal(&self) -> Option<&Signal> {
        match self {
            Artifact::Signal(signal) => Some(signal),
            Artifact::Scalar(_) => None,
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Artifact::Scalar(value) => Some(*value),
            Artifact::Signal(_) => None,
        }
    }
}

impl From<Signal> for Artifact {
    fn from(signal: Signal) -> Self {
        Artifact::Signal(signal)
    }
}

impl From<f64> for Artifact {
    fn from(value: f64) -> Self {
        Artifact::Scalar(value)
    }
}

/// Named artifacts of one pipeline run, in insertion order.
///
/// Built by [`OutputAssembler`](crate::processing::OutputAssembler) and
/// read-only afterwards. Serializes as a JSON object whose keys follow
/// insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultRecord {
    entries: Vec<(String, Artifact)>,
}

impl ResultRecord {
    /// Last write wins; a rewritten key keeps its first position.
    pub(crate) fn insert(&mut self, name: String, artifact: Artifact) {
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = artifact,
            None => self.entries.push((name, artifact)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Artifact> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, artifact)| artifact)
    }

    pub fn signal(&self, name: &str) -> Option<&Signal> {
        self.get(name).and_then(Artifact::as_signal)
    }

    pub fn scalar(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Artifact::as_scalar)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Artifact)> {
        self.entries
            .iter()
            .map(|(key, artifact)| (key.as_str(), artifact))
    }
}

impl Serialize for ResultRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, artifact) in &self.entries {
            map.serialize_entry(key, artifact)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_overwrites_in_place() {
        let mut record = ResultRecord::default();
        record.insert("a".into(), Artifact::Scalar(1.0));
        record.insert("b".into(), Artifact::Scalar(2.0));
        record.insert("a".into(), Artifact::Scalar(3.0));

        assert_eq!(record.len(), 2);
        assert_eq!(record.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(record.scalar("a"), Some(3.0));
    }

    #[test]
    fn serialization_follows_insertion_order() {
        let mut record = ResultRecord::default();
        record.insert("zeta".into(), Artifact::Scalar(1.0));
        record.insert("alpha".into(), Artifact::Scalar(2.0));

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"zeta":1.0,"alpha":2.0}"#);
    }
}
