use crate::types::Value;

/// Key of a raw argument entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArgKey {
    Position(usize),
    Named(String),
}

/// Argument list as written in configuration - positional and named entries mixed
///
/// Positional entries are expected first, named entries after.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawArguments {
    entries: Vec<(ArgKey, Value)>,
}

impl RawArguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Purely positional arguments
    pub fn positional(values: impl IntoIterator<Item = Value>) -> Self {
        Self {
            entries: values
                .into_iter()
                .enumerate()
                .map(|(position, value)| (ArgKey::Position(position), value))
                .collect(),
        }
    }

    /// Appends a positional entry keyed by the next free position
    pub fn push(mut self, value: impl Into<Value>) -> Self {
        let position = self
            .entries
            .iter()
            .filter(|(key, _)| matches!(key, ArgKey::Position(_)))
            .count();
        self.entries.push((ArgKey::Position(position), value.into()));
        self
    }

    pub fn named(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.push((ArgKey::Named(name.into()), value.into()));
        self
    }

    pub fn insert(&mut self, key: ArgKey, value: Value) {
        self.entries.push((key, value));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(ArgKey, Value)] {
        &self.entries
    }
}

impl From<Vec<Value>> for RawArguments {
    fn from(values: Vec<Value>) -> Self {
        Self::positional(values)
    }
}

impl FromIterator<(ArgKey, Value)> for RawArguments {
    fn from_iter<I: IntoIterator<Item = (ArgKey, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Orders raw arguments against a callable's declared parameter names
///
/// For every parameter, a named entry with the same name is pulled out of the
/// raw list. The result is the remaining entries in their original order,
/// followed by the pulled entries in parameter order. Named entries matching no
/// parameter stay where they were.
///
/// Without a parameter list the entries are returned in order.
pub fn normalize(parameters: Option<&[String]>, raw: RawArguments) -> Vec<Value> {
    let mut remaining = raw.entries;
    let Some(parameters) = parameters else {
        return remaining.into_iter().map(|(_, value)| value).collect();
    };

    let mut extracted = Vec::new();
    for parameter in parameters {
        let position = remaining
            .iter()
            .position(|(key, _)| matches!(key, ArgKey::Named(name) if name == parameter));

        if let Some(position) = position {
            tracing::trace!("Moving named argument '{parameter}' into place");
            let (_, value) = remaining.remove(position);
            extracted.push(value);
        }
    }

    remaining
        .into_iter()
        .map(|(_, value)| value)
        .chain(extracted)
        .collect()
}
