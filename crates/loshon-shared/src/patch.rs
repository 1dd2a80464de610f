//! Tri-state values for partial updates.
//!
//! A JSON patch body can leave a key out, send it as `null`, or send a
//! value. `Option<T>` collapses the first two, so clearing a nullable
//! field would be impossible. `Patch<T>` keeps all three apart.
//!
//! Fields of this type must carry `#[serde(default)]` so that an absent
//! key deserializes to [`Patch::Undefined`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    /// Key absent from the payload. Applying it is a no-op.
    Undefined,
    /// Key present with an explicit `null`.
    Null,
    /// Key present with a value.
    Value(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Undefined
    }
}

impl<T> Patch<T> {
    pub fn is_undefined(&self) -> bool {
        matches!(self, Patch::Undefined)
    }

    pub fn is_defined(&self) -> bool {
        !self.is_undefined()
    }

    pub fn as_ref(&self) -> Patch<&T> {
        match self {
            Patch::Undefined => Patch::Undefined,
            Patch::Null => Patch::Null,
            Patch::Value(v) => Patch::Value(v),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Patch<U> {
        match self {
            Patch::Undefined => Patch::Undefined,
            Patch::Null => Patch::Null,
            Patch::Value(v) => Patch::Value(f(v)),
        }
    }

    /// `None` when undefined, `Some(None)` for an explicit null.
    pub fn into_option(self) -> Option<Option<T>> {
        match self {
            Patch::Undefined => None,
            Patch::Null => Some(None),
            Patch::Value(v) => Some(Some(v)),
        }
    }

    /// Writes into a nullable field. Undefined leaves the field untouched.
    pub fn apply_to(self, field: &mut Option<T>) {
        if let Some(value) = self.into_option() {
            *field = value;
        }
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Patch::Value(v),
            None => Patch::Null,
        }
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Only reached when the key is present, so the field is defined
        // whatever the decoded value is.
        Option::<T>::deserialize(deserializer).map(Patch::from)
    }
}

impl<T> Serialize for Patch<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Patch::Value(v) => serializer.serialize_some(v),
            // Undefined fields are expected to be skipped by the container.
            Patch::Null | Patch::Undefined => serializer.serialize_none(),
        }
    }
}
