/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    #[error("text cannot be empty")]
    Empty,
}

/// Trimmed text with at least one non-whitespace character.
///
/// Search terms typed into the lookup dropdowns and record identifiers taken from a
/// selected option both go through this type before any request is built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Trims `input` and rejects it if nothing is left.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

/// A national identifier (RUT) in the normalised form used for lookups.
///
/// Barcode scanners and manual entry both produce RUTs with stray whitespace and a
/// lowercase `k` check digit; lookups compare the trimmed, uppercased value so the same
/// patient is not fetched twice for cosmetically different input.
///
/// No check-digit verification is performed. The backend is the authority on whether a
/// RUT exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rut(String);

impl Rut {
    /// Normalises `input` into a `Rut`.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] if the input is empty after trimming.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let text = NonEmptyText::new(input)?;
        Ok(Self(text.as_str().to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Rut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Rut {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<Rut> for NonEmptyText {
    fn from(rut: Rut) -> Self {
        NonEmptyText(rut.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_input() {
        let text = NonEmptyText::new("  12345  ").expect("non-empty");
        assert_eq!(text.as_str(), "12345");
    }

    #[test]
    fn non_empty_text_rejects_whitespace() {
        assert_eq!(NonEmptyText::new("   "), Err(TextError::Empty));
        assert_eq!(NonEmptyText::new(""), Err(TextError::Empty));
    }

    #[test]
    fn non_empty_text_deserialize_rejects_blank() {
        let err = serde_json::from_str::<NonEmptyText>("\"  \"");
        assert!(err.is_err());
        let ok: NonEmptyText = serde_json::from_str("\" abc \"").expect("valid text");
        assert_eq!(ok.as_str(), "abc");
    }

    #[test]
    fn rut_is_trimmed_and_uppercased() {
        let rut = Rut::new(" 12345678-k ").expect("valid rut");
        assert_eq!(rut.as_str(), "12345678-K");
        assert_eq!(rut, Rut::new("12345678-K").expect("valid rut"));
    }

    #[test]
    fn rut_rejects_blank_input() {
        assert_eq!(Rut::new("\t"), Err(TextError::Empty));
    }

    #[test]
    fn rut_converts_into_search_text() {
        let text: NonEmptyText = Rut::new("9876543-2").expect("valid rut").into();
        assert_eq!(text.as_str(), "9876543-2");
    }
}
