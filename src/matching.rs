//! Per-field match semantics shared by logical and native queries.

/// How a single query field constrains a stored value.
///
/// The host login-manager contract encodes this in nullable strings:
/// `null` matches only entries where the field is absent, `""` matches any
/// value, anything else matches exactly. [`FieldMatch::from_contract`]
/// performs that lowering. The last two variants only appear in native
/// keychain queries built by the [`mapper`](crate::mapper).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldMatch<T> {
    /// Any value, including a missing one.
    Any,
    /// Only entries where the field is missing.
    Absent,
    /// Only entries with exactly this value.
    Exact(T),
    /// Entries with this value or with the field missing.
    ExactOrAbsent(T),
    /// Entries with any other value, or with the field missing.
    Except(T),
}

impl<T: PartialEq> FieldMatch<T> {
    /// Tests a stored value against this constraint.
    pub fn matches(&self, value: Option<&T>) -> bool {
        match (self, value) {
            (Self::Any, _) => true,
            (Self::Absent, v) => v.is_none(),
            (Self::Exact(want), Some(v)) => want == v,
            (Self::Exact(_), None) => false,
            (Self::ExactOrAbsent(want), Some(v)) => want == v,
            (Self::ExactOrAbsent(_), None) => true,
            (Self::Except(unwanted), Some(v)) => unwanted != v,
            (Self::Except(_), None) => true,
        }
    }

    /// Returns true for [`FieldMatch::Any`].
    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }
}

impl FieldMatch<String> {
    /// Lowers a nullable contract string into a match constraint.
    ///
    /// ```
    /// use loginmux::FieldMatch;
    ///
    /// assert_eq!(FieldMatch::from_contract(None), FieldMatch::Absent);
    /// assert_eq!(FieldMatch::from_contract(Some("")), FieldMatch::Any);
    /// assert_eq!(
    ///     FieldMatch::from_contract(Some("Members")),
    ///     FieldMatch::Exact("Members".to_string())
    /// );
    /// ```
    pub fn from_contract(value: Option<&str>) -> Self {
        match value {
            None => Self::Absent,
            Some("") => Self::Any,
            Some(v) => Self::Exact(v.to_string()),
        }
    }

    /// Exact match where an empty value means "field missing".
    ///
    /// Used for keychain attributes, where writers disagree on whether an
    /// unset attribute is stored as missing or as an empty string.
    pub fn exact_or_blank(value: &str) -> Self {
        if value.is_empty() {
            Self::Absent
        } else {
            Self::Exact(value.to_string())
        }
    }

    /// Tests a string attribute, treating an empty string as missing.
    pub fn matches_str(&self, value: Option<&str>) -> bool {
        let value = value.filter(|v| !v.is_empty()).map(str::to_string);
        self.matches(value.as_ref())
    }

    /// Like [`matches_str`](Self::matches_str), ignoring ASCII case.
    ///
    /// Host names are case-insensitive, and other writers do not always
    /// store them lowercased.
    pub fn matches_str_ignore_case(&self, value: Option<&str>) -> bool {
        let value = value.filter(|v| !v.is_empty());
        match self {
            Self::Any => true,
            Self::Absent => value.is_none(),
            Self::Exact(want) => value.is_some_and(|v| v.eq_ignore_ascii_case(want)),
            Self::ExactOrAbsent(want) => value.map_or(true, |v| v.eq_ignore_ascii_case(want)),
            Self::Except(unwanted) => value.map_or(true, |v| !v.eq_ignore_ascii_case(unwanted)),
        }
    }
}
