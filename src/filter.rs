//! Search filter inputs exchanged between filter controls and whatever
//! builds the search request.
//!
//! A filter targets one category (a facet such as `schema`, `tag` or
//! `owner`) and carries either free text, a set of toggleable options, or
//! nothing at all.

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("filter category id must not be empty")]
    EmptyCategory,
    #[error("category '{0}' is filtered more than once")]
    DuplicateCategory(String),
    #[error("invalid filter json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Option id -> selected.
///
/// Deserializing rejects an object that repeats an option id.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct FilterOptions(BTreeMap<String, bool>);

impl FilterOptions {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn set(&mut self, id: impl Into<String>, selected: bool) {
        self.0.insert(id.into(), selected);
    }

    pub fn select(&mut self, id: impl Into<String>) {
        self.set(id, true);
    }

    pub fn deselect(&mut self, id: impl Into<String>) {
        self.set(id, false);
    }

    /// Flips the option and returns its new state. Unknown options become selected.
    pub fn toggle(&mut self, id: impl Into<String>) -> bool {
        let state = self.0.entry(id.into()).or_insert(false);
        *state = !*state;
        *state
    }

    pub fn get(&self, id: &str) -> Option<bool> {
        self.0.get(id).copied()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.get(id).unwrap_or(false)
    }

    /// Ids of the options currently switched on.
    pub fn selected(&self) -> impl Iterator<Item = &str> {
        self.0
            .iter()
            .filter(|(_, selected)| **selected)
            .map(|(id, _)| id.as_str())
    }

    pub fn any_selected(&self) -> bool {
        self.0.values().any(|selected| *selected)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, bool> {
        self.0.iter()
    }
}

impl<'de> Deserialize<'de> for FilterOptions {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct OptionsVisitor;

        impl<'de> Visitor<'de> for OptionsVisitor {
            type Value = FilterOptions;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an object mapping option ids to booleans")
            }

            fn visit_map<M>(self, mut map: M) -> Result<Self::Value, M::Error>
            where
                M: MapAccess<'de>,
            {
                let mut options = BTreeMap::new();
                while let Some((id, selected)) = map.next_entry::<String, bool>()? {
                    if options.contains_key(&id) {
                        return Err(de::Error::custom(format!("duplicate option id '{id}'")));
                    }
                    options.insert(id, selected);
                }
                Ok(FilterOptions(options))
            }
        }

        deserializer.deserialize_map(OptionsVisitor)
    }
}

impl<K: Into<String>> FromIterator<(K, bool)> for FilterOptions {
    fn from_iter<I: IntoIterator<Item = (K, bool)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl<'a> IntoIterator for &'a FilterOptions {
    type Item = (&'a String, &'a bool);
    type IntoIter = btree_map::Iter<'a, String, bool>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Payload of a filter.
///
/// On the wire this is a bare string, an object of booleans, or `null`/missing.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(untagged)]
pub enum FilterValue {
    Text(String),
    Options(FilterOptions),
    #[default]
    Absent,
}

impl FilterValue {
    pub fn is_text(&self) -> bool {
        matches!(self, FilterValue::Text(_))
    }

    pub fn is_options(&self) -> bool {
        matches!(self, FilterValue::Options(_))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, FilterValue::Absent)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FilterValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_options(&self) -> Option<&FilterOptions> {
        match self {
            FilterValue::Options(options) => Some(options),
            _ => None,
        }
    }

    /// Whether this value narrows the search at all. Blank text, an option
    /// set with nothing selected and an absent value all leave it untouched.
    pub fn is_applied(&self) -> bool {
        match self {
            FilterValue::Text(text) => !text.trim().is_empty(),
            FilterValue::Options(options) => options.any_selected(),
            FilterValue::Absent => false,
        }
    }
}

impl From<String> for FilterValue {
    fn from(text: String) -> Self {
        FilterValue::Text(text)
    }
}

impl From<&str> for FilterValue {
    fn from(text: &str) -> Self {
        FilterValue::Text(text.to_string())
    }
}

impl From<FilterOptions> for FilterValue {
    fn from(options: FilterOptions) -> Self {
        FilterValue::Options(options)
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FilterValue::Absent, Into::into)
    }
}

/// One filter applied to a search query.
///
/// Deserializing validates, so a blank `categoryId` never gets through.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", try_from = "RawFilterInput")]
pub struct SearchFilterInput {
    pub category_id: String,
    #[serde(default, skip_serializing_if = "FilterValue::is_absent")]
    pub value: FilterValue,
}

/// Wire shape of [`SearchFilterInput`] before validation.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFilterInput {
    category_id: String,
    #[serde(default)]
    value: FilterValue,
}

impl TryFrom<RawFilterInput> for SearchFilterInput {
    type Error = FilterError;

    fn try_from(raw: RawFilterInput) -> Result<Self, Self::Error> {
        let input = SearchFilterInput {
            category_id: raw.category_id,
            value: raw.value,
        };
        input.validate()?;
        Ok(input)
    }
}

impl SearchFilterInput {
    pub fn new(category_id: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self {
            category_id: category_id.into(),
            value: value.into(),
        }
    }

    pub fn text(category_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(category_id, FilterValue::Text(text.into()))
    }

    pub fn options(category_id: impl Into<String>, options: FilterOptions) -> Self {
        Self::new(category_id, FilterValue::Options(options))
    }

    pub fn absent(category_id: impl Into<String>) -> Self {
        Self::new(category_id, FilterValue::Absent)
    }

    pub fn category_id(&self) -> &str {
        &self.category_id
    }

    pub fn value(&self) -> &FilterValue {
        &self.value
    }

    pub fn into_parts(self) -> (String, FilterValue) {
        (self.category_id, self.value)
    }

    pub fn validate(&self) -> Result<(), FilterError> {
        if self.category_id.trim().is_empty() {
            return Err(FilterError::EmptyCategory);
        }
        Ok(())
    }

    pub fn is_applied(&self) -> bool {
        self.value.is_applied()
    }

    /// Parses and validates a single filter document.
    pub fn from_json(json: &str) -> Result<Self, FilterError> {
        let raw: RawFilterInput = serde_json::from_str(json)?;
        Self::try_from(raw)
    }

    pub fn to_json(&self) -> Result<String, FilterError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// The filters of one search, at most one per category.
///
/// Serialized as an array of [`SearchFilterInput`].
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(
    try_from = "Vec<SearchFilterInput>",
    into = "Vec<SearchFilterInput>"
)]
pub struct FilterSet {
    filters: BTreeMap<String, FilterValue>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the input and stores it, returning the value it replaced.
    pub fn apply(&mut self, input: SearchFilterInput) -> Result<Option<FilterValue>, FilterError> {
        input.validate()?;
        let (category_id, value) = input.into_parts();
        log::debug!("applying filter on category {category_id}");
        Ok(self.filters.insert(category_id, value))
    }

    pub fn remove(&mut self, category_id: &str) -> Option<FilterValue> {
        self.filters.remove(category_id)
    }

    pub fn get(&self, category_id: &str) -> Option<&FilterValue> {
        self.filters.get(category_id)
    }

    pub fn clear(&mut self) {
        self.filters.clear();
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Filters that actually narrow the search.
    pub fn active(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.filters
            .iter()
            .filter(|(_, value)| value.is_applied())
            .map(|(category_id, value)| (category_id.as_str(), value))
    }

    pub fn into_inputs(self) -> Vec<SearchFilterInput> {
        self.filters
            .into_iter()
            .map(|(category_id, value)| SearchFilterInput { category_id, value })
            .collect()
    }
}

impl TryFrom<Vec<SearchFilterInput>> for FilterSet {
    type Error = FilterError;

    fn try_from(inputs: Vec<SearchFilterInput>) -> Result<Self, Self::Error> {
        let mut set = FilterSet::new();
        for input in inputs {
            if set.filters.contains_key(&input.category_id) {
                return Err(FilterError::DuplicateCategory(input.category_id));
            }
            set.apply(input)?;
        }
        Ok(set)
    }
}

impl From<FilterSet> for Vec<SearchFilterInput> {
    fn from(set: FilterSet) -> Self {
        set.into_inputs()
    }
}
