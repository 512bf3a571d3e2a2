//! Declarative alias resolution for loosely-typed raw rows.
//!
//! Every logical field (latitude, year, label, ...) is described by a
//! [`FieldAliases`] value: an ordered list of candidate field names tried in
//! priority order. The first candidate that resolves to a non-blank value
//! wins; later candidates are not consulted even if the winner fails to
//! parse.

use crate::source::row_view::{RawRow, RawValue};

/// One candidate field name and how it is matched against a row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldCandidate {
    /// Match the field name exactly, then ASCII-case-insensitively.
    Exact(&'static str),
    /// Like `Exact`, then also match the last dotted segment of nested keys
    /// (`location.lat` matches `Leaf("lat")`).
    Leaf(&'static str),
    /// Match any field whose name contains the needle, ignoring ASCII case.
    Contains(&'static str),
}

impl FieldCandidate {
    /// Return the first non-blank field in `row` matched by this candidate.
    pub fn find<'a>(&self, row: &'a RawRow) -> Option<(&'a str, &'a RawValue)> {
        match *self {
            FieldCandidate::Exact(name) => find_named(row, name),
            FieldCandidate::Leaf(name) => find_named(row, name).or_else(|| {
                row.fields()
                    .filter(|(_, value)| !value.is_blank())
                    .find(|(field, _)| {
                        field
                            .rsplit(crate::constants::decode::NESTED_SEPARATOR)
                            .next()
                            .is_some_and(|leaf| leaf.eq_ignore_ascii_case(name))
                    })
            }),
            FieldCandidate::Contains(needle) => {
                let needle = needle.to_ascii_lowercase();
                row.fields()
                    .filter(|(_, value)| !value.is_blank())
                    .find(|(field, _)| field.to_ascii_lowercase().contains(&needle))
            }
        }
    }
}

fn find_named<'a>(row: &'a RawRow, name: &str) -> Option<(&'a str, &'a RawValue)> {
    row.fields()
        .filter(|(_, value)| !value.is_blank())
        .find(|(field, _)| *field == name)
        .or_else(|| {
            row.fields()
                .filter(|(_, value)| !value.is_blank())
                .find(|(field, _)| field.eq_ignore_ascii_case(name))
        })
}

/// Ordered candidate list for one logical field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldAliases {
    name: &'static str,
    candidates: &'static [FieldCandidate],
}

impl FieldAliases {
    /// Create an alias list with a canonical static name.
    pub const fn new(name: &'static str, candidates: &'static [FieldCandidate]) -> Self {
        Self { name, candidates }
    }

    /// Return the canonical logical field name.
    pub const fn as_str(&self) -> &'static str {
        self.name
    }

    /// Return the candidates in priority order.
    pub const fn candidates(&self) -> &'static [FieldCandidate] {
        self.candidates
    }

    /// Resolve the winning `(field name, value)` pair, if any candidate matches.
    pub fn resolve<'a>(&self, row: &'a RawRow) -> Option<(&'a str, &'a RawValue)> {
        self.candidates
            .iter()
            .find_map(|candidate| candidate.find(row))
    }

    /// Resolve the winning value as a finite number.
    ///
    /// A winning value that does not parse is treated as absent, never zero.
    pub fn resolve_f64(&self, row: &RawRow) -> Option<f64> {
        self.resolve(row).and_then(|(_, value)| value.as_f64())
    }

    /// Resolve the winning value as trimmed text.
    pub fn resolve_text(&self, row: &RawRow) -> Option<String> {
        self.resolve(row)
            .and_then(|(_, value)| value.as_text())
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
    }
}
