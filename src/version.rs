use crate::{error::VersionError, part::VersionPart};
use core::fmt::{self, Display};
use indexmap::IndexMap;

/// A parsed or derived version: an ordered mapping from component names (like `major`) to
/// [`VersionPart`]s.
///
/// Versions are created by [`VersionConfig::parse`](crate::VersionConfig::parse) or
/// [`ConfiguredFile::find`](crate::ConfiguredFile::find), whose component names are the named
/// capture groups of the parse pattern, and by [`Version::bump`]. They are never mutated.
///
/// # Example
///
/// ```
/// use verbump::prelude::*;
///
/// let config = VersionConfig::builder().build().unwrap();
/// let version = config.parse("1.2.3", &Collector::new()).unwrap();
/// let order: Vec<&str> = config.order().collect();
/// let next = version.bump("minor", &order).unwrap();
/// assert_eq!(Some("3"), next.get("minor").map(|part| part.value()));
/// assert_eq!(Some("0"), next.get("patch").map(|part| part.value()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    parts: IndexMap<String, VersionPart>,
    original: Option<String>,
}

impl Version {
    /// Returns a version made of `parts`. `original` is the exact text the parts were parsed
    /// from, if any.
    pub fn new(
        parts: impl IntoIterator<Item = (String, VersionPart)>,
        original: Option<String>,
    ) -> Self {
        Self {
            parts: parts.into_iter().collect(),
            original,
        }
    }

    /// The exact text this version was parsed from. `None` for derived versions.
    pub fn original(&self) -> Option<&str> {
        self.original.as_deref()
    }

    /// Returns this version as a derived one, with no original text.
    pub(crate) fn without_original(self) -> Self {
        Self {
            original: None,
            ..self
        }
    }

    /// Returns the part named `name`.
    pub fn get(&self, name: &str) -> Option<&VersionPart> {
        self.parts.get(name)
    }

    /// Returns true if this version has a part named `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.parts.contains_key(name)
    }

    /// Iterates over the parts in the order they were captured.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &VersionPart)> {
        self.parts.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The number of parts.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Returns true if this version has no parts.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Returns a new version where `part_name` is bumped, every part after it in `order` is reset
    /// to its null value, and every other part is copied unchanged.
    ///
    /// `order` is the canonical component order, as returned by
    /// [`VersionConfig::order`](crate::VersionConfig::order). Parts that are not named in `order`
    /// are never reset.
    ///
    /// # Errors
    ///
    /// - Returns [`VersionError::UnknownComponent`] if `part_name` is not a part of this version,
    ///   or is not in `order`.
    /// - Returns [`VersionError::Part`] if the part cannot be bumped, e.g. a value list that is
    ///   already at its last value.
    pub fn bump<S: AsRef<str>>(&self, part_name: &str, order: &[S]) -> Result<Self, VersionError> {
        let unknown = || VersionError::UnknownComponent {
            name: part_name.to_string(),
        };
        if !self.contains(part_name) {
            return Err(unknown());
        }

        let mut bumped = false;
        let mut new_parts = self.parts.clone();

        for label in order.iter().map(AsRef::as_ref) {
            let Some(part) = self.parts.get(label) else {
                continue;
            };
            if label == part_name {
                if !bumped {
                    new_parts.insert(label.to_string(), part.bump()?);
                    bumped = true;
                }
            } else if bumped {
                new_parts.insert(label.to_string(), part.null());
            }
        }

        if !bumped {
            return Err(unknown());
        }

        Ok(Self::new(new_parts, None))
    }

    /// Compares this version to `other`, component by component, for every name in `order` that
    /// this version has. A component `other` lacks counts as different.
    pub fn compare<S: AsRef<str>>(&self, order: &[S], other: &Version) -> IndexMap<String, bool> {
        order
            .iter()
            .map(AsRef::as_ref)
            .filter_map(|label| {
                let part = self.parts.get(label)?;
                let same = other
                    .parts
                    .get(label)
                    .is_some_and(|other_part| other_part.value() == part.value());
                Some((label.to_string(), same))
            })
            .collect()
    }
}

impl Display for Version {
    /// Displays the parts as sorted `name=value` pairs, e.g. `major=1, minor=2, patch=3`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pairs: Vec<_> = self.iter().collect();
        pairs.sort_by_key(|(name, _)| *name);
        for (idx, (name, part)) in pairs.into_iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", name, part.value())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::PartError,
        part::{PartConfig, ValuesConfig},
    };
    use itertools::Itertools;
    use rstest::*;
    use std::sync::Arc;

    fn version(pairs: &[(&str, &str)]) -> Version {
        let config = Arc::new(PartConfig::default());
        Version::new(
            pairs.iter().map(|(name, value)| {
                (
                    name.to_string(),
                    VersionPart::new(Some(value), Arc::clone(&config)),
                )
            }),
            None,
        )
    }

    fn values(version: &Version) -> Vec<(&str, &str)> {
        version.iter().map(|(k, v)| (k, v.value())).collect()
    }

    const ORDER: [&str; 3] = ["major", "minor", "patch"];

    #[rstest]
    #[case("major", [("major", "2"), ("minor", "0"), ("patch", "0")])]
    #[case("minor", [("major", "1"), ("minor", "3"), ("patch", "0")])]
    #[case("patch", [("major", "1"), ("minor", "2"), ("patch", "4")])]
    fn test_bump(#[case] part: &str, #[case] expected: [(&str, &str); 3]) {
        let cur = version(&[("major", "1"), ("minor", "2"), ("patch", "3")]);
        let next = cur.bump(part, &ORDER).unwrap();
        assert_eq!(expected.to_vec(), values(&next));
        assert_eq!(None, next.original());
    }

    /// For every ordering and every part in it, parts before the bumped one are unchanged, the
    /// bumped one is incremented, and later ones are nulled.
    #[test]
    fn test_bump_cascade_all_orderings() {
        let cur = version(&[("a", "1"), ("b", "2"), ("c", "3"), ("d", "4")]);

        for order in ["a", "b", "c", "d"].into_iter().permutations(4) {
            for (idx, part) in order.iter().enumerate() {
                let next = cur.bump(part, &order).unwrap();
                assert_eq!(cur.len(), next.len());
                for before in &order[..idx] {
                    assert_eq!(cur.get(before), next.get(before));
                }
                let expected = (cur.get(part).unwrap().value().parse::<u32>().unwrap() + 1)
                    .to_string();
                assert_eq!(expected, next.get(part).unwrap().value());
                for after in &order[idx + 1..] {
                    assert_eq!("0", next.get(after).unwrap().value());
                }
            }
        }
    }

    #[test]
    fn test_bump_keeps_parts_outside_order() {
        let cur = version(&[("major", "1"), ("build", "77"), ("minor", "2")]);
        let next = cur.bump("major", &["major", "minor"]).unwrap();
        assert_eq!(
            vec![("major", "2"), ("build", "77"), ("minor", "0")],
            values(&next)
        );
    }

    #[test]
    fn test_bump_skips_order_names_not_in_version() {
        let cur = version(&[("major", "1"), ("patch", "5")]);
        let next = cur.bump("major", &ORDER).unwrap();
        assert_eq!(vec![("major", "2"), ("patch", "0")], values(&next));
    }

    #[rstest]
    #[case("build", &ORDER)]
    #[case("patch", &["major", "minor"])]
    fn test_bump_unknown_component(#[case] part: &str, #[case] order: &[&str]) {
        let cur = version(&[("major", "1"), ("minor", "2"), ("patch", "3")]);
        assert_eq!(
            Err(VersionError::UnknownComponent {
                name: part.to_string()
            }),
            cur.bump(part, order)
        );
    }

    #[test]
    fn test_bump_values_part() {
        let release = Arc::new(PartConfig::Values(
            ValuesConfig::new(
                "release",
                vec!["dev".to_string(), "final".to_string()],
                None,
                None,
            )
            .unwrap(),
        ));
        let numeric = Arc::new(PartConfig::default());
        let cur = Version::new(
            [
                (
                    "patch".to_string(),
                    VersionPart::new(Some("3"), Arc::clone(&numeric)),
                ),
                (
                    "release".to_string(),
                    VersionPart::new(Some("final"), release),
                ),
            ],
            Some("3-final".to_string()),
        );

        let next = cur.bump("patch", &["patch", "release"]).unwrap();
        assert_eq!(vec![("patch", "4"), ("release", "dev")], values(&next));

        let res = cur.bump("release", &["patch", "release"]);
        assert!(matches!(
            res,
            Err(VersionError::Part(PartError::AlreadyLast { .. }))
        ));
    }

    #[test]
    fn test_compare() {
        let cur = version(&[("major", "1"), ("minor", "2"), ("patch", "3")]);
        let other = version(&[("major", "1"), ("minor", "5")]);
        let compared = cur.compare(&ORDER, &other);
        assert_eq!(
            vec![("major", true), ("minor", false), ("patch", false)],
            compared
                .iter()
                .map(|(k, v)| (k.as_str(), *v))
                .collect::<Vec<_>>()
        );
        assert!(cur.compare(&ORDER, &cur).values().all(|same| *same));
    }

    #[test]
    fn test_display() {
        let cur = version(&[("minor", "2"), ("major", "1")]);
        assert_eq!("major=1, minor=2", cur.to_string());
    }
}
