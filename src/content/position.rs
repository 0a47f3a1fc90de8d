//! Positional parsing of fixed-length data (the leader and control fields such as 008).
//!
//! Each [`PositionDefinition`] names a character range; the parser maps those ranges
//! onto the value and yields the coded value found at each of them.

use super::{Components, ContentParser, Violation};
use crate::schema::PositionDefinition;

/// Maps declared positions onto a fixed-length value.
#[derive(Debug, Clone, Copy)]
pub struct PositionParser<'a> {
    positions: &'a [PositionDefinition],
}

impl<'a> PositionParser<'a> {
    /// Create a parser over the given position definitions.
    #[must_use]
    pub fn new(positions: &'a [PositionDefinition]) -> Self {
        PositionParser { positions }
    }

    /// Extract the slice of `value` covered by each position.
    ///
    /// A position that runs past the end of `value` yields `None`.
    pub fn extract<'v>(
        &self,
        value: &'v str,
    ) -> impl Iterator<Item = (&'a PositionDefinition, Option<&'v str>)> + 'v
    where
        'a: 'v,
    {
        self.positions
            .iter()
            .map(move |position| (position, char_range(value, position.start, position.end)))
    }
}

/// The characters `start..end` of `value`, or `None` when it is too short.
pub(crate) fn char_range(value: &str, start: usize, end: usize) -> Option<&str> {
    let mut boundaries = value
        .char_indices()
        .map(|(index, _)| index)
        .chain(std::iter::once(value.len()));
    let from = boundaries.nth(start)?;
    let to = boundaries.nth(end.checked_sub(start + 1)?)?;
    value.get(from..to)
}

impl ContentParser for PositionParser<'_> {
    fn parse(&self, value: &str) -> Result<Components, Violation> {
        let mut components = Components::new();
        for (position, slice) in self.extract(value) {
            let slice = slice.ok_or(Violation::BadLength(value.chars().count()))?;
            components.insert(position.mq_tag.clone(), slice.to_string());
        }
        Ok(components)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions() -> Vec<PositionDefinition> {
        vec![
            PositionDefinition::new(0, 6, "Date entered on file").with_pattern(r"^\d{6}$").unwrap(),
            PositionDefinition::new(6, 7, "Type of date").with_codes(&[("s", "Single known date")]),
            PositionDefinition::new(7, 11, "Date 1"),
        ]
    }

    #[test]
    fn test_extract() {
        let positions = positions();
        let parser = PositionParser::new(&positions);
        let extracted: Vec<Option<&str>> =
            parser.extract("850101s1985").map(|(_, value)| value).collect();
        assert_eq!(extracted, vec![Some("850101"), Some("s"), Some("1985")]);

        let short: Vec<Option<&str>> = parser.extract("850101s").map(|(_, value)| value).collect();
        assert_eq!(short, vec![Some("850101"), Some("s"), None]);
    }

    #[test]
    fn test_extract_counts_characters() {
        let positions = positions();
        let parser = PositionParser::new(&positions);
        let extracted: Vec<Option<&str>> =
            parser.extract("850101sä985").map(|(_, value)| value).collect();
        assert_eq!(extracted, vec![Some("850101"), Some("s"), Some("ä985")]);
        assert_eq!(char_range("ä", 0, 1), Some("ä"));
        assert_eq!(char_range("ä", 0, 2), None);
    }

    #[test]
    fn test_parse_components() {
        let positions = positions();
        let components = PositionParser::new(&positions).parse("850101s1985").unwrap();
        assert_eq!(components["dateEnteredOnFile"], "850101");
        assert_eq!(components["typeOfDate"], "s");
        assert_eq!(components["date1"], "1985");

        assert_eq!(
            PositionParser::new(&positions).parse("8501"),
            Err(Violation::BadLength(4))
        );
    }
}
