use crate::syntax::{ExportedObject, ParseError, Span, parse_exported_object};

/// A replacement of one byte range of the config text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub range: Span,
    pub text: String,
}

impl Edit {
    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self {
            range: Span::empty(at),
            text: text.into(),
        }
    }

    pub fn delete(range: Span) -> Self {
        Self {
            range,
            text: String::new(),
        }
    }

    pub fn replace(range: Span, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }
}

/// The parsed config file: its exact text plus the located export.
///
/// The text is the source of truth. Every edit produces a fresh document by
/// splicing the text and parsing it again, so a document can never hold a
/// layout that disagrees with its text.
#[derive(Debug, Clone)]
pub struct ConfigDocument {
    source: String,
    object: ExportedObject,
}

impl ConfigDocument {
    pub fn parse(source: impl Into<String>) -> Result<Self, ParseError> {
        let source = source.into();
        let object = parse_exported_object(&source)?;
        Ok(Self { source, object })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn object(&self) -> &ExportedObject {
        &self.object
    }

    pub fn text(&self, span: Span) -> &str {
        &self.source[span.start..span.end]
    }

    /// Applies `edit` and re-parses the result. `self` is left untouched, so a
    /// failed edit leaves nothing half-applied.
    pub fn apply(&self, edit: &Edit) -> Result<Self, ParseError> {
        let Edit { range, text } = edit;
        let mut source =
            String::with_capacity(self.source.len() - (range.end - range.start) + text.len());
        source.push_str(&self.source[..range.start]);
        source.push_str(text);
        source.push_str(&self.source[range.end..]);
        Self::parse(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_insert_and_delete() {
        let document = ConfigDocument::parse("module.exports = {plugins: []};").unwrap();
        let inserted = document.apply(&Edit::insert(28, "'a'")).unwrap();
        assert_eq!(inserted.source(), "module.exports = {plugins: ['a']};");

        let deleted = inserted.apply(&Edit::delete(Span::new(28, 31))).unwrap();
        assert_eq!(deleted.source(), document.source());
    }

    #[test]
    fn test_apply_that_breaks_syntax_fails_and_keeps_original() {
        let document = ConfigDocument::parse("module.exports = {plugins: []};").unwrap();
        let result = document.apply(&Edit::replace(Span::new(27, 29), "["));
        assert!(result.is_err());
        assert_eq!(document.source(), "module.exports = {plugins: []};");
    }
}
