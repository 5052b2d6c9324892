use crate::plugin::document::ConfigDocument;
use crate::plugin::error::ConfigError;
use crate::syntax::{ElementKind, MemberValue, ParseError, Span};

/// Field holding globally installed plugins.
pub const PRIMARY_FIELD: &str = "plugins";
/// Field holding local (forked) plugins.
pub const LOCAL_FIELD: &str = "localPlugins";

/// Which plugin list an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListSelector {
    #[default]
    Global,
    Local,
}

impl ListSelector {
    pub const ALL: [ListSelector; 2] = [ListSelector::Global, ListSelector::Local];

    pub fn field_name(self) -> &'static str {
        match self {
            ListSelector::Global => PRIMARY_FIELD,
            ListSelector::Local => LOCAL_FIELD,
        }
    }

    pub fn other(self) -> Self {
        match self {
            ListSelector::Global => ListSelector::Local,
            ListSelector::Local => ListSelector::Global,
        }
    }
}

/// One plugin identifier as written in the config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginEntry {
    pub id: String,
    pub span: Span,
    pub quote: char,
    pub comma: Option<Span>,
}

/// A plugin list in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginList {
    pub field: &'static str,
    /// Between `[` and `]`, exclusive.
    pub inner: Span,
    pub entries: Vec<PluginEntry>,
}

impl PluginList {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn to_string_list(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.id.clone()).collect()
    }
}

/// Reads the list under `selector`'s field.
pub fn get_list(
    document: &ConfigDocument,
    selector: ListSelector,
) -> Result<PluginList, ConfigError> {
    let field = selector.field_name();
    let member = document
        .object()
        .member(field)
        .ok_or(ConfigError::FieldNotFound { field })?;

    let MemberValue::Array(array) = &member.value else {
        return Err(ParseError::field(field, "must be an array literal of plugin names").into());
    };

    let entries = array
        .elements
        .iter()
        .map(|element| match &element.kind {
            ElementKind::Str { value, quote } => Ok(PluginEntry {
                id: value.clone(),
                span: element.span,
                quote: *quote,
                comma: element.comma,
            }),
            ElementKind::Other => Err(ParseError::field(
                field,
                format!(
                    "holds `{}`, which is not a string literal",
                    document.text(element.span)
                ),
            )),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PluginList {
        field,
        inner: array.inner(),
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(source: &str) -> ConfigDocument {
        ConfigDocument::parse(source).unwrap()
    }

    #[test]
    fn test_get_list_in_file_order() {
        let doc = document("module.exports = {plugins: ['z', 'a', \"m\"], localPlugins: []};");
        let list = get_list(&doc, ListSelector::Global).unwrap();
        assert_eq!(list.field, "plugins");
        assert_eq!(list.to_string_list(), vec!["z", "a", "m"]);
        assert!(get_list(&doc, ListSelector::Local).unwrap().is_empty());
    }

    #[test]
    fn test_missing_field_is_field_not_found() {
        let doc = document("module.exports = {plugins: []};");
        let err = get_list(&doc, ListSelector::Local).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::FieldNotFound {
                field: "localPlugins"
            }
        ));
    }

    #[test]
    fn test_non_array_field_is_malformed() {
        let doc = document("module.exports = {plugins: 'hyperterm-a'};");
        let err = get_list(&doc, ListSelector::Global).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed(ParseError::Field { .. })));
    }

    #[test]
    fn test_non_string_entry_is_malformed() {
        let doc = document("module.exports = {plugins: ['a', require('b')]};");
        let err = get_list(&doc, ListSelector::Global).unwrap_err();
        assert!(err.to_string().contains("require('b')"));
    }

    #[test]
    fn test_comparison_is_exact() {
        let doc = document("module.exports = {plugins: ['Hyper-A', '🦁']};");
        let list = get_list(&doc, ListSelector::Global).unwrap();
        assert!(list.contains("Hyper-A"));
        assert!(!list.contains("hyper-a"));
        assert!(list.contains("🦁"));
        assert_eq!(list.position("🦁"), Some(1));
    }

    #[test]
    fn test_selector_fields() {
        assert_eq!(ListSelector::default(), ListSelector::Global);
        assert_eq!(ListSelector::Global.field_name(), PRIMARY_FIELD);
        assert_eq!(ListSelector::Local.field_name(), LOCAL_FIELD);
        assert_eq!(ListSelector::Local.other(), ListSelector::Global);
    }
}
