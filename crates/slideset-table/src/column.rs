use std::collections::BTreeMap;
use std::path::PathBuf;

use slideset_common::{ElementKind, Subtype};

/// Settings used when generating default file links for a column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkDefaults {
    /// Directory new links are placed in. Relative directories resolve
    /// against the table's working directory.
    pub base_dir: Option<PathBuf>,
    /// File name prefix; the column name is used when unset.
    pub prefix: Option<String>,
    /// Extension without the leading dot.
    pub extension: Option<String>,
    /// Next counter value to try. Only ever grows.
    pub counter: u32,
}

impl LinkDefaults {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
            ..Self::default()
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        let ext = extension.into();
        let ext = ext.trim_start_matches('.');
        self.extension = (!ext.is_empty()).then(|| ext.to_string());
        self
    }

    pub fn with_counter(mut self, counter: u32) -> Self {
        self.counter = counter;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.base_dir.is_some()
    }
}

/// Schema slot for one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    pub name: String,
    pub kind: ElementKind,
    pub subtype: Subtype,
    pub link: LinkDefaults,
    /// Adapter-specific metadata that has no typed field.
    pub extra: BTreeMap<String, String>,
}

impl ColumnMeta {
    /// Column of `kind` with that kind's default subtype.
    pub fn new(name: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            name: name.into(),
            kind,
            subtype: kind.default_subtype(),
            link: LinkDefaults::default(),
            extra: BTreeMap::new(),
        }
    }

    pub fn with_subtype(mut self, subtype: impl Into<Subtype>) -> Self {
        self.subtype = subtype.into();
        self
    }

    pub fn with_link(mut self, link: LinkDefaults) -> Self {
        self.link = link;
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn link_prefix(&self) -> &str {
        self.link.prefix.as_deref().unwrap_or(&self.name)
    }
}
