use thiserror::Error;

/// Failure to turn game content into a usable [`Catalog`](crate::Catalog).
///
/// Every variant is fatal for startup. Runtime operations never return these;
/// once a catalog has loaded, all names it mentions are known to resolve.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed catalog document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{kind} `{name}` referenced by {referenced_by} is not defined")]
    Unresolved {
        kind: &'static str,
        name: String,
        referenced_by: String,
    },

    #[error("{kind} `{name}` is defined more than once")]
    Duplicate { kind: &'static str, name: String },
}

impl CatalogError {
    pub(crate) fn unresolved(
        kind: &'static str,
        name: impl Into<String>,
        referenced_by: impl Into<String>,
    ) -> Self {
        CatalogError::Unresolved {
            kind,
            name: name.into(),
            referenced_by: referenced_by.into(),
        }
    }
}
