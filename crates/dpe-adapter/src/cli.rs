//! Helpers behind the `dpe-merge` binary.

use std::path::Path;
use std::rc::Rc;

use serde_json::Value;
use thiserror::Error;

use crate::adapter::{DocumentAdapter, DocumentAdapterPtr};
use crate::error::AggregateError;
use crate::labeled::{LabeledRowAggregateAdapter, LabeledRowPolicy};
use crate::value_adapter::ValueAdapter;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("{path}: invalid JSON: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

/// Merges `documents` with [`LabeledRowPolicy`], first document first.
pub fn merge_documents(documents: Vec<Value>) -> Result<Value, AggregateError> {
    let aggregate = LabeledRowAggregateAdapter::new(LabeledRowPolicy);
    for document in documents {
        let source: DocumentAdapterPtr = Rc::new(ValueAdapter::new(document));
        aggregate.add_adapter(source)?;
    }
    Ok(aggregate.generate_contents())
}

/// Reads every file in `paths` and returns their merge as pretty JSON.
pub fn merge_files<P: AsRef<Path>>(paths: &[P]) -> Result<String, CliError> {
    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let document = serde_json::from_str(&text).map_err(|source| CliError::Json {
            path: path.display().to_string(),
            source,
        })?;
        documents.push(document);
    }
    let merged = merge_documents(documents)?;
    serde_json::to_string_pretty(&merged).map_err(|source| CliError::Json {
        path: "<output>".to_string(),
        source,
    })
}
