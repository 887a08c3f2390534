//! Model identifiers, documents and dependency resolution.

pub mod dtmi;
pub mod query;
pub mod resolver;

pub use dtmi::{dtmi_to_path, dtmi_to_qualified_path, is_valid_dtmi};
pub use query::{ModelMetadata, ModelQuery};
pub use resolver::{DependencyResolution, ModelResolver, ResolvedModels};
