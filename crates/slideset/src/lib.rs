//! Meta crate that re-exports the SlideSet layers. Depend on this crate and
//! pick layers with feature flags; the member crates stay reachable for
//! deeper integration.

pub use slideset_common as common;
pub use slideset_common::{Cell, ElementError, ElementKind, PathContext, Subtype, SubtypeSet, Underlying};

#[cfg(feature = "table")]
pub use slideset_table as table;

#[cfg(feature = "table")]
pub use slideset_table::{
    ColumnMeta, CreationInfo, LinkDefaults, LinkError, LinkPolicy, Table, TableError, TableId,
    TableTree,
};

#[cfg(feature = "binding")]
pub use slideset_binding as binding;

#[cfg(feature = "binding")]
pub use slideset_binding::{
    AdapterRegistry, BindingError, BindingResolver, Candidate, Chooser, ElementReader,
    ElementWriter, FirstCandidate, ParamSpec, PresetChooser, Processed, ProcessedType, Routine,
    RoutineSpec, RowInputs, RowOutputs, execute,
};

#[cfg(feature = "io")]
pub use slideset_io as io;

#[cfg(feature = "io")]
pub use slideset_io::IoError;
