//! Binding routine parameters to SlideSet tables.
//!
//! Readers turn cells into processed values and writers do the reverse. The
//! [`BindingResolver`] pairs each parameter of a [`RoutineSpec`] with every
//! compatible column (or literal constant) and registered adapter, a
//! [`Chooser`] picks one, and [`execute`] runs the routine row by row into a
//! new child table.

pub mod adapter;
pub mod bound;
pub mod builtins;
pub mod chooser;
pub mod error;
pub mod param;
pub mod processed;
pub mod registry;
pub mod resolver;
pub mod runtime;

pub use adapter::{ElementReader, ElementWriter, FnReader, FnWriter, ReaderInfo, WriterInfo};
pub use bound::{ColumnBoundReader, ColumnBoundWriter, ConstantReader, InputBinding};
pub use chooser::{Chooser, FirstCandidate, Preset, PresetChooser, Selection};
pub use error::BindingError;
pub use param::{Direction, ParamSpec, RoutineSpec};
pub use processed::{Processed, ProcessedType};
pub use registry::{AdapterRegistry, global_snapshot, register_reader, register_writer};
pub use resolver::{
    BindingResolver, Candidate, LinkTemplate, OutputPlan, ParamCandidates, ResolvedBindings,
    ResolverConfig,
};
pub use runtime::{Routine, RoutineError, RowInputs, RowOutputs, execute, execute_with};
