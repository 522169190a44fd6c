use std::any::Any;
use std::path::Path;

use rustc_hash::FxHashMap;
use slideset_table::{CreationInfo, Table, TableId, TableTree};

use crate::chooser::Chooser;
use crate::error::BindingError;
use crate::param::RoutineSpec;
use crate::processed::Processed;
use crate::registry::AdapterRegistry;
use crate::resolver::{BindingResolver, ResolverConfig};

pub type RoutineError = Box<dyn std::error::Error + Send + Sync>;

/// A command that runs once per row of its input table.
pub trait Routine {
    fn spec(&self) -> &RoutineSpec;

    fn run(&self, inputs: RowInputs) -> Result<RowOutputs, RoutineError>;
}

/// Processed inputs for one row, keyed by parameter name.
#[derive(Debug)]
pub struct RowInputs {
    routine: String,
    row: usize,
    values: FxHashMap<String, Processed>,
}

impl RowInputs {
    pub(crate) fn new(routine: String, row: usize) -> Self {
        Self {
            routine,
            row,
            values: FxHashMap::default(),
        }
    }

    pub(crate) fn insert(&mut self, param: String, value: Processed) {
        self.values.insert(param, value);
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn contains(&self, param: &str) -> bool {
        self.values.contains_key(param)
    }

    pub fn get<T: Any>(&self, param: &str) -> Option<&T> {
        self.values.get(param).and_then(Processed::downcast_ref)
    }

    /// Take a bound input. Fails when the parameter was not bound.
    pub fn take<T: Any>(&mut self, param: &str) -> Result<T, BindingError> {
        self.take_opt(param)?
            .ok_or_else(|| BindingError::UnknownParameter {
                routine: self.routine.clone(),
                param: param.to_string(),
            })
    }

    /// Take an input that may have been left unbound.
    pub fn take_opt<T: Any>(&mut self, param: &str) -> Result<Option<T>, BindingError> {
        self.values.remove(param).map(Processed::downcast).transpose()
    }
}

/// Processed outputs for one row, keyed by parameter name.
#[derive(Debug, Default)]
pub struct RowOutputs {
    values: FxHashMap<String, Processed>,
}

impl RowOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<T: Any + Send>(mut self, param: impl Into<String>, value: T) -> Self {
        self.set(param, value);
        self
    }

    pub fn set<T: Any + Send>(&mut self, param: impl Into<String>, value: T) -> &mut Self {
        self.values.insert(param.into(), Processed::new(value));
        self
    }

    pub fn take(&mut self, param: &str) -> Option<Processed> {
        self.values.remove(param)
    }
}

/// Run `routine` against the table `parent` and attach the results as a new
/// child table.
///
/// All parameters are bound before any row runs. The result table has one
/// column per bound output and as many rows as the parent, and inherits the
/// parent's working directory. On error the tree is left unchanged, although
/// files already written by file-link writers stay on disk.
pub fn execute(
    tree: &mut TableTree,
    parent: TableId,
    routine: &dyn Routine,
    registry: &AdapterRegistry,
    chooser: &mut dyn Chooser,
) -> Result<TableId, BindingError> {
    execute_with(tree, parent, routine, registry, chooser, ResolverConfig::default())
}

pub fn execute_with(
    tree: &mut TableTree,
    parent: TableId,
    routine: &dyn Routine,
    registry: &AdapterRegistry,
    chooser: &mut dyn Chooser,
    config: ResolverConfig,
) -> Result<TableId, BindingError> {
    let spec = routine.spec();
    let source = tree.get(parent)?;
    let bindings = BindingResolver::new(registry)
        .with_config(config)
        .resolve(source, spec, chooser)?;

    let rows = source.row_count();
    let mut result = Table::new(spec.name.clone());
    result.set_working_dir(source.working_dir().map(Path::to_path_buf));

    let mut writers = Vec::with_capacity(bindings.outputs().len());
    for plan in bindings.outputs() {
        let column = result.add_column(plan.column_meta())?;
        writers.push((plan.param.name.as_str(), plan.param.required, plan.bind(column)));
    }
    if !writers.is_empty() {
        for _ in 0..rows {
            result.add_row()?;
        }
    }

    #[cfg(feature = "tracing")]
    tracing::info!(routine = %spec.name, table = %source.name(), rows, "running routine");

    for row in 0..rows {
        let inputs = bindings.read_row(row)?;
        let mut outputs = routine.run(inputs).map_err(|source| BindingError::Routine {
            routine: spec.name.clone(),
            row,
            source,
        })?;
        for (param, required, writer) in &writers {
            match outputs.take(param) {
                Some(value) => writer.write(&mut result, row, value)?,
                None if *required => {
                    return Err(BindingError::MissingOutput {
                        routine: spec.name.clone(),
                        param: param.to_string(),
                        row,
                    });
                }
                None => {}
            }
        }
    }

    result.set_creation(Some(CreationInfo::new(
        spec.name.clone(),
        bindings.selections().clone(),
    )));
    drop(writers);
    drop(bindings);
    Ok(tree.insert_child(parent, result)?)
}
