use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use slideset_common::{Cell, ElementKind};
use slideset_table::{ColumnMeta, LinkDefaults, Table};

use crate::adapter::{ElementReader, ElementWriter};
use crate::bound::{ColumnBoundReader, ColumnBoundWriter, ConstantReader, InputBinding};
use crate::chooser::{Chooser, Selection};
use crate::error::BindingError;
use crate::param::{Direction, ParamSpec, RoutineSpec};
use crate::registry::AdapterRegistry;
use crate::runtime::RowInputs;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Offer literal constants for inputs.
    pub offer_constants: bool,
    /// Also offer hidden readers as constants.
    pub include_hidden_constants: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            offer_constants: true,
            include_hidden_constants: false,
        }
    }
}

/// Where default links for a new file-link output column go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTemplate {
    pub base_dir: PathBuf,
    pub prefix: String,
    pub extension: Option<String>,
}

/// One way of satisfying a parameter.
#[derive(Clone)]
pub enum Candidate {
    Column {
        column: usize,
        column_name: String,
        reader: Arc<dyn ElementReader>,
    },
    Constant {
        reader: Arc<dyn ElementReader>,
    },
    NewColumn {
        writer: Arc<dyn ElementWriter>,
        link: Option<LinkTemplate>,
    },
}

impl Candidate {
    pub fn describe(&self) -> String {
        match self {
            Candidate::Column {
                column_name,
                reader,
                ..
            } => format!("column \"{column_name}\" via {}", reader.info().name),
            Candidate::Constant { reader } => {
                let info = reader.info();
                format!("constant {} via {}", info.kind, info.name)
            }
            Candidate::NewColumn { writer, link } => {
                let info = writer.info();
                match link {
                    Some(link) => format!(
                        "new {} column ({}) via {}, files under {}",
                        info.kind,
                        info.subtype,
                        info.name,
                        link.base_dir.display()
                    ),
                    None => format!("new {} column via {}", info.kind, info.name),
                }
            }
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            Candidate::Column { reader, .. } | Candidate::Constant { reader } => reader.info().kind,
            Candidate::NewColumn { writer, .. } => writer.info().kind,
        }
    }

    pub fn is_file_link(&self) -> bool {
        self.kind() == ElementKind::FileLink
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Candidate::Constant { .. })
    }

    pub fn adapter_name(&self) -> &str {
        match self {
            Candidate::Column { reader, .. } | Candidate::Constant { reader } => &reader.info().name,
            Candidate::NewColumn { writer, .. } => &writer.info().name,
        }
    }

    pub fn link_template(&self) -> Option<&LinkTemplate> {
        match self {
            Candidate::NewColumn { link, .. } => link.as_ref(),
            _ => None,
        }
    }
}

impl fmt::Debug for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Candidate({})", self.describe())
    }
}

/// Candidates for one parameter, in registry order.
#[derive(Debug, Clone)]
pub struct ParamCandidates {
    pub param: ParamSpec,
    pub candidates: Vec<Candidate>,
}

/// How an output column is created and filled.
#[derive(Clone)]
pub struct OutputPlan {
    pub param: ParamSpec,
    pub writer: Arc<dyn ElementWriter>,
    pub link: Option<LinkTemplate>,
}

impl OutputPlan {
    /// Metadata of the column holding this output.
    pub fn column_meta(&self) -> ColumnMeta {
        let info = self.writer.info();
        let mut meta = ColumnMeta::new(self.param.name.clone(), info.kind)
            .with_subtype(info.subtype.clone());
        if let Some(link) = &self.link {
            let mut defaults = LinkDefaults::new(link.base_dir.clone()).with_prefix(link.prefix.clone());
            if let Some(ext) = &link.extension {
                defaults = defaults.with_extension(ext.clone());
            }
            meta = meta.with_link(defaults);
        }
        meta
    }

    pub fn bind(&self, column: usize) -> ColumnBoundWriter {
        ColumnBoundWriter::new(column, Arc::clone(&self.writer))
    }
}

impl fmt::Debug for OutputPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputPlan")
            .field("param", &self.param.name)
            .field("writer", &self.writer.info().name)
            .field("link", &self.link)
            .finish()
    }
}

/// Bindings for every selected parameter of a routine against one table.
pub struct ResolvedBindings<'t> {
    routine: String,
    inputs: Vec<(String, InputBinding<'t>)>,
    outputs: Vec<OutputPlan>,
    selections: BTreeMap<String, String>,
}

impl<'t> ResolvedBindings<'t> {
    pub fn routine(&self) -> &str {
        &self.routine
    }

    pub fn inputs(&self) -> &[(String, InputBinding<'t>)] {
        &self.inputs
    }

    pub fn input(&self, name: &str) -> Option<&InputBinding<'t>> {
        self.inputs.iter().find(|(n, _)| n == name).map(|(_, b)| b)
    }

    pub fn outputs(&self) -> &[OutputPlan] {
        &self.outputs
    }

    /// Parameter name to a description of what it was bound to.
    pub fn selections(&self) -> &BTreeMap<String, String> {
        &self.selections
    }

    /// Read every bound input for one row.
    pub fn read_row(&self, row: usize) -> Result<RowInputs, BindingError> {
        let mut inputs = RowInputs::new(self.routine.clone(), row);
        for (name, binding) in &self.inputs {
            inputs.insert(name.clone(), binding.read(row)?);
        }
        Ok(inputs)
    }
}

/// Matches routine parameters against table columns and registered adapters.
///
/// The resolver only enumerates; picking among several candidates is left to
/// a [`Chooser`].
pub struct BindingResolver<'r> {
    registry: &'r AdapterRegistry,
    config: ResolverConfig,
}

impl<'r> BindingResolver<'r> {
    pub fn new(registry: &'r AdapterRegistry) -> Self {
        Self {
            registry,
            config: ResolverConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn candidates(&self, table: &Table, param: &ParamSpec) -> Vec<Candidate> {
        match param.direction {
            Direction::In => self.input_candidates(table, param),
            Direction::Out => self.output_candidates(param),
        }
    }

    fn input_candidates(&self, table: &Table, param: &ParamSpec) -> Vec<Candidate> {
        let mut out = Vec::new();
        for (column, meta) in table.columns().iter().enumerate() {
            if !param.admits(meta.kind, &meta.subtype) {
                continue;
            }
            for reader in self
                .registry
                .readers_for(meta.kind, &meta.subtype)
                .filter(|r| r.info().processed == param.processed)
            {
                out.push(Candidate::Column {
                    column,
                    column_name: meta.name.clone(),
                    reader: Arc::clone(reader),
                });
            }
        }
        if self.config.offer_constants {
            for reader in self.registry.readers_producing(param.processed) {
                let info = reader.info();
                if info.hidden && !self.config.include_hidden_constants {
                    continue;
                }
                if param.admits(info.kind, &info.constant_subtype()) {
                    out.push(Candidate::Constant {
                        reader: Arc::clone(reader),
                    });
                }
            }
        }
        out
    }

    fn output_candidates(&self, param: &ParamSpec) -> Vec<Candidate> {
        self.registry
            .writers_consuming(param.processed)
            .filter(|w| param.admits(w.info().kind, &w.info().subtype))
            .map(|writer| {
                let info = writer.info();
                let link = (info.kind == ElementKind::FileLink).then(|| LinkTemplate {
                    base_dir: PathBuf::from(&param.name),
                    prefix: param.name.clone(),
                    extension: info.link_extension.clone(),
                });
                Candidate::NewColumn {
                    writer: Arc::clone(writer),
                    link,
                }
            })
            .collect()
    }

    /// Candidates for every parameter. Fails on the first required parameter
    /// with none; optional parameters without candidates are dropped.
    pub fn enumerate(
        &self,
        table: &Table,
        spec: &RoutineSpec,
    ) -> Result<Vec<ParamCandidates>, BindingError> {
        let mut out = Vec::with_capacity(spec.params.len());
        for param in &spec.params {
            let candidates = self.candidates(table, param);
            if candidates.is_empty() {
                if param.required {
                    return Err(BindingError::NoCandidates {
                        param: param.name.clone(),
                        table: table.name().to_string(),
                    });
                }
                continue;
            }
            out.push(ParamCandidates {
                param: param.clone(),
                candidates,
            });
        }
        Ok(out)
    }

    /// Enumerate, ask `chooser` once per parameter, and bind the selections.
    pub fn resolve<'t>(
        &self,
        table: &'t Table,
        spec: &RoutineSpec,
        chooser: &mut dyn Chooser,
    ) -> Result<ResolvedBindings<'t>, BindingError> {
        let enumerated = self.enumerate(table, spec)?;
        let mut resolved = ResolvedBindings {
            routine: spec.name.clone(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            selections: BTreeMap::new(),
        };

        for ParamCandidates { param, candidates } in enumerated {
            let Some(selection) = chooser.choose(&param, &candidates)? else {
                if param.required {
                    return Err(BindingError::MissingSelection { param: param.name });
                }
                continue;
            };
            let index = selection.candidate();
            let candidate = candidates.get(index).ok_or_else(|| BindingError::InvalidSelection {
                param: param.name.clone(),
                reason: format!("index {index} out of {} candidates", candidates.len()),
            })?;

            #[cfg(feature = "tracing")]
            tracing::debug!(routine = %spec.name, param = %param.name, choice = %candidate.describe(), "bound parameter");

            match (candidate, selection) {
                (Candidate::Column { column, reader, .. }, Selection::Candidate(_)) => {
                    resolved.selections.insert(param.name.clone(), candidate.describe());
                    resolved.inputs.push((
                        param.name,
                        InputBinding::Column(ColumnBoundReader::new(table, *column, Arc::clone(reader))),
                    ));
                }
                (Candidate::Constant { reader }, Selection::Constant { text, .. }) => {
                    let info = reader.info();
                    let cell = Cell::from_text(info.kind, info.constant_subtype(), &text).map_err(
                        |err| BindingError::InvalidSelection {
                            param: param.name.clone(),
                            reason: err.to_string(),
                        },
                    )?;
                    resolved.selections.insert(param.name.clone(), format!("constant {text}"));
                    resolved.inputs.push((
                        param.name,
                        InputBinding::Constant(ConstantReader::new(
                            cell,
                            Arc::clone(reader),
                            table.path_context(),
                        )),
                    ));
                }
                (Candidate::Constant { .. }, Selection::Candidate(_)) => {
                    return Err(BindingError::InvalidSelection {
                        param: param.name,
                        reason: "a constant candidate needs a value".to_string(),
                    });
                }
                (_, Selection::Constant { .. }) => {
                    return Err(BindingError::InvalidSelection {
                        param: param.name,
                        reason: format!("{} is not a constant", candidate.describe()),
                    });
                }
                (Candidate::NewColumn { writer, link }, Selection::Candidate(_)) => {
                    resolved.selections.insert(param.name.clone(), candidate.describe());
                    resolved.outputs.push(OutputPlan {
                        param,
                        writer: Arc::clone(writer),
                        link: link.clone(),
                    });
                }
            }
        }
        Ok(resolved)
    }
}
