use std::cell::Cell as Counter;

use slideset_binding::{
    AdapterRegistry, BindingError, ColumnBoundWriter, FirstCandidate, FnWriter, Processed, ParamSpec, PresetChooser, Routine, RoutineError,
    RoutineSpec, RowInputs, RowOutputs, execute,
};
use slideset_table::{Cell, ColumnMeta, ElementKind, LinkDefaults, PathContext, Table, TableTree};
use slideset_testkit::{counts_table, tempdir};

struct Scale {
    spec: RoutineSpec,
    runs: Counter<usize>,
}

impl Scale {
    fn new() -> Self {
        Self {
            spec: RoutineSpec::new("Scale")
                .param(ParamSpec::input::<i32>("Count"))
                .param(ParamSpec::input::<f64>("Factor"))
                .param(ParamSpec::output::<f64>("Scaled"))
                .param(ParamSpec::output::<String>("Report")),
            runs: Counter::new(0),
        }
    }
}

impl Routine for Scale {
    fn spec(&self) -> &RoutineSpec {
        &self.spec
    }

    fn run(&self, mut inputs: RowInputs) -> Result<RowOutputs, RoutineError> {
        self.runs.set(self.runs.get() + 1);
        let count: i32 = inputs.take("Count")?;
        let factor: f64 = inputs.take("Factor")?;
        Ok(RowOutputs::new()
            .with("Scaled", f64::from(count) * factor)
            .with("Report", format!("row {} count {count}", inputs.row())))
    }
}

const SELECTIONS: &str = r#"
selections:
  Count: { column: Count }
  Factor: { constant: 2.5, reader: numeric-f64 }
  Scaled: { writer: numeric-f64 }
  Report: { writer: text-file }
"#;

#[test]
fn execute_builds_a_child_table() {
    let dir = tempdir();
    let mut tree = TableTree::new();
    let mut source = counts_table(&[1, 2, 3]);
    source.set_working_dir(Some(dir.path().to_path_buf()));
    let parent = tree.insert_root(source);

    let routine = Scale::new();
    let registry = AdapterRegistry::with_builtins();
    let mut chooser = PresetChooser::from_yaml_str(SELECTIONS).unwrap();
    let child = execute(&mut tree, parent, &routine, &registry, &mut chooser).unwrap();

    assert_eq!(routine.runs.get(), 3);
    assert_eq!(tree.children(parent).unwrap(), &[child]);
    assert_eq!(tree.parent(child).unwrap(), Some(parent));

    let result = tree.get(child).unwrap();
    assert_eq!(result.name(), "Scale");
    assert_eq!(result.row_count(), 3);
    assert_eq!(result.working_dir(), Some(dir.path()));

    let scaled = result.require_column("Scaled").unwrap();
    let texts: Vec<_> = (0..3).map(|r| result.cell_text(scaled, r).unwrap()).collect();
    assert_eq!(texts, ["2.5", "5", "7.5"]);

    let report = result.require_column("Report").unwrap();
    assert_eq!(result.columns()[report].kind, ElementKind::FileLink);
    assert_eq!(result.columns()[report].subtype, "text/plain");
    for row in 0..3 {
        let link = result.cell_text(report, row).unwrap();
        assert_eq!(link, format!("Report/Report-{row:03}.txt"));
        let written = std::fs::read_to_string(dir.path().join(&link)).unwrap();
        assert_eq!(written, format!("row {row} count {}", row + 1));
    }
    assert_eq!(result.columns()[report].link.counter, 3);

    let creation = result.creation().unwrap();
    assert_eq!(creation.command, "Scale");
    assert_eq!(creation.parameters["Count"], "column \"Count\" via integer-i32");
    assert_eq!(creation.parameters["Factor"], "constant 2.5");
    assert_eq!(creation.parameters.len(), 4);
}

#[test]
fn cancellation_leaves_the_tree_untouched() {
    let mut tree = TableTree::new();
    let parent = tree.insert_root(counts_table(&[1]));
    let routine = Scale::new();
    let mut chooser = PresetChooser::from_yaml_str(
        "selections:\n  Count: { column: Count }\n  Factor: { cancel: true }\n",
    )
    .unwrap();

    let err = execute(
        &mut tree,
        parent,
        &routine,
        &AdapterRegistry::with_builtins(),
        &mut chooser,
    )
    .unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(routine.runs.get(), 0);
    assert_eq!(tree.len(), 1);
    assert!(tree.children(parent).unwrap().is_empty());
}

#[test]
fn routine_failures_carry_the_row() {
    struct FailsOnSecond(RoutineSpec);
    impl Routine for FailsOnSecond {
        fn spec(&self) -> &RoutineSpec {
            &self.0
        }
        fn run(&self, mut inputs: RowInputs) -> Result<RowOutputs, RoutineError> {
            let n: i64 = inputs.take("Count")?;
            if inputs.row() == 1 {
                return Err(format!("bad value {n}").into());
            }
            Ok(RowOutputs::new().with("Double", n * 2))
        }
    }

    let mut tree = TableTree::new();
    let parent = tree.insert_root(counts_table(&[1, 2, 3]));
    let routine = FailsOnSecond(
        RoutineSpec::new("Double")
            .param(ParamSpec::input::<i64>("Count"))
            .param(ParamSpec::output::<i64>("Double")),
    );
    let err = execute(
        &mut tree,
        parent,
        &routine,
        &AdapterRegistry::with_builtins(),
        &mut FirstCandidate,
    )
    .unwrap_err();
    match err {
        BindingError::Routine { routine, row, source } => {
            assert_eq!(routine, "Double");
            assert_eq!(row, 1);
            assert_eq!(source.to_string(), "bad value 2");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(tree.len(), 1);
}

#[test]
fn missing_required_output_is_an_error() {
    struct Silent(RoutineSpec);
    impl Routine for Silent {
        fn spec(&self) -> &RoutineSpec {
            &self.0
        }
        fn run(&self, _: RowInputs) -> Result<RowOutputs, RoutineError> {
            Ok(RowOutputs::new())
        }
    }

    let mut tree = TableTree::new();
    let parent = tree.insert_root(counts_table(&[1]));
    let routine = Silent(RoutineSpec::new("Silent").param(ParamSpec::output::<bool>("Flag")));
    let err = execute(
        &mut tree,
        parent,
        &routine,
        &AdapterRegistry::with_builtins(),
        &mut FirstCandidate,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        BindingError::MissingOutput { ref param, row: 0, .. } if param == "Flag"
    ));
}

#[test]
fn optional_outputs_may_be_left_empty() {
    struct Sparse(RoutineSpec);
    impl Routine for Sparse {
        fn spec(&self) -> &RoutineSpec {
            &self.0
        }
        fn run(&self, inputs: RowInputs) -> Result<RowOutputs, RoutineError> {
            let mut out = RowOutputs::new();
            if inputs.row() % 2 == 0 {
                out.set("Even", true);
            }
            Ok(out)
        }
    }

    let mut tree = TableTree::new();
    let parent = tree.insert_root(counts_table(&[1, 2, 3]));
    let routine = Sparse(RoutineSpec::new("Sparse").param(ParamSpec::output::<bool>("Even").optional()));
    let child = execute(
        &mut tree,
        parent,
        &routine,
        &AdapterRegistry::with_builtins(),
        &mut FirstCandidate,
    )
    .unwrap();
    let result = tree.get(child).unwrap();
    let even = result.require_column("Even").unwrap();
    let texts: Vec<_> = (0..3).map(|r| result.cell_text(even, r).unwrap()).collect();
    assert_eq!(texts, ["true", "false", "true"]);
}

#[test]
fn failed_link_write_leaves_cell_and_counter_alone() {
    let dir = tempdir();
    let mut table = Table::new("results");
    table
        .add_column(ColumnMeta::new("Out", ElementKind::FileLink).with_link(LinkDefaults::new("out")))
        .unwrap();
    table.add_row().unwrap();
    table.set_working_dir(Some(dir.path().to_path_buf()));
    let before = table.clone();

    let failing = FnWriter::new("always-fails", ElementKind::FileLink, |_: String, _: &mut Cell, _: &PathContext| {
        Err(BindingError::Io(std::io::Error::other("disk full")))
    });
    let bound = ColumnBoundWriter::new(0, std::sync::Arc::new(failing));
    let err = bound
        .write(&mut table, 0, Processed::new("payload".to_string()))
        .unwrap_err();
    assert!(matches!(err, BindingError::Io(_)));
    assert_eq!(table, before);
    assert_eq!(table.column(0).unwrap().link.counter, 0);

    let succeeding = FnWriter::new("keeps-link", ElementKind::FileLink, |_: String, _: &mut Cell, _: &PathContext| Ok(()));
    ColumnBoundWriter::new(0, std::sync::Arc::new(succeeding))
        .write(&mut table, 0, Processed::new("payload".to_string()))
        .unwrap();
    assert_eq!(
        table.cell_text(0, 0).unwrap(),
        std::path::Path::new("out").join("Out-000").to_string_lossy()
    );
    assert_eq!(table.column(0).unwrap().link.counter, 1);
}
