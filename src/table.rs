//! SNMP table decoding.
//!
//! A [`Table`] walks its subtree once at construction and keeps the decoded
//! [`Row`]s as a snapshot. Two layouts are supported:
//!
//! - **Flattened**: a group of scalars (`walk_oid.<column>.0`) decoded as a
//!   single row. The n-th declared column is bound to the n-th leaf.
//! - **Indexed**: a conceptual table (`walk_oid.<row_base>.<column>.<index>`)
//!   with one row per index found under the anchor column.
//!
//! Row OIDs are kept as templates with a `%d` placeholder for the column, so a
//! descriptor can carry its row address as a plain string.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::client::{ReadResult, ReadValue, SnmpClient};
use crate::enumerator::{DeviceEnumerator, EnumerationContext, ModelProvider, NoopEnumerator, SensorDescriptor};
use crate::error::Result;
use crate::oid::Oid;

/// Placeholder for the column arc in a row template.
pub const COLUMN_PLACEHOLDER: &str = "%d";

/// Static declaration of a table: where it lives and how it is laid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub name: String,
    pub walk_oid: Oid,
    pub columns: Vec<String>,
    /// Entry arc under `walk_oid` for indexed tables
    pub row_base: Option<u32>,
    /// Column holding each row's own index
    pub index_column: Option<u32>,
    /// Column used to discover row indices; the first column if unset
    pub readable_column: Option<u32>,
    pub flattened: bool,
}

impl TableSpec {
    /// A group of scalars decoded as one row.
    pub fn flattened<S: Into<String>>(
        name: impl Into<String>,
        walk_oid: Oid,
        columns: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            name: name.into(),
            walk_oid,
            columns: columns.into_iter().map(Into::into).collect(),
            row_base: None,
            index_column: None,
            readable_column: None,
            flattened: true,
        }
    }

    /// A conceptual table with an entry at `walk_oid.row_base`.
    pub fn indexed<S: Into<String>>(
        name: impl Into<String>,
        walk_oid: Oid,
        columns: impl IntoIterator<Item = S>,
        row_base: u32,
        index_column: u32,
        readable_column: u32,
    ) -> Self {
        Self {
            name: name.into(),
            walk_oid,
            columns: columns.into_iter().map(Into::into).collect(),
            row_base: Some(row_base),
            index_column: Some(index_column),
            readable_column: Some(readable_column),
            flattened: false,
        }
    }
}

/// One decoded row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    base_oid: String,
    cells: Vec<ReadResult>,
}

impl Row {
    pub fn new(base_oid: impl Into<String>, cells: Vec<ReadResult>) -> Self {
        Self {
            base_oid: base_oid.into(),
            cells,
        }
    }

    /// Row OID template, e.g. `.1.3.6.1.2.1.33.1.3.3.1.%d.1`.
    pub fn base_oid(&self) -> &str {
        &self.base_oid
    }

    /// One cell per declared column, in declaration order.
    pub fn cells(&self) -> &[ReadResult] {
        &self.cells
    }

    /// Cell for a 1-based column number.
    pub fn cell(&self, column: u32) -> Option<&ReadResult> {
        (column as usize)
            .checked_sub(1)
            .and_then(|i| self.cells.get(i))
    }

    /// Concrete OID of a column in this row.
    pub fn oid_for(&self, column: u32) -> String {
        fill_template(&self.base_oid, column)
    }
}

/// Substitute a column number into a row template.
pub fn fill_template(template: &str, column: u32) -> String {
    template.replacen(COLUMN_PLACEHOLDER, &column.to_string(), 1)
}

fn template(prefix: &Oid, suffix: &[u32]) -> String {
    let mut out = format!("{}.{}", prefix.to_dotted(), COLUMN_PLACEHOLDER);
    for arc in suffix {
        out.push('.');
        out.push_str(&arc.to_string());
    }
    out
}

fn null_cell(oid: String) -> ReadResult {
    ReadResult {
        oid,
        value: ReadValue::Null,
    }
}

/// Decode walk output into rows.
///
/// Leaves are re-sorted numerically first; leaves whose OID does not parse
/// are skipped.
pub fn decode_rows(spec: &TableSpec, results: &[ReadResult]) -> Vec<Row> {
    let mut leaves: Vec<(Oid, &ReadResult)> = results
        .iter()
        .filter_map(|r| match Oid::parse(&r.oid) {
            Ok(oid) => Some((oid, r)),
            Err(_) => {
                tracing::debug!(target: "ups_snmp::table", { table = %spec.name, snmp.oid = %r.oid }, "skipping unparsable leaf");
                None
            }
        })
        .filter(|(oid, _)| oid.starts_with(&spec.walk_oid))
        .collect();
    leaves.sort_by(|a, b| a.0.cmp(&b.0));

    if spec.flattened {
        vec![decode_flattened(spec, &leaves)]
    } else {
        decode_indexed(spec, &leaves)
    }
}

fn decode_flattened(spec: &TableSpec, leaves: &[(Oid, &ReadResult)]) -> Row {
    // Groups such as upsInput also hold an indexed subtable; only scalars
    // (column arc plus at most one instance arc) bind to columns.
    let scalars: Vec<(&[u32], &ReadResult)> = leaves
        .iter()
        .filter_map(|(oid, result)| {
            oid.strip_prefix(&spec.walk_oid)
                .filter(|rest| (1..=2).contains(&rest.len()))
                .map(|rest| (rest, *result))
        })
        .collect();

    // The first scalar's instance arc, usually `.0`
    let base_oid = scalars
        .first()
        .and_then(|(rest, _)| rest.get(1..))
        .filter(|instance| !instance.is_empty())
        .map(|instance| template(&spec.walk_oid, instance))
        .unwrap_or_else(|| template(&spec.walk_oid, &[0]));

    let cells = (0..spec.columns.len())
        .map(|n| match scalars.get(n) {
            Some((_, result)) => (*result).clone(),
            None => null_cell(fill_template(&base_oid, n as u32 + 1)),
        })
        .collect();

    Row::new(base_oid, cells)
}

fn decode_indexed(spec: &TableSpec, leaves: &[(Oid, &ReadResult)]) -> Vec<Row> {
    let entry = match spec.row_base {
        Some(base) => spec.walk_oid.child(base),
        None => spec.walk_oid.clone(),
    };
    let anchor = entry.child(spec.readable_column.unwrap_or(1));

    let by_oid: BTreeMap<&Oid, &ReadResult> = leaves.iter().map(|(oid, r)| (oid, *r)).collect();

    // Leaves are sorted, so suffixes under the anchor arrive in ascending order
    let mut suffixes: Vec<&[u32]> = Vec::new();
    for (oid, _) in leaves {
        if let Some(suffix) = oid.strip_prefix(&anchor)
            && !suffix.is_empty()
            && suffixes.last() != Some(&suffix)
        {
            suffixes.push(suffix);
        }
    }

    suffixes
        .into_iter()
        .map(|suffix| {
            let cells = (1..=spec.columns.len() as u32)
                .map(|column| {
                    let oid = entry.child(column).join(suffix);
                    match by_oid.get(&oid) {
                        Some(result) => (*result).clone(),
                        None => null_cell(oid.to_dotted()),
                    }
                })
                .collect();
            Row::new(template(&entry, suffix), cells)
        })
        .collect()
}

/// A walked and decoded SNMP table.
pub struct Table {
    spec: TableSpec,
    rows: Vec<Row>,
    context: Arc<SnmpClient>,
    model: Arc<dyn ModelProvider>,
    enumerator: Box<dyn DeviceEnumerator>,
}

impl Table {
    /// Walk `spec.walk_oid` and decode the result.
    ///
    /// A walk failure fails construction.
    pub async fn new(
        spec: TableSpec,
        context: Arc<SnmpClient>,
        model: Arc<dyn ModelProvider>,
    ) -> Result<Self> {
        let results = context.walk(&spec.walk_oid.to_dotted()).await?;
        tracing::debug!(
            target: "ups_snmp::table",
            { table = %spec.name, snmp.oid = %spec.walk_oid, snmp.count = results.len() },
            "walked table"
        );
        Ok(Self::from_results(spec, context, model, &results))
    }

    /// Decode already-walked results without touching the network.
    pub fn from_results(
        spec: TableSpec,
        context: Arc<SnmpClient>,
        model: Arc<dyn ModelProvider>,
        results: &[ReadResult],
    ) -> Self {
        let rows = decode_rows(&spec, results);
        Self {
            spec,
            rows,
            context,
            model,
            enumerator: Box::new(NoopEnumerator),
        }
    }

    pub fn set_enumerator(&mut self, enumerator: Box<dyn DeviceEnumerator>) {
        self.enumerator = enumerator;
    }

    pub fn set_model(&mut self, model: Arc<dyn ModelProvider>) {
        self.model = model;
    }

    /// Run this table's enumeration strategy.
    pub fn enumerate_devices(&self, ctx: &EnumerationContext) -> Result<Vec<SensorDescriptor>> {
        self.enumerator.enumerate(self, ctx)
    }

    pub fn spec(&self) -> &TableSpec {
        &self.spec
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn walk_oid(&self) -> &Oid {
        &self.spec.walk_oid
    }

    pub fn column_names(&self) -> &[String] {
        &self.spec.columns
    }

    pub fn row_base(&self) -> Option<u32> {
        self.spec.row_base
    }

    pub fn index_column(&self) -> Option<u32> {
        self.spec.index_column
    }

    pub fn readable_column(&self) -> Option<u32> {
        self.spec.readable_column
    }

    pub fn is_flattened(&self) -> bool {
        self.spec.flattened
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn context(&self) -> &Arc<SnmpClient> {
        &self.context
    }

    /// Model string for descriptors of this table.
    pub fn model(&self) -> String {
        self.model.model()
    }

    /// Log the decoded table at debug level.
    pub fn dump(&self) {
        tracing::debug!(
            target: "ups_snmp::table",
            { table = %self.spec.name, snmp.oid = %self.spec.walk_oid, rows = self.rows.len() },
            "table"
        );
        for (index, row) in self.rows.iter().enumerate() {
            for (name, cell) in self.spec.columns.iter().zip(row.cells()) {
                tracing::debug!(
                    target: "ups_snmp::table",
                    { table = %self.spec.name, row = index, column = %name, snmp.oid = %cell.oid, value = %cell.value },
                    "cell"
                );
            }
        }
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("spec", &self.spec)
            .field("rows", &self.rows)
            .finish_non_exhaustive()
    }
}
