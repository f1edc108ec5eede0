//! The round population: one row per candidate parameterization.
//!
//! A [`Population`] is an arena of [`Sample`] rows sharing one [`Schema`].
//! Stages fill the rows in place (evaluation results, projection, cluster
//! label); filtering builds a fresh arena from the surviving rows. Nothing
//! is carried over between rounds: each round starts from a new
//! `Population`.
//!
//! Populations serialize to CSV with the header
//! `id,<params…>,<qois…>,<qoi>_error…,projection_0,projection_1,cluster_id`.
//! Values that a stage has not produced yet are written as empty cells.

use core::fmt;
use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::parameter::Parameter;
use crate::qoi::QoI;

/// Identifier column, first in every artifact.
pub const ID_COLUMN: &str = "id";

/// Columns written after the parameters, QoIs and errors.
pub const TRAILING_COLUMNS: [&str; 3] = ["projection_0", "projection_1", "cluster_id"];

/// Returns the name of the error column generated for QoI `qoi`.
#[must_use]
pub fn error_column(qoi: &str) -> String {
    format!("{qoi}_error")
}

/// Column names shared by every row of a population.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schema {
    parameters: Vec<String>,
    qois: Vec<String>,
}

impl Schema {
    /// Creates a schema from parameter and QoI names, in column order.
    #[must_use]
    pub fn new<P, Q>(parameters: P, qois: Q) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        Q: IntoIterator,
        Q::Item: Into<String>,
    {
        Self {
            parameters: parameters.into_iter().map(Into::into).collect(),
            qois: qois.into_iter().map(Into::into).collect(),
        }
    }

    /// Builds the schema for a set of parameters and QoIs.
    #[must_use]
    pub fn from_definitions(parameters: &[Parameter], qois: &[QoI]) -> Self {
        Self::new(
            parameters.iter().map(Parameter::name),
            qois.iter().map(QoI::name),
        )
    }

    /// Returns the parameter names.
    #[must_use]
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// Returns the QoI names.
    #[must_use]
    pub fn qois(&self) -> &[String] {
        &self.qois
    }

    /// Returns the full CSV header.
    #[must_use]
    pub fn header(&self) -> Vec<String> {
        let mut header = Vec::with_capacity(4 + self.parameters.len() + 2 * self.qois.len());
        header.push(ID_COLUMN.to_owned());
        header.extend(self.parameters.iter().cloned());
        header.extend(self.qois.iter().cloned());
        header.extend(self.qois.iter().map(|q| error_column(q)));
        header.extend(TRAILING_COLUMNS.map(str::to_owned));
        header
    }
}

/// Identifier of a sample: the round that created it and its position in
/// that round's initial population.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SampleId {
    /// Round that created the sample.
    pub iteration: usize,
    /// Position in that round's initial population.
    pub sequence: usize,
}

impl fmt::Display for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.iteration, self.sequence)
    }
}

/// One row of a population.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sample {
    /// Unique identifier.
    pub id: SampleId,
    /// Parameter values, in schema order.
    pub parameters: Vec<f64>,
    /// Predicted QoI values; empty until evaluated.
    pub qoi_values: Vec<f64>,
    /// Per-QoI errors; empty until evaluated.
    pub errors: Vec<f64>,
    /// Two-dimensional projection; `None` until projected.
    pub projection: Option<[f64; 2]>,
    /// Cluster label; `None` until clustered.
    pub cluster_id: Option<i64>,
}

/// An arena of samples sharing one [`Schema`].
#[derive(Clone, Debug)]
pub struct Population {
    schema: Arc<Schema>,
    samples: Vec<Sample>,
}

impl Population {
    /// Creates a population for round `iteration` from raw parameter rows.
    ///
    /// Sequences are assigned densely in row order starting at zero.
    ///
    /// # Errors
    ///
    /// Returns `Error::RowLengthMismatch` if a row's length differs from the
    /// schema's parameter count.
    pub fn from_rows(schema: Arc<Schema>, iteration: usize, rows: Vec<Vec<f64>>) -> Result<Self> {
        let n_params = schema.parameters.len();
        let samples = rows
            .into_iter()
            .enumerate()
            .map(|(sequence, parameters)| {
                if parameters.len() != n_params {
                    return Err(Error::RowLengthMismatch {
                        row: sequence,
                        expected: n_params,
                        got: parameters.len(),
                    });
                }
                Ok(Sample {
                    id: SampleId {
                        iteration,
                        sequence,
                    },
                    parameters,
                    qoi_values: Vec::new(),
                    errors: Vec::new(),
                    projection: None,
                    cluster_id: None,
                })
            })
            .collect::<Result<Vec<Sample>>>()?;
        Ok(Self { schema, samples })
    }

    /// Returns the schema.
    #[must_use]
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Returns the rows.
    #[must_use]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Iterates over the rows.
    pub fn iter(&self) -> core::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` if there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns the parameter matrix, one row per sample.
    #[must_use]
    pub fn parameter_matrix(&self) -> Vec<Vec<f64>> {
        self.samples.iter().map(|s| s.parameters.clone()).collect()
    }

    /// Returns the error matrix, one row per sample.
    #[must_use]
    pub fn error_matrix(&self) -> Vec<Vec<f64>> {
        self.samples.iter().map(|s| s.errors.clone()).collect()
    }

    /// Stores evaluation results row by row.
    ///
    /// # Errors
    ///
    /// Returns `Error::Internal` if the number of rows differs from the
    /// population size.
    pub fn set_evaluations(&mut self, results: Vec<(Vec<f64>, Vec<f64>)>) -> Result<()> {
        if results.len() != self.samples.len() {
            return Err(Error::Internal("evaluation results do not cover the population"));
        }
        for (sample, (values, errors)) in self.samples.iter_mut().zip(results) {
            sample.qoi_values = values;
            sample.errors = errors;
        }
        Ok(())
    }

    /// Keeps the rows whose mask entry is `true`, preserving order.
    ///
    /// # Errors
    ///
    /// Returns `Error::MaskLengthMismatch` if the mask does not have one
    /// entry per row.
    pub fn retain_mask(&mut self, mask: &[bool]) -> Result<()> {
        if mask.len() != self.samples.len() {
            return Err(Error::MaskLengthMismatch {
                expected: self.samples.len(),
                got: mask.len(),
            });
        }
        let samples = core::mem::take(&mut self.samples);
        self.samples = samples
            .into_iter()
            .zip(mask)
            .filter_map(|(s, &keep)| keep.then_some(s))
            .collect();
        Ok(())
    }

    /// Stores one projection per row.
    ///
    /// # Errors
    ///
    /// Returns `Error::ProjectionCountMismatch` on a length mismatch.
    pub fn set_projections(&mut self, projections: Vec<[f64; 2]>) -> Result<()> {
        if projections.len() != self.samples.len() {
            return Err(Error::ProjectionCountMismatch {
                expected: self.samples.len(),
                got: projections.len(),
            });
        }
        for (sample, p) in self.samples.iter_mut().zip(projections) {
            sample.projection = Some(p);
        }
        Ok(())
    }

    /// Returns the projections of rows that have one.
    #[must_use]
    pub fn projections(&self) -> Vec<[f64; 2]> {
        self.samples.iter().filter_map(|s| s.projection).collect()
    }

    /// Stores one cluster label per row.
    ///
    /// # Errors
    ///
    /// Returns `Error::LabelCountMismatch` on a length mismatch.
    pub fn set_clusters(&mut self, labels: Vec<i64>) -> Result<()> {
        if labels.len() != self.samples.len() {
            return Err(Error::LabelCountMismatch {
                expected: self.samples.len(),
                got: labels.len(),
            });
        }
        for (sample, label) in self.samples.iter_mut().zip(labels) {
            sample.cluster_id = Some(label);
        }
        Ok(())
    }

    /// Groups the parameter rows of clustered samples by label, in
    /// ascending label order. Unclustered rows are ignored.
    #[must_use]
    pub fn cluster_groups(&self) -> BTreeMap<i64, Vec<Vec<f64>>> {
        let mut groups: BTreeMap<i64, Vec<Vec<f64>>> = BTreeMap::new();
        for sample in &self.samples {
            if let Some(label) = sample.cluster_id {
                groups.entry(label).or_default().push(sample.parameters.clone());
            }
        }
        groups
    }

    /// Writes the population as CSV, header first.
    ///
    /// # Errors
    ///
    /// Returns `Error::Csv` if writing fails.
    pub fn write_csv(&self, writer: impl io::Write) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(self.schema.header())?;

        let n_qois = self.schema.qois.len();
        for sample in &self.samples {
            let mut record = Vec::with_capacity(self.schema.header().len());
            record.push(sample.id.to_string());
            record.extend(sample.parameters.iter().map(f64::to_string));
            record.extend(padded(&sample.qoi_values, n_qois));
            record.extend(padded(&sample.errors, n_qois));
            match sample.projection {
                Some([p0, p1]) => record.extend([p0.to_string(), p1.to_string()]),
                None => record.extend([String::new(), String::new()]),
            }
            record.push(sample.cluster_id.map(|c| c.to_string()).unwrap_or_default());
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Writes the population to a CSV file, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be created and `Error::Csv`
    /// if writing fails.
    pub fn export_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.write_csv(io::BufWriter::new(file))
    }

    /// Reads a seed population from CSV.
    ///
    /// The input needs one column per schema parameter, located by header
    /// name; other columns are ignored, so a previous round's export is a
    /// valid seed. Rows become round-0 samples with fresh ids.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingColumn` if a parameter column is absent,
    /// `Error::InvalidValue` if a cell is not a finite number and
    /// `Error::Csv` for malformed CSV.
    pub fn read_csv(schema: Arc<Schema>, reader: impl io::Read) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = rdr.headers()?.clone();

        let columns = schema
            .parameters
            .iter()
            .map(|name| {
                headers
                    .iter()
                    .position(|h| h == name)
                    .ok_or_else(|| Error::MissingColumn(name.clone()))
            })
            .collect::<Result<Vec<usize>>>()?;

        let mut rows = Vec::new();
        for (row, record) in rdr.records().enumerate() {
            let record = record?;
            let values = columns
                .iter()
                .zip(&schema.parameters)
                .map(|(&col, name)| {
                    let raw = record.get(col).unwrap_or("");
                    raw.parse::<f64>()
                        .ok()
                        .filter(|v| v.is_finite())
                        .ok_or_else(|| Error::InvalidValue {
                            column: name.clone(),
                            row,
                            value: raw.to_owned(),
                        })
                })
                .collect::<Result<Vec<f64>>>()?;
            rows.push(values);
        }
        Self::from_rows(schema, 0, rows)
    }

    /// Reads a seed population from a CSV file.
    ///
    /// # Errors
    ///
    /// See [`Population::read_csv`]; additionally `Error::Io` if the file
    /// cannot be opened.
    pub fn import_csv(schema: Arc<Schema>, path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::read_csv(schema, io::BufReader::new(file))
    }
}

impl<'a> IntoIterator for &'a Population {
    type Item = &'a Sample;
    type IntoIter = core::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

fn padded(values: &[f64], n: usize) -> impl Iterator<Item = String> + '_ {
    values
        .iter()
        .map(f64::to_string)
        .chain(core::iter::repeat_with(String::new))
        .take(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Arc<Schema> {
        Arc::new(Schema::new(["a", "b"], ["q"]))
    }

    fn population() -> Population {
        Population::from_rows(
            schema(),
            2,
            vec![vec![0.1, 0.2], vec![0.3, 0.4], vec![0.5, 0.6]],
        )
        .unwrap()
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = Population::from_rows(schema(), 0, vec![vec![0.1, 0.2], vec![0.3]]).unwrap_err();
        assert!(matches!(
            err,
            Error::RowLengthMismatch {
                row: 1,
                expected: 2,
                got: 1
            }
        ));
    }

    #[test]
    fn header_layout() {
        assert_eq!(
            schema().header(),
            [
                "id",
                "a",
                "b",
                "q",
                "q_error",
                "projection_0",
                "projection_1",
                "cluster_id"
            ]
        );
    }

    #[test]
    fn ids_are_dense_and_tagged_with_round() {
        let pop = population();
        let ids: Vec<String> = pop.iter().map(|s| s.id.to_string()).collect();
        assert_eq!(ids, ["2_0", "2_1", "2_2"]);
    }

    #[test]
    fn retain_mask_keeps_order_and_ids() {
        let mut pop = population();
        pop.retain_mask(&[true, false, true]).unwrap();
        let ids: Vec<usize> = pop.iter().map(|s| s.id.sequence).collect();
        assert_eq!(ids, [0, 2]);
        assert!(matches!(
            pop.retain_mask(&[true]),
            Err(Error::MaskLengthMismatch {
                expected: 2,
                got: 1
            })
        ));
    }

    #[test]
    fn stage_setters_check_lengths() {
        let mut pop = population();
        assert!(matches!(
            pop.set_projections(vec![[0.0, 0.0]]),
            Err(Error::ProjectionCountMismatch { .. })
        ));
        assert!(matches!(
            pop.set_clusters(vec![0; 4]),
            Err(Error::LabelCountMismatch { .. })
        ));
        assert!(pop.set_evaluations(vec![]).is_err());
    }

    #[test]
    fn cluster_groups_are_label_ordered() {
        let mut pop = population();
        pop.set_clusters(vec![3, -1, 3]).unwrap();
        let groups = pop.cluster_groups();
        let labels: Vec<i64> = groups.keys().copied().collect();
        assert_eq!(labels, [-1, 3]);
        assert_eq!(groups[&3], vec![vec![0.1, 0.2], vec![0.5, 0.6]]);
    }

    #[test]
    fn unfinished_stages_export_blank_cells() {
        let mut buf = Vec::new();
        population().write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("id,a,b,q,q_error,projection_0,projection_1,cluster_id")
        );
        assert_eq!(lines.next(), Some("2_0,0.1,0.2,,,,,"));
    }

    #[test]
    fn export_then_seed_reads_parameters_back() {
        let mut pop = population();
        pop.set_evaluations(vec![(vec![1.0], vec![0.5]); 3]).unwrap();
        pop.set_projections(vec![[1.0, 2.0]; 3]).unwrap();
        pop.set_clusters(vec![0, 1, 0]).unwrap();
        let mut buf = Vec::new();
        pop.write_csv(&mut buf).unwrap();

        let seed = Population::read_csv(schema(), buf.as_slice()).unwrap();
        assert_eq!(seed.parameter_matrix(), pop.parameter_matrix());
        assert!(seed.iter().all(|s| s.id.iteration == 0 && s.cluster_id.is_none()));
    }

    #[test]
    fn seed_columns_are_found_by_name() {
        let input = "b,extra,a\n2.0,x,1.0\n4.0,y,3.0\n";
        let seed = Population::read_csv(schema(), input.as_bytes()).unwrap();
        assert_eq!(seed.parameter_matrix(), vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
    }

    #[test]
    fn seed_missing_column() {
        let err = Population::read_csv(schema(), "a\n1.0\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::MissingColumn(ref c) if c == "b"));
    }

    #[test]
    fn seed_invalid_value() {
        let err = Population::read_csv(schema(), "a,b\n1.0,2.0\n1.0,oops\n".as_bytes())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidValue { ref column, row: 1, ref value } if column == "b" && value == "oops"
        ));
    }
}
