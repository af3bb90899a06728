//! First pass of a plot: evaluate the function over the whole grid.

use bevy_math::Vec3;
use error_stack::ResultExt;

use crate::core::{BoundingBox, GridSample, PlotQueueEntry, SampleRow, SampleTable};
use crate::eval::{EvalInputs, Evaluator};
use crate::GraphError;

/// Everything pass one produces: uncolored rows plus the imaginary table.
///
/// `queue[i]` and `table.rows()[i]` describe the same row.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SampleBatch {
    pub queue: Vec<PlotQueueEntry>,
    pub table: SampleTable,
}

impl SampleBatch {
    pub fn row_count(&self) -> usize {
        self.queue.len()
    }
}

pub struct GridSampler<'a> {
    bounds: &'a BoundingBox,
}

impl<'a> GridSampler<'a> {
    pub fn new(bounds: &'a BoundingBox) -> Self {
        Self { bounds }
    }

    /// Evaluate one grid point.
    pub fn sample_point<E: Evaluator + ?Sized>(
        evaluator: &E,
        row: f64,
        col: f64,
    ) -> crate::Result<GridSample> {
        let (re, im) = evaluator
            .evaluate(&EvalInputs::new(row, col))
            .change_context(GraphError::Evaluation)
            .attach(format!("while evaluating row {row}, col {col}"))?
            .parts();
        let x = if re.is_nan() { f32::INFINITY } else { re as f32 };
        Ok(GridSample {
            row,
            col,
            imaginary: im,
            plotted_point: Vec3::new(x, col as f32, 0.0),
        })
    }

    /// Sample one row in column order.
    pub fn sample_row<E: Evaluator + ?Sized>(
        &self,
        evaluator: &E,
        row: f64,
    ) -> crate::Result<(PlotQueueEntry, SampleRow)> {
        let cols = self.bounds.col_count();
        let mut points = Vec::with_capacity(cols);
        let mut imaginary = Vec::with_capacity(cols);
        for col in self.bounds.cols() {
            let sample = Self::sample_point(evaluator, row, col)?;
            points.push(sample.plotted_point);
            imaginary.push(sample.imaginary);
        }
        Ok((PlotQueueEntry { points, row }, SampleRow { row, imaginary }))
    }

    /// Sample every row. The first evaluator error aborts the whole batch.
    pub fn sample<E: Evaluator + ?Sized>(&self, evaluator: &E) -> crate::Result<SampleBatch> {
        let mut batch = SampleBatch {
            queue: Vec::with_capacity(self.bounds.row_count()),
            table: SampleTable::new(),
        };
        for row in self.bounds.rows() {
            let (entry, values) = self.sample_row(evaluator, row)?;
            batch.queue.push(entry);
            batch.table.push_row(values);
        }
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{EvalOutput, FnEvaluator, TryFnEvaluator, from_complex_fn};

    #[test]
    fn identity_records_row_as_imaginary() {
        let bounds = BoundingBox::symmetric(2.0);
        let batch = GridSampler::new(&bounds).sample(&from_complex_fn(|z| z)).unwrap();

        assert_eq!(batch.row_count(), 5);
        for (entry, row) in batch.queue.iter().zip(batch.table.rows()) {
            assert_eq!(entry.row, row.row);
            assert_eq!(entry.points.len(), 5);
            assert!(row.imaginary.iter().all(|&im| im == row.row));
            for (p, col) in entry.points.iter().zip(bounds.cols()) {
                assert_eq!(*p, Vec3::new(col as f32, col as f32, 0.0));
            }
        }
    }

    #[test]
    fn nan_real_part_goes_to_infinity_but_keeps_imaginary() {
        let bounds = BoundingBox::symmetric(1.0);
        let f = FnEvaluator(|i: &EvalInputs| EvalOutput::Complex {
            re: f64::NAN,
            im: Some(i.y * 2.0),
        });
        let batch = GridSampler::new(&bounds).sample(&f).unwrap();
        assert!(batch.queue.iter().flat_map(|e| &e.points).all(|p| p.x == f32::INFINITY));
        assert_eq!(batch.table.imaginary_at(1.0, 0), Some(2.0));
        assert_eq!(batch.table.imaginary_at(-1.0, 2), Some(-2.0));
    }

    #[test]
    fn real_results_have_zero_imaginary() {
        let bounds = BoundingBox::symmetric(1.0);
        let batch = GridSampler::new(&bounds)
            .sample(&FnEvaluator(|i: &EvalInputs| i.x * i.y))
            .unwrap();
        assert!(batch.table.values().all(|v| v == 0.0));
    }

    #[test]
    fn evaluator_error_aborts_sampling() {
        let bounds = BoundingBox::symmetric(3.0);
        let f = TryFnEvaluator(|i: &EvalInputs| {
            if i.y > 1.0 { Err("out of domain") } else { Ok(i.x) }
        });
        let err = GridSampler::new(&bounds).sample(&f).unwrap_err();
        assert_eq!(*err.current_context(), GraphError::Evaluation);
    }
}
