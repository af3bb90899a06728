//! Two-pass plot: sample everything, then color against the global range.

use tracing::{debug, warn};

use crate::core::{BoundingBox, Curve, HeatMapRange};
use crate::curve::CurveBuilder;
use crate::eval::Evaluator;
use crate::heatmap::HeatMapColorMapper;
use crate::sampler::{GridSampler, SampleBatch};

/// Curves ready to be committed, plus the range they were colored with.
#[derive(Clone, Debug, PartialEq)]
pub struct PlotOutcome {
    pub curves: Vec<Curve>,
    pub range: HeatMapRange,
}

pub struct PlotPipeline<'a> {
    bounds: &'a BoundingBox,
}

impl<'a> PlotPipeline<'a> {
    pub fn new(bounds: &'a BoundingBox) -> Self {
        Self { bounds }
    }

    /// Sample the whole grid, derive the range, then build every curve.
    ///
    /// No color is decided until the last sample is in. On error nothing is
    /// returned, so a caller never sees a partial plot.
    pub fn run<E: Evaluator + ?Sized>(&self, evaluator: &E) -> crate::Result<PlotOutcome> {
        self.bounds.validate()?;
        debug!(
            rows = self.bounds.row_count(),
            cols = self.bounds.col_count(),
            "sampling grid"
        );

        let SampleBatch { queue, table } = GridSampler::new(self.bounds)
            .sample(evaluator)
            .inspect_err(|e| warn!("plot aborted: {e:?}"))?;

        let mapper = HeatMapColorMapper::from_table(&table);
        let range = mapper.range();
        let builder = CurveBuilder::new(&mapper);
        let curves: Vec<Curve> = queue
            .into_iter()
            .zip(table.rows())
            .map(|(entry, values)| builder.build(entry, values))
            .collect();

        debug!(curves = curves.len(), min = range.min, max = range.max, "plot colored");
        Ok(PlotOutcome { curves, range })
    }
}
