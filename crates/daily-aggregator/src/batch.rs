//! Multi-day batches: days are independent, so they run in parallel.

use chrono::NaiveDate;
use grid_common::{DailyGridWriter, GridSource};
use rayon::prelude::*;
use tracing::{error, info};

use crate::error::{AggregationError, Result};
use crate::pipeline::{DailyPipeline, DayReport, DayRequest};

/// Result for one day of a batch.
#[derive(Debug)]
pub struct BatchOutcome {
    pub date: NaiveDate,
    pub result: Result<DayReport>,
}

impl BatchOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Process every request on a pool of `config.workers` threads.
///
/// A failing day is logged and reported in its outcome; the other days are
/// unaffected. Outcomes are returned ordered by date. Only failure to build
/// the thread pool is reported as an error.
pub fn run_batch<S, W>(
    pipeline: &DailyPipeline<S, W>,
    requests: Vec<DayRequest>,
) -> Result<Vec<BatchOutcome>>
where
    S: GridSource,
    W: DailyGridWriter,
{
    let workers = pipeline.config().workers;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("daily-worker-{}", i))
        .build()
        .map_err(|e| AggregationError::InvalidConfig(format!("failed to create thread pool: {}", e)))?;

    info!(
        dataset = %pipeline.catalog().dataset,
        days = requests.len(),
        workers = workers,
        "Starting batch"
    );

    let mut outcomes: Vec<BatchOutcome> = pool.install(|| {
        requests
            .par_iter()
            .map(|request| {
                let result = pipeline.process_day(request);
                if let Err(e) = &result {
                    error!(
                        date = %request.date,
                        kind = e.kind(),
                        error = %e,
                        "Day failed"
                    );
                }
                BatchOutcome {
                    date: request.date,
                    result,
                }
            })
            .collect()
    });
    outcomes.sort_by_key(|o| o.date);

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    info!(
        days = outcomes.len(),
        succeeded = outcomes.len() - failed,
        failed = failed,
        "Batch complete"
    );

    Ok(outcomes)
}
