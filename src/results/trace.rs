//! Raw per-parameter sampling traces (`background_parameter00<i>.txt`).

use std::sync::OnceLock;

use tracing::debug;

use crate::domain::{ModelVariant, PRIOR_COUNT, ParameterName};
use crate::error::{PipelineError, Result};
use crate::io::layout::RunLayout;
use crate::io::table::read_table;
use crate::results::cached;

#[derive(Debug)]
pub struct TraceReader {
    run: RunLayout,
    cache: [OnceLock<Vec<f64>>; PRIOR_COUNT],
}

impl TraceReader {
    pub fn new(run: &RunLayout) -> Self {
        Self {
            run: run.clone(),
            cache: std::array::from_fn(|_| OnceLock::new()),
        }
    }

    /// Trace of `name`, flattened in file order.
    pub fn get(&self, name: ParameterName) -> Result<&[f64]> {
        ensure_fitted(self.run.variant(), name)?;
        let trace = cached(&self.cache[name.index()], || {
            let path = self.run.trace_file(name);
            debug!(path = %path.display(), parameter = %name, "reading trace");
            let values: Vec<f64> = read_table(&path)?.into_iter().flatten().collect();
            if values.is_empty() {
                return Err(PipelineError::value(format!("{}: trace is empty.", path.display())));
            }
            Ok(values)
        })?;
        Ok(trace.as_slice())
    }
}

pub(crate) fn ensure_fitted(variant: ModelVariant, name: ParameterName) -> Result<()> {
    if name.index() >= variant.param_count() {
        return Err(PipelineError::value(format!("{variant} does not fit parameter {name}.")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::layout::StarLayout;

    #[test]
    fn loads_lazily_per_parameter() {
        let tmp = tempfile::tempdir().unwrap();
        let run = StarLayout::new("KIC2", tmp.path()).run(ModelVariant::NoiseOnly);
        std::fs::create_dir_all(run.dir()).unwrap();
        std::fs::write(run.trace_file(ParameterName::LongTrendFrequency), "1.5\n1.6\n1.4\n").unwrap();

        let reader = TraceReader::new(&run);
        assert_eq!(reader.get(ParameterName::LongTrendFrequency).unwrap(), &[1.5, 1.6, 1.4]);
        assert!(reader.get(ParameterName::WhiteNoise).unwrap_err().is_missing_file());
        assert_eq!(reader.get(ParameterName::NuMax).unwrap_err().exit_code(), 3);
    }
}
