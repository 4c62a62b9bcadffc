use std::path::{Path, PathBuf};
use tracing::info;

use crate::compose::{compose, Composition};
use crate::config::StudyConfig;
use crate::dataset::Table;
use crate::recode::{recode_missing, RecodeReport};
use crate::reliability::{ReliabilityAnalyzer, ReliabilityReport};
use crate::report::{
    correlate, describe, write_correlations, write_descriptives, write_frame, write_reliability,
    CorrelationTable, DescriptiveTable,
};
use crate::utils::PipelineError;

/// Receives progress from each stage; never influences control flow
pub trait PipelineObserver {
    fn recoded(&mut self, _report: &RecodeReport) {}
    fn reliability(&mut self, _report: &ReliabilityReport) {}
    fn composed(&mut self, _composition: &Composition) {}
    fn described(&mut self, _descriptives: &DescriptiveTable, _correlations: &CorrelationTable) {}
    fn written(&mut self, _path: &Path) {}
}

/// Observer that only logs through `tracing`
#[derive(Debug, Default)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn recoded(&mut self, report: &RecodeReport) {
        info!(recoded = report.total(), "sentinel codes recoded");
    }

    fn composed(&mut self, composition: &Composition) {
        info!(
            retained = composition.rows_after,
            of = composition.rows_before,
            "analysis sample built"
        );
    }

    fn written(&mut self, path: &Path) {
        info!(path = %path.display(), "output written");
    }
}

/// Everything a preprocessing run produced
#[derive(Debug, Clone)]
pub struct PreprocessOutcome {
    pub recode: RecodeReport,
    pub reliability: ReliabilityReport,
    pub composition: Composition,
    pub descriptives: DescriptiveTable,
    pub correlations: CorrelationTable,
}

/// Runs recoding, reliability, composition and reporting over one table
#[derive(Debug, Clone, Default)]
pub struct PreprocessEngine {
    config: StudyConfig,
}

impl PreprocessEngine {
    /// Create a new engine
    pub fn new(config: StudyConfig) -> Self {
        Self { config }
    }

    /// Run every stage in order; the table is recoded in place
    pub fn process(
        &self,
        table: &mut Table,
        observer: &mut dyn PipelineObserver,
    ) -> Result<PreprocessOutcome, PipelineError> {
        self.config.validate()?;

        let recode = recode_missing(table, &self.config.missing_codes)?;
        observer.recoded(&recode);

        let reliability = ReliabilityAnalyzer::new(self.config.min_reliability_rows)
            .analyze_scales(table, &self.config.scales)?;
        observer.reliability(&reliability);

        let composition = compose(table, &self.config)?;
        observer.composed(&composition);

        let described = self.config.descriptive_columns();
        let descriptives = describe(&composition.cleaned, &described)?;
        let correlations = correlate(&composition.cleaned, &described)?;
        observer.described(&descriptives, &correlations);

        Ok(PreprocessOutcome {
            recode,
            reliability,
            composition,
            descriptives,
            correlations,
        })
    }

    /// Write the analysis data, reliability summary, descriptives and
    /// correlations under `out_dir`
    pub fn write_outputs(
        &self,
        outcome: &PreprocessOutcome,
        out_dir: &Path,
        observer: &mut dyn PipelineObserver,
    ) -> Result<Vec<PathBuf>, PipelineError> {
        let files = &self.config.outputs;
        let analysis = out_dir.join(&files.analysis_data);
        let reliability = out_dir.join(&files.reliability);
        let descriptives = out_dir.join(&files.descriptives);
        let correlations = out_dir.join(&files.correlations);

        write_frame(&outcome.composition.output, &analysis)?;
        observer.written(&analysis);
        write_reliability(&outcome.reliability, &reliability)?;
        observer.written(&reliability);
        write_descriptives(&outcome.descriptives, &descriptives)?;
        observer.written(&descriptives);
        write_correlations(&outcome.correlations, &correlations)?;
        observer.written(&correlations);

        Ok(vec![analysis, reliability, descriptives, correlations])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recording {
        events: Vec<String>,
    }

    impl PipelineObserver for Recording {
        fn recoded(&mut self, _: &RecodeReport) {
            self.events.push("recoded".into());
        }
        fn reliability(&mut self, _: &ReliabilityReport) {
            self.events.push("reliability".into());
        }
        fn composed(&mut self, _: &Composition) {
            self.events.push("composed".into());
        }
        fn described(&mut self, _: &DescriptiveTable, _: &CorrelationTable) {
            self.events.push("described".into());
        }
        fn written(&mut self, path: &Path) {
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            self.events.push(name);
        }
    }

    fn survey_csv(rows: usize) -> String {
        let mut csv = String::from(
            "hazard_psy1,hazard_psy2,hazard_psy3,heal_prob1,heal_prob2,heal_prob3,\
weng1,weng2,weng3,gender,age,edu,emp_type\n",
        );
        for i in 0..rows {
            let h = i % 7 + 1;
            let p = (i * 3) % 7 + 1;
            let q = i % 2 + 1;
            let w = i % 5 + 1;
            csv.push_str(&format!(
                "{},{},{},{},{},{},{},{},{},{},{},{},{}\n",
                h,
                (h + p) % 7 + 1,
                p,
                q,
                (i / 2) % 2 + 1,
                q,
                w,
                (w + i % 3) % 5 + 1,
                w,
                i % 2 + 1,
                20 + i,
                i % 4 + 1,
                i % 3 + 1
            ));
        }
        csv
    }

    #[test]
    fn test_process_stage_order() {
        let mut table = Table::from_csv(&survey_csv(40)).unwrap();
        let engine = PreprocessEngine::default();
        let mut observer = Recording::default();

        let outcome = engine.process(&mut table, &mut observer).unwrap();

        assert_eq!(
            observer.events,
            vec!["recoded", "reliability", "composed", "described"]
        );
        assert_eq!(outcome.reliability.scales.len(), 3);
        assert_eq!(outcome.composition.output.ncols(), 10);
        assert_eq!(outcome.descriptives.variables.len(), 7);
        assert_eq!(outcome.correlations.values.dim(), (7, 7));
    }

    #[test]
    fn test_clean_sample_keeps_every_row() {
        let mut table = Table::from_csv(&survey_csv(30)).unwrap();
        let engine = PreprocessEngine::default();
        let outcome = engine.process(&mut table, &mut TracingObserver).unwrap();

        // weng items run 1..=5 and never hit 8/9; hazard items reach 7 only
        assert_eq!(outcome.recode.total(), 0);
        assert_eq!(outcome.composition.rows_after, 30);
    }

    #[test]
    fn test_process_recodes_in_place() {
        let mut csv = survey_csv(30);
        csv.push_str("8,2,3,1,1,1,9,3,3,1,40,2,1\n");
        csv.push_str("2,2,3,1,1,1,3,3,3,9,41,2,1\n");
        let mut table = Table::from_csv(&csv).unwrap();
        let engine = PreprocessEngine::default();
        let outcome = engine.process(&mut table, &mut TracingObserver).unwrap();

        assert_eq!(outcome.recode.total(), 2);
        assert_eq!(table.numeric("hazard_psy1").unwrap()[30], None);
        assert_eq!(table.numeric("weng1").unwrap()[30], None);
        // controls are not recoded, so the gender = 9 row is kept
        assert_eq!(table.numeric("gender").unwrap()[31], Some(9.0));
        assert_eq!(outcome.composition.rows_after, 31);
    }

    #[test]
    fn test_write_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = Table::from_csv(&survey_csv(25)).unwrap();
        let engine = PreprocessEngine::default();
        let mut observer = Recording::default();
        let outcome = engine.process(&mut table, &mut observer).unwrap();

        let paths = engine.write_outputs(&outcome, dir.path(), &mut observer).unwrap();
        assert_eq!(paths.len(), 4);
        assert!(paths.iter().all(|p| p.exists()));
        assert!(observer
            .events
            .contains(&"reliability_results_FULL_SAMPLE.csv".to_string()));
    }

    #[test]
    fn test_missing_column_aborts() {
        let mut table = Table::from_csv("hazard_psy1\n1\n").unwrap();
        let engine = PreprocessEngine::default();
        let result = engine.process(&mut table, &mut TracingObserver);
        assert!(matches!(result, Err(PipelineError::SchemaError { .. })));
    }
}
