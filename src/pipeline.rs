//! Ordered chain of table-to-table cleaning steps.

use tracing::{info, instrument};

use crate::{
    config::Settings,
    data::{
        filters::{self, DEFAULT_PERIODS, NON_PARTY_CODES},
        parties,
        speeches::SpeechTable,
    },
    error::PipelineError,
    nlp::{
        boilerplate::{BoilerplateTrimmer, ENDING_PERCENTILE, GREETING_PERCENTILE},
        commentary,
    },
    topics::TopicSource,
};

type Transform = Box<dyn Fn(SpeechTable) -> Result<SpeechTable, PipelineError>>;

/// One named transformation.
pub struct Step {
    pub name: &'static str,
    apply: Transform,
}

impl Step {
    pub fn new<F>(name: &'static str, apply: F) -> Self
    where
        F: Fn(SpeechTable) -> Result<SpeechTable, PipelineError> + 'static,
    {
        Self {
            name,
            apply: Box::new(apply),
        }
    }

    /// Wrap a transformation that cannot fail.
    pub fn infallible<F>(name: &'static str, apply: F) -> Self
    where
        F: Fn(SpeechTable) -> SpeechTable + 'static,
    {
        Self::new(name, move |table| Ok(apply(table)))
    }
}

/// Tunables of the standard cleaning chain.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub keep_periods: Vec<i64>,
    pub greeting_percentile: f64,
    pub ending_percentile: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            keep_periods: DEFAULT_PERIODS.to_vec(),
            greeting_percentile: GREETING_PERCENTILE,
            ending_percentile: ENDING_PERCENTILE,
        }
    }
}

impl From<&Settings> for PipelineConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            keep_periods: settings.keep_periods.clone(),
            greeting_percentile: settings.greeting_percentile,
            ending_percentile: settings.ending_percentile,
        }
    }
}

#[derive(Default)]
pub struct Pipeline {
    steps: Vec<Step>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name).collect()
    }

    /// Filters, party metadata, commentary and boilerplate removal, then topics.
    ///
    /// Blocks are assigned before party codes are consolidated; the block
    /// table covers both raw and consolidated codes.
    pub fn standard(config: &PipelineConfig, topics: TopicSource) -> Self {
        let periods = config.keep_periods.clone();
        let greetings = BoilerplateTrimmer::greetings().with_percentile(config.greeting_percentile);
        let endings = BoilerplateTrimmer::endings().with_percentile(config.ending_percentile);
        Self::new()
            .step(Step::infallible("drop_non_party", |t| {
                filters::drop_non_party(t, NON_PARTY_CODES)
            }))
            .step(Step::infallible("keep_periods", move |t| {
                filters::keep_periods(t, &periods)
            }))
            .step(Step::infallible("drop_duplicate_text", filters::drop_duplicate_text))
            .step(Step::new("add_block_year_agenda", parties::add_block_year_agenda))
            .step(Step::new("consolidate_parties", parties::consolidate_parties))
            .step(Step::infallible("strip_commentary", commentary::strip_commentary))
            .step(Step::infallible("remove_greetings", move |t| greetings.apply(t)))
            .step(Step::infallible("remove_endings", move |t| endings.apply(t)))
            .step(Step::new("assign_topics", move |t| topics.apply(t)))
    }

    /// Run every step in order, logging row deltas.
    #[instrument(skip_all, fields(steps = self.steps.len(), rows = table.len()))]
    pub fn run(&self, table: SpeechTable) -> Result<SpeechTable, PipelineError> {
        let start = table.len();
        let mut table = table;
        for step in &self.steps {
            let before = table.len();
            table = (step.apply)(table)?;
            let after = table.len();
            if after != before {
                info!(step = step.name, before, after, "step changed row count");
            }
        }
        info!(start, finish = table.len(), "pipeline finished");
        Ok(table)
    }
}
