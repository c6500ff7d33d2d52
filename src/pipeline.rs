use crate::{
    churn,
    clean,
    entities::{ChurnReport, UserId},
    error::Result,
    source::ActivitySource,
    timestamp::TimestampParsing,
};

#[derive(Debug, Clone)]
pub struct Analysis {
    pub days: u32,
    pub target: Option<UserId>,
    pub parsing: TimestampParsing,
}

impl Analysis {
    pub fn new(days: u32) -> Self {
        Self {
            days,
            target: None,
            parsing: TimestampParsing::default(),
        }
    }

    pub fn with_target(mut self, target: impl Into<UserId>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_parsing(mut self, parsing: TimestampParsing) -> Self {
        self.parsing = parsing;
        self
    }
}

/// Load, clean, classify and look up in one pass. Any error aborts the run.
pub async fn run<S: ActivitySource>(source: &S, analysis: &Analysis) -> Result<ChurnReport> {
    let snapshot = source.load().await?;

    let cleaned = clean::clean(&snapshot.refresh_events, &snapshot.active_users, analysis.parsing);
    drop(snapshot);

    let result = churn::classify(&cleaned.records, analysis.days)?;
    let status = analysis.target.as_ref().map(|target| result.status(target));

    if let (Some(target), Some(status)) = (&analysis.target, status) {
        tracing::debug!(%target, ?status, "looked up user");
    }

    Ok(ChurnReport {
        result,
        target: analysis.target.clone(),
        status,
        clean: cleaned.stats,
    })
}
