use metrics_exporter_prometheus::PrometheusHandle;
use ownership_flow::config::WorkflowConfig;
use ownership_flow::workflows::ownership::{
    CsvPrefillImporter, PrefillData, PrefillError, PrefillSource, StaticPrefill,
};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Prefill backing new sessions: a CSV export when configured, otherwise the
/// built-in demo company.
#[derive(Debug, Clone)]
pub(crate) enum SessionPrefill {
    Csv(CsvPrefillImporter),
    Builtin(StaticPrefill),
}

impl SessionPrefill {
    pub(crate) fn from_config(config: &WorkflowConfig) -> Self {
        match &config.prefill_csv {
            Some(path) => Self::Csv(CsvPrefillImporter::from_path(path.clone())),
            None => Self::Builtin(StaticPrefill::cactus_practice()),
        }
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Csv(importer) => format!("csv:{}", importer.path().display()),
            Self::Builtin(_) => "builtin".to_string(),
        }
    }
}

impl PrefillSource for SessionPrefill {
    fn load(&self) -> Result<PrefillData, PrefillError> {
        match self {
            Self::Csv(importer) => importer.load(),
            Self::Builtin(prefill) => prefill.load(),
        }
    }
}
