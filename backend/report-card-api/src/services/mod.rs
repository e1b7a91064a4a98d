use std::sync::Arc;

use crate::config::Config;

pub mod report_card;
pub mod translator;

use report_card::ReportCardService;

pub struct AppState {
    pub config: Config,
    pub report_cards: Arc<ReportCardService>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let report_cards = Arc::new(ReportCardService::new(config.report.clone()));

        tracing::info!(
            passing_score = config.report.passing_score,
            locale = %config.report.default_locale,
            max_batch_size = config.report.max_batch_size,
            "Report card service ready"
        );

        Self {
            config,
            report_cards,
        }
    }
}
