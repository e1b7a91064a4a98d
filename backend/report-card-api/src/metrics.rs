use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter_vec, Encoder, Histogram,
    HistogramVec, IntCounterVec, TextEncoder,
};

lazy_static! {
    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // Document Metrics
    pub static ref REPORT_CARDS_GENERATED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "report_cards_generated_total",
        "Total number of report card generations",
        &["period_type", "status"]
    )
    .unwrap();

    pub static ref REPORT_CARD_PAGES: Histogram = register_histogram!(
        "report_card_pages",
        "Pages per generated report card",
        vec![1.0, 2.0, 3.0, 4.0, 6.0, 8.0, 12.0]
    )
    .unwrap();

    pub static ref REPORT_CARD_RENDER_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "report_card_render_duration_seconds",
        "Time spent laying out and rendering one report card",
        &["period_type"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
    )
    .unwrap();
}

/// Renders all metrics in Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| prometheus::Error::Msg(format!("Failed to convert metrics to UTF-8: {}", e)))
}

/// Records the outcome of one generation. `period_type` is `unknown` when
/// the payload was rejected before it could be read.
pub fn record_generation(period_type: &str, status: &str, pages: Option<usize>, seconds: f64) {
    REPORT_CARDS_GENERATED_TOTAL
        .with_label_values(&[period_type, status])
        .inc();
    if let Some(pages) = pages {
        REPORT_CARD_PAGES.observe(pages as f64);
        REPORT_CARD_RENDER_DURATION_SECONDS
            .with_label_values(&[period_type])
            .observe(seconds);
    }
}
