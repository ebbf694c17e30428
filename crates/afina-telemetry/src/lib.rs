use anyhow::Context;
use once_cell::sync::Lazy;
use prometheus::{CounterVec, Encoder, Opts, Registry, TextEncoder};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{fmt, EnvFilter};

static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);
static CLIENT_REQUESTS: Lazy<CounterVec> = Lazy::new(|| {
    let cv = CounterVec::new(
        Opts::new("afina_client_requests_total", "Backend requests by endpoint and outcome"),
        &["endpoint", "outcome"],
    )
    .expect("valid counter definition");
    REGISTRY.register(Box::new(cv.clone())).ok();
    cv
});

/// Install the global subscriber, appending to `log_file`.
///
/// The terminal belongs to the UI, so nothing is written to stdout.
pub fn init(log_file: &Path) -> anyhow::Result<()> {
    if let Some(dir) = log_file.parent() {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("opening {}", log_file.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file));
    // AFINA_LOG_JSON=1 switches to one JSON object per line
    let res = if std::env::var("AFINA_LOG_JSON").ok().as_deref() == Some("1") {
        fmt.json().try_init()
    } else {
        fmt.try_init()
    };
    res.map_err(|e| anyhow::anyhow!("installing tracing subscriber: {}", e))
}

pub fn inc_request(endpoint: &str, outcome: &str) {
    CLIENT_REQUESTS.with_label_values(&[endpoint, outcome]).inc();
}

pub fn gather_prometheus() -> String {
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    encoder.encode(&metric_families, &mut buffer).ok();
    String::from_utf8(buffer).unwrap_or_default()
}

/// One line per endpoint: `chat ok=3 error=1`.
pub fn summarize() -> Vec<String> {
    let mut by_endpoint: BTreeMap<String, BTreeMap<String, u64>> = BTreeMap::new();
    for family in REGISTRY.gather() {
        if family.get_name() != "afina_client_requests_total" { continue; }
        for m in family.get_metric() {
            let mut endpoint = String::new();
            let mut outcome = String::new();
            for l in m.get_label() {
                match l.get_name() {
                    "endpoint" => endpoint = l.get_value().to_string(),
                    "outcome" => outcome = l.get_value().to_string(),
                    _ => {}
                }
            }
            *by_endpoint.entry(endpoint).or_default().entry(outcome).or_insert(0) += m.get_counter().get_value() as u64;
        }
    }
    by_endpoint
        .into_iter()
        .map(|(endpoint, outcomes)| {
            let parts: Vec<String> = outcomes.iter().map(|(o, n)| format!("{}={}", o, n)).collect();
            format!("{} {}", endpoint, parts.join(" "))
        })
        .collect()
}
