use prometheus::{
    Encoder, GaugeVec, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub assignments_total: IntCounterVec,
    pub assignment_latency_seconds: HistogramVec,
    pub employee_utilization: GaugeVec,
    pub scoring_fallbacks_total: IntCounterVec,
    pub travel_fallbacks_total: IntCounter,
    pub schedule_runs_total: IntCounterVec,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let assignments_total = IntCounterVec::new(
            Opts::new("assignments_total", "Total assignment requests by outcome"),
            &["outcome"],
        )
        .expect("valid assignments_total metric");

        let assignment_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "assignment_latency_seconds",
                "Latency of the assignment pipeline in seconds",
            ),
            &["outcome"],
        )
        .expect("valid assignment_latency_seconds metric");

        let employee_utilization = GaugeVec::new(
            Opts::new("employee_utilization", "Employee daily workload ratio [0..1]"),
            &["employee_id"],
        )
        .expect("valid employee_utilization metric");

        let scoring_fallbacks_total = IntCounterVec::new(
            Opts::new(
                "scoring_fallbacks_total",
                "Candidate selections served by the deterministic fallback",
            ),
            &["reason"],
        )
        .expect("valid scoring_fallbacks_total metric");

        let travel_fallbacks_total = IntCounter::new(
            "travel_fallbacks_total",
            "Travel estimates replaced by the default value",
        )
        .expect("valid travel_fallbacks_total metric");

        let schedule_runs_total = IntCounterVec::new(
            Opts::new("schedule_runs_total", "Weekly schedule runs by outcome"),
            &["outcome"],
        )
        .expect("valid schedule_runs_total metric");

        registry
            .register(Box::new(assignments_total.clone()))
            .expect("register assignments_total");
        registry
            .register(Box::new(assignment_latency_seconds.clone()))
            .expect("register assignment_latency_seconds");
        registry
            .register(Box::new(employee_utilization.clone()))
            .expect("register employee_utilization");
        registry
            .register(Box::new(scoring_fallbacks_total.clone()))
            .expect("register scoring_fallbacks_total");
        registry
            .register(Box::new(travel_fallbacks_total.clone()))
            .expect("register travel_fallbacks_total");
        registry
            .register(Box::new(schedule_runs_total.clone()))
            .expect("register schedule_runs_total");

        Self {
            registry,
            assignments_total,
            assignment_latency_seconds,
            employee_utilization,
            scoring_fallbacks_total,
            travel_fallbacks_total,
            schedule_runs_total,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
