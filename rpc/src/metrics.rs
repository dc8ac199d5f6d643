//! Prometheus metrics for the API surface.

use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

/// Counters exposed at `/metrics`.
pub struct Metrics {
    registry: Registry,
    pub requests_total: IntCounter,
    pub challenges_issued: IntCounter,
    pub identities_created: IntCounter,
    pub tax_ids_issued: IntCounter,
    pub entities_registered: IntCounter,
    pub invoices_recorded: IntCounter,
    pub evaluations_served: IntCounter,
    pub unauthorized_requests: IntCounter,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();
        let requests_total = counter(&registry, "praman_requests_total", "HTTP requests received");
        let challenges_issued = counter(&registry, "praman_challenges_issued_total", "Challenges issued");
        let identities_created =
            counter(&registry, "praman_identities_created_total", "Identity profiles created");
        let tax_ids_issued = counter(&registry, "praman_tax_ids_issued_total", "Tax identifiers issued");
        let entities_registered =
            counter(&registry, "praman_entities_registered_total", "Business entities registered");
        let invoices_recorded = counter(&registry, "praman_invoices_recorded_total", "Invoices recorded");
        let evaluations_served =
            counter(&registry, "praman_evaluations_served_total", "External evaluations served");
        let unauthorized_requests = counter(
            &registry,
            "praman_unauthorized_requests_total",
            "Requests rejected by credential checks",
        );
        Self {
            registry,
            requests_total,
            challenges_issued,
            identities_created,
            tax_ids_issued,
            entities_registered,
            invoices_recorded,
            evaluations_served,
            unauthorized_requests,
        }
    }

    /// Render all counters in the Prometheus text exposition format.
    pub fn render(&self) -> String {
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        if encoder
            .encode(&self.registry.gather(), &mut buf)
            .is_err()
        {
            return String::new();
        }
        String::from_utf8(buf).unwrap_or_default()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

fn counter(registry: &Registry, name: &str, help: &str) -> IntCounter {
    let counter = IntCounter::new(name, help).expect("valid counter options");
    registry
        .register(Box::new(counter.clone()))
        .expect("counter registered once");
    counter
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_appear_in_rendered_output() {
        let metrics = Metrics::new();
        metrics.identities_created.inc();
        let rendered = metrics.render();
        assert!(rendered.contains("praman_identities_created_total 1"));
        assert!(rendered.contains("praman_challenges_issued_total 0"));
    }
}
