//! Process-wide logging and trace export
//!
//! Only the binary installs a subscriber; library code just emits `tracing`
//! events and spans, so tests run without any logging output. With Langfuse
//! keys configured, every span (one per chat turn, one per crew task) is also
//! exported over OTLP/HTTP.

use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD, Engine};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::{WithExportConfig, WithHttpConfig};
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::core::config::LangfuseConfig;
use crate::core::{AgentError, Result};

const SERVICE_NAME: &str = "aiagent";

/// Keeps the trace exporter alive; pending spans are flushed on drop.
pub struct TelemetryGuard {
    provider: Option<SdkTracerProvider>,
}

impl TelemetryGuard {
    /// Whether spans are being exported
    pub fn is_exporting(&self) -> bool {
        self.provider.is_some()
    }

    /// Flush all pending spans
    pub fn flush(&self) {
        if let Some(ref provider) = self.provider {
            let _ = provider.force_flush();
        }
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        self.flush();
        if let Some(provider) = self.provider.take() {
            let _ = provider.shutdown();
        }
    }
}

/// Langfuse authenticates OTLP requests with HTTP Basic auth
fn otlp_headers(public_key: &str, secret_key: &str) -> HashMap<String, String> {
    let token = STANDARD.encode(format!("{}:{}", public_key, secret_key));
    HashMap::from([("Authorization".to_string(), format!("Basic {}", token))])
}

fn tracer_provider(langfuse: &LangfuseConfig) -> Result<Option<SdkTracerProvider>> {
    let Some((public_key, secret_key)) = langfuse.credentials() else {
        return Ok(None);
    };

    let endpoint = langfuse.traces_endpoint();
    let headers = otlp_headers(public_key, secret_key);

    // The exporter's blocking HTTP client cannot be built on a runtime thread
    let exporter = std::thread::spawn(move || {
        opentelemetry_otlp::SpanExporter::builder()
            .with_http()
            .with_endpoint(endpoint)
            .with_headers(headers)
            .build()
    })
    .join()
    .map_err(|_| AgentError::Other("Trace exporter setup panicked".to_string()))?
    .map_err(|e| AgentError::Other(format!("Failed to build trace exporter: {}", e)))?;

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(
            opentelemetry_sdk::Resource::builder()
                .with_service_name(SERVICE_NAME)
                .build(),
        )
        .build();

    Ok(Some(provider))
}

/// Install a stderr logger, plus Langfuse export when both keys are set.
///
/// `RUST_LOG` wins when set; otherwise `debug` enables debug-level output and
/// everything else logs at info. Keep the returned guard alive until exit.
pub fn init_logging(debug: bool, langfuse: &LangfuseConfig) -> Result<TelemetryGuard> {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let provider = tracer_provider(langfuse)?;
    let otel_layer = provider
        .as_ref()
        .map(|p| tracing_opentelemetry::layer().with_tracer(p.tracer(SERVICE_NAME)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(otel_layer)
        .try_init()
        .map_err(|e| AgentError::Other(format!("Failed to initialize logging: {}", e)))?;

    if provider.is_some() {
        info!(endpoint = %langfuse.traces_endpoint(), "Exporting traces to Langfuse");
    }

    Ok(TelemetryGuard { provider })
}
