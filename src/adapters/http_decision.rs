//! HTTP decision-service adapter.
//!
//! Implements [`DecisionPort`] with a blocking GET through
//! `esp_idf_svc::http::client`.  HTTPS endpoints are verified against
//! the ESP-IDF certificate bundle.  Every request runs on a fresh
//! connection bounded by the configured timeout, and a timeout surfaces
//! as [`DecisionError::Timeout`].
//!
//! On non-ESP targets there is no HTTP stack; every call reports
//! [`DecisionError::Transport`].

use log::debug;

use crate::app::decision::{WateringDecision, build_request_url};
#[cfg(target_os = "espidf")]
use crate::app::decision::{MAX_RESPONSE_BYTES, parse_decision_response};
use crate::app::ports::{DecisionPort, DecisionRequest};
use crate::config::DecisionServiceConfig;
use crate::error::DecisionError;

pub struct HttpDecisionClient {
    endpoint: String,
    timeout_ms: u32,
}

impl HttpDecisionClient {
    pub fn new(config: &DecisionServiceConfig) -> Self {
        Self {
            endpoint: config.endpoint_url.clone(),
            timeout_ms: config.request_timeout_ms,
        }
    }

    #[cfg(target_os = "espidf")]
    fn get(&self, url: &str) -> Result<WateringDecision, DecisionError> {
        use core::time::Duration;

        use embedded_svc::http::client::Client;
        use embedded_svc::io::Read;
        use esp_idf_svc::http::client::{Configuration, EspHttpConnection};
        use esp_idf_svc::io::EspIOError;
        use esp_idf_svc::sys::{ESP_ERR_HTTP_EAGAIN, ESP_ERR_TIMEOUT};

        fn classify(e: EspIOError) -> DecisionError {
            let code = e.0.code();
            if code == ESP_ERR_TIMEOUT as i32 || code == ESP_ERR_HTTP_EAGAIN as i32 {
                DecisionError::Timeout
            } else {
                debug!("decision: transport error {}", e);
                DecisionError::Transport
            }
        }

        let conn = EspHttpConnection::new(&Configuration {
            timeout: Some(Duration::from_millis(u64::from(self.timeout_ms))),
            crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
            ..Default::default()
        })
        .map_err(|e| {
            debug!("decision: connection setup failed {}", e);
            DecisionError::Transport
        })?;
        let mut client = Client::wrap(conn);

        let request = client.get(url).map_err(classify)?;
        let mut response = request.submit().map_err(classify)?;
        let status = response.status();

        // One byte of slack tells "exactly full" from "too large".
        let mut body = vec![0u8; MAX_RESPONSE_BYTES + 1];
        let mut len = 0;
        while len < body.len() {
            let n = response.read(&mut body[len..]).map_err(classify)?;
            if n == 0 {
                break;
            }
            len += n;
        }
        parse_decision_response(status, &body[..len])
    }

    #[cfg(not(target_os = "espidf"))]
    fn get(&self, url: &str) -> Result<WateringDecision, DecisionError> {
        debug!("decision(sim): no HTTP stack for {} (timeout {} ms)", url, self.timeout_ms);
        Err(DecisionError::Transport)
    }
}

impl DecisionPort for HttpDecisionClient {
    fn decide(&mut self, request: &DecisionRequest) -> Result<WateringDecision, DecisionError> {
        if self.endpoint.is_empty() {
            return Err(DecisionError::Transport);
        }
        let url = build_request_url(&self.endpoint, request);
        debug!("decision: GET {}", url);
        self.get(&url)
    }
}
