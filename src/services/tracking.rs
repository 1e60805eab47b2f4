//! Tracking of analytics events and link clicks
//!
//! Payloads are free-form: every field is optional and absent (or null)
//! fields fall back to defaults, so a bare `{}` is a valid event.

use serde::Deserialize;
use tracing::info;

use crate::db::{AnalyticsEvent, ClientInfo, LinkInteraction, Metadata};
use crate::store::Stores;
use crate::types::Result;

const UNKNOWN: &str = "unknown";
/// Events of this type are also surfaced in the service log
pub const SCHEDULING_CLICK: &str = "scheduling_click";

/// `metadata.service_type` of a scheduling click, if given as a string
fn service_type(metadata: &Metadata) -> &str {
    metadata
        .get("service_type")
        .and_then(|value| value.as_str())
        .unwrap_or(UNKNOWN)
}

#[derive(Debug, Default, Deserialize)]
pub struct TrackEventRequest {
    pub event_type: Option<String>,
    pub element_id: Option<String>,
    pub session_id: Option<String>,
    pub page_url: Option<String>,
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LinkClickRequest {
    pub link_id: Option<String>,
    pub link_category: Option<String>,
    pub session_id: Option<String>,
    pub metadata: Option<Metadata>,
}

#[derive(Clone)]
pub struct TrackingService {
    stores: Stores,
}

impl TrackingService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// Record an analytics event, returning the stored record
    pub async fn track_event(
        &self,
        request: TrackEventRequest,
        client: &ClientInfo,
    ) -> Result<AnalyticsEvent> {
        let mut event = AnalyticsEvent::new(
            request.event_type.unwrap_or_else(|| UNKNOWN.to_string()),
            request.element_id.unwrap_or_default(),
            client,
        );
        event.session_id = request.session_id;
        event.page_url = request.page_url;
        event.metadata = request.metadata.unwrap_or_default();

        let s = &self.stores;
        let event = s.timed("append_event", s.activity.append_event(event)).await?;

        if event.event_type == SCHEDULING_CLICK {
            info!(
                service_type = service_type(&event.metadata),
                ip_address = event.ip_address.as_deref().unwrap_or(UNKNOWN),
                element_id = %event.element_id,
                "Scheduling click tracked"
            );
        }

        Ok(event)
    }

    /// Record a link click; the action type is always `click`
    pub async fn track_link_click(
        &self,
        request: LinkClickRequest,
        client: &ClientInfo,
    ) -> Result<LinkInteraction> {
        let interaction = LinkInteraction::new(
            request.link_id.unwrap_or_default(),
            request.link_category.unwrap_or_else(|| UNKNOWN.to_string()),
            "click",
            request.session_id,
            client,
        )
        .with_metadata(request.metadata.unwrap_or_default());

        let s = &self.stores;
        s.timed("append_interaction", s.activity.append_interaction(interaction))
            .await
    }
}
