//! Hit URL formatting for the collector wire protocol.

use crate::{Environment, TrackerConfig};
use chrono::Local;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use tracker_outbox::{AudioAction, Event, HitFormatter};
use url::Url;

/// Formats events into `{subdomain}.{collector_domain}/hit.xiti?...` URLs.
///
/// Custom variables are read at format time, not enqueue time, so a
/// retried page view carries the variables current at delivery.
pub struct XitiFormatter {
    config: TrackerConfig,
    environment: Environment,
    custom_vars: Arc<RwLock<BTreeMap<String, String>>>,
}

impl XitiFormatter {
    /// New formatter over shared custom variables.
    pub fn new(
        config: TrackerConfig,
        environment: Environment,
        custom_vars: Arc<RwLock<BTreeMap<String, String>>>,
    ) -> Self {
        Self {
            config,
            environment,
            custom_vars,
        }
    }

    /// Local time formatted `HHxMMxSS`.
    fn formatted_time() -> String {
        Local::now().format("%Hx%Mx%S").to_string()
    }
}

impl HitFormatter for XitiFormatter {
    fn format_url(&self, event: &Event) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&format!(
            "{}.{}/hit.xiti",
            self.config.subdomain, self.config.collector_domain
        ))?;
        let mut query = url.query_pairs_mut();
        query
            .append_pair("s", &self.config.site_id)
            .append_pair("s2", event.level.as_deref().unwrap_or(""))
            .append_pair("p", &event.page)
            .append_pair("r", &self.environment.screen_properties())
            .append_pair("re", &self.environment.screen_size())
            .append_pair("hl", &Self::formatted_time())
            .append_pair("jv", if self.environment.java_enabled { "1" } else { "0" })
            .append_pair("lng", &self.environment.locale);

        match (event.action, event.event_type.as_deref()) {
            // audio taxonomy
            (Some(action), _) => {
                query
                    .append_pair("type", "audio")
                    .append_pair("m5", "int")
                    .append_pair("m6", "clip");
                if action == AudioAction::Refresh {
                    query.append_pair("a", "refresh");
                } else {
                    query.append_pair("a", action.as_str());
                    if let Some(duration) = &event.duration {
                        query.append_pair("m1", duration);
                    }
                    if let Some(context_page) = &event.context_page {
                        query.append_pair("prich", context_page);
                    }
                    if let Some(context_level) = &event.context_level {
                        query.append_pair("s2rich", context_level);
                    }
                    if let Some(quality_id) = &event.quality_id {
                        query.append_pair("m3", quality_id);
                    }
                }
            }
            // custom/click taxonomy
            (None, Some(event_type)) => {
                query.append_pair("clic", event_type);
            }
            // page view
            (None, None) => {
                if let Some(referrer) = &self.environment.referrer {
                    query.append_pair("ref", referrer);
                }
                let vars = self.custom_vars.read().expect("custom vars lock poisoned");
                for (key, value) in vars.iter() {
                    query.append_pair(key, value);
                }
            }
        }
        drop(query);
        Ok(url)
    }
}
