//! Tracker session: validation, gating, and the audio refresh timer.

use crate::{Environment, TrackerConfig, TrackerError, TrackerResult, XitiFormatter};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, OnceLock, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use tracker_outbox::{AudioAction, DeliveryQueue, DurableLog, Event, Transport};
use tracker_storage::KeyValueStore;

/// Page view trigger parameters.
#[derive(Debug, Clone, Default)]
pub struct PageViewParams {
    /// Page path, `::`-delimited chapter syntax. Required.
    pub page: Option<String>,
    /// Site level. Required.
    pub level: Option<String>,
}

/// Custom/click event trigger parameters.
#[derive(Debug, Clone, Default)]
pub struct CustomEventParams {
    /// Click type (e.g. `A` for action). Required.
    pub event_type: Option<String>,
    /// Page path. Required.
    pub page: Option<String>,
    /// Site level. Required.
    pub level: Option<String>,
}

/// Audio event trigger parameters.
#[derive(Debug, Clone, Default)]
pub struct AudioEventParams {
    /// Sound page path. Required.
    pub page: Option<String>,
    /// Sound level. Required.
    pub level: Option<String>,
    /// Playback action. Required.
    pub action: Option<AudioAction>,
    /// Duration in milliseconds. Required.
    pub duration: Option<String>,
    /// Page the sound is playing on. Required.
    pub context_page: Option<String>,
    /// Level of the context page. Required.
    pub context_level: Option<String>,
    /// Playback quality identifier. Optional.
    pub quality_id: Option<String>,
}

/// Session state behind the public API.
///
/// Replaces the global mutable state of a maintag-style tracker with an
/// explicit object; re-initialization is rejected by checking this field.
enum SessionState {
    Uninitialized,
    /// Storage probe failed: every trigger is a silent no-op.
    Disabled,
    Active(Session),
}

struct Session {
    queue: Arc<DeliveryQueue>,
    custom_vars: Arc<RwLock<BTreeMap<String, String>>>,
    refresh_interval: Duration,
}

/// The public tracking API.
///
/// Construct once with the storage and transport to use, then `initialize`
/// with the site configuration. Triggers validate their parameters, hand a
/// validated event to the delivery queue, and return before delivery
/// settles.
pub struct Tracker {
    store: Arc<dyn KeyValueStore>,
    transport: Arc<dyn Transport>,
    environment: Environment,
    session: tokio::sync::RwLock<SessionState>,
    /// First storage probe result, cached for the life of the session.
    availability: OnceLock<bool>,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
}

impl Tracker {
    /// Create an uninitialized tracker.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        transport: Arc<dyn Transport>,
        environment: Environment,
    ) -> Self {
        Self {
            store,
            transport,
            environment,
            session: tokio::sync::RwLock::new(SessionState::Uninitialized),
            availability: OnceLock::new(),
            refresh_task: Mutex::new(None),
        }
    }

    /// Initialize the session and recover the durable queue.
    ///
    /// Fails fast on incomplete configuration or double initialization.
    /// If the storage probe fails the session is silently disabled: this
    /// and every later trigger return Ok without doing anything.
    pub async fn initialize(&self, config: TrackerConfig) -> TrackerResult<()> {
        config.validate()?;

        let mut session = self.session.write().await;
        if !matches!(*session, SessionState::Uninitialized) {
            return Err(TrackerError::AlreadyInitialized);
        }

        let available = *self.availability.get_or_init(|| self.store.is_available());
        if !available {
            info!("durable storage unavailable, tracking disabled for this session");
            *session = SessionState::Disabled;
            return Ok(());
        }

        let custom_vars = Arc::new(RwLock::new(BTreeMap::new()));
        let formatter = Arc::new(XitiFormatter::new(
            config.clone(),
            self.environment.clone(),
            Arc::clone(&custom_vars),
        ));
        let queue = Arc::new(DeliveryQueue::new(
            DurableLog::new(Arc::clone(&self.store)),
            formatter,
            Arc::clone(&self.transport),
        ));
        queue.initialize().await?;

        *session = SessionState::Active(Session {
            queue,
            custom_vars,
            refresh_interval: config.audio_refresh_interval,
        });
        info!(site_id = %config.site_id, subdomain = %config.subdomain, "tracker initialized");
        Ok(())
    }

    /// Track a page view.
    pub async fn track_page_view(&self, params: PageViewParams) -> TrackerResult<()> {
        let session = self.session.read().await;
        let Some(session) = active(&session)? else {
            return Ok(());
        };
        let page = required(params.page, "page")?;
        let level = required(params.level, "level")?;
        session.queue.enqueue(Event::page_view(page, level)).await?;
        Ok(())
    }

    /// Track a custom/click event.
    pub async fn track_custom_event(&self, params: CustomEventParams) -> TrackerResult<()> {
        let session = self.session.read().await;
        let Some(session) = active(&session)? else {
            return Ok(());
        };
        let event_type = required(params.event_type, "type")?;
        let page = required(params.page, "page")?;
        let level = required(params.level, "level")?;
        session
            .queue
            .enqueue(Event::custom(event_type, page, level))
            .await?;
        Ok(())
    }

    /// Track an audio event.
    ///
    /// A `play` action starts a periodic task that emits a fresh
    /// `action=refresh` event per tick; `pause` and `stop` cancel it.
    pub async fn track_audio_event(&self, params: AudioEventParams) -> TrackerResult<()> {
        let session = self.session.read().await;
        let Some(session) = active(&session)? else {
            return Ok(());
        };
        let action = params.action.ok_or(TrackerError::MissingField("action"))?;
        let event = Event::audio(
            required(params.page, "page")?,
            required(params.level, "level")?,
            action,
            required(params.duration, "duration")?,
            required(params.context_page, "contextPage")?,
            required(params.context_level, "contextLevel")?,
            params.quality_id.filter(|q| !q.is_empty()),
        );
        session.queue.enqueue(event.clone()).await?;

        match action {
            AudioAction::Play => {
                self.start_refresh(session, event);
            }
            AudioAction::Pause | AudioAction::Stop => self.cancel_refresh(),
            AudioAction::Refresh => {}
        }
        Ok(())
    }

    /// Replace the session's custom variables.
    ///
    /// Variables are appended to page-view hit URLs as bare `key=value`
    /// pairs, read at delivery time.
    pub async fn set_custom_variables(
        &self,
        vars: BTreeMap<String, String>,
    ) -> TrackerResult<()> {
        let session = self.session.read().await;
        let Some(session) = active(&session)? else {
            return Ok(());
        };
        *session.custom_vars.write().expect("custom vars lock poisoned") = vars;
        debug!("custom variables replaced");
        Ok(())
    }

    /// Number of events currently pending delivery.
    pub async fn pending_count(&self) -> TrackerResult<usize> {
        let session = self.session.read().await;
        match active(&session)? {
            Some(session) => Ok(session.queue.pending_count()?),
            None => Ok(0),
        }
    }

    fn start_refresh(&self, session: &Session, play_event: Event) {
        let queue = Arc::clone(&session.queue);
        let interval = session.refresh_interval;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // the first tick completes immediately; the play event itself
            // already went out
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = queue.enqueue(play_event.refresh_tick()).await {
                    warn!(error = %e, "refresh tick could not be enqueued");
                }
            }
        });
        let previous = self
            .refresh_task
            .lock()
            .expect("refresh task lock poisoned")
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
        debug!(interval_secs = interval.as_secs_f64(), "audio refresh started");
    }

    fn cancel_refresh(&self) {
        let handle = self
            .refresh_task
            .lock()
            .expect("refresh task lock poisoned")
            .take();
        if let Some(handle) = handle {
            handle.abort();
            debug!("audio refresh cancelled");
        }
    }
}

impl Drop for Tracker {
    fn drop(&mut self) {
        self.cancel_refresh();
    }
}

/// Gate a trigger on the session state.
///
/// Uninitialized is an error; a disabled session no-ops (None); an active
/// session proceeds. Gating runs before field validation, mirroring how a
/// storage-less browser session swallows pushes without inspecting them.
fn active(state: &SessionState) -> TrackerResult<Option<&Session>> {
    match state {
        SessionState::Uninitialized => Err(TrackerError::NotInitialized),
        SessionState::Disabled => Ok(None),
        SessionState::Active(session) => Ok(Some(session)),
    }
}

/// Require a non-empty field value.
fn required(value: Option<String>, name: &'static str) -> TrackerResult<String> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(TrackerError::MissingField(name)),
    }
}
