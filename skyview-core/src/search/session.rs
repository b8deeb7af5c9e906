//! Async driver for [`SearchController`].
//!
//! One task owns the controller and handles every event to completion before
//! looking at the next one, so the controller needs no lock. A superseded
//! debounce timer is aborted outright. A superseded lookup keeps running; its
//! result is dropped by the generation check when it comes back.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};

use super::{DebounceTicket, SearchController, SearchState, Selection};
use crate::{
    config::SearchSettings, error::WeatherError, generation::Generation,
    model::SuggestionCandidate, provider::WeatherProvider,
};

/// Input from the user side of the search box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
    /// The field now contains this text.
    Input(String),
    /// Outside click or blur.
    Dismiss,
    /// Choose the suggestion at this index.
    Select(usize),
}

/// Completions fed back into the event loop.
#[derive(Debug)]
enum Completion {
    DebounceElapsed(DebounceTicket),
    LookupDone {
        generation: Generation,
        result: Result<Vec<SuggestionCandidate>, WeatherError>,
    },
}

/// Handle to a running search event loop.
#[derive(Debug)]
pub struct SearchSession {
    events: mpsc::UnboundedSender<SearchEvent>,
    state: watch::Receiver<SearchState>,
    task: JoinHandle<()>,
}

impl SearchSession {
    /// Start the event loop. Chosen suggestions arrive on the returned receiver.
    pub fn spawn(
        provider: Arc<dyn WeatherProvider>,
        settings: &SearchSettings,
    ) -> (Self, mpsc::UnboundedReceiver<Selection>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(SearchState::Idle);
        let (selections_tx, selections_rx) = mpsc::unbounded_channel();

        let event_loop = EventLoop {
            controller: SearchController::new(settings),
            provider,
            debounce_delay: settings.debounce(),
            pending_timer: None,
            completions: completions_tx,
            state: state_tx,
            selections: selections_tx,
        };
        let task = tokio::spawn(event_loop.run(events_rx, completions_rx));

        (Self { events: events_tx, state: state_rx, task }, selections_rx)
    }

    fn send(&self, event: SearchEvent) {
        if self.events.send(event).is_err() {
            tracing::warn!("search session is no longer running");
        }
    }

    pub fn input(&self, text: impl Into<String>) {
        self.send(SearchEvent::Input(text.into()));
    }

    pub fn dismiss(&self) {
        self.send(SearchEvent::Dismiss);
    }

    pub fn select(&self, index: usize) {
        self.send(SearchEvent::Select(index));
    }

    /// Watch the visible state.
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.clone()
    }

    pub fn current(&self) -> SearchState {
        self.state.borrow().clone()
    }

    /// Stop accepting input and wait for the loop to finish.
    pub async fn shutdown(self) {
        drop(self.events);
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "search session ended abnormally");
        }
    }
}

struct EventLoop {
    controller: SearchController,
    provider: Arc<dyn WeatherProvider>,
    debounce_delay: Duration,
    pending_timer: Option<JoinHandle<()>>,
    completions: mpsc::UnboundedSender<Completion>,
    state: watch::Sender<SearchState>,
    selections: mpsc::UnboundedSender<Selection>,
}

impl EventLoop {
    async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<SearchEvent>,
        mut completions: mpsc::UnboundedReceiver<Completion>,
    ) {
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.on_event(event),
                    None => break,
                },
                Some(completion) = completions.recv() => self.on_completion(completion),
            }
            self.publish();
        }

        self.cancel_timer();
        tracing::debug!("search session stopped");
    }

    fn on_event(&mut self, event: SearchEvent) {
        match event {
            SearchEvent::Input(text) => {
                self.cancel_timer();
                let ticket = self.controller.keystroke(&text);
                self.arm_timer(ticket);
            }
            SearchEvent::Dismiss => {
                self.cancel_timer();
                self.controller.dismiss();
            }
            SearchEvent::Select(index) => match self.controller.select(index) {
                Some(selection) => {
                    tracing::info!(place = %selection.display_name, "suggestion selected");
                    if self.selections.send(selection).is_err() {
                        tracing::debug!("nobody is listening for selections");
                    }
                }
                None => tracing::debug!(index, "selection ignored, no such suggestion"),
            },
        }
    }

    fn on_completion(&mut self, completion: Completion) {
        match completion {
            Completion::DebounceElapsed(ticket) => {
                self.pending_timer = None;
                if let Some(request) = self.controller.debounce_elapsed(&ticket) {
                    let provider = Arc::clone(&self.provider);
                    let completions = self.completions.clone();
                    tokio::spawn(async move {
                        let result = provider.geocode(&request.query, request.limit).await;
                        // The loop may be gone; the result is simply dropped then.
                        let _ = completions
                            .send(Completion::LookupDone { generation: request.generation, result });
                    });
                }
            }
            Completion::LookupDone { generation, result } => {
                self.controller.apply_lookup(generation, result);
            }
        }
    }

    fn arm_timer(&mut self, ticket: DebounceTicket) {
        let delay = self.debounce_delay;
        let completions = self.completions.clone();
        self.pending_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = completions.send(Completion::DebounceElapsed(ticket));
        }));
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.pending_timer.take() {
            timer.abort();
        }
    }

    fn publish(&self) {
        let next = self.controller.state();
        if *self.state.borrow() != *next {
            self.state.send_replace(next.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Coordinates, CurrentConditionsRaw, RawConditionsSample};
    use async_trait::async_trait;
    use std::{collections::HashMap, sync::Mutex};

    /// Answers geocoding after a per-query delay and records every call.
    #[derive(Debug, Default)]
    struct SlowGeocoder {
        delays: HashMap<String, Duration>,
        calls: Mutex<Vec<String>>,
    }

    impl SlowGeocoder {
        fn with_delays(delays: &[(&str, u64)]) -> Arc<Self> {
            Arc::new(Self {
                delays: delays
                    .iter()
                    .map(|(q, ms)| (q.to_string(), Duration::from_millis(*ms)))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().expect("calls lock").clone()
        }
    }

    #[async_trait]
    impl WeatherProvider for SlowGeocoder {
        async fn fetch_current(&self, _at: Coordinates) -> Result<CurrentConditionsRaw, WeatherError> {
            Err(WeatherError::Parse("not used".into()))
        }

        async fn fetch_forecast_series(
            &self,
            _at: Coordinates,
        ) -> Result<Vec<RawConditionsSample>, WeatherError> {
            Err(WeatherError::Parse("not used".into()))
        }

        async fn geocode(
            &self,
            query: &str,
            _limit: usize,
        ) -> Result<Vec<SuggestionCandidate>, WeatherError> {
            self.calls.lock().expect("calls lock").push(query.to_string());
            let delay = self.delays.get(query).copied().unwrap_or_default();
            tokio::time::sleep(delay).await;
            Ok(vec![SuggestionCandidate {
                name: format!("{query} Town"),
                latitude: 1.0,
                longitude: 2.0,
                country: "GB".into(),
                state: None,
            }])
        }
    }

    fn results_for(state: &SearchState) -> Option<(&str, &str)> {
        match state {
            SearchState::ShowingResults { query, candidates } => {
                Some((query.as_str(), candidates[0].name.as_str()))
            }
            _ => None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn later_query_wins_when_responses_arrive_reversed() {
        let provider = SlowGeocoder::with_delays(&[("Lon", 1_000), ("London", 100)]);
        let (session, _selections) = SearchSession::spawn(provider.clone(), &SearchSettings::default());
        let mut state = session.subscribe();

        session.input("Lon");
        tokio::time::sleep(Duration::from_millis(350)).await;
        assert_eq!(session.current(), SearchState::Fetching { query: "Lon".into() });

        session.input("London");
        state
            .wait_for(|s| matches!(results_for(s), Some(("London", _))))
            .await
            .expect("session alive");

        // Let the slow "Lon" lookup land.
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(results_for(&session.current()), Some(("London", "London Town")));
        assert_eq!(provider.calls(), vec!["Lon".to_string(), "London".to_string()]);

        session.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_typing_issues_one_lookup() {
        let provider = SlowGeocoder::with_delays(&[]);
        let (session, _selections) = SearchSession::spawn(provider.clone(), &SearchSettings::default());

        for text in ["Be", "Ber", "Berl", "Berlin"] {
            session.input(text);
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(provider.calls(), vec!["Berlin".to_string()]);
        assert_eq!(results_for(&session.current()), Some(("Berlin", "Berlin Town")));
        session.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn short_query_clears_without_lookup() {
        let provider = SlowGeocoder::with_delays(&[]);
        let (session, _selections) = SearchSession::spawn(provider.clone(), &SearchSettings::default());

        session.input("B");
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert_eq!(session.current(), SearchState::Idle);
        assert!(provider.calls().is_empty());
        session.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn dismiss_clears_and_suppresses_in_flight_result() {
        let provider = SlowGeocoder::with_delays(&[("Oslo", 500)]);
        let (session, _selections) = SearchSession::spawn(provider.clone(), &SearchSettings::default());

        session.input("Oslo");
        tokio::time::sleep(Duration::from_millis(350)).await;
        session.dismiss();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(session.current(), SearchState::Idle);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(session.current(), SearchState::Idle);
        assert_eq!(provider.calls(), vec!["Oslo".to_string()]);
        session.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn selection_is_forwarded_and_list_cleared() {
        let provider = SlowGeocoder::with_delays(&[]);
        let (session, mut selections) =
            SearchSession::spawn(provider.clone(), &SearchSettings::default());
        let mut state = session.subscribe();

        session.input("Paris");
        state
            .wait_for(|s| results_for(s).is_some())
            .await
            .expect("session alive");
        session.select(0);

        let selection = selections.recv().await.expect("selection sent");
        assert_eq!(selection.display_name, "Paris Town, GB");
        assert_eq!(selection.coordinates(), Coordinates::new(1.0, 2.0));
        state.wait_for(|s| *s == SearchState::Idle).await.expect("session alive");
        session.shutdown().await;
    }
}
