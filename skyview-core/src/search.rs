//! Suggestion search: a debounced geocoding lookup whose results are only
//! applied while they belong to the latest user action.
//!
//! [`SearchController`] is the synchronous state machine. It never waits on
//! anything; [`session::SearchSession`] drives it from timers and network
//! completions.

use crate::{
    config::SearchSettings,
    error::{ErrorCategory, WeatherError},
    generation::Generation,
    model::{Coordinates, SuggestionCandidate},
};

pub mod highlight;
pub mod session;

pub use highlight::{Segment, highlight};
pub use session::{SearchEvent, SearchSession};

/// What the suggestion list currently shows.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SearchState {
    #[default]
    Idle,
    AwaitingDebounce {
        query: String,
    },
    Fetching {
        query: String,
    },
    ShowingResults {
        query: String,
        candidates: Vec<SuggestionCandidate>,
    },
    ShowingError {
        query: String,
        category: ErrorCategory,
    },
    ShowingEmpty {
        query: String,
    },
}

impl SearchState {
    pub fn query(&self) -> Option<&str> {
        match self {
            Self::Idle => None,
            Self::AwaitingDebounce { query }
            | Self::Fetching { query }
            | Self::ShowingResults { query, .. }
            | Self::ShowingError { query, .. }
            | Self::ShowingEmpty { query } => Some(query),
        }
    }
}

/// Handed out on every keystroke; redeemed when the debounce delay elapses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebounceTicket {
    pub generation: Generation,
    pub query: String,
}

/// A geocoding lookup the driver should issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRequest {
    pub generation: Generation,
    pub query: String,
    pub limit: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    Applied,
    /// The result belonged to a superseded action and was dropped.
    Discarded,
}

/// A chosen suggestion, ready to drive a weather refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub display_name: String,
    pub candidate: SuggestionCandidate,
}

impl Selection {
    pub fn coordinates(&self) -> Coordinates {
        self.candidate.coordinates()
    }
}

#[derive(Debug)]
pub struct SearchController {
    state: SearchState,
    generation: Generation,
    field: String,
    limit: usize,
    min_query_len: usize,
}

impl SearchController {
    pub fn new(settings: &SearchSettings) -> Self {
        Self {
            state: SearchState::Idle,
            generation: Generation::default(),
            field: String::new(),
            limit: settings.limit,
            min_query_len: settings.min_query_len,
        }
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Current content of the search field.
    pub fn field(&self) -> &str {
        &self.field
    }

    fn supersede(&mut self) -> Generation {
        self.generation = self.generation.next();
        self.generation
    }

    /// New field content. Supersedes any pending timer and in-flight lookup.
    pub fn keystroke(&mut self, input: &str) -> DebounceTicket {
        self.field = input.to_string();
        let query = input.trim().to_string();
        let generation = self.supersede();

        self.state = SearchState::AwaitingDebounce { query: query.clone() };
        DebounceTicket { generation, query }
    }

    /// The debounce delay for `ticket` has passed.
    pub fn debounce_elapsed(&mut self, ticket: &DebounceTicket) -> Option<LookupRequest> {
        if ticket.generation != self.generation {
            tracing::debug!(ticket = %ticket.generation, "ignoring superseded debounce timer");
            return None;
        }

        if ticket.query.chars().count() < self.min_query_len {
            self.state = SearchState::Idle;
            return None;
        }

        self.state = SearchState::Fetching { query: ticket.query.clone() };
        Some(LookupRequest {
            generation: ticket.generation,
            query: ticket.query.clone(),
            limit: self.limit,
        })
    }

    /// Apply a finished lookup unless a later action has superseded it.
    pub fn apply_lookup(
        &mut self,
        generation: Generation,
        result: Result<Vec<SuggestionCandidate>, WeatherError>,
    ) -> LookupOutcome {
        if generation != self.generation {
            tracing::debug!(
                stale = %generation,
                current = %self.generation,
                "discarding stale suggestion result"
            );
            return LookupOutcome::Discarded;
        }

        let query = match &self.state {
            SearchState::Fetching { query } => query.clone(),
            other => {
                tracing::debug!(state = ?other, "lookup finished outside of fetching state");
                return LookupOutcome::Discarded;
            }
        };

        self.state = match result {
            Ok(mut candidates) if !candidates.is_empty() => {
                candidates.truncate(self.limit);
                SearchState::ShowingResults { query, candidates }
            }
            Ok(_) => SearchState::ShowingEmpty { query },
            Err(err) => {
                tracing::warn!(error = %err, query = %query, "suggestion lookup failed");
                SearchState::ShowingError { query, category: err.category() }
            }
        };
        LookupOutcome::Applied
    }

    /// Outside click or blur: clear the list right away.
    pub fn dismiss(&mut self) {
        self.supersede();
        self.state = SearchState::Idle;
    }

    /// Pick the suggestion at `index` of the visible list.
    pub fn select(&mut self, index: usize) -> Option<Selection> {
        let candidate = match &self.state {
            SearchState::ShowingResults { candidates, .. } => candidates.get(index)?.clone(),
            _ => return None,
        };

        let display_name = candidate.display_name();
        self.field = display_name.clone();
        self.supersede();
        self.state = SearchState::Idle;

        Some(Selection { display_name, candidate })
    }
}
