//! View state - everything the dashboard shows, mutated by event handlers

use std::time::{Duration, Instant};

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::counter::{count_key, CompletionCounts, Outcome};
use crate::db::Database;
use crate::loader::{LoadError, LoadState};
use crate::plan::{find_session, Group, Session, WorkoutPlan};
use crate::selection::{advance, initial_selection, on_date_changed, Direction, GroupPolicy};

/// How long the celebration stays on screen
pub const CELEBRATION: Duration = Duration::from_secs(5);

/// Fade-out before a swiped group change is applied
pub const FADE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy)]
struct Fade {
    due: Instant,
    direction: Direction,
}

pub struct ViewState {
    pub load: LoadState,
    pub selected_date: Option<NaiveDate>,
    pub selected_title: Option<String>,
    pub counts: CompletionCounts,
    policy: GroupPolicy,
    swipe_threshold: i32,
    celebrate_until: Option<Instant>,
    touch_start_x: Option<i32>,
    touch_end_x: Option<i32>,
    fade: Option<Fade>,
}

impl ViewState {
    pub fn new(counts: CompletionCounts, policy: GroupPolicy, swipe_threshold: i32) -> Self {
        Self {
            load: LoadState::Loading,
            selected_date: None,
            selected_title: None,
            counts,
            policy,
            swipe_threshold,
            celebrate_until: None,
            touch_start_x: None,
            touch_end_x: None,
            fade: None,
        }
    }

    /// Back to "Loading..." for a fresh load
    pub fn start_reload(&mut self, counts: CompletionCounts) {
        self.load = LoadState::Loading;
        self.counts = counts;
        self.fade = None;
    }

    /// Apply the result of a plan load
    pub fn on_loaded(&mut self, result: Result<WorkoutPlan, LoadError>, today: NaiveDate) {
        match result {
            Ok(plan) => {
                match initial_selection(&plan, &self.counts, today, self.policy) {
                    Some(selection) => {
                        info!("Initial selection: {} / {:?}", selection.date, selection.title);
                        self.selected_date = Some(selection.date);
                        self.selected_title = selection.title;
                    }
                    None => {
                        self.selected_date = None;
                        self.selected_title = None;
                    }
                }
                self.load = LoadState::Ready(plan);
            }
            Err(e) => {
                warn!("Plan load failed: {}", e);
                self.load = LoadState::Error(e.to_string());
            }
        }
    }

    pub fn plan(&self) -> &[Session] {
        self.load.plan().map(Vec::as_slice).unwrap_or_default()
    }

    pub fn current_session(&self) -> Option<&Session> {
        find_session(self.plan(), self.selected_date?)
    }

    pub fn current_group(&self) -> Option<&Group> {
        let title = self.selected_title.as_deref()?;
        self.current_session()?.group(title)
    }

    /// `(count, frequency)` for the group on screen
    pub fn current_count(&self) -> Option<(u32, u32)> {
        let session = self.current_session()?;
        let group = self.current_group()?;
        Some((self.counts.get(&count_key(session.date, &group.title)), group.frequency))
    }

    /// New date from the menu; the group resets to the session's first one
    pub fn select_date(&mut self, date: NaiveDate) {
        self.selected_date = Some(date);
        if let Some(title) = on_date_changed(self.plan(), date) {
            self.selected_title = Some(title);
        }
    }

    pub fn select_title(&mut self, title: &str) {
        self.selected_title = Some(title.to_string());
    }

    /// Count one completion of the selected group and persist it
    pub fn increment_selected(&mut self, db: &Database, now: Instant) -> Option<Outcome> {
        let session = self.current_session()?;
        let title = self.selected_title.clone()?;
        let frequency = session.group(&title).map(|g| g.frequency).unwrap_or(1);
        let key = count_key(session.date, &title);

        let (counts, outcome) = self.counts.increment(&key, frequency);
        if outcome.changed {
            self.counts = counts;
            self.persist(db);
        }
        if outcome.target_reached {
            info!("Target reached for {}", key);
            self.celebrate_until = Some(now + CELEBRATION);
        }
        Some(outcome)
    }

    /// Take back one completion of the selected group and persist it
    pub fn decrement_selected(&mut self, db: &Database) {
        let (Some(session), Some(title)) = (self.current_session(), self.selected_title.as_deref())
        else {
            return;
        };
        let key = count_key(session.date, title);
        if self.counts.get(&key) == 0 {
            return;
        }
        self.counts = self.counts.decrement(&key);
        self.persist(db);
    }

    fn persist(&self, db: &Database) {
        if let Err(e) = db.save_counts(&self.counts) {
            warn!("Failed to save completion counts: {}", e);
        }
    }

    pub fn touch_start(&mut self, x: i32) {
        self.touch_start_x = Some(x);
    }

    pub fn touch_move(&mut self, x: i32) {
        self.touch_end_x = Some(x);
    }

    /// Finish a gesture: swiping left goes to the next group, right to the previous
    pub fn touch_end(&mut self, now: Instant) {
        if let (Some(start), Some(end)) = (self.touch_start_x, self.touch_end_x) {
            let distance = start - end;
            if distance > self.swipe_threshold {
                self.step(Direction::Next, now);
            } else if distance < -self.swipe_threshold {
                self.step(Direction::Previous, now);
            }
        }
        self.touch_start_x = None;
        self.touch_end_x = None;
    }

    /// Fade out, then move to the neighbouring group
    pub fn step(&mut self, direction: Direction, now: Instant) {
        self.fade = Some(Fade { due: now + FADE, direction });
    }

    /// Advance timers: apply a due fade and clear an expired celebration
    pub fn tick(&mut self, now: Instant) {
        if let Some(fade) = self.fade
            && now >= fade.due
        {
            self.fade = None;
            self.apply_step(fade.direction);
        }
        if self.celebrate_until.is_some_and(|until| now >= until) {
            self.celebrate_until = None;
        }
    }

    fn apply_step(&mut self, direction: Direction) {
        let next = match (self.current_session(), self.selected_title.as_deref()) {
            (Some(session), Some(title)) => advance(session, title, direction),
            _ => None,
        };
        if let Some(title) = next {
            self.selected_title = Some(title);
        }
    }

    /// Content is faded out while a group change is pending
    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    pub fn is_celebrating(&self) -> bool {
        self.celebrate_until.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::parse_plan;

    const DOC: &str = r#"[
        {"date":"2024-01-01","notes":"first","workout":[
            {"title":"A","frequency":2,"exercises":[]},
            {"title":"B","frequency":1,"exercises":[]}
        ]},
        {"date":"2024-03-01","notes":"second","workout":[
            {"title":"C","frequency":1,"exercises":[]},
            {"title":"D","frequency":1,"exercises":[]},
            {"title":"E","frequency":1,"exercises":[]}
        ]}
    ]"#;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn loaded(counts: CompletionCounts, today: NaiveDate) -> ViewState {
        let mut view = ViewState::new(counts, GroupPolicy::LeastCompleted, 10);
        view.on_loaded(Ok(parse_plan(DOC).unwrap()), today);
        view
    }

    #[test]
    fn test_starts_loading() {
        let view = ViewState::new(CompletionCounts::new(), GroupPolicy::First, 10);
        assert_eq!(view.load, LoadState::Loading);
        assert!(view.current_session().is_none());
    }

    #[test]
    fn test_loaded_seeds_selection() {
        let view = loaded(CompletionCounts::new(), date(2024, 6, 1));
        assert_eq!(view.selected_date, Some(date(2024, 3, 1)));
        assert_eq!(view.selected_title.as_deref(), Some("C"));
        assert_eq!(view.current_session().unwrap().notes, "second");
    }

    #[test]
    fn test_loaded_uses_least_completed() {
        let counts = CompletionCounts::new().increment("2024-03-01-C", 1).0;
        let view = loaded(counts, date(2024, 6, 1));
        assert_eq!(view.selected_title.as_deref(), Some("D"));
    }

    #[test]
    fn test_load_error_is_shown() {
        let mut view = ViewState::new(CompletionCounts::new(), GroupPolicy::First, 10);
        view.on_loaded(
            Err(LoadError::NotFound { identifier: "alice".into(), reason: "404".into() }),
            date(2024, 1, 1),
        );
        assert_eq!(view.load, LoadState::Error("Could not find data for alice".into()));
    }

    #[test]
    fn test_empty_plan_shows_nothing() {
        let mut view = ViewState::new(CompletionCounts::new(), GroupPolicy::First, 10);
        view.on_loaded(Ok(vec![]), date(2024, 1, 1));
        assert!(view.selected_date.is_none());
        assert!(view.current_group().is_none());
        assert!(view.current_count().is_none());
    }

    #[test]
    fn test_select_date_resets_title() {
        let mut view = loaded(CompletionCounts::new(), date(2024, 6, 1));
        view.select_title("E");
        view.select_date(date(2024, 1, 1));
        assert_eq!(view.selected_title.as_deref(), Some("A"));
    }

    #[test]
    fn test_unknown_title_shows_nothing() {
        let mut view = loaded(CompletionCounts::new(), date(2024, 6, 1));
        view.select_title("Nope");
        assert!(view.current_group().is_none());
        assert!(view.current_count().is_none());
    }

    #[test]
    fn test_increment_persists_and_celebrates() {
        let db = Database::open_in_memory().unwrap();
        let mut view = loaded(CompletionCounts::new(), date(2024, 2, 1));
        let now = Instant::now();

        let first = view.increment_selected(&db, now).unwrap();
        assert!(!first.target_reached);
        assert!(!view.is_celebrating());
        assert_eq!(db.load_counts().get("2024-01-01-A"), 1);

        let second = view.increment_selected(&db, now).unwrap();
        assert!(second.target_reached);
        assert!(view.is_celebrating());
        assert_eq!(view.current_count(), Some((2, 2)));

        view.tick(now + CELEBRATION);
        assert!(!view.is_celebrating());

        let third = view.increment_selected(&db, now).unwrap();
        assert!(!third.changed);
        assert!(!view.is_celebrating());
    }

    #[test]
    fn test_decrement_persists_and_stops_at_zero() {
        let db = Database::open_in_memory().unwrap();
        let mut view = loaded(CompletionCounts::new(), date(2024, 2, 1));
        view.increment_selected(&db, Instant::now());
        view.decrement_selected(&db);
        view.decrement_selected(&db);
        assert_eq!(view.current_count(), Some((0, 2)));
        assert_eq!(db.load_counts().get("2024-01-01-A"), 0);
        assert!(!view.is_celebrating());
    }

    #[test]
    fn test_swipe_left_goes_next_after_fade() {
        let mut view = loaded(CompletionCounts::new(), date(2024, 6, 1));
        let now = Instant::now();
        view.touch_start(40);
        view.touch_move(20);
        view.touch_end(now);

        assert!(view.is_fading());
        assert_eq!(view.selected_title.as_deref(), Some("C"));

        view.tick(now + FADE);
        assert!(!view.is_fading());
        assert_eq!(view.selected_title.as_deref(), Some("D"));
    }

    #[test]
    fn test_swipe_right_goes_previous() {
        let mut view = loaded(CompletionCounts::new(), date(2024, 6, 1));
        let now = Instant::now();
        view.touch_start(5);
        view.touch_move(30);
        view.touch_end(now);
        view.tick(now + FADE);
        assert_eq!(view.selected_title.as_deref(), Some("E"));
    }

    #[test]
    fn test_short_or_tap_gesture_is_ignored() {
        let mut view = loaded(CompletionCounts::new(), date(2024, 6, 1));
        let now = Instant::now();

        view.touch_start(20);
        view.touch_move(15);
        view.touch_end(now);
        assert!(!view.is_fading());

        // No move event: a tap
        view.touch_start(50);
        view.touch_end(now);
        assert!(!view.is_fading());
    }
}
