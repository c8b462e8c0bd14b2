//! Selection engine - which date and group to show
//!
//! Picks the session nearest to today, the group to open first, and steps
//! through groups for swipe navigation.

use chrono::NaiveDate;

use crate::counter::{count_key, CompletionCounts};
use crate::plan::{find_session, Session};

/// How the first group of the initial session is chosen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum GroupPolicy {
    /// Always the first group in the list
    First,
    /// Group with the lowest completion count, earliest wins ties
    #[default]
    LeastCompleted,
}

/// Step direction through a session's groups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

/// Date plus group title currently on screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub date: NaiveDate,
    pub title: Option<String>,
}

/// Latest session dated on or before `today`, else the first session.
///
/// The plan is taken in the order given (ascending by date); no sort is
/// performed. Returns `None` for an empty plan.
pub fn pick_initial_date(plan: &[Session], today: NaiveDate) -> Option<NaiveDate> {
    plan.iter()
        .filter(|s| s.date <= today)
        .last()
        .or_else(|| plan.first())
        .map(|s| s.date)
}

pub fn pick_initial_group(
    session: &Session,
    counts: &CompletionCounts,
    policy: GroupPolicy,
) -> Option<String> {
    let first = session.groups.first()?;

    let picked = match policy {
        GroupPolicy::First => first,
        GroupPolicy::LeastCompleted => {
            let count_of = |title: &str| counts.get(&count_key(session.date, title));
            session.groups.iter().skip(1).fold(first, |least, group| {
                if count_of(&group.title) < count_of(&least.title) {
                    group
                } else {
                    least
                }
            })
        }
    };

    Some(picked.title.clone())
}

/// Title to show after the user picks another date: always the first group
pub fn on_date_changed(plan: &[Session], date: NaiveDate) -> Option<String> {
    find_session(plan, date)
        .and_then(|s| s.groups.first())
        .map(|g| g.title.clone())
}

/// Cyclic step through the groups; `None` when `current` is unknown
pub fn advance(session: &Session, current: &str, direction: Direction) -> Option<String> {
    let len = session.groups.len();
    let index = session.groups.iter().position(|g| g.title == current)?;

    let next = match direction {
        Direction::Next => (index + 1) % len,
        Direction::Previous => (index + len - 1) % len,
    };
    Some(session.groups[next].title.clone())
}

/// Initial date and title for a freshly loaded plan
pub fn initial_selection(
    plan: &[Session],
    counts: &CompletionCounts,
    today: NaiveDate,
    policy: GroupPolicy,
) -> Option<Selection> {
    let date = pick_initial_date(plan, today)?;
    let title = find_session(plan, date).and_then(|s| pick_initial_group(s, counts, policy));
    Some(Selection { date, title })
}
