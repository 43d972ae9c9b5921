//! Projected view kinds and write targets.

use std::fmt;
use std::str::FromStr;

use super::kind::{EntityKind, UnknownName};

/// Read-only projections computed from committed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    /// Clubs with their live member count.
    ClubPopularity,
    /// One row per club membership, with handle and username.
    ClubMembers,
    /// Comments that are no longer pending.
    ApprovedComments,
    /// Books ordered by reading activity.
    TopActivityBooks,
    /// Books ordered by average rating.
    TopRatedBooks,
    /// Per-book statistics.
    BookStatistics,
}

impl ViewKind {
    /// All view kinds.
    pub const ALL: [ViewKind; 6] = [
        ViewKind::ClubPopularity,
        ViewKind::ClubMembers,
        ViewKind::ApprovedComments,
        ViewKind::TopActivityBooks,
        ViewKind::TopRatedBooks,
        ViewKind::BookStatistics,
    ];

    /// View name used in commands and error messages.
    pub fn name(self) -> &'static str {
        match self {
            ViewKind::ClubPopularity => "clubs_popular",
            ViewKind::ClubMembers => "club_members",
            ViewKind::ApprovedComments => "comments_approved",
            ViewKind::TopActivityBooks => "books_top_activity",
            ViewKind::TopRatedBooks => "books_top_rated",
            ViewKind::BookStatistics => "books_statistics",
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ViewKind {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|view| view.name() == s)
            .ok_or_else(|| UnknownName(s.to_string()))
    }
}

/// Anything a command can name: a table or a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Entity(EntityKind),
    View(ViewKind),
}

impl From<EntityKind> for Target {
    fn from(kind: EntityKind) -> Self {
        Target::Entity(kind)
    }
}

impl From<ViewKind> for Target {
    fn from(view: ViewKind) -> Self {
        Target::View(view)
    }
}

impl FromStr for Target {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<EntityKind>()
            .map(Target::Entity)
            .or_else(|_| s.parse::<ViewKind>().map(Target::View))
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Entity(kind) => kind.fmt(f),
            Target::View(view) => view.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_parse() {
        assert_eq!(
            "clubs".parse::<Target>().unwrap(),
            Target::Entity(EntityKind::Club)
        );
        assert_eq!(
            "clubs_popular".parse::<Target>().unwrap(),
            Target::View(ViewKind::ClubPopularity)
        );
        assert!("nope".parse::<Target>().is_err());
    }

    #[test]
    fn test_view_names_distinct_from_tables() {
        for view in ViewKind::ALL {
            assert!(view.name().parse::<EntityKind>().is_err());
        }
    }
}
