//! Club views.

use std::collections::HashMap;

use serde::Serialize;

use super::ViewFilter;
use crate::catalog::{EntityKind, LinkKind};
use crate::model::{Id, Row, RowKey};
use crate::storage::State;

/// A club and its live member count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClubPopularity {
    pub club_id: Id,
    pub handle: String,
    pub members: u64,
}

/// One membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClubMember {
    pub club_id: Id,
    pub handle: String,
    pub user_id: Id,
    pub username: String,
}

fn memberships(state: &State) -> impl Iterator<Item = (Id, Id)> + '_ {
    state.rows(EntityKind::ClubUserLink).filter_map(|row| match row {
        Row::Link(link) if link.kind == LinkKind::ClubUser => Some((link.left, link.right)),
        _ => None,
    })
}

fn visible_user<'a>(state: &'a State, user_id: Id, filter: &ViewFilter) -> Option<&'a str> {
    match state.row(EntityKind::User, RowKey::Id(user_id)) {
        Some(Row::User(user)) if filter.include_deleted || !user.deleted => Some(&user.username),
        _ => None,
    }
}

pub(super) fn popularity(state: &State, filter: &ViewFilter) -> Vec<ClubPopularity> {
    let mut counts: HashMap<Id, u64> = HashMap::new();
    for (club_id, user_id) in memberships(state) {
        if visible_user(state, user_id, filter).is_some() {
            *counts.entry(club_id).or_default() += 1;
        }
    }

    let mut rows: Vec<ClubPopularity> = state
        .rows(EntityKind::Club)
        .filter_map(|row| match row {
            Row::Club(club) => Some(club),
            _ => None,
        })
        .filter(|club| filter.include_deleted || !club.deleted)
        .filter(|club| filter.club_id.map_or(true, |id| id == club.id))
        .map(|club| ClubPopularity {
            club_id: club.id,
            handle: club.handle.clone(),
            members: counts.get(&club.id).copied().unwrap_or(0),
        })
        .collect();

    rows.sort_by(|a, b| b.members.cmp(&a.members).then(a.club_id.cmp(&b.club_id)));
    rows
}

pub(super) fn members(state: &State, filter: &ViewFilter) -> Vec<ClubMember> {
    memberships(state)
        .filter(|(club_id, _)| filter.club_id.map_or(true, |id| id == *club_id))
        .filter(|(_, user_id)| filter.user_id.map_or(true, |id| id == *user_id))
        .filter_map(|(club_id, user_id)| {
            let handle = match state.row(EntityKind::Club, RowKey::Id(club_id)) {
                Some(Row::Club(club)) if filter.include_deleted || !club.deleted => &club.handle,
                _ => return None,
            };
            let username = visible_user(state, user_id, filter)?;
            Some(ClubMember {
                club_id,
                handle: handle.clone(),
                user_id,
                username: username.to_string(),
            })
        })
        .collect()
}
