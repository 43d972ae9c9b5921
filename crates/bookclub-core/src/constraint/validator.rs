//! Field and reference validation for row writes.

use crate::catalog::relations_from;
use crate::error::{ConstraintError, Error, Result};
use crate::model::{Row, RowKey, MAX_STARS};
use crate::storage::Transaction;

fn require_text(row: &Row, field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(
            row.kind(),
            format!("`{field}` must not be empty"),
        ));
    }
    Ok(())
}

/// Check field values that do not depend on other rows.
pub(crate) fn validate_fields(before: Option<&Row>, after: &Row) -> Result<()> {
    if let Some(before) = before {
        if before.key() != after.key() {
            return Err(Error::validation(
                after.kind(),
                format!(
                    "primary key cannot change from {} to {}",
                    before.key(),
                    after.key()
                ),
            ));
        }
    }

    match after {
        Row::User(r) => require_text(after, "username", &r.username),
        Row::Book(r) => {
            require_text(after, "handle", &r.handle)?;
            require_text(after, "full_name", &r.full_name)
        }
        Row::Club(r) => require_text(after, "handle", &r.handle),
        Row::Discussion(r) => require_text(after, "topic", &r.topic),
        Row::Review(r) => {
            if r.stars > MAX_STARS {
                return Err(Error::validation(
                    after.kind(),
                    format!("`stars` must be between 0 and {MAX_STARS}, got {}", r.stars),
                ));
            }
            require_text(after, "title", &r.title)
        }
        _ => Ok(()),
    }
}

/// Check that every reference set or changed by this write points at a live row.
///
/// References left untouched by an update are not re-checked, so rows keep
/// pointing at targets that were soft-deleted after the fact.
pub(crate) fn check_references(
    tx: &mut Transaction<'_>,
    before: Option<&Row>,
    after: &Row,
) -> Result<()> {
    for relation in relations_from(after.kind()) {
        let Some(id) = after.reference(relation.from_field) else {
            continue;
        };
        if before.and_then(|b| b.reference(relation.from_field)) == Some(id) {
            continue;
        }

        let live = tx
            .get(relation.to_entity, RowKey::Id(id))
            .is_some_and(|target| !target.is_deleted());
        if !live {
            return Err(Error::ConstraintViolation(
                ConstraintError::ReferentialViolation {
                    entity: after.kind(),
                    field: relation.from_field.to_string(),
                    referenced: relation.to_entity,
                    id,
                },
            ));
        }
    }
    Ok(())
}
