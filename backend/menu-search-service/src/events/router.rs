use tracing::{debug, warn};

use crate::models::DomainEvent;

use super::{EventError, Outcome, Projector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Update,
    Delete,
}

impl Action {
    /// Reads the action from the second dot-segment of an event tag,
    /// e.g. `food.update` → [`Action::Update`].
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.split('.').nth(1)? {
            "create" => Some(Action::Create),
            "update" => Some(Action::Update),
            "delete" => Some(Action::Delete),
            _ => None,
        }
    }
}

/// Sends `event` to the projection path named by its tag.
///
/// Unsupported tags are logged once and reported as
/// [`Outcome::Unsupported`] without touching the index.
pub async fn route<E: DomainEvent>(
    projector: &Projector<E>,
    event: &E,
) -> Result<Outcome, EventError> {
    let Some(action) = Action::from_tag(event.tag()) else {
        warn!(
            domain = %E::DOMAIN,
            id = event.id(),
            tag = event.tag(),
            "Unsupported event, skipping"
        );
        return Ok(Outcome::Unsupported(event.tag().to_owned()));
    };

    debug!(
        domain = %E::DOMAIN,
        id = event.id(),
        action = ?action,
        "Routing event"
    );
    match action {
        Action::Create => projector.insert(event).await?,
        Action::Update => projector.partial_update(event).await?,
        Action::Delete => projector.delete(event).await?,
    }

    Ok(match action {
        Action::Create => Outcome::Indexed,
        Action::Update => Outcome::Updated,
        Action::Delete => Outcome::Deleted,
    })
}
