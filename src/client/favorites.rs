use tracing::warn;

use super::{
    api::{ClientResult, RemplrClient},
    session::Session,
};
use crate::users::repo_types::SavedKind;

/// Saved state of one ingredient, recipe or meal plan for the session user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Favorite {
    pub kind: SavedKind,
    pub item_id: i32,
    pub label: String,
    saved: bool,
}

impl Favorite {
    /// Starts unsaved; call [`Favorite::refresh`] to read the server state.
    pub fn new(kind: SavedKind, item_id: i32, label: impl Into<String>) -> Self {
        Self {
            kind,
            item_id,
            label: label.into(),
            saved: false,
        }
    }

    pub async fn load(
        client: &RemplrClient,
        session: &Session,
        kind: SavedKind,
        item_id: i32,
        label: impl Into<String>,
    ) -> ClientResult<Self> {
        let mut fav = Self::new(kind, item_id, label);
        fav.refresh(client, session).await?;
        Ok(fav)
    }

    pub fn is_saved(&self) -> bool {
        self.saved
    }

    pub async fn refresh(&mut self, client: &RemplrClient, session: &Session) -> ClientResult<()> {
        let ids = client
            .saved_ids(session, session.username(), self.kind)
            .await?;
        self.saved = ids.contains(&self.item_id);
        Ok(())
    }

    /// Saves when unsaved and the other way round; returns the message to show.
    pub async fn toggle(&mut self, client: &RemplrClient, session: &Session) -> ClientResult<String> {
        let noun = self.kind.label().to_lowercase();
        if self.saved {
            if let Err(e) = client
                .unsave_item(session, session.username(), self.kind, self.item_id)
                .await
            {
                warn!(error = %e, item_id = self.item_id, "unsave failed");
                return Err(e);
            }
            self.saved = false;
            Ok(format!("Unliked {noun} {}!", self.label))
        } else {
            client
                .save_item(session, session.username(), self.kind, self.item_id)
                .await?;
            self.saved = true;
            Ok(format!("Liked {noun} {}!", self.label))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_favorites_start_unsaved() {
        let fav = Favorite::new(SavedKind::Recipe, 4, "Porridge");
        assert!(!fav.is_saved());
        assert_eq!(fav.label, "Porridge");
    }
}
