use tracing::debug;

use super::snapshot::{parse_snapshot, Snapshot};
use super::source::StateSource;
use crate::error::Result;

pub struct Extractor<S> {
    source: S,
}

impl<S: StateSource> Extractor<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// `Ok(None)` when no state is persisted, an empty entry included.
    /// Parse and shape failures propagate.
    pub async fn extract(&mut self) -> Result<Option<Snapshot>> {
        let Some(raw) = self.source.read().await?.filter(|raw| !raw.is_empty()) else {
            debug!("No persisted game state");
            return Ok(None);
        };
        parse_snapshot(&raw).map(Some)
    }
}
