//! Batch admission against the photo-count limit.

/// Decision produced by the selection gate. Accepted files preserve input
/// order; the caller applies the decision (the gate has no side effects).
#[derive(Debug)]
pub struct SelectionOutcome<T> {
    pub accepted: Vec<T>,
    pub rejected: usize,
    pub message: Option<String>,
}

/// Gates incoming batches against the configured photo limit.
#[derive(Debug, Clone, Copy)]
pub struct SelectionGate {
    max_files: usize,
}

impl SelectionGate {
    pub fn new(max_files: usize) -> Self {
        Self { max_files }
    }

    pub fn max_files(&self) -> usize {
        self.max_files
    }

    /// Admit as much of `incoming` as the limit allows, given `current`
    /// photos already accepted this session.
    pub fn admit<T>(&self, current: usize, incoming: Vec<T>) -> SelectionOutcome<T> {
        let incoming_len = incoming.len();

        if current >= self.max_files {
            tracing::debug!(
                current,
                max = self.max_files,
                rejected = incoming_len,
                "selection rejected, limit already reached"
            );
            return SelectionOutcome {
                accepted: Vec::new(),
                rejected: incoming_len,
                message: Some(format!(
                    "Photo limit reached: {} photos are already selected (maximum {}).",
                    current, self.max_files
                )),
            };
        }

        let room = self.max_files - current;
        if incoming_len <= room {
            return SelectionOutcome {
                accepted: incoming,
                rejected: 0,
                message: None,
            };
        }

        let excluded = incoming_len - room;
        tracing::debug!(
            current,
            max = self.max_files,
            accepted = room,
            excluded,
            "selection truncated"
        );
        SelectionOutcome {
            accepted: incoming.into_iter().take(room).collect(),
            rejected: excluded,
            message: Some(format!(
                "Only {} of {} photos were added; {} would exceed the {}-photo limit.",
                room, incoming_len, excluded, self.max_files
            )),
        }
    }
}
