use crate::error::{ManipulationError, Severity};

/// User-visible messages for rejected operations, drained by the UI once per frame.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<ManipulationError>,
}

impl Diagnostics {
    pub fn report(&mut self, error: ManipulationError) {
        match error.severity() {
            Severity::Warning => tracing::warn!("{error}"),
            Severity::Error => tracing::error!("{error}"),
        }
        self.entries.push(error);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn drain(&mut self) -> Vec<ManipulationError> {
        self.entries.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_empties_the_buffer() {
        let mut diagnostics = Diagnostics::default();
        diagnostics.report(ManipulationError::NoJointAvailable);
        diagnostics.report(ManipulationError::GraspWhileRotating);
        assert_eq!(diagnostics.len(), 2);
        let drained = diagnostics.drain();
        assert_eq!(drained[0], ManipulationError::NoJointAvailable);
        assert!(diagnostics.is_empty());
    }
}
