use bevy_ecs::prelude::Entity;
use serde::Deserialize;

/// Which manipulation the UI mode buttons last enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManipulationMode {
    /// Camera navigation; manipulation machines ignore pointer input.
    #[default]
    Move,
    Translate,
    Scale,
    Rotate,
}

impl ManipulationMode {
    pub fn label(self) -> &'static str {
        match self {
            ManipulationMode::Move => "Move",
            ManipulationMode::Translate => "Translate",
            ManipulationMode::Scale => "Scale",
            ManipulationMode::Rotate => "Rotate",
        }
    }
}

/// The single selected node and active mode. Written only from the update loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectionContext {
    selected: Option<Entity>,
    mode: ManipulationMode,
}

impl SelectionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<Entity> {
        self.selected
    }

    pub fn mode(&self) -> ManipulationMode {
        self.mode
    }

    pub fn is_selected(&self, entity: Entity) -> bool {
        self.selected == Some(entity)
    }

    /// Overwrites the selection. Returns `true` when it actually changed, which is the
    /// owner's cue to drop gesture state bound to the previous node.
    pub fn set_selected(&mut self, node: Option<Entity>) -> bool {
        let changed = self.selected != node;
        self.selected = node;
        changed
    }

    pub fn set_mode(&mut self, mode: ManipulationMode) {
        if self.mode != mode {
            tracing::debug!(from = self.mode.label(), to = mode.label(), "mode switched");
        }
        self.mode = mode;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::world::World;

    #[test]
    fn set_selected_reports_changes_only() {
        let mut world = World::new();
        let a = world.spawn_empty().id();
        let b = world.spawn_empty().id();
        let mut selection = SelectionContext::new();
        assert!(selection.set_selected(Some(a)));
        assert!(!selection.set_selected(Some(a)));
        assert!(selection.set_selected(Some(b)));
        assert!(selection.is_selected(b));
        assert!(selection.set_selected(None));
    }
}
