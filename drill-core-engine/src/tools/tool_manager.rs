use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Enumeration of available drilling tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolType {
    /// Single-shot hand probe.
    Bore,
    /// Placeable multi-depth drill tower.
    Tower,
}

impl ToolType {
    /// Convert string identifier to tool type for persisted snapshots.
    pub fn from_string(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "bore" => Some(Self::Bore),
            "tower" => Some(Self::Tower),
            _ => None,
        }
    }

    /// Convert tool type to string identifier for persisted snapshots.
    pub fn to_string(&self) -> &'static str {
        match self {
            Self::Bore => "bore",
            Self::Tower => "tower",
        }
    }
}

/// Resource tracking the currently equipped tool.
#[derive(Resource)]
pub struct ToolManager {
    /// Currently equipped tool, if any.
    active_tool: Option<ToolType>,
}

impl Default for ToolManager {
    fn default() -> Self {
        Self { active_tool: None }
    }
}

impl ToolManager {
    /// Equip specified tool, replacing the previous one if necessary.
    pub fn activate_tool(&mut self, tool_type: ToolType) -> bool {
        // Check if tool is already equipped to avoid redundant operations.
        if self.active_tool == Some(tool_type) {
            return false; // No change needed.
        }

        self.active_tool = Some(tool_type);
        info!("Tool manager equipped: {}", tool_type.to_string());
        true // Tool changed.
    }

    /// Unequip the current tool and clear selection.
    pub fn deactivate_current_tool(&mut self) -> Option<ToolType> {
        let previous = self.active_tool.take();
        if let Some(tool) = previous {
            info!("Tool manager unequipped: {}", tool.to_string());
        }
        previous
    }

    /// Get currently equipped tool type.
    pub fn active_tool(&self) -> Option<ToolType> {
        self.active_tool
    }

    /// Check if specific tool is currently equipped.
    pub fn is_tool_active(&self, tool_type: ToolType) -> bool {
        self.active_tool == Some(tool_type)
    }
}

/// Event fired when tool selection changes via keyboard shortcuts or a
/// restored scene snapshot.
#[derive(Event)]
pub struct ToolSelectionEvent {
    pub tool_type: ToolType,
    pub source: ToolSelectionSource,
}

/// Source of tool selection for debugging and conditional logic.
#[derive(Debug, Clone, Copy)]
pub enum ToolSelectionSource {
    Keyboard,
    Restore,
}

/// System handling tool selection events.
pub fn handle_tool_selection_events(
    mut events: EventReader<ToolSelectionEvent>,
    mut tool_manager: ResMut<ToolManager>,
) {
    for event in events.read() {
        if tool_manager.activate_tool(event.tool_type) {
            info!(
                "{} tool equipped via {:?}",
                event.tool_type.to_string(),
                event.source
            );
        }
    }
}

/// System handling keyboard shortcuts for tool selection.
pub fn handle_tool_keyboard_shortcuts(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut tool_events: EventWriter<ToolSelectionEvent>,
) {
    if keyboard.just_pressed(KeyCode::Digit1) {
        tool_events.send(ToolSelectionEvent {
            tool_type: ToolType::Bore,
            source: ToolSelectionSource::Keyboard,
        });
    }

    if keyboard.just_pressed(KeyCode::Digit2) {
        tool_events.send(ToolSelectionEvent {
            tool_type: ToolType::Tower,
            source: ToolSelectionSource::Keyboard,
        });
    }
}
