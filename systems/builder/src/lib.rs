#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that translates player intent into world commands.
//!
//! The builder tracks what the player has selected: a tower kind waiting to
//! be placed, or an existing tower that sell and upgrade actions apply to.
//! The two selections are mutually exclusive.

use portal_defence_core::{CellCoord, Command, Event, TowerId, TowerKind, UpgradeAxis};

/// Discrete input gathered by an adapter for a single frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerAction {
    /// Chooses a tower kind to place on the next click.
    SelectKind(TowerKind),
    /// Clicks a grid cell: selects the tower there, or places the chosen kind.
    ClickCell(CellCoord),
    /// Drops every selection.
    ClearSelection,
    /// Sells the selected tower.
    SellSelected,
    /// Upgrades one axis of the selected tower.
    UpgradeSelected(UpgradeAxis),
    /// Starts the next wave early.
    StartWave,
    /// Pauses or resumes the simulation.
    TogglePause,
    /// Moves to the next game speed.
    CycleSpeed,
}

/// What the player currently has selected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Selection {
    /// Nothing is selected.
    #[default]
    None,
    /// A tower kind is armed for placement.
    Kind(TowerKind),
    /// An existing tower is selected.
    Tower(TowerId),
}

/// Builder system that owns the player's selection state.
#[derive(Clone, Debug, Default)]
pub struct Builder {
    selection: Selection,
}

impl Builder {
    /// Creates a builder with nothing selected.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            selection: Selection::None,
        }
    }

    /// Current selection.
    #[must_use]
    pub const fn selection(&self) -> Selection {
        self.selection
    }

    /// Consumes world events and player actions to emit world commands.
    ///
    /// `tower_at` should mirror the world's `query::tower_at` helper so clicks
    /// on existing towers select them instead of placing.
    pub fn handle<F>(
        &mut self,
        events: &[Event],
        actions: &[PlayerAction],
        tower_at: F,
        out: &mut Vec<Command>,
    ) where
        F: Fn(CellCoord) -> Option<TowerId>,
    {
        for event in events {
            self.observe(event);
        }

        for action in actions {
            match *action {
                PlayerAction::SelectKind(kind) => self.selection = Selection::Kind(kind),
                PlayerAction::ClickCell(cell) => {
                    if let Some(tower) = tower_at(cell) {
                        self.selection = Selection::Tower(tower);
                    } else if let Selection::Kind(kind) = self.selection {
                        out.push(Command::PlaceTower { kind, cell });
                    } else {
                        self.selection = Selection::None;
                    }
                }
                PlayerAction::ClearSelection => self.selection = Selection::None,
                PlayerAction::SellSelected => {
                    if let Selection::Tower(tower) = self.selection {
                        out.push(Command::SellTower { tower });
                    }
                }
                PlayerAction::UpgradeSelected(axis) => {
                    if let Selection::Tower(tower) = self.selection {
                        out.push(Command::UpgradeTower { tower, axis });
                    }
                }
                PlayerAction::StartWave => out.push(Command::StartWave),
                PlayerAction::TogglePause => out.push(Command::TogglePause),
                PlayerAction::CycleSpeed => out.push(Command::CycleSpeed),
            }
        }
    }

    fn observe(&mut self, event: &Event) {
        match (event, self.selection) {
            (Event::TowerPlaced { kind, .. }, Selection::Kind(armed)) if *kind == armed => {
                self.selection = Selection::None;
            }
            (Event::TowerSold { tower, .. }, Selection::Tower(selected)) if *tower == selected => {
                self.selection = Selection::None;
            }
            (Event::GameWon | Event::GameLost, _) => self.selection = Selection::None,
            _ => {}
        }
    }
}
