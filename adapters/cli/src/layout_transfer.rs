//! Single-line tower layout strings that can be pasted between runs.
//!
//! Format: `portal:v1:<columns>x<rows>:<base64 json>` where the payload lists
//! every tower with its cell, kind and upgrade levels.

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use portal_defence_core::{CellCoord, TowerKind, TowerSnapshot, UpgradeAxis, UpgradeLevels};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const LAYOUT_DOMAIN: &str = "portal";
const LAYOUT_VERSION: &str = "v1";
const FIELD_DELIMITER: char = ':';

/// Towers placed on a grid of known dimensions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct TowerLayout {
    pub(crate) columns: u32,
    pub(crate) rows: u32,
    pub(crate) towers: Vec<LayoutTower>,
}

/// One tower inside a layout.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct LayoutTower {
    pub(crate) kind: TowerKind,
    pub(crate) cell: CellCoord,
    #[serde(default)]
    pub(crate) levels: UpgradeLevels,
}

impl LayoutTower {
    /// Money needed to place the tower and buy its upgrades.
    pub(crate) fn total_cost(&self) -> u32 {
        UpgradeAxis::ALL
            .iter()
            .flat_map(|axis| 1..self.levels.level(*axis))
            .map(|level| self.kind.upgrade_price(level))
            .fold(self.kind.cost(), u32::saturating_add)
    }

    /// Clamps every upgrade level into the catalog's band.
    fn normalized(self) -> Self {
        let level = |axis| self.levels.level(axis);
        Self {
            levels: UpgradeLevels::from_levels(
                level(UpgradeAxis::Damage),
                level(UpgradeAxis::Range),
                level(UpgradeAxis::Speed),
            ),
            ..self
        }
    }
}

#[derive(Serialize, Deserialize)]
struct Payload {
    towers: Vec<LayoutTower>,
}

impl TowerLayout {
    /// Captures the provided towers.
    pub(crate) fn capture<'a, I>(columns: u32, rows: u32, towers: I) -> Self
    where
        I: IntoIterator<Item = &'a TowerSnapshot>,
    {
        Self {
            columns,
            rows,
            towers: towers
                .into_iter()
                .map(|tower| LayoutTower {
                    kind: tower.kind,
                    cell: tower.cell,
                    levels: tower.levels,
                })
                .collect(),
        }
    }

    /// Money needed to rebuild the whole layout from scratch.
    pub(crate) fn total_cost(&self) -> u32 {
        self.towers
            .iter()
            .map(LayoutTower::total_cost)
            .fold(0, u32::saturating_add)
    }

    /// Encodes the layout into a single-line string.
    pub(crate) fn encode(&self) -> Result<String, LayoutTransferError> {
        let json = serde_json::to_vec(&Payload {
            towers: self.towers.clone(),
        })
        .map_err(LayoutTransferError::InvalidPayload)?;
        let encoded = STANDARD_NO_PAD.encode(json);
        Ok(format!(
            "{LAYOUT_DOMAIN}{FIELD_DELIMITER}{LAYOUT_VERSION}{FIELD_DELIMITER}{}x{}{FIELD_DELIMITER}{encoded}",
            self.columns, self.rows
        ))
    }

    /// Decodes a layout from its string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, LayoutTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(LayoutTransferError::Empty);
        }

        let mut parts = trimmed.splitn(4, FIELD_DELIMITER);
        let domain = parts.next().unwrap_or_default();
        let version = parts.next().ok_or(LayoutTransferError::Truncated)?;
        let dimensions = parts.next().ok_or(LayoutTransferError::Truncated)?;
        let payload = parts.next().ok_or(LayoutTransferError::Truncated)?;

        if domain != LAYOUT_DOMAIN {
            return Err(LayoutTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != LAYOUT_VERSION {
            return Err(LayoutTransferError::UnsupportedVersion(version.to_owned()));
        }

        let (columns, rows) = parse_dimensions(dimensions)?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(LayoutTransferError::InvalidEncoding)?;
        let decoded: Payload =
            serde_json::from_slice(&bytes).map_err(LayoutTransferError::InvalidPayload)?;

        Ok(Self {
            columns,
            rows,
            towers: decoded
                .towers
                .into_iter()
                .map(LayoutTower::normalized)
                .collect(),
        })
    }
}

/// Reasons a layout string cannot be decoded.
#[derive(Debug, Error)]
pub(crate) enum LayoutTransferError {
    #[error("layout string is empty")]
    Empty,
    #[error("layout string is missing fields")]
    Truncated,
    #[error("layout prefix '{0}' is not supported")]
    InvalidPrefix(String),
    #[error("layout version '{0}' is not supported")]
    UnsupportedVersion(String),
    #[error("could not parse grid dimensions '{0}'")]
    InvalidDimensions(String),
    #[error("could not decode layout payload")]
    InvalidEncoding(#[source] base64::DecodeError),
    #[error("could not parse layout payload")]
    InvalidPayload(#[source] serde_json::Error),
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), LayoutTransferError> {
    let invalid = || LayoutTransferError::InvalidDimensions(dimensions.to_owned());
    let (columns, rows) = dimensions.split_once(['x', 'X']).ok_or_else(invalid)?;
    let columns = columns.trim().parse::<u32>().map_err(|_| invalid())?;
    let rows = rows.trim().parse::<u32>().map_err(|_| invalid())?;

    if columns == 0 || rows == 0 {
        return Err(invalid());
    }
    Ok((columns, rows))
}
