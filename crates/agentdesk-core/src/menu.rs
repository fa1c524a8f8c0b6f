// Contextual row menu placement
//
// Decides whether a row's action menu opens above or below its anchor.
// Geometry is passed in as data, so the rule runs without a renderer.

use serde::Serialize;

/// Height assumed for the action menu, in pixels
pub const ASSUMED_MENU_HEIGHT: f64 = 120.0;

/// Fraction of the menu height below which space is "very limited"
const VERY_LIMITED_RATIO: f64 = 0.8;

/// Fraction of the menu height under which a last row flips upwards
const LAST_ROW_RATIO: f64 = 1.2;

/// Where the menu renders relative to its anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    Above,
    Below,
}

/// Geometry of the anchor at the moment the menu opens
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorGeometry {
    pub space_above: f64,
    pub space_below: f64,
    /// 0-based index of the anchor's row in its table
    pub row_index: usize,
    pub total_rows: usize,
}

impl AnchorGeometry {
    fn in_last_two_rows(&self) -> bool {
        self.row_index + 2 >= self.total_rows
    }

    fn is_last_row(&self) -> bool {
        self.row_index + 1 == self.total_rows
    }
}

/// Pick the placement for a menu of `menu_height`. First matching rule wins:
///
/// 1. anchor in the last two rows, or less than 80% of the menu fits below: above
/// 2. menu does not fit below but fits above: above
/// 3. less than 1.2x the menu fits below and the anchor is the last row: above
/// 4. otherwise: below
pub fn compute_placement(geometry: &AnchorGeometry, menu_height: f64) -> Placement {
    if geometry.in_last_two_rows() || geometry.space_below < menu_height * VERY_LIMITED_RATIO {
        return Placement::Above;
    }
    if geometry.space_below < menu_height && geometry.space_above > menu_height {
        return Placement::Above;
    }
    if geometry.space_below < menu_height * LAST_ROW_RATIO && geometry.is_last_row() {
        return Placement::Above;
    }
    Placement::Below
}

/// What an interaction landed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget<'a> {
    /// Inside the open menu
    Menu,
    /// On a row's menu trigger
    Trigger(&'a str),
    /// Anywhere else
    Outside,
}

/// Open/closed state of the per-row action menus; at most one is open
#[derive(Debug, Clone, PartialEq)]
pub struct RowMenu {
    open: Option<(String, Placement)>,
    menu_height: f64,
}

impl Default for RowMenu {
    fn default() -> Self {
        Self::new(ASSUMED_MENU_HEIGHT)
    }
}

impl RowMenu {
    pub fn new(menu_height: f64) -> Self {
        Self {
            open: None,
            menu_height,
        }
    }

    /// Row whose menu is open
    pub fn open_row(&self) -> Option<&str> {
        self.open.as_ref().map(|(row, _)| row.as_str())
    }

    /// Placement of the open menu; `None` when closed
    pub fn placement(&self) -> Option<Placement> {
        self.open.as_ref().map(|(_, placement)| *placement)
    }

    /// Trigger click on a row: closes that row's menu if it is open,
    /// otherwise opens it (closing any other) with a freshly computed placement.
    pub fn toggle(&mut self, row: &str, geometry: &AnchorGeometry) -> Option<Placement> {
        if self.open_row() == Some(row) {
            self.open = None;
            return None;
        }
        let placement = compute_placement(geometry, self.menu_height);
        self.open = Some((row.to_string(), placement));
        Some(placement)
    }

    /// Close the open menu; no-op when already closed
    pub fn close(&mut self) {
        self.open = None;
    }

    /// Route a click elsewhere on the page. Returns whether the menu closed.
    ///
    /// Clicks inside the menu or on its own trigger leave it alone; the
    /// trigger handler is expected to call [`RowMenu::toggle`].
    pub fn handle_click(&mut self, target: ClickTarget<'_>) -> bool {
        let keep = match target {
            ClickTarget::Menu => true,
            ClickTarget::Trigger(row) => self.open_row() == Some(row),
            ClickTarget::Outside => false,
        };
        if keep || self.open.is_none() {
            return false;
        }
        self.open = None;
        true
    }
}
