//! Interactive drag-move: threshold → drop-zone preview → reflow on release.

use colonnade_config::Config;

use crate::event::{Event, Events, WindowChange};
use crate::geometry::{Point, Rectangle};
use crate::input::target;
use crate::node::NodeId;
use crate::seat::{self, Seat};
use crate::tree::{ColumnLayout, Direction, Tree};

/// Fraction of the target's content size within which a drop snaps to the
/// nearest edge. The drop box is drawn at the same thickness.
const EDGE_CAPTURE: f64 = 0.3;

/// What the dragged window would be dropped onto.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DropNode {
    Window(NodeId),
    /// An output with no window under the cursor: the window becomes the sole
    /// member of a fresh column on its active workspace.
    Workspace(NodeId),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropTarget {
    pub node: DropNode,
    /// Snapped edge of the target window, if the cursor was close enough.
    pub edge: Option<Direction>,
    /// Preview rectangle for the renderer.
    pub drop_box: Rectangle,
}

/// The drag-move state machine. Owned by the engine while a button is held.
#[derive(Debug)]
pub struct MoveGrab {
    pub window: NodeId,
    /// Cursor position at button-press.
    press: Point<f64>,
    pub threshold_reached: bool,
    pub target: Option<DropTarget>,
}

impl MoveGrab {
    pub fn new(window: NodeId, press: Point<f64>) -> Self {
        Self {
            window,
            press,
            threshold_reached: false,
            target: None,
        }
    }

    /// Feed one pointer motion. Returns `true` when the grab just crossed the
    /// drag threshold (the cursor image should switch to "grab").
    pub fn motion(
        &mut self,
        tree: &Tree,
        seat: &Seat,
        config: &Config,
        point: Point<f64>,
    ) -> bool {
        if !self.threshold_reached {
            // Scale the threshold by the output under the cursor; squared
            // distances avoid the sqrt.
            let scale = target::output_at(tree, point)
                .map_or(1.0, |out| tree.output(out).scale);
            let threshold = config.general.tiling_drag_threshold as f64 * scale;
            let (dx, dy) = (point.x - self.press.x, point.y - self.press.y);
            if dx * dx + dy * dy > threshold * threshold {
                self.threshold_reached = true;
                return true;
            }
            return false;
        }

        self.target = resolve_drop(tree, seat, self.window, point);
        false
    }

    /// Button released: reflow the tree if a drop target stands. Returns
    /// `true` when the tree changed.
    pub fn finish(self, tree: &mut Tree, seat: &mut Seat, events: &mut Events) -> bool {
        let Some(target) = self.target.filter(|_| self.threshold_reached) else {
            return false;
        };
        let window = self.window;
        let old_column = tree.window_column(window);

        match target.node {
            DropNode::Workspace(ws_id) => {
                let col = tree.add_column(
                    ws_id,
                    ColumnLayout::Vertical,
                    tree.workspace(ws_id).columns.len(),
                );
                tree.attach_window_to_column(window, col, 0);
            }
            DropNode::Window(target_win) => {
                let Some(target_col) = tree.window_column(target_win) else {
                    // Dropped on a floating window: treat as plain append to
                    // its workspace.
                    let ws_id = tree.window_workspace(target_win);
                    let col = tree.add_column(
                        ws_id,
                        ColumnLayout::Vertical,
                        tree.workspace(ws_id).columns.len(),
                    );
                    tree.attach_window_to_column(window, col, 0);
                    return finish_reflow(tree, seat, events, window, old_column);
                };
                let ws_id = tree.column(target_col).workspace;
                let col_index = tree
                    .workspace(ws_id)
                    .column_index(target_col)
                    .expect("target column in its workspace");

                match target.edge {
                    Some(Direction::Left) => {
                        let col = tree.add_column(ws_id, ColumnLayout::Vertical, col_index);
                        tree.attach_window_to_column(window, col, 0);
                    }
                    Some(Direction::Right) => {
                        let col = tree.add_column(ws_id, ColumnLayout::Vertical, col_index + 1);
                        tree.attach_window_to_column(window, col, 0);
                    }
                    Some(Direction::Up) | Some(Direction::Down) => {
                        let target_index = tree
                            .column(target_col)
                            .child_index(target_win)
                            .expect("target window in its column");
                        let index = if target.edge == Some(Direction::Up) {
                            target_index
                        } else {
                            target_index + 1
                        };
                        tree.attach_window_to_column(window, target_col, index);
                    }
                    None => {
                        let single_source = old_column
                            .is_some_and(|col| tree.column(col).children.len() == 1);
                        let single_target = tree.column(target_col).children.len() == 1;
                        let same_ws = tree.window_workspace(window) == ws_id;
                        if single_source && single_target && same_ws {
                            if tree.swap_windows(window, target_win).is_err() {
                                return false;
                            }
                        } else {
                            let end = tree.column(target_col).children.len();
                            tree.attach_window_to_column(window, target_col, end);
                        }
                    }
                }
            }
        }

        finish_reflow(tree, seat, events, window, old_column)
    }
}

/// Post-insert bookkeeping shared by every drop path: inherit sibling
/// fractions, clean the source column, refocus, and announce the move.
fn finish_reflow(
    tree: &mut Tree,
    seat: &mut Seat,
    events: &mut Events,
    window: NodeId,
    old_column: Option<NodeId>,
) -> bool {
    if let Some(col_id) = tree.window_column(window) {
        // Same trick as a fresh split: adopt a sibling's fractions so the
        // window is not born with fraction zero.
        let column = tree.column(col_id);
        if let Some(&sibling) = column
            .children
            .iter()
            .find(|&&child| child != window)
        {
            let height = tree.window(sibling).height_fraction;
            let width = tree.window(sibling).width_fraction;
            let moved = tree.window_mut(window);
            moved.height_fraction = height;
            moved.width_fraction = width;
        } else {
            let ws = tree.column(col_id).workspace;
            let live: Vec<f64> = tree
                .workspace(ws)
                .columns
                .iter()
                .filter(|&&c| c != col_id)
                .map(|&c| tree.column(c).width_fraction)
                .collect();
            if !live.is_empty() {
                let average = live.iter().sum::<f64>() / live.len() as f64;
                tree.column_mut(col_id).width_fraction = average;
            }
            tree.window_mut(window).height_fraction = 1.0;
        }
    }

    if let Some(old) = old_column {
        tree.column_consider_destroy(old);
    }

    events.push(Event::Window {
        change: WindowChange::Move,
        id: window.get(),
        title: tree.window(window).title.clone(),
    });
    seat::set_focus(tree, seat, events, window);
    true
}

/// Compute the drop target for the current cursor position.
fn resolve_drop(
    tree: &Tree,
    seat: &Seat,
    dragged: NodeId,
    point: Point<f64>,
) -> Option<DropTarget> {
    let hit = target::target_at(tree, seat, point);
    let out_id = hit.output?;

    let Some(target_win) = hit.window else {
        // Hovering bare output space (or a layer surface): target the active
        // workspace, previewing over the whole usable area.
        let ws = tree.output(out_id).active_workspace?;
        return Some(DropTarget {
            node: DropNode::Workspace(ws),
            edge: None,
            drop_box: tree.output(out_id).usable_area,
        });
    };

    if target_win == dragged {
        return None;
    }

    // Dropping within the own workspace is pointless when the dragged window
    // is the only tiled one there.
    let dragged_ws = tree.window_workspace(dragged);
    if tree.window_workspace(target_win) == dragged_ws
        && tree.num_tiled_windows(dragged_ws) == 1
        && !tree.window(dragged).is_floating()
    {
        return None;
    }

    let content = tree.window(target_win).pending.content_rect;
    if content.is_empty() {
        return None;
    }
    let thickness = (content.size.w.min(content.size.h) as f64 * EDGE_CAPTURE) as i32;

    // Nearest edge of the content rectangle.
    let mut edge = None;
    let mut closest = i32::MAX;
    let candidates = [
        (Direction::Up, point.y as i32 - content.loc.y),
        (Direction::Left, point.x as i32 - content.loc.x),
        (
            Direction::Right,
            content.loc.x + content.size.w - point.x as i32,
        ),
        (
            Direction::Down,
            content.loc.y + content.size.h - point.y as i32,
        ),
    ];
    for (candidate, dist) in candidates {
        if dist < closest {
            closest = dist;
            edge = Some(candidate);
        }
    }
    if closest > thickness {
        edge = None;
    }

    Some(DropTarget {
        node: DropNode::Window(target_win),
        edge,
        drop_box: drop_box(content, edge, thickness),
    })
}

/// The edge-slice of `rect` previewed to the user.
fn drop_box(rect: Rectangle, edge: Option<Direction>, thickness: i32) -> Rectangle {
    let mut out = rect;
    match edge {
        Some(Direction::Up) => out.size.h = thickness,
        Some(Direction::Left) => out.size.w = thickness,
        Some(Direction::Right) => {
            out.loc.x = rect.loc.x + rect.size.w - thickness;
            out.size.w = thickness;
        }
        Some(Direction::Down) => {
            out.loc.y = rect.loc.y + rect.size.h - thickness;
            out.size.h = thickness;
        }
        None => out = rect.shrink(thickness, thickness, thickness, thickness),
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Events;
    use crate::surface::SurfaceId;
    use crate::{arrange, tree::WindowParent};

    fn config() -> Config {
        let mut config = Config::default();
        config.decorations.border_style = colonnade_config::BorderStyle::None;
        config
    }

    fn setup() -> (Tree, Seat, Events, NodeId, NodeId) {
        let mut tree = Tree::new();
        let output = tree.add_output("DP-1".into(), Rectangle::from_coords(0, 0, 1000, 1000));
        tree.root.outputs.push(output);
        tree.output_mut(output).enabled = true;
        let ws = tree.create_workspace("1".into(), Some(output));
        tree.output_mut(output).active_workspace = Some(ws);
        (tree, Seat::new("seat0"), Events::new(), output, ws)
    }

    #[test]
    fn threshold_gates_the_drag() {
        let (mut tree, seat, _, _, ws) = setup();
        let col = tree.add_column(ws, ColumnLayout::Vertical, 0);
        let win = tree.add_window(SurfaceId::unique(), WindowParent::Column(col));
        arrange::arrange_workspace(&mut tree, &config(), ws);

        let mut grab = MoveGrab::new(win, Point::new(100.0, 100.0));
        assert!(!grab.motion(&tree, &seat, &config(), Point::new(104.0, 100.0)));
        assert!(!grab.threshold_reached);
        assert!(grab.motion(&tree, &seat, &config(), Point::new(120.0, 100.0)));
        assert!(grab.threshold_reached);
    }

    #[test]
    fn drag_to_right_edge_creates_new_column() {
        // One column [W1, W2]; drag W1 onto W2's right edge.
        let (mut tree, mut seat, mut events, _, ws) = setup();
        let col = tree.add_column(ws, ColumnLayout::Vertical, 0);
        let w1 = tree.add_window(SurfaceId::unique(), WindowParent::Column(col));
        let w2 = tree.add_window(SurfaceId::unique(), WindowParent::Column(col));
        arrange::arrange_workspace(&mut tree, &config(), ws);

        let mut grab = MoveGrab::new(w1, Point::new(500.0, 100.0));
        grab.motion(&tree, &seat, &config(), Point::new(990.0, 800.0));
        // W2 occupies the bottom half; its right edge is at x=1000.
        grab.motion(&tree, &seat, &config(), Point::new(990.0, 800.0));
        let target = grab.target.expect("target resolved");
        assert_eq!(target.node, DropNode::Window(w2));
        assert_eq!(target.edge, Some(Direction::Right));

        assert!(grab.finish(&mut tree, &mut seat, &mut events));

        let columns = tree.workspace(ws).columns.clone();
        assert_eq!(columns.len(), 2);
        assert_eq!(tree.column(columns[0]).children, vec![w2]);
        assert_eq!(tree.column(columns[1]).children, vec![w1]);
        assert_eq!(seat.focused_window(), Some(w1));

        arrange::arrange_workspace(&mut tree, &config(), ws);
        let total: f64 = columns
            .iter()
            .map(|&c| tree.column(c).width_fraction)
            .sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn lone_window_cannot_drop_on_itself_or_its_workspace() {
        let (mut tree, seat, _, _, ws) = setup();
        let col = tree.add_column(ws, ColumnLayout::Vertical, 0);
        let win = tree.add_window(SurfaceId::unique(), WindowParent::Column(col));
        arrange::arrange_workspace(&mut tree, &config(), ws);

        let mut grab = MoveGrab::new(win, Point::new(10.0, 10.0));
        grab.motion(&tree, &seat, &config(), Point::new(500.0, 500.0));
        grab.motion(&tree, &seat, &config(), Point::new(500.0, 500.0));
        assert_eq!(grab.target, None);
    }

    #[test]
    fn top_edge_inserts_into_target_column() {
        let (mut tree, mut seat, mut events, _, ws) = setup();
        let col_a = tree.add_column(ws, ColumnLayout::Vertical, 0);
        let w1 = tree.add_window(SurfaceId::unique(), WindowParent::Column(col_a));
        let col_b = tree.add_column(ws, ColumnLayout::Vertical, 1);
        let w2 = tree.add_window(SurfaceId::unique(), WindowParent::Column(col_b));
        let w3 = tree.add_window(SurfaceId::unique(), WindowParent::Column(col_b));
        arrange::arrange_workspace(&mut tree, &config(), ws);

        // w2 sits in the top half of the right column; aim near its top edge.
        let w2_rect = tree.window(w2).pending.content_rect;
        let aim = Point::new(
            (w2_rect.loc.x + w2_rect.size.w / 2) as f64,
            (w2_rect.loc.y + 5) as f64,
        );

        let mut grab = MoveGrab::new(w1, Point::new(100.0, 100.0));
        grab.motion(&tree, &seat, &config(), aim);
        grab.motion(&tree, &seat, &config(), aim);
        let target = grab.target.expect("target resolved");
        assert_eq!(target.edge, Some(Direction::Up));

        assert!(grab.finish(&mut tree, &mut seat, &mut events));
        assert_eq!(tree.column(col_b).children, vec![w1, w2, w3]);
        // The emptied source column is gone.
        assert!(tree.workspace(ws).column_index(col_a).is_none());
    }

    #[test]
    fn plain_drop_on_single_columns_swaps() {
        let (mut tree, mut seat, mut events, _, ws) = setup();
        let col_a = tree.add_column(ws, ColumnLayout::Vertical, 0);
        let w1 = tree.add_window(SurfaceId::unique(), WindowParent::Column(col_a));
        let col_b = tree.add_column(ws, ColumnLayout::Vertical, 1);
        let w2 = tree.add_window(SurfaceId::unique(), WindowParent::Column(col_b));
        arrange::arrange_workspace(&mut tree, &config(), ws);

        // Center of w2: no edge within capture distance.
        let rect = tree.window(w2).pending.content_rect;
        let center = Point::new(
            (rect.loc.x + rect.size.w / 2) as f64,
            (rect.loc.y + rect.size.h / 2) as f64,
        );
        let mut grab = MoveGrab::new(w1, Point::new(10.0, 10.0));
        grab.motion(&tree, &seat, &config(), center);
        grab.motion(&tree, &seat, &config(), center);
        let target = grab.target.expect("target resolved");
        assert_eq!(target.edge, None);

        assert!(grab.finish(&mut tree, &mut seat, &mut events));
        assert_eq!(tree.column(col_a).children, vec![w2]);
        assert_eq!(tree.column(col_b).children, vec![w1]);
    }
}
