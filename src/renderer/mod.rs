//! Renderer — the deterministic rasterizer.
//!
//! Takes the engine's `Stage` and produces a fixed-size cell grid. The
//! renderer is pure and stateless: given the same stage and viewport it
//! always produces the same grid. It knows nothing about time, animation,
//! or scene semantics; opacity and scale arrive as plain numbers and map
//! to the terminal's limited vocabulary (culled, dim, normal, bold).

use crate::engine::stage::{Node, NodeId, Stage};
use crate::types::{Cell, CellChange, Style, Viewport};

/// Below this world opacity a node is not drawn at all.
const CULL_OPACITY: f64 = 0.15;
/// Below this world opacity a node renders dim.
const DIM_OPACITY: f64 = 0.55;
/// At or above this scale a node renders bold.
const BOLD_SCALE: f64 = 1.1;

pub struct Renderer;

impl Renderer {
    /// Rasterize the stage onto a cell grid.
    ///
    /// Nodes are stamped in z order so higher z values paint over lower
    /// ones. Sprite spaces are transparent; out-of-bounds cells are
    /// clipped.
    pub fn rasterize(stage: &Stage, viewport: Viewport) -> Vec<Vec<Cell>> {
        let w = viewport.width.max(0.0) as usize;
        let h = viewport.height.max(0.0) as usize;
        let mut grid = vec![vec![Cell::default(); w]; h];

        let mut nodes: Vec<(NodeId, &Node)> = stage.iter().collect();
        nodes.sort_by_key(|(id, node)| (node.z, *id));

        for (id, node) in nodes {
            if !node.visible || node.sprite.lines.is_empty() {
                continue;
            }
            let opacity = stage.world_opacity(id);
            if opacity < CULL_OPACITY {
                continue;
            }
            let Some((x, y)) = stage.world_position(id) else {
                continue;
            };

            let mut style = node.sprite.style;
            if opacity < DIM_OPACITY {
                style.dim = true;
                style.bold = false;
            } else if node.transform.scale.x >= BOLD_SCALE {
                style.bold = true;
            }

            Self::stamp(&mut grid, x, y, &node.sprite.lines, style);
        }

        grid
    }

    fn stamp(grid: &mut [Vec<Cell>], x: f64, y: f64, lines: &[String], style: Style) {
        let origin_x = x.round() as i64;
        let origin_y = y.round() as i64;
        for (dy, line) in lines.iter().enumerate() {
            let row = origin_y + dy as i64;
            if row < 0 || row as usize >= grid.len() {
                continue;
            }
            let row = &mut grid[row as usize];
            for (dx, ch) in line.chars().enumerate() {
                if ch == ' ' {
                    continue;
                }
                let col = origin_x + dx as i64;
                if col < 0 || col as usize >= row.len() {
                    continue;
                }
                row[col as usize] = Cell { ch, style };
            }
        }
    }

    /// Compute a cell-level diff between two grids of the same size.
    pub fn diff(prev: &[Vec<Cell>], next: &[Vec<Cell>]) -> Vec<CellChange> {
        let mut changes = Vec::new();
        for (y, (prev_row, next_row)) in prev.iter().zip(next.iter()).enumerate() {
            for (x, (prev_cell, next_cell)) in prev_row.iter().zip(next_row.iter()).enumerate() {
                if prev_cell != next_cell {
                    changes.push(CellChange {
                        x: x as u16,
                        y: y as u16,
                        cell: next_cell.clone(),
                    });
                }
            }
        }
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::stage::{Node, Sprite};
    use crate::types::{Color, NamedColor};

    fn viewport() -> Viewport {
        Viewport::new(20, 6)
    }

    #[test]
    fn stamps_sprites_with_transparent_spaces() {
        let mut stage = Stage::new();
        stage.spawn(
            Node::new(Sprite::art(&["a b"], Style::fg(Color::Named(NamedColor::Red)))).at(2.0, 1.0),
        );
        let grid = Renderer::rasterize(&stage, viewport());
        assert_eq!(grid[1][2].ch, 'a');
        assert_eq!(grid[1][3].ch, ' ');
        assert_eq!(grid[1][4].ch, 'b');
        assert_eq!(grid[1][2].style.fg, Some(Color::Named(NamedColor::Red)));
    }

    #[test]
    fn higher_z_paints_over_lower() {
        let mut stage = Stage::new();
        stage.spawn(Node::new(Sprite::glyph('x', Style::default())).at(0.0, 0.0).z(5));
        stage.spawn(Node::new(Sprite::glyph('o', Style::default())).at(0.0, 0.0).z(10));
        let grid = Renderer::rasterize(&stage, viewport());
        assert_eq!(grid[0][0].ch, 'o');
    }

    #[test]
    fn out_of_bounds_positions_are_clipped() {
        let mut stage = Stage::new();
        stage.spawn(Node::new(Sprite::glyph('x', Style::default())).at(-3.0, -2.0));
        stage.spawn(Node::new(Sprite::glyph('y', Style::default())).at(100.0, 100.0));
        let grid = Renderer::rasterize(&stage, viewport());
        assert!(grid.iter().flatten().all(|c| c.ch == ' '));
    }

    #[test]
    fn opacity_maps_to_cull_and_dim() {
        let mut stage = Stage::new();
        let faint = stage.spawn(Node::new(Sprite::glyph('f', Style::default())).at(0.0, 0.0));
        let ghost = stage.spawn(Node::new(Sprite::glyph('g', Style::default())).at(1.0, 0.0));
        stage.get_mut(faint).unwrap().transform.opacity = 0.4;
        stage.get_mut(ghost).unwrap().transform.opacity = 0.05;

        let grid = Renderer::rasterize(&stage, viewport());
        assert_eq!(grid[0][0].ch, 'f');
        assert!(grid[0][0].style.dim);
        assert_eq!(grid[0][1].ch, ' ');
    }

    #[test]
    fn parent_fade_dims_children() {
        let mut stage = Stage::new();
        let root = stage.spawn(Node::new(Sprite::empty()));
        stage.get_mut(root).unwrap().transform.opacity = 0.3;
        stage.spawn(Node::new(Sprite::glyph('c', Style::default())).child_of(root));
        let grid = Renderer::rasterize(&stage, viewport());
        assert!(grid[0][0].style.dim);
    }

    #[test]
    fn swollen_nodes_render_bold() {
        let mut stage = Stage::new();
        let id = stage.spawn(Node::new(Sprite::glyph('b', Style::default())));
        stage.get_mut(id).unwrap().transform.scale.x = 1.2;
        let grid = Renderer::rasterize(&stage, viewport());
        assert!(grid[0][0].style.bold);
    }

    #[test]
    fn hidden_nodes_are_not_drawn() {
        let mut stage = Stage::new();
        stage.spawn(Node::new(Sprite::glyph('h', Style::default())).hidden());
        let grid = Renderer::rasterize(&stage, viewport());
        assert_eq!(grid[0][0].ch, ' ');
    }

    #[test]
    fn diff_reports_only_changed_cells() {
        let mut stage = Stage::new();
        let id = stage.spawn(Node::new(Sprite::glyph('x', Style::default())).at(1.0, 1.0));
        let before = Renderer::rasterize(&stage, viewport());

        stage.get_mut(id).unwrap().transform.position.x = 2.0;
        let after = Renderer::rasterize(&stage, viewport());

        let changes = Renderer::diff(&before, &after);
        assert_eq!(changes.len(), 2);
        assert!(changes.iter().any(|c| c.x == 1 && c.y == 1 && c.cell.ch == ' '));
        assert!(changes.iter().any(|c| c.x == 2 && c.y == 1 && c.cell.ch == 'x'));
    }

    #[test]
    fn identical_grids_diff_to_nothing() {
        let mut stage = Stage::new();
        stage.spawn(Node::new(Sprite::glyph('x', Style::default())));
        let a = Renderer::rasterize(&stage, viewport());
        let b = Renderer::rasterize(&stage, viewport());
        assert!(Renderer::diff(&a, &b).is_empty());
    }
}
