use tracing::{debug, info, trace};

use crate::geometry::{manhattan_distance, PixelPoint, TileCoord};
use crate::tiles::{blocks_movement, TileGrid};

const UNREACHED: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeIndex(usize);

impl NodeIndex {
    pub fn get(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct PathNode {
    tile: TileCoord,
    barrier: bool,
    visited: bool,
    local_goal: u32,
    global_goal: u32,
    neighbours: Vec<NodeIndex>,
    parent: Option<NodeIndex>,
}

impl PathNode {
    pub fn tile(&self) -> TileCoord {
        self.tile
    }

    pub fn is_barrier(&self) -> bool {
        self.barrier
    }

    pub fn is_visited(&self) -> bool {
        self.visited
    }

    /// Steps from the search origin; `None` until reached.
    pub fn local_goal(&self) -> Option<u32> {
        (self.local_goal != UNREACHED).then_some(self.local_goal)
    }

    pub fn global_goal(&self) -> Option<u32> {
        (self.global_goal != UNREACHED).then_some(self.global_goal)
    }

    /// Up, down, left, right; edge tiles have fewer.
    pub fn neighbours(&self) -> &[NodeIndex] {
        &self.neighbours
    }

    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    fn reset(&mut self) {
        self.visited = false;
        self.local_goal = UNREACHED;
        self.global_goal = UNREACHED;
        self.parent = None;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub expanded: usize,
}

/// Tiles from the agent's tile to the target's tile, in walking order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    tiles: Vec<TileCoord>,
    tile_size: u32,
}

impl Route {
    pub fn tiles(&self) -> &[TileCoord] {
        &self.tiles
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn start(&self) -> Option<TileCoord> {
        self.tiles.first().copied()
    }

    pub fn end(&self) -> Option<TileCoord> {
        self.tiles.last().copied()
    }

    pub fn tile_centre_px(&self, tile: TileCoord) -> PixelPoint {
        tile_centre_px(tile, self.tile_size)
    }

    pub fn iter(&self) -> impl Iterator<Item = TileCoord> + '_ {
        self.tiles.iter().copied()
    }
}

pub fn tile_centre_px(tile: TileCoord, tile_size: u32) -> PixelPoint {
    let size = tile_size as i32;
    PixelPoint::new(tile.x as i32 * size + size / 2, tile.y as i32 * size + size / 2)
}

/// Search arena over the tile grid, one node per tile in row-major order.
#[derive(Debug, Clone)]
pub struct PathGraph {
    width: u32,
    height: u32,
    tile_size: u32,
    nodes: Vec<PathNode>,
    generation: u64,
    last_stats: SearchStats,
}

impl PathGraph {
    pub fn build(grid: &TileGrid) -> Self {
        let mut graph = Self {
            width: grid.width(),
            height: grid.height(),
            tile_size: grid.tile_size(),
            nodes: Vec::new(),
            generation: 0,
            last_stats: SearchStats::default(),
        };
        graph.nodes = link_nodes(grid);
        info!(
            width = graph.width,
            height = graph.height,
            barriers = graph.barrier_count(),
            "path_graph_built"
        );
        graph
    }

    /// Recomputes barriers and links from the grid's current codes.
    pub fn rebuild(&mut self, grid: &TileGrid) {
        self.width = grid.width();
        self.height = grid.height();
        self.tile_size = grid.tile_size();
        self.nodes = link_nodes(grid);
        self.generation = self.generation.wrapping_add(1);
        self.last_stats = SearchStats::default();
        info!(
            generation = self.generation,
            barriers = self.barrier_count(),
            "path_graph_rebuilt"
        );
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Bumped by every rebuild; holders of cached routes compare against it.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn last_stats(&self) -> SearchStats {
        self.last_stats
    }

    pub fn nodes(&self) -> &[PathNode] {
        &self.nodes
    }

    pub fn node(&self, index: NodeIndex) -> Option<&PathNode> {
        self.nodes.get(index.0)
    }

    pub fn index_of(&self, tile: TileCoord) -> Option<NodeIndex> {
        if tile.x >= self.width || tile.y >= self.height {
            return None;
        }
        Some(NodeIndex(
            tile.y as usize * self.width as usize + tile.x as usize,
        ))
    }

    pub fn tile_of_pixel(&self, point: PixelPoint) -> Option<TileCoord> {
        if point.x < 0 || point.y < 0 || self.tile_size == 0 {
            return None;
        }
        let size = self.tile_size as i32;
        let tile = TileCoord::new((point.x / size) as u32, (point.y / size) as u32);
        self.index_of(tile).map(|_| tile)
    }

    pub fn tile_centre_px(&self, tile: TileCoord) -> PixelPoint {
        tile_centre_px(tile, self.tile_size)
    }

    fn barrier_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.barrier).count()
    }

    /// Searches from the target's tile toward the agent's tile so the parent
    /// chain read from the agent already points at the target. Greedy: stops
    /// as soon as the agent's tile is popped.
    pub fn solve_path(&mut self, agent: PixelPoint, target: PixelPoint) -> Option<Route> {
        self.last_stats = SearchStats::default();
        for node in &mut self.nodes {
            node.reset();
        }

        let origin_tile = self.tile_of_pixel(target)?;
        let destination_tile = self.tile_of_pixel(agent)?;
        let origin = self.index_of(origin_tile)?;
        let destination = self.index_of(destination_tile)?;
        if self.nodes[origin.0].barrier || self.nodes[destination.0].barrier {
            debug!(
                target_x = origin_tile.x,
                target_y = origin_tile.y,
                agent_x = destination_tile.x,
                agent_y = destination_tile.y,
                "path_endpoint_on_barrier"
            );
            return None;
        }
        if origin == destination {
            return Some(Route {
                tiles: vec![destination_tile],
                tile_size: self.tile_size,
            });
        }

        self.nodes[origin.0].local_goal = 0;
        self.nodes[origin.0].global_goal = manhattan_distance(origin_tile, destination_tile);
        let mut frontier = vec![origin];
        let mut expanded = 0usize;
        let mut reached = false;

        while !frontier.is_empty() {
            let nodes = &self.nodes;
            frontier.sort_by_key(|index| nodes[index.0].global_goal);
            let skip = frontier
                .iter()
                .take_while(|index| nodes[index.0].visited)
                .count();
            frontier.drain(..skip);
            if frontier.is_empty() {
                break;
            }

            let current = frontier.remove(0);
            self.nodes[current.0].visited = true;
            expanded += 1;
            if current == destination {
                reached = true;
                break;
            }

            let current_local = self.nodes[current.0].local_goal;
            let current_tile = self.nodes[current.0].tile;
            let neighbours = self.nodes[current.0].neighbours.clone();
            for neighbour in neighbours {
                let node = &mut self.nodes[neighbour.0];
                if node.visited || node.barrier {
                    continue;
                }
                frontier.push(neighbour);
                let step = manhattan_distance(current_tile, node.tile);
                let potential = current_local.saturating_add(step);
                if potential < node.local_goal {
                    node.parent = Some(current);
                    node.local_goal = potential;
                    node.global_goal =
                        potential.saturating_add(manhattan_distance(node.tile, destination_tile));
                }
            }
        }

        self.last_stats = SearchStats { expanded };
        if !reached {
            debug!(
                agent_x = destination_tile.x,
                agent_y = destination_tile.y,
                expanded,
                "path_search_exhausted"
            );
            return None;
        }

        let route = self.collect_route(destination)?;
        trace!(expanded, route_len = route.len(), "path_solved");
        Some(route)
    }

    fn collect_route(&self, destination: NodeIndex) -> Option<Route> {
        let mut tiles = Vec::new();
        let mut cursor = Some(destination);
        while let Some(index) = cursor {
            if tiles.len() > self.nodes.len() {
                return None;
            }
            let node = self.nodes.get(index.0)?;
            tiles.push(node.tile);
            cursor = node.parent;
        }
        Some(Route {
            tiles,
            tile_size: self.tile_size,
        })
    }
}

fn link_nodes(grid: &TileGrid) -> Vec<PathNode> {
    let width = grid.width();
    let height = grid.height();
    let index = |x: u32, y: u32| NodeIndex(y as usize * width as usize + x as usize);

    let mut nodes = Vec::with_capacity(width as usize * height as usize);
    for y in 0..height {
        for x in 0..width {
            let tile = TileCoord::new(x, y);
            let code = grid.code_at(tile).unwrap_or_default();
            let mut neighbours = Vec::with_capacity(4);
            if y > 0 {
                neighbours.push(index(x, y - 1));
            }
            if y + 1 < height {
                neighbours.push(index(x, y + 1));
            }
            if x > 0 {
                neighbours.push(index(x - 1, y));
            }
            if x + 1 < width {
                neighbours.push(index(x + 1, y));
            }
            nodes.push(PathNode {
                tile,
                barrier: blocks_movement(code),
                visited: false,
                local_goal: UNREACHED,
                global_goal: UNREACHED,
                neighbours,
                parent: None,
            });
        }
    }
    nodes
}
