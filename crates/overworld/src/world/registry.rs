use std::path::Path;
use std::rc::Rc;

use tracing::{info, warn};

use crate::config::{AssetDirs, CacheCapacities, KindDir};
use crate::content::{
    Blockset, CacheStats, Cell, ConnectionDirection, IdList, Layout, LoadError, Map, MapId,
    MapSources, ResourceCache, ResourceKind, Tileset, Warp,
};

/// Connection hops followed before a lookup gives up. Valid data never chains
/// anywhere near this deep; the bound keeps a cyclic offset bug from recursing
/// forever.
const MAX_CONNECTION_DEPTH: u32 = 64;

/// Which grid a resolved cell came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellOwner {
    /// A real layout cell, with coordinates local to `map`.
    Map { map: MapId, x: i32, y: i32 },
    /// A repeating border cell of the last map the lookup reached.
    Border { map: MapId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCell {
    pub cell: Cell,
    pub owner: CellOwner,
}

impl ResolvedCell {
    pub fn is_border(&self) -> bool {
        matches!(self.owner, CellOwner::Border { .. })
    }
}

/// Central id-keyed access to every resource. Maps refer to each other only
/// by id through connections, so the world graph has no ownership cycles.
pub struct Registry {
    tilesets: ResourceCache<Tileset>,
    blocksets: ResourceCache<Blockset>,
    layouts: ResourceCache<Layout>,
    maps: ResourceCache<Map>,
}

impl Registry {
    pub fn open(
        root: &Path,
        dirs: &AssetDirs,
        capacities: &CacheCapacities,
    ) -> Result<Self, LoadError> {
        let registry = Self {
            tilesets: open_cache(
                root,
                ResourceKind::Tileset,
                &dirs.tilesets,
                "png",
                capacities.tilesets,
            )?,
            blocksets: open_cache(
                root,
                ResourceKind::Blockset,
                &dirs.blocksets,
                "pgeblockset",
                capacities.blocksets,
            )?,
            layouts: open_cache(
                root,
                ResourceKind::Layout,
                &dirs.layouts,
                "pgelayout",
                capacities.layouts,
            )?,
            maps: open_cache(root, ResourceKind::Map, &dirs.maps, "pgemap", capacities.maps)?,
        };
        info!(
            root = %root.display(),
            tilesets = registry.tilesets.ids().len(),
            blocksets = registry.blocksets.ids().len(),
            layouts = registry.layouts.ids().len(),
            maps = registry.maps.ids().len(),
            "registry_opened"
        );
        Ok(registry)
    }

    pub fn tileset(&self, id: u32) -> Result<Rc<Tileset>, LoadError> {
        self.tilesets.load_or_get(id, |path| Tileset::load(id, path))
    }

    pub fn blockset(&self, id: u32) -> Result<Rc<Blockset>, LoadError> {
        self.blocksets
            .load_or_get(id, |path| Blockset::load(id, path, &self.tilesets))
    }

    pub fn layout(&self, id: u32) -> Result<Rc<Layout>, LoadError> {
        self.layouts.load_or_get(id, |path| {
            Layout::load(id, path, &self.blocksets, &self.tilesets)
        })
    }

    pub fn map(&self, id: MapId) -> Result<Rc<Map>, LoadError> {
        let sources = MapSources {
            maps: &self.maps,
            layouts: &self.layouts,
            blocksets: &self.blocksets,
            tilesets: &self.tilesets,
        };
        self.maps.load_or_get(id, |path| Map::load(id, path, &sources))
    }

    pub fn map_id(&self, name: &str) -> Option<MapId> {
        self.maps.ids().id_of(name)
    }

    pub fn map_name(&self, id: MapId) -> Option<&str> {
        self.maps.ids().name(id)
    }

    pub fn map_stats(&self) -> CacheStats {
        self.maps.stats()
    }

    /// Lets every resource nothing else holds be dropped.
    pub fn release_unused(&self) {
        self.maps.release_unused();
        self.layouts.release_unused();
        self.blocksets.release_unused();
        self.tilesets.release_unused();
    }

    /// Resolves `(x, y)` in `map`'s coordinate space.
    ///
    /// In-bounds coordinates return the local cell without touching any other
    /// map. Outside the layout, connections on the overshot edge are tried
    /// (north, south, west, east) and the first whose span covers the
    /// coordinate is followed into the neighbour's own space. Failing that the
    /// border repeats, and with no border the position is void (`None`).
    pub fn get_block(&self, map: MapId, x: i32, y: i32) -> Result<Option<ResolvedCell>, LoadError> {
        self.resolve(map, x, y, 0)
    }

    fn resolve(
        &self,
        map_id: MapId,
        x: i32,
        y: i32,
        depth: u32,
    ) -> Result<Option<ResolvedCell>, LoadError> {
        let map = self.map(map_id)?;
        let layout = map.layout();
        if let Some(cell) = layout.cell(x, y) {
            return Ok(Some(ResolvedCell {
                cell: cell.clone(),
                owner: CellOwner::Map { map: map_id, x, y },
            }));
        }

        if depth < MAX_CONNECTION_DEPTH {
            for direction in overshot_edges(layout, x, y) {
                for connection in map.connections().iter().filter(|c| c.direction == direction) {
                    let neighbour = self.map(connection.map)?;
                    let other = neighbour.layout();
                    let rebased = match direction {
                        ConnectionDirection::North => within(x, connection.offset, other.width())
                            .then(|| (x - connection.offset, other.height() + y)),
                        ConnectionDirection::South => within(x, connection.offset, other.width())
                            .then(|| (x - connection.offset, y - layout.height())),
                        ConnectionDirection::West => within(y, connection.offset, other.height())
                            .then(|| (other.width() + x, y - connection.offset)),
                        ConnectionDirection::East => within(y, connection.offset, other.height())
                            .then(|| (x - layout.width(), y - connection.offset)),
                    };
                    if let Some((nx, ny)) = rebased {
                        return self.resolve(connection.map, nx, ny, depth + 1);
                    }
                }
            }
        } else {
            warn!(map_id, x, y, "connection_depth_exceeded");
        }

        Ok(layout.border_cell(x, y).map(|cell| ResolvedCell {
            cell: cell.clone(),
            owner: CellOwner::Border { map: map_id },
        }))
    }

    pub fn warp_at(
        &self,
        map: MapId,
        x: i32,
        y: i32,
        elevation: u8,
    ) -> Result<Option<Warp>, LoadError> {
        Ok(self.map(map)?.warp_at(x, y, elevation).copied())
    }
}

fn open_cache<T>(
    root: &Path,
    kind: ResourceKind,
    kind_dir: &KindDir,
    extension: &'static str,
    capacity: usize,
) -> Result<ResourceCache<T>, LoadError> {
    let ids = IdList::load(&root.join(&kind_dir.id_list))?;
    Ok(ResourceCache::new(
        kind,
        ids,
        root.join(&kind_dir.dir),
        extension,
        capacity,
    ))
}

fn within(value: i32, offset: i32, span: i32) -> bool {
    value >= offset && value < offset.saturating_add(span)
}

fn overshot_edges(layout: &Layout, x: i32, y: i32) -> impl Iterator<Item = ConnectionDirection> {
    [
        (y < 0, ConnectionDirection::North),
        (y >= layout.height(), ConnectionDirection::South),
        (x < 0, ConnectionDirection::West),
        (x >= layout.width(), ConnectionDirection::East),
    ]
    .into_iter()
    .filter_map(|(overshot, direction)| overshot.then_some(direction))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::content::Passage;
    use crate::test_support::{AssetWriter, BlockSpec, CellSpec, LayoutSpec, MapSpec};
    use crate::world::Behavior;

    struct Fixture {
        _temp: TempDir,
        registry: Registry,
        a: MapId,
        b: MapId,
    }

    /// Map A (4x3) with map B (3x3) hanging off its south edge at `offset`.
    fn stitched(offset: i32) -> Fixture {
        let temp = TempDir::new().expect("temp");
        let mut assets = AssetWriter::new(temp.path());
        let tileset = assets.tileset("outdoor", &[[1, 2, 3, 255]]);
        let blockset = assets.blockset(
            "general",
            &[
                BlockSpec::new(Behavior::None).with_tile(0, 0, tileset, 0, false, false),
                BlockSpec::new(Behavior::Sign),
            ],
        );
        let a_layout = assets.layout("a", &LayoutSpec::filled(4, 3, CellSpec::open(blockset, 0)));
        let mut b_fixture = LayoutSpec::filled(3, 3, CellSpec::open(blockset, 0));
        b_fixture.set(1, 0, CellSpec::new(blockset, 1, 2, Passage::ALLOW_OCCUPANCY));
        let b_layout = assets.layout("b", &b_fixture);

        let mut a_map = MapSpec::new(a_layout);
        a_map.connect(ConnectionDirection::South, 1, offset);
        let mut b_map = MapSpec::new(b_layout);
        b_map.connect(ConnectionDirection::North, 0, -offset);
        let a = assets.map("A", &a_map);
        let b = assets.map("B", &b_map);
        Fixture {
            registry: assets.registry(),
            _temp: temp,
            a,
            b,
        }
    }

    #[test]
    fn south_connection_resolves_into_neighbour() {
        let fixture = stitched(0);
        let through_a = fixture
            .registry
            .get_block(fixture.a, 1, 3)
            .expect("lookup")
            .expect("cell");
        let direct = fixture
            .registry
            .get_block(fixture.b, 1, 0)
            .expect("lookup")
            .expect("cell");
        assert_eq!(through_a, direct);
        assert_eq!(
            through_a.owner,
            CellOwner::Map {
                map: fixture.b,
                x: 1,
                y: 0
            }
        );
        assert_eq!(through_a.cell.block().behavior(), Behavior::Sign);
    }

    #[test]
    fn offset_rebases_along_the_edge() {
        let fixture = stitched(1);
        let resolved = fixture
            .registry
            .get_block(fixture.a, 2, 3)
            .expect("lookup")
            .expect("cell");
        assert_eq!(
            resolved.owner,
            CellOwner::Map {
                map: fixture.b,
                x: 1,
                y: 0
            }
        );
        assert!(fixture.registry.get_block(fixture.a, 0, 3).expect("lookup").is_none());
    }

    #[test]
    fn north_connection_walks_back_into_the_first_map() {
        let fixture = stitched(0);
        let resolved = fixture
            .registry
            .get_block(fixture.b, 2, -1)
            .expect("lookup")
            .expect("cell");
        assert_eq!(
            resolved.owner,
            CellOwner::Map {
                map: fixture.a,
                x: 2,
                y: 2
            }
        );
    }

    #[test]
    fn lookups_chain_through_several_maps() {
        let fixture = stitched(0);
        // Two rows past B's south edge: B has no south connection and no border.
        assert!(fixture.registry.get_block(fixture.a, 1, 6).expect("lookup").is_none());
        // Far north of B walks through A and out of A's north edge into void.
        assert!(fixture.registry.get_block(fixture.b, 1, -4).expect("lookup").is_none());
    }

    #[test]
    fn in_bounds_lookup_never_loads_a_neighbour() {
        let fixture = stitched(0);
        fixture.registry.get_block(fixture.a, 3, 2).expect("lookup");
        assert_eq!(fixture.registry.map_stats().loads, 1);
        fixture.registry.get_block(fixture.a, 0, 3).expect("lookup");
        assert_eq!(fixture.registry.map_stats().loads, 2);
    }

    #[test]
    fn void_without_connection_or_border() {
        let fixture = stitched(0);
        assert!(fixture.registry.get_block(fixture.a, -1, 0).expect("lookup").is_none());
        assert!(fixture.registry.get_block(fixture.a, 4, 1).expect("lookup").is_none());
    }

    #[test]
    fn border_fills_unclaimed_space() {
        let temp = TempDir::new().expect("temp");
        let mut assets = AssetWriter::new(temp.path());
        let blockset = assets.plain_blockset();
        let mut fixture = LayoutSpec::filled(2, 2, CellSpec::open(blockset, 0));
        let mut border = LayoutSpec::filled(4, 2, CellSpec::open(blockset, 0));
        border.set(3, 1, CellSpec::new(blockset, 0, 5, Passage::empty()));
        fixture.border = Some(Box::new(border));
        let layout = assets.layout("cave", &fixture);
        let map = assets.map("Cave", &MapSpec::new(layout));
        let registry = assets.registry();

        let wrapped = registry.get_block(map, -1, -1).expect("lookup").expect("border");
        let direct = registry.get_block(map, 3, 1).expect("lookup").expect("border");
        assert_eq!(wrapped, direct);
        assert!(wrapped.is_border());
        assert_eq!(wrapped.cell.elevation(), 5);
    }

    #[test]
    fn warp_lookup_matches_position_and_elevation() {
        let temp = TempDir::new().expect("temp");
        let mut assets = AssetWriter::new(temp.path());
        let blockset = assets.plain_blockset();
        let layout = assets.layout("house", &LayoutSpec::filled(3, 3, CellSpec::open(blockset, 0)));
        let mut fixture = MapSpec::new(layout);
        fixture.warps.push(Warp {
            x: 1,
            y: 2,
            elevation: 0,
            dest_map: 0,
            dest_x: 0,
            dest_y: 0,
            dest_elevation: 0,
        });
        let map = assets.map("House", &fixture);
        let registry = assets.registry();

        assert!(registry.warp_at(map, 1, 2, 0).expect("lookup").is_some());
        assert!(registry.warp_at(map, 1, 1, 0).expect("lookup").is_none());
        assert_eq!(registry.map_id("House"), Some(map));
        assert_eq!(registry.map_name(map), Some("House"));
    }
}
