use crate::core::rasterizer::BoundingBox;
use std::ops::Range;

/// 固定尺寸的方形分块网格，按行主序编号
///
/// 分块 `id` 对应 `(id % tiles_per_row, id / tiles_per_row)`，
/// 所有分块的像素区域互不重叠且恰好覆盖整幅图像。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    pub width: usize,
    pub height: usize,
    pub tile_size: usize,
    pub tiles_per_row: usize,
    pub tiles_per_column: usize,
}

impl TileGrid {
    pub fn new(width: usize, height: usize, tile_size: usize) -> Result<Self, String> {
        if width == 0 || height == 0 {
            return Err("错误: 图像宽度和高度必须大于0".to_string());
        }
        if !tile_size.is_power_of_two() {
            return Err(format!("错误: 分块尺寸 {} 必须是2的幂", tile_size));
        }
        if width % tile_size != 0 || height % tile_size != 0 {
            return Err(format!(
                "错误: 图像尺寸 {}x{} 必须是分块尺寸 {} 的整数倍",
                width, height, tile_size
            ));
        }

        Ok(TileGrid {
            width,
            height,
            tile_size,
            tiles_per_row: width / tile_size,
            tiles_per_column: height / tile_size,
        })
    }

    pub fn tile_count(&self) -> usize {
        self.tiles_per_row * self.tiles_per_column
    }

    /// 分块编号 -> 分块网格坐标
    #[inline]
    pub fn tile_coords(&self, id: usize) -> (usize, usize) {
        (id % self.tiles_per_row, id / self.tiles_per_row)
    }

    /// 分块覆盖的像素范围（半开区间）
    pub fn pixel_ranges(&self, id: usize) -> (Range<usize>, Range<usize>) {
        let (tile_x, tile_y) = self.tile_coords(id);
        let ts = self.tile_size;
        (
            tile_x * ts..(tile_x + 1) * ts,
            tile_y * ts..(tile_y + 1) * ts,
        )
    }

    /// 像素所属的分块编号
    #[inline]
    pub fn tile_of_pixel(&self, x: usize, y: usize) -> usize {
        x / self.tile_size + self.tiles_per_row * (y / self.tile_size)
    }

    /// 单轴坐标对齐到分块网格：`coord & !(tile_size - 1)` 再除以分块尺寸，
    /// 结果钳制在网格内（顶点恰好落在图像右/上边界时不会越界）
    #[inline]
    fn snap(&self, coord: f32, tiles: usize) -> usize {
        let mask = self.tile_size - 1;
        let pixel = coord.max(0.0) as usize;
        ((pixel & !mask) / self.tile_size).min(tiles - 1)
    }

    /// 分发：返回与包围盒相交的所有分块编号
    ///
    /// 枚举顺序为 x 外层、y 内层。网格坐标一一对应编号，结果没有重复。
    pub fn tiles_for_box(&self, bounds: &BoundingBox) -> Vec<usize> {
        let min_x = self.snap(bounds.min_x, self.tiles_per_row);
        let min_y = self.snap(bounds.min_y, self.tiles_per_column);
        let max_x = self.snap(bounds.max_x, self.tiles_per_row);
        let max_y = self.snap(bounds.max_y, self.tiles_per_column);

        let mut ids = Vec::with_capacity((max_x - min_x + 1) * (max_y - min_y + 1));
        for x in min_x..=max_x {
            for y in min_y..=max_y {
                ids.push(x + self.tiles_per_row * y);
            }
        }
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn bbox(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> BoundingBox {
        BoundingBox {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    #[test]
    fn rejects_invalid_geometry() {
        assert!(TileGrid::new(64, 64, 12).is_err());
        assert!(TileGrid::new(60, 64, 16).is_err());
        assert!(TileGrid::new(0, 64, 16).is_err());
        assert!(TileGrid::new(64, 32, 16).is_ok());
    }

    #[test]
    fn every_pixel_belongs_to_exactly_one_tile() {
        let grid = TileGrid::new(64, 48, 16).unwrap();
        let mut owners = vec![0u32; grid.width * grid.height];

        for id in 0..grid.tile_count() {
            let (xs, ys) = grid.pixel_ranges(id);
            for y in ys {
                for x in xs.clone() {
                    owners[y * grid.width + x] += 1;
                    assert_eq!(grid.tile_of_pixel(x, y), id);
                }
            }
        }

        assert!(owners.iter().all(|&count| count == 1));
    }

    #[test]
    fn tile_coords_decompose_row_major() {
        let grid = TileGrid::new(64, 64, 16).unwrap();
        assert_eq!(grid.tile_coords(0), (0, 0));
        assert_eq!(grid.tile_coords(3), (3, 0));
        assert_eq!(grid.tile_coords(4), (0, 1));
        assert_eq!(grid.tile_coords(15), (3, 3));
    }

    #[test]
    fn scenario_box_snaps_into_four_tiles() {
        let grid = TileGrid::new(64, 64, 16).unwrap();
        // (10,10), (10,20), (20,10) 的包围盒跨过 x = 16 和 y = 16
        let ids = grid.tiles_for_box(&bbox(10.0, 10.0, 20.0, 20.0));
        assert_eq!(ids, vec![0, 4, 1, 5]);
    }

    #[test]
    fn box_inside_first_tile_maps_to_tile_zero() {
        let grid = TileGrid::new(64, 64, 16).unwrap();
        let ids = grid.tiles_for_box(&bbox(10.0, 10.0, 15.0, 15.0));
        assert_eq!(ids, vec![0]);
    }

    #[test]
    fn enumeration_is_x_major() {
        let grid = TileGrid::new(64, 64, 16).unwrap();
        let ids = grid.tiles_for_box(&bbox(17.0, 1.0, 40.0, 20.0));
        assert_eq!(ids, vec![1, 5, 2, 6]);
    }

    #[test]
    fn right_and_top_edges_clamp_into_grid() {
        let grid = TileGrid::new(64, 64, 16).unwrap();
        let ids = grid.tiles_for_box(&bbox(60.0, 60.0, 64.0, 64.0));
        assert_eq!(ids, vec![15]);
    }

    #[test]
    fn matches_brute_force_overlap() {
        let grid = TileGrid::new(128, 64, 16).unwrap();
        let ts = grid.tile_size as f32;

        // 确定性的伪随机包围盒，全部位于图像内部
        let mut seed = 0x2545_f491_u32;
        let mut next = |limit: f32| {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            (seed % 10_000) as f32 / 10_000.0 * limit
        };

        for _ in 0..500 {
            let (ax, bx) = (next(127.9), next(127.9));
            let (ay, by) = (next(63.9), next(63.9));
            let b = bbox(ax.min(bx), ay.min(by), ax.max(bx), ay.max(by));

            let got: BTreeSet<usize> = grid.tiles_for_box(&b).into_iter().collect();
            let expected: BTreeSet<usize> = (0..grid.tile_count())
                .filter(|&id| {
                    let (tx, ty) = grid.tile_coords(id);
                    let (x0, y0) = (tx as f32 * ts, ty as f32 * ts);
                    x0 <= b.max_x && b.min_x < x0 + ts && y0 <= b.max_y && b.min_y < y0 + ts
                })
                .collect();

            assert_eq!(got, expected, "box {:?}", b);
            assert_eq!(grid.tiles_for_box(&b).len(), got.len());
        }
    }
}
