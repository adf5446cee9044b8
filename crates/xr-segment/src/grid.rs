use serde::{Deserialize, Serialize};

const DX: [isize; 8] = [1, 1, 0, -1, -1, -1, 0, 1];
const DY: [isize; 8] = [0, -1, -1, -1, 0, 1, 1, 1];
const DIRS_C4: [u8; 4] = [0, 2, 4, 6];
const DIRS_C8: [u8; 8] = [0, 1, 2, 3, 4, 5, 6, 7];

/// Pixel adjacency used for flooding and component labelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    /// Axis-aligned neighbours only.
    #[default]
    C4,
    /// Axis-aligned and diagonal neighbours.
    C8,
}

impl Connectivity {
    /// Direction codes in fixed order: E, N, W, S for `C4`; counter-clockwise
    /// from E for `C8`.
    #[inline]
    pub(crate) fn dirs(self) -> &'static [u8] {
        match self {
            Self::C4 => &DIRS_C4,
            Self::C8 => &DIRS_C8,
        }
    }
}

#[inline]
pub(crate) fn neighbor_index(p: usize, dir: u8, width: usize, height: usize) -> Option<usize> {
    let x = p % width;
    let y = p / width;
    let nx = x as isize + DX[dir as usize];
    let ny = y as isize + DY[dir as usize];
    if nx < 0 || ny < 0 {
        return None;
    }

    let (nxu, nyu) = (nx as usize, ny as usize);
    if nxu >= width || nyu >= height {
        return None;
    }

    Some(nyu * width + nxu)
}

/// Connected components of the pixels for which `member(index)` holds.
///
/// Components come out in row-major order of their first pixel, and each
/// component's pixel list is sorted row-major, so `component[0]` is its
/// top-left-most pixel.
pub fn connected_components(
    width: usize,
    height: usize,
    connectivity: Connectivity,
    member: impl Fn(usize) -> bool,
) -> Vec<Vec<usize>> {
    components_where(width, height, connectivity, &member, |_, nb| member(nb))
}

/// Like [`connected_components`], but two neighbouring members only join when
/// `joins(p, neighbour)` holds.
pub(crate) fn components_where(
    width: usize,
    height: usize,
    connectivity: Connectivity,
    member: impl Fn(usize) -> bool,
    joins: impl Fn(usize, usize) -> bool,
) -> Vec<Vec<usize>> {
    let n = width * height;
    let mut seen = vec![false; n];
    let mut stack = Vec::new();
    let mut out = Vec::new();

    for i in 0..n {
        if seen[i] || !member(i) {
            continue;
        }

        let mut component = Vec::new();
        seen[i] = true;
        stack.push(i);

        while let Some(p) = stack.pop() {
            component.push(p);
            for &dir in connectivity.dirs() {
                let Some(nb) = neighbor_index(p, dir, width, height) else {
                    continue;
                };
                if !seen[nb] && joins(p, nb) {
                    seen[nb] = true;
                    stack.push(nb);
                }
            }
        }

        component.sort_unstable();
        out.push(component);
    }

    out
}
