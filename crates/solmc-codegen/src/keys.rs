//! Iterates the coordinate space of a map's representative cells: width
//! is the address-space size, depth the number of keys.

#[derive(Debug)]
pub struct KeyIterator {
    width: usize,
    depth: usize,
    width_offset: usize,
    indices: Vec<usize>,
}

impl KeyIterator {
    pub fn new(width: usize, depth: usize, width_offset: usize) -> Self {
        KeyIterator {
            width,
            depth,
            width_offset,
            indices: Vec::new(),
        }
    }

    /// The `_i_j…` suffix naming the current cell.
    pub fn suffix(&self) -> String {
        let mut s = String::new();
        for idx in &self.indices {
            s.push('_');
            s.push_str(&idx.to_string());
        }
        s
    }

    /// True once every coordinate is populated.
    pub fn is_full(&self) -> bool {
        self.depth > 0 && self.indices.len() == self.depth
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Advances to the next prefix or full coordinate; false once the
    /// space is exhausted.
    pub fn next(&mut self) -> bool {
        if self.width == 0 || self.depth == 0 || self.width <= self.width_offset {
            return false;
        }
        if !self.is_full() {
            self.indices.push(self.width_offset);
        } else {
            *self.indices.last_mut().expect("nonempty") += 1;
            while self.indices.last() == Some(&self.width) {
                self.indices.pop();
                if self.indices.is_empty() {
                    break;
                }
                *self.indices.last_mut().expect("nonempty") += 1;
            }
        }
        !self.indices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_cells(width: usize, depth: usize, offset: usize) -> Vec<String> {
        let mut it = KeyIterator::new(width, depth, offset);
        let mut cells = Vec::new();
        while it.next() {
            if it.is_full() {
                cells.push(it.suffix());
            }
        }
        cells
    }

    #[test]
    fn enumerates_full_coordinates_in_order() {
        assert_eq!(full_cells(2, 2, 0), ["_0_0", "_0_1", "_1_0", "_1_1"]);
    }

    #[test]
    fn offset_skips_the_implicit_prefix() {
        assert_eq!(full_cells(3, 1, 1), ["_1", "_2"]);
    }

    #[test]
    fn degenerate_spaces_are_empty() {
        assert_eq!(full_cells(0, 2, 0), Vec::<String>::new());
        assert_eq!(full_cells(2, 0, 0), Vec::<String>::new());
        assert_eq!(full_cells(2, 1, 2), Vec::<String>::new());
    }
}
