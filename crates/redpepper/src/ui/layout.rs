//! Rectangle splitting and frame composition.
//!
//! Sub-views render themselves to plain text; the compositor writes
//! each block into a shared character grid by rectangle and flattens
//! the grid to one frame string with normalized line endings. Splits
//! are either fixed-size or a percentage of the remaining space.

use ratatui::layout::Rect;

/// Size of the first region produced by a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Fixed(u16),
    Percent(u16),
}

fn first_extent(total: u16, split: Split) -> u16 {
    match split {
        Split::Fixed(n) => n.min(total),
        Split::Percent(p) => ((total as u32 * p.min(100) as u32) / 100) as u16,
    }
}

/// Partition `area` into a top and bottom region.
pub fn split_vertical(area: Rect, first: Split) -> (Rect, Rect) {
    let top_height = first_extent(area.height, first);
    let top = Rect {
        height: top_height,
        ..area
    };
    let bottom = Rect {
        y: area.y + top_height,
        height: area.height - top_height,
        ..area
    };
    (top, bottom)
}

/// Partition `area` into a left and right region.
pub fn split_horizontal(area: Rect, first: Split) -> (Rect, Rect) {
    let left_width = first_extent(area.width, first);
    let left = Rect {
        width: left_width,
        ..area
    };
    let right = Rect {
        x: area.x + left_width,
        width: area.width - left_width,
        ..area
    };
    (left, right)
}

pub fn contains(area: Rect, x: u16, y: u16) -> bool {
    x >= area.x && x < area.x + area.width && y >= area.y && y < area.y + area.height
}

/// A character grid the size of the terminal. Content blocks are
/// written by rectangle, clipped to the grid; later writes win.
pub struct FrameBuffer {
    width: u16,
    height: u16,
    rows: Vec<Vec<char>>,
}

impl FrameBuffer {
    pub fn new(width: u16, height: u16) -> Self {
        FrameBuffer {
            width,
            height,
            rows: vec![vec![' '; width as usize]; height as usize],
        }
    }

    /// Write a text block into `area`. Lines beyond the rectangle are
    /// dropped, long lines are clipped, and carriage returns are
    /// stripped.
    pub fn set_content(&mut self, area: Rect, text: &str) {
        for (offset, line) in text.lines().enumerate() {
            let offset = offset as u16;
            if offset >= area.height {
                break;
            }
            let y = area.y + offset;
            if y >= self.height {
                break;
            }
            let row = &mut self.rows[y as usize];
            for (index, ch) in line.chars().filter(|ch| *ch != '\r').enumerate() {
                let index = index as u16;
                if index >= area.width {
                    break;
                }
                let x = area.x + index;
                if x >= self.width {
                    break;
                }
                row[x as usize] = ch;
            }
        }
    }

    /// Flatten to the final frame: rows joined by `\n`, trailing
    /// blanks trimmed per row.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity((self.width as usize + 1) * self.height as usize);
        for (index, row) in self.rows.iter().enumerate() {
            if index > 0 {
                out.push('\n');
            }
            let line: String = row.iter().collect();
            out.push_str(line.trim_end());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::{contains, split_horizontal, split_vertical, FrameBuffer, Split};
    use ratatui::layout::Rect;

    fn area(width: u16, height: u16) -> Rect {
        Rect {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    #[test]
    fn fixed_vertical_split_partitions_exactly() {
        let (top, bottom) = split_vertical(area(80, 24), Split::Fixed(3));
        assert_eq!(top.height, 3);
        assert_eq!(bottom.y, 3);
        assert_eq!(bottom.height, 21);
        assert_eq!(top.width, 80);
    }

    #[test]
    fn fixed_split_clamps_to_available_space() {
        let (top, bottom) = split_vertical(area(80, 2), Split::Fixed(5));
        assert_eq!(top.height, 2);
        assert_eq!(bottom.height, 0);
    }

    #[test]
    fn percent_split_uses_share_of_total() {
        let (left, right) = split_horizontal(area(100, 24), Split::Percent(30));
        assert_eq!(left.width, 30);
        assert_eq!(right.x, 30);
        assert_eq!(right.width, 70);
    }

    #[test]
    fn contains_is_half_open() {
        let rect = Rect {
            x: 2,
            y: 3,
            width: 4,
            height: 2,
        };
        assert!(contains(rect, 2, 3));
        assert!(contains(rect, 5, 4));
        assert!(!contains(rect, 6, 4));
        assert!(!contains(rect, 2, 5));
    }

    #[test]
    fn set_content_clips_to_rectangle() {
        let mut buffer = FrameBuffer::new(10, 3);
        let rect = Rect {
            x: 2,
            y: 1,
            width: 3,
            height: 1,
        };
        buffer.set_content(rect, "abcdef\nsecond line");
        let frame = buffer.render();
        assert_eq!(frame, "\n  abc\n");
    }

    #[test]
    fn set_content_strips_carriage_returns() {
        let mut buffer = FrameBuffer::new(8, 1);
        buffer.set_content(area(8, 1), "ab\r");
        assert_eq!(buffer.render(), "ab");
    }

    #[test]
    fn later_writes_overwrite_earlier_ones() {
        let mut buffer = FrameBuffer::new(4, 1);
        buffer.set_content(area(4, 1), "aaaa");
        buffer.set_content(area(2, 1), "bb");
        assert_eq!(buffer.render(), "bbaa");
    }
}
