use std::collections::HashMap;

use once_cell::sync::Lazy;

const GLYPH_HEIGHT: usize = 5;
const GLYPH_WIDTH: usize = 3;
const SPACING: usize = 1;
const FILL_CHAR: char = '█';

type Glyph = [&'static str; GLYPH_HEIGHT];

static GLYPHS: Lazy<HashMap<char, Glyph>> = Lazy::new(|| {
    HashMap::from([
        ('0', ["111", "1 1", "1 1", "1 1", "111"]),
        ('1', [" 1 ", "11 ", " 1 ", " 1 ", "111"]),
        ('2', ["111", "  1", "111", "1  ", "111"]),
        ('3', ["111", "  1", " 11", "  1", "111"]),
        ('4', ["1 1", "1 1", "111", "  1", "  1"]),
        ('5', ["111", "1  ", "111", "  1", "111"]),
        ('6', ["111", "1  ", "111", "1 1", "111"]),
        ('7', ["111", "  1", "  1", "  1", "  1"]),
        ('8', ["111", "1 1", "111", "1 1", "111"]),
        ('9', ["111", "1 1", "111", "  1", "111"]),
        (':', ["   ", " 1 ", "   ", " 1 ", "   "]),
    ])
});

/// Format seconds as `M:SS`.
pub fn clock_label(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Render digits and colons as block rows; other characters are skipped.
pub fn render(text: &str) -> Vec<String> {
    let glyphs: Vec<&Glyph> = text.chars().filter_map(|ch| GLYPHS.get(&ch)).collect();
    if glyphs.is_empty() {
        return Vec::new();
    }

    (0..GLYPH_HEIGHT)
        .map(|row| {
            glyphs
                .iter()
                .map(|glyph| paint_row(glyph[row]))
                .collect::<Vec<_>>()
                .join(&" ".repeat(SPACING))
        })
        .collect()
}

fn paint_row(pattern: &str) -> String {
    pattern
        .chars()
        .take(GLYPH_WIDTH)
        .map(|cell| if cell == '1' { FILL_CHAR } else { ' ' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_pad_seconds() {
        assert_eq!(clock_label(180), "3:00");
        assert_eq!(clock_label(65), "1:05");
        assert_eq!(clock_label(0), "0:00");
    }

    #[test]
    fn renders_fixed_height_rows() {
        let rows = render("1:05");
        assert_eq!(rows.len(), GLYPH_HEIGHT);
        let width = 4 * GLYPH_WIDTH + 3 * SPACING;
        assert!(rows.iter().all(|row| row.chars().count() == width));
        assert!(render("abc").is_empty());
    }
}
