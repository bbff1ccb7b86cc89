use common::model::template::{TextAlign, TextBox};

/// Largest size, stepping down 1px from `start`, whose measured width fits
/// `max_width`. Never goes below `min`.
pub fn fit_font_size<F>(start: f32, min: f32, max_width: u32, measure: F) -> f32
where
    F: Fn(f32) -> u32,
{
    let min = min.max(1.0);
    let mut size = start.max(min);
    while size > min && measure(size) > max_width {
        size = (size - 1.0).max(min);
    }
    size
}

/// Top-left corner of text of size `text_w` x `text_h` placed in `tb`.
///
/// Text is centred vertically. Text wider than its box starts at the box's
/// left edge whatever the alignment.
pub fn text_origin(tb: &TextBox, text_w: u32, text_h: u32) -> (i32, i32) {
    let x = i64::from(tb.x);
    let free_w = i64::from(tb.width) - i64::from(text_w);
    let x = match tb.align {
        _ if free_w <= 0 => x,
        TextAlign::Left => x,
        TextAlign::Center => x + free_w / 2,
        TextAlign::Right => x + free_w,
    };
    let free_h = i64::from(tb.height) - i64::from(text_h);
    let y = i64::from(tb.y) + free_h / 2;
    (clamp_i32(x), clamp_i32(y.max(0)))
}

fn clamp_i32(v: i64) -> i32 {
    v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Text drawn for `tb`: the row value, else the box default. `None` skips the box.
pub fn resolve_text(tb: &TextBox, value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| {
            tb.default_text
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
        })
        .map(str::to_string)
}
