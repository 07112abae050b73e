use std::sync::OnceLock;

use regex::Regex;

use crate::config::GeometryConfig;
use crate::surface::DomElement;

fn css_length() -> &'static Regex {
    static CSS_LENGTH: OnceLock<Regex> = OnceLock::new();
    CSS_LENGTH.get_or_init(|| {
        Regex::new(r"^\s*(\d*\.?\d+)\s*(px|em|rem|%)?\s*$").expect("Invalid CSS length regex")
    })
}

/// `normal` resolves to this multiple of the font size, as browsers do
const NORMAL_LINE_HEIGHT: f64 = 1.2;
const FALLBACK_FONT_SIZE_PX: f64 = 16.0;

/// Parse a computed `font-size`, falling back to 16px
pub fn parse_font_size(value: &str) -> f64 {
    match css_length().captures(value) {
        Some(caps) if matches!(caps.get(2).map(|unit| unit.as_str()), None | Some("px")) => caps[1]
            .parse()
            .unwrap_or(FALLBACK_FONT_SIZE_PX),
        _ => FALLBACK_FONT_SIZE_PX,
    }
}

/// Resolve a computed `line-height` into pixels.
///
/// Handles `normal`, pixel lengths, `em`/`rem`/`%` and unitless multipliers.
pub fn parse_line_height(value: &str, font_size_px: f64, root_font_size_px: f64) -> f64 {
    let value = value.trim();
    if value.eq_ignore_ascii_case("normal") {
        return font_size_px * NORMAL_LINE_HEIGHT;
    }
    let Some(caps) = css_length().captures(value) else {
        return font_size_px * NORMAL_LINE_HEIGHT;
    };
    let Ok(number) = caps[1].parse::<f64>() else {
        return font_size_px * NORMAL_LINE_HEIGHT;
    };
    match caps.get(2).map(|unit| unit.as_str()) {
        Some("px") => number,
        Some("rem") => number * root_font_size_px,
        Some("%") => number / 100.0 * font_size_px,
        // `em` and unitless multipliers both scale the element's font size
        _ => number * font_size_px,
    }
}

/// Effective line height of an element, in pixels.
///
/// Form-block titles use a fixed override instead of their computed style.
pub fn effective_line_height<E: DomElement>(element: &E, config: &GeometryConfig) -> f64 {
    if element.has_class(&config.large_label_class) {
        return config.large_label_line_height_px;
    }
    let font_size = parse_font_size(&element.computed_font_size());
    let line_height = parse_line_height(
        &element.computed_line_height(),
        font_size,
        config.root_font_size_px,
    );
    if line_height > 0.0 {
        line_height
    } else {
        font_size * NORMAL_LINE_HEIGHT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::headless::HeadlessDom;
    use rstest::rstest;

    #[rstest]
    #[case("normal", 20.0, 24.0)]
    #[case("24px", 16.0, 24.0)]
    #[case(" 18.5px ", 16.0, 18.5)]
    #[case("1.5em", 16.0, 24.0)]
    #[case("2rem", 20.0, 32.0)]
    #[case("1.25", 16.0, 20.0)]
    #[case("150%", 16.0, 24.0)]
    #[case("garbage", 10.0, 12.0)]
    fn test_parse_line_height(#[case] value: &str, #[case] font_size: f64, #[case] expected: f64) {
        assert_eq!(parse_line_height(value, font_size, 16.0), expected);
    }

    #[rstest]
    #[case("16px", 16.0)]
    #[case("20", 20.0)]
    #[case("1.2em", 16.0)]
    #[case("", 16.0)]
    fn test_parse_font_size(#[case] value: &str, #[case] expected: f64) {
        assert_eq!(parse_font_size(value), expected);
    }

    #[test]
    fn test_large_label_uses_fixed_override() {
        let dom = HeadlessDom::new();
        let label = dom.create_editable("Title");
        label.set_line_height_style("normal");
        label.set_font_size_style("20px");
        let config = GeometryConfig::default();
        assert_eq!(effective_line_height(&label, &config), 24.0);

        label.add_class("large-label");
        assert_eq!(effective_line_height(&label, &config), 30.0);
    }
}
