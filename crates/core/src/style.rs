//! Computed style values and the parsers the classifiers need.
//!
//! [`ComputedStyle`] stores raw CSS values as the host reported them. The
//! typed accessors interpret only the handful of properties that matter for
//! deciding whether something is perceptible, and return
//! [`ClipError::InvalidStyle`] when a value is present but malformed.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::{ClipError, Result};

/// Font size used to resolve `em`/`rem` lengths when no layout is available.
const DEFAULT_FONT_SIZE_PX: f64 = 16.0;

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)([a-zA-Z%]*)$").expect("number pattern"));

static FUNCTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-zA-Z][a-zA-Z0-9-]*)\(([^()]*)\)").expect("function pattern"));

static DECLARATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)([a-zA-Z-]+)\s*:\s*([^;]+)").expect("declaration pattern"));

/// Raw computed style values for one element.
///
/// Field names serialize as CSS property names (`clip-path`, `text-indent`)
/// so a host can dump `getComputedStyle` output directly. Numbers are
/// accepted where CSS would produce them (`"opacity": 0`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ComputedStyle {
    #[serde(deserialize_with = "css_value")]
    pub display: Option<String>,
    #[serde(deserialize_with = "css_value")]
    pub visibility: Option<String>,
    #[serde(deserialize_with = "css_value")]
    pub opacity: Option<String>,
    #[serde(deserialize_with = "css_value")]
    pub transform: Option<String>,
    #[serde(deserialize_with = "css_value")]
    pub filter: Option<String>,
    #[serde(deserialize_with = "css_value")]
    pub clip: Option<String>,
    #[serde(deserialize_with = "css_value")]
    pub clip_path: Option<String>,
    #[serde(deserialize_with = "css_value")]
    pub text_indent: Option<String>,
    #[serde(deserialize_with = "css_value")]
    pub width: Option<String>,
    #[serde(deserialize_with = "css_value")]
    pub height: Option<String>,
}

fn css_value<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(f64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    }))
}

/// Split an inline `style` attribute into `(property, value)` pairs.
///
/// Property names are lowercased and `!important` is dropped. Order is kept
/// so later declarations override earlier ones when applied in sequence.
pub fn parse_declarations(style: &str) -> Vec<(String, String)> {
    DECLARATION
        .captures_iter(style)
        .filter_map(|caps| {
            let property = caps.get(1)?.as_str().trim().to_ascii_lowercase();
            let value = caps.get(2)?.as_str().trim();
            let value = value
                .strip_suffix("!important")
                .map(str::trim_end)
                .unwrap_or(value);
            if value.is_empty() { None } else { Some((property, value.to_string())) }
        })
        .collect()
}

impl ComputedStyle {
    /// Builds a style from an inline `style` attribute.
    pub fn from_inline(style: &str) -> Self {
        let mut computed = Self::default();
        for (property, value) in parse_declarations(style) {
            computed.set(&property, value);
        }
        computed
    }

    /// Sets one property by CSS name. Unknown properties are ignored.
    pub fn set(&mut self, property: &str, value: impl Into<String>) {
        let slot = match property {
            "display" => &mut self.display,
            "visibility" => &mut self.visibility,
            "opacity" => &mut self.opacity,
            "transform" => &mut self.transform,
            "filter" => &mut self.filter,
            "clip" => &mut self.clip,
            "clip-path" => &mut self.clip_path,
            "text-indent" => &mut self.text_indent,
            "width" => &mut self.width,
            "height" => &mut self.height,
            _ => return,
        };
        *slot = Some(value.into());
    }

    pub fn is_display_none(&self) -> bool {
        keyword_is(self.display.as_deref(), "none")
    }

    pub fn is_visibility_hidden(&self) -> bool {
        keyword_is(self.visibility.as_deref(), "hidden")
    }

    /// Opacity as a number in `0.0..=1.0`, `None` when unset.
    pub fn opacity(&self) -> Result<Option<f64>> {
        let Some(value) = non_keyword(self.opacity.as_deref()) else {
            return Ok(None);
        };
        parse_alpha("opacity", value).map(Some)
    }

    /// True when the transform collapses the X or Y axis to zero.
    pub fn has_zero_scale(&self) -> Result<bool> {
        let Some(value) = non_keyword(self.transform.as_deref()) else {
            return Ok(false);
        };

        for caps in FUNCTION.captures_iter(value) {
            let name = caps[1].to_ascii_lowercase();
            let args = caps[2].to_string();
            let numbers = || parse_arguments("transform", &args);

            let collapsed = match name.as_str() {
                "scale" => {
                    let n = numbers()?;
                    let x = first(&n, "transform", value)?;
                    let y = n.get(1).copied().unwrap_or(x);
                    x == 0.0 || y == 0.0
                }
                "scale3d" => {
                    let n = numbers()?;
                    let x = first(&n, "transform", value)?;
                    let y = n.get(1).copied().unwrap_or(x);
                    x == 0.0 || y == 0.0
                }
                "scalex" => first(&numbers()?, "transform", value)? == 0.0,
                "scaley" => first(&numbers()?, "transform", value)? == 0.0,
                "matrix" => {
                    let m = numbers()?;
                    if m.len() != 6 {
                        return Err(invalid("transform", value));
                    }
                    m[0].hypot(m[1]) == 0.0 || m[2].hypot(m[3]) == 0.0
                }
                "matrix3d" => {
                    let m = numbers()?;
                    if m.len() != 16 {
                        return Err(invalid("transform", value));
                    }
                    let sx = (m[0] * m[0] + m[1] * m[1] + m[2] * m[2]).sqrt();
                    let sy = (m[4] * m[4] + m[5] * m[5] + m[6] * m[6]).sqrt();
                    sx == 0.0 || sy == 0.0
                }
                _ => false,
            };

            if collapsed {
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// True when the filter list contains `opacity(0)`.
    pub fn has_zero_filter_opacity(&self) -> Result<bool> {
        let Some(value) = non_keyword(self.filter.as_deref()) else {
            return Ok(false);
        };

        for caps in FUNCTION.captures_iter(value) {
            if caps[1].eq_ignore_ascii_case("opacity") && parse_alpha("filter", caps[2].trim())? == 0.0 {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// True when `clip` is a `rect()` with no area.
    pub fn has_empty_clip(&self) -> Result<bool> {
        let Some(value) = non_keyword(self.clip.as_deref()) else {
            return Ok(false);
        };
        let Some(caps) = FUNCTION.captures(value) else {
            return Ok(false);
        };
        if !caps[1].eq_ignore_ascii_case("rect") {
            return Ok(false);
        }

        let parts = split_arguments(&caps[2]);
        if parts.len() != 4 {
            return Err(invalid("clip", value));
        }
        if parts.iter().any(|p| p.eq_ignore_ascii_case("auto")) {
            return Ok(false);
        }

        let mut edges = [0.0; 4];
        for (slot, part) in edges.iter_mut().zip(&parts) {
            *slot = parse_length("clip", part)?.ok_or_else(|| invalid("clip", value))?;
        }
        let [top, right, bottom, left] = edges;
        Ok(right <= left || bottom <= top)
    }

    /// True when `clip-path: inset(...)` removes the whole box on either axis.
    ///
    /// Pixel insets need the box size; without one only percentages count.
    pub fn clip_path_covers_box(&self, box_size: Option<(f64, f64)>) -> Result<bool> {
        let Some(value) = non_keyword(self.clip_path.as_deref()) else {
            return Ok(false);
        };
        let Some(caps) = FUNCTION.captures(value) else {
            return Ok(false);
        };
        if !caps[1].eq_ignore_ascii_case("inset") {
            return Ok(false);
        }

        let args = caps[2].to_ascii_lowercase();
        let offsets = args.split(" round ").next().unwrap_or_default();
        let parts = split_arguments(offsets);
        if parts.is_empty() || parts.len() > 4 {
            return Err(invalid("clip-path", value));
        }

        // Each side as a fraction of the relevant axis, None when unresolvable.
        let mut sides: Vec<Option<f64>> = Vec::with_capacity(4);
        for (index, part) in parts.iter().enumerate() {
            let axis = if index % 2 == 0 { box_size.map(|(_, h)| h) } else { box_size.map(|(w, _)| w) };
            sides.push(inset_fraction(part, axis).ok_or_else(|| invalid("clip-path", value))?);
        }

        let (top, right, bottom, left) = match sides.as_slice() {
            [all] => (*all, *all, *all, *all),
            [v, h] => (*v, *h, *v, *h),
            [t, h, b] => (*t, *h, *b, *h),
            [t, r, b, l] => (*t, *r, *b, *l),
            _ => return Err(invalid("clip-path", value)),
        };

        let covers = |a: Option<f64>, b: Option<f64>| matches!((a, b), (Some(a), Some(b)) if a + b >= 1.0);
        Ok(covers(top, bottom) || covers(left, right))
    }

    /// `text-indent` in pixels, `None` when unset or not resolvable.
    pub fn text_indent_px(&self) -> Result<Option<f64>> {
        match non_keyword(self.text_indent.as_deref()) {
            Some(value) => parse_length("text-indent", value),
            None => Ok(None),
        }
    }

    /// Declared `width` in pixels, if it is an absolute length.
    pub fn width_px(&self) -> Option<f64> {
        non_keyword(self.width.as_deref()).and_then(|v| parse_length("width", v).ok().flatten())
    }

    /// Declared `height` in pixels, if it is an absolute length.
    pub fn height_px(&self) -> Option<f64> {
        non_keyword(self.height.as_deref()).and_then(|v| parse_length("height", v).ok().flatten())
    }
}

fn keyword_is(value: Option<&str>, keyword: &str) -> bool {
    value.is_some_and(|v| v.trim().eq_ignore_ascii_case(keyword))
}

/// Returns the trimmed value unless it is absent or a CSS-wide keyword.
fn non_keyword(value: Option<&str>) -> Option<&str> {
    let value = value?.trim();
    match value.to_ascii_lowercase().as_str() {
        "" | "none" | "auto" | "inherit" | "initial" | "unset" | "revert" | "normal" => None,
        _ => Some(value),
    }
}

fn invalid(property: &'static str, value: &str) -> ClipError {
    ClipError::InvalidStyle { property, value: value.to_string() }
}

fn split_arguments(args: &str) -> Vec<&str> {
    args.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect()
}

fn first(numbers: &[f64], property: &'static str, value: &str) -> Result<f64> {
    numbers.first().copied().ok_or_else(|| invalid(property, value))
}

/// Parses unitless numbers and percentages (as fractions) from a function argument list.
fn parse_arguments(property: &'static str, args: &str) -> Result<Vec<f64>> {
    split_arguments(args)
        .into_iter()
        .map(|part| {
            let caps = NUMBER.captures(part).ok_or_else(|| invalid(property, args))?;
            let number: f64 = caps[1].parse().map_err(|_| invalid(property, args))?;
            match &caps[2] {
                "" => Ok(number),
                "%" => Ok(number / 100.0),
                _ => Err(invalid(property, args)),
            }
        })
        .collect()
}

fn parse_alpha(property: &'static str, value: &str) -> Result<f64> {
    let caps = NUMBER.captures(value.trim()).ok_or_else(|| invalid(property, value))?;
    let number: f64 = caps[1].parse().map_err(|_| invalid(property, value))?;
    match &caps[2] {
        "" => Ok(number.clamp(0.0, 1.0)),
        "%" => Ok((number / 100.0).clamp(0.0, 1.0)),
        _ => Err(invalid(property, value)),
    }
}

/// Parses a CSS length into pixels.
///
/// Relative units that need layout (`%`, viewport units) resolve to `None`;
/// text that is not a length at all is an error.
fn parse_length(property: &'static str, value: &str) -> Result<Option<f64>> {
    let caps = NUMBER.captures(value.trim()).ok_or_else(|| invalid(property, value))?;
    let number: f64 = caps[1].parse().map_err(|_| invalid(property, value))?;
    match caps[2].to_ascii_lowercase().as_str() {
        "" | "px" => Ok(Some(number)),
        "em" | "rem" => Ok(Some(number * DEFAULT_FONT_SIZE_PX)),
        "pt" => Ok(Some(number * 96.0 / 72.0)),
        "%" | "vw" | "vh" | "vmin" | "vmax" | "ch" | "ex" => Ok(None),
        _ => Err(invalid(property, value)),
    }
}

fn inset_fraction(part: &str, axis: Option<f64>) -> Option<Option<f64>> {
    let caps = NUMBER.captures(part)?;
    let number: f64 = caps[1].parse().ok()?;
    match caps[2].to_ascii_lowercase().as_str() {
        "%" => Some(Some(number / 100.0)),
        "" | "px" => Some(axis.filter(|size| *size > 0.0).map(|size| number / size)),
        _ => Some(None),
    }
}
