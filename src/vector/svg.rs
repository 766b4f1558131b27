//! SVG serialization of path sets and the independent re-parse used by the
//! CAD and mesh back ends.
//!
//! The writer only ever emits `M`/`L` commands. The reader understands the
//! full path grammar (`M L H V C S Q T A Z`, absolute and relative) and
//! reports anything it cannot turn into a segment instead of failing the
//! whole document.

use std::fmt::Write as _;
use std::path::Path as StdPath;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::warn;

use crate::models::{PathSet, Point2, SkippedItem};

const MARGIN: f64 = 1.0;

/// Render a path set as an SVG document
pub fn render_svg(paths: &PathSet) -> String {
    let (min, max) = paths
        .bounds()
        .unwrap_or((Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)));
    let x = min.x - MARGIN;
    let y = min.y - MARGIN;
    let width = (max.x - min.x) + 2.0 * MARGIN;
    let height = (max.y - min.y) + 2.0 * MARGIN;

    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(
        out,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" width=\"{width}\" height=\"{height}\" viewBox=\"{x} {y} {width} {height}\">"
    );

    for (idx, path) in paths.paths.iter().enumerate() {
        if path.is_empty() {
            continue;
        }
        let mut d = String::new();
        let mut pen: Option<Point2> = None;
        for segment in &path.segments {
            if pen != Some(segment.start) {
                if !d.is_empty() {
                    d.push(' ');
                }
                let _ = write!(d, "M {},{}", segment.start.x, segment.start.y);
            }
            let _ = write!(d, " L {},{}", segment.end.x, segment.end.y);
            pen = Some(segment.end);
        }
        let _ = writeln!(
            out,
            "  <path id=\"path-{idx}\" d=\"{d}\" fill=\"none\" stroke=\"#000000\" stroke-width=\"1\"/>"
        );
    }

    out.push_str("</svg>\n");
    out
}

/// Write a path set to `output`, creating or replacing the file
pub fn write_svg(paths: &PathSet, output: &StdPath) -> std::io::Result<()> {
    std::fs::write(output, render_svg(paths))
}

/// One parsed path segment, in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    Line {
        start: Point2,
        end: Point2,
    },
    Quadratic {
        start: Point2,
        control: Point2,
        end: Point2,
    },
    Cubic {
        start: Point2,
        control1: Point2,
        control2: Point2,
        end: Point2,
    },
    Arc {
        start: Point2,
        radii: (f64, f64),
        rotation: f64,
        large_arc: bool,
        sweep: bool,
        end: Point2,
    },
}

impl Segment {
    pub fn start(&self) -> Point2 {
        match *self {
            Self::Line { start, .. }
            | Self::Quadratic { start, .. }
            | Self::Cubic { start, .. }
            | Self::Arc { start, .. } => start,
        }
    }

    pub fn end(&self) -> Point2 {
        match *self {
            Self::Line { end, .. }
            | Self::Quadratic { end, .. }
            | Self::Cubic { end, .. }
            | Self::Arc { end, .. } => end,
        }
    }

    pub fn is_line(&self) -> bool {
        matches!(self, Self::Line { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Line { .. } => "line",
            Self::Quadratic { .. } => "quadratic",
            Self::Cubic { .. } => "cubic",
            Self::Arc { .. } => "arc",
        }
    }
}

/// A `<path>` element after parsing its `d` attribute
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPath {
    pub id: Option<String>,
    pub segments: Vec<Segment>,
    /// Commands that could not be turned into segments
    pub rejected: Vec<SkippedItem>,
}

/// Typed form of a vector document, independent of the tracer that wrote it
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VectorDocument {
    pub paths: Vec<ParsedPath>,
}

impl VectorDocument {
    /// Read and parse an SVG file
    pub fn read(path: &StdPath) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read vector document {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse vector document {}", path.display()))
    }

    /// Parse SVG text. Only a missing `<svg>` root is fatal.
    pub fn parse(content: &str) -> Result<Self> {
        if !content.contains("<svg") {
            anyhow::bail!("Invalid SVG: missing <svg> element");
        }

        let mut paths = Vec::new();
        for (index, cap) in path_regex().captures_iter(content).enumerate() {
            let attrs = &cap[1];
            let id = attribute(attrs, id_regex());
            let Some(d) = attribute(attrs, d_regex()) else {
                warn!("Path {} has no 'd' attribute, skipping", index);
                continue;
            };
            let (segments, mut rejected) = parse_path_data(&d);
            for item in &mut rejected {
                item.source = index;
                warn!(
                    "Path {} command {:?}: {}",
                    index, item.index, item.reason
                );
            }
            paths.push(ParsedPath {
                id,
                segments,
                rejected,
            });
        }

        Ok(Self { paths })
    }

    pub fn segment_count(&self) -> usize {
        self.paths.iter().map(|p| p.segments.len()).sum()
    }

    pub fn rejected_count(&self) -> usize {
        self.paths.iter().map(|p| p.rejected.len()).sum()
    }
}

fn path_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<path\b([^>]*)>").expect("invalid path regex"))
}

fn d_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\bd\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("invalid d regex")
    })
}

fn id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\bid\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("invalid id regex")
    })
}

fn attribute(attrs: &str, re: &Regex) -> Option<String> {
    let caps = re.captures(attrs)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Command(char),
    Number(f64),
    Invalid(String),
}

fn is_command(ch: char) -> bool {
    matches!(
        ch,
        'M' | 'm' | 'L' | 'l' | 'H' | 'h' | 'V' | 'v' | 'C' | 'c' | 'S' | 's' | 'Q' | 'q'
            | 'T' | 't' | 'A' | 'a' | 'Z' | 'z'
    )
}

/// Split path data into commands and numbers.
///
/// Handles the compact forms `10-5` and `.5.5`, and exponents.
fn tokenize(data: &str) -> Vec<Token> {
    let chars: Vec<char> = data.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        if ch.is_whitespace() || ch == ',' {
            i += 1;
        } else if is_command(ch) {
            tokens.push(Token::Command(ch));
            i += 1;
        } else if ch.is_ascii_digit() || ch == '.' || ch == '-' || ch == '+' {
            let start = i;
            if ch == '-' || ch == '+' {
                i += 1;
            }
            let mut seen_dot = false;
            while i < chars.len() {
                let c = chars[i];
                if c.is_ascii_digit() {
                    i += 1;
                } else if c == '.' && !seen_dot {
                    seen_dot = true;
                    i += 1;
                } else if (c == 'e' || c == 'E') && i > start {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '-' || chars[j] == '+') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        i = j;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                    break;
                } else {
                    break;
                }
            }
            let text: String = chars[start..i].iter().collect();
            match text.parse::<f64>() {
                Ok(value) => tokens.push(Token::Number(value)),
                Err(_) => tokens.push(Token::Invalid(text)),
            }
        } else {
            // Collect the run of unknown characters as one bad token
            let start = i;
            while i < chars.len()
                && !chars[i].is_whitespace()
                && chars[i] != ','
                && !is_command(chars[i])
                && !chars[i].is_ascii_digit()
            {
                i += 1;
            }
            tokens.push(Token::Invalid(chars[start..i].iter().collect()));
        }
    }

    tokens
}

fn param_count(command: char) -> usize {
    match command.to_ascii_uppercase() {
        'M' | 'L' | 'T' => 2,
        'H' | 'V' => 1,
        'C' => 6,
        'S' | 'Q' => 4,
        'A' => 7,
        _ => 0,
    }
}

/// Parse a `d` attribute into segments, collecting per-command rejections
pub(crate) fn parse_path_data(data: &str) -> (Vec<Segment>, Vec<SkippedItem>) {
    let tokens = tokenize(data);
    let mut segments = Vec::new();
    let mut rejected = Vec::new();

    let mut current = Point2::default();
    let mut subpath_start = Point2::default();
    let mut last_cubic_ctrl: Option<Point2> = None;
    let mut last_quad_ctrl: Option<Point2> = None;
    let mut command: Option<char> = None;
    let mut i = 0;

    while i < tokens.len() {
        match &tokens[i] {
            Token::Command(c) => {
                command = Some(*c);
                i += 1;
                if c.eq_ignore_ascii_case(&'z') {
                    if current != subpath_start {
                        segments.push(Segment::Line {
                            start: current,
                            end: subpath_start,
                        });
                    }
                    current = subpath_start;
                    last_cubic_ctrl = None;
                    last_quad_ctrl = None;
                    command = None;
                    continue;
                }
                // A command letter must be followed by at least one parameter group
                if !matches!(tokens.get(i), Some(Token::Number(_))) {
                    rejected.push(SkippedItem::new(
                        0,
                        Some(segments.len()),
                        format!("command '{c}' has no parameters"),
                    ));
                    command = None;
                }
                continue;
            }
            Token::Invalid(text) => {
                rejected.push(SkippedItem::new(
                    0,
                    Some(segments.len()),
                    format!("unrecognized path data '{text}'"),
                ));
                // Resynchronize on the next command letter
                i += 1;
                while i < tokens.len() && !matches!(tokens[i], Token::Command(_)) {
                    i += 1;
                }
                command = None;
                continue;
            }
            Token::Number(_) => {}
        }

        let Some(cmd) = command else {
            rejected.push(SkippedItem::new(
                0,
                Some(segments.len()),
                "parameters without a command".to_string(),
            ));
            while i < tokens.len() && !matches!(tokens[i], Token::Command(_)) {
                i += 1;
            }
            continue;
        };

        let needed = param_count(cmd);
        let mut params = Vec::with_capacity(needed);
        while params.len() < needed {
            match tokens.get(i) {
                Some(Token::Number(value)) => {
                    params.push(*value);
                    i += 1;
                }
                _ => break,
            }
        }
        if params.len() < needed {
            rejected.push(SkippedItem::new(
                0,
                Some(segments.len()),
                format!(
                    "command '{cmd}' expects {needed} parameters, found {}",
                    params.len()
                ),
            ));
            command = None;
            continue;
        }

        let relative = cmd.is_ascii_lowercase();
        let origin = current;
        let abs = move |x: f64, y: f64| {
            if relative {
                Point2::new(origin.x + x, origin.y + y)
            } else {
                Point2::new(x, y)
            }
        };

        let mut cubic_ctrl = None;
        let mut quad_ctrl = None;
        match cmd.to_ascii_uppercase() {
            'M' => {
                current = abs(params[0], params[1]);
                subpath_start = current;
                // Further pairs after a moveto are implicit linetos
                command = Some(if relative { 'l' } else { 'L' });
            }
            'L' => {
                let end = abs(params[0], params[1]);
                segments.push(Segment::Line { start: current, end });
                current = end;
            }
            'H' => {
                let x = if relative { current.x + params[0] } else { params[0] };
                let end = Point2::new(x, current.y);
                segments.push(Segment::Line { start: current, end });
                current = end;
            }
            'V' => {
                let y = if relative { current.y + params[0] } else { params[0] };
                let end = Point2::new(current.x, y);
                segments.push(Segment::Line { start: current, end });
                current = end;
            }
            'C' => {
                let control1 = abs(params[0], params[1]);
                let control2 = abs(params[2], params[3]);
                let end = abs(params[4], params[5]);
                segments.push(Segment::Cubic {
                    start: current,
                    control1,
                    control2,
                    end,
                });
                cubic_ctrl = Some(control2);
                current = end;
            }
            'S' => {
                let control1 = reflect(last_cubic_ctrl, current);
                let control2 = abs(params[0], params[1]);
                let end = abs(params[2], params[3]);
                segments.push(Segment::Cubic {
                    start: current,
                    control1,
                    control2,
                    end,
                });
                cubic_ctrl = Some(control2);
                current = end;
            }
            'Q' => {
                let control = abs(params[0], params[1]);
                let end = abs(params[2], params[3]);
                segments.push(Segment::Quadratic {
                    start: current,
                    control,
                    end,
                });
                quad_ctrl = Some(control);
                current = end;
            }
            'T' => {
                let control = reflect(last_quad_ctrl, current);
                let end = abs(params[0], params[1]);
                segments.push(Segment::Quadratic {
                    start: current,
                    control,
                    end,
                });
                quad_ctrl = Some(control);
                current = end;
            }
            'A' => {
                let end = abs(params[5], params[6]);
                segments.push(Segment::Arc {
                    start: current,
                    radii: (params[0].abs(), params[1].abs()),
                    rotation: params[2],
                    large_arc: params[3] != 0.0,
                    sweep: params[4] != 0.0,
                    end,
                });
                current = end;
            }
            _ => unreachable!("param_count only admits known commands"),
        }
        last_cubic_ctrl = cubic_ctrl;
        last_quad_ctrl = quad_ctrl;
    }

    (segments, rejected)
}

fn reflect(control: Option<Point2>, about: Point2) -> Point2 {
    match control {
        Some(c) => Point2::new(2.0 * about.x - c.x, 2.0 * about.y - c.y),
        None => about,
    }
}
