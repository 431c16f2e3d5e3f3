//! Raster charts for the report.
//!
//! Everything is drawn straight into an [`RgbImage`]; styling comes from the
//! [`ChartTheme`] handed in by the caller.

use crate::aggregate::Aggregates;
use crate::error::Result;
use crate::model::{AuthorCounts, DailyChurn, DailyCounts, Heatmap, HOURS_PER_DAY, WEEKDAYS};
use chrono::NaiveDate;
use image::{Rgb, RgbImage};
use palette::{LinSrgb, Mix, Srgb};
use std::path::{Path, PathBuf};

pub const COMMITS_CHART: &str = "commits-over-time.png";
pub const AUTHORS_CHART: &str = "authors.png";
pub const HEATMAP_CHART: &str = "commit-heatmap.png";
pub const CHURN_CHART: &str = "loc-effort.png";

/// Colours and sizes for every chart.
#[derive(Debug, Clone)]
pub struct ChartTheme {
    /// Pixels per inch of figure size.
    pub dpi: u32,
    pub background: Rgb<u8>,
    pub plot_background: Rgb<u8>,
    pub grid: Rgb<u8>,
    pub line: Rgb<u8>,
    pub bar: Rgb<u8>,
    pub insertions: Rgb<u8>,
    pub deletions: Rgb<u8>,
    /// Opacity of the churn areas, 0.0..=1.0.
    pub area_alpha: f32,
    /// Heatmap colour stops from no activity to the busiest cell.
    pub heat_ramp: Vec<Rgb<u8>>,
}

impl Default for ChartTheme {
    fn default() -> Self {
        Self {
            dpi: 100,
            background: Rgb([255, 255, 255]),
            plot_background: Rgb([234, 234, 242]),
            grid: Rgb([255, 255, 255]),
            line: Rgb([76, 114, 176]),
            bar: Rgb([70, 130, 180]),
            insertions: Rgb([76, 114, 176]),
            deletions: Rgb([221, 132, 82]),
            area_alpha: 0.6,
            heat_ramp: vec![
                Rgb([255, 255, 217]),
                Rgb([237, 248, 177]),
                Rgb([199, 233, 180]),
                Rgb([127, 205, 187]),
                Rgb([65, 182, 196]),
                Rgb([29, 145, 192]),
                Rgb([34, 94, 168]),
                Rgb([12, 44, 132]),
            ],
        }
    }
}

impl ChartTheme {
    fn figure(&self, width_in: f32, height_in: f32) -> (u32, u32) {
        let px = |inches: f32| (inches * self.dpi as f32).round().max(1.0) as u32;
        (px(width_in), px(height_in))
    }

    fn scaled(&self, px: i64) -> i64 {
        (px * self.dpi as i64 / 100).max(1)
    }

    /// Colour of a heatmap cell at `t` in 0.0..=1.0.
    pub fn heat_color(&self, t: f32) -> Rgb<u8> {
        ramp_color(&self.heat_ramp, t)
    }
}

/// Paths of the four rendered images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartFiles {
    pub commits: PathBuf,
    pub authors: PathBuf,
    pub heatmap: PathBuf,
    pub churn: PathBuf,
}

pub fn render_all(aggregates: &Aggregates, out_dir: &Path, theme: &ChartTheme) -> Result<ChartFiles> {
    let files = ChartFiles {
        commits: out_dir.join(COMMITS_CHART),
        authors: out_dir.join(AUTHORS_CHART),
        heatmap: out_dir.join(HEATMAP_CHART),
        churn: out_dir.join(CHURN_CHART),
    };

    save(commits_per_day(&aggregates.daily, theme), &files.commits)?;
    save(authors(&aggregates.authors, theme), &files.authors)?;
    save(heatmap(&aggregates.heatmap, theme), &files.heatmap)?;
    save(churn(&aggregates.churn, theme), &files.churn)?;

    Ok(files)
}

fn save(image: RgbImage, path: &Path) -> Result<()> {
    image.save(path)?;
    log::debug!("Wrote {}", path.display());
    Ok(())
}

/// Line chart of commits per active day, with a marker on each day.
pub fn commits_per_day(daily: &DailyCounts, theme: &ChartTheme) -> RgbImage {
    let (width, height) = theme.figure(14.0, 6.0);
    let mut canvas = Canvas::new(width, height, theme.background);
    let plot = Plot::inset(width, height, theme);

    let max = daily.values().copied().max().unwrap_or(0);
    let (upper, step) = nice_scale(max as f64);
    plot.frame(&mut canvas, theme, upper, step, 6);

    let (Some(first), Some(last)) = (daily.keys().next(), daily.keys().next_back()) else {
        return canvas.image;
    };

    let points: Vec<(i64, i64)> = daily
        .iter()
        .map(|(day, count)| (plot.x(day_fraction(*first, *last, *day)), plot.y(*count as f64 / upper)))
        .collect();

    let thickness = theme.scaled(2);
    for pair in points.windows(2) {
        canvas.line(pair[0], pair[1], theme.line, thickness);
    }
    for &(x, y) in &points {
        canvas.disc(x, y, theme.scaled(4), theme.line);
    }

    canvas.image
}

/// Horizontal bars, busiest author at the top.
pub fn authors(authors: &AuthorCounts, theme: &ChartTheme) -> RgbImage {
    let (width, height) = theme.figure(10.0, 6.0);
    let mut canvas = Canvas::new(width, height, theme.background);
    let plot = Plot::inset(width, height, theme);

    let max = authors.entries().first().map(|(_, n)| *n).unwrap_or(0);
    let (upper, step) = nice_scale(max as f64);
    plot.fill(&mut canvas, theme.plot_background);
    plot.vertical_grid(&mut canvas, theme.grid, (upper / step).round() as usize);

    if authors.is_empty() {
        return canvas.image;
    }

    let band = (plot.bottom - plot.top) as f64 / authors.len() as f64;
    for (i, (_, count)) in authors.entries().iter().enumerate() {
        let center = plot.top as f64 + band * (i as f64 + 0.5);
        let half = (band * 0.25).max(0.5);
        canvas.fill_rect(
            plot.left,
            (center - half).round() as i64,
            plot.x(*count as f64 / upper),
            (center + half).round() as i64,
            theme.bar,
        );
    }

    canvas.image
}

/// Weekday x hour grid with a colour bar on the right.
pub fn heatmap(heatmap: &Heatmap, theme: &ChartTheme) -> RgbImage {
    let (width, height) = theme.figure(14.0, 5.0);
    let mut canvas = Canvas::new(width, height, theme.background);
    let mut plot = Plot::inset(width, height, theme);
    plot.right -= theme.scaled(80);

    let max = heatmap.max();
    let cell_w = (plot.right - plot.left) as f64 / HOURS_PER_DAY as f64;
    let cell_h = (plot.bottom - plot.top) as f64 / WEEKDAYS.len() as f64;
    let gap = theme.scaled(1);

    for (day, row) in heatmap.rows().iter().enumerate() {
        for (hour, count) in row.iter().enumerate() {
            let t = if max == 0 { 0.0 } else { *count as f32 / max as f32 };
            let x0 = plot.left + (cell_w * hour as f64).round() as i64;
            let x1 = plot.left + (cell_w * (hour + 1) as f64).round() as i64;
            let y0 = plot.top + (cell_h * day as f64).round() as i64;
            let y1 = plot.top + (cell_h * (day + 1) as f64).round() as i64;
            canvas.fill_rect(x0, y0, x1 - gap, y1 - gap, theme.heat_color(t));
        }
    }

    let bar_left = plot.right + theme.scaled(30);
    let bar_right = bar_left + theme.scaled(20);
    let span = (plot.bottom - plot.top).max(1);
    for y in plot.top..plot.bottom {
        let t = 1.0 - (y - plot.top) as f32 / span as f32;
        canvas.fill_rect(bar_left, y, bar_right, y + 1, theme.heat_color(t));
    }

    canvas.image
}

/// Overlapping translucent areas of daily insertions and deletions.
pub fn churn(churn: &DailyChurn, theme: &ChartTheme) -> RgbImage {
    let (width, height) = theme.figure(14.0, 6.0);
    let mut canvas = Canvas::new(width, height, theme.background);
    let plot = Plot::inset(width, height, theme);

    let max = churn
        .values()
        .map(|day| day.insertions.max(day.deletions))
        .max()
        .unwrap_or(0);
    let (upper, step) = nice_scale(max as f64);
    plot.frame(&mut canvas, theme, upper, step, 6);

    if churn.is_empty() {
        return canvas.image;
    }

    let insertions: Vec<f64> = churn.values().map(|day| day.insertions as f64).collect();
    let deletions: Vec<f64> = churn.values().map(|day| day.deletions as f64).collect();

    for (series, color) in [(&insertions, theme.insertions), (&deletions, theme.deletions)] {
        let mut previous: Option<(i64, i64)> = None;
        for x in plot.left..plot.right {
            let t = (x - plot.left) as f64 / (plot.right - plot.left).max(1) as f64;
            let y = plot.y(sample(series, t) / upper);
            for row in y..plot.bottom {
                canvas.blend(x, row, color, theme.area_alpha);
            }
            if let Some(prev) = previous {
                canvas.line(prev, (x, y), color, theme.scaled(1));
            }
            previous = Some((x, y));
        }
    }

    canvas.image
}

/// Linear interpolation of evenly spaced `values` at `t` in 0.0..=1.0.
fn sample(values: &[f64], t: f64) -> f64 {
    match values.len() {
        0 => 0.0,
        1 => values[0],
        n => {
            let pos = t.clamp(0.0, 1.0) * (n - 1) as f64;
            let i = (pos.floor() as usize).min(n - 2);
            let f = pos - i as f64;
            values[i] * (1.0 - f) + values[i + 1] * f
        }
    }
}

fn day_fraction(first: NaiveDate, last: NaiveDate, day: NaiveDate) -> f64 {
    let span = (last - first).num_days();
    if span == 0 {
        return 0.5;
    }
    (day - first).num_days() as f64 / span as f64
}

/// Axis upper bound and tick step on a 1-2-5 scale, about five ticks.
fn nice_scale(max: f64) -> (f64, f64) {
    if max <= 0.0 {
        return (1.0, 1.0);
    }
    let raw = max / 5.0;
    let magnitude = 10f64.powf(raw.log10().floor());
    let norm = raw / magnitude;
    let step = magnitude
        * if norm <= 1.0 {
            1.0
        } else if norm <= 2.0 {
            2.0
        } else if norm <= 5.0 {
            5.0
        } else {
            10.0
        };
    let step = step.max(1.0).round();
    ((max / step).ceil() * step, step)
}

fn ramp_color(stops: &[Rgb<u8>], t: f32) -> Rgb<u8> {
    match stops.len() {
        0 => Rgb([0, 0, 0]),
        1 => stops[0],
        _ if t <= 0.0 => stops[0],
        n if t >= 1.0 => stops[n - 1],
        n => {
            let pos = t * (n - 1) as f32;
            let i = (pos.floor() as usize).min(n - 2);
            mix_rgb(stops[i], stops[i + 1], pos - i as f32)
        }
    }
}

fn to_linear(color: Rgb<u8>) -> LinSrgb {
    Srgb::new(color[0], color[1], color[2])
        .into_format::<f32>()
        .into_linear()
}

fn from_linear(color: LinSrgb) -> Rgb<u8> {
    let srgb: Srgb<u8> = Srgb::<f32>::from_linear(color).into_format();
    Rgb([srgb.red, srgb.green, srgb.blue])
}

/// Blend in linear light; `factor` 0.0 is `from`, 1.0 is `to`.
fn mix_rgb(from: Rgb<u8>, to: Rgb<u8>, factor: f32) -> Rgb<u8> {
    from_linear(to_linear(from).mix(to_linear(to), factor.clamp(0.0, 1.0)))
}

struct Canvas {
    image: RgbImage,
}

impl Canvas {
    fn new(width: u32, height: u32, background: Rgb<u8>) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, background),
        }
    }

    fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.image.width() as i64 && y < self.image.height() as i64
    }

    fn put(&mut self, x: i64, y: i64, color: Rgb<u8>) {
        if self.contains(x, y) {
            self.image.put_pixel(x as u32, y as u32, color);
        }
    }

    fn blend(&mut self, x: i64, y: i64, color: Rgb<u8>, alpha: f32) {
        if self.contains(x, y) {
            let below = *self.image.get_pixel(x as u32, y as u32);
            self.image.put_pixel(x as u32, y as u32, mix_rgb(below, color, alpha));
        }
    }

    /// Fill `[x0, x1) x [y0, y1)`.
    fn fill_rect(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgb<u8>) {
        for y in y0.min(y1)..y0.max(y1) {
            for x in x0.min(x1)..x0.max(x1) {
                self.put(x, y, color);
            }
        }
    }

    fn line(&mut self, from: (i64, i64), to: (i64, i64), color: Rgb<u8>, thickness: i64) {
        let (mut x, mut y) = from;
        let dx = (to.0 - x).abs();
        let dy = -(to.1 - y).abs();
        let sx = if x < to.0 { 1 } else { -1 };
        let sy = if y < to.1 { 1 } else { -1 };
        let mut err = dx + dy;
        let half = thickness / 2;

        loop {
            self.fill_rect(x - half, y - half, x - half + thickness, y - half + thickness, color);
            if (x, y) == to {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    fn disc(&mut self, cx: i64, cy: i64, radius: i64, color: Rgb<u8>) {
        for y in -radius..=radius {
            for x in -radius..=radius {
                if x * x + y * y <= radius * radius {
                    self.put(cx + x, cy + y, color);
                }
            }
        }
    }
}

/// Pixel bounds of the data area inside a figure.
#[derive(Debug, Clone, Copy)]
struct Plot {
    left: i64,
    top: i64,
    right: i64,
    bottom: i64,
}

impl Plot {
    fn inset(width: u32, height: u32, theme: &ChartTheme) -> Self {
        Self {
            left: theme.scaled(70),
            top: theme.scaled(30),
            right: width as i64 - theme.scaled(30),
            bottom: height as i64 - theme.scaled(50),
        }
    }

    fn x(&self, frac: f64) -> i64 {
        self.left + (frac.clamp(0.0, 1.0) * (self.right - self.left) as f64).round() as i64
    }

    fn y(&self, frac: f64) -> i64 {
        self.bottom - (frac.clamp(0.0, 1.0) * (self.bottom - self.top) as f64).round() as i64
    }

    fn fill(&self, canvas: &mut Canvas, color: Rgb<u8>) {
        canvas.fill_rect(self.left, self.top, self.right, self.bottom, color);
    }

    fn horizontal_grid(&self, canvas: &mut Canvas, color: Rgb<u8>, divisions: usize) {
        for i in 0..=divisions.max(1) {
            let y = self.y(i as f64 / divisions.max(1) as f64);
            canvas.fill_rect(self.left, y, self.right, y + 1, color);
        }
    }

    fn vertical_grid(&self, canvas: &mut Canvas, color: Rgb<u8>, divisions: usize) {
        for i in 0..=divisions.max(1) {
            let x = self.x(i as f64 / divisions.max(1) as f64);
            canvas.fill_rect(x, self.top, x + 1, self.bottom, color);
        }
    }

    /// Background plus grid with one horizontal line per value tick.
    fn frame(&self, canvas: &mut Canvas, theme: &ChartTheme, upper: f64, step: f64, columns: usize) {
        self.fill(canvas, theme.plot_background);
        self.horizontal_grid(canvas, theme.grid, (upper / step).round() as usize);
        self.vertical_grid(canvas, theme.grid, columns);
    }
}
