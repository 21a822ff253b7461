use crate::chart::ChartSpec;
use crate::chart::ChartStyle;
use crate::chart::Color;
use crate::chart::YRange;
use crate::document::ErrorPlaceholder;
use crate::render::fonts::wrap;
use crate::render::fonts::Font;
use crate::render::pdf::Content;
use crate::render::pdf::PdfPage;

/// Space kept free along every page edge
const MARGIN: f64 = 10.0;
const TICK_LENGTH: f64 = 3.5;
/// Gap between a tick mark and its label
const TICK_PAD: f64 = 3.5;
/// Gap between the category labels and the legend row
const LEGEND_GAP: f64 = 8.0;
/// Upper bound on the number of value axis intervals
const MAX_TICK_INTERVALS: f64 = 6.0;
const ERROR_TEXT_SIZE: f64 = 10.0;

// Legend geometry in multiples of the legend font size
const LEGEND_HANDLE_LENGTH: f64 = 2.0;
const LEGEND_HANDLE_HEIGHT: f64 = 0.7;
const LEGEND_HANDLE_PAD: f64 = 0.8;
const LEGEND_COLUMN_SPACING: f64 = 2.0;

const TEXT_COLOR: Color = Color::rgb(0x00, 0x00, 0x00);

/// Rectangle of the plot in page coordinates, with the value axis mapping.
struct PlotArea {
    left: f64,
    bottom: f64,
    width: f64,
    height: f64,
    y_range: YRange,
}

impl PlotArea {
    fn right(&self) -> f64 {
        self.left + self.width
    }

    fn top(&self) -> f64 {
        self.bottom + self.height
    }

    /// Maps a value onto the page; an inverted range puts its minimum at the bottom too.
    fn y(&self, value: f64) -> f64 {
        let span = self.y_range.span();
        if span.is_finite() && span != 0.0 {
            self.bottom + (value - self.y_range.min) / span * self.height
        } else {
            self.bottom
        }
    }

    /// Center of the `index`-th of `count` category slots.
    fn x(&self, index: usize, count: usize) -> f64 {
        self.left + self.width * (index as f64 + 0.5) / count as f64
    }
}

/// Draws one bar chart page.
pub(crate) fn chart_page(chart: &ChartSpec) -> PdfPage {
    let style = &chart.style;
    let (width, height) = (style.page_width(), style.page_height());

    let y_range = drawable_range(chart.y_range);
    let (ticks, step) = value_ticks(y_range);
    let labels: Vec<String> = ticks.iter().map(|tick| format_tick(*tick, step)).collect();
    let label_width = labels
        .iter()
        .map(|label| Font::Regular.measure(label, style.y_tick_label_size))
        .fold(0.0, f64::max);

    let title_baseline = height - MARGIN - style.title_size * 0.8;
    let legend_baseline = MARGIN + style.legend_font_size * 0.25;
    let x_label_baseline = MARGIN + style.legend_font_size * 1.2 + LEGEND_GAP + style.x_tick_label_size * 0.25;
    let left = MARGIN + label_width + TICK_PAD + TICK_LENGTH;
    let bottom = x_label_baseline + style.x_tick_label_size * 0.75 + TICK_PAD + TICK_LENGTH;
    let plot = PlotArea {
        left,
        bottom,
        width: (width - MARGIN - left).max(1.0),
        height: (title_baseline - style.title_pad - bottom).max(1.0),
        y_range,
    };

    let mut content = Content::new();
    draw_grid(&mut content, &plot, &ticks, style);
    draw_bars(&mut content, &plot, chart);
    draw_spines(&mut content, &plot, style);
    draw_value_ticks(&mut content, &plot, &ticks, &labels, style);
    draw_category_ticks(&mut content, &plot, &chart.categories, x_label_baseline, style);

    let title_font = if style.title_bold { Font::Bold } else { Font::Regular };
    content.fill_color(TEXT_COLOR);
    content.text(title_font, style.title_size, plot.left, title_baseline, &chart.title);

    draw_legend(&mut content, &plot, chart, legend_baseline);

    PdfPage {
        width,
        height,
        content,
    }
}

fn draw_grid(content: &mut Content, plot: &PlotArea, ticks: &[f64], style: &ChartStyle) {
    content.stroke_color(style.grid_color);
    content.line_width(style.grid_width);
    for tick in ticks {
        let y = plot.y(*tick);
        content.line(plot.left, y, plot.right(), y);
    }
}

fn draw_bars(content: &mut Content, plot: &PlotArea, chart: &ChartSpec) {
    let count = chart.categories.len();
    if count == 0 {
        return;
    }
    let style = &chart.style;
    let bar_width = plot.width / count as f64 * style.bar_width;
    let base = plot.y(0.0);

    content.save();
    content.clip_rect(plot.left, plot.bottom, plot.width, plot.height);
    for (index, value) in chart.values.iter().enumerate() {
        let Some(value) = value.filter(|value| value.is_finite()) else {
            continue;
        };
        let color = chart.colors.get(index).copied().unwrap_or(TEXT_COLOR);
        content.fill_color(color);
        content.fill_rect(plot.x(index, count) - bar_width / 2.0, base, bar_width, plot.y(value) - base);
    }

    if chart.errors.is_some() {
        content.stroke_color(style.error_bar_paint());
        content.line_width(style.error_bar_width);
        for (index, value) in chart.values.iter().enumerate() {
            let (Some(value), Some(error)) = (*value, chart.error(index)) else {
                continue;
            };
            if !value.is_finite() || !error.is_finite() {
                continue;
            }
            let x = plot.x(index, count);
            let (low, high) = (plot.y(value - error.abs()), plot.y(value + error.abs()));
            let cap = style.error_bar_cap_size;
            content.line(x, low, x, high);
            content.line(x - cap, low, x + cap, low);
            content.line(x - cap, high, x + cap, high);
        }
    }
    content.restore();
}

/// Left and bottom spines; the top and right ones are hidden.
fn draw_spines(content: &mut Content, plot: &PlotArea, style: &ChartStyle) {
    content.stroke_color(style.spine_color);
    content.line_width(style.spine_width);
    content.line(plot.left, plot.bottom, plot.left, plot.top());
    content.line(plot.left, plot.bottom, plot.right(), plot.bottom);
}

fn draw_value_ticks(content: &mut Content, plot: &PlotArea, ticks: &[f64], labels: &[String], style: &ChartStyle) {
    let size = style.y_tick_label_size;
    for (tick, label) in ticks.iter().zip(labels) {
        let y = plot.y(*tick);
        content.stroke_color(style.spine_color);
        content.line(plot.left - TICK_LENGTH, y, plot.left, y);
        content.fill_color(style.tick_label_color);
        let x = plot.left - TICK_LENGTH - TICK_PAD - Font::Regular.measure(label, size);
        content.text(Font::Regular, size, x, y - size * 0.35, label);
    }
}

fn draw_category_ticks(content: &mut Content, plot: &PlotArea, categories: &[String], baseline: f64, style: &ChartStyle) {
    let size = style.x_tick_label_size;
    for (index, category) in categories.iter().enumerate() {
        let x = plot.x(index, categories.len());
        content.stroke_color(style.spine_color);
        content.line(x, plot.bottom - TICK_LENGTH, x, plot.bottom);
        content.fill_color(style.tick_label_color);
        let label_width = Font::Regular.measure(category, size);
        content.text(Font::Regular, size, x - label_width / 2.0, baseline, category);
    }
}

/// One frameless row of color swatches and category names, centered under the plot.
fn draw_legend(content: &mut Content, plot: &PlotArea, chart: &ChartSpec, baseline: f64) {
    let entries = &chart.legend.entries;
    if entries.is_empty() {
        return;
    }
    let size = chart.style.legend_font_size;
    let handle = LEGEND_HANDLE_LENGTH * size;
    let pad = LEGEND_HANDLE_PAD * size;
    let spacing = LEGEND_COLUMN_SPACING * size;
    let widths: Vec<f64> = entries
        .iter()
        .map(|entry| handle + pad + Font::Regular.measure(entry, size))
        .collect();
    let total = widths.iter().sum::<f64>() + spacing * (entries.len() - 1) as f64;

    let mut x = plot.left + plot.width / 2.0 - total / 2.0;
    for (index, (entry, width)) in entries.iter().zip(&widths).enumerate() {
        let color = chart.colors.get(index).copied().unwrap_or(TEXT_COLOR);
        content.fill_color(color);
        content.fill_rect(x, baseline, handle, LEGEND_HANDLE_HEIGHT * size);
        content.fill_color(TEXT_COLOR);
        content.text(Font::Regular, size, x + handle + pad, baseline, entry);
        x += width + spacing;
    }
}

/// Draws the page standing in for a sheet that could not be charted.
pub(crate) fn error_page(error: &ErrorPlaceholder, style: &ChartStyle) -> PdfPage {
    let (width, height) = (style.page_width(), style.page_height());
    let line_height = ERROR_TEXT_SIZE * 1.2;
    let x = width * 0.05;
    let mut y = height * 0.95 - ERROR_TEXT_SIZE * 0.8;

    let mut content = Content::new();
    content.fill_color(TEXT_COLOR);
    content.text(Font::Regular, ERROR_TEXT_SIZE, x, y, &format!("Error in sheet '{}':", error.subject));
    for line in wrap(&error.message, Font::Regular, ERROR_TEXT_SIZE, width * 0.9) {
        y -= line_height;
        if y < MARGIN {
            break;
        }
        content.text(Font::Regular, ERROR_TEXT_SIZE, x, y, &line);
    }

    PdfPage {
        width,
        height,
        content,
    }
}

/// A zero-height range, as for an all-zero series, is drawn as one unit above its minimum.
fn drawable_range(range: YRange) -> YRange {
    if range.span() == 0.0 {
        YRange { min: range.min, max: range.min + 1.0 }
    } else {
        range
    }
}

/// Evenly spaced value axis ticks from the bottom of the range, and their spacing.
/// Ticks of an inverted range count down from its minimum.
fn value_ticks(range: YRange) -> (Vec<f64>, f64) {
    let span = range.span();
    if !span.is_finite() || span == 0.0 {
        return (vec![range.min], 1.0);
    }
    let step = nice_step(span.abs() / MAX_TICK_INTERVALS);
    let signed_step = step.copysign(span);
    let decimals = decimals(step);
    let ticks = (0..)
        .map(|index| round_to(range.min + index as f64 * signed_step, decimals))
        .take_while(|tick| (tick - range.min).abs() <= span.abs() + step * 1e-9)
        .take(MAX_TICK_INTERVALS as usize * 3)
        .collect();
    (ticks, step)
}

/// Smallest step of the form {1, 2, 2.5, 5} × 10ⁿ that is at least `raw`.
fn nice_step(raw: f64) -> f64 {
    let magnitude = 10f64.powf(raw.log10().floor());
    [1.0, 2.0, 2.5, 5.0, 10.0]
        .into_iter()
        .map(|multiple| multiple * magnitude)
        .find(|step| *step >= raw * (1.0 - 1e-9))
        .unwrap_or(10.0 * magnitude)
}

/// Number of decimals needed to print multiples of `step` exactly.
fn decimals(step: f64) -> usize {
    (0..10)
        .find(|decimals| {
            let scaled = step * 10f64.powi(*decimals as i32);
            (scaled - scaled.round()).abs() < 1e-6
        })
        .unwrap_or(10)
}

fn round_to(value: f64, decimals: usize) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

fn format_tick(value: f64, step: f64) -> String {
    format!("{:.*}", decimals(step), value)
}
