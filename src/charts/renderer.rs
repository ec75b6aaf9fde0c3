//! Static Chart Renderer
//! Draws the dashboard charts with plotters into an in-memory RGB buffer and
//! encodes them as PNG.

use super::palette::{
    heat_color, level_color, series_color, CYAN, GRID, HOT_PINK, LEVEL_HIGH, LEVEL_LOW,
    LEVEL_MODERATE, PINK,
};
use crate::config::ChartConfig;
use crate::data::catalog::Factor;
use crate::data::KEPUASAN;
use crate::report::DashboardReport;
use crate::stats::{FactorMean, MotivationView, SatisfactionLevel};
use anyhow::{Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use rayon::prelude::*;
use std::f64::consts::PI;
use std::path::{Path, PathBuf};

const FONT: &str = "sans-serif";
const CAPTION_SIZE: i32 = 22;
const LABEL_SIZE: i32 = 14;

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// Every chart the dashboard can draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Gauge,
    Motivation,
    BestFactors,
    WorstFactors,
    FacultyMeans,
    FacultyShare,
    Stacked,
    Scatter(Factor),
    Radar,
    Histogram,
    Boxplot,
    Heatmap,
}

impl ChartKind {
    pub fn file_name(&self) -> String {
        let stem = match self {
            ChartKind::Gauge => "gauge".to_string(),
            ChartKind::Motivation => "motivation".to_string(),
            ChartKind::BestFactors => "best_factors".to_string(),
            ChartKind::WorstFactors => "worst_factors".to_string(),
            ChartKind::FacultyMeans => "faculty_means".to_string(),
            ChartKind::FacultyShare => "faculty_share".to_string(),
            ChartKind::Stacked => "stacked_contribution".to_string(),
            ChartKind::Scatter(factor) => format!("scatter_{}", factor.column().to_lowercase()),
            ChartKind::Radar => "radar".to_string(),
            ChartKind::Histogram => "histogram".to_string(),
            ChartKind::Boxplot => "boxplot".to_string(),
            ChartKind::Heatmap => "correlation_heatmap".to_string(),
        };
        format!("{}.png", stem)
    }

    /// Charts that have data in `report`, in dashboard order. Skipped charts
    /// are logged.
    pub fn plan(report: &DashboardReport) -> Vec<ChartKind> {
        let mut candidates = vec![
            (ChartKind::Gauge, report.summary.mean_satisfaction.value().is_some()),
            (
                ChartKind::Motivation,
                match &report.motivation {
                    Some(MotivationView::ScoreCounts(counts)) => !counts.is_empty(),
                    Some(MotivationView::TopFactors(top)) => !top.is_empty(),
                    None => false,
                },
            ),
            (ChartKind::BestFactors, !report.best_factors.is_empty()),
            (ChartKind::WorstFactors, !report.worst_factors.is_empty()),
            (ChartKind::FacultyMeans, !report.faculty_means.groups.is_empty()),
            (ChartKind::FacultyShare, report.faculty_share.iter().any(|c| c.count > 0)),
            (
                ChartKind::Stacked,
                report.stacked.as_ref().is_some_and(|s| !s.is_empty()),
            ),
        ];
        candidates.extend(
            report
                .scatter
                .iter()
                .map(|s| (ChartKind::Scatter(s.factor), !s.points.is_empty())),
        );
        candidates.extend([
            (ChartKind::Radar, !report.radar.is_empty()),
            (ChartKind::Histogram, report.histogram.is_some()),
            (ChartKind::Boxplot, !report.boxplots.is_empty()),
            (ChartKind::Heatmap, report.correlation.matrix().is_some()),
        ]);

        candidates
            .into_iter()
            .filter_map(|(kind, available)| {
                if !available {
                    log::info!("Skipping {:?} chart: no data for the current selection", kind);
                }
                available.then_some(kind)
            })
            .collect()
    }
}

/// Renders dashboard charts at a fixed size.
pub struct ChartRenderer {
    width: u32,
    height: u32,
}

impl ChartRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn from_config(config: &ChartConfig) -> Self {
        Self::new(config.width, config.height)
    }

    /// Render every available chart into `dir` in parallel; returns the
    /// written paths in dashboard order.
    pub fn render_all(&self, report: &DashboardReport, dir: &Path) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create chart directory {}", dir.display()))?;

        let plan = ChartKind::plan(report);
        plan.par_iter()
            .map(|kind| {
                let png = self
                    .render(*kind, report)
                    .with_context(|| format!("Failed to render {:?} chart", kind))?;
                let path = dir.join(kind.file_name());
                std::fs::write(&path, png)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                log::debug!("Wrote {}", path.display());
                Ok(path)
            })
            .collect()
    }

    /// Render one chart as PNG bytes.
    pub fn render(&self, kind: ChartKind, report: &DashboardReport) -> Result<Vec<u8>> {
        self.draw(|root| match kind {
            ChartKind::Gauge => draw_gauge(root, report),
            ChartKind::Motivation => draw_motivation(root, report),
            ChartKind::BestFactors => {
                draw_factor_bars(root, "Best rated factors", &report.best_factors)
            }
            ChartKind::WorstFactors => {
                draw_factor_bars(root, "Lowest rated factors", &report.worst_factors)
            }
            ChartKind::FacultyMeans => draw_faculty_means(root, report),
            ChartKind::FacultyShare => draw_faculty_share(root, report),
            ChartKind::Stacked => draw_stacked(root, report),
            ChartKind::Scatter(factor) => draw_scatter(root, report, factor),
            ChartKind::Radar => draw_radar(root, &report.radar),
            ChartKind::Histogram => draw_histogram(root, report),
            ChartKind::Boxplot => draw_boxplot(root, report),
            ChartKind::Heatmap => draw_heatmap(root, report),
        })
    }

    fn draw<F>(&self, paint: F) -> Result<Vec<u8>>
    where
        F: FnOnce(&Area<'_>) -> Result<()>,
    {
        let mut buffer = vec![0u8; self.width as usize * self.height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (self.width, self.height))
                .into_drawing_area();
            root.fill(&WHITE).context("Failed to fill background")?;
            paint(&root)?;
            root.present().context("Failed to present drawing")?;
        }
        encode_png(&buffer, self.width, self.height)
    }
}

fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let mut png_bytes = Vec::new();
    image::codecs::png::PngEncoder::new(&mut png_bytes)
        .write_image(buffer, width, height, image::ExtendedColorType::Rgb8)
        .context("Failed to encode PNG")?;
    Ok(png_bytes)
}

fn centered(size: i32) -> TextStyle<'static> {
    TextStyle::from((FONT, size).into_font()).pos(Pos::new(HPos::Center, VPos::Center))
}

/// Label for the centre of a category segment.
fn segment_label(labels: &[String], value: &SegmentValue<usize>) -> String {
    match value {
        SegmentValue::CenterOf(i) => labels.get(*i).cloned().unwrap_or_default(),
        _ => String::new(),
    }
}

fn max_or(values: impl Iterator<Item = f64>, floor: f64) -> f64 {
    values.fold(floor, f64::max)
}

fn draw_gauge(root: &Area<'_>, report: &DashboardReport) -> Result<()> {
    let mean = report.summary.mean_satisfaction.value().unwrap_or(0.0);
    let level = SatisfactionLevel::classify(mean);
    let caption = format!("Overall satisfaction: {:.2} / 5 ({:?})", mean, level);

    let mut chart = ChartBuilder::on(root)
        .margin(20)
        .caption(caption, (FONT, CAPTION_SIZE))
        .x_label_area_size(40)
        .build_cartesian_2d(0f64..SatisfactionLevel::SCALE_MAX, 0f64..1f64)
        .context("Failed to build chart")?;

    chart
        .configure_mesh()
        .disable_mesh()
        .disable_y_axis()
        .x_labels(6)
        .draw()
        .context("Failed to draw mesh")?;

    let bands = [
        (0.0, SatisfactionLevel::MODERATE_FROM, LEVEL_LOW),
        (
            SatisfactionLevel::MODERATE_FROM,
            SatisfactionLevel::HIGH_FROM,
            LEVEL_MODERATE,
        ),
        (SatisfactionLevel::HIGH_FROM, SatisfactionLevel::SCALE_MAX, LEVEL_HIGH),
    ];
    chart
        .draw_series(bands.iter().map(|&(from, to, color)| {
            Rectangle::new([(from, 0.15), (to, 0.85)], color.mix(0.35).filled())
        }))
        .context("Failed to draw bands")?;
    chart
        .draw_series(std::iter::once(Rectangle::new(
            [(0.0, 0.35), (mean, 0.65)],
            level_color(level).filled(),
        )))
        .context("Failed to draw value")?;
    chart
        .draw_series(std::iter::once(PathElement::new(
            vec![(mean, 0.05), (mean, 0.95)],
            CYAN.stroke_width(4),
        )))
        .context("Failed to draw threshold")?;
    Ok(())
}

fn draw_motivation(root: &Area<'_>, report: &DashboardReport) -> Result<()> {
    match &report.motivation {
        Some(MotivationView::ScoreCounts(counts)) => {
            let labels: Vec<String> = counts.iter().map(|c| c.value.clone()).collect();
            let values: Vec<f64> = counts.iter().map(|c| c.count as f64).collect();
            draw_vertical_bars(
                root,
                "Motivation increase",
                &labels,
                &values,
                "Respondents",
                PINK,
            )
        }
        Some(MotivationView::TopFactors(top)) => {
            draw_factor_bars(root, "Top factors (no motivation data)", top)
        }
        None => Ok(()),
    }
}

fn draw_faculty_means(root: &Area<'_>, report: &DashboardReport) -> Result<()> {
    let means = report.faculty_means.series(KEPUASAN).unwrap_or_default();
    let labels: Vec<String> = report.faculty_means.keys().iter().map(|k| k.to_string()).collect();
    let values: Vec<f64> = means.into_iter().map(|m| m.unwrap_or(0.0)).collect();
    draw_vertical_bars(
        root,
        "Mean satisfaction by faculty",
        &labels,
        &values,
        "Mean satisfaction",
        HOT_PINK,
    )
}

fn draw_vertical_bars(
    root: &Area<'_>,
    title: &str,
    labels: &[String],
    values: &[f64],
    y_desc: &str,
    color: RGBColor,
) -> Result<()> {
    let y_max = max_or(values.iter().copied(), 1.0) * 1.1;

    let mut chart = ChartBuilder::on(root)
        .margin(15)
        .caption(title, (FONT, CAPTION_SIZE))
        .x_label_area_size(45)
        .y_label_area_size(55)
        .build_cartesian_2d((0..labels.len()).into_segmented(), 0f64..y_max)
        .context("Failed to build chart")?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .light_line_style(GRID.mix(0.3))
        .x_label_formatter(&|v| segment_label(labels, v))
        .y_desc(y_desc)
        .draw()
        .context("Failed to draw mesh")?;

    chart
        .draw_series(
            Histogram::vertical(&chart)
                .style(color.filled())
                .margin(12)
                .data(values.iter().enumerate().map(|(i, &v)| (i, v))),
        )
        .context("Failed to draw bars")?;
    Ok(())
}

fn draw_factor_bars(root: &Area<'_>, title: &str, factors: &[FactorMean]) -> Result<()> {
    let labels: Vec<String> = factors.iter().map(|f| f.factor.label().to_string()).collect();

    let mut chart = ChartBuilder::on(root)
        .margin(15)
        .caption(title, (FONT, CAPTION_SIZE))
        .x_label_area_size(40)
        .y_label_area_size(180)
        .build_cartesian_2d(0f64..SatisfactionLevel::SCALE_MAX, (0..labels.len()).into_segmented())
        .context("Failed to build chart")?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .light_line_style(GRID.mix(0.3))
        .y_label_formatter(&|v| segment_label(&labels, v))
        .x_desc("Mean score")
        .draw()
        .context("Failed to draw mesh")?;

    chart
        .draw_series(
            Histogram::horizontal(&chart)
                .style(PINK.filled())
                .margin(8)
                .data(
                    factors
                        .iter()
                        .enumerate()
                        .map(|(i, f)| (i, f.mean.unwrap_or(0.0))),
                ),
        )
        .context("Failed to draw bars")?;
    Ok(())
}

fn draw_faculty_share(root: &Area<'_>, report: &DashboardReport) -> Result<()> {
    let area = root
        .titled("Respondents by faculty", (FONT, CAPTION_SIZE))
        .context("Failed to draw title")?;
    let (w, h) = area.dim_in_pixel();
    let center = (w as f64 * 0.4, h as f64 / 2.0);
    let radius = (w.min(h) as f64 * 0.4).max(10.0);

    let total: usize = report.faculty_share.iter().map(|c| c.count).sum();
    let mut start = -PI / 2.0;

    for (i, share) in report.faculty_share.iter().enumerate() {
        if share.count == 0 {
            continue;
        }
        let fraction = share.count as f64 / total as f64;
        let sweep = fraction * 2.0 * PI;
        let steps = ((sweep / 0.03).ceil() as usize).max(2);

        let mut wedge = vec![(center.0 as i32, center.1 as i32)];
        wedge.extend((0..=steps).map(|s| {
            let angle = start + sweep * s as f64 / steps as f64;
            (
                (center.0 + radius * angle.cos()) as i32,
                (center.1 + radius * angle.sin()) as i32,
            )
        }));
        let color = series_color(i);
        area.draw(&Polygon::new(wedge, color.mix(0.8).filled()))
            .context("Failed to draw slice")?;

        let mid = start + sweep / 2.0;
        let label_at = (
            (center.0 + radius * 0.65 * mid.cos()) as i32,
            (center.1 + radius * 0.65 * mid.sin()) as i32,
        );
        area.draw(&Text::new(
            format!("{:.1}%", fraction * 100.0),
            label_at,
            centered(LABEL_SIZE),
        ))
        .context("Failed to draw slice label")?;

        // Legend
        let ly = 30 + i as i32 * 24;
        let lx = (w as f64 * 0.8) as i32;
        area.draw(&Rectangle::new([(lx, ly), (lx + 14, ly + 14)], color.filled()))
            .context("Failed to draw legend")?;
        area.draw(&Text::new(
            format!("{} ({})", share.value, share.count),
            (lx + 20, ly),
            (FONT, LABEL_SIZE).into_font(),
        ))
        .context("Failed to draw legend")?;

        start += sweep;
    }
    Ok(())
}

fn draw_stacked(root: &Area<'_>, report: &DashboardReport) -> Result<()> {
    let entries = report.stacked.as_deref().unwrap_or_default();

    let mut faculties: Vec<String> = Vec::new();
    let mut factors: Vec<String> = Vec::new();
    for e in entries {
        if !faculties.contains(&e.faculty) {
            faculties.push(e.faculty.clone());
        }
        if !factors.contains(&e.factor) {
            factors.push(e.factor.clone());
        }
    }

    let mut totals = vec![0.0f64; faculties.len()];
    for e in entries {
        if let Some(i) = faculties.iter().position(|f| *f == e.faculty) {
            totals[i] += e.score;
        }
    }
    let y_max = max_or(totals.iter().copied(), 1.0) * 1.15;

    let mut chart = ChartBuilder::on(root)
        .margin(15)
        .caption("Factor contribution by faculty", (FONT, CAPTION_SIZE))
        .x_label_area_size(45)
        .y_label_area_size(55)
        .build_cartesian_2d((0..faculties.len()).into_segmented(), 0f64..y_max)
        .context("Failed to build chart")?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .light_line_style(GRID.mix(0.3))
        .x_label_formatter(&|v| segment_label(&faculties, v))
        .y_desc("Sum of mean scores")
        .draw()
        .context("Failed to draw mesh")?;

    let mut base = vec![0.0f64; faculties.len()];
    for (k, factor) in factors.iter().enumerate() {
        let color = series_color(k);
        let mut bars = Vec::new();
        for e in entries.iter().filter(|e| e.factor == *factor) {
            let Some(i) = faculties.iter().position(|f| *f == e.faculty) else {
                continue;
            };
            let mut bar = Rectangle::new(
                [
                    (SegmentValue::Exact(i), base[i]),
                    (SegmentValue::Exact(i + 1), base[i] + e.score),
                ],
                color.filled(),
            );
            bar.set_margin(0, 0, 12, 12);
            base[i] += e.score;
            bars.push(bar);
        }

        let legend = Factor::from_column(factor).map_or(factor.as_str(), |f| f.label());
        chart
            .draw_series(bars)
            .context("Failed to draw stacked bars")?
            .label(legend)
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .context("Failed to draw legend")?;
    Ok(())
}

fn draw_scatter(root: &Area<'_>, report: &DashboardReport, factor: Factor) -> Result<()> {
    let Some(pairs) = report.scatter.iter().find(|s| s.factor == factor) else {
        return Ok(());
    };

    let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(x, y) in &pairs.points {
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }

    let mut chart = ChartBuilder::on(root)
        .margin(15)
        .caption(
            format!("{} vs overall satisfaction", factor.label()),
            (FONT, CAPTION_SIZE),
        )
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d((x_min - 0.5)..(x_max + 0.5), (y_min - 0.5)..(y_max + 0.5))
        .context("Failed to build chart")?;

    chart
        .configure_mesh()
        .light_line_style(GRID.mix(0.3))
        .x_desc(factor.label())
        .y_desc("Overall satisfaction")
        .draw()
        .context("Failed to draw mesh")?;

    let mut faculties: Vec<&str> = pairs.faculties.iter().flatten().map(String::as_str).collect();
    faculties.sort_unstable();
    faculties.dedup();

    for (i, faculty) in faculties.iter().enumerate() {
        let color = series_color(i);
        chart
            .draw_series(
                pairs
                    .points
                    .iter()
                    .zip(&pairs.faculties)
                    .filter(|(_, f)| f.as_deref() == Some(*faculty))
                    .map(|(&(x, y), _)| Circle::new((x, y), 4, color.mix(0.7).filled())),
            )
            .context("Failed to draw points")?
            .label(*faculty)
            .legend(move |(x, y)| Circle::new((x, y), 4, color.filled()));
    }

    // Points without a faculty
    chart
        .draw_series(
            pairs
                .points
                .iter()
                .zip(&pairs.faculties)
                .filter(|(_, f)| f.is_none())
                .map(|(&(x, y), _)| Circle::new((x, y), 4, PINK.mix(0.7).filled())),
        )
        .context("Failed to draw points")?;

    if let Some(trend) = pairs.trend {
        chart
            .draw_series(LineSeries::new(
                [x_min, x_max].map(|x| (x, trend.predict(x))),
                CYAN.stroke_width(2),
            ))
            .context("Failed to draw trend line")?;
    }

    if !faculties.is_empty() {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::LowerRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .context("Failed to draw legend")?;
    }
    Ok(())
}

fn draw_radar(root: &Area<'_>, profile: &[FactorMean]) -> Result<()> {
    let area = root
        .titled("Factor profile", (FONT, CAPTION_SIZE))
        .context("Failed to draw title")?;
    let (w, h) = area.dim_in_pixel();
    let center = (w as f64 / 2.0, h as f64 / 2.0);
    let radius = (w.min(h) as f64 * 0.33).max(10.0);
    let n = profile.len();

    let point = |axis: usize, value: f64| -> (i32, i32) {
        let angle = -PI / 2.0 + 2.0 * PI * axis as f64 / n as f64;
        let r = radius * value / SatisfactionLevel::SCALE_MAX;
        (
            (center.0 + r * angle.cos()) as i32,
            (center.1 + r * angle.sin()) as i32,
        )
    };

    for ring in 1..=5 {
        let mut outline: Vec<(i32, i32)> = (0..n).map(|a| point(a, ring as f64)).collect();
        if let Some(&first) = outline.first() {
            outline.push(first);
        }
        area.draw(&PathElement::new(outline, GRID.stroke_width(1)))
            .context("Failed to draw grid")?;
    }

    for (axis, item) in profile.iter().enumerate() {
        area.draw(&PathElement::new(
            vec![point(axis, 0.0), point(axis, SatisfactionLevel::SCALE_MAX)],
            GRID.stroke_width(1),
        ))
        .context("Failed to draw axis")?;
        area.draw(&Text::new(
            item.factor.label().to_string(),
            point(axis, SatisfactionLevel::SCALE_MAX * 1.2),
            centered(LABEL_SIZE),
        ))
        .context("Failed to draw axis label")?;
    }

    let shape: Vec<(i32, i32)> = profile
        .iter()
        .enumerate()
        .map(|(axis, item)| point(axis, item.mean.unwrap_or(0.0)))
        .collect();
    area.draw(&Polygon::new(shape.clone(), CYAN.mix(0.3).filled()))
        .context("Failed to draw profile")?;
    let mut outline = shape;
    if let Some(&first) = outline.first() {
        outline.push(first);
    }
    area.draw(&PathElement::new(outline, CYAN.stroke_width(2)))
        .context("Failed to draw profile")?;
    Ok(())
}

fn draw_histogram(root: &Area<'_>, report: &DashboardReport) -> Result<()> {
    let Some(hist) = &report.histogram else {
        return Ok(());
    };
    let (Some(first), Some(last)) = (hist.bins.first(), hist.bins.last()) else {
        return Ok(());
    };
    let y_max = max_or(hist.bins.iter().map(|b| b.count as f64), 1.0) * 1.15;

    let mut chart = ChartBuilder::on(root)
        .margin(15)
        .caption("Overall satisfaction distribution", (FONT, CAPTION_SIZE))
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(first.lower..last.upper, 0f64..y_max)
        .context("Failed to build chart")?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .light_line_style(GRID.mix(0.3))
        .x_desc("Overall satisfaction")
        .y_desc("Respondents")
        .draw()
        .context("Failed to draw mesh")?;

    chart
        .draw_series(hist.bins.iter().map(|b| {
            let mut bar = Rectangle::new([(b.lower, 0.0), (b.upper, b.count as f64)], PINK.filled());
            bar.set_margin(0, 0, 1, 1);
            bar
        }))
        .context("Failed to draw bins")?;

    chart
        .draw_series(std::iter::once(PathElement::new(
            vec![(hist.mean, 0.0), (hist.mean, y_max)],
            CYAN.stroke_width(2),
        )))
        .context("Failed to draw mean line")?;
    chart
        .draw_series(std::iter::once(Text::new(
            format!("Mean: {:.2}", hist.mean),
            (hist.mean, y_max * 0.95),
            (FONT, LABEL_SIZE).into_font(),
        )))
        .context("Failed to draw mean label")?;
    Ok(())
}

fn draw_boxplot(root: &Area<'_>, report: &DashboardReport) -> Result<()> {
    let labels: Vec<String> = report.boxplots.iter().map(|b| b.group.clone()).collect();
    let y_max = max_or(report.boxplots.iter().map(|b| b.stats.max), 1.0) + 0.5;
    let y_min = report
        .boxplots
        .iter()
        .map(|b| b.stats.min)
        .fold(f64::INFINITY, f64::min)
        .min(y_max - 1.0)
        - 0.5;

    let mut chart = ChartBuilder::on(root)
        .margin(15)
        .caption("Satisfaction spread by faculty", (FONT, CAPTION_SIZE))
        .x_label_area_size(45)
        .y_label_area_size(50)
        .build_cartesian_2d((0..labels.len()).into_segmented(), y_min..y_max)
        .context("Failed to build chart")?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .light_line_style(GRID.mix(0.3))
        .x_label_formatter(&|v| segment_label(&labels, v))
        .y_desc("Overall satisfaction")
        .draw()
        .context("Failed to draw mesh")?;

    for (i, group) in report.boxplots.iter().enumerate() {
        let s = &group.stats;
        let color = series_color(i);
        let span = |low: f64, high: f64, margin: u32, style: ShapeStyle| {
            let mut r = Rectangle::new(
                [(SegmentValue::Exact(i), low), (SegmentValue::Exact(i + 1), high)],
                style,
            );
            r.set_margin(0, 0, margin, margin);
            r
        };

        chart
            .draw_series([
                span(s.q1, s.q3, 20, color.mix(0.4).filled()),
                span(s.q1, s.q3, 20, color.stroke_width(2)),
                span(s.median, s.median, 20, BLACK.stroke_width(2)),
                span(s.lower_whisker, s.lower_whisker, 35, color.stroke_width(2)),
                span(s.upper_whisker, s.upper_whisker, 35, color.stroke_width(2)),
            ])
            .context("Failed to draw box")?;
        chart
            .draw_series([
                PathElement::new(
                    vec![(SegmentValue::CenterOf(i), s.lower_whisker), (SegmentValue::CenterOf(i), s.q1)],
                    color.stroke_width(2),
                ),
                PathElement::new(
                    vec![(SegmentValue::CenterOf(i), s.q3), (SegmentValue::CenterOf(i), s.upper_whisker)],
                    color.stroke_width(2),
                ),
            ])
            .context("Failed to draw whiskers")?;
        chart
            .draw_series(
                s.outliers
                    .iter()
                    .map(|&o| Circle::new((SegmentValue::CenterOf(i), o), 3, color.filled())),
            )
            .context("Failed to draw outliers")?;
    }
    Ok(())
}

fn draw_heatmap(root: &Area<'_>, report: &DashboardReport) -> Result<()> {
    let Some(matrix) = report.correlation.matrix() else {
        return Ok(());
    };
    let n = matrix.size();
    let labels: Vec<String> = matrix
        .columns()
        .iter()
        .map(|c| Factor::from_column(c).map_or_else(|| c.clone(), |f| f.label().to_string()))
        .collect();
    // Row 0 at the top
    let row_labels: Vec<String> = labels.iter().rev().cloned().collect();

    let mut chart = ChartBuilder::on(root)
        .margin(15)
        .caption("Correlation between factors", (FONT, CAPTION_SIZE))
        .x_label_area_size(60)
        .y_label_area_size(180)
        .build_cartesian_2d((0..n).into_segmented(), (0..n).into_segmented())
        .context("Failed to build chart")?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_label_formatter(&|v| segment_label(&labels, v))
        .y_label_formatter(&|v| segment_label(&row_labels, v))
        .draw()
        .context("Failed to draw mesh")?;

    let cells = (0..n).flat_map(|i| (0..n).map(move |j| (i, j)));
    chart
        .draw_series(cells.clone().map(|(i, j)| {
            let y = n - 1 - i;
            Rectangle::new(
                [
                    (SegmentValue::Exact(j), SegmentValue::Exact(y)),
                    (SegmentValue::Exact(j + 1), SegmentValue::Exact(y + 1)),
                ],
                heat_color(matrix.values()[i][j]).filled(),
            )
        }))
        .context("Failed to draw cells")?;
    chart
        .draw_series(cells.map(|(i, j)| {
            let r = matrix.values()[i][j];
            let text = if r.is_nan() { "n/a".to_string() } else { format!("{:.2}", r) };
            Text::new(
                text,
                (SegmentValue::CenterOf(j), SegmentValue::CenterOf(n - 1 - i)),
                centered(LABEL_SIZE),
            )
        }))
        .context("Failed to draw values")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DataLoader, Selector};
    use crate::session::Session;

    const CSV: &str = "\
Fakultas,Kepuasan_Keseluruhan,Kualitas_Internet,Jam_Operasional,Peningkatan_Motivasi,Diskusi_Kelompok
FT,4,5,3,4,2
FT,2,3,4,5,3
FEB,5,5,2,4,4
FISIP,3,2,3,3,5
FEB,4,4,4,5,4
";

    fn report(csv: &str) -> DashboardReport {
        let session = Session::from_upload(&DataLoader::default(), csv.as_bytes()).unwrap();
        DashboardReport::build(&session, &ChartConfig::default()).unwrap()
    }

    #[test]
    fn test_plan_includes_every_available_chart() {
        let plan = ChartKind::plan(&report(CSV));
        assert_eq!(plan.first(), Some(&ChartKind::Gauge));
        assert!(plan.contains(&ChartKind::Stacked));
        assert!(plan.contains(&ChartKind::Scatter(Factor::DiskusiKelompok)));
        assert!(plan.contains(&ChartKind::Heatmap));
        // gauge, motivation, best, worst, faculty means, share, stacked,
        // 4 scatters, radar, histogram, boxplot, heatmap
        assert_eq!(plan.len(), 15);
    }

    #[test]
    fn test_plan_skips_unavailable_charts() {
        let plan = ChartKind::plan(&report("Fakultas,Kepuasan_Keseluruhan\nFT,4\nFEB,3\n"));
        assert!(!plan.contains(&ChartKind::Heatmap));
        assert!(!plan.contains(&ChartKind::Stacked));
        assert!(!plan.contains(&ChartKind::Radar));
        assert!(!plan.contains(&ChartKind::Motivation));
        assert!(plan.contains(&ChartKind::Histogram));
        assert!(plan.contains(&ChartKind::Boxplot));
    }

    #[test]
    fn test_file_names_are_unique() {
        let plan = ChartKind::plan(&report(CSV));
        let mut names: Vec<String> = plan.iter().map(|k| k.file_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), plan.len());
        assert_eq!(
            ChartKind::Scatter(Factor::KualitasInternet).file_name(),
            "scatter_kualitas_internet.png"
        );
    }

    #[test]
    fn test_render_all_writes_png_files() {
        let mut session = Session::from_upload(&DataLoader::default(), CSV.as_bytes()).unwrap();
        session.select_faculty(Selector::parse("FT"));
        let report = DashboardReport::build(&session, &ChartConfig::default()).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let renderer = ChartRenderer::new(640, 480);
        match renderer.render_all(&report, dir.path()) {
            Ok(paths) => {
                assert_eq!(paths.len(), ChartKind::plan(&report).len());
                for path in paths {
                    let bytes = std::fs::read(&path).unwrap();
                    assert_eq!(&bytes[..4], b"\x89PNG");
                }
            }
            // Hosts without any system font cannot draw text
            Err(e) => assert!(format!("{:#}", e).to_lowercase().contains("font")),
        }
    }
}
