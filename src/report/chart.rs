// ==========================================
// 设备故障停机统计系统 - 统计柱状图渲染
// ==========================================
// 每个分类一根柱，柱顶标注两位小数；目标值处画红色水平参考线
// 纵轴范围 0..=ChartSpec.y_max（由统计引擎按指标给定）
// NaN 数值不画柱
// ==========================================

use crate::engine::statistics::{ChartSpec, MetricRow};
use crate::report::error::{white_buffer, ReportError, ReportResult};
use image::RgbImage;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

pub const CHART_WIDTH: u32 = 600;
pub const CHART_HEIGHT: u32 = 400;

const BAR_COLOR: RGBColor = RGBColor(70, 130, 180);

/// 柱状图渲染为位图
pub fn render_bar_chart(spec: &ChartSpec, rows: &[MetricRow], width: u32, height: u32) -> ReportResult<RgbImage> {
    let mut buffer = white_buffer(width, height)?;
    let segments = rows.len().max(1) as i32;
    let y_max = if spec.y_max.is_finite() && spec.y_max > 0.0 {
        spec.y_max
    } else {
        1.0
    };
    let labels: Vec<&str> = rows.iter().map(|r| r.category.as_str()).collect();

    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(ReportError::render)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(&spec.title, ("sans-serif", 20))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d((0..segments).into_segmented(), 0.0..y_max)
            .map_err(ReportError::render)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(rows.len().max(1))
            .x_label_formatter(&|v| match v {
                SegmentValue::CenterOf(i) => labels
                    .get(*i as usize)
                    .map(|s| s.to_string())
                    .unwrap_or_default(),
                _ => String::new(),
            })
            .draw()
            .map_err(ReportError::render)?;

        chart
            .draw_series(
                rows.iter()
                    .enumerate()
                    .filter(|(_, r)| r.value.is_finite())
                    .map(|(i, r)| {
                        let i = i as i32;
                        let mut bar = Rectangle::new(
                            [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), r.value)],
                            BAR_COLOR.filled(),
                        );
                        bar.set_margin(0, 0, 8, 8);
                        bar
                    }),
            )
            .map_err(ReportError::render)?;

        chart
            .draw_series(LineSeries::new(
                vec![
                    (SegmentValue::Exact(0), spec.target),
                    (SegmentValue::Exact(segments), spec.target),
                ],
                RED.stroke_width(2),
            ))
            .map_err(ReportError::render)?;

        let value_style = TextStyle::from(("sans-serif", 13).into_font())
            .pos(Pos::new(HPos::Center, VPos::Bottom));
        chart
            .draw_series(
                rows.iter()
                    .enumerate()
                    .filter(|(_, r)| r.value.is_finite())
                    .map(|(i, r)| {
                        Text::new(
                            format!("{:.2}", r.value),
                            (SegmentValue::CenterOf(i as i32), r.value),
                            value_style.clone(),
                        )
                    }),
            )
            .map_err(ReportError::render)?;

        root.present().map_err(ReportError::render)?;
    }

    RgbImage::from_raw(width, height, buffer).ok_or(ReportError::BufferSize { width, height })
}
