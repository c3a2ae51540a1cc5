// src/report/charts.rs
// SVG charts: price with signals and MACD, portfolio vs buy-and-hold, metric bars

use std::ops::Range;
use std::path::Path;

use chrono::NaiveDate;
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::backtest::{BacktestMetrics, BacktestResult};
use crate::data::PriceSeries;
use crate::error::{Error, Result};
use crate::strategy::{Signal, StrategyOutput};

type DrawResult = std::result::Result<(), Box<dyn std::error::Error>>;

const WIDTH: u32 = 1200;
const HEIGHT: u32 = 800;
const ORANGE: RGBColor = RGBColor(255, 140, 0);
const PURPLE: RGBColor = RGBColor(128, 0, 128);
const FONT: &str = "sans-serif";

fn chart_error(path: &Path, e: Box<dyn std::error::Error>) -> Error {
    Error::Chart(format!("{}: {}", path.display(), e))
}

/// Axis range covering the finite values with 5% headroom
fn padded_range<'a>(series: impl IntoIterator<Item = &'a [f64]>) -> Range<f64> {
    let (lo, hi) = series
        .into_iter()
        .flat_map(|s| s.iter().copied())
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

    if !lo.is_finite() || !hi.is_finite() {
        return -1.0..1.0;
    }
    if hi - lo < f64::EPSILON {
        return (lo - 1.0)..(hi + 1.0);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad)..(hi + pad)
}

/// `(index, value)` pairs, skipping undefined values
fn indexed(values: &[f64]) -> Vec<(f64, f64)> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .map(|(i, &v)| (i as f64, v))
        .collect()
}

fn date_label(dates: &[NaiveDate], x: f64) -> String {
    dates
        .get(x.round().max(0.0) as usize)
        .map(|d| d.format("%Y-%m").to_string())
        .unwrap_or_default()
}

fn x_range(len: usize) -> Range<f64> {
    0.0..(len.max(2) - 1) as f64
}

fn legend_line(color: RGBColor) -> impl Fn((i32, i32)) -> PathElement<(i32, i32)> {
    move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
}

/// Close price with buy and sell markers above the MACD and signal lines
pub fn plot_macd(path: &Path, prices: &PriceSeries, output: &StrategyOutput) -> Result<()> {
    draw_macd(path, prices, output).map_err(|e| chart_error(path, e))
}

fn draw_macd(path: &Path, prices: &PriceSeries, output: &StrategyOutput) -> DrawResult {
    let dates = prices.dates();
    let closes = prices.closes();
    let macd = &output.macd;
    let x = x_range(dates.len());

    let root = SVGBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;
    let (upper, lower) = root.split_vertically(HEIGHT * 2 / 3);

    let mut price_chart = ChartBuilder::on(&upper)
        .caption(
            format!("MACD - {} - Price Chart with Signals", prices.symbol()),
            (FONT, 22),
        )
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(70)
        .build_cartesian_2d(x.clone(), padded_range([closes.as_slice()]))?;

    price_chart
        .configure_mesh()
        .x_labels(10)
        .x_label_formatter(&|v| date_label(&dates, *v))
        .y_desc("Price ($)")
        .draw()?;

    price_chart
        .draw_series(LineSeries::new(indexed(&closes), BLACK.stroke_width(2)))?
        .label("Close Price")
        .legend(legend_line(BLACK));

    let marker_points = |kind: Signal| -> Vec<(f64, f64)> {
        output
            .signals
            .signal
            .iter()
            .zip(closes.iter())
            .enumerate()
            .filter(|(_, (s, c))| **s == kind && c.is_finite())
            .map(|(i, (_, &c))| (i as f64, c))
            .collect()
    };

    price_chart
        .draw_series(
            marker_points(Signal::Buy)
                .into_iter()
                .map(|p| TriangleMarker::new(p, 7, GREEN.filled())),
        )?
        .label("Buy Signal")
        .legend(|(x, y)| TriangleMarker::new((x + 10, y), 6, GREEN.filled()));

    price_chart
        .draw_series(marker_points(Signal::Sell).into_iter().map(|p| {
            EmptyElement::at(p) + Polygon::new(vec![(-7, -5), (7, -5), (0, 7)], RED.filled())
        }))?
        .label("Sell Signal")
        .legend(|(x, y)| EmptyElement::at((x + 10, y)) + Polygon::new(vec![(-6, -4), (6, -4), (0, 6)], RED.filled()));

    price_chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    let mut macd_chart = ChartBuilder::on(&lower)
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(70)
        .build_cartesian_2d(
            x,
            padded_range([
                macd.macd_line.as_slice(),
                macd.signal_line.as_slice(),
                macd.histogram.as_slice(),
                &[0.0][..],
            ]),
        )?;

    macd_chart
        .configure_mesh()
        .x_labels(10)
        .x_label_formatter(&|v| date_label(&dates, *v))
        .x_desc("Date")
        .y_desc("MACD")
        .draw()?;

    macd_chart.draw_series(macd.histogram.iter().enumerate().filter(|(_, h)| h.is_finite()).map(|(i, &h)| {
        let color = if h >= 0.0 { GREEN.mix(0.4) } else { RED.mix(0.4) };
        Rectangle::new([(i as f64 - 0.4, 0.0), (i as f64 + 0.4, h)], color.filled())
    }))?;

    macd_chart.draw_series(LineSeries::new(
        vec![(0.0, 0.0), ((dates.len().max(2) - 1) as f64, 0.0)],
        BLACK.mix(0.5).stroke_width(1),
    ))?;

    macd_chart
        .draw_series(LineSeries::new(indexed(&macd.macd_line), BLUE.stroke_width(2)))?
        .label("MACD Line")
        .legend(legend_line(BLUE));
    macd_chart
        .draw_series(LineSeries::new(indexed(&macd.signal_line), ORANGE.stroke_width(2)))?
        .label("Signal Line")
        .legend(legend_line(ORANGE));

    macd_chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Strategy portfolio against buy-and-hold, with the drawdown below
pub fn plot_performance(path: &Path, symbol: &str, result: &BacktestResult) -> Result<()> {
    draw_performance(path, symbol, result).map_err(|e| chart_error(path, e))
}

fn draw_performance(path: &Path, symbol: &str, result: &BacktestResult) -> DrawResult {
    let dates: Vec<NaiveDate> = result.days.iter().map(|d| d.date).collect();
    let values = result.portfolio_values();
    let buy_hold = result.buy_hold_values();
    let drawdowns = result.drawdowns();
    let x = x_range(dates.len());

    let root = SVGBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;
    let (upper, lower) = root.split_vertically(HEIGHT * 2 / 3);

    let mut value_chart = ChartBuilder::on(&upper)
        .caption(format!("Performance - {symbol} - Portfolio Value"), (FONT, 22))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(80)
        .build_cartesian_2d(x.clone(), padded_range([values.as_slice(), buy_hold.as_slice()]))?;

    value_chart
        .configure_mesh()
        .x_labels(10)
        .x_label_formatter(&|v| date_label(&dates, *v))
        .y_desc("Portfolio Value ($)")
        .draw()?;

    value_chart
        .draw_series(LineSeries::new(indexed(&values), BLUE.stroke_width(2)))?
        .label("Strategy Portfolio")
        .legend(legend_line(BLUE));
    value_chart
        .draw_series(LineSeries::new(indexed(&buy_hold), RED.mix(0.7).stroke_width(2)))?
        .label("Buy & Hold")
        .legend(legend_line(RED));

    value_chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    let mut dd_chart = ChartBuilder::on(&lower)
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(80)
        .build_cartesian_2d(x, padded_range([drawdowns.as_slice(), &[0.0][..]]))?;

    dd_chart
        .configure_mesh()
        .x_labels(10)
        .x_label_formatter(&|v| date_label(&dates, *v))
        .y_label_formatter(&|v| format!("{:.0}%", v * 100.0))
        .x_desc("Date")
        .y_desc("Drawdown")
        .draw()?;

    dd_chart.draw_series(
        AreaSeries::new(indexed(&drawdowns), 0.0, RED.mix(0.3)).border_style(RED.stroke_width(1)),
    )?;

    root.present()?;
    Ok(())
}

/// Four bar panels: returns, risk, Sharpe ratio and trading statistics
pub fn plot_metrics(path: &Path, symbol: &str, metrics: &BacktestMetrics) -> Result<()> {
    draw_metrics(path, symbol, metrics).map_err(|e| chart_error(path, e))
}

struct Panel<'a> {
    title: &'a str,
    y_desc: &'a str,
    bars: Vec<(&'a str, f64, RGBColor)>,
    label: fn(f64) -> String,
}

fn draw_metrics(path: &Path, symbol: &str, m: &BacktestMetrics) -> DrawResult {
    let root = SVGBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(&format!("Performance Metrics - {symbol}"), (FONT, 26))?;

    let panels = [
        Panel {
            title: "Returns",
            y_desc: "Return (%)",
            bars: vec![
                ("Total Return", m.total_return * 100.0, RGBColor(173, 216, 230)),
                ("Annualized Return", m.annualized_return * 100.0, RGBColor(144, 238, 144)),
            ],
            label: |v| format!("{v:.2}%"),
        },
        Panel {
            title: "Risk Metrics",
            y_desc: "Risk (%)",
            bars: vec![
                ("Volatility", m.volatility * 100.0, ORANGE),
                ("Max Drawdown", m.max_drawdown.abs() * 100.0, RED),
            ],
            label: |v| format!("{v:.2}%"),
        },
        Panel {
            title: "Risk-Adjusted Return",
            y_desc: "Sharpe Ratio",
            bars: vec![("Sharpe Ratio", m.sharpe_ratio, PURPLE)],
            label: |v| format!("{v:.2}"),
        },
        Panel {
            title: "Trading Statistics",
            y_desc: "Count / Percentage",
            bars: vec![
                ("Number of Trades", m.num_trades as f64, RGBColor(240, 128, 128)),
                ("Win Rate (%)", m.win_rate * 100.0, RGBColor(176, 196, 222)),
            ],
            label: |v| format!("{v:.1}"),
        },
    ];

    for (area, panel) in root.split_evenly((2, 2)).iter().zip(panels.iter()) {
        draw_panel(area, panel)?;
    }

    root.present()?;
    Ok(())
}

fn draw_panel(area: &DrawingArea<SVGBackend, Shift>, panel: &Panel) -> DrawResult {
    let values: Vec<f64> = panel.bars.iter().map(|(_, v, _)| *v).collect();
    let range = padded_range([values.as_slice(), &[0.0][..]]);
    let count = panel.bars.len() as i32;

    let mut chart = ChartBuilder::on(area)
        .caption(panel.title, (FONT, 18))
        .margin(15)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d((0..count).into_segmented(), range)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_label_formatter(&|v| match v {
            SegmentValue::CenterOf(i) => panel
                .bars
                .get(*i as usize)
                .map(|(name, _, _)| name.to_string())
                .unwrap_or_default(),
            _ => String::new(),
        })
        .y_desc(panel.y_desc)
        .draw()?;

    chart.draw_series(panel.bars.iter().enumerate().map(|(i, (_, value, color))| {
        let i = i as i32;
        let mut bar = Rectangle::new(
            [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), *value)],
            color.filled(),
        );
        bar.set_margin(0, 0, 20, 20);
        bar
    }))?;

    chart.draw_series(panel.bars.iter().enumerate().map(|(i, (_, value, _))| {
        Text::new(
            (panel.label)(*value),
            (SegmentValue::CenterOf(i as i32), *value),
            (FONT, 14).into_font(),
        )
    }))?;

    Ok(())
}
