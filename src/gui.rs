//! The eframe/egui implementation of the pressure monitor window.
//!
//! The window never talks to the instrument directly: it drains the
//! monitor's event channel each frame and sends calibration requests back
//! over the command channel. Closing the window shuts the worker down,
//! flushes the session CSV and truncates the readiness marker.

use crate::monitor::{Monitor, MonitorEvent};
use crate::readiness::ReadyFile;
use crate::storage::{Sample, SampleHistory};
use crate::types::Gauge;
use eframe::egui;
use egui_plot::{Line, Plot, PlotBounds, PlotPoints};
use log::warn;
use std::time::Duration;

/// Trailing-window lengths offered for the Delta T view, in minutes.
const WINDOW_CHOICES: [u32; 8] = [1, 5, 10, 20, 30, 40, 50, 60];

/// Plot view modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlotMode {
    /// Whole session
    Full,
    /// Trailing window of the selected length
    Window,
    /// Whole session, log10 of the pressure
    Log10,
}

/// Everything the window shows before the first polled sample arrives.
pub struct StartupInfo {
    /// Port name, or a note that the simulated gauge is in use
    pub port_label: String,
    /// Label of the controller's pressure unit
    pub unit_label: String,
    /// Transmitter identification of sensor channel 1
    pub sensor1: String,
    /// Transmitter identification of sensor channel 2
    pub sensor2: String,
    /// Reading taken during startup
    pub initial: Sample,
    /// Calibration factors as reported during startup
    pub calibration: (String, String),
}

/// Main window state.
pub struct MonitorApp {
    monitor: Monitor,
    ready_file: Option<ReadyFile>,
    history: SampleHistory,
    latest: Option<Sample>,
    sample_count: u64,
    port_label: String,
    unit_label: String,
    sensor1: String,
    sensor2: String,
    cal_display: (String, String),
    cal_entry: (String, String),
    plot_mode: PlotMode,
    window_min: u32,
    fault: Option<String>,
    stopped: bool,
}

impl MonitorApp {
    pub fn new(monitor: Monitor, ready_file: Option<ReadyFile>, info: StartupInfo) -> Self {
        let mut history = SampleHistory::new();
        history.push(info.initial);
        Self {
            monitor,
            ready_file,
            history,
            latest: Some(info.initial),
            sample_count: 0,
            port_label: info.port_label,
            unit_label: info.unit_label,
            sensor1: info.sensor1,
            sensor2: info.sensor2,
            cal_display: info.calibration.clone(),
            cal_entry: info.calibration,
            plot_mode: PlotMode::Full,
            window_min: 10,
            fault: None,
            stopped: false,
        }
    }

    /// Fetch whatever the polling thread produced since the last frame.
    fn drain_events(&mut self) {
        for event in self.monitor.poll_events() {
            match event {
                MonitorEvent::Sample(sample) => {
                    self.history.push(sample);
                    self.latest = Some(sample);
                    self.sample_count += 1;
                }
                MonitorEvent::Calibration { gauge1, gauge2 } => {
                    self.cal_display = (gauge1, gauge2);
                }
                MonitorEvent::Fault(message) => {
                    warn!("monitor fault: {}", message);
                    self.fault = Some(message);
                }
            }
        }
    }

    /// Stop polling and release the shared readiness marker. Runs once.
    fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.monitor.shutdown();
        if let Some(ready) = &self.ready_file {
            if let Err(e) = ready.clear() {
                warn!("could not clear ready file: {}", e);
            }
        }
    }

    fn plot(&self, ui: &mut egui::Ui) {
        let points: Vec<[f64; 2]> = match self.plot_mode {
            PlotMode::Full => self.history.points(),
            PlotMode::Window => self.history.window_points(self.window_min as f64),
            PlotMode::Log10 => self.history.log_points(),
        };
        let y_label = match self.plot_mode {
            PlotMode::Log10 => format!("log10 Pressure ({})", self.unit_label),
            _ => format!("Pressure ({})", self.unit_label),
        };
        let line = Line::new(PlotPoints::from_iter(points.iter().copied()));
        let bounds = plot_bounds(&points, self.plot_mode);
        Plot::new("pressure_history")
            .height(280.0)
            .x_axis_label("Time (minutes)")
            .y_axis_label(y_label)
            .show(ui, |plot_ui| {
                if let Some(bounds) = bounds {
                    plot_ui.set_plot_bounds(bounds);
                }
                plot_ui.line(line);
            });
    }

    fn readouts(&mut self, ui: &mut egui::Ui) {
        let latest = self.latest;
        egui::Grid::new("current_state")
            .num_columns(4)
            .spacing([24.0, 6.0])
            .show(ui, |ui| {
                ui.label(format!("Pressure ({})", self.unit_label));
                match latest {
                    Some(sample) => ui.label(format!("{:.3e}", sample.pressure)),
                    None => ui.label("-"),
                };
                ui.label("Sensor 1");
                ui.label(&self.sensor1);
                ui.end_row();

                ui.label("State");
                match latest {
                    Some(sample) => {
                        let color = if sample.status.is_passed() {
                            egui::Color32::LIGHT_GREEN
                        } else {
                            egui::Color32::YELLOW
                        };
                        ui.colored_label(color, sample.status.label())
                    }
                    None => ui.label("-"),
                };
                ui.label("Sensor 2");
                ui.label(&self.sensor2);
                ui.end_row();

                ui.label("Calibration (Sen 1)");
                ui.label(&self.cal_display.0);
                ui.label("Calibration (Sen 2)");
                ui.label(&self.cal_display.1);
                ui.end_row();
            });

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            ui.label("Set calibration Sen 1:");
            let entry = ui.add(egui::TextEdit::singleline(&mut self.cal_entry.0).desired_width(80.0));
            let entered = entry.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if entered || ui.button("Apply").clicked() {
                self.apply_calibration(Gauge::One);
            }
        });
        ui.horizontal(|ui| {
            ui.label("Set calibration Sen 2:");
            let entry = ui.add(egui::TextEdit::singleline(&mut self.cal_entry.1).desired_width(80.0));
            let entered = entry.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if entered || ui.button("Apply").clicked() {
                self.apply_calibration(Gauge::Two);
            }
        });
    }

    fn apply_calibration(&mut self, gauge: Gauge) {
        let entry = match gauge {
            Gauge::One => &self.cal_entry.0,
            Gauge::Two => &self.cal_entry.1,
        };
        match entry.trim().parse::<f64>() {
            Ok(factor) if factor > 0.0 => self.monitor.set_calibration(gauge, factor),
            _ => warn!("ignoring calibration entry {:?}", entry),
        }
    }
}

impl eframe::App for MonitorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();

        if ctx.input(|i| i.viewport().close_requested()) {
            self.stop();
        }

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("TPG261 Pfeiffer Vacuum Single Gauge");
                ui.separator();
                ui.label(&self.port_label);
            });
        });

        egui::TopBottomPanel::bottom("footer").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let clock = self.latest.map(|s| s.elapsed_min).unwrap_or(0.0);
                ui.label(format!("Clock (min): {:.2}", clock));
                ui.separator();
                ui.label(format!("Data points: {}", self.sample_count));
                ui.separator();
                if ui.button("Quit").clicked() {
                    self.stop();
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(fault) = &self.fault {
                ui.colored_label(egui::Color32::RED, format!("Controller fault: {}", fault));
                ui.separator();
            }
            self.plot(ui);
            ui.horizontal(|ui| {
                ui.radio_value(&mut self.plot_mode, PlotMode::Full, "Full Time");
                ui.radio_value(&mut self.plot_mode, PlotMode::Window, "Delta T");
                egui::ComboBox::from_label("minutes")
                    .selected_text(self.window_min.to_string())
                    .show_ui(ui, |ui| {
                        for choice in WINDOW_CHOICES {
                            ui.selectable_value(&mut self.window_min, choice, choice.to_string());
                        }
                    });
                ui.radio_value(&mut self.plot_mode, PlotMode::Log10, "Log10");
            });
            ui.separator();
            self.readouts(ui);
        });

        // New samples arrive every poll interval whether or not the user
        // interacts, so keep repainting.
        ctx.request_repaint_after(Duration::from_millis(100));
    }
}

impl Drop for MonitorApp {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Axis bounds for the current view: x pinned to the data range, y with a
/// margin below the minimum and above the maximum.
fn plot_bounds(points: &[[f64; 2]], mode: PlotMode) -> Option<PlotBounds> {
    let first = points.first()?;
    let last = points.last()?;
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for point in points {
        y_min = y_min.min(point[1]);
        y_max = y_max.max(point[1]);
    }
    let (y_lo, y_hi) = match mode {
        PlotMode::Log10 => (y_min - 0.5, y_max + 0.5),
        _ => (0.9 * y_min, 1.1 * y_max),
    };
    if !(y_lo < y_hi) {
        return None;
    }
    let x_min = first[0];
    let x_max = last[0];
    let span = (x_max - x_min).max(1e-3);
    Some(PlotBounds::from_min_max(
        [x_min, y_lo],
        [x_max + 0.02 * span, y_hi],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GaugeStatus;
    use chrono::Local;

    fn sample(elapsed_min: f64, pressure: f64) -> Sample {
        Sample {
            time: Local::now(),
            elapsed_min,
            status: GaugeStatus::Passed,
            pressure,
        }
    }

    fn points(samples: &[(f64, f64)]) -> Vec<[f64; 2]> {
        samples.iter().map(|&(x, y)| [x, y]).collect()
    }

    #[test]
    fn linear_bounds_add_a_relative_margin() {
        let bounds = plot_bounds(&points(&[(0.0, 1.0e-6), (2.0, 3.0e-6)]), PlotMode::Full).unwrap();
        let min = bounds.min();
        let max = bounds.max();
        assert!((min[1] - 0.9e-6).abs() < 1e-12);
        assert!((max[1] - 3.3e-6).abs() < 1e-12);
        assert_eq!(min[0], 0.0);
        assert!(max[0] > 2.0);
    }

    #[test]
    fn log_bounds_add_half_a_decade() {
        let bounds = plot_bounds(&points(&[(0.0, -6.0), (1.0, -4.0)]), PlotMode::Log10).unwrap();
        assert_eq!(bounds.min()[1], -6.5);
        assert_eq!(bounds.max()[1], -3.5);
    }

    #[test]
    fn no_bounds_without_points() {
        assert!(plot_bounds(&[], PlotMode::Full).is_none());
    }

    #[test]
    fn single_point_still_produces_bounds() {
        let bounds = plot_bounds(&points(&[(0.0, 1.0e-6)]), PlotMode::Full).unwrap();
        assert!(bounds.min()[1] < 1.0e-6);
        assert!(bounds.max()[1] > 1.0e-6);
    }

    #[test]
    fn window_mode_uses_trimmed_history() {
        let mut history = SampleHistory::new();
        for i in 0..30 {
            history.push(sample(i as f64, 1.0e-6));
        }
        let trimmed = history.window_points(5.0);
        assert_eq!(trimmed.first().unwrap()[0], 24.0);
        let bounds = plot_bounds(&trimmed, PlotMode::Window).unwrap();
        assert_eq!(bounds.min()[0], 24.0);
    }
}
