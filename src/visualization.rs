//! Visualization utilities for Bin Packing solutions.
//! 
//! Generates SVG bar charts of bins and exports for plotting.

use crate::instance::BppInstance;
use crate::solution::Solution;
use std::fs::File;
use std::io::Write;
use std::path::Path;

const PALETTE: [&str; 8] = [
    "#3498db", "#2ecc71", "#f39c12", "#9b59b6", "#1abc9c", "#e67e22", "#34495e", "#16a085",
];

/// SVG visualization generator
pub struct Visualizer {
    /// Canvas width
    pub width: f64,
    /// Canvas height
    pub height: f64,
    /// Margin
    pub margin: f64,
    /// Print item ids inside the segments
    pub show_labels: bool,
}

impl Default for Visualizer {
    fn default() -> Self {
        Visualizer {
            width: 1000.0,
            height: 500.0,
            margin: 50.0,
            show_labels: true,
        }
    }
}

impl Visualizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate SVG bar chart of a solution: one column per bin, items stacked
    /// from the bottom, slack left empty.
    pub fn generate_svg(&self, instance: &BppInstance, solution: &Solution) -> String {
        let mut svg = String::new();

        svg.push_str(&format!(
            r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">
<style>
    .bin {{ fill: #ffffff; stroke: #2c3e50; stroke-width: 1; }}
    .full {{ stroke: #27ae60; stroke-width: 2; }}
    .item {{ stroke: #ecf0f1; stroke-width: 0.5; }}
    .label {{ font-family: Arial; font-size: 9px; fill: #ffffff; }}
    .axis {{ font-family: Arial; font-size: 10px; fill: #2c3e50; }}
    .title {{ font-family: Arial; font-size: 14px; fill: #2c3e50; font-weight: bold; }}
</style>
<rect width="100%" height="100%" fill="#ecf0f1"/>
"##,
            self.width, self.height, self.width, self.height
        ));

        svg.push_str(&format!(
            r##"<text x="{}" y="25" class="title">Instance: {} | Bins: {} (best known {}) | Full: {} | Utilization: {:.1}%</text>
"##,
            self.margin,
            instance.name,
            solution.bin_count(),
            instance.best_known_bins,
            solution.full_bins(),
            solution.utilization() * 100.0
        ));

        let plot_width = self.width - 2.0 * self.margin;
        let plot_height = self.height - 2.0 * self.margin;
        let column = plot_width / solution.bin_count().max(1) as f64;
        let bar_width = (column * 0.8).max(1.0);
        let y_scale = plot_height / instance.capacity.max(1) as f64;
        let bottom = self.height - self.margin;

        for (index, bin) in solution.bins.iter().enumerate() {
            let x = self.margin + index as f64 * column + (column - bar_width) / 2.0;
            let class = if bin.is_full() { "bin full" } else { "bin" };

            svg.push_str(&format!(
                r##"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" class="{}"/>
"##,
                x, self.margin, bar_width, plot_height, class
            ));

            let mut y = bottom;
            for item in bin.items() {
                let h = item.size as f64 * y_scale;
                y -= h;
                svg.push_str(&format!(
                    r##"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}" class="item"><title>item {} (size {})</title></rect>
"##,
                    x,
                    y,
                    bar_width,
                    h,
                    PALETTE[item.id % PALETTE.len()],
                    item.id,
                    item.size
                ));

                if self.show_labels && h >= 10.0 && bar_width >= 14.0 {
                    svg.push_str(&format!(
                        r##"<text x="{:.2}" y="{:.2}" class="label" text-anchor="middle">{}</text>
"##,
                        x + bar_width / 2.0,
                        y + h / 2.0 + 3.0,
                        item.id
                    ));
                }
            }

            if column >= 12.0 {
                svg.push_str(&format!(
                    r##"<text x="{:.2}" y="{:.2}" class="axis" text-anchor="middle">{}</text>
"##,
                    x + bar_width / 2.0,
                    bottom + 14.0,
                    index
                ));
            }
        }

        svg.push_str("</svg>");

        svg
    }

    /// Generate slack histogram SVG: number of bins per remaining capacity
    pub fn generate_slack_svg(&self, instance: &BppInstance, solution: &Solution) -> String {
        let mut svg = String::new();

        let width = self.width;
        let height = 300.0;
        let margin = 50.0;

        svg.push_str(&format!(
            r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">
<style>
    .bar {{ fill: #3498db; }}
    .axis {{ stroke: #2c3e50; stroke-width: 1; }}
    .label {{ font-family: Arial; font-size: 12px; fill: #2c3e50; }}
    .title {{ font-family: Arial; font-size: 14px; fill: #2c3e50; font-weight: bold; }}
</style>
<rect width="100%" height="100%" fill="#ecf0f1"/>
"##,
            width, height, width, height
        ));

        svg.push_str(&format!(
            r#"<text x="{}" y="25" class="title">Slack distribution - Capacity: {} | Sum of squares: {}</text>
"#,
            margin,
            instance.capacity,
            solution.slack_square_sum()
        ));

        let max_slack = solution.bins.iter().map(|b| b.remaining()).max().unwrap_or(0);
        let mut counts = vec![0usize; max_slack as usize + 1];
        for bin in &solution.bins {
            counts[bin.remaining() as usize] += 1;
        }

        let plot_width = width - 2.0 * margin;
        let plot_height = height - 2.0 * margin;
        let x_scale = plot_width / counts.len() as f64;
        let y_scale = plot_height / counts.iter().copied().max().unwrap_or(1).max(1) as f64;

        svg.push_str(&format!(
            r##"<line x1="{}" y1="{}" x2="{}" y2="{}" class="axis"/>
"##,
            margin,
            height - margin,
            width - margin,
            height - margin
        ));

        for (slack, &count) in counts.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let h = count as f64 * y_scale;
            svg.push_str(&format!(
                r##"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" class="bar"><title>slack {}: {} bins</title></rect>
"##,
                margin + slack as f64 * x_scale,
                height - margin - h,
                x_scale.max(1.0),
                h,
                slack,
                count
            ));
        }

        svg.push_str(&format!(
            r##"<text x="{}" y="{}" class="label">0</text>
<text x="{}" y="{}" class="label" text-anchor="end">{}</text>
"##,
            margin,
            height - margin + 15.0,
            width - margin,
            height - margin + 15.0,
            max_slack
        ));

        svg.push_str("</svg>");

        svg
    }

    /// Save SVG to file
    pub fn save_svg<P: AsRef<Path>>(&self, svg: &str, path: P) -> std::io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(svg.as_bytes())?;
        Ok(())
    }

    /// Export data for external plotting: one `bin,item,size` row per item
    pub fn export_plot_data(&self, instance: &BppInstance, solution: &Solution) -> String {
        let mut data = String::new();

        data.push_str("# Bin Packing Solution Data\n");
        data.push_str(&format!("# Instance: {}\n", instance.name));
        data.push_str(&format!("# Capacity: {}\n", instance.capacity));
        data.push_str(&format!("# Bins: {}\n\n", solution.bin_count()));

        data.push_str("bin,item,size\n");
        for (index, bin) in solution.bins.iter().enumerate() {
            for item in bin.items() {
                data.push_str(&format!("{},{},{}\n", index, item.id, item.size));
            }
        }

        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::construction::best_fit;

    fn create_test_case() -> (BppInstance, Solution) {
        let instance = BppInstance::new("test", 10, 2, &[4, 8, 5, 3]);
        let solution = Solution::from_bins(10, best_fit(&instance.items, 10), "BestFit");
        (instance, solution)
    }

    #[test]
    fn test_visualizer() {
        let (instance, solution) = create_test_case();
        let svg = Visualizer::new().generate_svg(&instance, &solution);

        assert!(svg.starts_with("<?xml"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("Instance: test"));
        assert_eq!(svg.matches("class=\"item\"").count(), 4);
    }

    #[test]
    fn test_slack_histogram() {
        let (instance, solution) = create_test_case();
        let svg = Visualizer::new().generate_slack_svg(&instance, &solution);

        // Slacks 2, 1 and 7: three distinct bars
        assert_eq!(svg.matches("class=\"bar\"").count(), 3);
        assert!(svg.contains("Sum of squares: 54"));
    }

    #[test]
    fn test_plot_data() {
        let (instance, solution) = create_test_case();
        let data = Visualizer::new().export_plot_data(&instance, &solution);

        assert!(data.contains("bin,item,size\n0,1,8\n1,0,4\n1,2,5\n2,3,3\n"));
    }
}
