//! Solution report files.
//! 
//! The report starts with the number of instances. Each solved instance then
//! appends a block:
//!
//! ```text
//! instance ID = u120_00
//! solution bins =   48
//! expected bins =   48
//! difference =   0
//! Bin ID: 0 --- Item ID: 12 7 98
//! ...
//! ```

use crate::solution::Solution;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Format the report block of one instance
pub fn format_solution(instance_id: &str, best_known_bins: usize, solution: &Solution) -> String {
    let mut block = String::new();
    let bins = solution.bin_count();

    block.push_str(&format!("instance ID = {}\n", instance_id));
    block.push_str(&format!("solution bins =   {}\n", bins));
    block.push_str(&format!("expected bins =   {}\n", best_known_bins));
    block.push_str(&format!(
        "difference =   {}\n",
        bins as i64 - best_known_bins as i64
    ));

    for (index, bin) in solution.bins.iter().enumerate() {
        block.push_str(&format!("Bin ID: {} --- Item ID: ", index));
        for id in bin.item_ids() {
            block.push_str(&format!("{} ", id));
        }
        block.push('\n');
    }

    block
}

/// Create (or truncate) the report and write the instance count
pub fn write_header<P: AsRef<Path>>(path: P, instance_count: usize) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    writeln!(file, "{}", instance_count)?;
    Ok(())
}

/// Append the block of one instance
pub fn append_solution<P: AsRef<Path>>(
    path: P,
    instance_id: &str,
    best_known_bins: usize,
    solution: &Solution,
) -> std::io::Result<()> {
    let mut file = OpenOptions::new().append(true).create(true).open(path)?;
    file.write_all(format_solution(instance_id, best_known_bins, solution).as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::construction::best_fit;
    use crate::instance::BppInstance;

    #[test]
    fn test_format_solution() {
        let instance = BppInstance::new("t1", 10, 2, &[4, 8, 5, 3]);
        let solution = Solution::from_bins(10, best_fit(&instance.items, 10), "BestFit");

        let block = format_solution(&instance.name, instance.best_known_bins, &solution);
        let lines: Vec<&str> = block.lines().collect();

        assert_eq!(lines[0], "instance ID = t1");
        assert_eq!(lines[1], "solution bins =   3");
        assert_eq!(lines[2], "expected bins =   2");
        assert_eq!(lines[3], "difference =   1");
        assert_eq!(lines[4], "Bin ID: 0 --- Item ID: 1 ");
        assert_eq!(lines[5], "Bin ID: 1 --- Item ID: 0 2 ");
        assert_eq!(lines[6], "Bin ID: 2 --- Item ID: 3 ");
    }

    #[test]
    fn test_report_file() {
        let path = std::env::temp_dir().join(format!("bpp_report_{}.txt", std::process::id()));
        let instance = BppInstance::new("t1", 10, 1, &[6, 4]);
        let solution = Solution::from_bins(10, best_fit(&instance.items, 10), "BestFit");

        write_header(&path, 1).unwrap();
        append_solution(&path, &instance.name, 1, &solution).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(content.starts_with("1\ninstance ID = t1\n"));
        assert!(content.contains("difference =   0"));
    }
}
