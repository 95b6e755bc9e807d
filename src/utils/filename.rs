use chrono::{Datelike, Local};
use std::path::PathBuf;

/// Default output directory: output/climgrid-{YYMMDD}
pub fn generate_default_output_dir() -> PathBuf {
    let now = Local::now();
    let year = now.year() % 100; // Get last 2 digits of year
    let month = now.month();
    let day = now.day();

    let dirname = format!("climgrid-{:02}{:02}{:02}", year, month, day);
    PathBuf::from("output").join(dirname)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_default_output_dir() {
        let dir = generate_default_output_dir();
        let dir_str = dir.to_string_lossy();

        assert!(dir_str.starts_with("output/"));

        let parts: Vec<&str> = dir_str.split('/').collect();
        assert_eq!(parts.len(), 2);
        assert!(parts[1].starts_with("climgrid-"));
        assert_eq!(parts[1].len(), "climgrid-".len() + 6);
    }
}
