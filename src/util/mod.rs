use indicatif::ProgressStyle;
use indicatif::style::TemplateError;
use std::path::Path;

pub mod fs;

const JOIN_NAME_FALLBACK: &str = "join";

pub fn progress_style() -> Result<ProgressStyle, TemplateError> {
    Ok(
        ProgressStyle::with_template("{spinner:.green} {msg:>24} {bar:40.cyan/blue} {pos}/{len}")?
            .progress_chars("=> "),
    )
}

pub fn spinner_style() -> Result<ProgressStyle, TemplateError> {
    ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
}

/// Name for the joined files of two sheets: the common prefix of their file
/// stems with trailing disc markers ("CD", "D", spaces) removed.
pub fn join_name(primary: &Path, secondary: &Path) -> String {
    let stem = |path: &Path| {
        path.file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    };
    let (primary, secondary) = (stem(primary), stem(secondary));

    let prefix: String = primary
        .chars()
        .zip(secondary.chars())
        .take_while(|(a, b)| a == b)
        .map(|(a, _)| a)
        .collect();
    let name = prefix.trim_end_matches(|c: char| c == 'C' || c == 'D' || c.is_whitespace());

    if name.is_empty() {
        JOIN_NAME_FALLBACK.to_string()
    } else {
        name.to_string()
    }
}
