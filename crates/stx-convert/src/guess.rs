//! Pattern guessing: derives a grouping pattern for an input from its
//! sibling files.
//!
//! The file name is split into digit and non-digit runs. A digit run
//! whose siblings (identical in every other run) take multiple values
//! becomes a `<min-max>` block; zero-padding is preserved when it is
//! uniform across the observed values.

use std::fs;
use std::path::Path;

use stx_core::errors::{StxError, UsageError};
use tracing::debug;

/// One maximal run of digit or non-digit characters in a file name.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Run {
    digits: bool,
    text: String,
}

fn split_runs(name: &str) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    for ch in name.chars() {
        let digits = ch.is_ascii_digit();
        match runs.last_mut() {
            Some(run) if run.digits == digits => run.text.push(ch),
            _ => runs.push(Run {
                digits,
                text: ch.to_string(),
            }),
        }
    }
    runs
}

/// Two run lists describe sibling files when they agree on run count,
/// run kinds and every non-digit run.
fn same_family(a: &[Run], b: &[Run]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|(left, right)| {
            left.digits == right.digits && (left.digits || left.text == right.text)
        })
}

/// Derives the grouping pattern for a single input file.
pub fn guess_pattern(input: &Path) -> Result<String, StxError> {
    let name = input
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| StxError::Format(format!("non-utf8 path: {}", input.display())))?;
    let runs = split_runs(name);
    let dir = input.parent().unwrap_or_else(|| Path::new("."));

    // Collect the digit-run values every sibling of the same family takes.
    let mut observed: Vec<Vec<String>> = runs.iter().map(|_| Vec::new()).collect();
    let entries = fs::read_dir(dir).map_err(|err| StxError::io(dir, err))?;
    let mut family = 0usize;
    for entry in entries {
        let entry = entry.map_err(|err| StxError::io(dir, err))?;
        let Some(sibling) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        let sibling_runs = split_runs(&sibling);
        if !same_family(&runs, &sibling_runs) {
            continue;
        }
        family += 1;
        for (slot, run) in observed.iter_mut().zip(&sibling_runs) {
            if run.digits && !slot.contains(&run.text) {
                slot.push(run.text.clone());
            }
        }
    }
    debug!(input = %input.display(), family, "scanned pattern siblings");

    let mut pattern = String::new();
    for (run, values) in runs.iter().zip(&observed) {
        if !run.digits || values.len() <= 1 {
            pattern.push_str(&run.text);
            continue;
        }
        let numeric: Vec<u64> = values
            .iter()
            .map(|text| text.parse().map_err(|_| {
                StxError::Format(format!("digit run overflows in {name}"))
            }))
            .collect::<Result<_, _>>()?;
        let min = *numeric.iter().min().expect("non-empty values");
        let max = *numeric.iter().max().expect("non-empty values");
        let uniform_width = values
            .iter()
            .all(|text| text.len() == values[0].len())
            .then_some(values[0].len());
        match uniform_width {
            Some(width) if values.iter().any(|text| text.starts_with('0')) => {
                pattern.push_str(&format!("<{min:0width$}-{max:0width$}>"));
            }
            _ => pattern.push_str(&format!("<{min}-{max}>")),
        }
    }
    Ok(pattern)
}

/// Writes a guessed pattern to the given path.
///
/// The path must end in `.pattern` and must not pre-exist.
pub fn write_pattern_file(pattern: &str, out: &Path) -> Result<(), StxError> {
    let is_pattern = out
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(".pattern"));
    if !is_pattern {
        return Err(UsageError::PatternSuffix.into());
    }
    if out.exists() {
        return Err(UsageError::OutputExists(out.to_path_buf()).into());
    }
    fs::write(out, format!("{pattern}\n")).map_err(|err| StxError::io(out, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_alternate_between_digits_and_text() {
        let runs = split_runs("img_t01_z5.fake");
        let texts: Vec<&str> = runs.iter().map(|run| run.text.as_str()).collect();
        assert_eq!(texts, vec!["img_t", "01", "_z", "5", ".fake"]);
    }

    #[test]
    fn families_require_matching_literal_runs() {
        let a = split_runs("img_t01.fake");
        assert!(same_family(&a, &split_runs("img_t02.fake")));
        assert!(!same_family(&a, &split_runs("other_t02.fake")));
        assert!(!same_family(&a, &split_runs("img_t01.fake.ini")));
    }
}
