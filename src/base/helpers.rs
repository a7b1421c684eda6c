use crate::base::*;
use chrono::Local;
use std::io::{self, Error, ErrorKind};

pub const COMMENT_MARKER: char = '#';

pub fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

// Remove the inline comment and the pesky leading and trailing whitespace
pub fn strip_comment(line: &str) -> &str {
    match line.find(COMMENT_MARKER) {
        Some(i) => line[0..i].trim(),
        None => line.trim(),
    }
}

pub fn parse_f64_tokens(line: &str, fname: &str) -> io::Result<Vec<f64>> {
    line.split_whitespace()
        .map(|x| {
            x.parse::<f64>().map_err(|_| {
                Error::new(
                    ErrorKind::Other,
                    "Invalid number: '".to_owned() + x + "' in file: " + fname + ".",
                )
            })
        })
        .collect::<io::Result<Vec<f64>>>()
}

// Counts (replicates, individuals, generations) are written as floats in the parameter file, e.g. "100" or "1e3"
pub fn f64_to_count(x: f64, what: &str) -> io::Result<usize> {
    if !x.is_finite() || (x < 0.0) || (x.fract() != 0.0) {
        return Err(Error::new(
            ErrorKind::Other,
            "The ".to_owned() + what + " must be a non-negative integer, got: " + &x.to_string() + ".",
        ));
    }
    Ok(x as usize)
}

pub fn parse_pvalue_mode(x: &str) -> io::Result<PvalueMode> {
    match x.to_lowercase().as_str() {
        "density" | "pdf" => Ok(PvalueMode::Density),
        "survival" | "sf" => Ok(PvalueMode::Survival),
        _ => Err(Error::new(
            ErrorKind::Other,
            "Unknown p-value mode: '".to_owned() + x + "'. Please use 'density' or 'survival'.",
        )),
    }
}

pub fn parse_nan_policy(x: &str) -> io::Result<NanPolicy> {
    match x.to_lowercase().as_str() {
        "warn" => Ok(NanPolicy::Warn),
        "sentinel" => Ok(NanPolicy::Sentinel),
        "omit" => Ok(NanPolicy::Omit),
        "abort" => Ok(NanPolicy::Abort),
        _ => Err(Error::new(
            ErrorKind::Other,
            "Unknown NaN policy: '".to_owned() + x + "'. Please use 'warn', 'sentinel', 'omit' or 'abort'.",
        )),
    }
}

pub fn join_f64(x: &[f64], sep: &str) -> String {
    x.iter()
        .map(|x| x.to_string())
        .collect::<Vec<String>>()
        .join(sep)
}

pub fn join_usize(x: &[usize], sep: &str) -> String {
    x.iter()
        .map(|x| x.to_string())
        .collect::<Vec<String>>()
        .join(sep)
}
