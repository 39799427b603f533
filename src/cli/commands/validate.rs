//! `validate` command
//!
//! Loads each configuration file through the normal loader and reports
//! every issue found, in human or JSON form.

use std::path::Path;

use serde::Serialize;

use crate::cli::args::{OutputFormat, ValidateArgs};
use crate::config::{ConfigLoader, LoadWarning};
use crate::error::{ConfigError, QuickdrawError, Severity, ValidationIssue};

/// Per-file validation report.
#[derive(Debug, Serialize)]
struct FileReport {
    file: String,
    valid: bool,
    errors: Vec<IssueReport>,
    warnings: Vec<IssueReport>,
}

#[derive(Debug, Serialize)]
struct IssueReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    message: String,
}

impl From<&ValidationIssue> for IssueReport {
    fn from(issue: &ValidationIssue) -> Self {
        Self {
            path: Some(issue.path.clone()),
            message: issue.message.clone(),
        }
    }
}

impl From<&LoadWarning> for IssueReport {
    fn from(warning: &LoadWarning) -> Self {
        Self {
            path: warning.location.clone(),
            message: warning.message.clone(),
        }
    }
}

/// Validate configuration files without playing.
///
/// Every file is checked even after a failure; the first failure is
/// returned so the process exits with the configuration error code.
///
/// # Errors
///
/// Returns a config error if any file is missing, unparsable, or invalid
/// (or, with `--strict`, carries warnings).
pub fn run(args: &ValidateArgs) -> Result<(), QuickdrawError> {
    let loader = ConfigLoader::with_defaults();
    let mut reports = Vec::with_capacity(args.files.len());
    let mut first_failure: Option<ConfigError> = None;

    for path in &args.files {
        tracing::info!(file = %path.display(), "validating configuration");
        let (report, failure) = check_file(&loader, path, args.strict);
        if !report.valid {
            tracing::warn!(file = %path.display(), "configuration invalid");
        }
        if first_failure.is_none() {
            first_failure = failure;
        }
        reports.push(report);
    }

    match args.format {
        OutputFormat::Human => {
            for report in &reports {
                print_human(report);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
    }

    first_failure.map_or(Ok(()), |e| Err(e.into()))
}

fn check_file(
    loader: &ConfigLoader,
    path: &Path,
    strict: bool,
) -> (FileReport, Option<ConfigError>) {
    let file = path.display().to_string();
    match loader.load(path) {
        Ok(result) => {
            let warnings: Vec<IssueReport> = result.warnings.iter().map(IssueReport::from).collect();
            if strict && !result.warnings.is_empty() {
                let errors = result
                    .warnings
                    .iter()
                    .map(|w| ValidationIssue {
                        path: w.location.clone().unwrap_or_default(),
                        message: w.message.clone(),
                        severity: Severity::Error,
                    })
                    .collect();
                let report = FileReport {
                    file: file.clone(),
                    valid: false,
                    errors: warnings,
                    warnings: Vec::new(),
                };
                return (report, Some(ConfigError::ValidationError { path: file, errors }));
            }
            let report = FileReport {
                file,
                valid: true,
                errors: Vec::new(),
                warnings,
            };
            (report, None)
        }
        Err(e) => {
            let errors = match &e {
                ConfigError::ValidationError { errors, .. } => {
                    errors.iter().map(IssueReport::from).collect()
                }
                other => vec![IssueReport {
                    path: None,
                    message: other.to_string(),
                }],
            };
            let report = FileReport {
                file,
                valid: false,
                errors,
                warnings: Vec::new(),
            };
            (report, Some(e))
        }
    }
}

fn print_human(report: &FileReport) {
    let mark = if report.valid { "ok" } else { "FAILED" };
    println!("{}: {mark}", report.file);
    for issue in &report.errors {
        print_issue("error", issue);
    }
    for issue in &report.warnings {
        print_issue("warning", issue);
    }
}

fn print_issue(label: &str, issue: &IssueReport) {
    match &issue.path {
        Some(path) => println!("  {label}: {} at {path}", issue.message),
        None => println!("  {label}: {}", issue.message),
    }
}
