// AWS credentials output: shell exports and the shared credentials file
use crate::error::{BmxError, Result};
use crate::models::RoleCredentials;
use clap::ValueEnum;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

const EXPIRATION_COMMENT: &str = "# Expiration:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Bash,
    Powershell,
}

impl Default for OutputFormat {
    fn default() -> Self {
        if cfg!(windows) {
            OutputFormat::Powershell
        } else {
            OutputFormat::Bash
        }
    }
}

/// Render credentials as shell statements for `format`
pub fn render(creds: &RoleCredentials, format: OutputFormat) -> String {
    match format {
        OutputFormat::Bash => format!(
            "export AWS_SESSION_TOKEN={}\nexport AWS_ACCESS_KEY_ID={}\nexport AWS_SECRET_ACCESS_KEY={}\n",
            creds.session_token, creds.access_key_id, creds.secret_access_key
        ),
        OutputFormat::Powershell => format!(
            "$env:AWS_SESSION_TOKEN='{}'; $env:AWS_ACCESS_KEY_ID='{}'; $env:AWS_SECRET_ACCESS_KEY='{}'",
            creds.session_token, creds.access_key_id, creds.secret_access_key
        ),
    }
}

/// Get the AWS credentials file path
pub fn credentials_file_path() -> Result<PathBuf> {
    if let Some(home) = dirs::home_dir() {
        Ok(home.join(".aws").join("credentials"))
    } else {
        Err(BmxError::ConfigError(
            "Could not determine home directory".to_string(),
        ))
    }
}

/// Write credentials into the `[profile]` section of the credentials file at `path`
pub fn write_credentials(path: &Path, profile_name: &str, creds: &RoleCredentials) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(dir).map_err(|e| {
                BmxError::ConfigError(format!(
                    "Failed to create {}: {}",
                    dir.display(),
                    e
                ))
            })?;
        }
    }

    let existing_content = read_existing(path)?;

    let metadata = [format!("{} {}", EXPIRATION_COMMENT, creds.expiration.to_rfc3339())];
    let new_content = update_ini_section_with_comments(
        &existing_content,
        profile_name,
        &[
            ("aws_access_key_id", creds.access_key_id.as_str()),
            ("aws_secret_access_key", creds.secret_access_key.as_str()),
            ("aws_session_token", creds.session_token.as_str()),
        ],
        Some(&metadata[..]),
    );

    fs::write(path, new_content)
        .map_err(|e| BmxError::ConfigError(format!("Failed to write credentials file: {}", e)))?;

    tracing::debug!("Wrote profile [{}] to {}", profile_name, path.display());
    Ok(())
}

/// Remove the `[profile]` section from the credentials file at `path`.
///
/// Returns whether the profile was present.
pub fn remove_profile(path: &Path, profile_name: &str) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }

    let content = read_existing(path)?;
    if !list_profiles(&content).iter().any(|p| p == profile_name) {
        return Ok(false);
    }

    fs::write(path, delete_ini_section(&content, profile_name))
        .map_err(|e| BmxError::ConfigError(format!("Failed to write credentials file: {}", e)))?;
    Ok(true)
}

fn read_existing(path: &Path) -> Result<String> {
    if !path.exists() {
        return Ok(String::new());
    }

    fs::read_to_string(path)
        .map_err(|e| BmxError::ConfigError(format!("Failed to read credentials file: {}", e)))
}

fn section_name(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        Some(trimmed[1..trimmed.len() - 1].trim())
    } else {
        None
    }
}

fn list_profiles(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(section_name)
        .map(|s| s.to_string())
        .collect()
}

/// Update or add a section in an INI-style file with optional comment metadata
fn update_ini_section_with_comments(
    content: &str,
    section: &str,
    key_values: &[(&str, &str)],
    comments: Option<&[String]>,
) -> String {
    let mut result = String::new();
    let mut in_target_section = false;
    let mut section_found = false;
    let mut updated_keys = HashSet::new();

    let push_missing = |result: &mut String, updated: &HashSet<String>| {
        for (key, value) in key_values {
            if !updated.contains(*key) {
                result.push_str(&format!("{} = {}\n", key, value));
            }
        }
    };

    for line in content.lines() {
        let trimmed = line.trim();

        if let Some(name) = section_name(line) {
            if in_target_section {
                // Keep new keys inside the section, ahead of the separating blank line
                let end = result.trim_end_matches('\n').len();
                result.truncate(end);
                result.push('\n');
                push_missing(&mut result, &updated_keys);
                result.push('\n');
                updated_keys.clear();
            }

            result.push_str(line);
            result.push('\n');

            in_target_section = name == section && !section_found;
            if in_target_section {
                section_found = true;
                for comment in comments.unwrap_or_default() {
                    result.push_str(comment);
                    result.push('\n');
                }
            }
            continue;
        }

        if in_target_section {
            // The expiration comment is regenerated above
            if trimmed.starts_with(EXPIRATION_COMMENT) {
                continue;
            }
            if let Some((key, _)) = trimmed.split_once('=') {
                let key = key.trim();
                if let Some((_, new_value)) = key_values.iter().find(|(k, _)| *k == key) {
                    result.push_str(&format!("{} = {}\n", key, new_value));
                    updated_keys.insert(key.to_string());
                    continue;
                }
            }
        }

        result.push_str(line);
        result.push('\n');
    }

    if in_target_section {
        push_missing(&mut result, &updated_keys);
    }

    if !section_found {
        if !result.is_empty() {
            result.push('\n');
        }
        result.push_str(&format!("[{}]\n", section));
        for comment in comments.unwrap_or_default() {
            result.push_str(comment);
            result.push('\n');
        }
        for (key, value) in key_values {
            result.push_str(&format!("{} = {}\n", key, value));
        }
    }

    cleanup_empty_lines(&result)
}

/// Delete a section from an INI-style file
fn delete_ini_section(content: &str, section: &str) -> String {
    let mut result = String::new();
    let mut in_target_section = false;

    for line in content.lines() {
        if let Some(name) = section_name(line) {
            in_target_section = name == section;
        }

        if !in_target_section {
            result.push_str(line);
            result.push('\n');
        }
    }

    cleanup_empty_lines(&result)
}

/// Clean up empty lines in INI files:
/// - Remove leading empty lines
/// - Ensure exactly one blank line between sections
/// - Remove trailing empty lines
fn cleanup_empty_lines(content: &str) -> String {
    let mut result = String::new();
    let mut previous_blank = false;
    let mut at_start = true;

    for line in content.lines() {
        let is_blank = line.trim().is_empty();

        if at_start && is_blank {
            continue;
        }
        if !is_blank {
            at_start = false;
        }
        if is_blank && previous_blank {
            continue;
        }

        result.push_str(line);
        result.push('\n');
        previous_blank = is_blank;
    }

    while result.ends_with("\n\n") {
        result.pop();
    }

    result
}
