//! Config field documentation, the single source of truth for descriptions.
//!
//! Used by:
//! - `qcscan config show` to annotate TOML output with inline comments
//! - `cargo xtask gen-docs` to generate `docs/configuration.md`

use std::collections::HashMap;

/// Documentation for a config section.
pub struct SectionDoc {
    /// TOML section name (e.g., "archive", "pipeline")
    pub name: &'static str,
    /// Human-readable description of the section
    pub description: &'static str,
    /// Fields in this section
    pub fields: &'static [FieldDoc],
}

/// Documentation for a config field.
pub struct FieldDoc {
    /// Field name as it appears in TOML
    pub name: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// Default value as a display string
    pub default_display: &'static str,
}

/// Config sections in canonical display order.
pub const CONFIG_SECTIONS: &[SectionDoc] = &[
    SectionDoc {
        name: "archive",
        description: "Location and layout of the analysis archive",
        fields: &[
            FieldDoc {
                name: "root",
                description: "Archive root directory (overridden by --root)",
                default_display: "\"/path/to/archive\"",
            },
            FieldDoc {
                name: "log_dir",
                description: "Error-log subdirectory inside each execution directory",
                default_display: "\"logs\"",
            },
        ],
    },
    SectionDoc {
        name: "pipeline",
        description: "Batching and worker pool settings",
        fields: &[
            FieldDoc {
                name: "workers",
                description: "Concurrent workers (0 runs serially)",
                default_display: "4",
            },
            FieldDoc {
                name: "max_workers",
                description: "Upper bound on workers regardless of the requested count",
                default_display: "64",
            },
            FieldDoc {
                name: "batch_size",
                description: "Identifiers per batch (default 10000 for classify, 2 x workers for extract)",
                default_display: "10000",
            },
            FieldDoc {
                name: "pool",
                description: "Worker substrate: auto, threads, processes or inline",
                default_display: "\"auto\"",
            },
        ],
    },
    SectionDoc {
        name: "extract",
        description: "Metric extraction settings",
        fields: &[
            FieldDoc {
                name: "include_crypt",
                description: "Decrypt statistics artifacts to report gc_content for BAM/CRAM",
                default_display: "false",
            },
            FieldDoc {
                name: "delimiter",
                description: "Single-character column delimiter of the metric table",
                default_display: "\",\"",
            },
        ],
    },
    SectionDoc {
        name: "classify",
        description: "Error-log classification settings",
        fields: &[
            FieldDoc {
                name: "extra_patterns",
                description: "Regexes added to the built-in error patterns",
                default_display: "[]",
            },
            FieldDoc {
                name: "max_excerpt_lines",
                description: "Matched lines kept per log file (match counts stay exact)",
                default_display: "200",
            },
        ],
    },
];

/// Insert commented-out templates for fields absent from a serialized config.
///
/// Optional fields are skipped when serializing; this keeps them discoverable
/// in `config show` output.
pub fn insert_optional_field_templates(toml_str: &str) -> String {
    let mut lines: Vec<String> = toml_str.lines().map(String::from).collect();

    // Collect which keys are present per section
    let mut present: HashMap<String, Vec<String>> = HashMap::new();
    let mut current_section = String::new();
    for line in &lines {
        let trimmed = line.trim();
        if let Some(name) = section_name(trimmed) {
            current_section = name.to_string();
        } else if let Some(key) = field_key(trimmed) {
            present
                .entry(current_section.clone())
                .or_default()
                .push(key.to_string());
        }
    }

    // Process sections in reverse so line insertions don't shift indices
    for section in CONFIG_SECTIONS.iter().rev() {
        let section_present = present.get(section.name);
        let missing: Vec<&FieldDoc> = section
            .fields
            .iter()
            .filter(|f| {
                section_present
                    .map(|p| !p.iter().any(|k| k == f.name))
                    .unwrap_or(true)
            })
            .collect();

        if missing.is_empty() {
            continue;
        }

        let header = format!("[{}]", section.name);
        let Some(start) = lines.iter().position(|l| l.trim() == header) else {
            continue;
        };
        let section_end = lines[start + 1..]
            .iter()
            .position(|l| section_name(l.trim()).is_some())
            .map(|i| start + 1 + i)
            .unwrap_or(lines.len());

        // Templates go right after the section's last field
        let mut last_content = start;
        for (i, line) in lines.iter().enumerate().take(section_end).skip(start + 1) {
            if !line.trim().is_empty() {
                last_content = i;
            }
        }

        for (i, field) in missing.iter().enumerate() {
            lines.insert(
                last_content + 1 + i,
                format!("# {} = {}", field.name, field.default_display),
            );
        }
    }

    let mut result = lines.join("\n");
    if !result.ends_with('\n') {
        result.push('\n');
    }
    result
}

/// Annotate a serialized TOML config string with inline documentation comments.
///
/// Inserts `# description` comments above each known field.
pub fn annotate_config(toml_str: &str) -> String {
    let mut lookup: HashMap<(&str, &str), &str> = HashMap::new();
    for section in CONFIG_SECTIONS {
        for field in section.fields {
            lookup.insert((section.name, field.name), field.description);
        }
    }

    let mut result = String::new();
    let mut current_section = String::new();

    for line in toml_str.lines() {
        let trimmed = line.trim();

        if let Some(name) = section_name(trimmed) {
            current_section = name.to_string();
        } else if let Some(key) = field_key(trimmed) {
            if let Some(desc) = lookup.get(&(current_section.as_str(), key)) {
                result.push_str(&format!("# {}\n", desc));
            }
        }

        result.push_str(line);
        result.push('\n');
    }

    result
}

/// Section name of a `[section]` header line.
fn section_name(trimmed: &str) -> Option<&str> {
    if trimmed.starts_with('[') && !trimmed.starts_with("[[") {
        trimmed.trim_start_matches('[').split(']').next().map(str::trim)
    } else {
        None
    }
}

/// Key of a `key = value` line, including commented-out `# key = value` templates.
fn field_key(trimmed: &str) -> Option<&str> {
    let (before_eq, _) = trimmed.split_once('=')?;
    let raw_key = before_eq.trim();
    let key = raw_key.strip_prefix('#').unwrap_or(raw_key).trim();
    (!key.is_empty()).then_some(key)
}

/// Generate the configuration reference page as markdown.
pub fn generate_config_markdown() -> String {
    let mut md = String::new();

    md.push_str(
        "<!-- This file is auto-generated by `cargo xtask gen-docs`. Do not edit manually. -->\n\n",
    );
    md.push_str("# Configuration\n\n");
    md.push_str("qcscan reads a TOML configuration file at `~/.config/qcscan/config.toml`.\n");
    md.push_str("Use `--config <PATH>` to read another file. Command-line flags override the file.\n\n");
    md.push_str("```bash\n");
    md.push_str("qcscan config show   # View the effective configuration\n");
    md.push_str("```\n\n");
    md.push_str("## Configuration Sections\n\n");

    for section in CONFIG_SECTIONS {
        md.push_str(&format!("### [{}]\n\n", section.name));
        md.push_str(&format!("{}\n\n", section.description));
        md.push_str("| Option | Default | Description |\n");
        md.push_str("|--------|---------|-------------|\n");
        for field in section.fields {
            md.push_str(&format!(
                "| `{}` | `{}` | {} |\n",
                field.name, field.default_display, field.description
            ));
        }
        md.push('\n');
    }

    md.push_str("## Example Configuration\n\n");
    md.push_str("```toml\n");
    md.push_str("[archive]\n");
    md.push_str("root = \"/data/archive\"\n");
    md.push_str("log_dir = \"logs\"\n\n");
    md.push_str("[pipeline]\n");
    md.push_str("workers = 16\n");
    md.push_str("pool = \"processes\"\n\n");
    md.push_str("[extract]\n");
    md.push_str("include_crypt = true\n");
    md.push_str("delimiter = \"\\t\"\n\n");
    md.push_str("[classify]\n");
    md.push_str("extra_patterns = [\"Disk quota exceeded\"]\n");
    md.push_str("```\n");

    md
}
