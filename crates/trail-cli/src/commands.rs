use std::fmt::Write as _;
use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use serde_json::Value;
use tracing::debug;
use trail_diff::{DiffEngine, EngineConfig};
use trail_types::{AuditAction, AuditEntry, ChangeRecord, ChangeType};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Diff(args) => cmd_diff(args, &cli.format),
        Command::Entry(args) => cmd_entry(args, &cli.format),
        Command::Families(args) => cmd_families(args, &cli.format),
    }
}

fn cmd_diff(args: DiffArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let record = diff_snapshots(&args.snapshots)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&record)?),
        OutputFormat::Text => match &record {
            Some(record) => print!("{}", render_record(record)),
            None => println!("No changes."),
        },
    }
    Ok(())
}

fn cmd_entry(args: EntryArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let snapshots = &args.snapshots;
    let action = AuditAction::infer(snapshots.old.is_some(), snapshots.new.is_some())
        .context("at least one of --old and --new is required")?;
    let diff = diff_snapshots(snapshots)?;

    let mut entry = AuditEntry::new(&args.tenant, &args.entity_id, snapshots.family, action)
        .with_diff(diff);
    if let Some(user) = &args.user {
        entry = entry.with_user(user);
    }

    match format {
        OutputFormat::Json => println!("{}", entry.to_json()?),
        OutputFormat::Text => {
            println!(
                "{} {} {} {}",
                action_label(entry.action),
                entry.family.to_string().cyan(),
                entry.entity_id.bold(),
                format!("(tenant {})", entry.tenant_id).dimmed()
            );
            println!("  Event: {}", entry.event_id.to_string().yellow());
            println!("  Date: {}", entry.event_date.to_rfc3339());
            if let Some(user) = &entry.user_id {
                println!("  User: {user}");
            }
            match &entry.diff {
                Some(record) => print!("{}", render_record(record)),
                None => println!("No changes."),
            }
        }
    }
    Ok(())
}

fn cmd_families(args: FamiliesArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let engine = load_engine(args.config.as_deref())?;
    let mut listing = Vec::new();
    for family in engine.families() {
        let calculator = engine.calculator(family)?;
        let rules = calculator.rules();
        listing.push((family, rules.shape().type_name(), rules.default_objects().to_vec()));
    }

    match format {
        OutputFormat::Json => {
            let json: Vec<Value> = listing
                .iter()
                .map(|(family, shape, defaults)| {
                    serde_json::json!({"family": family, "shape": shape, "defaultObjects": defaults})
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => {
            if listing.is_empty() {
                println!("No families registered.");
            }
            for (family, shape, defaults) in &listing {
                let defaults = if defaults.is_empty() {
                    "-".dimmed().to_string()
                } else {
                    defaults.join(", ")
                };
                println!("{:<16} {:<12} {}", family.to_string().cyan().bold(), shape, defaults);
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn diff_snapshots(args: &SnapshotArgs) -> anyhow::Result<Option<ChangeRecord>> {
    let engine = load_engine(args.config.as_deref())?;
    let old = read_snapshot(args.old.as_deref())?;
    let new = read_snapshot(args.new.as_deref())?;
    let record = engine
        .diff(args.family, old.as_ref(), new.as_ref())
        .with_context(|| format!("cannot diff {} snapshots", args.family))?;
    Ok(record)
}

fn load_engine(config: Option<&Path>) -> anyhow::Result<DiffEngine> {
    let Some(path) = config else {
        return Ok(DiffEngine::with_default_families());
    };
    debug!(path = %path.display(), "loading engine configuration");
    let config = EngineConfig::load(path)?;
    Ok(DiffEngine::from_config(&config)?)
}

fn read_snapshot(path: Option<&Path>) -> anyhow::Result<Option<Value>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    Ok(Some(value))
}

fn action_label(action: AuditAction) -> colored::ColoredString {
    match action {
        AuditAction::Create => "CREATE".green().bold(),
        AuditAction::Update => "UPDATE".yellow().bold(),
        AuditAction::Delete => "DELETE".red().bold(),
    }
}

fn marker(change_type: ChangeType) -> colored::ColoredString {
    match change_type {
        ChangeType::Added => "+".green(),
        ChangeType::Removed => "-".red(),
        ChangeType::Modified => "~".yellow(),
        ChangeType::Nothing => " ".normal(),
    }
}

fn show(value: Option<&Value>) -> String {
    value.map_or_else(|| "null".into(), Value::to_string)
}

fn render_record(record: &ChangeRecord) -> String {
    let mut out = String::new();

    if !record.field_changes.is_empty() {
        let _ = writeln!(out, "{}", "Field changes:".bold());
        for change in &record.field_changes {
            let _ = match change.change_type {
                ChangeType::Modified => writeln!(
                    out,
                    "  {} {}: {} -> {}",
                    marker(change.change_type),
                    change.full_path,
                    show(change.old_value.as_ref()).red(),
                    show(change.new_value.as_ref()).green()
                ),
                ChangeType::Removed => writeln!(
                    out,
                    "  {} {}: {}",
                    marker(change.change_type),
                    change.full_path,
                    show(change.old_value.as_ref())
                ),
                _ => writeln!(
                    out,
                    "  {} {}: {}",
                    marker(change.change_type),
                    change.full_path,
                    show(change.new_value.as_ref())
                ),
            };
        }
    }

    if !record.collection_changes.is_empty() {
        let _ = writeln!(out, "{}", "Collection changes:".bold());
        for collection in &record.collection_changes {
            let _ = writeln!(out, "  {}", collection.collection_name.cyan());
            for item in &collection.item_changes {
                let _ = match item.change_type {
                    ChangeType::Modified => writeln!(
                        out,
                        "    {} {} -> {}",
                        marker(item.change_type),
                        show(item.old_value.as_ref()),
                        show(item.new_value.as_ref())
                    ),
                    ChangeType::Removed => writeln!(
                        out,
                        "    {} {}",
                        marker(item.change_type),
                        show(item.old_value.as_ref())
                    ),
                    _ => writeln!(
                        out,
                        "    {} {}",
                        marker(item.change_type),
                        show(item.new_value.as_ref())
                    ),
                };
            }
        }
    }

    let _ = writeln!(
        out,
        "{} added, {} removed, {} modified",
        record.additions().to_string().green(),
        record.removals().to_string().red(),
        record.modifications().to_string().yellow()
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use trail_types::EntityFamily;

    fn json_file(value: &Value) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{value}").unwrap();
        file
    }

    fn snapshots(old: Option<&Path>, new: Option<&Path>) -> SnapshotArgs {
        SnapshotArgs {
            family: EntityFamily::Instance,
            old: old.map(Path::to_path_buf),
            new: new.map(Path::to_path_buf),
            config: None,
        }
    }

    #[test]
    fn diffs_snapshot_files() {
        let old = json_file(&json!({"title": "A", "languages": ["en", "fr"]}));
        let new = json_file(&json!({"title": "B", "languages": ["fr", "de"]}));
        let record = diff_snapshots(&snapshots(Some(old.path()), Some(new.path())))
            .unwrap()
            .unwrap();
        assert_eq!(record.field("title").unwrap().change_type, ChangeType::Modified);
        assert_eq!(record.collection("languages").unwrap().item_changes.len(), 2);
    }

    #[test]
    fn omitted_snapshot_is_creation() {
        let new = json_file(&json!({"title": "B"}));
        let record = diff_snapshots(&snapshots(None, Some(new.path()))).unwrap().unwrap();
        assert_eq!(record.additions(), 1);
    }

    #[test]
    fn invalid_json_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        let err = read_snapshot(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));
    }

    #[test]
    fn config_restricts_families() {
        let mut config = tempfile::NamedTempFile::new().unwrap();
        writeln!(config, "families = [\"user\"]").unwrap();
        let engine = load_engine(Some(config.path())).unwrap();
        assert_eq!(engine.families(), vec![EntityFamily::User]);

        let new = json_file(&json!({"title": "B"}));
        let mut args = snapshots(None, Some(new.path()));
        args.config = Some(config.path().to_path_buf());
        assert!(diff_snapshots(&args).is_err());
    }

    #[test]
    fn renders_every_change_kind() {
        colored::control::set_override(false);
        let record = ChangeRecord::new(
            vec![trail_types::FieldChange::new(
                ChangeType::Modified,
                "title",
                "title",
                Some(json!("A")),
                Some(json!("B")),
            )],
            vec![{
                let mut languages = trail_types::CollectionChange::new("languages");
                languages.push(trail_types::CollectionItemChange::removed(json!("en")));
                languages.push(trail_types::CollectionItemChange::added(json!("de")));
                languages
            }],
        )
        .unwrap();
        let text = render_record(&record);
        assert!(text.contains("~ title: \"A\" -> \"B\""));
        assert!(text.contains("- \"en\""));
        assert!(text.contains("+ \"de\""));
        assert!(text.contains("1 added, 1 removed, 1 modified"));
    }
}
