use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tabmap_catalog::FieldCatalog;
use tabmap_cli::local::{CsvHeaderSource, JsonCommitter, LocalTransform, parse_pairs};
use tabmap_cli::settings::Settings;
use tabmap_cli::summary::{
    commit_lines, fields_table, mapping_table, preview_lines, preview_table, ranked_fields_table,
    short_fingerprint, suggestions_table, templates_table, validation_lines,
};
use tabmap_map::{DismissalTracker, TemplateRepository};
use tabmap_wizard::{ImportSession, ImportWizard};
use tracing::{info, info_span, warn};

use crate::cli::{ImportArgs, SuggestArgs, TemplatesArgs};

/// How an import ended, for the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOutcome {
    pub committed: bool,
    pub has_errors: bool,
}

pub fn run_fields(config: &Path) -> Result<()> {
    let settings = load_settings(config)?;
    let catalog = settings.load_catalog().context("load field catalog")?;
    println!("{}", fields_table(&catalog));
    println!(
        "{} fields, required: {}",
        catalog.len(),
        catalog.required_keys().collect::<Vec<_>>().join(", ")
    );
    Ok(())
}

pub fn run_suggest(config: &Path, args: &SuggestArgs) -> Result<()> {
    let span = info_span!("suggest", file = %args.file.display());
    let _guard = span.enter();

    let settings = load_settings(config)?;
    let catalog = settings.load_catalog().context("load field catalog")?;
    let mut wizard = build_wizard(&settings, catalog, args.state.as_deref(), true)?;
    wizard
        .acquire(&CsvHeaderSource::new(&args.file))
        .with_context(|| format!("read headers from {}", args.file.display()))?;

    let session = wizard.session_mut()?;
    print_template(session);
    println!("{}", mapping_table(session));
    let suggestions = session.refresh_suggestions();
    if suggestions.is_empty() {
        println!("No suggestions for the remaining columns");
    } else {
        println!("{}", suggestions_table(suggestions));
    }
    print_lines(validation_lines(session.validation()));
    for header in &args.rank {
        if !session.headers().contains(header) {
            warn!(header = %header, "ranked column not in file");
        }
        println!("Closest fields for '{header}':");
        println!(
            "{}",
            ranked_fields_table(&session.rank_fields(header), args.rank_limit)
        );
    }
    Ok(())
}

pub fn run_templates(config: &Path, args: &TemplatesArgs) -> Result<()> {
    let settings = load_settings(config)?;
    let repository = TemplateRepository::new(&settings.templates.dir).with_context(|| {
        format!("open template dir {}", settings.templates.dir.display())
    })?;
    if let Some(fingerprint) = &args.delete {
        if !repository
            .delete(fingerprint)
            .with_context(|| format!("delete template {fingerprint}"))?
        {
            return Err(anyhow!("no template with fingerprint {fingerprint}"));
        }
        println!("Deleted template {}", short_fingerprint(fingerprint));
        return Ok(());
    }
    let templates = repository.list().context("list templates")?;
    if templates.is_empty() {
        println!("No templates in {}", repository.base_dir().display());
    } else {
        println!("{}", templates_table(&templates));
    }
    Ok(())
}

pub fn run_import(config: &Path, args: &ImportArgs) -> Result<ImportOutcome> {
    let span = info_span!("import", file = %args.file.display());
    let _guard = span.enter();

    let settings = load_settings(config)?;
    let catalog = settings.load_catalog().context("load field catalog")?;
    let mut wizard = build_wizard(
        &settings,
        catalog.clone(),
        args.state.as_deref(),
        !args.no_templates,
    )?;
    wizard
        .acquire(&CsvHeaderSource::new(&args.file))
        .with_context(|| format!("read headers from {}", args.file.display()))?;

    let session = wizard.session_mut()?;
    apply_edits(session, args)?;
    print_template(session);
    println!("{}", mapping_table(session));
    print_lines(validation_lines(session.validation()));

    wizard.complete_mapping().context("mapping incomplete")?;
    wizard
        .load_preview(&LocalTransform::new(&args.file, &catalog))
        .context("preview")?;
    if let Some(preview) = wizard.preview() {
        println!("{}", preview_table(preview, &settings.display));
        print_lines(preview_lines(preview, &settings.display));
    }

    if args.dry_run {
        info!("dry run, nothing written");
        save_state(&wizard, args.state.as_deref())?;
        return Ok(ImportOutcome {
            committed: false,
            has_errors: false,
        });
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(&args.file));
    let committer = JsonCommitter::new(LocalTransform::new(&args.file, &catalog), &output);
    wizard.confirm(&committer).context("import")?;
    save_state(&wizard, args.state.as_deref())?;

    let response = wizard
        .commit_response()
        .ok_or_else(|| anyhow!("import finished without a result"))?;
    print_lines(commit_lines(response, &settings.display));
    println!("Output: {}", committer.output().display());
    Ok(ImportOutcome {
        committed: true,
        has_errors: response.summary.errors > 0,
    })
}

/// Operator decisions from the command line, in an order where each step
/// sees the fields freed or taken by the previous one.
fn apply_edits(session: &mut ImportSession, args: &ImportArgs) -> Result<()> {
    for header in &args.unmap {
        session
            .clear(header)
            .with_context(|| format!("unmap '{header}'"))?;
    }
    for (label, header) in parse_pairs(&args.custom).map_err(|e| anyhow!(e))? {
        let field = session
            .add_custom_field(&label)
            .with_context(|| format!("custom field '{label}'"))?;
        session
            .assign(&header, &field.key)
            .with_context(|| format!("map '{header}' to {}", field.key))?;
    }
    for (header, field) in parse_pairs(&args.map).map_err(|e| anyhow!(e))? {
        session
            .assign(&header, &field)
            .with_context(|| format!("map '{header}' to {field}"))?;
    }
    for header in &args.reject {
        session
            .reject_suggestion(header)
            .with_context(|| format!("reject '{header}'"))?;
    }
    if args.accept_suggestions {
        let outcome = session.accept_all();
        for conflict in &outcome.conflicts {
            warn!("{conflict}");
            eprintln!("warning: {conflict}");
        }
        println!("Accepted {} suggestions", outcome.accepted.len());
    }
    if args.reject_suggestions {
        let rejected = session.reject_all();
        println!("Rejected {} suggestions", rejected.len());
    }
    Ok(())
}

fn build_wizard(
    settings: &Settings,
    catalog: FieldCatalog,
    state: Option<&Path>,
    templates: bool,
) -> Result<ImportWizard> {
    let dismissals = match state {
        Some(path) => DismissalTracker::load_from(path)
            .with_context(|| format!("load state {}", path.display()))?,
        None => DismissalTracker::new(),
    };
    let mut wizard = ImportWizard::new(catalog, settings.wizard_options())
        .context("invalid matching thresholds")?
        .with_dismissals(dismissals);
    if templates && settings.templates.enabled {
        let repository = TemplateRepository::new(&settings.templates.dir).with_context(|| {
            format!("open template dir {}", settings.templates.dir.display())
        })?;
        wizard = wizard.with_templates(repository);
    }
    Ok(wizard)
}

fn load_settings(path: &Path) -> Result<Settings> {
    Settings::load_from(path).with_context(|| format!("load settings {}", path.display()))
}

fn save_state(wizard: &ImportWizard, state: Option<&Path>) -> Result<()> {
    if let Some(path) = state {
        wizard
            .dismissals()
            .save_to(path)
            .with_context(|| format!("save state {}", path.display()))?;
    }
    Ok(())
}

fn default_output(file: &Path) -> PathBuf {
    file.with_extension("json")
}

fn print_template(session: &ImportSession) {
    if let Some(template) = session.template() {
        println!(
            "Template {} ({:?}, {:.0}% similar): {} columns mapped",
            short_fingerprint(&template.fingerprint),
            template.kind,
            template.score * 100.0,
            template.assigned
        );
    }
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{line}");
    }
}
