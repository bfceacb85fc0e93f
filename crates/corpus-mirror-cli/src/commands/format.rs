use corpus_mirror::{CorpusOutcome, CorpusRecord, Manifest, SyncReport};

const MAX_NAME_WIDTH: usize = 40;
const LINE_BUDGET: usize = 100;

pub fn print_report(report: &SyncReport) {
    if report.outcomes.is_empty() {
        println!("Manifest lists no corpora.");
        return;
    }

    let name_width = name_width(report.outcomes.iter().map(CorpusOutcome::name));
    let detail_budget = LINE_BUDGET.saturating_sub(2 + name_width + 2 + 8 + 2);

    for outcome in &report.outcomes {
        let name = truncate(outcome.name(), name_width);
        let detail = truncate(&outcome_detail(outcome), detail_budget);
        println!(
            "  {:<width$}  {:<8}  {}",
            name,
            outcome_label(outcome),
            detail,
            width = name_width
        );
    }

    println!(
        "\n{} updated, {} skipped, {} failed",
        report.updated(),
        report.skipped(),
        report.failed()
    );

    match &report.reindex {
        Some(Ok(count)) => println!("Cached metadata for {count} text(s)"),
        Some(Err(e)) => eprintln!("error: cache re-index failed: {e}"),
        None => {}
    }
}

pub fn print_status(manifest: &Manifest) {
    if manifest.is_empty() {
        println!("Manifest lists no corpora.");
        return;
    }

    let name_width = name_width(manifest.iter().map(|r| r.name.as_str()));
    let mut pending = 0usize;

    for record in manifest {
        if !record.is_current() {
            pending += 1;
        }
        println!(
            "  {:<width$}  {:<12}  {}",
            truncate(&record.name, name_width),
            status_label(record),
            version_detail(record),
            width = name_width
        );
    }

    println!("\n{} corpora, {pending} pending", manifest.len());
}

fn outcome_label(outcome: &CorpusOutcome) -> &'static str {
    match outcome {
        CorpusOutcome::Skipped { .. } => "skipped",
        CorpusOutcome::Updated { .. } => "updated",
        CorpusOutcome::Failed { .. } => "FAILED",
    }
}

fn outcome_detail(outcome: &CorpusOutcome) -> String {
    match outcome {
        CorpusOutcome::Skipped { version, .. } => format!("stays on {version}"),
        CorpusOutcome::Updated {
            previous,
            version,
            summary,
            ..
        } => {
            let from = if previous.is_empty() { "-" } else { previous.as_str() };
            format!(
                "{from} -> {version}, removed {}, kept {}",
                summary.removed, summary.kept
            )
        }
        CorpusOutcome::Failed { version, error, .. } => format!("{version}: {error}"),
    }
}

fn status_label(record: &CorpusRecord) -> &'static str {
    if record.synced_version.is_empty() {
        "never synced"
    } else if record.is_current() {
        "up to date"
    } else {
        "pending"
    }
}

fn version_detail(record: &CorpusRecord) -> String {
    if record.is_current() {
        record.synced_version.clone()
    } else if record.synced_version.is_empty() {
        format!("-> {}", record.desired_version)
    } else {
        format!("{} -> {}", record.synced_version, record.desired_version)
    }
}

fn name_width<'a>(names: impl Iterator<Item = &'a str>) -> usize {
    names
        .map(|n| n.chars().count())
        .max()
        .unwrap_or(0)
        .min(MAX_NAME_WIDTH)
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_owned()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{truncated}…")
    }
}
