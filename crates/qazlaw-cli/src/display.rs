//! Vertical card and summary output for corpus records and runs.

use qazlaw_ingest::{LinkReport, RunReport};
use qazlaw_store::{CorpusStats, StoredAct, VersionSummary};

const MAX_LIST_ITEMS: usize = 10;

// ── Public API ──

/// Print one act as a card grouped into sections, followed by its version list.
pub fn print_act_card(stored: &StoredAct, versions: &[VersionSummary]) {
    let act = &stored.act;
    println!("=== {} ===", act.code);
    if !act.title.is_empty() {
        println!("{}", act.title);
    }
    println!();

    let types = act
        .types
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    print_section(
        "Identity",
        &[
            ("id", Some(stored.id.to_string())),
            ("registry_number", non_empty(&act.registry_number)),
            ("ngr", non_empty(&act.ngr)),
            ("sa_doc_number_ru", non_empty(&act.sa_doc_number_ru)),
            ("sa_doc_number_kz", non_empty(&act.sa_doc_number_kz)),
            ("ju_doc_number", non_empty(&act.ju_doc_number)),
            ("types", non_empty(&types)),
            ("requisite", non_empty(&act.requisite)),
        ],
    );
    print_section(
        "Status",
        &[("status", act.status.map(|s| s.as_str().to_string()))],
    );
    print_section(
        "Dates",
        &[
            ("sa_approval_date", Some(act.sa_approval_date.to_string())),
            ("ju_approval_date", act.ju_approval_date.map(|d| d.to_string())),
            ("action_date", act.action_date.map(|d| d.to_string())),
            ("effective_date", act.effective_date.map(|d| d.to_string())),
            ("initial_pub_date", act.initial_pub_date.map(|d| d.to_string())),
        ],
    );
    print_versions(versions);
}

pub fn print_stats(stats: &CorpusStats) {
    println!("Corpus");
    println!("  {:<26} {}", "acts", stats.acts);
    println!("  {:<26} {}", "versions", stats.versions);
    println!("  {:<26} {}", "act_types", stats.act_types);
    println!("  {:<26} {}", "linked_causes", stats.linked_causes);
    println!("  {:<26} {}", "unresolved_causes", stats.unresolved_causes);
}

pub fn print_run_report(report: &RunReport) {
    eprintln!();
    eprintln!("  Status:    {:?}", report.status);
    match report.last_page {
        Some(page) => eprintln!("  Last page: {page}"),
        None => eprintln!("  Last page: -"),
    }
    eprintln!(
        "  Acts:      {} persisted, {} skipped, {} failed",
        report.acts_persisted, report.acts_skipped, report.acts_failed
    );
    eprintln!("  Versions:  {}", report.versions_persisted);
    if !report.conflicts.is_empty() {
        eprintln!("  Conflicts: {}", report.conflicts.len());
        print_code_list(&report.conflicts);
    }
}

pub fn print_link_report(report: &LinkReport) {
    eprintln!();
    eprintln!(
        "  Linked {} versions across {} cause acts",
        report.linked_versions, report.resolved_codes
    );
    if !report.unresolved_codes.is_empty() {
        eprintln!("  Unresolved: {}", report.unresolved_codes.len());
        print_code_list(&report.unresolved_codes);
    }
}

// ── Section rendering ──

fn print_section(header: &str, fields: &[(&str, Option<String>)]) {
    if fields.iter().all(|(_, value)| value.is_none()) {
        return;
    }
    println!("{header}");
    for (name, value) in fields {
        if let Some(value) = value {
            println!("  {:<26} {}", name, value);
        }
    }
    println!();
}

fn print_versions(versions: &[VersionSummary]) {
    if versions.is_empty() {
        return;
    }
    println!("Versions ({}):", versions.len());
    for v in versions {
        let actual = if v.is_actual { "*" } else { " " };
        let cause = match (&v.cause_act_code, v.cause_act_id) {
            (Some(code), Some(id)) => format!("  cause {code} (#{id})"),
            (Some(code), None) => format!("  cause {code}"),
            _ => String::new(),
        };
        println!(
            "  {actual} {} {}  {:>9} bytes  {}{cause}",
            v.language, v.date, v.content_len, v.version_id
        );
    }
    println!();
}

fn print_code_list(codes: &[String]) {
    for code in codes.iter().take(MAX_LIST_ITEMS) {
        eprintln!("    {code}");
    }
    if codes.len() > MAX_LIST_ITEMS {
        eprintln!("    ... and {} more", codes.len() - MAX_LIST_ITEMS);
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
