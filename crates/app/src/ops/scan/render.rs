use service::http_server::api::v0::scan::ScanSnapshot;

pub fn snapshot(snapshot: &ScanSnapshot) -> String {
    let search = &snapshot.search;
    let run = &snapshot.run;

    let mut lines = vec![format!(
        "storage: {}  mode: {}",
        search.search_type, search.search_mode
    )];
    if let Some(term) = &search.search_term {
        match search.scan_level {
            Some(level) => lines.push(format!("term: {} ({})", term, level.as_str())),
            None => lines.push(format!("term: {}", term)),
        }
    }
    if let Some(message) = &search.message {
        lines.push(message.clone());
    }
    lines.extend(
        search
            .hits
            .iter()
            .map(|hit| format!("  {}  {}", hit.id(), hit.location())),
    );

    if let Some(run_id) = &run.run_id {
        let status = run.status.as_ref().map(|s| s.as_str()).unwrap_or("unknown");
        let polling = if run.polling { ", polling" } else { "" };
        lines.push(format!("scan {}: {}{}", run_id, status, polling));
    }
    // a failed run has already been forgotten but its message is kept
    if let Some(message) = &run.status_message {
        if search.message.as_ref() != Some(message) {
            lines.push(message.clone());
        }
    }
    if let Some(checked) = run.last_checked_at {
        lines.push(format!("last checked: {}", checked.to_rfc3339()));
    }
    lines.extend(run.results.iter().map(|path| format!("  {}", path)));

    lines.join("\n")
}
