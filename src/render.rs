use treediff::report::{ChangeKind, ChangeReport, FileChange};

pub fn print_report(report: &ChangeReport, show_details: bool) {
    for line in format_report(report, show_details) {
        println!("{}", line);
    }
}

fn format_report(report: &ChangeReport, show_details: bool) -> Vec<String> {
    let mut lines = Vec::new();

    for (path, kind) in report.changes() {
        let suffix = if kind.is_dir() { "/" } else { "" };
        lines.push(format!("{:<2} {}{}", kind.code(), path.display(), suffix));

        if show_details
            && !kind.is_dir()
            && let Some(change) = report.root.file(path)
        {
            lines.extend(format_details(kind, change));
        }
    }

    lines
}

fn format_details(kind: ChangeKind, change: &FileChange) -> Vec<String> {
    match (kind, change.old_fingerprint, change.fingerprint) {
        (ChangeKind::FileModified, Some(old), Some(new)) => {
            vec![format!("   crc32: {} -> {}", old, new)]
        }
        (ChangeKind::FileAdded, _, Some(new)) => vec![format!("   crc32: {}", new)],
        (ChangeKind::FileRemoved, Some(old), _) => vec![format!("   was: crc32 {}", old)],
        _ => Vec::new(),
    }
}
