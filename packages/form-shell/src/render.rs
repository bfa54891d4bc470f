use colored::Colorize;
use employee_form::{Field, FormView, Phase, StatusMessage};

/// Full form, one field per line with inline errors and duplicate markers.
pub fn render_form(view: &FormView, departments: &[String]) -> String {
    let mut out = Vec::new();

    for field in Field::ALL {
        let value = view.fields.get(field);
        let shown = if value.is_empty() {
            "-".dimmed().to_string()
        } else {
            value.to_string()
        };
        let mut line = format!("  {:<16} {}", field.label(), shown);

        let taken = match field {
            Field::EmployeeId => view.employee_id_taken,
            Field::Email => view.email_taken,
            _ => false,
        };
        if taken {
            line.push_str(&format!("  {}", "already exists".yellow()));
        }
        if let Some(error) = view.errors.get(field) {
            line.push_str(&format!("  {}", error.red()));
        }
        out.push(line);
    }

    out.push(format!("  {:<16} {}", "", format!("({})", departments.join(" | ")).dimmed()));

    if let Some(record) = &view.duplicate {
        out.push(format!("{}", "Existing employee:".yellow().bold()));
        out.push(format!(
            "  {} <{}>  {}  {}  {}  joined {}  {}",
            record.name,
            record.email,
            record.employee_id,
            record.department,
            record.role,
            record.date_of_joining,
            record.phone_number
        ));
    }

    out.push(format!("  [{}]", phase_label(view.phase)));
    if let Some(notice) = &view.notice {
        out.push(format!("  {}", notice.yellow()));
    }
    if let Some(status) = &view.status {
        out.push(format!("  {}", status_line(status)));
    }

    out.join("\n")
}

/// Lines worth announcing when the view moves from `prev` to `next`.
pub fn describe_changes(prev: &FormView, next: &FormView) -> Vec<String> {
    let mut lines = Vec::new();

    if prev.phase != next.phase {
        lines.push(format!("[{}]", phase_label(next.phase)).dimmed().to_string());
    }
    if prev.duplicate != next.duplicate {
        match &next.duplicate {
            Some(record) => lines.push(
                format!(
                    "Employee {} <{}> is already registered",
                    record.employee_id, record.email
                )
                .yellow()
                .to_string(),
            ),
            None if prev.duplicate.is_some() => {
                lines.push("No matching employee".dimmed().to_string())
            }
            None => {}
        }
    }
    if prev.notice != next.notice {
        if let Some(notice) = &next.notice {
            lines.push(notice.yellow().to_string());
        }
    }
    if prev.status != next.status {
        if let Some(status) = &next.status {
            lines.push(status_line(status));
        }
    }

    lines
}

fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Editing => "editing",
        Phase::Checking => "checking for duplicates",
        Phase::Submitting => "submitting",
    }
}

fn status_line(status: &StatusMessage) -> String {
    match status {
        StatusMessage::Success(text) => text.green().bold().to_string(),
        StatusMessage::Failure(text) => text.red().bold().to_string(),
    }
}
